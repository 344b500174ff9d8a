//! `actloop config`: show the effective configuration.

use std::path::Path;

use actloop_config::AppConfig;

use super::{CliResult, load_config};

pub async fn run(config_path: Option<&Path>, check: bool) -> CliResult {
    let config = load_config(config_path)?;

    let source = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    println!("# Effective configuration (file: {})", source.display());
    println!();

    let mut shown = config.clone();
    if shown.provider.api_key.is_some() {
        shown.provider.api_key = Some("[REDACTED]".into());
    }
    print!("{}", shown.to_toml()?);

    let is_local = config.provider.base_url.contains("localhost")
        || config.provider.base_url.contains("127.0.0.1");
    if config.provider.api_key.is_none() && !is_local {
        eprintln!();
        eprintln!("  warning: no API key set for a remote backend");
        eprintln!("  set ACTLOOP_API_KEY or OPENAI_API_KEY, or provider.api_key in the file");
    }

    if check {
        let provider = actloop_providers::build_from_config(&config)?;
        let url = &config.provider.base_url;
        println!();
        match provider.health_check().await {
            Ok(true) => println!("# backend: reachable ({url})"),
            Ok(false) => println!("# backend: responded with an error ({url})"),
            Err(e) => {
                println!("# backend: unreachable ({e})");
                return Err(e.into());
            }
        }
    }

    Ok(())
}
