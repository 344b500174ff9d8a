//! Action directives embedded in free-text model output.
//!
//! Grammar, one line per directive:
//!
//! ```text
//! Action: <name>: <argument>
//! ```
//!
//! `name` is a single word token (Unicode letters, digits and `_`);
//! `argument` is the rest of the line. Only
//! the first matching line of a reply is honored. Multi-line arguments are
//! not supported.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Action: (\w+): (.*)$").expect("directive pattern is valid")
});

/// A structured action request parsed out of an assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub name: String,
    pub argument: String,
}

impl Directive {
    pub fn new(name: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            argument: argument.into(),
        }
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Action: {}: {}", self.name, self.argument)
    }
}

/// Extract the first directive from `text`, if any line matches.
pub fn parse_directive(text: &str) -> Option<Directive> {
    text.lines().find_map(|line| {
        DIRECTIVE_RE
            .captures(line)
            .map(|caps| Directive::new(&caps[1], &caps[2]))
    })
}
