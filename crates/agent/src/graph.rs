//! The agent loop described as a two-node state graph.
//!
//! ```text
//! __start__ → llm ──(directive?)──→ action → llm
//!                  └──(no directive)──→ __end__
//! ```
//!
//! This is a description of control flow for display and for checking
//! routing decisions. [`AgentLoop`](crate::AgentLoop) runs the same
//! transitions directly and does not consult it.

use serde::Serialize;
use std::fmt::Write as _;

/// Sentinel for graph entry.
pub const START: &str = "__start__";

/// Sentinel for graph exit.
pub const END: &str = "__end__";

/// Node that requests a completion and parses it.
pub const LLM: &str = "llm";

/// Node that dispatches the parsed directive.
pub const ACTION: &str = "action";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: &'static str,
    pub to: &'static str,
    /// Label for conditional edges
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentGraph {
    nodes: Vec<&'static str>,
    edges: Vec<Edge>,
    interrupt_before: Vec<&'static str>,
}

impl AgentGraph {
    /// The reason/act loop, optionally pausing before every action.
    pub fn react(interrupt_before_action: bool) -> Self {
        let edge = |from, to, when| Edge { from, to, when };
        Self {
            nodes: vec![LLM, ACTION],
            edges: vec![
                edge(START, LLM, None),
                edge(LLM, ACTION, Some("directive")),
                edge(LLM, END, Some("no directive")),
                edge(ACTION, LLM, None),
            ],
            interrupt_before: if interrupt_before_action {
                vec![ACTION]
            } else {
                Vec::new()
            },
        }
    }

    pub fn nodes(&self) -> &[&'static str] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn entry(&self) -> &'static str {
        LLM
    }

    /// Whether execution pauses before entering `node`.
    pub fn interrupts_before(&self, node: &str) -> bool {
        self.interrupt_before.iter().any(|n| *n == node)
    }

    /// Next node after `node`. `has_directive` only matters leaving `llm`.
    /// Returns `None` for unknown nodes and for `END`.
    pub fn route(&self, node: &str, has_directive: bool) -> Option<&'static str> {
        match node {
            START => Some(LLM),
            LLM if has_directive => Some(ACTION),
            LLM => Some(END),
            ACTION => Some(LLM),
            _ => None,
        }
    }

    /// Graphviz DOT rendering. Interrupted nodes are drawn as octagons.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph agent {\n    rankdir=LR;\n");
        let _ = writeln!(out, "    \"{START}\" [shape=point];");
        let _ = writeln!(out, "    \"{END}\" [shape=doublecircle, label=\"end\"];");
        for node in &self.nodes {
            let shape = if self.interrupts_before(node) {
                "octagon"
            } else {
                "box"
            };
            let _ = writeln!(out, "    \"{node}\" [shape={shape}];");
        }
        for e in &self.edges {
            match e.when {
                Some(label) => {
                    let _ = writeln!(
                        out,
                        "    \"{}\" -> \"{}\" [label=\"{label}\", style=dashed];",
                        e.from, e.to
                    );
                }
                None => {
                    let _ = writeln!(out, "    \"{}\" -> \"{}\";", e.from, e.to);
                }
            }
        }
        out.push_str("}\n");
        out
    }
}
