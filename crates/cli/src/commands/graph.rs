//! `actloop graph`: print the loop as Graphviz DOT.

use actloop_agent::AgentGraph;

pub fn run(interrupt: bool) {
    print!("{}", AgentGraph::react(interrupt).to_dot());
}
