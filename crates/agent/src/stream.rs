//! Reply buffering for streamed completions.

/// Accumulates partial content in arrival order.
///
/// The loop never parses a partial reply: directives are only looked for
/// once the buffer is finished, so a line split across chunks still parses.
#[derive(Debug, Default)]
pub struct ReplyBuffer {
    text: String,
    chunks: usize,
}

impl ReplyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, delta: &str) {
        self.text.push_str(delta);
        self.chunks += 1;
    }

    /// Number of deltas pushed so far.
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The complete reply.
    pub fn finish(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actloop_core::parse_directive;

    #[test]
    fn concatenates_in_order() {
        let mut buf = ReplyBuffer::new();
        for delta in ["Ans", "wer: ", "42"] {
            buf.push(delta);
        }
        assert_eq!(buf.chunks(), 3);
        assert_eq!(buf.finish(), "Answer: 42");
    }

    #[test]
    fn directive_split_across_chunks_parses_once_finished() {
        let mut buf = ReplyBuffer::new();
        buf.push("Thought: compute\nAct");
        buf.push("ion: calcu");
        buf.push("late: 4*7/3\nPAUSE");
        let d = parse_directive(&buf.finish()).unwrap();
        assert_eq!(d.name, "calculate");
        assert_eq!(d.argument, "4*7/3");
    }

    #[test]
    fn empty_buffer_finishes_empty() {
        let buf = ReplyBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.finish(), "");
    }
}
