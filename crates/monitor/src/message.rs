//! Alert digest assembly.

/// Ordered alert fragments plus a monotonic critical flag.
///
/// Every line of a pushed fragment is prefixed at push time: `"| "`
/// when the push is critical, `"  "` otherwise. Once any push is
/// critical the whole message is critical and stays that way.
#[derive(Debug, Default)]
pub struct Message {
    critical: bool,
    lines: Vec<String>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment. Multi-line fragments are split and each line
    /// prefixed individually.
    pub fn push(&mut self, critical: bool, fragment: &str) -> &mut Self {
        if critical {
            self.critical = true;
        }
        let prefix = if critical { "| " } else { "  " };
        for line in fragment.split('\n') {
            self.lines.push(format!("{prefix}{line}"));
        }
        self
    }

    /// True once any push was critical.
    pub fn critical(&self) -> bool {
        self.critical
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// The full digest, lines joined with newlines in push order.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gathers_lines_with_quiet_prefix() {
        let mut message = Message::new();
        for line in ["abc", "dev", "ghi"] {
            message.push(false, line);
        }
        assert_eq!(message.text(), "  abc\n  dev\n  ghi");
        assert!(!message.critical());
    }

    #[test]
    fn critical_pushes_use_bar_prefix_and_latch() {
        let mut message = Message::new();
        message.push(false, "abc");
        message.push(true, "dev");
        message.push(false, "ghi");
        assert_eq!(message.text(), "  abc\n| dev\n  ghi");
        assert!(message.critical());
    }

    #[test]
    fn multi_line_fragments_prefix_every_line() {
        let mut message = Message::new();
        message.push(true, "abc\ndef");
        assert_eq!(message.text(), "| abc\n| def");

        let mut message = Message::new();
        message.push(false, "abc\ndef");
        assert_eq!(message.text(), "  abc\n  def");
    }

    #[test]
    fn critical_flag_never_resets() {
        let mut message = Message::new();
        message.push(true, "first");
        message.push(false, "second");
        message.push(false, "third");
        assert!(message.critical());
        assert_eq!(message.len(), 3);
    }

    #[test]
    fn empty_message_has_no_text() {
        let message = Message::new();
        assert!(message.is_empty());
        assert_eq!(message.text(), "");
    }
}
