//! Log line layout: colog's colored level prefix behind a timestamp.

use std::io::Write;

use colog::format::CologStyle;
use env_logger::fmt::Formatter;

/// colog style that puts a millisecond UTC timestamp in front of every line.
pub struct TimestampedStyle;

impl CologStyle for TimestampedStyle {
    fn format(&self, buf: &mut Formatter, record: &log::Record<'_>) -> Result<(), std::io::Error> {
        let timestamp = buf.timestamp_millis().to_string();
        let line = format_line(
            &timestamp,
            &self.prefix_token(&record.level()),
            &record.args().to_string(),
            &self.line_separator(),
        );
        writeln!(buf, "{line}")
    }
}

/// Joins the parts of one log line. Continuation lines of a multi-line
/// message are indented with `separator`.
fn format_line(timestamp: &str, prefix: &str, message: &str, separator: &str) -> String {
    format!("{timestamp} {prefix} {}", message.replace('\n', separator))
}

#[cfg(test)]
mod tests {
    use super::format_line;

    #[test]
    fn test_line_starts_with_timestamp_then_prefix() {
        let line = format_line(
            "2024-05-01T10:00:00.123Z",
            "[*]",
            "Checkpoint at row 100",
            "\n | ",
        );
        assert_eq!(line, "2024-05-01T10:00:00.123Z [*] Checkpoint at row 100");
    }

    #[test]
    fn test_multi_line_message_uses_separator() {
        let line = format_line("t", "[!]", "first\nsecond", "\n | ");
        assert_eq!(line, "t [!] first\n | second");
    }
}
