//! Statement cleanup for log output.
//!
//! Migration statements often carry `--` comment headers and blank spacer
//! lines. They are noise in a log line or an error message, so they are
//! dropped before a statement is displayed. The text that is executed is
//! never touched.

/// Line comment marker.
const LINE_COMMENT: &str = "--";

/// Strip comment lines and blank lines from a statement.
///
/// A line is dropped together with its terminator when it starts with `--`
/// in the first column, or when nothing but a line terminator (`\n`, `\r\n`
/// or a stray `\r`) is left on it. Indented comments and lines holding only
/// spaces or tabs are kept. Every other line is kept byte for byte, so
/// applying this twice yields the same text as applying it once.
///
/// ```
/// use migrun_core::sanitize;
///
/// assert_eq!(sanitize("-- comment\nSELECT 1;\n\n"), "SELECT 1;\n");
/// ```
pub fn sanitize(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| {
            let content = line.trim_end_matches(['\n', '\r']);
            !content.is_empty() && !line.starts_with(LINE_COMMENT)
        })
        .collect()
}
