use std::sync::LazyLock;

use regex::Regex;

static LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"//.*").unwrap());
static BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// Strip `//` line comments, then `/* */` block comments, then surrounding whitespace.
///
/// This is a regex heuristic, not a lexer: it knows nothing about string
/// literals, so `"http://example.com"` loses everything from `//` onward.
/// Line comments go first, which means a `//` inside a block comment can eat
/// the closing `*/` on that line.
pub fn strip_comments(code: &str) -> String {
    let without_lines = LINE_COMMENT.replace_all(code, "");
    let without_blocks = BLOCK_COMMENT.replace_all(&without_lines, "");
    without_blocks.trim().to_string()
}
