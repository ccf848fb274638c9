//! Raw-output normalization utilities.

use regex::Regex;
use std::sync::LazyLock;

use super::IndexedLine;

/// Strips terminal artifacts from captured device output.
///
/// Removes ANSI escapes and backspace overstrikes (left behind by `--More--`
/// pagers), unifies line endings, expands tabs and trims trailing whitespace.
/// Leading indentation is kept; it carries no meaning but is harmless.
pub fn normalize_output(raw: &str) -> String {
    // SAFETY: These regexes are compile-time constants and are validated by tests.
    static ANSI_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("static regex must compile"));
    static OVERSTRIKE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r".\x08").expect("static regex must compile"));
    static PAGER_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)\s*--more--\s*").expect("static regex must compile"));

    let stripped = ANSI_RE.replace_all(raw, "");
    let mut cleaned = stripped.into_owned();
    while OVERSTRIKE_RE.is_match(&cleaned) {
        cleaned = OVERSTRIKE_RE.replace_all(&cleaned, "").into_owned();
    }
    let replaced = cleaned.replace("\r\n", "\n").replace('\r', "\n").replace('\t', "    ");

    replaced
        .lines()
        .map(|line| PAGER_RE.replace_all(line, " ").trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn to_indexed_lines(normalized: &str) -> Vec<IndexedLine> {
    normalized
        .lines()
        .enumerate()
        .map(|(index, text)| IndexedLine {
            index,
            text: text.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_ansi_and_carriage_returns() {
        let raw = "\x1b[1mInterface:\x1b[0m  Gi1/0/1\r\n   Status:  Authorized\r\n";
        assert_eq!(
            normalize_output(raw),
            "Interface:  Gi1/0/1\n   Status:  Authorized"
        );
    }

    #[test]
    fn test_removes_pager_prompt() {
        let raw = " --More-- Handle:  0x25000000";
        assert_eq!(normalize_output(raw), " Handle:  0x25000000");
    }

    #[test]
    fn test_indexed_lines_keep_positions() {
        let lines = to_indexed_lines("a\n\nb");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].index, 2);
        assert_eq!(lines[2].text, "b");
    }
}
