//! Line classification.
//!
//! Every input line is classified once, without context, before the stateful
//! parsers decide what it means for the record being built. Noise (command
//! echo, prompts, CPU/clock banners), separators and table headers are
//! identified here so neither parser has to special-case them.

use super::PATTERNS;
use super::labels::{LabelTarget, Section, match_label, match_section};

/// Context-free classification of one normalized line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    Blank,
    /// A run of dashes between records or under a table header.
    Delimiter,
    /// Command echo, prompt or banner text.
    Noise,
    /// Column header of the summary table.
    TableHeader,
    /// `Method   State` header inside a method list.
    MethodHeader,
    Section(Section),
    Label(LabelTarget, String),
    /// Anything else, trimmed: summary rows, method rows, unknown text.
    Text(String),
}

impl LineClass {
    /// Returns `true` for lines that carry no session data in any layout.
    pub fn is_structural_noise(&self) -> bool {
        matches!(
            self,
            Self::Blank | Self::Delimiter | Self::Noise | Self::TableHeader
        )
    }
}

/// Classifies a single line.
pub fn classify_line(line: &str) -> LineClass {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineClass::Blank;
    }
    if PATTERNS.delimiter.is_match(trimmed) {
        return LineClass::Delimiter;
    }
    if is_noise_line(trimmed) {
        return LineClass::Noise;
    }
    if PATTERNS.table_header.is_match(trimmed) {
        return LineClass::TableHeader;
    }
    if PATTERNS.method_header.is_match(trimmed) {
        return LineClass::MethodHeader;
    }
    if let Some(section) = match_section(trimmed) {
        return LineClass::Section(section);
    }
    if let Some((target, value)) = match_label(trimmed) {
        return LineClass::Label(target, value);
    }
    LineClass::Text(trimmed.to_string())
}

/// Returns `true` if the line is command echo, a bare prompt, or one of the
/// banners devices print ahead of command output.
pub fn is_noise_line(trimmed: &str) -> bool {
    PATTERNS.command_echo.is_match(trimmed)
        || PATTERNS.bare_prompt.is_match(trimmed)
        || PATTERNS.banner.is_match(trimmed)
}
