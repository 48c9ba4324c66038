//! Report content rendering.
//!
//! Generated reports use a small line-oriented markup. Each input line becomes exactly one
//! [`DisplayBlock`], in order, with no merging or reordering. Classification is an ordered rule
//! table; the first matching rule wins:
//!
//! | Order | Line shape                          | Block          | Text                        |
//! |-------|-------------------------------------|----------------|-----------------------------|
//! | 1     | starts with `##`                    | `Heading`      | first `##` removed, trimmed |
//! | 2     | starts **and** ends with `**`       | `SubHeading`   | every `**` removed, trimmed |
//! | 3     | starts with `-`                     | `ListItem`     | first two chars removed     |
//! | 4     | one digit then `.` (e.g. `1.`)      | `NumberedItem` | whole line                  |
//! | 5     | empty                               | `LineBreak`    | none                        |
//! | 6     | anything else                       | `Paragraph`    | whole line                  |
//!
//! Rendering is total: there is no input for which it fails.

use serde::Serialize;

/// One rendered line of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum DisplayBlock {
    Heading(String),
    SubHeading(String),
    ListItem(String),
    NumberedItem(String),
    LineBreak,
    Paragraph(String),
}

impl DisplayBlock {
    /// Snake-case name of the block variant.
    pub fn kind(&self) -> &'static str {
        match self {
            DisplayBlock::Heading(_) => "heading",
            DisplayBlock::SubHeading(_) => "sub_heading",
            DisplayBlock::ListItem(_) => "list_item",
            DisplayBlock::NumberedItem(_) => "numbered_item",
            DisplayBlock::LineBreak => "line_break",
            DisplayBlock::Paragraph(_) => "paragraph",
        }
    }

    /// Display text, `None` for line breaks.
    pub fn text(&self) -> Option<&str> {
        match self {
            DisplayBlock::Heading(t)
            | DisplayBlock::SubHeading(t)
            | DisplayBlock::ListItem(t)
            | DisplayBlock::NumberedItem(t)
            | DisplayBlock::Paragraph(t) => Some(t),
            DisplayBlock::LineBreak => None,
        }
    }
}

/// A classification rule: when `matches` accepts a line, `build` produces its block.
struct Rule {
    name: &'static str,
    matches: fn(&str) -> bool,
    build: fn(&str) -> DisplayBlock,
}

/// Ordered rule table. The final rule accepts every line.
const RULES: &[Rule] = &[
    Rule {
        name: "heading",
        matches: is_heading,
        build: heading,
    },
    Rule {
        name: "sub_heading",
        matches: is_sub_heading,
        build: sub_heading,
    },
    Rule {
        name: "list_item",
        matches: is_list_item,
        build: list_item,
    },
    Rule {
        name: "numbered_item",
        matches: is_numbered_item,
        build: numbered_item,
    },
    Rule {
        name: "line_break",
        matches: str::is_empty,
        build: line_break,
    },
    Rule {
        name: "paragraph",
        matches: any_line,
        build: paragraph,
    },
];

fn is_heading(line: &str) -> bool {
    line.starts_with("##")
}

fn heading(line: &str) -> DisplayBlock {
    DisplayBlock::Heading(line.replacen("##", "", 1).trim().to_string())
}

fn is_sub_heading(line: &str) -> bool {
    line.starts_with("**") && line.ends_with("**")
}

fn sub_heading(line: &str) -> DisplayBlock {
    DisplayBlock::SubHeading(line.replace("**", "").trim().to_string())
}

fn is_list_item(line: &str) -> bool {
    line.starts_with('-')
}

// Marker plus following space; counted in chars so multibyte text cannot split.
fn list_item(line: &str) -> DisplayBlock {
    let text: String = line.chars().skip(2).collect();
    DisplayBlock::ListItem(text.trim().to_string())
}

fn is_numbered_item(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_digit() && bytes[1] == b'.'
}

fn numbered_item(line: &str) -> DisplayBlock {
    DisplayBlock::NumberedItem(line.to_string())
}

fn line_break(_line: &str) -> DisplayBlock {
    DisplayBlock::LineBreak
}

fn any_line(_line: &str) -> bool {
    true
}

fn paragraph(line: &str) -> DisplayBlock {
    DisplayBlock::Paragraph(line.to_string())
}

/// Classifies a single line.
pub fn render_line(line: &str) -> DisplayBlock {
    for rule in RULES {
        if (rule.matches)(line) {
            tracing::trace!(rule = rule.name, "classified report line");
            return (rule.build)(line);
        }
    }
    paragraph(line)
}

/// Renders report text into display blocks, one per line.
///
/// Lines are split with [`str::lines`]: a trailing `\r` is dropped, a final newline does not
/// start an extra line, and an empty string yields no blocks.
pub fn render(text: &str) -> Vec<DisplayBlock> {
    text.lines().map(render_line).collect()
}

/// Rendered form of a report, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RenderedReport {
    pub blocks: Vec<DisplayBlock>,
}

impl RenderedReport {
    pub fn from_text(text: &str) -> Self {
        Self {
            blocks: render(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
