use std::sync::LazyLock;

use regex::Regex;

use crate::block::Block;
use crate::inline::parse_inline;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,3})\s+(.*)$").expect("valid heading regex"));
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+").expect("valid list marker regex"));
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\r\n|[\n\r\x0b\x0c\x1c-\x1e\x{85}\x{2028}\x{2029}]")
        .expect("valid line break regex")
});

/// Split text into lines on any Unicode line boundary. A trailing break does
/// not start an extra empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = LINE_BREAK.split(text).collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}

/// What a single (trailing-whitespace-trimmed) line is, on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Heading { level: u8, text: &'a str },
    ListItem { text: &'a str },
    Blank,
    Text(&'a str),
}

/// Classify one line. Only 1-3 `#` form a heading; longer runs are text.
pub fn classify(line: &str) -> LineKind<'_> {
    let line = line.trim_end();

    if let Some(caps) = HEADING.captures(line) {
        let level = caps.get(1).map_or(1, |m| m.len()) as u8;
        let text = caps.get(2).map_or("", |m| m.as_str());
        return LineKind::Heading { level, text };
    }

    if let Some(marker) = LIST_MARKER.find(line) {
        return LineKind::ListItem {
            text: &line[marker.end()..],
        };
    }

    if line.is_empty() {
        LineKind::Blank
    } else {
        LineKind::Text(line)
    }
}

/// Parser state carried from one line to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserState {
    pub list_open: bool,
}

impl ParserState {
    /// Process one line, appending its blocks, and return the next state.
    pub fn step(self, line: &str, blocks: &mut Vec<Block>) -> ParserState {
        match classify(line) {
            LineKind::ListItem { text } => {
                if !self.list_open {
                    blocks.push(Block::ListStart);
                }
                blocks.push(Block::ListItem {
                    content: parse_inline(text),
                });
                ParserState { list_open: true }
            }
            LineKind::Heading { level, text } => {
                let next = self.finish(blocks);
                blocks.push(Block::Heading {
                    level,
                    content: parse_inline(text),
                });
                next
            }
            LineKind::Blank => {
                let next = self.finish(blocks);
                blocks.push(Block::Blank);
                next
            }
            LineKind::Text(text) => {
                let next = self.finish(blocks);
                blocks.push(Block::Paragraph {
                    content: parse_inline(text),
                });
                next
            }
        }
    }

    /// Close an open list, if any.
    pub fn finish(self, blocks: &mut Vec<Block>) -> ParserState {
        if self.list_open {
            blocks.push(Block::ListEnd);
        }
        ParserState { list_open: false }
    }
}

/// Parse markdown text into a list of blocks
pub fn parse(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let state = split_lines(markdown)
        .into_iter()
        .fold(ParserState::default(), |state, line| state.step(line, &mut blocks));
    state.finish(&mut blocks);
    blocks
}
