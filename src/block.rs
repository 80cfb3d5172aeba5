/// Inline text spans with formatting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    /// Source text not claimed by any inline rule.
    Text(String),
    Bold(Vec<Span>),
    Italic(Vec<Span>),
    /// Contents of a backtick pair. Never rewritten by later rules.
    Code(String),
    Link { url: String, content: Vec<Span> },
}

impl Span {
    pub fn text(text: impl Into<String>) -> Self {
        Span::Text(text.into())
    }
}

/// Block-level elements, one per rendered output line.
///
/// Lists are flat: a run of list-item lines produces `ListStart`, one
/// `ListItem` per line, then `ListEnd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, content: Vec<Span> },
    ListStart,
    ListItem { content: Vec<Span> },
    ListEnd,
    Paragraph { content: Vec<Span> },
    Blank,
}
