use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Match, Regex};

use crate::block::Span;
use crate::config::Config;
use crate::html;

/// Stands in for an already-built span when a rule scans its siblings.
const OPAQUE: char = '\u{FFFC}';

/// One inline rewrite: candidates found by `pattern`, filtered by `accept`,
/// turned into a span by `build`.
///
/// `build` receives the spans covered by capture group 1. Capture groups
/// listed in `plain_groups` must not cover an earlier span.
struct Rule {
    name: &'static str,
    pattern: Regex,
    accept: fn(&str, &Match) -> bool,
    plain_groups: &'static [usize],
    build: fn(&Captures, Vec<Span>) -> Span,
}

/// Rules in precedence order. Each one scans the output of the rules before
/// it, seeing earlier spans as opaque placeholders.
static RULES: LazyLock<[Rule; 4]> = LazyLock::new(|| {
    [
        Rule {
            name: "code",
            pattern: Regex::new(r"`([^`]+)`").expect("valid code span regex"),
            accept: always,
            plain_groups: &[1],
            build: |caps, _| Span::Code(caps[1].to_string()),
        },
        Rule {
            name: "bold",
            pattern: Regex::new(r"\*\*([^*]+)\*\*").expect("valid bold regex"),
            accept: always,
            plain_groups: &[],
            build: |_, inner| Span::Bold(inner),
        },
        Rule {
            name: "italic",
            pattern: Regex::new(r"\*([^*]+)\*").expect("valid italic regex"),
            accept: lone_asterisks,
            plain_groups: &[],
            build: |_, inner| Span::Italic(inner),
        },
        Rule {
            name: "link",
            pattern: Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"),
            accept: always,
            plain_groups: &[2],
            build: |caps, inner| Span::Link {
                url: caps[2].to_string(),
                content: inner,
            },
        },
    ]
});

fn always(_: &str, _: &Match) -> bool {
    true
}

/// Rejects an italic candidate whose delimiters touch another `*`.
fn lone_asterisks(text: &str, m: &Match) -> bool {
    let bytes = text.as_bytes();
    let before = m.start().checked_sub(1).map(|i| bytes[i]);
    let after = bytes.get(m.end()).copied();
    before != Some(b'*') && after != Some(b'*')
}

/// Parse one line of source text into inline spans.
pub fn parse_inline(line: &str) -> Vec<Span> {
    let mut spans = vec![Span::text(line)];
    for rule in RULES.iter() {
        spans = apply_rule(spans, rule);
    }
    spans
}

/// Transform one line of source text into HTML using default options.
pub fn format_inline(line: &str) -> String {
    let mut out = String::new();
    html::spans_to_html(&parse_inline(line), &Config::default(), &mut out);
    out
}

/// Apply `rule` inside existing spans first, then across this level.
fn apply_rule(spans: Vec<Span>, rule: &Rule) -> Vec<Span> {
    let spans = spans
        .into_iter()
        .map(|span| match span {
            Span::Bold(inner) => Span::Bold(apply_rule(inner, rule)),
            Span::Italic(inner) => Span::Italic(apply_rule(inner, rule)),
            Span::Link { url, content } => Span::Link {
                url,
                content: apply_rule(content, rule),
            },
            other => other,
        })
        .collect();
    scan_siblings(spans, rule)
}

/// Text of a span list, with each non-text span as one `OPAQUE` char, plus
/// the byte range each span occupies in it.
struct Haystack {
    text: String,
    ranges: Vec<Range<usize>>,
}

impl Haystack {
    fn new(spans: &[Span]) -> Self {
        let mut text = String::new();
        let mut ranges = Vec::with_capacity(spans.len());
        for span in spans {
            let start = text.len();
            match span {
                Span::Text(t) => text.push_str(t),
                _ => text.push(OPAQUE),
            }
            ranges.push(start..text.len());
        }
        Self { text, ranges }
    }

    /// Whether `range` covers only text leaves.
    fn is_plain(&self, spans: &[Span], range: &Range<usize>) -> bool {
        spans.iter().zip(&self.ranges).all(|(span, r)| {
            matches!(span, Span::Text(_)) || r.end <= range.start || r.start >= range.end
        })
    }

    /// The spans covering `range`, splitting text leaves at its edges.
    fn slice(&self, spans: &[Span], range: Range<usize>) -> Vec<Span> {
        let mut out = Vec::new();
        for (span, r) in spans.iter().zip(&self.ranges) {
            if r.end <= range.start || r.start >= range.end {
                continue;
            }
            match span {
                Span::Text(t) => {
                    let from = range.start.max(r.start) - r.start;
                    let to = range.end.min(r.end) - r.start;
                    out.push(Span::text(&t[from..to]));
                }
                other => out.push(other.clone()),
            }
        }
        out
    }
}

fn scan_siblings(spans: Vec<Span>, rule: &Rule) -> Vec<Span> {
    let hay = Haystack::new(&spans);
    let text = hay.text.as_str();
    let mut out = Vec::new();
    let mut last = 0;
    let mut pos = 0;

    while pos <= text.len() {
        let Some(caps) = rule.pattern.captures_at(text, pos) else {
            break;
        };
        let Some(m) = caps.get(0) else {
            break;
        };

        let plain = rule
            .plain_groups
            .iter()
            .filter_map(|&g| caps.get(g))
            .all(|g| hay.is_plain(&spans, &g.range()));

        if !plain || !(rule.accept)(text, &m) {
            // Retry one character past the rejected start.
            pos = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
            continue;
        }

        out.extend(hay.slice(&spans, last..m.start()));
        let inner = caps
            .get(1)
            .map(|g| hay.slice(&spans, g.range()))
            .unwrap_or_default();
        tracing::trace!(rule = rule.name, span = m.as_str(), "inline match");
        out.push((rule.build)(&caps, inner));
        last = m.end();
        pos = m.end();
    }

    if last == 0 {
        return spans;
    }
    out.extend(hay.slice(&spans, last..text.len()));
    out
}
