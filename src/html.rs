use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::block::{Block, Span};
use crate::config::Config;

/// Content type of every page this crate produces.
pub const CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Convert blocks to the HTML body, one line per block.
pub fn blocks_to_html(blocks: &[Block], config: &Config) -> String {
    let mut out = String::new();
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        emit_block(block, config, &mut out);
    }
    out
}

/// Wrap rendered blocks in the page skeleton.
pub fn render_document(blocks: &[Block], generated_at: OffsetDateTime, config: &Config) -> String {
    let body = blocks_to_html(blocks, config);
    let stamp = format_timestamp(generated_at);
    let title = html_escape::encode_text(&config.page.title);
    let style = html_escape::encode_single_quoted_attribute(&config.page.banner_style);

    format!(
        "<!doctype html>\n\
         <html><head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n\
         <div style='{style}'>Generated: {stamp}</div>\n\
         {body}\n\
         </body></html>"
    )
}

/// ISO-8601 / RFC 3339 in UTC, e.g. `2024-05-01T09:30:00Z`.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    let utc = at.to_offset(time::UtcOffset::UTC);
    utc.format(&Rfc3339)
        .unwrap_or_else(|_| utc.unix_timestamp().to_string())
}

fn emit_block(block: &Block, config: &Config, out: &mut String) {
    match block {
        Block::Heading { level, content } => {
            out.push_str(&format!("<h{level}>"));
            spans_to_html(content, config, out);
            out.push_str(&format!("</h{level}>"));
        }
        Block::ListStart => out.push_str("<ul>"),
        Block::ListItem { content } => {
            out.push_str("<li>");
            spans_to_html(content, config, out);
            out.push_str("</li>");
        }
        Block::ListEnd => out.push_str("</ul>"),
        Block::Paragraph { content } => {
            out.push_str("<p>");
            spans_to_html(content, config, out);
            out.push_str("</p>");
        }
        Block::Blank => {}
    }
}

pub(crate) fn spans_to_html(spans: &[Span], config: &Config, out: &mut String) {
    for span in spans {
        span_to_html(span, config, out);
    }
}

fn span_to_html(span: &Span, config: &Config, out: &mut String) {
    match span {
        Span::Text(text) => push_text(text, config, out),
        Span::Bold(inner) => {
            out.push_str("<strong>");
            spans_to_html(inner, config, out);
            out.push_str("</strong>");
        }
        Span::Italic(inner) => {
            out.push_str("<em>");
            spans_to_html(inner, config, out);
            out.push_str("</em>");
        }
        Span::Code(text) => {
            out.push_str("<code>");
            push_text(text, config, out);
            out.push_str("</code>");
        }
        Span::Link { url, content } => {
            out.push_str("<a href=\"");
            if config.page.escape_html {
                out.push_str(&html_escape::encode_double_quoted_attribute(url));
            } else {
                out.push_str(url);
            }
            out.push('"');
            if config.links.new_tab {
                out.push_str(" target=\"_blank\"");
            }
            if !config.links.rel.is_empty() {
                out.push_str(" rel=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(
                    &config.links.rel,
                ));
                out.push('"');
            }
            out.push('>');
            spans_to_html(content, config, out);
            out.push_str("</a>");
        }
    }
}

fn push_text(text: &str, config: &Config, out: &mut String) {
    if config.page.escape_html {
        out.push_str(&html_escape::encode_text(text));
    } else {
        out.push_str(text);
    }
}
