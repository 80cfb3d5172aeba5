mod block;
mod config;
mod error;
mod html;
mod index;
mod inline;
mod parser;
pub mod pipeline;

pub use block::{Block, Span};
pub use config::{Config, ConfigError, DEFAULT_CONFIG, IndexConfig, LinksConfig, PageConfig};
pub use error::{PipelineError, StoreError};
pub use html::{CONTENT_TYPE, blocks_to_html, format_timestamp, render_document};
pub use index::{is_markdown_key, is_publishable_page, output_key, render_index};
pub use inline::{format_inline, parse_inline};
pub use parser::{LineKind, ParserState, classify};

use time::OffsetDateTime;

/// Parse markdown text into a vector of blocks.
pub fn parse(markdown: &str) -> Vec<Block> {
    parser::parse(markdown)
}

/// Convert markdown to a complete HTML page using default config.
pub fn markdown_to_html(markdown: &str) -> String {
    markdown_to_html_with_config(markdown, &Config::compiled_default())
}

/// Convert markdown to a complete HTML page with custom config, stamped with
/// the current time.
pub fn markdown_to_html_with_config(markdown: &str, config: &Config) -> String {
    markdown_to_html_at(markdown, config, OffsetDateTime::now_utc())
}

/// Convert markdown to a complete HTML page stamped with `generated_at`.
pub fn markdown_to_html_at(
    markdown: &str,
    config: &Config,
    generated_at: OffsetDateTime,
) -> String {
    let blocks = parse(markdown);
    tracing::debug!(bytes = markdown.len(), blocks = blocks.len(), "parsed");
    render_document(&blocks, generated_at, config)
}
