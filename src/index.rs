use std::collections::BTreeSet;

use crate::config::IndexConfig;

/// Output key for a source key: the last `.suffix` of the file name is
/// replaced with `.html`, so `notes/.md` becomes `notes/.html`.
pub fn output_key(input_key: &str) -> String {
    let name_start = input_key.rfind('/').map_or(0, |i| i + 1);
    let stem = match input_key[name_start..].rfind('.') {
        Some(dot) => &input_key[..name_start + dot],
        None => input_key,
    };
    format!("{stem}.html")
}

/// Whether a key names a Markdown source (case-insensitive `.md`).
pub fn is_markdown_key(key: &str) -> bool {
    key.to_lowercase().ends_with(".md")
}

/// Whether a key is a generated page that belongs in the index.
pub fn is_publishable_page(key: &str, index: &IndexConfig) -> bool {
    key.ends_with(".html") && key != index.file_name
}

/// Render the index page: a sorted, deduplicated list of links.
pub fn render_index<'a>(keys: impl IntoIterator<Item = &'a str>, index: &IndexConfig) -> String {
    let keys: BTreeSet<&str> = keys.into_iter().collect();

    let items: String = keys
        .iter()
        .map(|key| {
            format!(
                "<li><a href=\"{}\">{}</a></li>",
                html_escape::encode_double_quoted_attribute(key),
                html_escape::encode_text(key)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1><ul>{items}</ul></body></html>",
        title = html_escape::encode_text(&index.title)
    )
}
