// ABOUTME: HTML generation module for the mdslides application
// ABOUTME: Converts document-mode markdown to a styled, standalone HTML page

use crate::extensions;
use comrak::{ComrakOptions, markdown_to_html};
use log::debug;

/// Whether a line is a slide-break artifact: only dashes, at least three.
pub fn is_slide_break(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-')
}

/// Remove every slide-break line, returning the text and how many were removed.
///
/// This also drops Markdown horizontal rules written as dashes; callers
/// should tell the user when the count is non-zero.
pub fn strip_slide_breaks(content: &str) -> (String, usize) {
    let mut removed = 0;
    let kept: Vec<&str> = content
        .split('\n')
        .filter(|line| {
            let is_break = is_slide_break(line);
            if is_break {
                removed += 1;
            }
            !is_break
        })
        .collect();

    (kept.join("\n"), removed)
}

/// Markdown options for documents: GFM tables, footnotes, definition lists and raw HTML.
pub fn document_options() -> ComrakOptions {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.footnotes = true;
    options.extension.description_lists = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.render.unsafe_ = true; // Allow raw HTML
    options
}

/// Render a document-mode Markdown body to an HTML fragment.
pub fn render_markdown(markdown: &str) -> String {
    let (markdown, abbreviations) = extensions::extract_abbreviations(markdown);
    let html = markdown_to_html(&markdown, &document_options());

    let html = extensions::apply_paragraph_attributes(&html);
    let (html, toc) = extensions::apply_heading_ids(&html);
    debug!("Collected {} headings", toc.len());
    let html = extensions::insert_toc(&html, &toc);

    extensions::apply_abbreviations(&html, &abbreviations)
}

/// Escape text for use inside an HTML element.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Wrap an HTML fragment in a standalone document with an embedded stylesheet.
pub fn build_html_document(title: &str, lang: &str, css: &str, body: &str) -> String {
    let mut html_doc = String::from("<!DOCTYPE html>\n");
    html_doc.push_str(&format!("<html lang=\"{}\">\n<head>\n", lang));
    html_doc.push_str("<meta charset=\"UTF-8\">\n");
    html_doc.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html_doc.push_str(&format!("<title>{}</title>\n", escape_text(title)));
    html_doc.push_str("<style>\n");
    html_doc.push_str(css);
    html_doc.push_str("\n</style>\n</head>\n<body>\n");
    html_doc.push_str(body);
    html_doc.push_str("</body>\n</html>\n");
    html_doc
}
