// ABOUTME: Markdown extension passes for the mdslides application
// ABOUTME: Adds heading ids, [TOC], attribute lists and abbreviations around comrak

//! comrak covers tables, footnotes and definition lists. The passes here add
//! what document sources also use:
//!
//! - heading ids, deduplicated, so headings can be linked
//! - a `[TOC]` paragraph replaced by a list of those headings
//! - `{#id .class key=value}` attribute lists at the end of headings and paragraphs
//! - `*[ABBR]: Expansion` definitions wrapped as `<abbr>` in the rendered text
//!
//! Abbreviations are pulled out of the Markdown before rendering; the other
//! passes work on comrak's HTML output.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashSet;

static RE_ABBR_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\*\[([^\]]+)\]:\s*(.*?)\s*$").unwrap());

static RE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<h([1-6])>(.*?)</h[1-6]>").unwrap());

static RE_PARAGRAPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<p>(.*?)</p>").unwrap());

static RE_TRAILING_ATTRS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\{:?\s*([^{}]+?)\s*\}\s*$").unwrap());

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

static RE_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&[A-Za-z0-9#]+;").unwrap());

static RE_TOC_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"<p>\s*\[TOC\]\s*</p>\n?").unwrap());

/// A heading collected for the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: usize,
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abbreviation {
    pub term: String,
    pub title: String,
}

/// Attributes parsed from a `{...}` attribute list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Attributes {
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub pairs: Vec<(String, String)>,
}

impl Attributes {
    /// Parse the inside of an attribute list. Any unrecognised token rejects the whole list.
    pub fn parse(list: &str) -> Option<Self> {
        let mut attrs = Attributes::default();

        for token in list.split_whitespace() {
            if let Some(id) = token.strip_prefix('#') {
                if !is_name(id) {
                    return None;
                }
                attrs.id = Some(id.to_string());
            } else if let Some(class) = token.strip_prefix('.') {
                if !is_name(class) {
                    return None;
                }
                attrs.classes.push(class.to_string());
            } else if let Some((key, value)) = token.split_once('=') {
                if !is_name(key) {
                    return None;
                }
                let value = value
                    .trim_start_matches("&quot;")
                    .trim_end_matches("&quot;")
                    .trim_matches('"');
                attrs.pairs.push((key.to_string(), value.to_string()));
            } else {
                return None;
            }
        }

        Some(attrs)
    }

    /// Render as HTML attributes with a leading space, `id` first.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(id) = &self.id {
            out.push_str(&format!(" id=\"{}\"", escape_attr(id)));
        }
        if !self.classes.is_empty() {
            out.push_str(&format!(" class=\"{}\"", escape_attr(&self.classes.join(" "))));
        }
        for (key, value) in &self.pairs {
            out.push_str(&format!(" {}=\"{}\"", key, escape_attr(value)));
        }
        out
    }
}

fn is_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == ':')
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Split a trailing attribute list off `inner`, if it has a valid one.
fn split_attributes(inner: &str) -> (&str, Option<Attributes>) {
    if let Some(caps) = RE_TRAILING_ATTRS.captures(inner) {
        if let Some(attrs) = Attributes::parse(&caps[1]) {
            let start = caps.get(0).map_or(inner.len(), |m| m.start());
            return (&inner[..start], Some(attrs));
        }
    }
    (inner, None)
}

/// Text of an HTML fragment with tags removed; entities stay escaped.
fn strip_tags(html: &str) -> String {
    RE_TAG.replace_all(html, "").trim().to_string()
}

/// GitHub-style anchor for a heading title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.trim().chars() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() {
            slug.push('-');
        }
    }
    if slug.is_empty() {
        slug.push_str("section");
    }
    slug
}

fn unique_id(base: String, seen: &mut HashSet<String>) -> String {
    let mut id = base.clone();
    let mut n = 1;
    while seen.contains(&id) {
        id = format!("{}-{}", base, n);
        n += 1;
    }
    seen.insert(id.clone());
    id
}

/// Give every heading an id (attribute-list ids win) and collect TOC entries.
pub fn apply_heading_ids(html: &str) -> (String, Vec<TocEntry>) {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    let output = RE_HEADING.replace_all(html, |caps: &Captures| {
        let level: usize = caps[1].parse().unwrap_or(1);
        let (inner, attrs) = split_attributes(&caps[2]);
        let mut attrs = attrs.unwrap_or_default();
        let title = strip_tags(inner);

        let id = match attrs.id.take() {
            Some(id) => {
                seen.insert(id.clone());
                id
            }
            None => unique_id(slugify(&RE_ENTITY.replace_all(&title, "")), &mut seen),
        };
        attrs.id = Some(id.clone());

        entries.push(TocEntry { level, id, title });
        format!("<h{level}{}>{}</h{level}>", attrs.render(), inner, level = level)
    });

    (output.into_owned(), entries)
}

/// Apply trailing `{...}` attribute lists on paragraphs.
pub fn apply_paragraph_attributes(html: &str) -> String {
    RE_PARAGRAPH
        .replace_all(html, |caps: &Captures| match split_attributes(&caps[1]) {
            (inner, Some(attrs)) => format!("<p{}>{}</p>", attrs.render(), inner),
            (_, None) => caps[0].to_string(),
        })
        .into_owned()
}

/// Render TOC entries as a nested-by-class list.
pub fn render_toc(entries: &[TocEntry]) -> String {
    let mut out = String::from("<nav class=\"toc\">\n<ul>\n");
    for entry in entries {
        out.push_str(&format!(
            "<li class=\"toc-level-{}\"><a href=\"#{}\">{}</a></li>\n",
            entry.level,
            escape_attr(&entry.id),
            entry.title
        ));
    }
    out.push_str("</ul>\n</nav>\n");
    out
}

/// Replace `[TOC]` paragraphs with the table of contents.
pub fn insert_toc(html: &str, entries: &[TocEntry]) -> String {
    if !RE_TOC_MARKER.is_match(html) {
        return html.to_string();
    }
    let toc = render_toc(entries);
    RE_TOC_MARKER
        .replace_all(html, regex::NoExpand(&toc))
        .into_owned()
}

/// Remove `*[TERM]: Title` definition lines and return them.
pub fn extract_abbreviations(markdown: &str) -> (String, Vec<Abbreviation>) {
    let mut abbreviations = Vec::new();
    let mut kept = Vec::new();

    for line in markdown.split('\n') {
        match RE_ABBR_DEF.captures(line) {
            Some(caps) => abbreviations.push(Abbreviation {
                term: caps[1].to_string(),
                title: caps[2].to_string(),
            }),
            None => kept.push(line),
        }
    }

    if abbreviations.is_empty() {
        return (markdown.to_string(), abbreviations);
    }
    (kept.join("\n"), abbreviations)
}

fn abbreviation_regex(abbreviations: &[Abbreviation]) -> Option<Regex> {
    let mut terms: Vec<&str> = abbreviations.iter().map(|a| a.term.as_str()).collect();
    terms.sort_by_key(|t| std::cmp::Reverse(t.len()));

    let alternatives: Vec<String> = terms
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| {
            let starts_word = t.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_');
            let ends_word = t.chars().last().is_some_and(|c| c.is_alphanumeric() || c == '_');
            format!(
                "{}{}{}",
                if starts_word { r"\b" } else { "" },
                regex::escape(t),
                if ends_word { r"\b" } else { "" }
            )
        })
        .collect();

    if alternatives.is_empty() {
        return None;
    }
    Regex::new(&format!("(?:{})", alternatives.join("|"))).ok()
}

/// Wrap abbreviation terms in text nodes, skipping code and existing `<abbr>`.
pub fn apply_abbreviations(html: &str, abbreviations: &[Abbreviation]) -> String {
    let Some(re) = abbreviation_regex(abbreviations) else {
        return html.to_string();
    };

    let title_of = |term: &str| {
        abbreviations
            .iter()
            .find(|a| a.term == term)
            .map(|a| escape_attr(&a.title))
            .unwrap_or_default()
    };

    let mut out = String::with_capacity(html.len());
    let mut skip_depth = 0usize;
    let mut last = 0;

    for tag in RE_TAG.find_iter(html) {
        let text = &html[last..tag.start()];
        out.push_str(&wrap_terms(text, &re, skip_depth, &title_of));

        let raw = tag.as_str();
        let name = raw
            .trim_start_matches('<')
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        if matches!(name.as_str(), "code" | "pre" | "abbr" | "script" | "style") {
            if raw.starts_with("</") {
                skip_depth = skip_depth.saturating_sub(1);
            } else {
                skip_depth += 1;
            }
        }

        out.push_str(raw);
        last = tag.end();
    }
    out.push_str(&wrap_terms(&html[last..], &re, skip_depth, &title_of));
    out
}

fn wrap_terms(text: &str, re: &Regex, skip_depth: usize, title_of: &dyn Fn(&str) -> String) -> String {
    if skip_depth > 0 || text.is_empty() {
        return text.to_string();
    }

    // Entities such as `&amp;` are copied through untouched.
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for entity in RE_ENTITY.find_iter(text) {
        out.push_str(&wrap_plain_text(&text[last..entity.start()], re, title_of));
        out.push_str(entity.as_str());
        last = entity.end();
    }
    out.push_str(&wrap_plain_text(&text[last..], re, title_of));
    out
}

fn wrap_plain_text(text: &str, re: &Regex, title_of: &dyn Fn(&str) -> String) -> String {
    re.replace_all(text, |caps: &Captures| {
        let term = &caps[0];
        format!("<abbr title=\"{}\">{}</abbr>", title_of(term), term)
    })
    .into_owned()
}
