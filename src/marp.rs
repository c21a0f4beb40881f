// ABOUTME: Marp conversion module for the mdslides application
// ABOUTME: Injects Marp front matter, rewrites sub-slide markers and decorates slides

use crate::errors::{Result, SlidesError};
use crate::summary::ConversionSummary;
use crate::theme::{ThemeConfig, rewrite_asset_path};
use crate::utils;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Author-facing marker that starts a sub-slide inside the current section.
pub const SUB_SLIDE_MARKER: &str = "----";

/// Standard Marp slide separator.
pub const SLIDE_SEPARATOR: &str = "---";

const BASE_RULE: &str = "section { position: relative; }";

const HEADER_RULE: &str = "section .header-text { position: absolute; top: 5mm; left: 10mm; right: 10mm; text-align: center; font-size: 10pt; font-weight: bold; color: #333; background: rgba(255, 255, 255, 0.9); padding: 2mm 4mm; border-radius: 2mm; box-shadow: 0 1px 3px rgba(0,0,0,0.2); z-index: 20; display: flex; align-items: center; justify-content: space-between; }";

const HEADER_CENTER_RULE: &str = "section .header-text .header-center { flex: 1; text-align: center; }";

const FOOTER_RULE: &str = "section .footer-text { position: absolute; bottom: 5mm; left: 10mm; right: 10mm; text-align: center; font-size: 9pt; color: #666; background: rgba(255, 255, 255, 0.8); padding: 2mm 4mm; border-radius: 2mm; box-shadow: 0 1px 3px rgba(0,0,0,0.1); z-index: 20; }";

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

fn background_rule(url: &str) -> String {
    format!(
        "section {{ background-image: url('{}'); background-size: cover; background-position: center; background-repeat: no-repeat; }}",
        url
    )
}

/// Logo nested inside the header flex container.
fn header_logo_rule(side: Side, url: &str) -> String {
    format!(
        "section .header-text .logo-{side} {{ width: 25mm; height: 12mm; background-image: url('{url}'); background-size: contain; background-repeat: no-repeat; background-position: {side} center; flex-shrink: 0; }}",
        side = side.as_str(),
        url = url
    )
}

/// Logo pinned to a top corner when there is no header to hold it.
fn corner_logo_rule(side: Side, url: &str) -> String {
    format!(
        "section .logo-{side} {{ position: absolute; top: 5mm; {side}: 10mm; width: 25mm; height: 12mm; background-image: url('{url}'); background-size: contain; background-repeat: no-repeat; background-position: {side} center; z-index: 20; }}",
        side = side.as_str(),
        url = url
    )
}

/// Build a self-contained Marp document from plain Markdown.
///
/// `reference_dir` is the directory the deck will be written to; when given,
/// asset paths are rewritten with [`rewrite_asset_path`]. `extra_css` is
/// appended verbatim to the inline style block. No file I/O happens here.
pub fn add_marp_header(
    content: &str,
    theme: &ThemeConfig,
    reference_dir: Option<&Path>,
    extra_css: Option<&str>,
) -> String {
    let mut header = String::from("---\nmarp: true\n");

    if let Some(name) = &theme.theme {
        header.push_str(&format!("theme: {}\n", name));
    }

    let extra_css = extra_css.filter(|css| !css.trim().is_empty());
    let rules = style_rules(theme, reference_dir);

    if !rules.is_empty() || extra_css.is_some() {
        header.push_str("style: |\n");
        push_indented(&mut header, BASE_RULE);
        for rule in &rules {
            push_indented(&mut header, rule);
        }
        if let Some(css) = extra_css {
            for line in css.lines() {
                push_indented(&mut header, line);
            }
        }
    }

    header.push_str("---\n\n");

    if theme.has_decorations() {
        header.push_str(&add_slide_decorations(content, theme));
    } else {
        header.push_str(content);
    }

    header
}

fn push_indented(buffer: &mut String, line: &str) {
    if !line.trim().is_empty() {
        buffer.push_str("  ");
        buffer.push_str(line);
    }
    buffer.push('\n');
}

fn style_rules(theme: &ThemeConfig, reference_dir: Option<&Path>) -> Vec<String> {
    let mut rules = Vec::new();
    let asset = |path: &Path| rewrite_asset_path(path, reference_dir);

    if let Some(background) = &theme.background {
        rules.push(background_rule(&asset(background)));
    }

    let logos = [
        (Side::Left, theme.logo_left.as_deref()),
        (Side::Right, theme.logo_right.as_deref()),
    ];

    if theme.header_text.is_some() {
        rules.push(HEADER_RULE.to_string());
        for (side, logo) in logos {
            if let Some(logo) = logo {
                rules.push(header_logo_rule(side, &asset(logo)));
            }
        }
        rules.push(HEADER_CENTER_RULE.to_string());
    } else {
        for (side, logo) in logos {
            if let Some(logo) = logo {
                rules.push(corner_logo_rule(side, &asset(logo)));
            }
        }
    }

    if theme.footer_text.is_some() {
        rules.push(FOOTER_RULE.to_string());
    }

    rules
}

/// Compose the markup inserted after the first heading of a slide.
fn decoration_markup(theme: &ThemeConfig) -> String {
    let logo_left = theme.logo_left.is_some();
    let logo_right = theme.logo_right.is_some();
    let mut markup = String::new();

    match &theme.header_text {
        Some(text) => {
            markup.push_str("<div class=\"header-text\">");
            if logo_left {
                markup.push_str("<div class=\"logo-left\"></div>");
            }
            markup.push_str(&format!("<div class=\"header-center\">{}</div>", text));
            if logo_right {
                markup.push_str("<div class=\"logo-right\"></div>");
            }
            markup.push_str("</div>");
        }
        None => {
            if logo_left {
                markup.push_str("<div class=\"logo-left\"></div>");
            }
            if logo_right {
                markup.push_str("<div class=\"logo-right\"></div>");
            }
        }
    }

    if let Some(text) = &theme.footer_text {
        markup.push_str(&format!("<div class=\"footer-text\">{}</div>", text));
    }

    markup
}

/// Insert header, footer and logo markup after the first heading of each slide.
///
/// Slides are delimited by a `---` line. Slides without a heading are left
/// untouched, so content before the first heading is never decorated.
pub fn add_slide_decorations(content: &str, theme: &ThemeConfig) -> String {
    let markup = decoration_markup(theme);
    if markup.is_empty() {
        return content.to_string();
    }

    let delimiter = format!("\n{}\n", SLIDE_SEPARATOR);

    content
        .split(delimiter.as_str())
        .map(|slide| {
            if slide.trim().is_empty() {
                return slide.to_string();
            }

            let mut lines: Vec<&str> = slide.split('\n').collect();
            if let Some(idx) = lines.iter().position(|l| l.trim_start().starts_with('#')) {
                lines.insert(idx + 1, &markup);
            }
            lines.join("\n")
        })
        .collect::<Vec<String>>()
        .join(delimiter.as_str())
}

/// Level of an ATX heading line, if the line is one.
pub fn heading_level(line: &str) -> Option<usize> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }

    let rest = &trimmed[level..];
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(level)
    } else {
        None
    }
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Turn `----` sub-slide markers into standard slide separators.
///
/// Each marker becomes `---` plus a blank line, followed by the most recent
/// `#`/`##` heading and another blank line so the new slide keeps its section
/// title. Markers and headings inside fenced code blocks are left alone.
pub fn rewrite_slide_breaks(content: &str) -> String {
    let mut output: Vec<&str> = Vec::new();
    let mut last_heading: Option<&str> = None;
    let mut in_fence = false;

    for line in content.split('\n') {
        if is_fence(line) {
            in_fence = !in_fence;
        } else if !in_fence {
            if line.trim() == SUB_SLIDE_MARKER {
                output.push(SLIDE_SEPARATOR);
                output.push("");
                if let Some(heading) = last_heading {
                    output.push(heading);
                    output.push("");
                }
                continue;
            }

            if matches!(heading_level(line), Some(1 | 2)) {
                last_heading = Some(line);
            }
        }

        output.push(line);
    }

    output.join("\n")
}

/// Convert one Markdown file into a Marp deck inside `marp_dir`.
pub fn convert_file_to_marp(
    md_file: &Path,
    marp_dir: &Path,
    theme: &ThemeConfig,
    extra_css: Option<&str>,
) -> Result<PathBuf> {
    let file_name = md_file
        .file_name()
        .ok_or_else(|| SlidesError::Validation(format!("Not a file path: {:?}", md_file)))?;

    let content = fs::read_to_string(md_file)?;
    let rewritten = rewrite_slide_breaks(&content);
    let marp_content = add_marp_header(&rewritten, theme, Some(marp_dir), extra_css);

    let marp_file = marp_dir.join(file_name);
    fs::write(&marp_file, marp_content)?;

    debug!("Wrote Marp deck {:?}", marp_file);
    Ok(marp_file)
}

/// Convert every `*.md` in `md_src_dir` (and an optional program file) to Marp.
///
/// Per-file failures are recorded in the summary and do not stop the batch.
pub fn convert_md_to_marp(
    md_src_dir: &Path,
    marp_dir: &Path,
    theme: &ThemeConfig,
    program_file: Option<&Path>,
) -> Result<ConversionSummary> {
    utils::validate_directory_exists(md_src_dir)?;

    let md_files = utils::find_markdown_files(md_src_dir)?;
    if md_files.is_empty() {
        return Err(SlidesError::NoMarkdownFiles(md_src_dir.to_path_buf()));
    }

    utils::ensure_directory_exists(marp_dir)?;

    info!(
        "Found {} markdown files to convert to Marp in {:?}",
        md_files.len(),
        md_src_dir
    );

    let extra_css = load_stylesheet(theme.stylesheet.as_deref());
    let mut summary = ConversionSummary::new();

    for md_file in &md_files {
        let result = convert_file_to_marp(md_file, marp_dir, theme, extra_css.as_deref());
        summary.record(md_file, result);
    }

    if let Some(program) = program_file {
        if program.is_file() {
            let result = convert_file_to_marp(program, marp_dir, theme, extra_css.as_deref());
            summary.record(program, result);
        } else {
            warn!("Program file {:?} not found, skipping", program);
        }
    }

    Ok(summary)
}

fn load_stylesheet(path: Option<&Path>) -> Option<String> {
    let path = path?;
    match fs::read_to_string(path) {
        Ok(css) => {
            info!("Inlining stylesheet {:?}", path);
            Some(css)
        }
        Err(e) => {
            warn!("Could not read stylesheet {:?}: {}", path, e);
            None
        }
    }
}
