// ABOUTME: Document-mode conversion for the mdslides application
// ABOUTME: Renders markdown sources and the course program to A4 PDF documents

use crate::errors::{Result, SlidesError};
use crate::html;
use crate::pdf::PdfRenderer;
use crate::resources::Stylesheet;
use crate::summary::ConversionSummary;
use crate::utils;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub const PROGRAM_TITLE: &str = "Course Program";

/// Source directory of a theme: `<theme>/presentation/md_src`.
pub fn md_src_dir(theme_path: &Path) -> PathBuf {
    theme_path.join("presentation").join("md_src")
}

/// Default output directory of a theme: `<theme>/presentation/pdf_docs`.
pub fn pdf_docs_dir(theme_path: &Path) -> PathBuf {
    theme_path.join("presentation").join("pdf_docs")
}

/// Build the standalone HTML for one slide source, slide breaks removed.
pub fn document_html(markdown: &str, title: &str, css: &str) -> String {
    let (markdown, removed) = html::strip_slide_breaks(markdown);
    if removed > 0 {
        warn!(
            "Removed {} dash-only lines from {} (slide breaks; horizontal rules written with dashes are removed too)",
            removed, title
        );
    }
    html::build_html_document(title, "es", css, &html::render_markdown(&markdown))
}

/// Build the standalone HTML for the program, rendered as written.
pub fn program_html(markdown: &str, css: &str) -> String {
    html::build_html_document(PROGRAM_TITLE, "en", css, &html::render_markdown(markdown))
}

/// Convert one Markdown file to `<output_dir>/<stem>.pdf`.
pub fn convert_md_to_pdf_doc(
    md_file: &Path,
    output_dir: &Path,
    css: &str,
    renderer: &PdfRenderer,
) -> Result<PathBuf> {
    utils::validate_file_exists(md_file)?;
    utils::ensure_directory_exists(output_dir)?;

    let output = utils::output_path_for(md_file, output_dir, "pdf")?;
    info!("Converting {:?} to {:?}", md_file, output);

    let title = md_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let markdown = fs::read_to_string(md_file)?;
    let document = document_html(&markdown, &title, css);

    let engine = renderer.render_html(&document, &output, md_file.parent())?;
    info!("PDF generated with {}: {:?}", engine, output);
    Ok(output)
}

/// Convert every source in `<theme>/presentation/md_src` to a PDF document.
///
/// `output_dir` defaults to `<theme>/presentation/pdf_docs`.
pub fn convert_all_md_files(
    theme_path: &Path,
    output_dir: Option<&Path>,
    stylesheet: &Stylesheet,
    renderer: &PdfRenderer,
) -> Result<ConversionSummary> {
    let src_dir = md_src_dir(theme_path);
    utils::validate_directory_exists(&src_dir)?;

    let md_files = utils::find_markdown_files(&src_dir)?;
    if md_files.is_empty() {
        return Err(SlidesError::NoMarkdownFiles(src_dir));
    }

    let output_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| pdf_docs_dir(theme_path));

    info!(
        "Found {} markdown files; stylesheet: {}; engines: {}",
        md_files.len(),
        stylesheet.describe(),
        renderer.engine_names().join(", ")
    );
    let css = stylesheet.content()?;

    let mut summary = ConversionSummary::new();
    for md_file in &md_files {
        let result = convert_md_to_pdf_doc(md_file, &output_dir, &css, renderer);
        summary.record(md_file, result);
    }

    Ok(summary)
}

/// Convert `<theme>/program.md` to a PDF, by default `<theme>/program.pdf`.
pub fn convert_program_to_pdf(
    theme_path: &Path,
    output: Option<&Path>,
    stylesheet: &Stylesheet,
    renderer: &PdfRenderer,
) -> Result<PathBuf> {
    utils::validate_directory_exists(theme_path)?;

    let program = theme_path.join("program.md");
    utils::validate_file_exists(&program)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| theme_path.join("program.pdf"));
    utils::ensure_parent_directory_exists(&output)?;

    info!(
        "Converting {:?} to {:?} using stylesheet {}",
        program,
        output,
        stylesheet.describe()
    );

    let markdown = fs::read_to_string(&program)?;
    let document = program_html(&markdown, &stylesheet.content()?);

    let engine = renderer.render_html(&document, &output, Some(theme_path))?;
    info!("PDF generated with {}: {:?}", engine, output);
    Ok(output)
}
