// ABOUTME: Slide rendering module for the mdslides application
// ABOUTME: Rasterizes Marp decks into PDF files through the Marp CLI

use crate::errors::{Result, SlidesError};
use crate::summary::ConversionSummary;
use crate::utils;
use log::{debug, info, warn};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Deck converted on its own into the theme root, never into the slide batch.
pub const PROGRAM_FILE_NAME: &str = "program.md";

/// Something that turns one Marp deck into one PDF.
pub trait SlideRenderer {
    fn name(&self) -> &str;

    fn render(&self, source: &Path, output: &Path, theme_css: Option<&Path>) -> Result<()>;
}

/// Renders decks by invoking the `marp` command-line tool.
#[derive(Debug, Clone)]
pub struct MarpCli {
    pub program: PathBuf,
}

impl MarpCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments passed to the CLI for one deck.
    pub fn command_args(
        &self,
        source: &Path,
        output: &Path,
        theme_css: Option<&Path>,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            source.into(),
            "--pdf".into(),
            "--output".into(),
            output.into(),
            "--allow-local-files".into(),
        ];
        if let Some(css) = theme_css {
            args.push("--theme".into());
            args.push(css.into());
        }
        args
    }
}

impl SlideRenderer for MarpCli {
    fn name(&self) -> &str {
        "marp"
    }

    fn render(&self, source: &Path, output: &Path, theme_css: Option<&Path>) -> Result<()> {
        let args = self.command_args(source, output, theme_css);
        debug!("Running {:?} {:?}", self.program, args);

        let result = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SlidesError::ToolNotFound {
                    tool: self.program.to_string_lossy().into_owned(),
                    hint: "Install the Marp CLI with: npm install -g @marp-team/marp-cli"
                        .to_string(),
                },
                _ => SlidesError::Io(e),
            })?;

        if result.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("exited with {}", result.status)
        } else {
            stderr
        };

        Err(SlidesError::Render {
            tool: self.name().to_string(),
            file: source.to_path_buf(),
            message,
        })
    }
}

/// Locate `<project_dir>/<theme>.css`, warning when it is missing.
pub fn resolve_theme_css(project_dir: &Path, theme: Option<&str>) -> Option<PathBuf> {
    let theme = theme?;
    let css = project_dir.join(format!("{}.css", theme));
    if css.is_file() {
        Some(css)
    } else {
        warn!("Theme file {:?} not found, using the default theme", css);
        None
    }
}

/// Render every Marp deck in `marp_dir` to `<pdf_dir>/<stem>.pdf`.
///
/// The program deck is skipped. A failed deck is recorded and the batch
/// moves on to the next one.
pub fn generate_pdfs_from_marp(
    marp_dir: &Path,
    pdf_dir: &Path,
    theme_css: Option<&Path>,
    renderer: &dyn SlideRenderer,
) -> Result<ConversionSummary> {
    utils::validate_directory_exists(marp_dir)?;

    let decks: Vec<PathBuf> = utils::find_markdown_files(marp_dir)?
        .into_iter()
        .filter(|p| p.file_name().map_or(true, |n| n != PROGRAM_FILE_NAME))
        .collect();

    if decks.is_empty() {
        return Err(SlidesError::NoMarkdownFiles(marp_dir.to_path_buf()));
    }

    utils::ensure_directory_exists(pdf_dir)?;

    info!(
        "Found {} Marp decks to render with {}",
        decks.len(),
        renderer.name()
    );

    let mut summary = ConversionSummary::new();
    for deck in &decks {
        let result = utils::output_path_for(deck, pdf_dir, "pdf").and_then(|pdf| {
            renderer.render(deck, &pdf, theme_css)?;
            Ok(pdf)
        });
        summary.record(deck, result);
    }

    Ok(summary)
}
