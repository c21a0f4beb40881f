// ABOUTME: PDF generation module for the mdslides application
// ABOUTME: Tries an ordered list of HTML-to-PDF engines until one succeeds

use crate::errors::{Result, SlidesError};
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptionsBuilder};
use log::{debug, info, warn};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::time::Duration;
use tempfile::NamedTempFile;

// A4 in inches, as the DevTools protocol expects.
const A4_WIDTH_IN: f64 = 8.27;
const A4_HEIGHT_IN: f64 = 11.69;
// 2.5cm
const MARGIN_IN: f64 = 0.98;

/// The engines this crate knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    WeasyPrint,
    Chrome,
    Wkhtmltopdf,
}

impl EngineKind {
    /// Paged-media engine first, then the browser, then the legacy fallback.
    pub fn default_order() -> Vec<EngineKind> {
        vec![
            EngineKind::WeasyPrint,
            EngineKind::Chrome,
            EngineKind::Wkhtmltopdf,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            EngineKind::WeasyPrint => "weasyprint",
            EngineKind::Chrome => "chrome",
            EngineKind::Wkhtmltopdf => "wkhtmltopdf",
        }
    }

    /// Parse a comma-separated engine list such as `chrome,wkhtmltopdf`.
    pub fn parse_list(list: &str) -> Result<Vec<EngineKind>> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<EngineKind>().map_err(SlidesError::Config))
            .collect()
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weasyprint" => Ok(EngineKind::WeasyPrint),
            "chrome" | "chromium" => Ok(EngineKind::Chrome),
            "wkhtmltopdf" => Ok(EngineKind::Wkhtmltopdf),
            other => Err(format!(
                "Unknown PDF engine '{}' (expected weasyprint, chrome or wkhtmltopdf)",
                other
            )),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One HTML-to-PDF strategy.
pub trait PdfEngine {
    fn name(&self) -> &str;

    /// Whether the engine can be used on this machine at all.
    fn is_available(&self) -> bool;

    /// Render the HTML document at `html_file` into `output`.
    fn render(&self, html_file: &Path, output: &Path) -> Result<()>;
}

fn command_responds(program: &Path) -> bool {
    Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn run_tool(engine: &str, program: &Path, args: &[OsString], hint: &str) -> Result<()> {
    debug!("Running {:?} {:?}", program, args);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => SlidesError::ToolNotFound {
                tool: program.to_string_lossy().into_owned(),
                hint: hint.to_string(),
            },
            _ => SlidesError::Io(e),
        })?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(SlidesError::Pdf {
            engine: engine.to_string(),
            message: if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            },
        })
    }
}

/// WeasyPrint command-line tool; honours `@page` rules and page counters.
pub struct WeasyPrintEngine {
    program: PathBuf,
}

impl WeasyPrintEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PdfEngine for WeasyPrintEngine {
    fn name(&self) -> &str {
        EngineKind::WeasyPrint.name()
    }

    fn is_available(&self) -> bool {
        command_responds(&self.program)
    }

    fn render(&self, html_file: &Path, output: &Path) -> Result<()> {
        let args: Vec<OsString> = vec![
            "--encoding".into(),
            "utf-8".into(),
            html_file.into(),
            output.into(),
        ];
        run_tool(
            self.name(),
            &self.program,
            &args,
            "Install it with: pip install weasyprint",
        )
    }
}

/// wkhtmltopdf with A4 geometry and 2.5cm margins.
pub struct WkhtmltopdfEngine {
    program: PathBuf,
}

impl WkhtmltopdfEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn command_args(&self, html_file: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--quiet",
            "--page-size",
            "A4",
            "--margin-top",
            "2.5cm",
            "--margin-right",
            "2.5cm",
            "--margin-bottom",
            "2.5cm",
            "--margin-left",
            "2.5cm",
            "--encoding",
            "UTF-8",
            "--no-outline",
            "--enable-local-file-access",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(html_file.into());
        args.push(output.into());
        args
    }
}

impl PdfEngine for WkhtmltopdfEngine {
    fn name(&self) -> &str {
        EngineKind::Wkhtmltopdf.name()
    }

    fn is_available(&self) -> bool {
        command_responds(&self.program)
    }

    fn render(&self, html_file: &Path, output: &Path) -> Result<()> {
        run_tool(
            self.name(),
            &self.program,
            &self.command_args(html_file, output),
            "Install wkhtmltopdf from https://wkhtmltopdf.org/downloads.html",
        )
    }
}

/// Headless Chrome/Chromium printing through the DevTools protocol.
pub struct ChromeEngine {
    browser_path: Option<PathBuf>,
    timeout_ms: u64,
}

impl ChromeEngine {
    pub fn new(browser_path: Option<PathBuf>, timeout_ms: u64) -> Self {
        Self {
            browser_path,
            timeout_ms,
        }
    }

    fn print_options() -> PrintToPdfOptions {
        PrintToPdfOptions {
            print_background: Some(true),
            paper_width: Some(A4_WIDTH_IN),
            paper_height: Some(A4_HEIGHT_IN),
            margin_top: Some(MARGIN_IN),
            margin_bottom: Some(MARGIN_IN),
            margin_left: Some(MARGIN_IN),
            margin_right: Some(MARGIN_IN),
            prefer_css_page_size: Some(true),
            ..Default::default()
        }
    }
}

pub(crate) fn browser_error<E>(context: &str, e: E) -> SlidesError
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let source = e.into();
    SlidesError::Browser {
        message: format!("{}: {}", context, source),
        source: Some(source),
    }
}

impl PdfEngine for ChromeEngine {
    fn name(&self) -> &str {
        EngineKind::Chrome.name()
    }

    fn is_available(&self) -> bool {
        match &self.browser_path {
            Some(path) => path.exists(),
            None => headless_chrome::browser::default_executable().is_ok(),
        }
    }

    fn render(&self, html_file: &Path, output: &Path) -> Result<()> {
        let mut launch_options_builder = LaunchOptionsBuilder::default();
        launch_options_builder.headless(true);
        if let Some(path) = &self.browser_path {
            launch_options_builder.path(Some(path.clone()));
        }

        let launch_options = launch_options_builder
            .build()
            .map_err(|e| browser_error("Failed to build browser options", e.to_string()))?;

        info!("Launching headless browser");
        let browser =
            Browser::new(launch_options).map_err(|e| browser_error("Failed to launch browser", e))?;

        let html_path_abs = fs::canonicalize(html_file)?;
        let url = url::Url::from_file_path(&html_path_abs)
            .map_err(|_| browser_error("Cannot build file URL", html_path_abs.display().to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| browser_error("Failed to create new tab", e))?;

        tab.navigate_to(url.as_str())
            .map_err(|e| browser_error("Failed to navigate to HTML", e))?;
        tab.wait_until_navigated()
            .map_err(|e| browser_error("Navigation failed", e))?;
        tab.wait_for_element_with_custom_timeout("body", Duration::from_millis(self.timeout_ms))
            .map_err(|e| browser_error("Failed to wait for body element", e))?;

        let pdf = tab
            .print_to_pdf(Some(Self::print_options()))
            .map_err(|e| browser_error("Failed to print page", e))?;

        fs::write(output, pdf)?;
        Ok(())
    }
}

/// Ordered list of PDF engines tried one after another.
pub struct PdfRenderer {
    engines: Vec<Box<dyn PdfEngine>>,
}

impl PdfRenderer {
    pub fn new(engines: Vec<Box<dyn PdfEngine>>) -> Self {
        Self { engines }
    }

    pub fn engine_names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    /// Render an HTML document to `output`, returning the name of the engine used.
    ///
    /// The HTML is written to a temporary file inside `base_dir` (when given)
    /// so relative links in the document resolve against the source location.
    pub fn render_html(&self, html: &str, output: &Path, base_dir: Option<&Path>) -> Result<String> {
        let html_file = write_temp_html(html, base_dir)?;
        let mut attempts = Vec::new();

        for engine in &self.engines {
            let name = engine.name();

            if !engine.is_available() {
                debug!("PDF engine {} is not available, skipping", name);
                attempts.push(format!("{}: not available", name));
                continue;
            }

            info!("Rendering {:?} with {}", output, name);
            match engine.render(html_file.path(), output) {
                Ok(()) if output.is_file() => return Ok(name.to_string()),
                Ok(()) => {
                    warn!("PDF engine {} reported success but wrote no file", name);
                    attempts.push(format!("{}: no output written", name));
                }
                Err(e) => {
                    warn!("PDF engine {} failed: {}", name, e);
                    attempts.push(format!("{}: {}", name, e));
                }
            }
        }

        Err(SlidesError::NoPdfEngine { attempts })
    }
}

fn write_temp_html(html: &str, base_dir: Option<&Path>) -> Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".mdslides-").suffix(".html");

    let mut file = match base_dir {
        Some(dir) => builder.tempfile_in(dir).or_else(|e| {
            debug!("Cannot create temp file in {:?} ({}), using system temp", dir, e);
            builder.tempfile()
        })?,
        None => builder.tempfile()?,
    };

    file.write_all(html.as_bytes())?;
    file.flush()?;
    Ok(file)
}
