// ABOUTME: Configuration module for the mdslides application
// ABOUTME: Provides tool locations and engine order from environment variables

use crate::errors::{Result, SlidesError};
use crate::pdf::{ChromeEngine, EngineKind, PdfEngine, PdfRenderer, WeasyPrintEngine, WkhtmltopdfEngine};
use crate::render::MarpCli;
use std::env;
use std::path::PathBuf;

const DEFAULT_TIMEOUT_MS: u64 = 30000;

/// Global configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub marp_path: PathBuf,
    pub browser_path: Option<PathBuf>,
    pub weasyprint_path: PathBuf,
    pub wkhtmltopdf_path: PathBuf,
    pub pdf_engines: Vec<EngineKind>,
    pub default_timeout_ms: u64,
    pub scripts_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            marp_path: PathBuf::from("marp"),
            browser_path: None,
            weasyprint_path: PathBuf::from("weasyprint"),
            wkhtmltopdf_path: PathBuf::from("wkhtmltopdf"),
            pdf_engines: EngineKind::default_order(),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            scripts_dir: None,
        }
    }
}

impl Config {
    /// Load tool locations from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let path_var = |name: &str| {
            env::var(name)
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
        };

        Self {
            marp_path: path_var("MARP_PATH").unwrap_or(defaults.marp_path),
            browser_path: path_var("BROWSER_PATH"),
            weasyprint_path: path_var("WEASYPRINT_PATH").unwrap_or(defaults.weasyprint_path),
            wkhtmltopdf_path: path_var("WKHTMLTOPDF_PATH").unwrap_or(defaults.wkhtmltopdf_path),
            scripts_dir: path_var("SCRIPTS_DIR"),
            ..defaults
        }
    }

    /// Apply `PDF_ENGINES` and `DEFAULT_TIMEOUT_MS`; only the document commands read them.
    pub fn with_pdf_settings_from_env(self) -> Result<Self> {
        self.with_pdf_settings(
            env::var("PDF_ENGINES").ok().as_deref(),
            env::var("DEFAULT_TIMEOUT_MS").ok().as_deref(),
        )
    }

    /// Apply an engine order and Chrome timeout given as raw setting values.
    pub fn with_pdf_settings(mut self, engines: Option<&str>, timeout_ms: Option<&str>) -> Result<Self> {
        if let Some(order) = engines.filter(|s| !s.trim().is_empty()) {
            self.pdf_engines = EngineKind::parse_list(order)?;
        }

        if let Some(value) = timeout_ms {
            self.default_timeout_ms = value.trim().parse::<u64>().map_err(|_| {
                SlidesError::Config(format!("DEFAULT_TIMEOUT_MS is not a number: {}", value))
            })?;
        }

        Ok(self)
    }

    /// Directory searched for the docs stylesheet: configured, else next to the executable.
    pub fn scripts_dir(&self) -> Option<PathBuf> {
        self.scripts_dir.clone().or_else(|| {
            env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
        })
    }

    /// Get the Marp CLI renderer for slide decks
    pub fn marp_renderer(&self) -> MarpCli {
        MarpCli::new(&self.marp_path)
    }

    /// Get the ordered PDF renderer with the configured engines
    pub fn pdf_renderer(&self) -> PdfRenderer {
        let engines: Vec<Box<dyn PdfEngine>> = self
            .pdf_engines
            .iter()
            .map(|kind| -> Box<dyn PdfEngine> {
                match kind {
                    EngineKind::WeasyPrint => {
                        Box::new(WeasyPrintEngine::new(&self.weasyprint_path))
                    }
                    EngineKind::Chrome => Box::new(ChromeEngine::new(
                        self.browser_path.clone(),
                        self.default_timeout_ms,
                    )),
                    EngineKind::Wkhtmltopdf => {
                        Box::new(WkhtmltopdfEngine::new(&self.wkhtmltopdf_path))
                    }
                }
            })
            .collect();

        PdfRenderer::new(engines)
    }
}
