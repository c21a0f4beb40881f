// ABOUTME: Stylesheet handling for the mdslides application
// ABOUTME: Loads local, remote or built-in CSS and finds theme stylesheets

use crate::errors::{Result, SlidesError};
use log::info;
use reqwest::blocking::Client;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default A4 stylesheet for documents rendered from slide sources.
pub const DEFAULT_DOCS_CSS: &str = include_str!("../assets/docs-default.css");

/// Default A4 stylesheet for the course program.
pub const DEFAULT_PROGRAM_CSS: &str = include_str!("../assets/program-default.css");

/// File name looked up in the scripts directory for documents.
pub const DOCS_CSS_FILE_NAME: &str = "a4-docs-theme.css";

/// Where a stylesheet comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stylesheet {
    Local(PathBuf),
    Remote(String),
    Builtin(&'static str),
}

impl Stylesheet {
    /// Interpret a user-supplied location: URLs are remote, anything else a file.
    pub fn from_location(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Stylesheet::Remote(location.to_string())
        } else {
            Stylesheet::Local(PathBuf::from(location))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Stylesheet::Local(path) => path.display().to_string(),
            Stylesheet::Remote(url) => url.clone(),
            Stylesheet::Builtin(_) => "built-in default".to_string(),
        }
    }

    /// Get the CSS text.
    pub fn content(&self) -> Result<String> {
        match self {
            Stylesheet::Local(path) => read_local_content(path),
            Stylesheet::Remote(url) => fetch_remote_content(url),
            Stylesheet::Builtin(css) => Ok((*css).to_string()),
        }
    }
}

/// Fetch content from a remote URL with retry capability
fn fetch_remote_content(url: &str) -> Result<String> {
    info!("Fetching remote stylesheet: {}", url);

    let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

    let mut retry_delay = 1000;
    let mut last_error = None;

    for attempt in 1..=3 {
        match client.get(url).send() {
            Ok(response) if response.status().is_success() => return Ok(response.text()?),
            Ok(response) => {
                last_error = Some(SlidesError::Validation(format!(
                    "HTTP error: {}",
                    response.status()
                )));
            }
            Err(e) => last_error = Some(SlidesError::Fetch(e)),
        }

        if attempt < 3 {
            info!(
                "Fetch attempt {} failed, retrying in {} ms",
                attempt, retry_delay
            );
            std::thread::sleep(Duration::from_millis(retry_delay));
            retry_delay *= 2;
        }
    }

    Err(last_error
        .unwrap_or_else(|| SlidesError::Validation("Unknown error fetching resource".to_string())))
}

fn read_local_content(path: &Path) -> Result<String> {
    info!("Reading local stylesheet: {:?}", path);
    if !path.exists() {
        return Err(SlidesError::PathNotFound(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

/// First existing file among `candidates`.
fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| p.is_file()).cloned()
}

/// Stylesheet for documents: `<scripts_dir>/a4-docs-theme.css` or the built-in one.
pub fn find_docs_stylesheet(scripts_dir: Option<&Path>) -> Stylesheet {
    scripts_dir
        .map(|dir| dir.join(DOCS_CSS_FILE_NAME))
        .filter(|p| p.is_file())
        .map(Stylesheet::Local)
        .unwrap_or(Stylesheet::Builtin(DEFAULT_DOCS_CSS))
}

/// Stylesheet for the program: first `program.css` under the theme, else built-in.
pub fn find_program_stylesheet(theme_path: &Path) -> Stylesheet {
    let candidates = [
        theme_path.join("program.css"),
        theme_path.join("presentation").join("program.css"),
        theme_path.join("styles").join("program.css"),
    ];

    first_existing(&candidates)
        .map(Stylesheet::Local)
        .unwrap_or(Stylesheet::Builtin(DEFAULT_PROGRAM_CSS))
}
