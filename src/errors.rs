// ABOUTME: Error types for the mdslides application
// ABOUTME: Provides structured error handling for each conversion pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlidesError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to fetch remote resource: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Input validation error: {0}")]
    Validation(String),

    #[error("No markdown files found in {0}")]
    NoMarkdownFiles(PathBuf),

    #[error("{tool} failed on {file}: {message}")]
    Render {
        tool: String,
        file: PathBuf,
        message: String,
    },

    #[error("{tool} not found. {hint}")]
    ToolNotFound { tool: String, hint: String },

    #[error("Headless browser error: {message}")]
    Browser {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("PDF engine {engine} failed: {message}")]
    Pdf { engine: String, message: String },

    #[error("No PDF engine could render the document ({}). {}", .attempts.join("; "), PDF_INSTALL_HINT)]
    NoPdfEngine { attempts: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Watch error: {0}")]
    Watch(String),
}

/// Install guidance shown when every PDF engine is missing or failed.
pub const PDF_INSTALL_HINT: &str =
    "Install one of: weasyprint (pip install weasyprint), Chrome/Chromium, or wkhtmltopdf";

pub type Result<T> = std::result::Result<T, SlidesError>;
