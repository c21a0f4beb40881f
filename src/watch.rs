// ABOUTME: Watch module for monitoring source changes and regenerating decks
// ABOUTME: Reconverts markdown to Marp (and optionally PDF) whenever sources change

use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};
use notify_debouncer_full::new_debouncer;

use crate::errors::{Result, SlidesError};
use crate::marp;
use crate::render::{self, SlideRenderer};
use crate::summary::ConversionSummary;
use crate::theme::ThemeConfig;
use crate::utils;

/// Configuration for watch mode
pub struct WatchConfig {
    /// Directory with the markdown sources
    pub md_src_dir: PathBuf,

    /// Output directory for Marp decks
    pub marp_dir: PathBuf,

    /// Output directory for slide PDFs, if they should be rebuilt too
    pub pdf_dir: Option<PathBuf>,

    /// Theme stylesheet passed to the slide renderer
    pub theme_css: Option<PathBuf>,

    /// Optional program file converted with the sources
    pub program_file: Option<PathBuf>,

    /// Visual settings for the decks
    pub theme: ThemeConfig,

    /// Debounce time in milliseconds
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            md_src_dir: PathBuf::new(),
            marp_dir: PathBuf::new(),
            pdf_dir: None,
            theme_css: None,
            program_file: None,
            theme: ThemeConfig::default(),
            debounce_ms: 500,
        }
    }
}

/// Absolute locations a rebuild depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTargets {
    /// Directory whose `.md` and `.css` files trigger a rebuild
    pub source_dir: PathBuf,

    /// Files outside the source directory that trigger a rebuild
    pub files: Vec<PathBuf>,
}

impl WatchTargets {
    /// Resolve the source directory, program file and stylesheet of `config`.
    pub fn resolve(config: &WatchConfig) -> Result<Self> {
        let source_dir = utils::get_absolute_path(&config.md_src_dir)?;

        let mut files = Vec::new();
        for file in [&config.program_file, &config.theme.stylesheet]
            .into_iter()
            .flatten()
        {
            let file = absolute_file_path(file)?;
            if !files.contains(&file) {
                files.push(file);
            }
        }

        Ok(Self { source_dir, files })
    }

    /// Directories to register with the watcher, source directory first.
    pub fn directories(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.source_dir.clone()];
        for parent in self.files.iter().filter_map(|f| f.parent()) {
            if parent.is_dir() && !dirs.iter().any(|d| d == parent) {
                dirs.push(parent.to_path_buf());
            }
        }
        dirs
    }

    /// Markdown and CSS files in the source directory, the program file and the stylesheet.
    pub fn is_relevant(&self, path: &Path) -> bool {
        if self.files.iter().any(|f| f == path) {
            return true;
        }

        if path.parent() != Some(self.source_dir.as_path()) {
            return false;
        }

        match path.extension() {
            Some(ext) => {
                let ext = ext.to_string_lossy().to_lowercase();
                ext == "md" || ext == "css"
            }
            None => false,
        }
    }
}

/// Absolute form of a file that may not exist yet; its parent is canonicalised when possible.
fn absolute_file_path(path: &Path) -> Result<PathBuf> {
    if let Ok(path) = utils::get_absolute_path(path) {
        return Ok(path);
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let parent = utils::get_absolute_path(&parent).or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(&parent))
            .map_err(SlidesError::Io)
    })?;

    Ok(match path.file_name() {
        Some(name) => parent.join(name),
        None => parent,
    })
}

/// Watch the sources and regenerate outputs on every relevant change.
///
/// The source directory is watched together with the directories holding the
/// program file and the stylesheet. Runs until the process is interrupted.
/// Regeneration errors are logged and the loop keeps going.
pub fn watch_sources(config: WatchConfig, renderer: &dyn SlideRenderer) -> Result<()> {
    utils::validate_directory_exists(&config.md_src_dir)?;
    utils::ensure_directory_exists(&config.marp_dir)?;

    if let Err(e) = regenerate_outputs(&config, renderer) {
        error!("Initial conversion failed: {}", e);
    }

    let targets = WatchTargets::resolve(&config)?;
    let (tx, rx) = mpsc::channel();

    let mut debouncer = new_debouncer(Duration::from_millis(config.debounce_ms), None, tx)
        .map_err(|e| SlidesError::Watch(format!("Failed to create file watcher: {}", e)))?;

    for dir in targets.directories() {
        debug!("Watching absolute path: {:?}", dir);
        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                SlidesError::Watch(format!(
                    "Failed to start watching directory {:?}: {}",
                    dir, e
                ))
            })?;
    }

    info!(
        "Watching for changes in {:?} (Press Ctrl+C to stop)",
        config.md_src_dir
    );

    let mut last_processed = Instant::now();

    for result in rx {
        match result {
            Ok(events) => {
                let relevant_changes = events.iter().any(|event| {
                    event.paths.iter().any(|path| {
                        let relevant = targets.is_relevant(path);
                        if relevant {
                            debug!("Detected relevant change in {:?}", path);
                        }
                        relevant
                    })
                });

                let now = Instant::now();
                if relevant_changes
                    && now.duration_since(last_processed) > Duration::from_millis(config.debounce_ms)
                {
                    match regenerate_outputs(&config, renderer) {
                        Ok(summary) => {
                            info!("Regenerated outputs: {}", summary.summary_line());
                            last_processed = now;
                        }
                        Err(e) => error!("Failed to regenerate outputs: {}", e),
                    }
                }
            }
            Err(errors) => error!("Watch error: {:?}", errors),
        }
    }

    Ok(())
}

/// Rebuild decks, then slide PDFs when configured.
pub fn regenerate_outputs(
    config: &WatchConfig,
    renderer: &dyn SlideRenderer,
) -> Result<ConversionSummary> {
    info!("Regenerating outputs...");

    let summary = marp::convert_md_to_marp(
        &config.md_src_dir,
        &config.marp_dir,
        &config.theme,
        config.program_file.as_deref(),
    )?;

    match &config.pdf_dir {
        Some(pdf_dir) if summary.is_complete() => render::generate_pdfs_from_marp(
            &config.marp_dir,
            pdf_dir,
            config.theme_css.as_deref(),
            renderer,
        ),
        _ => Ok(summary),
    }
}
