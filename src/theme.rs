// ABOUTME: Presentation theme configuration for the mdslides application
// ABOUTME: Holds optional visual elements and rewrites asset paths for Marp output

use std::path::{Path, PathBuf};

/// Optional visual settings applied to every generated Marp deck.
///
/// Absent fields silently omit the corresponding element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeConfig {
    pub theme: Option<String>,
    pub logo_left: Option<PathBuf>,
    pub logo_right: Option<PathBuf>,
    pub background: Option<PathBuf>,
    pub header_text: Option<String>,
    pub footer_text: Option<String>,
    pub stylesheet: Option<PathBuf>,
}

impl ThemeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn with_logos(mut self, left: Option<PathBuf>, right: Option<PathBuf>) -> Self {
        self.logo_left = left;
        self.logo_right = right;
        self
    }

    pub fn with_background(mut self, background: impl Into<PathBuf>) -> Self {
        self.background = Some(background.into());
        self
    }

    pub fn with_header(mut self, text: impl Into<String>) -> Self {
        self.header_text = Some(text.into());
        self
    }

    pub fn with_footer(mut self, text: impl Into<String>) -> Self {
        self.footer_text = Some(text.into());
        self
    }

    pub fn with_stylesheet(mut self, path: impl Into<PathBuf>) -> Self {
        self.stylesheet = Some(path.into());
        self
    }

    /// True when slides need injected header, footer or logo markup.
    pub fn has_decorations(&self) -> bool {
        self.logo_left.is_some()
            || self.logo_right.is_some()
            || self.header_text.is_some()
            || self.footer_text.is_some()
    }
}

/// Rewrite an asset path so the generated deck can find it.
///
/// Without a reference directory the path is returned untouched. Relative
/// paths collapse to `images/<file name>`, where the build copies assets.
/// Absolute paths become relative to the reference directory's parent when
/// they live beneath it and are otherwise kept as-is.
pub fn rewrite_asset_path(asset: &Path, reference_dir: Option<&Path>) -> String {
    let Some(reference_dir) = reference_dir else {
        return asset.to_string_lossy().into_owned();
    };

    if asset.is_absolute() {
        return reference_dir
            .parent()
            .and_then(|parent| asset.strip_prefix(parent).ok())
            .map(|rel| rel.to_string_lossy().into_owned())
            .unwrap_or_else(|| asset.to_string_lossy().into_owned());
    }

    match asset.file_name() {
        Some(name) => format!("images/{}", name.to_string_lossy()),
        None => asset.to_string_lossy().into_owned(),
    }
}
