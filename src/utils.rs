// ABOUTME: Utility functions for the mdslides application
// ABOUTME: Provides path validation, directory creation and markdown discovery

use crate::errors::{Result, SlidesError};
use std::path::{Path, PathBuf};

/// Validate that a file exists
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(SlidesError::PathNotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(SlidesError::Validation(format!(
            "Path is not a file: {:?}",
            path
        )));
    }
    Ok(())
}

/// Validate that a directory exists
pub fn validate_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(SlidesError::PathNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(SlidesError::Validation(format!(
            "Path is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(SlidesError::Validation(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure a file's parent directory exists
pub fn ensure_parent_directory_exists(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory_exists(parent)?;
        }
    }
    Ok(())
}

/// Get the absolute path
pub fn get_absolute_path(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).map_err(|e| {
        SlidesError::Validation(format!("Failed to get absolute path for {:?}: {}", path, e))
    })
}

/// List the `*.md` files directly inside `dir`, sorted by path.
pub fn find_markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.md", glob::Pattern::escape(&dir.to_string_lossy()));

    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| SlidesError::Validation(format!("Invalid glob pattern: {}", e)))?
        .flatten()
        .filter(|p| p.is_file())
        .collect();

    files.sort();
    Ok(files)
}

/// Output path `<output_dir>/<input stem>.<extension>`.
pub fn output_path_for(input: &Path, output_dir: &Path, extension: &str) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| SlidesError::Validation(format!("Path has no file name: {:?}", input)))?;

    let mut name = stem.to_os_string();
    name.push(".");
    name.push(extension);
    Ok(output_dir.join(name))
}
