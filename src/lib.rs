// ABOUTME: Library module for the mdslides program.
// ABOUTME: Contains the Marp, slide PDF and document PDF conversion pipelines.

// Reexport modules
pub mod config;
pub mod docs;
pub mod errors;
pub mod extensions;
pub mod html;
pub mod marp;
pub mod pdf;
pub mod render;
pub mod resources;
pub mod summary;
pub mod theme;
pub mod utils;
pub mod watch;

// Reexport common types and functions
pub use config::Config;
pub use docs::{convert_all_md_files, convert_md_to_pdf_doc, convert_program_to_pdf};
pub use errors::{Result, SlidesError};
pub use marp::{add_marp_header, add_slide_decorations, convert_md_to_marp, rewrite_slide_breaks};
pub use pdf::{EngineKind, PdfEngine, PdfRenderer};
pub use render::{MarpCli, SlideRenderer, generate_pdfs_from_marp};
pub use resources::Stylesheet;
pub use summary::ConversionSummary;
pub use theme::ThemeConfig;
pub use watch::{WatchConfig, watch_sources};

#[cfg(test)]
mod tests;
