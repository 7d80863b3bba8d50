//! PDF documents from HTML fragments
//!
//! A `DocumentRequest` arrives as JSON from the front end: HTML pages, an
//! optional stylesheet, header and footer, and layout options. This module
//! plans the page layout, hands it to a `DocumentRenderer`, and returns
//! the PDF base64-encoded, optionally also saving it to disk.
//!
//! Rendering itself (fonts, A4 layout, HTML parsing) is the renderer's
//! concern.

use anyhow::{bail, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::traits::{DocumentRenderer, FileStore};
use crate::utils::validation::{build_safe_filepath, validate_path_within_directory};

/// Where the rendered document goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Saved under the service's output directory
    SaveToFile,
    /// Returned to the caller as a string
    ReturnString,
    /// Returned for inline display
    Inline,
}

impl OutputMode {
    /// Maps the request's `output` value
    ///
    /// Missing or empty means `ReturnString`; unrecognised values fall
    /// back to `Inline`.
    pub fn from_request(output: Option<&str>) -> Self {
        match output {
            None | Some("") | Some("string") => OutputMode::ReturnString,
            Some("download") => OutputMode::SaveToFile,
            Some(_) => OutputMode::Inline,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocumentConfig {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    /// Draw the letterhead background image on every page
    #[serde(default)]
    pub background: bool,
    #[serde(default)]
    pub header_first_page_only: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageSource {
    pub html: String,
}

/// A document as posted by the front end
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocumentRequest {
    #[serde(default)]
    pub config: DocumentConfig,
    #[serde(default)]
    pub stylesheet: Option<String>,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub footer: Option<String>,
    #[serde(default)]
    pub pages: Vec<PageSource>,
}

impl DocumentRequest {
    pub fn output_mode(&self) -> OutputMode {
        OutputMode::from_request(self.config.output.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPage {
    /// Header HTML in effect on this page
    pub header: Option<String>,
    pub html: String,
}

/// Everything the renderer needs, page by page
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub stylesheet: Option<String>,
    pub footer: Option<String>,
    pub background_image: Option<PathBuf>,
    pub pages: Vec<PlannedPage>,
}

/// Plans the page sequence of a request
///
/// Every page carries the header, unless `header_first_page_only` is set,
/// in which case only the first page does. An empty stylesheet is dropped.
pub fn plan_layout(request: &DocumentRequest, background_image: &Path) -> DocumentLayout {
    let pages = request
        .pages
        .iter()
        .enumerate()
        .map(|(i, page)| PlannedPage {
            header: if i > 0 && request.config.header_first_page_only {
                None
            } else {
                request.header.clone()
            },
            html: page.html.clone(),
        })
        .collect();

    DocumentLayout {
        stylesheet: request.stylesheet.clone().filter(|css| !css.is_empty()),
        footer: request.footer.clone(),
        background_image: request
            .config
            .background
            .then(|| background_image.to_path_buf()),
        pages,
    }
}

/// A rendered document
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub mode: OutputMode,
    /// PDF bytes, base64-encoded
    pub base64: String,
    /// Where the PDF was written, for `SaveToFile`
    pub saved_to: Option<PathBuf>,
}

/// Renders document requests and delivers them per output mode
pub struct DocumentService {
    renderer: Arc<dyn DocumentRenderer>,
    files: Arc<dyn FileStore>,
    output_dir: PathBuf,
    background_image: PathBuf,
}

impl DocumentService {
    pub fn new(
        renderer: Arc<dyn DocumentRenderer>,
        files: Arc<dyn FileStore>,
        output_dir: PathBuf,
        background_image: PathBuf,
    ) -> Self {
        Self {
            renderer,
            files,
            output_dir,
            background_image,
        }
    }

    /// Renders `request` and returns the PDF as base64
    ///
    /// # Errors
    /// Returns an error if the request has no pages, rendering fails, or
    /// a `SaveToFile` request has no filename or cannot be written.
    pub fn create_pdf(&self, request: &DocumentRequest) -> Result<RenderedDocument> {
        if request.pages.is_empty() {
            bail!("Document has no pages");
        }

        let mode = request.output_mode();
        let layout = plan_layout(request, &self.background_image);
        let bytes = self.renderer.render(&layout)?;

        let saved_to = match mode {
            OutputMode::SaveToFile => Some(self.save(request, &bytes)?),
            OutputMode::ReturnString | OutputMode::Inline => None,
        };

        tracing::debug!(pages = layout.pages.len(), ?mode, "Rendered document");

        Ok(RenderedDocument {
            mode,
            base64: STANDARD.encode(&bytes),
            saved_to,
        })
    }

    fn save(&self, request: &DocumentRequest, bytes: &[u8]) -> Result<PathBuf> {
        let filename = match request.config.filename.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => bail!("Saving a document requires a filename"),
        };

        self.files.create_dir_all(&self.output_dir)?;
        let path = build_safe_filepath(&self.output_dir, filename);
        validate_path_within_directory(&path, &self.output_dir)?;
        self.files.write(&path, bytes)?;

        tracing::info!("Saved document to {:?}", path);
        Ok(path)
    }
}
