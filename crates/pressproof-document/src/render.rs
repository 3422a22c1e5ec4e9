// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterisation through PDFium (`pdfium-render`). Only compiled with the
// "pdfium" feature; the PDFium shared library is bound at runtime, first from
// the working directory and then from the system library path.

use std::sync::OnceLock;

use pdfium_render::prelude::*;
use pressproof_core::error::PressproofError;
use tracing::{debug, info, instrument};

use crate::image::raster::PixelBuffer;
use crate::model::PageRenderer;

/// Process-wide PDFium binding. Documents borrow it for `'static`.
struct PdfiumHandle(Pdfium);

// SAFETY: built with pdfium-render's `thread_safe` feature, which serialises
// every call into the library.
unsafe impl Send for PdfiumHandle {}
unsafe impl Sync for PdfiumHandle {}

static PDFIUM: OnceLock<Result<PdfiumHandle, String>> = OnceLock::new();

fn pdfium() -> Result<&'static Pdfium, PressproofError> {
    let bound = PDFIUM.get_or_init(|| {
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map(|bindings| {
                info!("PDFium bound");
                PdfiumHandle(Pdfium::new(bindings))
            })
            .map_err(|err| format!("{:?}", err))
    });
    match bound {
        Ok(handle) => Ok(&handle.0),
        Err(reason) => {
            debug!(%reason, "PDFium library not found");
            Err(PressproofError::RendererUnavailable)
        }
    }
}

/// Renders pages of a document that PDFium parses once, on construction.
pub struct PdfiumRenderer {
    document: PdfDocument<'static>,
    pages: usize,
}

impl PdfiumRenderer {
    /// Bind PDFium (once per process) and open `bytes`, which the document
    /// keeps for its lifetime.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn new(bytes: Vec<u8>) -> Result<Self, PressproofError> {
        let document = pdfium()?
            .load_pdf_from_byte_vec(bytes, None)
            .map_err(|err| PressproofError::Render(format!("PDFium cannot open document: {:?}", err)))?;
        let pages = document.pages().len() as usize;
        Ok(Self { document, pages })
    }
}

impl PageRenderer for PdfiumRenderer {
    fn page_count(&self) -> usize {
        self.pages
    }

    #[instrument(skip(self))]
    fn render_page(&mut self, index: usize, scale: f32) -> Result<PixelBuffer, PressproofError> {
        if index >= self.pages {
            return Err(PressproofError::PageOutOfRange {
                page: index as u32 + 1,
                count: self.pages,
            });
        }

        let page = self
            .document
            .pages()
            .get(index as u16)
            .map_err(|err| PressproofError::Render(format!("page {} unavailable: {:?}", index + 1, err)))?;

        let pixel_width = ((page.width().value * scale).round() as i32).max(1);
        let pixel_height = ((page.height().value * scale).round() as i32).max(1);
        let bitmap = page
            .render_with_config(
                &PdfRenderConfig::new()
                    .set_target_width(pixel_width)
                    .set_target_height(pixel_height)
                    .render_form_data(true)
                    .render_annotations(true),
            )
            .map_err(|err| PressproofError::Render(format!("page {} failed to render: {:?}", index + 1, err)))?;

        let rgba = bitmap.as_image().to_rgba8();
        debug!(page = index + 1, width = rgba.width(), height = rgba.height(), "Page rendered");
        Ok(PixelBuffer::from_rgba_image(rgba))
    }
}
