// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Default document loader: lopdf for reading and editing, printpdf for raster
// output, PDFium for rendering when the "pdfium" feature is enabled.

use pressproof_core::error::PressproofError;

use crate::model::{BoxEditor, DocumentLoader, DocumentModel, PagePlacer, PageRenderer, RasterPageSink};
use crate::pdf::{LopdfModel, PdfEditor, RasterPdfWriter};

/// Opens PDFs with the crate's built-in backends.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl PdfLoader {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for PdfLoader {
    fn load_model(&self, bytes: &[u8]) -> Result<Box<dyn DocumentModel>, PressproofError> {
        Ok(Box::new(LopdfModel::from_bytes(bytes)?))
    }

    #[cfg(feature = "pdfium")]
    fn load_renderer(&self, bytes: Vec<u8>) -> Result<Box<dyn PageRenderer>, PressproofError> {
        Ok(Box::new(crate::render::PdfiumRenderer::new(bytes)?))
    }

    #[cfg(not(feature = "pdfium"))]
    fn load_renderer(&self, _bytes: Vec<u8>) -> Result<Box<dyn PageRenderer>, PressproofError> {
        Err(PressproofError::RendererUnavailable)
    }

    fn new_raster_sink(&self, title: &str) -> Result<Box<dyn RasterPageSink>, PressproofError> {
        Ok(Box::new(RasterPdfWriter::new(title)))
    }

    fn open_box_editor(&self, bytes: &[u8]) -> Result<Box<dyn BoxEditor>, PressproofError> {
        Ok(Box::new(PdfEditor::from_bytes(bytes)?))
    }

    fn open_page_placer(&self, bytes: &[u8]) -> Result<Box<dyn PagePlacer>, PressproofError> {
        Ok(Box::new(PdfEditor::from_bytes(bytes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentBuilder;

    #[test]
    fn unparseable_bytes_are_pdf_errors() {
        let loader = PdfLoader::new();
        assert!(matches!(
            loader.load_model(b"%PDF-garbage").err(),
            Some(PressproofError::PdfError(_))
        ));
        assert!(loader.open_box_editor(b"").is_err());
    }

    #[cfg(not(feature = "pdfium"))]
    #[test]
    fn renderer_unavailable_without_pdfium() {
        let loader = PdfLoader::new();
        assert!(matches!(
            loader.load_renderer(Vec::new()).err(),
            Some(PressproofError::RendererUnavailable)
        ));
    }

    #[test]
    fn raster_sink_starts_empty() {
        let sink = PdfLoader::new().new_raster_sink("Empty").unwrap();
        assert_eq!(sink.page_count(), 0);
    }
}
