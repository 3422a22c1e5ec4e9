// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pressproof-document: Document access for the Pressproof preflight engine.
//
// Defines the capability traits the engine works against (read model, page
// renderer, raster sink, box editor, page placer) and provides the default
// backends: lopdf for reading and editing, printpdf for raster output, and
// PDFium for rendering behind the "pdfium" feature.

pub mod image;
pub mod loader;
pub mod model;
pub mod pdf;
#[cfg(feature = "pdfium")]
pub mod render;

// Re-export the primary types so callers can use `pressproof_document::PdfLoader` etc.
pub use crate::image::PixelBuffer;
pub use loader::PdfLoader;
pub use model::{
    AnnotationInfo, BoxEditor, ColorFamily, DocumentBuilder, DocumentLoader, DocumentModel,
    DrawOp, FontResource, GraphicsState, PageBoxes, PageContent, PagePlacer, PageRenderer, PaintTarget,
    Placement, RasterPageSink, TextRun,
};
pub use pdf::{LopdfModel, PdfEditor, RasterPdfWriter};

#[cfg(feature = "pdfium")]
pub use render::PdfiumRenderer;
