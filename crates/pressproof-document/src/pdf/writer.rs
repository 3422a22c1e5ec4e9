// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: build new documents out of full-page rasters using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use pressproof_core::error::PressproofError;
use pressproof_core::pt_to_mm;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::image::raster::PixelBuffer;
use crate::model::{DocumentBuilder, RasterPageSink};

/// Creates a PDF where every page is one embedded RGB image.
///
/// Alpha is composited over white before embedding; the image is stretched to
/// cover the whole page.
pub struct RasterPdfWriter {
    doc: PdfDocument,
    /// Pages not yet handed to the document.
    pending: Vec<PdfPage>,
    pages: usize,
}

impl RasterPdfWriter {
    /// Create an empty writer whose document carries `title` as metadata.
    pub fn new(title: &str) -> Self {
        Self {
            doc: PdfDocument::new(title),
            pending: Vec::new(),
            pages: 0,
        }
    }
}

impl DocumentBuilder for RasterPdfWriter {
    fn page_count(&self) -> usize {
        self.pages
    }

    #[instrument(skip(self), fields(pages = self.pages))]
    fn save(&mut self) -> Result<Vec<u8>, PressproofError> {
        let pending = std::mem::take(&mut self.pending);
        if !pending.is_empty() {
            self.doc.with_pages(pending);
        }

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = self.doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings while saving");
        }

        info!(bytes = output.len(), "Raster PDF written");
        Ok(output)
    }
}

impl RasterPageSink for RasterPdfWriter {
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    fn add_raster_page(
        &mut self,
        image: &PixelBuffer,
        width_pt: f32,
        height_pt: f32,
    ) -> Result<(), PressproofError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(PressproofError::ImageError("cannot embed an empty raster".into()));
        }
        if !(width_pt.is_finite() && height_pt.is_finite() && width_pt > 0.0 && height_pt > 0.0) {
            return Err(PressproofError::ImageError(format!(
                "invalid page size {width_pt}x{height_pt}pt"
            )));
        }

        let raw = RawImage {
            pixels: RawImageData::U8(image.to_rgb8_over_white()),
            width: image.width() as usize,
            height: image.height() as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = self.doc.add_image(&raw);

        // At 72 dpi one pixel is one point; scale from there to the page.
        let scale_x = width_pt / image.width() as f32;
        let scale_y = height_pt / image.height() as f32;
        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                dpi: Some(72.0),
                rotate: None,
            },
        }];

        self.pending
            .push(PdfPage::new(Mm(pt_to_mm(width_pt)), Mm(pt_to_mm(height_pt)), ops));
        self.pages += 1;

        debug!(page = self.pages, width_pt, height_pt, "Raster page added");
        Ok(())
    }
}
