// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory fakes of the document capabilities for unit tests. Builders
// "save" by serialising what they were asked to do as JSON, so tests can
// decode and inspect it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::collections::HashMap;

use pressproof_core::error::{PressproofError, Result};
use pressproof_core::{PageGeometry, Rect, mm_to_pt};
use pressproof_document::{
    AnnotationInfo, BoxEditor, DocumentBuilder, DocumentLoader, DocumentModel, DrawOp, FontResource,
    PageBoxes, PageContent, PagePlacer, PageRenderer, PixelBuffer, Placement, RasterPageSink, TextRun,
};
use serde::{Deserialize, Serialize};

/// Bytes that make [`FakeLoader`] refuse to open anything.
pub const BROKEN: &[u8] = b"broken";

/// Call counter that is `Sync`, so fakes can sit inside a `DocumentLoader`.
#[derive(Debug, Default)]
pub struct Counter(AtomicUsize);

impl Counter {
    pub fn new(value: usize) -> Self {
        Self(AtomicUsize::new(value))
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, value: usize) {
        self.0.store(value, Ordering::Relaxed);
    }
}

impl Clone for Counter {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

#[derive(Debug, Clone)]
pub struct FakePage {
    pub geometry: PageGeometry,
    pub ops: Vec<DrawOp>,
    pub runs: Vec<TextRun>,
    pub fonts: HashMap<String, FontResource>,
    pub annotations: Vec<AnnotationInfo>,
    pub broken_ops: bool,
}

impl FakePage {
    /// Page of `width` × `height` points with no bleed.
    pub fn sized(width: f32, height: f32) -> Self {
        let trim = Rect::new(0.0, 0.0, width, height);
        Self {
            geometry: PageGeometry {
                width,
                height,
                media_box: trim,
                trim_box: trim,
                bleed_box: trim,
            },
            ops: Vec::new(),
            runs: Vec::new(),
            fonts: HashMap::new(),
            annotations: Vec::new(),
            broken_ops: false,
        }
    }

    /// 6 × 8 inch page.
    pub fn letter() -> Self {
        Self::sized(432.0, 576.0)
    }

    pub fn with_bleed_mm(mut self, mm: f32) -> Self {
        let bleed = self.geometry.trim_box.expand(mm_to_pt(mm));
        self.geometry.bleed_box = bleed;
        self.geometry.media_box = bleed;
        self
    }

    pub fn with_ops(mut self, ops: Vec<DrawOp>) -> Self {
        self.ops = ops;
        self
    }

    pub fn with_runs(mut self, runs: Vec<TextRun>) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_font(mut self, id: &str, font: FontResource) -> Self {
        self.fonts.insert(id.to_string(), font);
        self
    }

    pub fn with_annotation(mut self, subtype: &str) -> Self {
        self.annotations.push(AnnotationInfo {
            subtype: subtype.to_string(),
        });
        self
    }

    pub fn with_broken_ops(mut self) -> Self {
        self.broken_ops = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeDocument {
    pub pages: Vec<FakePage>,
    pub layers: Vec<String>,
    /// Number of `page_content` calls served.
    pub content_walks: Counter,
}

impl FakeDocument {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            layers: Vec::new(),
            content_walks: Counter::new(0),
        }
    }

    fn page(&self, index: usize) -> Result<&FakePage> {
        self.pages.get(index).ok_or(PressproofError::PageOutOfRange {
            page: index as u32 + 1,
            count: self.pages.len(),
        })
    }
}

impl DocumentModel for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_geometry(&self, index: usize) -> Result<PageGeometry> {
        Ok(self.page(index)?.geometry)
    }

    fn page_content(&self, index: usize) -> Result<PageContent> {
        self.content_walks.set(self.content_walks.get() + 1);
        let page = self.page(index)?;
        if page.broken_ops {
            return Err(PressproofError::PdfError("content stream does not parse".into()));
        }
        Ok(PageContent {
            ops: page.ops.clone(),
            text_runs: page.runs.clone(),
        })
    }

    fn resolve_font(&self, index: usize, font_id: &str) -> Result<FontResource> {
        self.page(index)?
            .fonts
            .get(font_id)
            .cloned()
            .ok_or_else(|| PressproofError::PdfError(format!("font /{font_id} not found")))
    }

    fn page_annotations(&self, index: usize) -> Result<Vec<AnnotationInfo>> {
        Ok(self.page(index)?.annotations.clone())
    }

    fn optional_content_order(&self) -> Result<Vec<String>> {
        Ok(self.layers.clone())
    }
}

/// Renders every page as a solid colour.
pub struct FakeRenderer {
    sizes: Vec<(f32, f32)>,
    rgba: [u8; 4],
}

impl PageRenderer for FakeRenderer {
    fn page_count(&self) -> usize {
        self.sizes.len()
    }

    fn render_page(&mut self, index: usize, scale: f32) -> Result<PixelBuffer> {
        let (width, height) = self.sizes.get(index).copied().ok_or(PressproofError::PageOutOfRange {
            page: index as u32 + 1,
            count: self.sizes.len(),
        })?;
        let px = |pt: f32| ((pt * scale).round() as u32).max(1);
        Ok(PixelBuffer::filled(px(width), px(height), self.rgba))
    }
}

/// What a [`FakeSink`] was given for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkPage {
    pub width_px: u32,
    pub height_px: u32,
    pub width_pt: f32,
    pub height_pt: f32,
    pub first_pixel: [u8; 4],
}

#[derive(Default)]
pub struct FakeSink {
    pages: Vec<SinkPage>,
}

impl DocumentBuilder for FakeSink {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn save(&mut self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.pages)?)
    }
}

impl RasterPageSink for FakeSink {
    fn add_raster_page(&mut self, image: &PixelBuffer, width_pt: f32, height_pt: f32) -> Result<()> {
        self.pages.push(SinkPage {
            width_px: image.width(),
            height_px: image.height(),
            width_pt,
            height_pt,
            first_pixel: image.pixel(0, 0).unwrap_or_default(),
        });
        Ok(())
    }
}

/// A sheet recorded by [`FakeEditor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub width: f32,
    pub height: f32,
    pub placements: Vec<Placement>,
}

/// Everything a [`FakeEditor`] was asked to do.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Edits {
    pub boxes: Vec<Option<PageBoxes>>,
    pub sheets: Vec<Sheet>,
}

pub struct FakeEditor {
    media_boxes: Vec<Rect>,
    edits: Edits,
}

impl DocumentBuilder for FakeEditor {
    fn page_count(&self) -> usize {
        if self.edits.sheets.is_empty() {
            self.media_boxes.len()
        } else {
            self.edits.sheets.len()
        }
    }

    fn save(&mut self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.edits)?)
    }
}

impl BoxEditor for FakeEditor {
    fn set_page_boxes(&mut self, index: usize, boxes: &PageBoxes) -> Result<()> {
        let slot = self.edits.boxes.get_mut(index).ok_or(PressproofError::PageOutOfRange {
            page: index as u32 + 1,
            count: self.media_boxes.len(),
        })?;
        *slot = Some(*boxes);
        Ok(())
    }
}

impl PagePlacer for FakeEditor {
    fn source_page_count(&self) -> usize {
        self.media_boxes.len()
    }

    fn source_media_box(&self, index: usize) -> Result<Rect> {
        self.media_boxes.get(index).copied().ok_or(PressproofError::PageOutOfRange {
            page: index as u32 + 1,
            count: self.media_boxes.len(),
        })
    }

    fn add_sheet(&mut self, width_pt: f32, height_pt: f32, placements: &[Placement]) -> Result<()> {
        self.edits.sheets.push(Sheet {
            width: width_pt,
            height: height_pt,
            placements: placements.to_vec(),
        });
        Ok(())
    }
}

/// Loader handing out fakes built from one [`FakeDocument`].
pub struct FakeLoader {
    pub document: FakeDocument,
    /// Colour of every rendered pixel.
    pub rgba: [u8; 4],
    pub renderer_available: bool,
}

impl FakeLoader {
    pub fn new(document: FakeDocument) -> Self {
        Self {
            document,
            rgba: [255, 255, 255, 255],
            renderer_available: true,
        }
    }

    fn check(bytes: &[u8]) -> Result<()> {
        if bytes == BROKEN {
            return Err(PressproofError::PdfError("not a PDF".into()));
        }
        Ok(())
    }
}

impl DocumentLoader for FakeLoader {
    fn load_model(&self, bytes: &[u8]) -> Result<Box<dyn DocumentModel>> {
        Self::check(bytes)?;
        Ok(Box::new(self.document.clone()))
    }

    fn load_renderer(&self, bytes: Vec<u8>) -> Result<Box<dyn PageRenderer>> {
        Self::check(&bytes)?;
        if !self.renderer_available {
            return Err(PressproofError::RendererUnavailable);
        }
        let sizes = self
            .document
            .pages
            .iter()
            .map(|page| (page.geometry.width, page.geometry.height))
            .collect();
        Ok(Box::new(FakeRenderer {
            sizes,
            rgba: self.rgba,
        }))
    }

    fn new_raster_sink(&self, _title: &str) -> Result<Box<dyn RasterPageSink>> {
        Ok(Box::new(FakeSink::default()))
    }

    fn open_box_editor(&self, bytes: &[u8]) -> Result<Box<dyn BoxEditor>> {
        Ok(Box::new(self.editor(bytes)?))
    }

    fn open_page_placer(&self, bytes: &[u8]) -> Result<Box<dyn PagePlacer>> {
        Ok(Box::new(self.editor(bytes)?))
    }
}

impl FakeLoader {
    fn editor(&self, bytes: &[u8]) -> Result<FakeEditor> {
        Self::check(bytes)?;
        let media_boxes: Vec<Rect> = self.document.pages.iter().map(|p| p.geometry.media_box).collect();
        Ok(FakeEditor {
            edits: Edits {
                boxes: vec![None; media_boxes.len()],
                sheets: Vec::new(),
            },
            media_boxes,
        })
    }
}

/// Decode what a fake builder saved.
pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> T {
    serde_json::from_slice(bytes).unwrap()
}
