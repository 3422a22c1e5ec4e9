// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability interfaces between the preflight engine and whatever PDF library
// backs it. The read side (`DocumentModel`, `PageRenderer`) and the write side
// (`RasterPageSink`, `BoxEditor`, `PagePlacer`) are kept apart so each
// pipeline only asks for what it uses.
//
// Page indices are 0-based everywhere in this module.

use pressproof_core::error::Result;
use pressproof_core::{PageGeometry, Rect};
use serde::{Deserialize, Serialize};

use crate::image::raster::PixelBuffer;

/// Colour model named by a colour operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorFamily {
    Rgb,
    Cmyk,
    Gray,
    /// Separation, DeviceN, Pattern, Lab, or anything unresolvable.
    Other,
}

/// Whether a colour operator targets fill or stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaintTarget {
    Fill,
    Stroke,
}

/// Entries of an `ExtGState` dictionary that matter for print.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphicsState {
    pub fill_alpha: Option<f32>,
    pub stroke_alpha: Option<f32>,
    pub soft_mask: bool,
    pub blend_mode: Option<String>,
    pub overprint_fill: bool,
    pub overprint_stroke: bool,
    pub overprint_mode: Option<i64>,
}

impl GraphicsState {
    /// Alpha below 1, a soft mask, or a non-normal blend mode.
    pub fn uses_transparency(&self) -> bool {
        let translucent = |alpha: Option<f32>| alpha.is_some_and(|a| a < 1.0);
        let blends = self
            .blend_mode
            .as_deref()
            .is_some_and(|mode| mode != "Normal" && mode != "Compatible");
        translucent(self.fill_alpha) || translucent(self.stroke_alpha) || self.soft_mask || blends
    }

    pub fn uses_overprint(&self) -> bool {
        self.overprint_fill || self.overprint_stroke || self.overprint_mode == Some(1)
    }
}

/// Neutral drawing-operator vocabulary produced by a [`DocumentModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawOp {
    SetColor {
        target: PaintTarget,
        family: ColorFamily,
    },
    SetGraphicsState(GraphicsState),
    /// An image was painted; pixel dimensions when the image declares them.
    PaintImage {
        width_px: Option<u32>,
        height_px: Option<u32>,
    },
    SetLineWidth(f32),
    Other(String),
}

/// One text-showing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Resource name of the font (e.g. `F1`).
    pub font_id: String,
    /// Rendered size in points, when the model could compute one.
    pub size: Option<f32>,
    /// Text matrix `[a b c d e f]` in effect when the run was shown.
    pub transform: [f32; 6],
}

impl TextRun {
    /// Size used for legibility checks: the explicit size if it is usable,
    /// otherwise the dominant scale component of the placement transform.
    pub fn effective_size(&self) -> Option<f32> {
        if let Some(size) = self.size.filter(|s| s.is_finite() && *s > 0.0) {
            return Some(size);
        }
        let [a, b, c, d, _, _] = self.transform;
        let scale = a.hypot(b).max(c.hypot(d));
        (scale.is_finite() && scale > 0.0).then_some(scale)
    }
}

/// Everything one walk of a page's content stream yields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub ops: Vec<DrawOp>,
    pub text_runs: Vec<TextRun>,
}

/// The font resource a text run's `font_id` resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontResource {
    /// Base font name as stored, subset prefix included.
    pub name: String,
    pub is_type3: bool,
}

/// A displayed annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationInfo {
    /// PDF subtype name, e.g. `Widget`, `Link`, `3D`.
    pub subtype: String,
}

/// Read-only view of a loaded document.
///
/// Every method may fail independently; callers treat a failure as "this
/// check learned nothing about this page" rather than aborting.
pub trait DocumentModel {
    fn page_count(&self) -> usize;

    fn page_geometry(&self, index: usize) -> Result<PageGeometry>;

    /// Drawing operators and text runs of a page, Form XObjects expanded.
    fn page_content(&self, index: usize) -> Result<PageContent>;

    fn resolve_font(&self, index: usize, font_id: &str) -> Result<FontResource>;

    fn page_annotations(&self, index: usize) -> Result<Vec<AnnotationInfo>>;

    /// Names of the optional-content groups in display order; empty when the
    /// document has no layers.
    fn optional_content_order(&self) -> Result<Vec<String>>;
}

/// Rasterises pages.
pub trait PageRenderer {
    fn page_count(&self) -> usize;

    /// Render a page at `scale` pixels per point.
    fn render_page(&mut self, index: usize, scale: f32) -> Result<PixelBuffer>;
}

/// Common surface of every document builder.
pub trait DocumentBuilder {
    fn page_count(&self) -> usize;

    /// Serialise the finished document.
    fn save(&mut self) -> Result<Vec<u8>>;
}

/// Builds a new document out of full-page raster images.
pub trait RasterPageSink: DocumentBuilder {
    /// Append a page of `width_pt` × `height_pt` filled by `image`.
    fn add_raster_page(&mut self, image: &PixelBuffer, width_pt: f32, height_pt: f32)
    -> Result<()>;
}

/// Geometry boxes written back to a page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageBoxes {
    pub media_box: Rect,
    pub bleed_box: Rect,
    pub trim_box: Rect,
    /// Crop box; the media box is used when `None`.
    pub crop_box: Option<Rect>,
}

/// Edits page geometry in place on a copy of the source document.
pub trait BoxEditor: DocumentBuilder {
    fn set_page_boxes(&mut self, index: usize, boxes: &PageBoxes) -> Result<()>;
}

/// One source page drawn onto an output sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// 0-based page of the source document.
    pub source_index: usize,
    /// Where the source media box's lower-left corner lands, in sheet points.
    pub x: f32,
    pub y: f32,
    /// Uniform scale applied to the source page.
    pub scale: f32,
}

/// Composes new sheets out of existing pages (imposition).
pub trait PagePlacer: DocumentBuilder {
    /// Number of pages in the source document available for placement.
    fn source_page_count(&self) -> usize;

    /// Media box of a source page.
    fn source_media_box(&self, index: usize) -> Result<Rect>;

    /// Append a sheet of the given size carrying `placements`. An empty slice
    /// yields a blank sheet.
    fn add_sheet(&mut self, width_pt: f32, height_pt: f32, placements: &[Placement]) -> Result<()>;
}

/// Opens documents from raw bytes.
pub trait DocumentLoader: Send + Sync {
    /// Parse a read-only model. The buffer is only borrowed.
    fn load_model(&self, bytes: &[u8]) -> Result<Box<dyn DocumentModel>>;

    /// Open a renderer. The renderer takes ownership of its buffer, so callers
    /// hand it a copy and keep the original readable.
    fn load_renderer(&self, bytes: Vec<u8>) -> Result<Box<dyn PageRenderer>>;

    fn new_raster_sink(&self, title: &str) -> Result<Box<dyn RasterPageSink>>;

    fn open_box_editor(&self, bytes: &[u8]) -> Result<Box<dyn BoxEditor>>;

    fn open_page_placer(&self, bytes: &[u8]) -> Result<Box<dyn PagePlacer>>;
}
