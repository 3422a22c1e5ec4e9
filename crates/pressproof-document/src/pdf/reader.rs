// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader. A `DocumentModel` over `lopdf`: page boxes, a classified walk
// of each page's content stream (Form XObjects expanded inline), text runs,
// font resources, annotations and optional-content groups.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use pressproof_core::error::PressproofError;
use pressproof_core::PageGeometry;
use tracing::{debug, instrument};

use super::objects::{
    dict_get, dict_name, dict_number, name_of, page_resources, rect_of, resolve, resolve_dict,
    resolve_inherited, resource_entry, text_of,
};
use crate::model::{
    AnnotationInfo, ColorFamily, DocumentModel, DrawOp, FontResource, GraphicsState, PageContent,
    PaintTarget, TextRun,
};

/// Nesting limit for Form XObjects drawn from Form XObjects.
const MAX_FORM_DEPTH: usize = 8;

/// Form XObject invocations expanded per page walk. A form that draws itself
/// several times grows exponentially with depth; past this the walk fails.
const MAX_FORM_EXPANSIONS: usize = 1_000;

/// Operators and text runs collected per page walk.
const MAX_PAGE_ITEMS: usize = 500_000;

/// Annotation flag bit 2: hidden.
const ANNOT_FLAG_HIDDEN: i64 = 1 << 1;

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m × n` for PDF row-vector matrices.
fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

/// Read-only document model backed by a parsed `lopdf::Document`.
pub struct LopdfModel {
    /// The underlying lopdf document.
    document: Document,
    /// Page object ids in page order.
    page_ids: Vec<ObjectId>,
}

impl LopdfModel {
    // -- Construction ---------------------------------------------------------

    /// Parse a model from raw PDF bytes. The bytes are only borrowed.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PressproofError> {
        let document = Document::load_mem(data).map_err(|err| {
            PressproofError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;
        Ok(Self::from_document(document))
    }

    /// Wrap an already-parsed document.
    pub fn from_document(document: Document) -> Self {
        let page_ids: Vec<ObjectId> = document.get_pages().values().copied().collect();
        debug!(pages = page_ids.len(), "PDF model ready");
        Self { document, page_ids }
    }

    // -- Helpers --------------------------------------------------------------

    fn page_id(&self, index: usize) -> Result<ObjectId, PressproofError> {
        self.page_ids
            .get(index)
            .copied()
            .ok_or(PressproofError::PageOutOfRange {
                page: index as u32 + 1,
                count: self.page_ids.len(),
            })
    }

    fn page_dict(&self, index: usize) -> Result<&Dictionary, PressproofError> {
        let page_id = self.page_id(index)?;
        self.document
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|err| PressproofError::PdfError(format!("page {} unreadable: {}", index + 1, err)))
    }

    fn walk_page(&self, index: usize) -> Result<PageContent, PressproofError> {
        let page_id = self.page_id(index)?;
        let content = self.document.get_page_content(page_id).map_err(|err| {
            PressproofError::PdfError(format!("page {} content unreadable: {}", index + 1, err))
        })?;
        let resources = page_resources(&self.document, page_id);

        let mut walker = ContentWalker::new(&self.document);
        walker.walk(&content, resources, IDENTITY, 0)?;
        debug!(
            page = index + 1,
            ops = walker.out.ops.len(),
            text_runs = walker.out.text_runs.len(),
            forms = walker.forms_expanded,
            "Content stream walked"
        );
        Ok(walker.out)
    }
}

impl DocumentModel for LopdfModel {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_geometry(&self, index: usize) -> Result<PageGeometry, PressproofError> {
        let page_id = self.page_id(index)?;
        let doc = &self.document;
        let inherited_box = |key: &[u8]| resolve_inherited(doc, page_id, key).and_then(|o| rect_of(doc, o));

        let media_box = inherited_box(b"MediaBox").ok_or_else(|| {
            PressproofError::PdfError(format!("page {} has no usable /MediaBox", index + 1))
        })?;
        let crop_box = inherited_box(b"CropBox").unwrap_or(media_box);

        let page = self.page_dict(index)?;
        let own_box = |key: &[u8]| page.get(key).ok().and_then(|o| rect_of(doc, o));
        let trim_box = own_box(b"TrimBox").unwrap_or(crop_box);
        let bleed_box = own_box(b"BleedBox").unwrap_or(trim_box);

        let rotation = resolve_inherited(doc, page_id, b"Rotate")
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0)
            .rem_euclid(360);
        let (width, height) = if rotation == 90 || rotation == 270 {
            (media_box.height(), media_box.width())
        } else {
            (media_box.width(), media_box.height())
        };

        Ok(PageGeometry {
            width,
            height,
            media_box,
            trim_box,
            bleed_box,
        })
    }

    #[instrument(skip(self))]
    fn page_content(&self, index: usize) -> Result<PageContent, PressproofError> {
        self.walk_page(index)
    }

    fn resolve_font(&self, index: usize, font_id: &str) -> Result<FontResource, PressproofError> {
        let page_id = self.page_id(index)?;
        let doc = &self.document;
        let resources = page_resources(doc, page_id).ok_or_else(|| {
            PressproofError::PdfError(format!("page {} has no /Resources", index + 1))
        })?;

        let font = find_font(doc, resources, font_id.as_bytes(), 0).ok_or_else(|| {
            PressproofError::PdfError(format!(
                "font /{} not found in page {} resources",
                font_id,
                index + 1
            ))
        })?;

        let is_type3 = dict_name(doc, font, b"Subtype").as_deref() == Some("Type3");
        let name = dict_name(doc, font, b"BaseFont")
            .or_else(|| dict_name(doc, font, b"Name"))
            .unwrap_or_else(|| font_id.to_string());
        Ok(FontResource { name, is_type3 })
    }

    fn page_annotations(&self, index: usize) -> Result<Vec<AnnotationInfo>, PressproofError> {
        let page = self.page_dict(index)?;
        let doc = &self.document;
        let Some(annots) = dict_get(doc, page, b"Annots") else {
            return Ok(Vec::new());
        };
        let annots = annots.as_array().map_err(|err| {
            PressproofError::PdfError(format!("page {} /Annots is not an array: {}", index + 1, err))
        })?;

        let mut found = Vec::new();
        for annot in annots {
            let Some(dict) = resolve_dict(doc, annot) else {
                continue;
            };
            let flags = dict_get(doc, dict, b"F").and_then(|f| f.as_i64().ok()).unwrap_or(0);
            if flags & ANNOT_FLAG_HIDDEN != 0 {
                continue;
            }
            if let Some(subtype) = dict_name(doc, dict, b"Subtype") {
                found.push(AnnotationInfo { subtype });
            }
        }
        Ok(found)
    }

    fn optional_content_order(&self) -> Result<Vec<String>, PressproofError> {
        let doc = &self.document;
        let catalog = doc
            .catalog()
            .map_err(|err| PressproofError::PdfError(format!("no catalog: {}", err)))?;
        let order = dict_get(doc, catalog, b"OCProperties")
            .and_then(|props| resolve_dict(doc, props))
            .and_then(|props| dict_get(doc, props, b"D"))
            .and_then(|config| resolve_dict(doc, config))
            .and_then(|config| dict_get(doc, config, b"Order"));

        let mut names = Vec::new();
        if let Some(Object::Array(entries)) = order {
            collect_group_names(doc, entries, 0, &mut names);
        }
        Ok(names)
    }
}

/// Flatten an `/Order` array into group names. Nested arrays are sub-trees;
/// bare strings inside them are labels, not groups.
fn collect_group_names(doc: &Document, entries: &[Object], depth: usize, names: &mut Vec<String>) {
    if depth > MAX_FORM_DEPTH {
        return;
    }
    for entry in entries {
        match resolve(doc, entry) {
            Some(Object::Array(nested)) => collect_group_names(doc, nested, depth + 1, names),
            Some(Object::Dictionary(group)) => {
                let name = dict_get(doc, group, b"Name")
                    .and_then(text_of)
                    .unwrap_or_else(|| "(unnamed layer)".to_string());
                names.push(name);
            }
            _ => {}
        }
    }
}

/// Find a font in `resources`, then in the resources of Form XObjects drawn
/// from them.
fn find_font<'a>(
    doc: &'a Document,
    resources: &'a Dictionary,
    font_id: &[u8],
    depth: usize,
) -> Option<&'a Dictionary> {
    if let Some(font) = resource_entry(doc, resources, b"Font", font_id).and_then(|f| resolve_dict(doc, f)) {
        return Some(font);
    }
    if depth >= MAX_FORM_DEPTH {
        return None;
    }
    let xobjects = resolve_dict(doc, resources.get(b"XObject").ok()?)?;
    for (_, xobject) in xobjects.iter() {
        let Some(Object::Stream(stream)) = resolve(doc, xobject) else {
            continue;
        };
        if dict_name(doc, &stream.dict, b"Subtype").as_deref() != Some("Form") {
            continue;
        }
        let found = dict_get(doc, &stream.dict, b"Resources")
            .and_then(|r| resolve_dict(doc, r))
            .and_then(|form_resources| find_font(doc, form_resources, font_id, depth + 1));
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Text state carried across operators inside one stream.
struct TextState {
    font_id: Option<String>,
    font_size: f32,
    matrix: Matrix,
    line_matrix: Matrix,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_id: None,
            font_size: 0.0,
            matrix: IDENTITY,
            line_matrix: IDENTITY,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn translate_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
        self.matrix = self.line_matrix;
    }
}

/// Classifies the operators of a content stream into [`DrawOp`]s and records
/// text runs.
struct ContentWalker<'a> {
    doc: &'a Document,
    out: PageContent,
    forms_expanded: usize,
}

impl<'a> ContentWalker<'a> {
    fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            out: PageContent::default(),
            forms_expanded: 0,
        }
    }

    fn walk(
        &mut self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
        ctm: Matrix,
        depth: usize,
    ) -> Result<(), PressproofError> {
        let content = Content::decode(content).map_err(|err| {
            PressproofError::PdfError(format!("content stream does not parse: {}", err))
        })?;

        let mut ctm = ctm;
        let mut ctm_stack: Vec<Matrix> = Vec::new();
        let mut text = TextState::default();
        let mut fill_family = ColorFamily::Gray;
        let mut stroke_family = ColorFamily::Gray;

        for op in &content.operations {
            if self.out.ops.len() + self.out.text_runs.len() > MAX_PAGE_ITEMS {
                return Err(PressproofError::PdfError(format!(
                    "content walk stopped after {MAX_PAGE_ITEMS} operators"
                )));
            }
            let operands = &op.operands;
            match op.operator.as_str() {
                // -- Graphics state --
                "q" => ctm_stack.push(ctm),
                "Q" => ctm = ctm_stack.pop().unwrap_or(ctm),
                "cm" => {
                    if let Some(m) = matrix_operand(operands) {
                        ctm = multiply(&m, &ctm);
                    }
                }
                "w" => {
                    if let Some(width) = number(operands, 0) {
                        self.out.ops.push(DrawOp::SetLineWidth(width));
                    }
                }
                "gs" => {
                    let state = operands
                        .first()
                        .and_then(|name| name.as_name().ok())
                        .zip(resources)
                        .and_then(|(name, res)| resource_entry(self.doc, res, b"ExtGState", name))
                        .and_then(|gs| resolve_dict(self.doc, gs))
                        .map(|gs| parse_ext_gstate(self.doc, gs))
                        .unwrap_or_default();
                    self.out.ops.push(DrawOp::SetGraphicsState(state));
                }

                // -- Colour --
                "rg" => self.color(PaintTarget::Fill, ColorFamily::Rgb),
                "RG" => self.color(PaintTarget::Stroke, ColorFamily::Rgb),
                "k" => self.color(PaintTarget::Fill, ColorFamily::Cmyk),
                "K" => self.color(PaintTarget::Stroke, ColorFamily::Cmyk),
                "g" => self.color(PaintTarget::Fill, ColorFamily::Gray),
                "G" => self.color(PaintTarget::Stroke, ColorFamily::Gray),
                "cs" => {
                    fill_family = self.color_space_operand(operands, resources);
                    self.color(PaintTarget::Fill, fill_family);
                }
                "CS" => {
                    stroke_family = self.color_space_operand(operands, resources);
                    self.color(PaintTarget::Stroke, stroke_family);
                }
                "sc" | "scn" => self.color(PaintTarget::Fill, fill_family),
                "SC" | "SCN" => self.color(PaintTarget::Stroke, stroke_family),

                // -- Images and forms --
                "Do" => self.draw_xobject(op, resources, ctm, depth)?,
                "BI" => self.out.ops.push(inline_image(operands)),

                // -- Text --
                "BT" => {
                    text.matrix = IDENTITY;
                    text.line_matrix = IDENTITY;
                }
                "Tf" => {
                    text.font_id = operands.first().and_then(name_of);
                    text.font_size = number(operands, 1).unwrap_or(0.0);
                }
                "TL" => text.leading = number(operands, 0).unwrap_or(0.0),
                "Tm" => {
                    if let Some(m) = matrix_operand(operands) {
                        text.matrix = m;
                        text.line_matrix = m;
                    }
                }
                "Td" => {
                    text.translate_line(number(operands, 0).unwrap_or(0.0), number(operands, 1).unwrap_or(0.0));
                }
                "TD" => {
                    let ty = number(operands, 1).unwrap_or(0.0);
                    text.leading = -ty;
                    text.translate_line(number(operands, 0).unwrap_or(0.0), ty);
                }
                "T*" => text.translate_line(0.0, -text.leading),
                "Tj" | "TJ" => self.text_run(&text, &ctm),
                "'" | "\"" => {
                    text.translate_line(0.0, -text.leading);
                    self.text_run(&text, &ctm);
                }

                other => self.out.ops.push(DrawOp::Other(other.to_string())),
            }
        }
        Ok(())
    }

    fn color(&mut self, target: PaintTarget, family: ColorFamily) {
        self.out.ops.push(DrawOp::SetColor { target, family });
    }

    fn text_run(&mut self, text: &TextState, ctm: &Matrix) {
        let Some(font_id) = text.font_id.clone() else {
            return;
        };
        let transform = multiply(&text.matrix, ctm);
        let vertical_scale = transform[2].hypot(transform[3]);
        let size = text.font_size.abs() * vertical_scale;
        self.out.text_runs.push(TextRun {
            font_id,
            size: (size.is_finite() && size > 0.0).then_some(size),
            transform,
        });
    }

    fn color_space_operand(&self, operands: &[Object], resources: Option<&Dictionary>) -> ColorFamily {
        let Some(name) = operands.first().and_then(|o| o.as_name().ok()) else {
            return ColorFamily::Other;
        };
        if let Some(family) = device_family(name) {
            return family;
        }
        resources
            .and_then(|res| resource_entry(self.doc, res, b"ColorSpace", name))
            .map(|space| color_space_family(self.doc, space, 0))
            .unwrap_or(ColorFamily::Other)
    }

    fn draw_xobject(
        &mut self,
        op: &Operation,
        resources: Option<&'a Dictionary>,
        ctm: Matrix,
        depth: usize,
    ) -> Result<(), PressproofError> {
        let doc = self.doc;
        let stream = op
            .operands
            .first()
            .and_then(|name| name.as_name().ok())
            .zip(resources)
            .and_then(|(name, res)| resource_entry(doc, res, b"XObject", name))
            .and_then(|xobject| match xobject {
                Object::Stream(stream) => Some(stream),
                _ => None,
            });
        let Some(stream) = stream else {
            self.out.ops.push(DrawOp::Other("Do".into()));
            return Ok(());
        };

        match dict_name(doc, &stream.dict, b"Subtype").as_deref() {
            Some("Image") => {
                let dim = |key: &[u8]| dict_number(doc, &stream.dict, key).map(|v| v.max(0.0) as u32);
                self.out.ops.push(DrawOp::PaintImage {
                    width_px: dim(b"Width"),
                    height_px: dim(b"Height"),
                });
            }
            Some("Form") if depth < MAX_FORM_DEPTH => {
                if self.forms_expanded >= MAX_FORM_EXPANSIONS {
                    return Err(PressproofError::PdfError(format!(
                        "Form XObject expansion stopped after {MAX_FORM_EXPANSIONS} invocations"
                    )));
                }
                self.forms_expanded += 1;
                let form_resources = dict_get(doc, &stream.dict, b"Resources")
                    .and_then(|r| resolve_dict(doc, r))
                    .or(resources);
                let form_matrix = dict_get(doc, &stream.dict, b"Matrix")
                    .and_then(|m| m.as_array().ok())
                    .and_then(|m| matrix_operand(m))
                    .unwrap_or(IDENTITY);
                let content = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                self.walk(&content, form_resources, multiply(&form_matrix, &ctm), depth + 1)?;
            }
            _ => self.out.ops.push(DrawOp::Other("Do".into())),
        }
        Ok(())
    }
}

/// Numeric operand `i`.
fn number(operands: &[Object], i: usize) -> Option<f32> {
    operands.get(i)?.as_float().ok().filter(|v| v.is_finite())
}

/// Six numeric operands as a matrix.
fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = IDENTITY;
    for (i, slot) in m.iter_mut().enumerate() {
        *slot = number(operands, i)?;
    }
    Some(m)
}

/// Colour family of a device colour-space name (full or inline-abbreviated).
fn device_family(name: &[u8]) -> Option<ColorFamily> {
    match name {
        b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(ColorFamily::Rgb),
        b"DeviceCMYK" | b"CMYK" => Some(ColorFamily::Cmyk),
        b"DeviceGray" | b"CalGray" | b"G" => Some(ColorFamily::Gray),
        b"Pattern" => Some(ColorFamily::Other),
        _ => None,
    }
}

/// Colour family of a colour-space resource object.
fn color_space_family(doc: &Document, space: &Object, depth: usize) -> ColorFamily {
    if depth > 4 {
        return ColorFamily::Other;
    }
    match resolve(doc, space) {
        Some(Object::Name(name)) => device_family(name).unwrap_or(ColorFamily::Other),
        Some(Object::Array(parts)) => {
            let Some(kind) = parts.first().and_then(|k| k.as_name().ok()) else {
                return ColorFamily::Other;
            };
            match kind {
                b"ICCBased" => {
                    let components = parts
                        .get(1)
                        .and_then(|s| resolve_dict(doc, s))
                        .and_then(|d| dict_number(doc, d, b"N"))
                        .unwrap_or(0.0) as u32;
                    match components {
                        1 => ColorFamily::Gray,
                        3 => ColorFamily::Rgb,
                        4 => ColorFamily::Cmyk,
                        _ => ColorFamily::Other,
                    }
                }
                b"Indexed" | b"I" => parts
                    .get(1)
                    .map(|base| color_space_family(doc, base, depth + 1))
                    .unwrap_or(ColorFamily::Other),
                other => device_family(other).unwrap_or(ColorFamily::Other),
            }
        }
        _ => ColorFamily::Other,
    }
}

/// Read the print-relevant entries of an `ExtGState` dictionary.
fn parse_ext_gstate(doc: &Document, gs: &Dictionary) -> GraphicsState {
    let flag = |key: &[u8]| dict_get(doc, gs, key).and_then(|v| v.as_bool().ok());
    let stroke_overprint = flag(b"OP");
    let fill_overprint = flag(b"op").or(stroke_overprint);

    let soft_mask = match dict_get(doc, gs, b"SMask") {
        None => false,
        Some(Object::Name(name)) => name.as_slice() != b"None",
        Some(_) => true,
    };
    let blend_mode = match dict_get(doc, gs, b"BM") {
        Some(Object::Array(modes)) => modes.first().and_then(name_of),
        Some(other) => name_of(other),
        None => None,
    };

    GraphicsState {
        fill_alpha: dict_number(doc, gs, b"ca"),
        stroke_alpha: dict_number(doc, gs, b"CA"),
        soft_mask,
        blend_mode,
        overprint_fill: fill_overprint.unwrap_or(false),
        overprint_stroke: stroke_overprint.unwrap_or(false),
        overprint_mode: dict_get(doc, gs, b"OPM").and_then(|v| v.as_i64().ok()),
    }
}

/// Inline image (`BI … ID … EI`): the parser hands over the image
/// dictionary, either bare or as the dictionary of a stream operand.
fn inline_image(operands: &[Object]) -> DrawOp {
    let dict = operands.iter().find_map(|operand| match operand {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    });
    let dim = |short: &[u8], long: &[u8]| {
        dict.and_then(|d| d.get(short).or_else(|_| d.get(long)).ok())
            .and_then(|v| v.as_i64().ok())
            .map(|v| v.max(0) as u32)
    };
    DrawOp::PaintImage {
        width_px: dim(b"W", b"Width"),
        height_px: dim(b"H", b"Height"),
    }
}
