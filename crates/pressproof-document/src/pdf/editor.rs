// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF editor: in-place edits on a parsed copy of a source document using
// `lopdf`. Rewrites page geometry boxes, and composes imposition sheets by
// wrapping source pages as Form XObjects and drawing them onto new pages.

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use pressproof_core::Rect;
use pressproof_core::error::PressproofError;
use tracing::{debug, info, instrument};

use super::objects::{page_resources, rect_object, rect_of, resolve_inherited};
use crate::model::{BoxEditor, DocumentBuilder, PageBoxes, PagePlacer, Placement};

/// Editable copy of a source PDF.
///
/// Box edits apply to the source pages. Once any sheet has been added, the
/// saved document contains only the sheets; the source pages survive solely
/// as Form XObjects drawn by them.
pub struct PdfEditor {
    document: Document,
    /// Source page ids in page order.
    page_ids: Vec<ObjectId>,
    /// Root `/Pages` node.
    pages_root: ObjectId,
    /// Sheets added by [`PagePlacer::add_sheet`], in order.
    sheets: Vec<ObjectId>,
    /// Form XObject wrapping each source page, created on first use.
    forms: HashMap<usize, ObjectId>,
}

impl PdfEditor {
    /// Parse an editable copy of `data`. The caller's bytes are not touched.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PressproofError> {
        let document = Document::load_mem(data).map_err(|err| {
            PressproofError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        let pages_root = document
            .catalog()
            .map_err(|err| PressproofError::PdfError(format!("no catalog: {}", err)))?
            .get(b"Pages")
            .and_then(Object::as_reference)
            .map_err(|err| PressproofError::PdfError(format!("no /Pages reference: {}", err)))?;
        let page_ids: Vec<ObjectId> = document.get_pages().values().copied().collect();

        debug!(pages = page_ids.len(), "PDF opened for editing");
        Ok(Self {
            document,
            page_ids,
            pages_root,
            sheets: Vec::new(),
            forms: HashMap::new(),
        })
    }

    fn page_id(&self, index: usize) -> Result<ObjectId, PressproofError> {
        self.page_ids
            .get(index)
            .copied()
            .ok_or(PressproofError::PageOutOfRange {
                page: index as u32 + 1,
                count: self.page_ids.len(),
            })
    }

    /// Form XObject drawing source page `index` in its own coordinate space.
    fn page_form(&mut self, index: usize) -> Result<ObjectId, PressproofError> {
        if let Some(id) = self.forms.get(&index) {
            return Ok(*id);
        }
        let page_id = self.page_id(index)?;
        let media_box = self.source_media_box(index)?;
        let content = self.document.get_page_content(page_id).map_err(|err| {
            PressproofError::PdfError(format!("page {} content unreadable: {}", index + 1, err))
        })?;

        let mut form_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "FormType" => 1i64,
            "BBox" => rect_object(&media_box),
        };
        if let Some(resources) = page_resources(&self.document, page_id) {
            form_dict.set("Resources", Object::Dictionary(resources.clone()));
        }

        let form_id = self.document.add_object(Stream::new(form_dict, content));
        self.forms.insert(index, form_id);
        Ok(form_id)
    }
}

impl DocumentBuilder for PdfEditor {
    fn page_count(&self) -> usize {
        if self.sheets.is_empty() {
            self.page_ids.len()
        } else {
            self.sheets.len()
        }
    }

    #[instrument(skip(self), fields(sheets = self.sheets.len()))]
    fn save(&mut self) -> Result<Vec<u8>, PressproofError> {
        if !self.sheets.is_empty() {
            let kids: Vec<Object> = self.sheets.iter().map(|id| Object::Reference(*id)).collect();
            let count = kids.len() as i64;
            let root = self
                .document
                .get_object_mut(self.pages_root)
                .and_then(Object::as_dict_mut)
                .map_err(|err| PressproofError::PdfError(format!("/Pages unreadable: {}", err)))?;
            root.set("Kids", Object::Array(kids));
            root.set("Count", Object::Integer(count));

            let pruned = self.document.prune_objects();
            debug!(pruned = pruned.len(), "Unreferenced source objects dropped");
        }

        let mut output = Vec::new();
        self.document.save_to(&mut output).map_err(|err| {
            PressproofError::PdfError(format!("failed to serialise PDF: {}", err))
        })?;

        info!(bytes = output.len(), pages = self.page_count(), "Edited PDF written");
        Ok(output)
    }
}

impl BoxEditor for PdfEditor {
    fn set_page_boxes(&mut self, index: usize, boxes: &PageBoxes) -> Result<(), PressproofError> {
        let page_id = self.page_id(index)?;
        let page = self
            .document
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| PressproofError::PdfError(format!("page {} unreadable: {}", index + 1, err)))?;

        page.set("MediaBox", rect_object(&boxes.media_box));
        page.set("BleedBox", rect_object(&boxes.bleed_box));
        page.set("TrimBox", rect_object(&boxes.trim_box));
        page.set("CropBox", rect_object(&boxes.crop_box.unwrap_or(boxes.media_box)));
        Ok(())
    }
}

impl PagePlacer for PdfEditor {
    fn source_page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn source_media_box(&self, index: usize) -> Result<Rect, PressproofError> {
        let page_id = self.page_id(index)?;
        resolve_inherited(&self.document, page_id, b"MediaBox")
            .and_then(|o| rect_of(&self.document, o))
            .ok_or_else(|| PressproofError::PdfError(format!("page {} has no usable /MediaBox", index + 1)))
    }

    #[instrument(skip(self, placements), fields(placed = placements.len()))]
    fn add_sheet(
        &mut self,
        width_pt: f32,
        height_pt: f32,
        placements: &[Placement],
    ) -> Result<(), PressproofError> {
        let mut xobjects = Dictionary::new();
        let mut operations = Vec::new();

        for (slot, placement) in placements.iter().enumerate() {
            let form_id = self.page_form(placement.source_index)?;
            let media_box = self.source_media_box(placement.source_index)?;
            let name = format!("P{}", slot);
            xobjects.set(name.as_bytes().to_vec(), Object::Reference(form_id));

            let s = placement.scale;
            let tx = placement.x - media_box.x0 * s;
            let ty = placement.y - media_box.y0 * s;
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![
                    Object::Real(s),
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(s),
                    Object::Real(tx),
                    Object::Real(ty),
                ],
            ));
            operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
            operations.push(Operation::new("Q", vec![]));
        }

        let content = Content { operations }
            .encode()
            .map_err(|err| PressproofError::PdfError(format!("failed to encode sheet content: {}", err)))?;
        let content_id = self.document.add_object(Stream::new(Dictionary::new(), content));

        let sheet_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_root,
            "MediaBox" => rect_object(&Rect::new(0.0, 0.0, width_pt, height_pt)),
            "Rotate" => 0i64,
            "Contents" => content_id,
            "Resources" => dictionary! { "XObject" => xobjects },
        });
        self.sheets.push(sheet_id);

        debug!(sheet = self.sheets.len(), width_pt, height_pt, "Sheet added");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentModel;
    use crate::pdf::reader::LopdfModel;

    /// `pages` pages of 300 × 400 pt, each drawing a filled rectangle.
    fn sample_pdf(pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..pages {
            let content_id = doc.add_object(Stream::new(
                Dictionary::new(),
                b"0 0 1 rg 10 10 50 50 re f".to_vec(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 300.into(), 400.into()],
                "Contents" => content_id,
                "Resources" => Dictionary::new(),
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn boxes_are_written_back() {
        let mut editor = PdfEditor::from_bytes(&sample_pdf(1)).unwrap();
        let trim = Rect::new(0.0, 0.0, 300.0, 400.0);
        let media = trim.expand(8.5);
        editor
            .set_page_boxes(
                0,
                &PageBoxes {
                    media_box: media,
                    bleed_box: media,
                    trim_box: trim,
                    crop_box: None,
                },
            )
            .unwrap();
        let bytes = editor.save().unwrap();

        let model = LopdfModel::from_bytes(&bytes).unwrap();
        let geometry = model.page_geometry(0).unwrap();
        assert!(geometry.media_box.approx_eq(&media, 0.01));
        assert!(geometry.bleed_box.approx_eq(&media, 0.01));
        assert!(geometry.trim_box.approx_eq(&trim, 0.01));
    }

    #[test]
    fn sheets_replace_source_pages() {
        let mut editor = PdfEditor::from_bytes(&sample_pdf(3)).unwrap();
        assert_eq!(editor.source_page_count(), 3);
        assert_eq!(editor.source_media_box(1).unwrap(), Rect::new(0.0, 0.0, 300.0, 400.0));

        let placements = [
            Placement { source_index: 2, x: 10.0, y: 10.0, scale: 0.5 },
            Placement { source_index: 0, x: 200.0, y: 10.0, scale: 0.5 },
        ];
        editor.add_sheet(420.0, 300.0, &placements).unwrap();
        editor.add_sheet(420.0, 300.0, &[]).unwrap();
        assert_eq!(editor.page_count(), 2);

        let bytes = editor.save().unwrap();
        let model = LopdfModel::from_bytes(&bytes).unwrap();
        assert_eq!(model.page_count(), 2);
        assert_eq!(model.page_geometry(0).unwrap().width, 420.0);

        // Both placed pages draw their blue rectangle through the forms.
        let ops = model.page_content(0).unwrap().ops;
        let rgb_fills = ops
            .iter()
            .filter(|op| matches!(op, crate::model::DrawOp::SetColor { family: crate::model::ColorFamily::Rgb, .. }))
            .count();
        assert_eq!(rgb_fills, 2);
        assert!(model.page_content(1).unwrap().ops.is_empty());
    }

    #[test]
    fn placing_missing_page_fails() {
        let mut editor = PdfEditor::from_bytes(&sample_pdf(1)).unwrap();
        let err = editor
            .add_sheet(100.0, 100.0, &[Placement { source_index: 5, x: 0.0, y: 0.0, scale: 1.0 }])
            .unwrap_err();
        assert!(matches!(err, PressproofError::PageOutOfRange { page: 6, count: 1 }));
    }
}
