// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bleed fix: grow every page outward around its trim box. The added area is
// empty canvas, nothing is mirrored or stretched into it.

use pressproof_core::error::{PressproofError, Result};
use pressproof_core::{FileMeta, PreflightConfig, Rect, mm_to_pt};
use pressproof_document::{DocumentBuilder, DocumentLoader, DocumentModel, PageBoxes};
use tracing::{debug, info, instrument};

use super::TransformOutput;
use crate::progress::{Progress, ProgressSink};

/// Boxes for a page whose trim box is `trim`, with `bleed_pt` added on
/// every side. Applying this to its own output is a no-op, since the trim
/// box is carried over unchanged.
pub fn bleed_boxes(trim: Rect, bleed_pt: f32) -> PageBoxes {
    let grown = trim.expand(bleed_pt);
    PageBoxes {
        media_box: grown,
        bleed_box: grown,
        trim_box: trim,
        crop_box: Some(grown),
    }
}

/// Add `bleed_mm` (default from config) of bleed around every page.
#[instrument(skip_all, fields(file = %meta.name, bytes_len = bytes.len(), ?bleed_mm))]
pub fn fix_bleed(
    loader: &dyn DocumentLoader,
    bytes: &[u8],
    meta: &FileMeta,
    bleed_mm: Option<f32>,
    config: &PreflightConfig,
    progress: &mut dyn ProgressSink,
) -> Result<TransformOutput> {
    let bleed_mm = bleed_mm.unwrap_or(config.default_bleed_mm);
    if !bleed_mm.is_finite() || bleed_mm < 0.0 {
        return Err(PressproofError::InvalidCommand(format!(
            "bleed must be a non-negative number of millimetres, got {bleed_mm}"
        )));
    }
    let bleed_pt = mm_to_pt(bleed_mm);

    // Trim boxes come from the read model so inherited and defaulted boxes
    // resolve the same way the analysis sees them.
    let model = loader.load_model(bytes)?;
    let total = model.page_count();
    if total == 0 {
        return Err(PressproofError::PdfError("document has no pages".into()));
    }

    let mut editor = loader.open_box_editor(bytes)?;
    info!(pages = total, bleed_mm, "Adding bleed");
    for index in 0..total {
        let trim = trim_box(model.as_ref(), index)?;
        editor.set_page_boxes(index, &bleed_boxes(trim, bleed_pt))?;
        debug!(page = index + 1, "Page boxes updated");
        progress.report(Progress::of(
            index + 1,
            total,
            format!("Extended page {} of {}", index + 1, total),
        ));
    }

    let pdf = editor.save()?;
    Ok(TransformOutput::derived(meta, "bleed", pdf))
}

fn trim_box(model: &dyn DocumentModel, index: usize) -> Result<Rect> {
    Ok(model.page_geometry(index)?.trim_box)
}
