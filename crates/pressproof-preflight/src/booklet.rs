// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Saddle-stitch booklet imposition: pair logical pages into spreads so that
// the folded, stapled stack reads in order, then lay each spread 2-up on a
// landscape A4 sheet.

use pressproof_core::error::{PressproofError, Result};
use pressproof_core::{FileMeta, PaperSize, PreflightConfig, Rect};
use pressproof_document::{DocumentBuilder, DocumentLoader, Placement};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::progress::{Progress, ProgressSink};
use crate::transform::TransformOutput;

/// One sheet side: the 0-based logical pages on its left and right halves.
/// `None` is a blank padding page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spread {
    pub left: Option<usize>,
    pub right: Option<usize>,
}

/// Page count rounded up to the next multiple of four.
pub fn signature_size(page_count: usize) -> usize {
    page_count.div_ceil(4) * 4
}

/// Spreads for a document of `page_count` pages, front and back alternating.
///
/// For eight pages this is (7,0), (1,6), (5,2), (3,4). Every real page lands
/// in exactly one slot.
pub fn spread_order(page_count: usize) -> Vec<Spread> {
    let n = signature_size(page_count);
    let real = |index: usize| (index < page_count).then_some(index);
    (0..n / 2)
        .map(|i| {
            let (left, right) = if i % 2 == 0 { (n - 1 - i, i) } else { (i, n - 1 - i) };
            Spread {
                left: real(left),
                right: real(right),
            }
        })
        .collect()
}

/// Fit a `page` into half `slot` (0 left, 1 right) of a `sheet_w` × `sheet_h`
/// sheet, keeping `margin` clear, centred in the half.
pub fn fit_in_half(page: Rect, slot: usize, sheet_w: f32, sheet_h: f32, margin: f32) -> Option<(f32, f32, f32)> {
    let half = sheet_w / 2.0;
    let (pw, ph) = (page.width(), page.height());
    if pw <= 0.0 || ph <= 0.0 {
        return None;
    }
    let scale = ((half - 2.0 * margin) / pw).min((sheet_h - 2.0 * margin) / ph);
    if !(scale.is_finite() && scale > 0.0) {
        return None;
    }
    let x = slot as f32 * half + (half - pw * scale) / 2.0;
    let y = (sheet_h - ph * scale) / 2.0;
    Some((x, y, scale))
}

/// Impose the document as a saddle-stitch booklet on landscape A4 sheets.
#[instrument(skip_all, fields(file = %meta.name, bytes_len = bytes.len()))]
pub fn create_booklet(
    loader: &dyn DocumentLoader,
    bytes: &[u8],
    meta: &FileMeta,
    config: &PreflightConfig,
    progress: &mut dyn ProgressSink,
) -> Result<TransformOutput> {
    let mut placer = loader.open_page_placer(bytes)?;
    let page_count = placer.source_page_count();
    if page_count == 0 {
        return Err(PressproofError::PdfError("document has no pages".into()));
    }

    // Landscape: the long edge of A4 becomes the width.
    let (short, long) = PaperSize::A4.dimensions_pt();
    let (sheet_w, sheet_h) = (long.max(short), long.min(short));

    let spreads = spread_order(page_count);
    info!(pages = page_count, spreads = spreads.len(), "Imposing booklet");

    for (i, spread) in spreads.iter().enumerate() {
        let mut placements = Vec::with_capacity(2);
        for (slot, page) in [spread.left, spread.right].into_iter().enumerate() {
            let Some(index) = page else { continue };
            let media = placer.source_media_box(index)?;
            match fit_in_half(media, slot, sheet_w, sheet_h, config.booklet_margin_pt) {
                Some((x, y, scale)) => placements.push(Placement {
                    source_index: index,
                    x,
                    y,
                    scale,
                }),
                None => debug!(page = index + 1, "Skipping page with degenerate media box"),
            }
        }
        placer.add_sheet(sheet_w, sheet_h, &placements)?;
        progress.report(Progress::of(
            i + 1,
            spreads.len(),
            format!("Imposed spread {} of {}", i + 1, spreads.len()),
        ));
    }

    let pdf = placer.save()?;
    info!(sheets = placer.page_count(), bytes = pdf.len(), "Booklet complete");
    Ok(TransformOutput::derived(meta, "booklet", pdf))
}
