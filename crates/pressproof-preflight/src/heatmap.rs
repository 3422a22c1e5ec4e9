// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Approximate total-ink-coverage heatmap.
//
// The estimate is a naive subtractive RGB -> CMYK split with no colour
// management. It is deterministic and useful for spotting heavy areas on
// screen; it is not a measurement of what a press will lay down.

use pressproof_core::error::{PressproofError, Result};
use pressproof_core::{HeatmapData, PreflightConfig, TacLevel};
use pressproof_document::image::raster::composite_over_white;
use pressproof_document::{DocumentLoader, PixelBuffer};
use tracing::{debug, instrument};

/// Estimated ink for one RGBA pixel on the 0–400 scale.
pub fn estimate_tac(r: u8, g: u8, b: u8, a: u8) -> f32 {
    let (r, g, b) = composite_over_white(r, g, b, a);
    let k = 1.0 - r.max(g).max(b);
    if k >= 1.0 {
        return 400.0;
    }
    let c = (1.0 - r - k) / (1.0 - k);
    let m = (1.0 - g - k) / (1.0 - k);
    let y = (1.0 - b - k) / (1.0 - k);
    (c + m + y + k) * 400.0
}

/// Map a 0–400 coverage value linearly onto a byte: `min(255, tac·255/400)`,
/// truncated.
pub fn quantize(tac: f32) -> u8 {
    (tac * 255.0 / 400.0).clamp(0.0, 255.0) as u8
}

/// Bucket a coverage value with the configured thresholds.
pub fn tac_level(tac: f32, config: &PreflightConfig) -> TacLevel {
    TacLevel::classify(tac, config.tac_caution, config.tac_limit)
}

/// Build the grid for an already-rendered page. `page` is 1-based.
pub fn heatmap_from_pixels(buffer: &PixelBuffer, page: u32) -> HeatmapData {
    let mut values = Vec::with_capacity(buffer.width() as usize * buffer.height() as usize);
    let mut max_tac = 0.0f32;
    for [r, g, b, a] in buffer.pixels() {
        let tac = estimate_tac(r, g, b, a);
        max_tac = max_tac.max(tac);
        values.push(quantize(tac));
    }
    HeatmapData {
        page_index: page,
        width: buffer.width(),
        height: buffer.height(),
        values,
        max_tac,
    }
}

/// Render page `page` (1-based, default 1) at roughly
/// `config.heatmap_target_width` pixels wide and estimate its ink coverage.
#[instrument(skip_all, fields(bytes_len = bytes.len(), ?page))]
pub fn tac_heatmap(
    loader: &dyn DocumentLoader,
    bytes: &[u8],
    page: Option<u32>,
    config: &PreflightConfig,
) -> Result<HeatmapData> {
    let page = page.unwrap_or(1);
    let model = loader.load_model(bytes)?;
    let index = page_index(page, model.page_count())?;

    let width_pt = model.page_geometry(index)?.width;
    if !(width_pt.is_finite() && width_pt > 0.0) {
        return Err(PressproofError::Render(format!("page {page} has no usable width")));
    }
    let scale = config.heatmap_target_width as f32 / width_pt;

    let mut renderer = loader.load_renderer(bytes.to_vec())?;
    let buffer = renderer.render_page(index, scale)?;
    let data = heatmap_from_pixels(&buffer, page);
    debug!(width = data.width, height = data.height, max_tac = data.max_tac, "Heatmap computed");
    Ok(data)
}

/// Convert a 1-based page number into a checked 0-based index.
pub fn page_index(page: u32, count: usize) -> Result<usize> {
    if page == 0 || page as usize > count {
        return Err(PressproofError::PageOutOfRange { page, count });
    }
    Ok(page as usize - 1)
}
