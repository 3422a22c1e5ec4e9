// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster rebuild pipelines: render every page, optionally rewrite its
// pixels, and embed the result as a full-page image in a new document.

use pressproof_core::error::{PressproofError, Result};
use pressproof_core::{FileMeta, PreflightConfig};
use pressproof_document::{DocumentBuilder, DocumentLoader, PixelBuffer};
use tracing::{debug, info, instrument};

use super::TransformOutput;
use crate::progress::{Progress, ProgressSink};

/// Re-render every page in grayscale at `config.grayscale_scale`.
#[instrument(skip_all, fields(file = %meta.name, bytes_len = bytes.len()))]
pub fn convert_to_grayscale(
    loader: &dyn DocumentLoader,
    bytes: &[u8],
    meta: &FileMeta,
    config: &PreflightConfig,
    progress: &mut dyn ProgressSink,
) -> Result<TransformOutput> {
    let title = format!("{} (grayscale)", meta.name);
    let pdf = rebuild(
        loader,
        bytes,
        &title,
        config.grayscale_scale,
        |buffer| buffer.apply_luma(),
        progress,
    )?;
    Ok(TransformOutput::derived(meta, "grayscale", pdf))
}

/// Re-render every page at `min_dpi` (clamped, default from config).
#[instrument(skip_all, fields(file = %meta.name, bytes_len = bytes.len(), ?min_dpi))]
pub fn upscale_low_res_images(
    loader: &dyn DocumentLoader,
    bytes: &[u8],
    meta: &FileMeta,
    min_dpi: Option<u32>,
    config: &PreflightConfig,
    progress: &mut dyn ProgressSink,
) -> Result<TransformOutput> {
    let dpi = config.resolve_target_dpi(min_dpi);
    let title = format!("{} ({dpi} dpi)", meta.name);
    let pdf = rebuild(loader, bytes, &title, dpi as f32 / 72.0, |_| {}, progress)?;
    Ok(TransformOutput::derived(meta, &format!("{dpi}dpi"), pdf))
}

/// Shared page loop. The renderer receives its own copy of `bytes`.
fn rebuild(
    loader: &dyn DocumentLoader,
    bytes: &[u8],
    title: &str,
    scale: f32,
    mut per_page: impl FnMut(&mut PixelBuffer),
    progress: &mut dyn ProgressSink,
) -> Result<Vec<u8>> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(PressproofError::Render(format!("invalid render scale {scale}")));
    }

    let mut renderer = loader.load_renderer(bytes.to_vec())?;
    let total = renderer.page_count();
    if total == 0 {
        return Err(PressproofError::PdfError("document has no pages".into()));
    }
    info!(pages = total, scale, "Rebuilding document from rasters");

    let mut sink = loader.new_raster_sink(title)?;
    for index in 0..total {
        let mut buffer = renderer.render_page(index, scale)?;
        per_page(&mut buffer);

        let width_pt = buffer.width() as f32 / scale;
        let height_pt = buffer.height() as f32 / scale;
        sink.add_raster_page(&buffer, width_pt, height_pt)?;

        debug!(page = index + 1, width_pt, height_pt, "Page rebuilt");
        progress.report(Progress::of(
            index + 1,
            total,
            format!("Processed page {} of {}", index + 1, total),
        ));
    }

    let pdf = sink.save()?;
    info!(bytes = pdf.len(), pages = sink.page_count(), "Raster rebuild complete");
    Ok(pdf)
}
