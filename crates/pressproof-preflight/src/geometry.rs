// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry extractor: page size consistency, standard-size matching and
// bleed validity.

use pressproof_core::{PageGeometry, PaperSize, PreflightConfig, pt_to_mm};

use crate::context::{AnalysisContext, PageMinimum};

/// Bleed assessment for one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BleedStatus {
    /// Trim and bleed boxes coincide.
    Missing,
    /// Smallest gap, in millimetres, is below the minimum.
    Insufficient { min_gap_mm: f32 },
    Sufficient { min_gap_mm: f32 },
}

/// Gaps between trim and bleed box: left, bottom, right, top (points).
pub fn bleed_gaps(geometry: &PageGeometry) -> [f32; 4] {
    let trim = &geometry.trim_box;
    let bleed = &geometry.bleed_box;
    [
        trim.x0 - bleed.x0,
        trim.y0 - bleed.y0,
        bleed.x1 - trim.x1,
        bleed.y1 - trim.y1,
    ]
}

pub fn bleed_status(geometry: &PageGeometry, config: &PreflightConfig) -> BleedStatus {
    let gaps = bleed_gaps(geometry);
    if gaps.iter().all(|gap| gap.abs() <= config.bleed_epsilon_pt) {
        return BleedStatus::Missing;
    }
    let min_gap_mm = gaps.iter().copied().fold(f32::INFINITY, f32::min);
    let min_gap_mm = pt_to_mm(min_gap_mm);
    if min_gap_mm < config.min_bleed_mm {
        BleedStatus::Insufficient { min_gap_mm }
    } else {
        BleedStatus::Sufficient { min_gap_mm }
    }
}

/// Standard size of the reference page, `Custom` when none matches.
pub fn classify_size(width_pt: f32, height_pt: f32, config: &PreflightConfig) -> PaperSize {
    PaperSize::classify(width_pt, height_pt, config.size_tolerance_mm)
}

/// Fold one page's geometry into the context. `page` is 1-based.
pub fn inspect_page(ctx: &mut AnalysisContext, page: u32, geometry: &PageGeometry, config: &PreflightConfig) {
    match ctx.reference_size {
        None => ctx.reference_size = Some((geometry.width, geometry.height)),
        Some((width, height)) => {
            let tolerance = config.mixed_size_tolerance_pt;
            if (geometry.width - width).abs() > tolerance || (geometry.height - height).abs() > tolerance {
                ctx.mixed_sizes.record(page);
            }
        }
    }

    match bleed_status(geometry, config) {
        BleedStatus::Missing => ctx.missing_bleed.record(page),
        BleedStatus::Insufficient { min_gap_mm } => {
            ctx.insufficient_bleed.record(page);
            PageMinimum::update(&mut ctx.min_bleed_mm, min_gap_mm, page);
        }
        BleedStatus::Sufficient { min_gap_mm } => {
            PageMinimum::update(&mut ctx.min_bleed_mm, min_gap_mm, page);
        }
    }
}
