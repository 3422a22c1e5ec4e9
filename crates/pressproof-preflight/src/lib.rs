// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pressproof-preflight: print preflight analysis and the corrective
// transforms that run over the same document capabilities.
//
// Analysis walks the leading pages once (geometry, drawing operators, text
// runs, annotations) into an `AnalysisContext`, then folds it into a scored
// `PreflightResult`. The transforms (grayscale, DPI rebuild, bleed fix,
// booklet) each produce a new document; the heatmap and preview render a
// single page.

pub mod aggregate;
pub mod analyze;
pub mod annotations;
pub mod booklet;
pub mod content;
pub mod context;
pub mod fonts;
pub mod geometry;
pub mod heatmap;
pub mod preview;
pub mod progress;
pub mod transform;

#[cfg(test)]
mod testing;

pub use analyze::{analyze, analyze_model};
pub use booklet::{Spread, create_booklet, spread_order};
pub use heatmap::{tac_heatmap, tac_level};
pub use preview::render_page_png;
pub use progress::{Progress, ProgressSink};
pub use transform::{
    TransformKind, TransformOutput, convert_to_grayscale, fix_bleed, upscale_low_res_images,
};
