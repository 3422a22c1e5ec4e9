// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-stream feature extractor. One pass over a page's drawing
// operations: colour families, transparency and overprint state, painted
// images with an effective-DPI estimate, and hairline strokes.

use pressproof_core::PreflightConfig;
use pressproof_document::{ColorFamily, DrawOp};
use tracing::debug;

use crate::context::{AnalysisContext, PageMinimum};

/// Effective resolution of an image assumed to fill a `page_width_pt` ×
/// `page_height_pt` page: the lower of the horizontal and vertical DPI.
///
/// Placement scale is not taken into account.
pub fn effective_dpi(width_px: u32, height_px: u32, page_width_pt: f32, page_height_pt: f32) -> Option<f32> {
    if page_width_pt <= 0.0 || page_height_pt <= 0.0 {
        return None;
    }
    let dpi_x = width_px as f32 / (page_width_pt / 72.0);
    let dpi_y = height_px as f32 / (page_height_pt / 72.0);
    let dpi = dpi_x.min(dpi_y);
    dpi.is_finite().then_some(dpi)
}

/// Fold one page's operations into the context. `page` is 1-based;
/// `page_size` is the page's width and height in points, when known.
pub fn scan_operations(
    ctx: &mut AnalysisContext,
    page: u32,
    ops: &[DrawOp],
    page_size: Option<(f32, f32)>,
    config: &PreflightConfig,
) {
    for op in ops {
        match op {
            DrawOp::SetColor { family, .. } => match family {
                ColorFamily::Rgb => ctx.rgb.record(page),
                ColorFamily::Cmyk => ctx.cmyk.record(page),
                ColorFamily::Gray => ctx.gray.record(page),
                ColorFamily::Other => {}
            },
            DrawOp::SetGraphicsState(state) => {
                if state.uses_transparency() {
                    ctx.transparency.record(page);
                }
                if state.uses_overprint() {
                    ctx.overprint.record(page);
                }
            }
            DrawOp::PaintImage { width_px, height_px } => {
                ctx.images.record(page);
                let dpi = match (width_px, height_px, page_size) {
                    (Some(w), Some(h), Some((pw, ph))) => effective_dpi(*w, *h, pw, ph),
                    _ => None,
                };
                if let Some(dpi) = dpi.filter(|dpi| *dpi < config.low_dpi_threshold) {
                    ctx.low_res_images.record(page);
                    PageMinimum::update(&mut ctx.worst_dpi, dpi, page);
                }
            }
            DrawOp::SetLineWidth(width) => {
                if *width > 0.0 && *width < config.hairline_width_pt {
                    ctx.hairlines.record(page);
                }
            }
            DrawOp::Other(_) => {}
        }
    }
    debug!(page, ops = ops.len(), "Operations scanned");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressproof_document::{GraphicsState, PaintTarget};

    fn color(family: ColorFamily) -> DrawOp {
        DrawOp::SetColor {
            target: PaintTarget::Fill,
            family,
        }
    }

    #[test]
    fn six_by_eight_inch_image_is_150_dpi() {
        assert_eq!(effective_dpi(900, 1200, 432.0, 576.0), Some(150.0));
    }

    #[test]
    fn exactly_threshold_is_not_low_resolution() {
        let config = PreflightConfig::default();
        let mut ctx = AnalysisContext::new(1, 1);
        let ops = [DrawOp::PaintImage {
            width_px: Some(900),
            height_px: Some(1200),
        }];
        scan_operations(&mut ctx, 1, &ops, Some((432.0, 576.0)), &config);
        assert_eq!(ctx.images.count, 1);
        assert!(!ctx.low_res_images.seen());
    }

    #[test]
    fn worst_dpi_is_retained() {
        let config = PreflightConfig::default();
        let mut ctx = AnalysisContext::new(2, 2);
        let image = |w, h| DrawOp::PaintImage {
            width_px: Some(w),
            height_px: Some(h),
        };
        scan_operations(&mut ctx, 1, &[image(600, 800)], Some((432.0, 576.0)), &config);
        scan_operations(&mut ctx, 2, &[image(300, 400), image(899, 1200)], Some((432.0, 576.0)), &config);
        assert_eq!(ctx.low_res_images.count, 3);
        assert_eq!(ctx.low_res_images.first_page, Some(1));
        let worst = ctx.worst_dpi.unwrap();
        assert_eq!(worst.page, 2);
        assert!((worst.value - 50.0).abs() < 0.01);
    }

    #[test]
    fn image_without_dimensions_only_counts() {
        let config = PreflightConfig::default();
        let mut ctx = AnalysisContext::new(1, 1);
        let ops = [DrawOp::PaintImage {
            width_px: None,
            height_px: None,
        }];
        scan_operations(&mut ctx, 1, &ops, Some((432.0, 576.0)), &config);
        assert!(ctx.images.seen());
        assert!(!ctx.low_res_images.seen());
    }

    #[test]
    fn color_families_tracked_independently() {
        let config = PreflightConfig::default();
        let mut ctx = AnalysisContext::new(1, 1);
        let ops = [
            color(ColorFamily::Rgb),
            color(ColorFamily::Gray),
            color(ColorFamily::Other),
            color(ColorFamily::Rgb),
        ];
        scan_operations(&mut ctx, 1, &ops, None, &config);
        assert_eq!(ctx.rgb.count, 2);
        assert_eq!(ctx.gray.count, 1);
        assert!(!ctx.cmyk.seen());
    }

    #[test]
    fn hairlines_exclude_zero_width() {
        let config = PreflightConfig::default();
        let mut ctx = AnalysisContext::new(1, 1);
        let ops = [
            DrawOp::SetLineWidth(0.0),
            DrawOp::SetLineWidth(0.25),
            DrawOp::SetLineWidth(0.1),
        ];
        scan_operations(&mut ctx, 1, &ops, None, &config);
        assert_eq!(ctx.hairlines.count, 1);
    }

    #[test]
    fn graphics_state_flags() {
        let config = PreflightConfig::default();
        let mut ctx = AnalysisContext::new(1, 1);
        let ops = [
            DrawOp::SetGraphicsState(GraphicsState {
                blend_mode: Some("Multiply".into()),
                ..Default::default()
            }),
            DrawOp::SetGraphicsState(GraphicsState {
                overprint_fill: true,
                ..Default::default()
            }),
        ];
        scan_operations(&mut ctx, 1, &ops, None, &config);
        assert_eq!(ctx.transparency.count, 1);
        assert_eq!(ctx.overprint.count, 1);
    }
}
