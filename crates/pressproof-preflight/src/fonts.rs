// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font and text legibility analyzer.

use std::collections::BTreeSet;

use pressproof_core::PreflightConfig;
use pressproof_document::{DocumentModel, TextRun};

use crate::context::{AnalysisContext, PageMinimum};

/// Split a `ABCDEF+Name` subset prefix off a font name.
///
/// Returns the base name and whether a prefix (exactly six uppercase ASCII
/// letters followed by `+`) was present.
pub fn split_subset_prefix(name: &str) -> (&str, bool) {
    match name.split_once('+') {
        Some((tag, base))
            if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) && !base.is_empty() =>
        {
            (base, true)
        }
        _ => (name, false),
    }
}

/// Fold one page's text runs into the size counters. `page` is 1-based.
pub fn scan_text_sizes(ctx: &mut AnalysisContext, page: u32, runs: &[TextRun], config: &PreflightConfig) {
    for size in runs.iter().filter_map(TextRun::effective_size) {
        PageMinimum::update(&mut ctx.min_text_size, size, page);
        if size < config.tiny_text_pt {
            ctx.tiny_text.record(page);
        } else if size < config.small_text_pt {
            ctx.small_text.record(page);
        }
    }
}

/// Resolve every distinct font used by `runs` on page `index` (0-based) and
/// record it. A font that cannot be resolved is skipped.
pub fn scan_fonts(ctx: &mut AnalysisContext, model: &dyn DocumentModel, index: usize, runs: &[TextRun]) {
    let page = index as u32 + 1;
    let font_ids: BTreeSet<&str> = runs.iter().map(|run| run.font_id.as_str()).collect();

    for font_id in font_ids {
        match model.resolve_font(index, font_id) {
            Ok(font) => {
                let (base, subset) = split_subset_prefix(&font.name);
                ctx.record_font(base, subset, font.is_type3);
                if font.is_type3 {
                    ctx.type3_fonts.record(page);
                }
            }
            Err(err) => ctx.soft_failure(Some(page), "font resolution", &err),
        }
    }
}
