// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Analysis context: the single mutable accumulator threaded through every
// extractor during one `analyze` run. It is folded into an immutable
// `PreflightResult` by `aggregate::finish` and then dropped.

use std::collections::BTreeMap;

use pressproof_core::FontUsageRecord;
use tracing::warn;

/// A running count paired with the first page it was observed on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub count: u32,
    /// 1-based page number.
    pub first_page: Option<u32>,
}

impl Tally {
    pub fn record(&mut self, page: u32) {
        self.count += 1;
        self.first_page.get_or_insert(page);
    }

    pub fn seen(&self) -> bool {
        self.count > 0
    }
}

/// A value tracked for its minimum, with the page it occurred on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMinimum {
    pub value: f32,
    pub page: u32,
}

impl PageMinimum {
    /// Keep the lower of `current` and (`value`, `page`). Ties keep the
    /// earlier page.
    pub fn update(current: &mut Option<PageMinimum>, value: f32, page: u32) {
        match current {
            Some(min) if min.value <= value => {}
            _ => *current = Some(PageMinimum { value, page }),
        }
    }
}

/// Everything the extractors learn about the sampled pages.
#[derive(Debug, Default)]
pub struct AnalysisContext {
    /// Pages in the whole document.
    pub page_count: usize,
    /// Leading pages actually walked.
    pub sampled_pages: usize,

    // -- Geometry --
    /// Page 1 width and height in points.
    pub reference_size: Option<(f32, f32)>,
    pub mixed_sizes: Tally,
    pub missing_bleed: Tally,
    pub insufficient_bleed: Tally,
    /// Smallest non-zero bleed gap seen, in millimetres.
    pub min_bleed_mm: Option<PageMinimum>,

    // -- Content stream --
    pub rgb: Tally,
    pub cmyk: Tally,
    pub gray: Tally,
    pub transparency: Tally,
    pub overprint: Tally,
    pub images: Tally,
    pub low_res_images: Tally,
    pub worst_dpi: Option<PageMinimum>,
    pub hairlines: Tally,

    // -- Text --
    pub tiny_text: Tally,
    pub small_text: Tally,
    pub min_text_size: Option<PageMinimum>,
    /// Keyed by base font name with any subset prefix stripped.
    pub fonts: BTreeMap<String, FontUsageRecord>,
    pub type3_fonts: Tally,

    // -- Annotations and layers --
    pub markup_annotations: Tally,
    pub form_fields: Tally,
    pub multimedia: Tally,
    /// Optional-content group names in display order.
    pub layers: Vec<String>,

    /// Sub-checks that failed and were skipped.
    pub soft_failures: u32,
}

impl AnalysisContext {
    pub fn new(page_count: usize, sampled_pages: usize) -> Self {
        Self {
            page_count,
            sampled_pages,
            ..Default::default()
        }
    }

    /// Record a sub-check that could not run. The check's accumulators stay
    /// as they were.
    pub fn soft_failure(&mut self, page: Option<u32>, check: &str, error: &dyn std::fmt::Display) {
        self.soft_failures += 1;
        warn!(page = ?page, check, %error, "Preflight check skipped");
    }

    /// Merge a font sighting into the usage map, OR-ing its flags.
    pub fn record_font(&mut self, base_name: &str, subset: bool, type3: bool) {
        let entry = self
            .fonts
            .entry(base_name.to_string())
            .or_insert_with(|| FontUsageRecord {
                name: base_name.to_string(),
                subset: false,
                type3: false,
            });
        entry.subset |= subset;
        entry.type3 |= type3;
    }
}
