// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Issue aggregation and scoring: folds an `AnalysisContext` into the
// immutable `PreflightResult`. Rules run in a fixed order and each emits at
// most one issue.

use std::collections::BTreeMap;

use pressproof_core::{
    CategorySummary, FileMeta, Issue, IssueCategory, PageIssueCount, PreflightConfig, PreflightMeta,
    PreflightResult, Severity, pt_to_mm,
};

use crate::context::AnalysisContext;
use crate::geometry::classify_size;

/// Issue ids, one per rule.
pub mod ids {
    pub const EMPTY_DOCUMENT: &str = "empty-document";
    pub const UNREADABLE_DOCUMENT: &str = "unreadable-document";
    pub const MIXED_PAGE_SIZES: &str = "mixed-page-sizes";
    pub const NON_STANDARD_PAGE_SIZE: &str = "non-standard-page-size";
    pub const COLOR_DETECTED: &str = "color-detected";
    pub const NO_COLOR_OPS: &str = "no-color-ops";
    pub const TRANSPARENCY: &str = "transparency-detected";
    pub const MISSING_BLEED: &str = "missing-bleed-info";
    pub const INSUFFICIENT_BLEED: &str = "insufficient-bleed";
    pub const TYPE3_FONTS: &str = "type3-fonts";
    pub const FONT_USAGE: &str = "font-usage";
    pub const TINY_TEXT: &str = "tiny-text";
    pub const SMALL_TEXT: &str = "small-text";
    pub const MIXED_RGB_CMYK: &str = "mixed-rgb-cmyk";
    pub const RGB_ONLY: &str = "rgb-only";
    pub const CMYK_ONLY: &str = "cmyk-only";
    pub const GRAY_ONLY: &str = "gray-only";
    pub const HAIRLINES: &str = "hairlines";
    pub const OVERPRINT: &str = "overprint-detected";
    pub const LOW_RESOLUTION: &str = "low-resolution-images";
    pub const NO_IMAGES: &str = "no-images";
    pub const ANNOTATIONS: &str = "annotations-present";
    pub const FORM_FIELDS: &str = "form-fields-present";
    pub const MULTIMEDIA: &str = "multimedia-present";
    pub const LAYERS: &str = "layers-present";
    pub const LARGE_FILE: &str = "large-file";
}

/// `clamp(100 − 15·errors − 7·warnings, 0, 100)`.
pub fn score(issues: &[Issue]) -> u8 {
    let penalty: u32 = issues.iter().map(|issue| issue.severity.penalty()).sum();
    100u32.saturating_sub(penalty) as u8
}

/// One entry per category that has at least one issue, in category order.
pub fn category_summaries(issues: &[Issue]) -> Vec<CategorySummary> {
    let mut by_category: BTreeMap<IssueCategory, CategorySummary> = BTreeMap::new();
    for issue in issues {
        let summary = by_category
            .entry(issue.category)
            .or_insert_with(|| CategorySummary {
                category: issue.category,
                errors: 0,
                warnings: 0,
                infos: 0,
            });
        match issue.severity {
            Severity::Error => summary.errors += 1,
            Severity::Warning => summary.warnings += 1,
            Severity::Info => summary.infos += 1,
        }
    }
    by_category.into_values().collect()
}

/// Issue counts for every page of the document, 0 where nothing points.
pub fn page_counts(issues: &[Issue], page_count: usize) -> Vec<PageIssueCount> {
    let mut pages: Vec<PageIssueCount> = (1..=page_count as u32)
        .map(|page| PageIssueCount { page, issues: 0 })
        .collect();
    for page in issues.iter().filter_map(|issue| issue.page) {
        if let Some(entry) = (page as usize).checked_sub(1).and_then(|i| pages.get_mut(i)) {
            entry.issues += 1;
        }
    }
    pages
}

pub fn summary_text(issues: &[Issue], sampled: usize, page_count: usize) -> String {
    if issues.is_empty() {
        return format!("No issues found in the first {sampled} sampled pages.");
    }
    let count = |severity: Severity| issues.iter().filter(|i| i.severity == severity).count();
    format!(
        "Found {} errors, {} warnings and {} info items (based on the first {} of {} pages).",
        count(Severity::Error),
        count(Severity::Warning),
        count(Severity::Info),
        sampled,
        page_count
    )
}

/// Evaluate every rule against the context, in order.
pub fn build_issues(ctx: &AnalysisContext, config: &PreflightConfig, file_size: u64) -> Vec<Issue> {
    let mut issues = Vec::new();

    // -- Page setup --
    if ctx.mixed_sizes.seen() {
        issues.push(
            Issue::new(
                ids::MIXED_PAGE_SIZES,
                ctx.mixed_sizes.first_page,
                Severity::Warning,
                IssueCategory::PageSetup,
                "Pages have different sizes",
            )
            .with_details(format!(
                "{} sampled page(s) differ from page 1 by more than {} pt.",
                ctx.mixed_sizes.count, config.mixed_size_tolerance_pt
            )),
        );
    }
    if let Some((width, height)) = ctx.reference_size {
        let size = classify_size(width, height, config);
        if !size.is_standard() {
            issues.push(
                Issue::new(
                    ids::NON_STANDARD_PAGE_SIZE,
                    Some(1),
                    Severity::Info,
                    IssueCategory::PageSetup,
                    format!("Non-standard page size: {}", size.label()),
                )
                .with_details(format!(
                    "Page 1 measures {:.1} × {:.1} mm and matches no common trim size.",
                    pt_to_mm(width),
                    pt_to_mm(height)
                )),
            );
        }
    }

    // -- Colour presence --
    // Keyed on RGB operators only; CMYK and gray work is reported by the
    // colour-space rules below.
    if ctx.rgb.seen() {
        issues.push(
            Issue::new(
                ids::COLOR_DETECTED,
                ctx.rgb.first_page,
                Severity::Info,
                IssueCategory::Color,
                "Color content detected",
            )
            .with_details("The sampled pages set RGB colours; check the colour workflow with your printer."),
        );
    } else {
        issues.push(Issue::new(
            ids::NO_COLOR_OPS,
            None,
            Severity::Info,
            IssueCategory::Color,
            "No explicit color operations found",
        ));
    }

    if ctx.transparency.seen() {
        issues.push(
            Issue::new(
                ids::TRANSPARENCY,
                ctx.transparency.first_page,
                Severity::Warning,
                IssueCategory::Transparency,
                "Transparency detected",
            )
            .with_details("Transparent objects may need flattening before print.")
            .with_tags(&["flattening"]),
        );
    }

    // -- Bleed --
    if ctx.missing_bleed.seen() {
        issues.push(
            Issue::new(
                ids::MISSING_BLEED,
                ctx.missing_bleed.first_page,
                Severity::Warning,
                IssueCategory::BleedMargins,
                "No bleed defined",
            )
            .with_details(format!(
                "Trim and bleed boxes coincide; artwork touching the edge needs at least {} mm of bleed.",
                config.min_bleed_mm
            ))
            .with_tags(&["fixable"]),
        );
    }
    if ctx.insufficient_bleed.seen() {
        let smallest = ctx.min_bleed_mm.map(|m| m.value).unwrap_or(0.0);
        issues.push(
            Issue::new(
                ids::INSUFFICIENT_BLEED,
                ctx.insufficient_bleed.first_page,
                Severity::Warning,
                IssueCategory::BleedMargins,
                "Bleed is too small",
            )
            .with_details(format!(
                "Smallest bleed is {:.1} mm; at least {} mm is recommended.",
                smallest, config.min_bleed_mm
            ))
            .with_tags(&["fixable"]),
        );
    }

    // -- Fonts and text --
    let type3: Vec<&str> = ctx
        .fonts
        .values()
        .filter(|font| font.type3)
        .map(|font| font.name.as_str())
        .collect();
    if !type3.is_empty() {
        issues.push(
            Issue::new(
                ids::TYPE3_FONTS,
                ctx.type3_fonts.first_page,
                Severity::Warning,
                IssueCategory::Fonts,
                "Type 3 fonts found",
            )
            .with_details(format!("Type 3 fonts often print poorly: {}.", type3.join(", "))),
        );
    }
    if !ctx.fonts.is_empty() {
        let listing: Vec<String> = ctx
            .fonts
            .values()
            .map(|font| {
                if font.subset {
                    format!("{} (subset)", font.name)
                } else {
                    font.name.clone()
                }
            })
            .collect();
        issues.push(
            Issue::new(
                ids::FONT_USAGE,
                None,
                Severity::Info,
                IssueCategory::Fonts,
                format!("{} font(s) used", ctx.fonts.len()),
            )
            .with_details(listing.join(", ")),
        );
    }
    if ctx.tiny_text.seen() {
        let smallest = ctx.min_text_size.map(|m| m.value).unwrap_or(0.0);
        issues.push(
            Issue::new(
                ids::TINY_TEXT,
                ctx.tiny_text.first_page,
                Severity::Warning,
                IssueCategory::Fonts,
                format!("Text below {} pt", config.tiny_text_pt),
            )
            .with_details(format!(
                "{} text run(s) below {} pt; the smallest is {:.1} pt.",
                ctx.tiny_text.count, config.tiny_text_pt, smallest
            )),
        );
    } else if ctx.small_text.seen() {
        issues.push(
            Issue::new(
                ids::SMALL_TEXT,
                ctx.small_text.first_page,
                Severity::Info,
                IssueCategory::Fonts,
                format!("Text below {} pt", config.small_text_pt),
            )
            .with_details(format!(
                "{} text run(s) between {} and {} pt may be hard to read.",
                ctx.small_text.count, config.tiny_text_pt, config.small_text_pt
            )),
        );
    }

    // -- Colour mix --
    let (rgb, cmyk, gray) = (ctx.rgb.seen(), ctx.cmyk.seen(), ctx.gray.seen());
    if rgb && cmyk {
        let first = [ctx.rgb.first_page, ctx.cmyk.first_page].into_iter().flatten().max();
        issues.push(
            Issue::new(
                ids::MIXED_RGB_CMYK,
                first,
                Severity::Warning,
                IssueCategory::Color,
                "Mixed RGB and CMYK colour",
            )
            .with_details("RGB content will be converted at print time and may shift next to CMYK content."),
        );
    } else if rgb {
        issues.push(
            Issue::new(
                ids::RGB_ONLY,
                ctx.rgb.first_page,
                Severity::Info,
                IssueCategory::Color,
                "RGB colour only",
            )
            .with_details("All explicit colour is RGB; it will be converted to CMYK for print."),
        );
    } else if cmyk && !gray {
        issues.push(Issue::new(
            ids::CMYK_ONLY,
            ctx.cmyk.first_page,
            Severity::Info,
            IssueCategory::Color,
            "CMYK colour only",
        ));
    } else if gray && !cmyk {
        issues.push(Issue::new(
            ids::GRAY_ONLY,
            ctx.gray.first_page,
            Severity::Info,
            IssueCategory::Color,
            "Grayscale only",
        ));
    }

    // -- Strokes and overprint --
    if ctx.hairlines.seen() {
        issues.push(
            Issue::new(
                ids::HAIRLINES,
                ctx.hairlines.first_page,
                Severity::Warning,
                IssueCategory::Other,
                format!("Lines thinner than {} pt", config.hairline_width_pt),
            )
            .with_details(format!(
                "{} stroke(s) may disappear or break up in print.",
                ctx.hairlines.count
            )),
        );
    }
    if ctx.overprint.seen() {
        issues.push(Issue::new(
            ids::OVERPRINT,
            ctx.overprint.first_page,
            Severity::Info,
            IssueCategory::Color,
            "Overprint is used",
        ));
    }

    // -- Images --
    if let Some(worst) = ctx.worst_dpi {
        issues.push(
            Issue::new(
                ids::LOW_RESOLUTION,
                Some(worst.page),
                Severity::Warning,
                IssueCategory::Resolution,
                format!("Low-resolution images (lowest {:.0} DPI)", worst.value),
            )
            .with_details(format!(
                "{} image(s) below {} DPI.",
                ctx.low_res_images.count, config.low_dpi_threshold
            ))
            .with_tags(&["fixable"]),
        );
    }
    if !ctx.images.seen() {
        issues.push(Issue::new(
            ids::NO_IMAGES,
            None,
            Severity::Info,
            IssueCategory::Images,
            "No images found",
        ));
    }

    // -- Annotations, forms, media, layers --
    if ctx.markup_annotations.seen() {
        issues.push(Issue::new(
            ids::ANNOTATIONS,
            ctx.markup_annotations.first_page,
            Severity::Warning,
            IssueCategory::Annotations,
            "Annotations present",
        ));
    }
    if ctx.form_fields.seen() {
        issues.push(Issue::new(
            ids::FORM_FIELDS,
            ctx.form_fields.first_page,
            Severity::Warning,
            IssueCategory::FormFields,
            "Form fields present",
        ));
    }
    if ctx.multimedia.seen() {
        issues.push(
            Issue::new(
                ids::MULTIMEDIA,
                ctx.multimedia.first_page,
                Severity::Error,
                IssueCategory::Multimedia,
                "Multimedia content present",
            )
            .with_details("Audio, video, 3D and attachments cannot be printed."),
        );
    }
    if !ctx.layers.is_empty() {
        issues.push(
            Issue::new(
                ids::LAYERS,
                None,
                Severity::Info,
                IssueCategory::Layers,
                format!("{} layer(s) present", ctx.layers.len()),
            )
            .with_details(ctx.layers.join(", ")),
        );
    }

    // -- File --
    if file_size > config.max_file_size_bytes {
        issues.push(Issue::new(
            ids::LARGE_FILE,
            None,
            Severity::Warning,
            IssueCategory::Metadata,
            format!("Large file ({:.0} MB)", file_size as f64 / (1024.0 * 1024.0)),
        ));
    }

    issues
}

/// Build the result for a sampled document.
pub fn finish(ctx: &AnalysisContext, meta: &FileMeta, config: &PreflightConfig) -> PreflightResult {
    let issues = build_issues(ctx, config, meta.size);
    PreflightResult {
        score: score(&issues),
        summary: summary_text(&issues, ctx.sampled_pages, ctx.page_count),
        pages: page_counts(&issues, ctx.page_count),
        categories: category_summaries(&issues),
        meta: PreflightMeta {
            file_name: meta.name.clone(),
            file_size: meta.size,
            page_count: ctx.page_count,
        },
        issues,
    }
}

/// Result for a document with no pages.
pub fn empty_document(meta: &FileMeta) -> PreflightResult {
    structural_failure(
        meta,
        Issue::new(
            ids::EMPTY_DOCUMENT,
            Some(1),
            Severity::Error,
            IssueCategory::Compliance,
            "The document has no pages",
        ),
    )
}

/// Result for a document that could not be opened at all.
pub fn unreadable_document(meta: &FileMeta, reason: &str) -> PreflightResult {
    structural_failure(
        meta,
        Issue::new(
            ids::UNREADABLE_DOCUMENT,
            Some(1),
            Severity::Error,
            IssueCategory::Compliance,
            "The document could not be read",
        )
        .with_details(reason.to_string()),
    )
}

fn structural_failure(meta: &FileMeta, issue: Issue) -> PreflightResult {
    let summary = format!("No pages could be analyzed: {}.", issue.message.to_lowercase());
    let issues = vec![issue];
    PreflightResult {
        score: score(&issues),
        summary,
        pages: Vec::new(),
        categories: category_summaries(&issues),
        meta: PreflightMeta {
            file_name: meta.name.clone(),
            file_size: meta.size,
            page_count: 0,
        },
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PageMinimum;

    fn meta() -> FileMeta {
        FileMeta::new("proof.pdf", 1024, "application/pdf")
    }

    fn ids_of(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn score_formula_and_clamp() {
        let issue = |severity| Issue::new("x", None, severity, IssueCategory::Other, "x");
        assert_eq!(score(&[]), 100);
        assert_eq!(score(&[issue(Severity::Error), issue(Severity::Warning), issue(Severity::Info)]), 78);
        let many: Vec<Issue> = (0..8).map(|_| issue(Severity::Error)).collect();
        assert_eq!(score(&many), 0);
    }

    #[test]
    fn empty_document_shape() {
        let result = empty_document(&meta());
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].id, ids::EMPTY_DOCUMENT);
        assert_eq!(result.issues[0].severity, Severity::Error);
        assert_eq!(result.issues[0].page, Some(1));
        assert!(result.pages.is_empty());
        assert_eq!(result.meta.page_count, 0);
        assert_eq!(result.score, 85);
        assert_eq!(result.summary, "No pages could be analyzed: the document has no pages.");
        assert!(!result.summary.contains("0 of 0"));
    }

    #[test]
    fn rgb_operators_alone_mark_colour_content() {
        let mut ctx = AnalysisContext::new(3, 3);
        ctx.cmyk.record(1);
        ctx.rgb.record(3);
        let issues = build_issues(&ctx, &PreflightConfig::default(), 0);
        let colour = issues.iter().find(|i| i.id == ids::COLOR_DETECTED).unwrap();
        assert_eq!(colour.page, Some(3));
        assert!(!ids_of(&issues).contains(&ids::NO_COLOR_OPS));
    }

    #[test]
    fn clean_context_emits_info_only() {
        let mut ctx = AnalysisContext::new(12, 10);
        ctx.reference_size = Some((595.28, 841.89));
        ctx.cmyk.record(1);
        ctx.images.record(1);
        let result = finish(&ctx, &meta(), &PreflightConfig::default());
        assert_eq!(ids_of(&result.issues), vec![ids::NO_COLOR_OPS, ids::CMYK_ONLY]);
        assert_eq!(result.score, 100);
        assert_eq!(result.pages.len(), 12);
        assert_eq!(result.pages[0].issues, 1);
        assert!(result.pages[10..].iter().all(|p| p.issues == 0));
        assert!(result.summary.contains("first 10 of 12 pages"));
    }

    #[test]
    fn mixed_colour_suppresses_single_family_rules() {
        let mut ctx = AnalysisContext::new(1, 1);
        ctx.rgb.record(1);
        ctx.cmyk.record(1);
        ctx.gray.record(1);
        let issues = build_issues(&ctx, &PreflightConfig::default(), 0);
        let found = ids_of(&issues);
        assert!(found.contains(&ids::MIXED_RGB_CMYK));
        for suppressed in [ids::RGB_ONLY, ids::CMYK_ONLY, ids::GRAY_ONLY] {
            assert!(!found.contains(&suppressed));
        }
    }

    #[test]
    fn gray_only_and_no_color() {
        let mut ctx = AnalysisContext::new(1, 1);
        ctx.gray.record(1);
        let found = build_issues(&ctx, &PreflightConfig::default(), 0);
        assert!(ids_of(&found).contains(&ids::NO_COLOR_OPS));
        assert!(ids_of(&found).contains(&ids::GRAY_ONLY));
    }

    #[test]
    fn tiny_text_suppresses_small_text() {
        let mut ctx = AnalysisContext::new(1, 1);
        ctx.tiny_text.record(1);
        ctx.small_text.record(1);
        let found = build_issues(&ctx, &PreflightConfig::default(), 0);
        assert!(ids_of(&found).contains(&ids::TINY_TEXT));
        assert!(!ids_of(&found).contains(&ids::SMALL_TEXT));
    }

    #[test]
    fn low_resolution_points_at_worst_page() {
        let mut ctx = AnalysisContext::new(3, 3);
        ctx.images.record(1);
        ctx.low_res_images.record(1);
        ctx.low_res_images.record(3);
        ctx.worst_dpi = Some(PageMinimum { value: 72.0, page: 3 });
        let found = build_issues(&ctx, &PreflightConfig::default(), 0);
        let issue = found.iter().find(|i| i.id == ids::LOW_RESOLUTION).unwrap();
        assert_eq!(issue.page, Some(3));
        assert!(issue.message.contains("72"));
    }

    #[test]
    fn multimedia_is_an_error_and_large_file_a_warning() {
        let mut ctx = AnalysisContext::new(1, 1);
        ctx.multimedia.record(1);
        let config = PreflightConfig::default();
        let found = build_issues(&ctx, &config, config.max_file_size_bytes + 1);
        let multimedia = found.iter().find(|i| i.id == ids::MULTIMEDIA).unwrap();
        assert_eq!(multimedia.severity, Severity::Error);
        let large = found.iter().find(|i| i.id == ids::LARGE_FILE).unwrap();
        assert_eq!(large.severity, Severity::Warning);
        assert_eq!(large.page, None);
    }

    #[test]
    fn every_rule_fires_at_most_once() {
        let mut ctx = AnalysisContext::new(2, 2);
        for page in 1..=2 {
            ctx.mixed_sizes.record(page);
            ctx.transparency.record(page);
            ctx.missing_bleed.record(page);
            ctx.hairlines.record(page);
            ctx.form_fields.record(page);
        }
        ctx.reference_size = Some((100.0, 100.0));
        ctx.record_font("Glyphs", false, true);
        ctx.type3_fonts.record(2);
        ctx.layers = vec!["Cutter".into()];
        let issues = build_issues(&ctx, &PreflightConfig::default(), 0);
        let mut seen = std::collections::HashSet::new();
        for issue in &issues {
            assert!(seen.insert(issue.id.clone()), "duplicate {}", issue.id);
        }
        let summaries = category_summaries(&issues);
        let total: u32 = summaries.iter().map(|s| s.errors + s.warnings + s.infos).sum();
        assert_eq!(total as usize, issues.len());
    }
}
