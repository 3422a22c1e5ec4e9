// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The `analyze` command: sample the leading pages, run every extractor over
// each of them in order, then aggregate.

use pressproof_core::{FileMeta, PreflightConfig, PreflightResult};
use pressproof_document::{DocumentLoader, DocumentModel};
use tracing::{info, instrument, warn};

use crate::aggregate;
use crate::annotations::{scan_annotations, scan_layers};
use crate::content::scan_operations;
use crate::context::AnalysisContext;
use crate::fonts::{scan_fonts, scan_text_sizes};
use crate::geometry::inspect_page;
use crate::progress::{Progress, ProgressSink};

/// Analyse a PDF buffer. Never fails: a document that cannot be opened
/// produces a result holding a single `unreadable-document` error.
#[instrument(skip_all, fields(file = %meta.name, bytes_len = bytes.len()))]
pub fn analyze(
    loader: &dyn DocumentLoader,
    bytes: &[u8],
    meta: &FileMeta,
    config: &PreflightConfig,
    progress: &mut dyn ProgressSink,
) -> PreflightResult {
    match loader.load_model(bytes) {
        Ok(model) => analyze_model(model.as_ref(), meta, config, progress),
        Err(err) => {
            warn!(error = %err, "Document could not be opened for analysis");
            aggregate::unreadable_document(meta, &err.to_string())
        }
    }
}

/// Analyse an already-open document model.
pub fn analyze_model(
    model: &dyn DocumentModel,
    meta: &FileMeta,
    config: &PreflightConfig,
    progress: &mut dyn ProgressSink,
) -> PreflightResult {
    let page_count = model.page_count();
    if page_count == 0 {
        info!("Document has no pages");
        return aggregate::empty_document(meta);
    }

    let sampled = page_count.min(config.sample_pages.max(1));
    info!(page_count, sampled, "Starting preflight analysis");
    let mut ctx = AnalysisContext::new(page_count, sampled);

    for index in 0..sampled {
        let page = index as u32 + 1;
        inspect(&mut ctx, model, index, config);
        progress.report(Progress::of(
            index + 1,
            sampled,
            format!("Analyzed page {page} of {sampled}"),
        ));
    }

    match model.optional_content_order() {
        Ok(groups) => scan_layers(&mut ctx, groups),
        Err(err) => ctx.soft_failure(None, "optional content", &err),
    }

    let result = aggregate::finish(&ctx, meta, config);
    info!(
        score = result.score,
        issues = result.issues.len(),
        soft_failures = ctx.soft_failures,
        "Preflight analysis complete"
    );
    result
}

/// Run every per-page extractor over page `index` (0-based). Each sub-check
/// fails on its own without affecting the others.
fn inspect(ctx: &mut AnalysisContext, model: &dyn DocumentModel, index: usize, config: &PreflightConfig) {
    let page = index as u32 + 1;

    let page_size = match model.page_geometry(index) {
        Ok(geometry) => {
            inspect_page(ctx, page, &geometry, config);
            Some((geometry.width, geometry.height))
        }
        Err(err) => {
            ctx.soft_failure(Some(page), "geometry", &err);
            None
        }
    };

    match model.page_content(index) {
        Ok(content) => {
            scan_operations(ctx, page, &content.ops, page_size, config);
            scan_text_sizes(ctx, page, &content.text_runs, config);
            scan_fonts(ctx, model, index, &content.text_runs);
        }
        Err(err) => ctx.soft_failure(Some(page), "content walk", &err),
    }

    match model.page_annotations(index) {
        Ok(annotations) => scan_annotations(ctx, page, &annotations),
        Err(err) => ctx.soft_failure(Some(page), "annotations", &err),
    }
}
