// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synchronous command handlers. Each one runs a command to completion,
// forwarding progress through `emit`, and returns the terminal event.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pressproof_core::PreflightConfig;
use pressproof_core::error::Result;
use pressproof_document::DocumentLoader;
use pressproof_preflight::{self as preflight, Progress, TransformKind, TransformOutput};
use tracing::{info, warn};

use crate::protocol::{Command, Event};

/// Run `command` and return its terminal event. Progress events go to
/// `emit` as they happen; pipeline errors become the terminal error event
/// for the command's family.
pub fn execute(
    command: Command,
    loader: &dyn DocumentLoader,
    config: &PreflightConfig,
    emit: &mut dyn FnMut(Event),
) -> Event {
    let kind = command.kind();
    let mut progress = |p: Progress| emit(Event::from(p));

    let outcome: Result<Event> = match command {
        Command::Analyze { file_meta, buffer } => Ok(Event::AnalysisResult {
            result: preflight::analyze(loader, &buffer, &file_meta, config, &mut progress),
        }),
        Command::ConvertToGrayscale { file_meta, buffer } => {
            preflight::convert_to_grayscale(loader, &buffer, &file_meta, config, &mut progress)
                .map(transformed(TransformKind::ConvertToGrayscale))
        }
        Command::UpscaleLowResImages {
            file_meta,
            buffer,
            min_dpi,
        } => preflight::upscale_low_res_images(loader, &buffer, &file_meta, min_dpi, config, &mut progress)
            .map(transformed(TransformKind::UpscaleLowResImages)),
        Command::FixBleed {
            file_meta,
            buffer,
            bleed_mm,
        } => preflight::fix_bleed(loader, &buffer, &file_meta, bleed_mm, config, &mut progress)
            .map(transformed(TransformKind::FixBleed)),
        Command::CreateBooklet { file_meta, buffer } => {
            preflight::create_booklet(loader, &buffer, &file_meta, config, &mut progress)
                .map(transformed(TransformKind::CreateBooklet))
        }
        Command::TacHeatmap {
            buffer, page_index, ..
        } => preflight::tac_heatmap(loader, &buffer, page_index, config)
            .map(|data| Event::TacHeatmapResult { data }),
        Command::RenderPageAsImage {
            buffer, page_index, ..
        } => preflight::render_page_png(loader, &buffer, page_index, config).map(|png| Event::RenderPageResult {
            base64: STANDARD.encode(png),
        }),
    };

    match outcome {
        Ok(event) => {
            info!(?kind, "Command finished");
            event
        }
        Err(err) => {
            warn!(?kind, error = %err, "Command failed");
            kind.failure(err.to_string())
        }
    }
}

/// The output buffer moves into the event without copying.
fn transformed(operation: TransformKind) -> impl FnOnce(TransformOutput) -> Event {
    move |output| Event::TransformResult {
        operation,
        buffer: output.bytes,
        file_meta: output.file_meta,
    }
}
