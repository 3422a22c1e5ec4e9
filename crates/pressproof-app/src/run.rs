// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Drives one CLI action through a worker and delivers the terminal event.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pressproof_core::error::{PressproofError, Result};
use pressproof_core::{FileMeta, PreflightConfig};
use pressproof_document::PdfLoader;
use pressproof_preflight::tac_level;
use pressproof_worker::{Event, Worker};
use serde_json::json;
use tracing::{error, info};

use crate::cli::{Action, Cli};

/// Run the parsed command line. Returns `false` when the worker answered
/// with an error event; I/O and configuration problems are returned as
/// errors.
pub async fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => PreflightConfig::load(path)?,
        None => PreflightConfig::default(),
    };

    let file = cli.action.file();
    let buffer = tokio::fs::read(file).await?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".into());
    let meta = FileMeta::new(name, buffer.len() as u64, "application/pdf");
    info!(file = %file.display(), bytes = buffer.len(), "Input loaded");

    let worker = Worker::spawn(Arc::new(PdfLoader::new()), config.clone());
    let command = cli.action.to_command(meta, buffer);
    let event = worker
        .run(command, |event| {
            if let Event::AnalysisProgress { progress, note } = event {
                info!(progress, note = note.as_deref().unwrap_or(""), "Progress");
            }
        })
        .await?;

    deliver(event, &cli.action, &config).await
}

async fn deliver(event: Event, action: &Action, config: &PreflightConfig) -> Result<bool> {
    let input = action.file();
    let output = action.output();

    match event {
        Event::AnalysisResult { result } => {
            let json = serde_json::to_string_pretty(&result)?;
            emit_text(output, &json).await?;
        }
        Event::TransformResult {
            operation,
            buffer,
            file_meta,
        } => {
            let path = output.map(Path::to_path_buf).unwrap_or_else(|| sibling(input, &file_meta.name));
            tokio::fs::write(&path, &buffer).await?;
            info!(%operation, path = %path.display(), bytes = buffer.len(), "Document written");
        }
        Event::TacHeatmapResult { data } => {
            if let Some(path) = output {
                tokio::fs::write(path, serde_json::to_vec(&data)?).await?;
            }
            // Values are an RGB-based approximation, not a colorimetric measure.
            let summary = json!({
                "pageIndex": data.page_index,
                "width": data.width,
                "height": data.height,
                "maxTac": data.max_tac,
                "level": tac_level(data.max_tac, config),
                "approximate": true,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Event::RenderPageResult { base64 } => {
            let png = STANDARD
                .decode(base64.as_bytes())
                .map_err(|e| PressproofError::ImageError(format!("preview decode: {e}")))?;
            let page = match action {
                Action::Render { page, .. } => *page,
                _ => 1,
            };
            let path = output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| sibling(input, &format!("{}-page{page}.png", stem(input))));
            tokio::fs::write(&path, &png).await?;
            info!(path = %path.display(), bytes = png.len(), "Preview written");
        }
        failure @ (Event::AnalysisError { .. }
        | Event::TransformError { .. }
        | Event::TacHeatmapError { .. }
        | Event::RenderError { .. }) => {
            error!(event = %failure.to_json()?, "Command failed");
            eprintln!("{}", failure.to_json()?);
            return Ok(false);
        }
        Event::AnalysisProgress { .. } => {
            return Err(PressproofError::InvalidCommand("worker ended on a progress event".into()));
        }
    }
    Ok(true)
}

async fn emit_text(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => tokio::fs::write(path, text).await?,
        None => println!("{text}"),
    }
    Ok(())
}

/// `name` in the same directory as `input`.
fn sibling(input: &Path, name: &str) -> PathBuf {
    input.with_file_name(name)
}

fn stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".into())
}
