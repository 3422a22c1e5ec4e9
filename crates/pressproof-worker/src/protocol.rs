// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wire protocol between a caller and a worker: one `Command` in, zero or
// more progress `Event`s, then exactly one terminal `Event` out.
//
// Messages are JSON objects discriminated by a camelCase `type` field.
// Document buffers travel as standard base64 strings. Page numbers are
// 1-based.

use pressproof_core::error::{PressproofError, Result};
use pressproof_core::{FileMeta, HeatmapData, PreflightResult};
use pressproof_preflight::{Progress, TransformKind};
use serde::{Deserialize, Serialize};

/// A request for one unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    Analyze {
        file_meta: FileMeta,
        #[serde(with = "base64_bytes")]
        buffer: Vec<u8>,
    },
    ConvertToGrayscale {
        file_meta: FileMeta,
        #[serde(with = "base64_bytes")]
        buffer: Vec<u8>,
    },
    UpscaleLowResImages {
        file_meta: FileMeta,
        #[serde(with = "base64_bytes")]
        buffer: Vec<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_dpi: Option<u32>,
    },
    FixBleed {
        file_meta: FileMeta,
        #[serde(with = "base64_bytes")]
        buffer: Vec<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bleed_mm: Option<f32>,
    },
    CreateBooklet {
        file_meta: FileMeta,
        #[serde(with = "base64_bytes")]
        buffer: Vec<u8>,
    },
    TacHeatmap {
        file_meta: FileMeta,
        #[serde(with = "base64_bytes")]
        buffer: Vec<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page_index: Option<u32>,
    },
    RenderPageAsImage {
        file_meta: FileMeta,
        #[serde(with = "base64_bytes")]
        buffer: Vec<u8>,
        page_index: u32,
    },
}

/// Which family of terminal events a command ends with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Analyze,
    Transform(TransformKind),
    TacHeatmap,
    RenderPage,
}

impl CommandKind {
    /// The terminal error event for this kind of command.
    pub fn failure(self, message: impl Into<String>) -> Event {
        let message = message.into();
        match self {
            Self::Analyze => Event::AnalysisError { message },
            Self::Transform(operation) => Event::TransformError { operation, message },
            Self::TacHeatmap => Event::TacHeatmapError { message },
            Self::RenderPage => Event::RenderError { message },
        }
    }
}

impl Command {
    /// Parse a JSON command. Unknown `type`s and malformed fields are
    /// `InvalidCommand`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PressproofError::InvalidCommand(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Analyze { .. } => CommandKind::Analyze,
            Self::ConvertToGrayscale { .. } => CommandKind::Transform(TransformKind::ConvertToGrayscale),
            Self::UpscaleLowResImages { .. } => CommandKind::Transform(TransformKind::UpscaleLowResImages),
            Self::FixBleed { .. } => CommandKind::Transform(TransformKind::FixBleed),
            Self::CreateBooklet { .. } => CommandKind::Transform(TransformKind::CreateBooklet),
            Self::TacHeatmap { .. } => CommandKind::TacHeatmap,
            Self::RenderPageAsImage { .. } => CommandKind::RenderPage,
        }
    }

    pub fn file_meta(&self) -> &FileMeta {
        match self {
            Self::Analyze { file_meta, .. }
            | Self::ConvertToGrayscale { file_meta, .. }
            | Self::UpscaleLowResImages { file_meta, .. }
            | Self::FixBleed { file_meta, .. }
            | Self::CreateBooklet { file_meta, .. }
            | Self::TacHeatmap { file_meta, .. }
            | Self::RenderPageAsImage { file_meta, .. } => file_meta,
        }
    }

    pub fn buffer(&self) -> &[u8] {
        match self {
            Self::Analyze { buffer, .. }
            | Self::ConvertToGrayscale { buffer, .. }
            | Self::UpscaleLowResImages { buffer, .. }
            | Self::FixBleed { buffer, .. }
            | Self::CreateBooklet { buffer, .. }
            | Self::TacHeatmap { buffer, .. }
            | Self::RenderPageAsImage { buffer, .. } => buffer,
        }
    }
}

/// A message from the worker back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
    AnalysisProgress {
        progress: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    AnalysisResult {
        result: PreflightResult,
    },
    AnalysisError {
        message: String,
    },
    TransformResult {
        operation: TransformKind,
        #[serde(with = "base64_bytes")]
        buffer: Vec<u8>,
        file_meta: FileMeta,
    },
    TransformError {
        operation: TransformKind,
        message: String,
    },
    /// Approximate ink coverage; see [`HeatmapData`].
    TacHeatmapResult {
        #[serde(flatten)]
        data: HeatmapData,
    },
    TacHeatmapError {
        message: String,
    },
    RenderPageResult {
        base64: String,
    },
    RenderError {
        message: String,
    },
}

impl Event {
    /// Whether this event ends the command.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::AnalysisProgress { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::AnalysisError { .. }
                | Self::TransformError { .. }
                | Self::TacHeatmapError { .. }
                | Self::RenderError { .. }
        )
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<Progress> for Event {
    fn from(progress: Progress) -> Self {
        Self::AnalysisProgress {
            progress: progress.percent,
            note: progress.note,
        }
    }
}

/// Serde adapter carrying byte buffers as standard base64 text.
pub mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}
