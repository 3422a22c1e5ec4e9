// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pressproof.

use thiserror::Error;

/// Top-level error type for all Pressproof operations.
#[derive(Debug, Error)]
pub enum PressproofError {
    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("no page renderer is available in this build")]
    RendererUnavailable,

    #[error("page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: u32, count: usize },

    // -- Protocol errors --
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("invalid document buffer: {0}")]
    InvalidBuffer(String),

    #[error("worker is no longer running")]
    WorkerClosed,

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PressproofError>;
