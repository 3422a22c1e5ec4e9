// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transform pipelines. Each produces a new document and new file metadata
// from a borrowed input buffer; the input is never modified.

pub mod bleed;
pub mod raster;

use pressproof_core::FileMeta;
use serde::{Deserialize, Serialize};

pub use bleed::fix_bleed;
pub use raster::{convert_to_grayscale, upscale_low_res_images};

/// The document-producing operations, named as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformKind {
    ConvertToGrayscale,
    UpscaleLowResImages,
    FixBleed,
    CreateBooklet,
}

impl TransformKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConvertToGrayscale => "convertToGrayscale",
            Self::UpscaleLowResImages => "upscaleLowResImages",
            Self::FixBleed => "fixBleed",
            Self::CreateBooklet => "createBooklet",
        }
    }
}

impl std::fmt::Display for TransformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finished transform: the new document and its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    pub bytes: Vec<u8>,
    pub file_meta: FileMeta,
}

impl TransformOutput {
    /// Wrap `bytes` with metadata derived from `source` under `suffix`.
    pub fn derived(source: &FileMeta, suffix: &str, bytes: Vec<u8>) -> Self {
        let file_meta = source.derived(suffix, bytes.len() as u64);
        Self { bytes, file_meta }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_serde() {
        for kind in [
            TransformKind::ConvertToGrayscale,
            TransformKind::UpscaleLowResImages,
            TransformKind::FixBleed,
            TransformKind::CreateBooklet,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn output_metadata_tracks_new_size() {
        let source = FileMeta::new("flyer.pdf", 10, "application/pdf");
        let output = TransformOutput::derived(&source, "bleed", vec![0; 42]);
        assert_eq!(output.file_meta.name, "flyer-bleed.pdf");
        assert_eq!(output.file_meta.size, 42);
        assert_eq!(source.size, 10);
    }
}
