// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preflight configuration. Every threshold used by the analysis and the
// transforms lives here so a deployment can tune them from one JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PressproofError, Result};

/// Tunable thresholds and pipeline parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreflightConfig {
    /// Number of leading pages walked by the extractors.
    pub sample_pages: usize,
    /// Images strictly below this effective DPI are low resolution.
    pub low_dpi_threshold: f32,
    /// Stroke widths strictly between zero and this value are hairlines.
    pub hairline_width_pt: f32,
    /// Text below this size is "tiny".
    pub tiny_text_pt: f32,
    /// Text below this size (and at or above `tiny_text_pt`) is "small".
    pub small_text_pt: f32,
    /// Minimum acceptable bleed in millimetres.
    pub min_bleed_mm: f32,
    /// Gaps within this many points of zero count as "no bleed".
    pub bleed_epsilon_pt: f32,
    /// Tolerance when matching the page against standard sizes.
    pub size_tolerance_mm: f32,
    /// Pages differing from page 1 by more than this are "mixed".
    pub mixed_size_tolerance_pt: f32,
    /// Files above this size get a warning.
    pub max_file_size_bytes: u64,
    /// Render scale for the grayscale pipeline (2.1 ≈ 150 DPI).
    pub grayscale_scale: f32,
    /// Target DPI for the rebuild pipeline when none is requested.
    pub default_target_dpi: u32,
    /// Lower clamp for requested target DPI.
    pub min_target_dpi: u32,
    /// Upper clamp for requested target DPI.
    pub max_target_dpi: u32,
    /// Bleed added by the bleed fix when none is requested.
    pub default_bleed_mm: f32,
    /// Pixel width the heatmap raster aims for.
    pub heatmap_target_width: u32,
    /// Ink coverage (0–400) from which the heatmap shows caution.
    pub tac_caution: f32,
    /// Ink coverage (0–400) above which the heatmap shows excess.
    pub tac_limit: f32,
    /// Render scale for page previews.
    pub preview_scale: f32,
    /// Margin kept around each page inside a booklet half-sheet.
    pub booklet_margin_pt: f32,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            sample_pages: 10,
            low_dpi_threshold: 150.0,
            hairline_width_pt: 0.25,
            tiny_text_pt: 6.0,
            small_text_pt: 8.0,
            min_bleed_mm: 2.9,
            bleed_epsilon_pt: 0.1,
            size_tolerance_mm: 3.0,
            mixed_size_tolerance_pt: 1.0,
            max_file_size_bytes: 150 * 1024 * 1024,
            grayscale_scale: 2.1,
            default_target_dpi: 150,
            min_target_dpi: 72,
            max_target_dpi: 600,
            default_bleed_mm: 3.0,
            heatmap_target_width: 150,
            tac_caution: 280.0,
            tac_limit: 300.0,
            preview_scale: 1.5,
            booklet_margin_pt: 18.0,
        }
    }
}

impl PreflightConfig {
    /// Parse a configuration from JSON. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Clamp a requested DPI into the supported range, falling back to the
    /// default when none was requested.
    pub fn resolve_target_dpi(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_target_dpi)
            .clamp(self.min_target_dpi, self.max_target_dpi)
    }

    fn validate(&self) -> Result<()> {
        if self.sample_pages == 0 {
            return Err(PressproofError::Config("sample_pages must be at least 1".into()));
        }
        if self.min_target_dpi > self.max_target_dpi {
            return Err(PressproofError::Config(format!(
                "min_target_dpi {} exceeds max_target_dpi {}",
                self.min_target_dpi, self.max_target_dpi
            )));
        }
        if self.tiny_text_pt > self.small_text_pt {
            return Err(PressproofError::Config(
                "tiny_text_pt must not exceed small_text_pt".into(),
            ));
        }
        if !(self.grayscale_scale > 0.0 && self.preview_scale > 0.0) {
            return Err(PressproofError::Config("render scales must be positive".into()));
        }
        Ok(())
    }
}
