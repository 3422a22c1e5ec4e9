// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pressproof preflight engine.

use serde::{Deserialize, Serialize};

/// Millimetres per PostScript point (1pt = 1/72 inch).
pub const MM_PER_PT: f32 = 25.4 / 72.0;

/// Convert points to millimetres.
pub fn pt_to_mm(pt: f32) -> f32 {
    pt * MM_PER_PT
}

/// Convert millimetres to points.
pub fn mm_to_pt(mm: f32) -> f32 {
    mm / MM_PER_PT
}

/// Descriptor of an input (or derived output) document.
///
/// Never mutated: transforms produce a fresh value via [`FileMeta::derived`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    pub name: String,
    pub size: u64,
    pub media_type: String,
}

impl FileMeta {
    pub fn new(name: impl Into<String>, size: u64, media_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            media_type: media_type.into(),
        }
    }

    /// Metadata for a PDF derived from this one: `report.pdf` with suffix
    /// `grayscale` becomes `report-grayscale.pdf`.
    pub fn derived(&self, suffix: &str, size: u64) -> Self {
        let stem = match self.name.rsplit_once('.') {
            Some((stem, ext)) if ext.eq_ignore_ascii_case("pdf") && !stem.is_empty() => stem,
            _ => self.name.as_str(),
        };
        Self {
            name: format!("{stem}-{suffix}.pdf"),
            size,
            media_type: "application/pdf".into(),
        }
    }
}

/// Closed set of issue categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Images,
    Color,
    Fonts,
    Metadata,
    Transparency,
    BleedMargins,
    Resolution,
    Compliance,
    PageSetup,
    Annotations,
    FormFields,
    Multimedia,
    Layers,
    Other,
}

/// Issue severity. Ordered so that `Error > Warning > Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Points subtracted from the 100-point score per issue of this severity.
    pub fn penalty(self) -> u32 {
        match self {
            Self::Error => 15,
            Self::Warning => 7,
            Self::Info => 0,
        }
    }
}

/// Bounding box relative to the page, each coordinate in 0–1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One finding of the preflight analysis.
///
/// `id` names the rule that fired, not the instance: a run emits at most one
/// issue per id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    /// 1-based page number, or `None` for document-level findings.
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<NormalizedBox>,
    pub severity: Severity,
    pub category: IssueCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Issue {
    pub fn new(
        id: &str,
        page: Option<u32>,
        severity: Severity,
        category: IssueCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.to_string(),
            page,
            bbox: None,
            severity,
            category,
            message: message.into(),
            details: None,
            tags: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|tag| tag.to_string()).collect();
        self
    }
}

/// Per-category severity tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: IssueCategory,
    pub errors: u32,
    pub warnings: u32,
    pub infos: u32,
}

/// Number of issues attributed to one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageIssueCount {
    /// 1-based page number.
    pub page: u32,
    pub issues: u32,
}

/// File facts echoed back with every result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightMeta {
    pub file_name: String,
    pub file_size: u64,
    pub page_count: usize,
}

/// Outcome of one `analyze` run. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightResult {
    /// 0–100.
    pub score: u8,
    pub summary: String,
    pub issues: Vec<Issue>,
    /// One entry per page of the document, sampled or not.
    pub pages: Vec<PageIssueCount>,
    pub categories: Vec<CategorySummary>,
    pub meta: PreflightMeta,
}

impl PreflightResult {
    pub fn issue(&self, id: &str) -> Option<&Issue> {
        self.issues.iter().find(|issue| issue.id == id)
    }

    pub fn count_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

/// Axis-aligned rectangle in PDF points, stored with `x0 <= x1`, `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Build a rectangle from two arbitrary corners.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Grow the rectangle outward by `amount` points on all four sides.
    pub fn expand(&self, amount: f32) -> Self {
        Self {
            x0: self.x0 - amount,
            y0: self.y0 - amount,
            x1: self.x1 + amount,
            y1: self.y1 + amount,
        }
    }

    /// Whether every edge lies within `tolerance` of `other`'s.
    pub fn approx_eq(&self, other: &Rect, tolerance: f32) -> bool {
        (self.x0 - other.x0).abs() <= tolerance
            && (self.y0 - other.y0).abs() <= tolerance
            && (self.x1 - other.x1).abs() <= tolerance
            && (self.y1 - other.y1).abs() <= tolerance
    }
}

/// Page size and box geometry as read from the document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    /// Displayed width in points (rotation applied).
    pub width: f32,
    /// Displayed height in points (rotation applied).
    pub height: f32,
    pub media_box: Rect,
    pub trim_box: Rect,
    /// Equal to `trim_box` when the page defines no bleed.
    pub bleed_box: Rect,
}

/// Per-font facts gathered while walking text runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontUsageRecord {
    /// Base font name with any subset prefix stripped.
    pub name: String,
    pub subset: bool,
    pub type3: bool,
}

/// Approximate total-ink-coverage grid for one page.
///
/// Values are naive RGB→CMYK estimates, not colorimetric measurements; they
/// are a visual aid for spotting heavy areas only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapData {
    /// 1-based page the grid was computed for.
    pub page_index: u32,
    pub width: u32,
    pub height: u32,
    /// Row-major, one byte per cell, linear in 0–400 % coverage.
    pub values: Vec<u8>,
    /// Highest estimated coverage on the 0–400 scale.
    pub max_tac: f32,
}

/// Coarse bucket for an ink-coverage value, used for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TacLevel {
    Ok,
    Caution,
    Excess,
}

impl TacLevel {
    pub fn classify(tac: f32, caution: f32, limit: f32) -> Self {
        if tac > limit {
            Self::Excess
        } else if tac >= caution {
            Self::Caution
        } else {
            Self::Ok
        }
    }
}

/// Standard page sizes recognised by the size check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A5,
    /// 170 × 240 mm trade paperback.
    Trade170x240,
    Letter,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Sizes tried in order by [`PaperSize::classify`].
    pub const STANDARD: [PaperSize; 4] = [Self::A5, Self::A4, Self::Trade170x240, Self::Letter];

    /// Dimensions in millimetres (width, height), portrait.
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A5 => (148, 210),
            Self::Trade170x240 => (170, 240),
            Self::Letter => (216, 279),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Dimensions in points (width, height), portrait.
    pub fn dimensions_pt(&self) -> (f32, f32) {
        match self {
            Self::A4 => (595.28, 841.89),
            Self::Letter => (612.0, 792.0),
            other => {
                let (w, h) = other.dimensions_mm();
                (mm_to_pt(w as f32), mm_to_pt(h as f32))
            }
        }
    }

    /// Short human label.
    pub fn label(&self) -> String {
        match self {
            Self::A4 => "A4".into(),
            Self::A5 => "A5".into(),
            Self::Trade170x240 => "170×240 mm".into(),
            Self::Letter => "US Letter".into(),
            Self::Custom {
                width_mm,
                height_mm,
            } => format!("{width_mm}×{height_mm} mm"),
        }
    }

    /// Match a page size in points against the standard sizes in either
    /// orientation; anything else becomes `Custom` with rounded millimetres.
    pub fn classify(width_pt: f32, height_pt: f32, tolerance_mm: f32) -> Self {
        let w = pt_to_mm(width_pt);
        let h = pt_to_mm(height_pt);
        let near = |a: f32, b: u32| (a - b as f32).abs() <= tolerance_mm;

        for size in Self::STANDARD {
            let (sw, sh) = size.dimensions_mm();
            if (near(w, sw) && near(h, sh)) || (near(w, sh) && near(h, sw)) {
                return size;
            }
        }
        Self::Custom {
            width_mm: w.round().max(0.0) as u32,
            height_mm: h.round().max(0.0) as u32,
        }
    }

    pub fn is_standard(&self) -> bool {
        !matches!(self, Self::Custom { .. })
    }
}
