// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pressproof_core::FileMeta;
use pressproof_worker::Command;

/// Preflight PDFs for print and apply raster repairs.
#[derive(Debug, Parser)]
#[command(name = "pressproof", about, version)]
pub struct Cli {
    /// JSON configuration file; missing keys keep their defaults
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub action: Action,
}

#[derive(Debug, Subcommand)]
pub enum Action {
    /// Analyse a PDF and print the preflight report as JSON
    Analyze {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Rebuild every page as a grayscale raster
    Grayscale {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Rebuild every page as a raster at a minimum DPI
    Upscale {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Target DPI, clamped to the configured range
        #[arg(long)]
        dpi: Option<u32>,
    },

    /// Add bleed around every page
    Bleed {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Bleed in millimetres
        #[arg(long = "bleed-mm")]
        bleed_mm: Option<f32>,
    },

    /// Impose as a saddle-stitch booklet on landscape A4
    Booklet {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Estimate ink coverage for one page
    Heatmap {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Write the full grid as JSON here
        #[arg(long)]
        output: Option<PathBuf>,
        /// 1-based page number
        #[arg(long)]
        page: Option<u32>,
    },

    /// Render one page to PNG
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

impl Action {
    pub fn file(&self) -> &Path {
        match self {
            Self::Analyze { file, .. }
            | Self::Grayscale { file, .. }
            | Self::Upscale { file, .. }
            | Self::Bleed { file, .. }
            | Self::Booklet { file, .. }
            | Self::Heatmap { file, .. }
            | Self::Render { file, .. } => file,
        }
    }

    pub fn output(&self) -> Option<&Path> {
        match self {
            Self::Analyze { output, .. }
            | Self::Grayscale { output, .. }
            | Self::Upscale { output, .. }
            | Self::Bleed { output, .. }
            | Self::Booklet { output, .. }
            | Self::Heatmap { output, .. }
            | Self::Render { output, .. } => output.as_deref(),
        }
    }

    /// The worker command for this action over `buffer`.
    pub fn to_command(&self, file_meta: FileMeta, buffer: Vec<u8>) -> Command {
        match *self {
            Self::Analyze { .. } => Command::Analyze { file_meta, buffer },
            Self::Grayscale { .. } => Command::ConvertToGrayscale { file_meta, buffer },
            Self::Upscale { dpi, .. } => Command::UpscaleLowResImages {
                file_meta,
                buffer,
                min_dpi: dpi,
            },
            Self::Bleed { bleed_mm, .. } => Command::FixBleed {
                file_meta,
                buffer,
                bleed_mm,
            },
            Self::Booklet { .. } => Command::CreateBooklet { file_meta, buffer },
            Self::Heatmap { page, .. } => Command::TacHeatmap {
                file_meta,
                buffer,
                page_index: page,
            },
            Self::Render { page, .. } => Command::RenderPageAsImage {
                file_meta,
                buffer,
                page_index: page,
            },
        }
    }
}
