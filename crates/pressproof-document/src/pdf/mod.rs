// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: reading page structure, writing raster documents, and editing
// boxes or imposing pages on a parsed copy.

pub mod editor;
mod objects;
pub mod reader;
pub mod writer;

pub use editor::PdfEditor;
pub use reader::LopdfModel;
pub use writer::RasterPdfWriter;
