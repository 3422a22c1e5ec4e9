// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: RGBA pixel buffers, luma conversion and PNG encoding.

pub mod raster;

pub use raster::PixelBuffer;
