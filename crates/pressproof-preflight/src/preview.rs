// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-page PNG preview.

use pressproof_core::PreflightConfig;
use pressproof_core::error::Result;
use pressproof_document::DocumentLoader;
use tracing::{debug, instrument};

use crate::heatmap::page_index;

/// Render page `page` (1-based) at `config.preview_scale` and encode it as
/// PNG. Out-of-range pages are rejected, never clamped.
#[instrument(skip_all, fields(bytes_len = bytes.len(), page))]
pub fn render_page_png(loader: &dyn DocumentLoader, bytes: &[u8], page: u32, config: &PreflightConfig) -> Result<Vec<u8>> {
    let mut renderer = loader.load_renderer(bytes.to_vec())?;
    let index = page_index(page, renderer.page_count())?;
    let buffer = renderer.render_page(index, config.preview_scale)?;
    let png = buffer.to_png_bytes()?;
    debug!(width = buffer.width(), height = buffer.height(), png_len = png.len(), "Page preview encoded");
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDocument, FakeLoader, FakePage};
    use pressproof_core::PressproofError;

    #[test]
    fn preview_is_png_at_preview_scale() {
        let loader = FakeLoader::new(FakeDocument::new(vec![FakePage::sized(100.0, 200.0)]));
        let png = render_page_png(&loader, b"%PDF", 1, &PreflightConfig::default()).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        // IHDR width and height, big-endian.
        assert_eq!(u32::from_be_bytes([png[16], png[17], png[18], png[19]]), 150);
        assert_eq!(u32::from_be_bytes([png[20], png[21], png[22], png[23]]), 300);
    }

    #[test]
    fn out_of_range_page_is_rejected() {
        let loader = FakeLoader::new(FakeDocument::new(vec![FakePage::letter()]));
        let err = render_page_png(&loader, b"%PDF", 3, &PreflightConfig::default()).unwrap_err();
        assert!(matches!(err, PressproofError::PageOutOfRange { page: 3, count: 1 }));
    }
}
