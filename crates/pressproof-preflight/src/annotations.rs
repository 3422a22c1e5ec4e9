// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Annotation and layer classifier.

use pressproof_document::AnnotationInfo;

use crate::context::AnalysisContext;

/// What an annotation subtype means for print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationClass {
    FormField,
    Multimedia,
    /// Review markup and links.
    Markup,
    /// Anything else (printer marks, shapes, stamps...) is not reported.
    Unclassified,
}

impl AnnotationClass {
    pub fn of(subtype: &str) -> Self {
        match subtype {
            "Widget" => Self::FormField,
            "Movie" | "RichMedia" | "Sound" | "FileAttachment" | "Screen" | "3D" => Self::Multimedia,
            "Text" | "Highlight" | "Underline" | "Squiggly" | "StrikeOut" | "Caret" | "Ink"
            | "Popup" | "Link" => Self::Markup,
            _ => Self::Unclassified,
        }
    }
}

/// Fold one page's annotations into the context. `page` is 1-based.
pub fn scan_annotations(ctx: &mut AnalysisContext, page: u32, annotations: &[AnnotationInfo]) {
    for annotation in annotations {
        match AnnotationClass::of(&annotation.subtype) {
            AnnotationClass::FormField => ctx.form_fields.record(page),
            AnnotationClass::Multimedia => ctx.multimedia.record(page),
            AnnotationClass::Markup => ctx.markup_annotations.record(page),
            AnnotationClass::Unclassified => {}
        }
    }
}

/// Record the document's optional-content groups.
pub fn scan_layers(ctx: &mut AnalysisContext, group_names: Vec<String>) {
    ctx.layers = group_names;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annots(subtypes: &[&str]) -> Vec<AnnotationInfo> {
        subtypes
            .iter()
            .map(|s| AnnotationInfo { subtype: s.to_string() })
            .collect()
    }

    #[test]
    fn subtypes_classify() {
        assert_eq!(AnnotationClass::of("Widget"), AnnotationClass::FormField);
        assert_eq!(AnnotationClass::of("3D"), AnnotationClass::Multimedia);
        assert_eq!(AnnotationClass::of("FileAttachment"), AnnotationClass::Multimedia);
        assert_eq!(AnnotationClass::of("Link"), AnnotationClass::Markup);
        assert_eq!(AnnotationClass::of("PrinterMark"), AnnotationClass::Unclassified);
    }

    #[test]
    fn classes_keep_their_own_first_page() {
        let mut ctx = AnalysisContext::new(3, 3);
        scan_annotations(&mut ctx, 1, &annots(&["Square"]));
        scan_annotations(&mut ctx, 2, &annots(&["Highlight", "Widget"]));
        scan_annotations(&mut ctx, 3, &annots(&["Widget", "Movie"]));
        assert_eq!(ctx.markup_annotations.first_page, Some(2));
        assert_eq!(ctx.form_fields.first_page, Some(2));
        assert_eq!(ctx.form_fields.count, 2);
        assert_eq!(ctx.multimedia.first_page, Some(3));
    }
}
