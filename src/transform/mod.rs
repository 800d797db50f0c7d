// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Transform strategies and dispatch
//!
//! Every resolved path is assigned a strategy by extension, never by content:
//!
//! - `.ts` / `.tsx` / `.mts` / `.cts` → **fast**: typed-syntax strip, markup
//!   translation when the extension implies markup, CommonJS lowering, fixed
//!   factory configuration.
//! - `.js` → **pass-through**: the source is already executable.
//! - `.json` → **data**: not a code transform at all; the loader parses the
//!   file and short-circuits execution entirely.
//! - anything else → **full**: the ordered preset list (markup, typed
//!   syntax, common modules) with `transform_options` overrides applied.
//!
//! A `.ts` file containing markup is not rescued: markup awareness comes
//! from the filename suffix alone, and such a file fails the typed-syntax
//! pass with a syntax error that propagates unmodified.

pub mod cjs;
pub mod lexer;
pub mod markup;
pub mod strip;

use crate::error::{JitteError, Result};
use crate::options::Options;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use markup::MarkupOptions;
use std::path::Path;
use tracing::debug;

/// Extensions carrying typed syntax; these take the fast strategy.
pub const TYPED_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];

/// Extensions whose suffix implies embedded markup.
pub const MARKUP_EXTENSIONS: &[&str] = &["jsx", "tsx"];

/// The transform strategy chosen for a resolved path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Fixed-configuration pipeline for typed sources
    Fast,
    /// Source is already executable
    Passthrough,
    /// Structured data, parsed rather than executed
    Data,
    /// Preset-driven pipeline for everything else
    Full,
}

/// Select the strategy for a resolved path by its extension.
pub fn strategy_for(path: &Path) -> Strategy {
    match extension(path) {
        Some(ext) if TYPED_EXTENSIONS.contains(&ext.as_str()) => Strategy::Fast,
        Some(ext) if ext == "js" => Strategy::Passthrough,
        Some(ext) if ext == "json" => Strategy::Data,
        _ => Strategy::Full,
    }
}

/// Does the filename suffix imply markup translation?
pub fn implies_markup(path: &Path) -> bool {
    matches!(extension(path), Some(ext) if MARKUP_EXTENSIONS.contains(&ext.as_str()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// One stage of the full strategy's ordered preset list.
#[derive(Debug, Clone)]
enum Preset {
    /// Markup-to-calls translation
    Markup(MarkupOptions),
    /// Typed-syntax removal
    TypedSyntax,
    /// ES-module to CommonJS lowering for the current host
    CommonModules,
}

/// Transform `source` into executable text for the sandbox.
///
/// The `Data` strategy never reaches this function; the loader short-circuits
/// JSON files before any transform work.
pub fn transform(path: &Path, source: &str, options: &Options) -> Result<String> {
    let strategy = strategy_for(path);
    debug!(path = %path.display(), ?strategy, "transform");
    let presets = match strategy {
        Strategy::Passthrough => return Ok(source.to_string()),
        Strategy::Data => return Ok(source.to_string()),
        Strategy::Fast => fast_presets(implies_markup(path)),
        Strategy::Full => full_presets(implies_markup(path), options),
    };

    let mut code = source.to_string();
    for preset in &presets {
        code = match preset {
            Preset::Markup(markup_options) => markup::transform_markup(&code, markup_options),
            Preset::TypedSyntax => strip::strip_types(&code),
            Preset::CommonModules => cjs::lower_modules(&code),
        }
        .map_err(|err| JitteError::transform(path, err.message))?;
    }

    if options.source_maps {
        code.push_str(&inline_source_map(path, source, &code));
    }
    Ok(code)
}

/// Fast strategy: fixed configuration, markup decided by extension.
fn fast_presets(markup: bool) -> Vec<Preset> {
    let mut presets = Vec::new();
    if markup {
        presets.push(Preset::Markup(MarkupOptions::default()));
    }
    presets.push(Preset::TypedSyntax);
    presets.push(Preset::CommonModules);
    presets
}

/// Full strategy: same preset order, with caller overrides merged in.
fn full_presets(markup: bool, options: &Options) -> Vec<Preset> {
    let overrides = &options.transform_options;
    let mut markup_options = MarkupOptions::default();
    if let Some(factory) = &overrides.jsx_factory {
        markup_options.factory = factory.clone();
    }
    if let Some(fragment) = &overrides.jsx_fragment {
        markup_options.fragment = fragment.clone();
    }
    let mut presets = Vec::new();
    if markup {
        presets.push(Preset::Markup(markup_options));
    }
    presets.push(Preset::TypedSyntax);
    presets.push(Preset::CommonModules);
    presets
}

// ----------------------------------------------------------------------
// Pass plumbing shared by the rewrite passes
// ----------------------------------------------------------------------

/// Failure inside a rewrite pass; the dispatcher attaches the path.
#[derive(Debug, Clone)]
pub(crate) struct PassError {
    pub message: String,
}

impl From<lexer::LexError> for PassError {
    fn from(err: lexer::LexError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// An ordered set of span edits applied in one pass over the source.
///
/// Deletions keep the newlines they covered and replacements are single-line
/// by construction, so every pass preserves line numbers and the inline
/// source map can use a line-identity mapping.
pub(crate) struct EditList {
    edits: Vec<Edit>,
}

struct Edit {
    start: usize,
    end: usize,
    replacement: String,
}

impl EditList {
    pub fn new() -> Self {
        Self { edits: Vec::new() }
    }

    /// Insert `text` at a byte offset.
    pub fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.edits.push(Edit {
            start: at,
            end: at,
            replacement: text.into(),
        });
    }

    /// Delete a byte range.
    pub fn delete_range(&mut self, start: usize, end: usize) {
        self.replace_range(start, end, String::new());
    }

    /// Replace a byte range with `replacement`.
    pub fn replace_range(&mut self, start: usize, end: usize, replacement: impl Into<String>) {
        self.edits.push(Edit {
            start,
            end,
            replacement: replacement.into(),
        });
    }

    /// Apply the edits. Overlapping edits keep the earliest; newlines inside
    /// a replaced range are re-emitted after the replacement text.
    pub fn apply(mut self, source: &str) -> String {
        self.edits.sort_by_key(|e| (e.start, e.end));
        let mut out = String::with_capacity(source.len());
        let mut cursor = 0usize;
        for edit in &self.edits {
            if edit.start < cursor {
                continue;
            }
            out.push_str(&source[cursor..edit.start]);
            out.push_str(&edit.replacement);
            for b in source[edit.start..edit.end].bytes() {
                if b == b'\n' {
                    out.push('\n');
                }
            }
            cursor = edit.end;
        }
        out.push_str(&source[cursor..]);
        out
    }
}

// ----------------------------------------------------------------------
// Inline source maps
// ----------------------------------------------------------------------

/// Build the `//# sourceMappingURL=` comment. All passes are line-preserving,
/// so the mapping is line-identity with the original embedded.
fn inline_source_map(path: &Path, original: &str, transformed: &str) -> String {
    let lines = transformed.lines().count().max(1);
    let mut mappings = String::from("AAAA");
    for _ in 1..lines {
        mappings.push_str(";AACA");
    }
    let map = serde_json::json!({
        "version": 3,
        "sources": [path.display().to_string()],
        "sourcesContent": [original],
        "names": [],
        "mappings": mappings,
    });
    format!(
        "\n//# sourceMappingURL=data:application/json;base64,{}",
        STANDARD.encode(map.to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_strategy_selection() {
        assert_eq!(strategy_for(Path::new("a.ts")), Strategy::Fast);
        assert_eq!(strategy_for(Path::new("a.tsx")), Strategy::Fast);
        assert_eq!(strategy_for(Path::new("a.mts")), Strategy::Fast);
        assert_eq!(strategy_for(Path::new("a.js")), Strategy::Passthrough);
        assert_eq!(strategy_for(Path::new("a.json")), Strategy::Data);
        assert_eq!(strategy_for(Path::new("a.jsx")), Strategy::Full);
        assert_eq!(strategy_for(Path::new("a.mjs")), Strategy::Full);
        assert_eq!(strategy_for(Path::new("a")), Strategy::Full);
    }

    #[test]
    fn test_markup_from_suffix_only() {
        assert!(implies_markup(Path::new("a.tsx")));
        assert!(implies_markup(Path::new("a.jsx")));
        assert!(!implies_markup(Path::new("a.ts")));
        assert!(!implies_markup(Path::new("a.js")));
    }

    #[test]
    fn test_fast_transform_strips_and_lowers() {
        let options = Options::default().with_source_maps(false);
        let out = transform(
            &PathBuf::from("mod.ts"),
            "export const n: number = 1;\n",
            &options,
        )
        .unwrap();
        assert!(out.contains("const n = 1; exports.n = n;"));
        assert!(!out.contains(": number"));
    }

    #[test]
    fn test_markup_in_plain_typed_file_is_a_syntax_error() {
        let options = Options::default();
        let err = transform(
            &PathBuf::from("mod.ts"),
            "export const e = <p>it's markup</p>;\n",
            &options,
        )
        .unwrap_err();
        match err {
            JitteError::Transform { path, .. } => {
                assert_eq!(path, PathBuf::from("mod.ts"));
            }
            other => panic!("expected transform error, got {other:?}"),
        }
    }

    #[test]
    fn test_full_strategy_honors_pragma_overrides() {
        let options = Options::default().with_source_maps(false).with_transform_options(
            crate::options::TransformOptions {
                jsx_factory: Some("h".to_string()),
                jsx_fragment: None,
            },
        );
        let out = transform(
            &PathBuf::from("view.jsx"),
            "export default () => <p>hi</p>;\n",
            &options,
        )
        .unwrap();
        assert!(out.contains("h(\"p\", null, \"hi\")"));
    }

    #[test]
    fn test_inline_source_map_appended() {
        let options = Options::default();
        let out = transform(&PathBuf::from("mod.ts"), "const a: number = 1;\n", &options).unwrap();
        assert!(out.contains("//# sourceMappingURL=data:application/json;base64,"));
        let without = transform(
            &PathBuf::from("mod.ts"),
            "const a: number = 1;\n",
            &Options::default().with_source_maps(false),
        )
        .unwrap();
        assert!(!without.contains("sourceMappingURL"));
    }

    #[test]
    fn test_passthrough_returns_source_unchanged() {
        let options = Options::default().with_source_maps(false);
        let src = "module.exports = 1;\n";
        assert_eq!(
            transform(&PathBuf::from("mod.js"), src, &options).unwrap(),
            src
        );
    }

    #[test]
    fn test_edit_list_preserves_newlines() {
        let mut edits = EditList::new();
        edits.delete_range(0, 12);
        assert_eq!(edits.apply("one\ntwo\nend\nkeep"), "\n\n\nkeep");
    }
}
