// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The require interceptor
//!
//! Every executed module receives its own `require` binding, a native
//! function closed over the owning module's directory. Relative identifiers
//! with a typed extension (or none at all) re-enter the full pipeline, so
//! nested typed sources are transformed and cached like the entry module.
//! Everything else — package names, absolute paths, relative identifiers
//! with a non-typed extension — delegates to the host-native loader, which
//! executes files as-is.
//!
//! Re-entering the pipeline for every identifier would transpile files that
//! need no transpilation and defeat native resolution of installed
//! packages; this split is what keeps both sides working.

use crate::error::{JitteError, Result};
use crate::module_system::loader::{self, SharedState};
use crate::transform::TYPED_EXTENSIONS;
use boa_engine::object::builtins::JsFunction;
use boa_engine::object::FunctionObjectBuilder;
use boa_engine::{js_string, Context, JsNativeError, JsValue, NativeFunction};
use boa_gc::{Finalize, Trace};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::trace;

/// State threaded into the native require function.
#[derive(Trace, Finalize)]
struct RequireCaptures {
    #[unsafe_ignore_trace]
    state: SharedState,
    #[unsafe_ignore_trace]
    dir: PathBuf,
}

/// Build the `require` function for a module at `module_path`.
pub(crate) fn bind(state: &SharedState, module_path: &Path, context: &mut Context) -> JsFunction {
    let captures = RequireCaptures {
        state: Rc::clone(state),
        dir: module_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };
    FunctionObjectBuilder::new(
        context.realm(),
        NativeFunction::from_copy_closure_with_captures(
            |_this, args, captures, context| {
                let Some(first) = args.first() else {
                    return Err(JsNativeError::typ()
                        .with_message("require expects a module identifier")
                        .into());
                };
                let specifier = first.to_string(context)?.to_std_string_escaped();
                intercept(&captures.state, &captures.dir, &specifier, context)
                    .map_err(JitteError::into_js)
            },
            captures,
        ),
    )
    .name(js_string!("require"))
    .length(1)
    .build()
}

/// Route one identifier: pipeline re-entry or host-native delegation.
pub(crate) fn intercept(
    state: &SharedState,
    dir: &Path,
    specifier: &str,
    context: &mut Context,
) -> Result<JsValue> {
    if routes_through_pipeline(specifier) {
        trace!(specifier, "require: pipeline");
        loader::load(state, specifier, dir, context)
    } else {
        trace!(specifier, "require: host-native");
        loader::load_native(state, specifier, dir, context)
    }
}

/// Relative identifiers re-enter the pipeline when their literal extension
/// is a typed one, or when they carry no extension at all.
pub(crate) fn routes_through_pipeline(specifier: &str) -> bool {
    if !specifier.starts_with("./") && !specifier.starts_with("../") {
        return false;
    }
    match literal_extension(specifier) {
        None => true,
        Some(ext) => TYPED_EXTENSIONS.contains(&ext.as_str()),
    }
}

fn literal_extension(specifier: &str) -> Option<String> {
    Path::new(specifier)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_typed_or_bare_takes_pipeline() {
        assert!(routes_through_pipeline("./mod"));
        assert!(routes_through_pipeline("./mod.ts"));
        assert!(routes_through_pipeline("./view.tsx"));
        assert!(routes_through_pipeline("../lib/helper"));
    }

    #[test]
    fn test_everything_else_is_host_native() {
        assert!(!routes_through_pipeline("./legacy.js"));
        assert!(!routes_through_pipeline("./data.json"));
        assert!(!routes_through_pipeline("lodash"));
        assert!(!routes_through_pipeline("@scope/pkg"));
        assert!(!routes_through_pipeline("/abs/path/mod.ts"));
    }

    #[test]
    fn test_dotted_directories_do_not_confuse_the_extension() {
        // The extension comes from the last path component.
        assert!(routes_through_pipeline("./v1.2/mod.ts"));
        assert!(!routes_through_pipeline("./v1.2/mod.js"));
    }
}
