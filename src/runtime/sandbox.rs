// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Execution sandbox
//!
//! Compiles executable text into the CommonJS function wrapper and invokes
//! it exactly once with a fresh module scope. Each module gets its own
//! function scope and its own `require` binding, passed by construction —
//! one module's interception never leaks into a sibling.
//!
//! Compilation errors and thrown exceptions are tagged with the resolved
//! path and re-raised unmodified; nothing is retried or swallowed.

use crate::error::{JitteError, Result};
use crate::module_system::{bind_require, SharedState};
use boa_engine::object::builtins::JsFunction;
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{js_string, Context, JsObject, JsString, JsValue, Script, Source};
use std::path::Path;
use tracing::trace;

/// The module-scope bindings injected into one execution: the value object
/// behind `exports`, `require`, `module`, `__filename`, and `__dirname`.
pub(crate) struct ModuleScope {
    pub exports: JsObject,
    pub module: JsObject,
    pub require: JsFunction,
    pub filename: JsString,
    pub dirname: JsString,
}

impl ModuleScope {
    /// Build a fresh scope for the module at `path`.
    fn new(state: &SharedState, path: &Path, context: &mut Context) -> Self {
        let exports = JsObject::with_object_proto(context.intrinsics());
        let filename = path.display().to_string();
        let dirname = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .display()
            .to_string();
        let module = ObjectInitializer::new(context)
            .property(js_string!("exports"), exports.clone(), Attribute::all())
            .property(
                js_string!("id"),
                JsString::from(filename.as_str()),
                Attribute::all(),
            )
            .property(
                js_string!("filename"),
                JsString::from(filename.as_str()),
                Attribute::all(),
            )
            .property(js_string!("loaded"), false, Attribute::all())
            .build();
        let require = bind_require(state, path, context);
        Self {
            exports,
            module,
            require,
            filename: JsString::from(filename.as_str()),
            dirname: JsString::from(dirname.as_str()),
        }
    }
}

/// Execute `code` as the module at `path`, returning its final exports.
///
/// The exports object is registered as in-flight for the duration of the
/// call so that cyclic requires observe the partial value instead of
/// recursing forever. On failure the registration is withdrawn and no cache
/// entry is ever written, so a later load retries from scratch.
pub(crate) fn execute(
    state: &SharedState,
    context: &mut Context,
    code: &str,
    path: &Path,
) -> Result<JsValue> {
    let scope = ModuleScope::new(state, path, context);
    {
        let mut st = state.borrow_mut();
        st.in_flight
            .insert(path.to_path_buf(), scope.exports.clone());
        st.loading.push(path.to_path_buf());
    }
    let result = run(context, &scope, code, path);
    {
        let mut st = state.borrow_mut();
        st.in_flight.remove(path);
        st.loading.pop();
    }
    result
}

fn run(context: &mut Context, scope: &ModuleScope, code: &str, path: &Path) -> Result<JsValue> {
    trace!(path = %path.display(), bytes = code.len(), "executing module");
    let wrapped = format!(
        "(function (exports, require, module, __filename, __dirname) {{\n{code}\n}});"
    );

    // Compile separately from running: a parse failure is the compiler
    // rejecting the (transformed) source, not the module's own logic.
    let script = Script::parse(
        Source::from_reader(wrapped.as_bytes(), Some(path)),
        None,
        context,
    )
    .map_err(|err| JitteError::transform(path, err.to_string()))?;
    let wrapper = script
        .evaluate(context)
        .map_err(|err| JitteError::evaluation(path, err.to_string()))?;
    let callable = wrapper
        .as_callable()
        .ok_or_else(|| JitteError::evaluation(path, "module wrapper is not callable"))?;

    callable
        .call(
            &JsValue::undefined(),
            &[
                scope.exports.clone().into(),
                scope.require.clone().into(),
                scope.module.clone().into(),
                scope.filename.clone().into(),
                scope.dirname.clone().into(),
            ],
            context,
        )
        .map_err(|err| JitteError::evaluation(path, err.to_string()))?;

    scope
        .module
        .set(js_string!("loaded"), true, false, context)
        .map_err(|err| JitteError::evaluation(path, err.to_string()))?;

    // `module.exports` may have been reassigned wholesale; honor it.
    scope
        .module
        .get(js_string!("exports"), context)
        .map_err(|err| JitteError::evaluation(path, err.to_string()))
}
