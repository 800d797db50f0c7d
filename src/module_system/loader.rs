// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The loader pipeline and its factory
//!
//! `Jitte` is the public entry point: constructed against a caller file and
//! merged options, it produces a loader bound to that file's directory. Each
//! call runs resolve → cache-check → transform → execute → cache-store, with
//! nested relative requires re-entering the same chain through the require
//! interceptor.
//!
//! When the host engine natively accepts the typed dialect (probed once at
//! construction), the transform stage is skipped entirely and resolved files
//! execute as-is.

use crate::error::{JitteError, Result};
use crate::module_system::cache::{LoadedModule, ModuleCache};
use crate::module_system::resolver::{Resolution, Resolver};
use crate::options::Options;
use crate::runtime::host::{self, HostSupport};
use crate::runtime::sandbox;
use crate::transform;
use boa_engine::{Context, JsObject, JsValue, Source};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, error};

/// Loader state shared between the public handle and the require
/// interceptors of every executing module.
///
/// Borrows are short-lived by construction: nothing holds a borrow across a
/// module execution, which is what makes re-entrant requires safe.
pub(crate) struct LoaderState {
    pub options: Options,
    pub resolver: Resolver,
    pub cache: ModuleCache,
    pub support: HostSupport,
    pub builtins: HashMap<String, JsValue>,
    /// Partial exports of modules currently executing. A cyclic require
    /// that revisits one of these receives the object mid-population.
    pub in_flight: HashMap<PathBuf, JsObject>,
    /// Stack of currently executing paths, for diagnostics.
    pub loading: Vec<PathBuf>,
}

impl LoaderState {
    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }
}

pub(crate) type SharedState = Rc<RefCell<LoaderState>>;

/// A bound loader: the resolve → transform → execute → cache pipeline,
/// closed over a caller file's directory and a merged configuration.
///
/// ```rust,ignore
/// use jitte::Jitte;
///
/// let mut loader = Jitte::new("examples/app.js")?;
/// let exports = loader.require("./server.ts")?;
/// ```
pub struct Jitte {
    state: SharedState,
    context: Context,
    base_dir: PathBuf,
}

impl Jitte {
    /// Create a loader for `caller` with default options.
    pub fn new(caller: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(caller, Options::default())
    }

    /// Create a loader for `caller` with explicit options. Host support for
    /// the typed dialect is probed once, here.
    pub fn with_options(caller: impl AsRef<Path>, options: Options) -> Result<Self> {
        let mut context = host::build_context()?;
        let support = HostSupport::probe(&mut context);
        Self::assemble(caller.as_ref(), options, support, context)
    }

    /// Create a loader with an injected capability flag instead of probing.
    /// Embedders with a typed-dialect engine (and tests) use this.
    pub fn with_host_support(
        caller: impl AsRef<Path>,
        options: Options,
        support: HostSupport,
    ) -> Result<Self> {
        let context = host::build_context()?;
        Self::assemble(caller.as_ref(), options, support, context)
    }

    fn assemble(
        caller: &Path,
        options: Options,
        support: HostSupport,
        context: Context,
    ) -> Result<Self> {
        let base_dir = caller
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        debug!(
            caller = %caller.display(),
            typed_dialect = support.typed_dialect,
            "loader created"
        );
        let resolver = Resolver::new(options.extensions.clone());
        let state = Rc::new(RefCell::new(LoaderState {
            options,
            resolver,
            cache: ModuleCache::new(),
            support,
            builtins: HashMap::new(),
            in_flight: HashMap::new(),
            loading: Vec::new(),
        }));
        Ok(Self {
            state,
            context,
            base_dir,
        })
    }

    /// Load a module by identifier, returning its exports.
    pub fn require(&mut self, specifier: &str) -> Result<JsValue> {
        let state = Rc::clone(&self.state);
        let base_dir = self.base_dir.clone();
        load(&state, specifier, &base_dir, &mut self.context)
    }

    /// Resolve an identifier to its absolute path without loading it.
    pub fn resolve(&self, specifier: &str) -> Result<PathBuf> {
        let st = self.state.borrow();
        let resolution =
            st.resolver
                .resolve(specifier, &self.base_dir, |name| st.is_builtin(name))?;
        resolution
            .path()
            .map(Path::to_path_buf)
            .ok_or_else(|| JitteError::Resolution {
                specifier: specifier.to_string(),
                reason: "builtin modules have no filesystem path".to_string(),
            })
    }

    /// Register a builtin module available to bare `require` calls.
    pub fn register_builtin(&mut self, name: impl Into<String>, value: JsValue) {
        self.state.borrow_mut().builtins.insert(name.into(), value);
    }

    /// Evaluate a snippet in the loader's engine context. Mostly useful for
    /// embedders wiring up builtins and for inspecting module side effects.
    pub fn eval(&mut self, code: &str) -> Result<JsValue> {
        self.context
            .eval(Source::from_bytes(code.as_bytes()))
            .map_err(|err| JitteError::evaluation("<eval>", err.to_string()))
    }

    /// Is a resolved path present in the module cache?
    pub fn is_cached(&self, path: &Path) -> bool {
        self.state.borrow().cache.contains(path)
    }

    /// Number of cached modules.
    pub fn cached_modules(&self) -> usize {
        self.state.borrow().cache.len()
    }

    /// The engine context, for embedders that need direct access.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }
}

// ----------------------------------------------------------------------
// Pipeline
// ----------------------------------------------------------------------

/// Full pipeline entry: resolve with the configured extensions, then
/// dispatch on the resolution category.
pub(crate) fn load(
    state: &SharedState,
    specifier: &str,
    base_dir: &Path,
    context: &mut Context,
) -> Result<JsValue> {
    let resolution = {
        let st = state.borrow();
        st.resolver
            .resolve(specifier, base_dir, |name| st.is_builtin(name))?
    };
    dispatch(state, resolution, context)
}

/// Host-native entry: used by the require interceptor's delegate branch.
/// No transform stage is involved.
pub(crate) fn load_native(
    state: &SharedState,
    specifier: &str,
    base_dir: &Path,
    context: &mut Context,
) -> Result<JsValue> {
    let resolution = {
        let st = state.borrow();
        st.resolver
            .resolve_native(specifier, base_dir, |name| st.is_builtin(name))?
    };
    dispatch(state, resolution, context)
}

fn dispatch(state: &SharedState, resolution: Resolution, context: &mut Context) -> Result<JsValue> {
    match resolution {
        Resolution::Builtin(name) => {
            let value = state.borrow().builtins.get(&name).cloned();
            value.ok_or_else(|| JitteError::Resolution {
                specifier: name,
                reason: "builtin module is not registered".to_string(),
            })
        }
        Resolution::Data(path) => load_data(state, &path, context),
        Resolution::Native(path) => load_file(state, &path, context, false),
        Resolution::Source(path) => {
            // An engine with native typed support needs no transform stage.
            let bypass = state.borrow().support.typed_dialect;
            load_file(state, &path, context, !bypass)
        }
    }
}

/// Structured data short-circuit: parse, convert, cache. No execution.
fn load_data(state: &SharedState, path: &Path, context: &mut Context) -> Result<JsValue> {
    if let Some(hit) = cache_lookup(state, path) {
        debug!(path = %path.display(), "cache hit");
        return Ok(hit);
    }
    let content = std::fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&content)?;
    let exports = JsValue::from_json(&parsed, context)
        .map_err(|err| JitteError::evaluation(path, err.to_string()))?;
    store(state, path, exports.clone());
    Ok(exports)
}

/// Load and execute a file, transforming it first unless `transform` is off
/// (host-native loads and typed-dialect engines).
fn load_file(
    state: &SharedState,
    path: &Path,
    context: &mut Context,
    transform: bool,
) -> Result<JsValue> {
    if let Some(hit) = cache_lookup(state, path) {
        debug!(path = %path.display(), "cache hit");
        return Ok(hit);
    }
    // A cyclic require that revisits a module mid-execution gets the
    // partially populated exports object; the cache is only written after
    // success, so the cycle must break here.
    let partial = state.borrow().in_flight.get(path).cloned();
    if let Some(exports) = partial {
        debug!(
            path = %path.display(),
            chain = ?state.borrow().loading,
            "circular require, returning partial exports"
        );
        return Ok(exports.into());
    }

    let source = std::fs::read_to_string(path)?;
    let debug_failures = state.borrow().options.debug;
    let code = if transform {
        let options = state.borrow().options.clone();
        transform::transform(path, &source, &options).map_err(|err| {
            error!(path = %path.display(), error = %err, "transform failed");
            if debug_failures {
                error!(path = %path.display(), "failing source:\n{source}");
            }
            err
        })?
    } else {
        source
    };

    let exports = sandbox::execute(state, context, &code, path).map_err(|err| {
        error!(path = %path.display(), error = %err, "module execution failed");
        if debug_failures {
            error!(path = %path.display(), error = ?err, "full failure detail");
        }
        err
    })?;
    store(state, path, exports.clone());
    Ok(exports)
}

/// Read-side cache access, gated by the `cache` option.
fn cache_lookup(state: &SharedState, path: &Path) -> Option<JsValue> {
    let st = state.borrow();
    if !st.options.cache {
        return None;
    }
    st.cache.get(path).map(|module| module.exports)
}

/// Write-side cache access, gated by the `require_cache` option.
fn store(state: &SharedState, path: &Path, exports: JsValue) {
    let st = state.borrow();
    if st.options.require_cache {
        st.cache
            .insert(path.to_path_buf(), LoadedModule::completed(path, exports));
    }
}
