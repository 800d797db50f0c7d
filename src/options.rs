// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader configuration
//!
//! Options are merged with defaults at loader construction and are immutable
//! afterwards. Deserializing a partial config produces the same merge: absent
//! fields take their defaults, present fields win.

use serde::Deserialize;

/// Default extension search order consulted by the resolver.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".jsx", ".ts", ".tsx", ".json", ".mjs"];

/// Configuration for a loader instance
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Surface verbose diagnostics on failure
    pub debug: bool,
    /// Consult the module cache before transforming (read side)
    pub cache: bool,
    /// Store loaded modules into the cache (write side, distinct knob)
    pub require_cache: bool,
    /// Extension search order for the resolver
    pub extensions: Vec<String>,
    /// Emit inline source maps from both transform strategies
    pub source_maps: bool,
    /// Overrides merged into the full transform strategy
    pub transform_options: TransformOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            debug: false,
            cache: true,
            require_cache: true,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            source_maps: true,
            transform_options: TransformOptions::default(),
        }
    }
}

impl Options {
    /// Enable or disable debug diagnostics
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Enable or disable cache lookups
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Enable or disable cache stores
    pub fn with_require_cache(mut self, require_cache: bool) -> Self {
        self.require_cache = require_cache;
        self
    }

    /// Replace the extension search order
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable inline source maps
    pub fn with_source_maps(mut self, source_maps: bool) -> Self {
        self.source_maps = source_maps;
        self
    }

    /// Replace the transform overrides
    pub fn with_transform_options(mut self, transform_options: TransformOptions) -> Self {
        self.transform_options = transform_options;
        self
    }
}

/// Overrides passed through to the full transform strategy
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformOptions {
    /// Factory invoked for each markup element (default `React.createElement`)
    pub jsx_factory: Option<String>,
    /// Expression used for markup fragments (default `React.Fragment`)
    pub jsx_fragment: Option<String>,
}
