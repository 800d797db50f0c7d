// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module cache
//!
//! Keyed by absolute resolved path, never by the identifier that requested
//! it: two identifiers resolving to the same file share one entry. Each
//! loader owns its own cache, so tests can build isolated loaders without
//! cross-test pollution. Entries live for the loader's lifetime; nothing
//! invalidates them when source files change.

use boa_engine::JsValue;
use dashmap::DashMap;
use std::path::{Path, PathBuf};

/// A module after execution (or data parse) completed
#[derive(Debug, Clone)]
pub struct LoadedModule {
    /// The module's exports value
    pub exports: JsValue,
    /// Module id (the resolved path)
    pub id: PathBuf,
    /// The resolved file backing the module
    pub filename: PathBuf,
    /// Whether execution ran to completion
    pub loaded: bool,
}

impl LoadedModule {
    /// Entry for a successfully executed or parsed module.
    pub fn completed(path: &Path, exports: JsValue) -> Self {
        Self {
            exports,
            id: path.to_path_buf(),
            filename: path.to_path_buf(),
            loaded: true,
        }
    }
}

/// Path-keyed cache of loaded modules
#[derive(Debug, Default)]
pub struct ModuleCache {
    entries: DashMap<PathBuf, LoadedModule>,
}

impl ModuleCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Get a cached module by resolved path.
    pub fn get(&self, path: &Path) -> Option<LoadedModule> {
        self.entries.get(path).map(|entry| entry.clone())
    }

    /// Is the path cached?
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Store a module under its resolved path.
    pub fn insert(&self, path: PathBuf, module: LoadedModule) {
        self.entries.insert(path, module);
    }

    /// Remove an entry, returning it.
    pub fn remove(&self, path: &Path) -> Option<LoadedModule> {
        self.entries.remove(path).map(|(_, module)| module)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of cached modules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the cache empty?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let cache = ModuleCache::new();
        let path = PathBuf::from("/mod/a.ts");
        assert!(cache.get(&path).is_none());
        cache.insert(
            path.clone(),
            LoadedModule::completed(&path, JsValue::from(42)),
        );
        let entry = cache.get(&path).unwrap();
        assert!(entry.loaded);
        assert_eq!(entry.filename, path);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove() {
        let cache = ModuleCache::new();
        let path = PathBuf::from("/mod/a.ts");
        cache.insert(
            path.clone(),
            LoadedModule::completed(&path, JsValue::undefined()),
        );
        assert!(cache.remove(&path).is_some());
        assert!(cache.is_empty());
    }
}
