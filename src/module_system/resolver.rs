// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module path resolution
//!
//! Maps an identifier plus a base directory to a categorized filesystem
//! result. Bare specifiers resolve through registered builtins and a
//! node_modules walk; relative and absolute identifiers go through the
//! candidate search: each configured extension in order, the candidate
//! as-is, then `index` files inside a directory.
//!
//! Resolution runs on every call. Nothing is cached here: the module cache
//! is keyed by resolved path, not by the identifier that produced it.

use crate::error::{JitteError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Extensions the host can load without the transform pipeline.
pub const NATIVE_EXTENSIONS: &[&str] = &[".js", ".json"];

/// Result of module resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Registered builtin module
    Builtin(String),
    /// Host-loadable file: executed without any transform
    Native(PathBuf),
    /// Structured data file (JSON): parsed, never executed
    Data(PathBuf),
    /// Source file routed through the transform pipeline
    Source(PathBuf),
}

impl Resolution {
    /// The resolved path, if this resolution names a file.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Resolution::Builtin(_) => None,
            Resolution::Native(p) | Resolution::Data(p) | Resolution::Source(p) => Some(p),
        }
    }
}

/// Module resolver bound to a loader's extension order
#[derive(Debug, Clone)]
pub struct Resolver {
    /// Extension search order, each entry including its leading dot
    extensions: Vec<String>,
}

impl Resolver {
    /// Create a resolver with the given extension search order.
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    /// Resolve a specifier against `base_dir`.
    ///
    /// `is_builtin` consults the loader's builtin registry; it is part of
    /// native resolution and wins over everything else for bare names.
    pub fn resolve(
        &self,
        specifier: &str,
        base_dir: &Path,
        is_builtin: impl Fn(&str) -> bool,
    ) -> Result<Resolution> {
        if is_builtin(specifier) {
            return Ok(Resolution::Builtin(specifier.to_string()));
        }
        if is_path_specifier(specifier) {
            return self.resolve_candidate(specifier, base_dir, &self.extensions);
        }
        self.resolve_node_modules(specifier, base_dir)
    }

    /// Native resolution only: builtins, node_modules, and relative paths
    /// with host-loadable extensions. Used by the require interceptor's
    /// delegate branch.
    pub fn resolve_native(
        &self,
        specifier: &str,
        base_dir: &Path,
        is_builtin: impl Fn(&str) -> bool,
    ) -> Result<Resolution> {
        if is_builtin(specifier) {
            return Ok(Resolution::Builtin(specifier.to_string()));
        }
        if is_path_specifier(specifier) {
            let native: Vec<String> = NATIVE_EXTENSIONS.iter().map(|e| e.to_string()).collect();
            return self.resolve_candidate(specifier, base_dir, &native);
        }
        self.resolve_node_modules(specifier, base_dir)
    }

    /// Candidate search for relative and absolute specifiers.
    fn resolve_candidate(
        &self,
        specifier: &str,
        base_dir: &Path,
        extensions: &[String],
    ) -> Result<Resolution> {
        let candidate = if Path::new(specifier).is_absolute() {
            PathBuf::from(specifier)
        } else {
            base_dir.join(specifier)
        };

        // Each configured extension, in order.
        for ext in extensions {
            let with_ext = append_extension(&candidate, ext);
            if with_ext.is_file() {
                trace!(path = %with_ext.display(), "resolved by extension");
                return Ok(categorize(with_ext));
            }
        }

        // The candidate as-is.
        if candidate.is_file() {
            return Ok(categorize(candidate));
        }

        // A directory: index files, same extension order.
        if candidate.is_dir() {
            for ext in extensions {
                let index = candidate.join(format!("index{ext}"));
                if index.is_file() {
                    trace!(path = %index.display(), "resolved directory index");
                    return Ok(categorize(index));
                }
            }
        }

        Err(JitteError::module_not_found(specifier))
    }

    /// Walk up the directory tree looking for node_modules packages.
    fn resolve_node_modules(&self, specifier: &str, base_dir: &Path) -> Result<Resolution> {
        let (package_name, subpath) = parse_package_specifier(specifier);

        let mut current = Some(base_dir);
        while let Some(dir) = current {
            let package_dir = dir.join("node_modules").join(package_name);
            if package_dir.exists() {
                if let Some(sub) = subpath {
                    let full = package_dir.join(sub);
                    if full.is_file() {
                        return Ok(categorize(full));
                    }
                    for ext in NATIVE_EXTENSIONS {
                        let with_ext = append_extension(&full, ext);
                        if with_ext.is_file() {
                            return Ok(categorize(with_ext));
                        }
                    }
                    if full.is_dir() {
                        if let Some(resolution) = resolve_package_dir(&full) {
                            return Ok(resolution);
                        }
                    }
                } else if let Some(resolution) = resolve_package_dir(&package_dir) {
                    return Ok(resolution);
                }
            }
            current = dir.parent();
        }

        Err(JitteError::module_not_found(specifier))
    }
}

/// Relative or absolute path specifiers skip node_modules resolution.
fn is_path_specifier(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || Path::new(specifier).is_absolute()
        || (cfg!(windows) && specifier.chars().nth(1) == Some(':'))
}

/// Append an extension to the full file name (`./mod` + `.d.ts`-style
/// suffixes compose, unlike `Path::with_extension`).
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(ext);
    PathBuf::from(name)
}

/// Categorize a resolved file by extension.
fn categorize(path: PathBuf) -> Resolution {
    let path = path.canonicalize().unwrap_or(path);
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Resolution::Data(path),
        Some("js") | Some("cjs") => Resolution::Native(path),
        _ => Resolution::Source(path),
    }
}

/// Resolve a package directory: package.json `main`, then index files.
fn resolve_package_dir(dir: &Path) -> Option<Resolution> {
    let manifest = dir.join("package.json");
    if manifest.is_file() {
        if let Ok(content) = std::fs::read_to_string(&manifest) {
            if let Ok(pkg) = serde_json::from_str::<PackageJson>(&content) {
                if let Some(main) = pkg.main {
                    let main_path = dir.join(&main);
                    if main_path.is_file() {
                        return Some(categorize(main_path));
                    }
                    for ext in NATIVE_EXTENSIONS {
                        let with_ext = append_extension(&main_path, ext);
                        if with_ext.is_file() {
                            return Some(categorize(with_ext));
                        }
                    }
                }
            }
        }
    }
    for ext in NATIVE_EXTENSIONS {
        let index = dir.join(format!("index{ext}"));
        if index.is_file() {
            return Some(categorize(index));
        }
    }
    None
}

/// Split a package specifier into name and optional subpath, scoped
/// packages included.
fn parse_package_specifier(specifier: &str) -> (&str, Option<&str>) {
    if let Some(rest) = specifier.strip_prefix('@') {
        if let Some(slash) = rest.find('/') {
            let after_scope = &rest[slash + 1..];
            if let Some(subpath_pos) = after_scope.find('/') {
                let name_end = 1 + slash + 1 + subpath_pos;
                return (&specifier[..name_end], Some(&specifier[name_end + 1..]));
            }
        }
        (specifier, None)
    } else if let Some(slash) = specifier.find('/') {
        (&specifier[..slash], Some(&specifier[slash + 1..]))
    } else {
        (specifier, None)
    }
}

/// Minimal package.json shape consulted during resolution
#[derive(Debug, Deserialize)]
struct PackageJson {
    main: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DEFAULT_EXTENSIONS;
    use std::fs;

    fn resolver() -> Resolver {
        Resolver::new(DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect())
    }

    fn no_builtins(_: &str) -> bool {
        false
    }

    #[test]
    fn test_parse_package_specifier() {
        assert_eq!(parse_package_specifier("lodash"), ("lodash", None));
        assert_eq!(parse_package_specifier("lodash/get"), ("lodash", Some("get")));
        assert_eq!(parse_package_specifier("@types/node"), ("@types/node", None));
        assert_eq!(
            parse_package_specifier("@babel/core/lib/index"),
            ("@babel/core", Some("lib/index"))
        );
    }

    #[test]
    fn test_extension_order_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mod.js"), "module.exports = 1;").unwrap();
        fs::write(dir.path().join("mod.ts"), "export const x = 1;").unwrap();
        let resolution = resolver().resolve("./mod", dir.path(), no_builtins).unwrap();
        // `.js` precedes `.ts` in the default order.
        match resolution {
            Resolution::Native(path) => assert!(path.ends_with("mod.js")),
            other => panic!("unexpected resolution {other:?}"),
        }
    }

    #[test]
    fn test_exact_path_and_categorization() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("data.json"), "{}").unwrap();
        fs::write(dir.path().join("view.tsx"), "export {};").unwrap();
        let data = resolver().resolve("./data.json", dir.path(), no_builtins).unwrap();
        assert!(matches!(data, Resolution::Data(_)));
        let source = resolver().resolve("./view.tsx", dir.path(), no_builtins).unwrap();
        assert!(matches!(source, Resolution::Source(_)));
    }

    #[test]
    fn test_directory_index_in_configured_order() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("widgets");
        fs::create_dir(&pkg).unwrap();
        fs::write(pkg.join("index.ts"), "export const from = 'ts';").unwrap();
        fs::write(pkg.join("index.js"), "module.exports = 'js';").unwrap();
        let resolution = resolver().resolve("./widgets", dir.path(), no_builtins).unwrap();
        match resolution {
            Resolution::Native(path) => assert!(path.ends_with("index.js")),
            other => panic!("unexpected resolution {other:?}"),
        }
    }

    #[test]
    fn test_index_respects_custom_extension_order() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("widgets");
        fs::create_dir(&pkg).unwrap();
        fs::write(pkg.join("index.ts"), "export const x = 1;").unwrap();
        fs::write(pkg.join("index.js"), "module.exports = 1;").unwrap();
        let resolver = Resolver::new(vec![".ts".to_string(), ".js".to_string()]);
        let resolution = resolver.resolve("./widgets", dir.path(), no_builtins).unwrap();
        match resolution {
            Resolution::Source(path) => assert!(path.ends_with("index.ts")),
            other => panic!("unexpected resolution {other:?}"),
        }
    }

    #[test]
    fn test_not_found_names_the_original_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolver()
            .resolve("./missing", dir.path(), no_builtins)
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot find module './missing'");
    }

    #[test]
    fn test_builtin_wins() {
        let dir = tempfile::tempdir().unwrap();
        let resolution = resolver()
            .resolve("events", dir.path(), |name| name == "events")
            .unwrap();
        assert_eq!(resolution, Resolution::Builtin("events".to_string()));
    }

    #[test]
    fn test_node_modules_walk() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules").join("leftpad");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), r#"{ "main": "lib.js" }"#).unwrap();
        fs::write(pkg.join("lib.js"), "module.exports = 'pad';").unwrap();
        let nested = dir.path().join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();
        let resolution = resolver().resolve("leftpad", &nested, no_builtins).unwrap();
        match resolution {
            Resolution::Native(path) => assert!(path.ends_with("lib.js")),
            other => panic!("unexpected resolution {other:?}"),
        }
    }

    #[test]
    fn test_native_resolution_skips_typed_sources() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mod.ts"), "export const x = 1;").unwrap();
        let err = resolver()
            .resolve_native("./mod", dir.path(), no_builtins)
            .unwrap_err();
        assert!(matches!(err, JitteError::ModuleNotFound(_)));
    }
}
