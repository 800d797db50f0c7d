// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader pipeline integration tests
//!
//! Modules are written into a temp directory and loaded through the full
//! resolve → transform → execute → cache chain.

use boa_engine::{JsString, JsValue};
use jitte::{HostSupport, Jitte, JitteError, Options};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn loader_in(dir: &Path) -> Jitte {
    Jitte::new(dir.join("host.js")).unwrap()
}

fn get(loader: &mut Jitte, exports: &JsValue, key: &str) -> JsValue {
    exports
        .as_object()
        .expect("exports should be an object")
        .get(JsString::from(key), loader.context_mut())
        .unwrap()
}

fn as_str(loader: &mut Jitte, value: &JsValue) -> String {
    value
        .to_string(loader.context_mut())
        .unwrap()
        .to_std_string_escaped()
}

#[test]
fn test_cached_exports_are_reference_identical() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "counter.ts",
        "globalThis.__counter_loads = (globalThis.__counter_loads || 0) + 1;\n\
         export const tag: string = \"counter\";\n",
    );
    let mut loader = loader_in(dir.path());

    let first = loader.require("./counter").unwrap();
    let second = loader.require("./counter").unwrap();
    assert!(first.strict_equals(&second), "cache must return the same exports object");

    // A different identifier for the same path hits the same entry.
    let third = loader.require("./counter.ts").unwrap();
    assert!(first.strict_equals(&third));

    // Transform-and-execute ran exactly once.
    let loads = loader.eval("globalThis.__counter_loads").unwrap();
    assert_eq!(loads.as_number(), Some(1.0));
    assert_eq!(loader.cached_modules(), 1);
}

#[test]
fn test_disabled_cache_reexecutes_every_time() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "counter.ts",
        "globalThis.__fresh_loads = (globalThis.__fresh_loads || 0) + 1;\n\
         export const tag: string = \"fresh\";\n",
    );
    let options = Options::default().with_cache(false).with_require_cache(false);
    let mut loader = Jitte::with_options(dir.path().join("host.js"), options).unwrap();

    let first = loader.require("./counter").unwrap();
    let second = loader.require("./counter").unwrap();
    assert!(!first.strict_equals(&second), "fresh exports object per load");
    let loads = loader.eval("globalThis.__fresh_loads").unwrap();
    assert_eq!(loads.as_number(), Some(2.0));
    assert_eq!(loader.cached_modules(), 0);
}

#[test]
fn test_store_knob_is_distinct_from_read_knob() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "counter.ts",
        "globalThis.__store_loads = (globalThis.__store_loads || 0) + 1;\nexport const x: number = 1;\n",
    );
    // Reads allowed, stores disabled: nothing ever lands in the cache.
    let options = Options::default().with_require_cache(false);
    let mut loader = Jitte::with_options(dir.path().join("host.js"), options).unwrap();
    loader.require("./counter").unwrap();
    loader.require("./counter").unwrap();
    let loads = loader.eval("globalThis.__store_loads").unwrap();
    assert_eq!(loads.as_number(), Some(2.0));
    assert_eq!(loader.cached_modules(), 0);
}

#[test]
fn test_json_is_parsed_not_executed() {
    let dir = TempDir::new().unwrap();
    // Valid JSON, invalid JavaScript: proves no execution happens.
    write(
        dir.path(),
        "config.json",
        "{\"app name\": \"demo\", \"port\": 8080, \"tags\": [\"a\", \"b\"]}",
    );
    let mut loader = loader_in(dir.path());
    let exports = loader.require("./config.json").unwrap();
    let port = get(&mut loader, &exports, "port");
    assert_eq!(port.as_number(), Some(8080.0));
    let name = get(&mut loader, &exports, "app name");
    assert_eq!(as_str(&mut loader, &name), "demo");
}

#[test]
fn test_directory_index_respects_extension_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "widgets/index.js", "module.exports = \"from-js\";\n");
    write(dir.path(), "widgets/index.ts", "export const from = \"ts\";\n");
    let mut loader = loader_in(dir.path());
    // Default order puts `.js` first.
    let resolved = loader.resolve("./widgets").unwrap();
    assert!(resolved.ends_with("index.js"));
    let exports = loader.require("./widgets").unwrap();
    assert_eq!(as_str(&mut loader, &exports), "from-js");
}

#[test]
fn test_markup_module_renders_on_each_invocation() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "view.tsx",
        "import React from \"react\";\n\n\
         export default function render(): object {\n\
           globalThis.__renders = (globalThis.__renders || 0) + 1;\n\
           return (\n\
             <div className=\"panel\">\n\
               <h1>jitte</h1>\n\
             </div>\n\
           );\n\
         }\n",
    );
    let mut loader = loader_in(dir.path());
    let react = loader
        .eval(
            "({ createElement: function (tag, props) {\n\
               globalThis.__elements = (globalThis.__elements || 0) + 1;\n\
               return { tag: tag, props: props };\n\
             }, Fragment: \"fragment\" })",
        )
        .unwrap();
    loader.register_builtin("react", react);

    let exports = loader.require("./view.tsx").unwrap();
    let render = get(&mut loader, &exports, "default");
    let callable = render.as_callable().expect("default export is a function");

    let element = callable
        .call(&JsValue::undefined(), &[], loader.context_mut())
        .unwrap();
    let renders = loader.eval("globalThis.__renders").unwrap();
    assert_eq!(renders.as_number(), Some(1.0));

    callable
        .call(&JsValue::undefined(), &[], loader.context_mut())
        .unwrap();
    let renders = loader.eval("globalThis.__renders").unwrap();
    assert_eq!(renders.as_number(), Some(2.0));

    let tag = get(&mut loader, &element, "tag");
    assert_eq!(as_str(&mut loader, &tag), "div");
}

#[test]
fn test_not_found_names_the_original_identifier() {
    let dir = TempDir::new().unwrap();
    let mut loader = loader_in(dir.path());
    let err = loader.require("./missing").unwrap_err();
    assert!(matches!(err, JitteError::ModuleNotFound(ref id) if id == "./missing"));
    assert_eq!(err.to_string(), "Cannot find module './missing'");
}

#[test]
fn test_throwing_module_is_not_cached_and_retries() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "boom.ts",
        "globalThis.__boom_runs = (globalThis.__boom_runs || 0) + 1;\n\
         export const armed: boolean = true;\n\
         throw new Error(\"boom\");\n",
    );
    let mut loader = loader_in(dir.path());

    let err = loader.require("./boom").unwrap_err();
    assert!(matches!(err, JitteError::Evaluation { .. }));
    assert!(err.to_string().contains("boom"));

    let resolved = loader.resolve("./boom").unwrap();
    assert!(!loader.is_cached(&resolved), "failed module must not be cached");

    // A later load retries execution from scratch.
    let err = loader.require("./boom").unwrap_err();
    assert!(err.to_string().contains("boom"));
    let runs = loader.eval("globalThis.__boom_runs").unwrap();
    assert_eq!(runs.as_number(), Some(2.0));
}

#[test]
fn test_nested_requires_route_by_extension() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "math.ts",
        "export function double(n: number): number {\n  return n * 2;\n}\n",
    );
    write(dir.path(), "legacy.js", "exports.source = \"legacy\";\n");
    write(dir.path(), "data.json", "{\"magic\": 7}\n");
    write(
        dir.path(),
        "main.ts",
        "import { double } from \"./math\";\n\
         const legacy = require(\"./legacy.js\");\n\
         const config = require(\"./data.json\");\n\
         export const result: number = double(21);\n\
         export const origin: string = legacy.source;\n\
         export const magic: number = config.magic;\n",
    );
    let mut loader = loader_in(dir.path());
    let exports = loader.require("./main").unwrap();

    let result = get(&mut loader, &exports, "result");
    assert_eq!(result.as_number(), Some(42.0));
    let origin = get(&mut loader, &exports, "origin");
    assert_eq!(as_str(&mut loader, &origin), "legacy");
    let magic = get(&mut loader, &exports, "magic");
    assert_eq!(magic.as_number(), Some(7.0));

    // All three nested files share the loader's cache.
    assert!(loader.is_cached(&loader.resolve("./math").unwrap()));
    assert!(loader.is_cached(&loader.resolve("./legacy.js").unwrap()));
    assert!(loader.is_cached(&loader.resolve("./data.json").unwrap()));
}

#[test]
fn test_cycle_observes_partial_exports() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "a.ts",
        "export const early: string = \"early\";\n\
         const b = require(\"./b\");\n\
         export const late: string = \"late\";\n\
         export const partnerSawLate: boolean = b.lateVisible;\n",
    );
    write(
        dir.path(),
        "b.ts",
        "const a = require(\"./a\");\n\
         export const earlyVisible: boolean = a.early === \"early\";\n\
         export const lateVisible: boolean = a.late !== undefined;\n",
    );
    let mut loader = loader_in(dir.path());
    let a = loader.require("./a").unwrap();

    // Bindings assigned before the cycle re-entered were visible...
    let b = loader.require("./b").unwrap();
    let early_visible = get(&mut loader, &b, "earlyVisible");
    assert_eq!(early_visible.as_boolean(), Some(true));
    // ...bindings assigned after it were not.
    let late_visible = get(&mut loader, &b, "lateVisible");
    assert_eq!(late_visible.as_boolean(), Some(false));
    let partner_saw_late = get(&mut loader, &a, "partnerSawLate");
    assert_eq!(partner_saw_late.as_boolean(), Some(false));
    // The cycle completed and `a` finished populating.
    let late = get(&mut loader, &a, "late");
    assert_eq!(as_str(&mut loader, &late), "late");
}

#[test]
fn test_typed_dialect_host_skips_the_transform() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "typed.ts",
        "const x: number = 1;\nmodule.exports = x;\n",
    );

    // Normal loader: the transform strips the annotation and the file runs.
    let mut loader = loader_in(dir.path());
    let value = loader.require("./typed").unwrap();
    assert_eq!(value.as_number(), Some(1.0));

    // Capability flag claims native typed support, so the file executes
    // as-is — and this engine rejects it, proving no transform ran.
    let mut bypass = Jitte::with_host_support(
        dir.path().join("host.js"),
        Options::default(),
        HostSupport::native_typed(),
    )
    .unwrap();
    let err = bypass.require("./typed").unwrap_err();
    assert!(matches!(err, JitteError::Transform { .. }));
}

#[test]
fn test_builtin_registration_and_bare_specifiers() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "uses_builtin.ts",
        "const host = require(\"host-info\");\nexport const name: string = host.name;\n",
    );
    let mut loader = loader_in(dir.path());
    let info = loader.eval("({ name: \"jitte-host\" })").unwrap();
    loader.register_builtin("host-info", info);

    let exports = loader.require("./uses_builtin").unwrap();
    let name = get(&mut loader, &exports, "name");
    assert_eq!(as_str(&mut loader, &name), "jitte-host");

    // Builtins resolve but have no filesystem path.
    assert!(matches!(
        loader.resolve("host-info"),
        Err(JitteError::Resolution { .. })
    ));
}

#[test]
fn test_markup_in_plain_typed_extension_fails() {
    let dir = TempDir::new().unwrap();
    // Markup inside a `.ts` file: the extension says no markup, so the
    // typed-syntax pass rejects it.
    write(
        dir.path(),
        "sneaky.ts",
        "export const view = <div>it's markup</div>;\n",
    );
    let mut loader = loader_in(dir.path());
    let err = loader.require("./sneaky").unwrap_err();
    assert!(matches!(err, JitteError::Transform { .. }));
}

#[test]
fn test_module_scope_bindings_are_injected() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "scope.ts",
        "export const file: string = __filename;\n\
         export const dir: string = __dirname;\n\
         export const moduleId: string = module.id;\n",
    );
    let mut loader = loader_in(dir.path());
    let exports = loader.require("./scope").unwrap();
    let file = get(&mut loader, &exports, "file");
    assert!(as_str(&mut loader, &file).ends_with("scope.ts"));
    let module_id = get(&mut loader, &exports, "moduleId");
    assert!(as_str(&mut loader, &module_id).ends_with("scope.ts"));
    let dir_value = get(&mut loader, &exports, "dir");
    assert!(!as_str(&mut loader, &dir_value).ends_with("scope.ts"));
}
