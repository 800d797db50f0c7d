// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! ES-module to CommonJS lowering
//!
//! The sandbox executes every module inside the CommonJS function wrapper, so
//! `import`/`export` syntax is rewritten to `require()` calls and `exports`
//! assignments. Default imports go through an esbuild-style interop helper:
//! a module with `__esModule` set contributes its `default` binding, anything
//! else contributes itself.
//!
//! Rewrites are line-preserving: replacements are single-line and the edit
//! list re-appends the newlines a statement spanned.

use super::lexer::{self, Token, TokenKind};
use super::{EditList, PassError};

/// Marker plus interop helper, injected ahead of the first source line when
/// the module uses export or import syntax.
const ESMODULE_MARKER: &str = "exports.__esModule = true; ";
const INTEROP_HELPER: &str =
    "var __jitte_interop = function (m) { return m && m.__esModule ? m[\"default\"] : m; }; ";

/// Lower `import`/`export` statements in `source` to CommonJS.
pub fn lower_modules(source: &str) -> Result<String, PassError> {
    let toks = lexer::lex(source).map_err(PassError::from)?;
    let mut pass = Lowering {
        src: source,
        toks,
        edits: EditList::new(),
        imports: 0,
        uses_interop: false,
        has_exports: false,
    };
    pass.run()?;

    let mut prelude = String::new();
    if pass.has_exports {
        prelude.push_str(ESMODULE_MARKER);
    }
    if pass.uses_interop {
        prelude.push_str(INTEROP_HELPER);
    }
    if !prelude.is_empty() {
        pass.edits.insert(0, prelude);
    }
    Ok(pass.edits.apply(source))
}

struct Lowering<'s> {
    src: &'s str,
    toks: Vec<Token>,
    edits: EditList,
    /// Counter for `__jitte_import_N` temporaries.
    imports: usize,
    uses_interop: bool,
    has_exports: bool,
}

/// One entry of an import/export brace clause: `(imported, local)`.
type ClauseEntry = (String, String);

impl<'s> Lowering<'s> {
    fn run(&mut self) -> Result<(), PassError> {
        let mut i = 0;
        while i < self.toks.len() {
            if self.kind(i) == TokenKind::Ident && self.at_statement_position(i) {
                match self.text(i) {
                    "import" => {
                        if let Some(end) = self.lower_import(i)? {
                            i = end;
                            continue;
                        }
                    }
                    "export" => {
                        if let Some(end) = self.lower_export(i)? {
                            i = end;
                            continue;
                        }
                    }
                    _ => {}
                }
            }
            i += 1;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn text(&self, i: usize) -> &'s str {
        let span = self.toks[i].span;
        &self.src[span.start..span.end]
    }

    fn kind(&self, i: usize) -> TokenKind {
        self.toks[i].kind
    }

    fn is_punct(&self, i: usize, c: char) -> bool {
        i < self.toks.len() && self.kind(i) == TokenKind::Punct(c)
    }

    fn is_ident(&self, i: usize, word: &str) -> bool {
        i < self.toks.len() && self.kind(i) == TokenKind::Ident && self.text(i) == word
    }

    fn next_significant(&self, i: usize) -> Option<usize> {
        (i..self.toks.len())
            .find(|&j| !matches!(self.kind(j), TokenKind::LineComment | TokenKind::BlockComment))
    }

    fn prev_significant(&self, i: usize) -> Option<usize> {
        (0..i)
            .rev()
            .find(|&j| !matches!(self.kind(j), TokenKind::LineComment | TokenKind::BlockComment))
    }

    /// Module syntax only appears at the top of a statement: after an
    /// explicit terminator, or across a line break (semicolon-less sources).
    fn at_statement_position(&self, i: usize) -> bool {
        match self.prev_significant(i) {
            None => true,
            Some(j) => {
                matches!(self.kind(j), TokenKind::Punct(';' | '}' | '{'))
                    || self.src[self.toks[j].span.end..self.toks[i].span.start].contains('\n')
            }
        }
    }

    fn replace_tokens(&mut self, from: usize, to: usize, replacement: String) {
        self.edits.replace_range(
            self.toks[from].span.start,
            self.toks[to - 1].span.end,
            replacement,
        );
    }

    fn fresh_import(&mut self) -> String {
        let name = format!("__jitte_import_{}", self.imports);
        self.imports += 1;
        name
    }

    // ------------------------------------------------------------------
    // import
    // ------------------------------------------------------------------

    /// Lower one import statement; returns the index past it.
    fn lower_import(&mut self, i: usize) -> Result<Option<usize>, PassError> {
        let j = match self.next_significant(i + 1) {
            Some(j) => j,
            None => return Ok(None),
        };
        // `import(...)` and `import.meta` are expressions, not statements.
        if self.is_punct(j, '(') || self.is_punct(j, '.') {
            return Ok(None);
        }

        // Side-effect import: `import "module";`
        if self.kind(j) == TokenKind::String {
            let end = self.statement_end_after(j);
            let module = self.text(j).to_string();
            self.replace_tokens(i, end, format!("require({module});"));
            return Ok(Some(end));
        }

        let mut default_binding: Option<String> = None;
        let mut namespace_binding: Option<String> = None;
        let mut named: Vec<ClauseEntry> = Vec::new();

        let mut k = j;
        loop {
            if self.kind(k) == TokenKind::Ident && self.text(k) != "from" {
                default_binding = Some(self.text(k).to_string());
                k = match self.next_significant(k + 1) {
                    Some(n) => n,
                    None => return Ok(None),
                };
                if self.is_punct(k, ',') {
                    k = match self.next_significant(k + 1) {
                        Some(n) => n,
                        None => return Ok(None),
                    };
                    continue;
                }
            } else if self.is_punct(k, '*') {
                let as_kw = self.next_significant(k + 1);
                let name = as_kw.and_then(|a| self.next_significant(a + 1));
                let (Some(a), Some(n)) = (as_kw, name) else {
                    return Ok(None);
                };
                if !self.is_ident(a, "as") {
                    return Ok(None);
                }
                namespace_binding = Some(self.text(n).to_string());
                k = match self.next_significant(n + 1) {
                    Some(n) => n,
                    None => return Ok(None),
                };
            } else if self.is_punct(k, '{') {
                let (entries, after) = self.parse_clause_entries(k)?;
                named = entries;
                k = match self.next_significant(after) {
                    Some(n) => n,
                    None => return Ok(None),
                };
            }
            break;
        }

        if !self.is_ident(k, "from") {
            return Ok(None);
        }
        let module_idx = match self.next_significant(k + 1) {
            Some(m) if self.kind(m) == TokenKind::String => m,
            _ => return Ok(None),
        };
        let module = self.text(module_idx).to_string();
        let end = self.statement_end_after(module_idx);

        // Build the replacement.
        let mut parts: Vec<String> = Vec::new();
        let needs_temp = default_binding.is_some() && (namespace_binding.is_some() || !named.is_empty());
        let source_expr = if needs_temp {
            let tmp = self.fresh_import();
            parts.push(format!("const {tmp} = require({module});"));
            tmp
        } else {
            format!("require({module})")
        };
        if let Some(default) = &default_binding {
            self.uses_interop = true;
            parts.push(format!("const {default} = __jitte_interop({source_expr});"));
        }
        if let Some(ns) = &namespace_binding {
            parts.push(format!("const {ns} = {source_expr};"));
        }
        if !named.is_empty() {
            let bindings: Vec<String> = named
                .iter()
                .map(|(imported, local)| {
                    if imported == local {
                        local.clone()
                    } else {
                        format!("{imported}: {local}")
                    }
                })
                .collect();
            parts.push(format!(
                "const {{ {} }} = {source_expr};",
                bindings.join(", ")
            ));
        }
        if parts.is_empty() {
            // `import from "m"` is malformed; leave it for the engine.
            return Ok(None);
        }
        self.replace_tokens(i, end, parts.join(" "));
        Ok(Some(end))
    }

    /// Parse `{ a, b as c }`, returning entries and the index past `}`.
    fn parse_clause_entries(&self, open: usize) -> Result<(Vec<ClauseEntry>, usize), PassError> {
        let mut entries = Vec::new();
        let mut k = open + 1;
        loop {
            let Some(j) = self.next_significant(k) else {
                return Err(PassError {
                    message: "unterminated import/export clause".to_string(),
                });
            };
            if self.is_punct(j, '}') {
                return Ok((entries, j + 1));
            }
            if self.is_punct(j, ',') {
                k = j + 1;
                continue;
            }
            if self.kind(j) != TokenKind::Ident && self.kind(j) != TokenKind::String {
                return Err(PassError {
                    message: format!("unexpected token '{}' in module clause", self.text(j)),
                });
            }
            let imported = self.text(j).to_string();
            let mut local = imported.clone();
            let mut next = j + 1;
            if let Some(a) = self.next_significant(next) {
                if self.is_ident(a, "as") {
                    if let Some(n) = self.next_significant(a + 1) {
                        local = self.text(n).to_string();
                        next = n + 1;
                    }
                }
            }
            entries.push((imported, local));
            k = next;
        }
    }

    /// Index past an optional trailing `;` after token `i`.
    fn statement_end_after(&self, i: usize) -> usize {
        match self.next_significant(i + 1) {
            Some(j) if self.is_punct(j, ';') => j + 1,
            _ => i + 1,
        }
    }

    // ------------------------------------------------------------------
    // export
    // ------------------------------------------------------------------

    /// Lower one export statement; returns the index past the rewritten part.
    fn lower_export(&mut self, i: usize) -> Result<Option<usize>, PassError> {
        let Some(j) = self.next_significant(i + 1) else {
            return Ok(None);
        };

        if self.is_ident(j, "default") {
            self.has_exports = true;
            return self.lower_export_default(i, j);
        }
        if self.kind(j) == TokenKind::Ident
            && matches!(self.text(j), "const" | "let" | "var")
        {
            self.has_exports = true;
            return self.lower_export_declaration(i, j);
        }
        if self.is_ident(j, "function")
            || self.is_ident(j, "class")
            || (self.is_ident(j, "async")
                && self
                    .next_significant(j + 1)
                    .is_some_and(|k| self.is_ident(k, "function")))
        {
            self.has_exports = true;
            return self.lower_export_hoisted(i, j);
        }
        if self.is_punct(j, '{') {
            self.has_exports = true;
            return self.lower_export_clause(i, j);
        }
        if self.is_punct(j, '*') {
            self.has_exports = true;
            return self.lower_export_star(i, j);
        }
        Ok(None)
    }

    fn lower_export_default(&mut self, i: usize, default_kw: usize) -> Result<Option<usize>, PassError> {
        let Some(j) = self.next_significant(default_kw + 1) else {
            return Ok(None);
        };
        let decl_kw = if self.is_ident(j, "async") {
            self.next_significant(j + 1).filter(|&k| self.is_ident(k, "function"))
        } else if self.is_ident(j, "function") || self.is_ident(j, "class") {
            Some(j)
        } else {
            None
        };

        if let Some(kw) = decl_kw {
            let name = self
                .next_significant(kw + 1)
                .filter(|&n| self.kind(n) == TokenKind::Ident)
                .map(|n| self.text(n).to_string());
            let Some(body_close) = self.declaration_body_end(kw) else {
                return Ok(None);
            };
            let insert_at = self.toks[body_close - 1].span.end;
            match name {
                Some(name) => {
                    // Keep the declaration for hoisting, assign afterwards.
                    self.replace_tokens(i, default_kw + 1, String::new());
                    self.edits
                        .insert(insert_at, format!(" exports.default = {name};"));
                }
                None => {
                    self.replace_tokens(i, default_kw + 1, "exports.default =".to_string());
                    self.edits.insert(insert_at, ";".to_string());
                }
            }
            return Ok(Some(body_close));
        }

        // Expression form: the statement's own terminator survives.
        self.replace_tokens(i, default_kw + 1, "exports.default =".to_string());
        Ok(Some(default_kw + 1))
    }

    fn lower_export_declaration(&mut self, i: usize, decl_kw: usize) -> Result<Option<usize>, PassError> {
        // Drop the `export`, then walk declarators for their binding names.
        let mut names: Vec<String> = Vec::new();
        let mut depth = 0i32;
        let mut end = None;
        let mut expecting_binding = true;
        let Some(mut scan) = self.next_significant(decl_kw + 1) else {
            return Ok(None);
        };
        while scan < self.toks.len() {
            match self.kind(scan) {
                TokenKind::Punct('(' | '[' | '{') if !expecting_binding => depth += 1,
                TokenKind::Punct(')' | ']' | '}') => depth -= 1,
                TokenKind::Punct('{' | '[') if expecting_binding => {
                    // Destructuring pattern: harvest its binding names.
                    let Some(close) = self.balanced_end(scan) else {
                        return Ok(None);
                    };
                    self.pattern_names(scan + 1, close - 1, &mut names);
                    scan = close;
                    expecting_binding = false;
                    continue;
                }
                TokenKind::Ident if expecting_binding => {
                    names.push(self.text(scan).to_string());
                    expecting_binding = false;
                }
                TokenKind::Punct(',') if depth == 0 => expecting_binding = true,
                TokenKind::Punct(';') if depth == 0 => {
                    end = Some(scan);
                    break;
                }
                _ => {}
            }
            scan += 1;
        }
        let Some(semi) = end else {
            return Ok(None);
        };
        if names.is_empty() {
            return Ok(None);
        }
        self.replace_tokens(i, i + 1, String::new());
        let mut assignments = String::new();
        for name in &names {
            assignments.push_str(&format!(" exports.{name} = {name};"));
        }
        self.edits.insert(self.toks[semi].span.end, assignments);
        Ok(Some(semi + 1))
    }

    fn lower_export_hoisted(&mut self, i: usize, decl_kw: usize) -> Result<Option<usize>, PassError> {
        let fn_kw = if self.is_ident(decl_kw, "async") {
            match self.next_significant(decl_kw + 1) {
                Some(k) => k,
                None => return Ok(None),
            }
        } else {
            decl_kw
        };
        let Some(name_idx) = self
            .next_significant(fn_kw + 1)
            .filter(|&n| self.kind(n) == TokenKind::Ident)
        else {
            return Ok(None);
        };
        let name = self.text(name_idx).to_string();
        let Some(body_close) = self.declaration_body_end(fn_kw) else {
            return Ok(None);
        };
        self.replace_tokens(i, i + 1, String::new());
        self.edits.insert(
            self.toks[body_close - 1].span.end,
            format!(" exports.{name} = {name};"),
        );
        Ok(Some(body_close))
    }

    fn lower_export_clause(&mut self, i: usize, open: usize) -> Result<Option<usize>, PassError> {
        let (entries, after) = self.parse_clause_entries(open)?;
        let mut k = after;
        let mut from_module: Option<String> = None;
        if let Some(f) = self.next_significant(after) {
            if self.is_ident(f, "from") {
                if let Some(m) = self.next_significant(f + 1) {
                    if self.kind(m) == TokenKind::String {
                        from_module = Some(self.text(m).to_string());
                        k = m + 1;
                    }
                }
            }
        }
        let end = match self.next_significant(k) {
            Some(j) if self.is_punct(j, ';') => j + 1,
            _ => k,
        };

        let replacement = match from_module {
            Some(module) => {
                let tmp = self.fresh_import();
                let mut text = format!("const {tmp} = require({module});");
                for (orig, exported) in &entries {
                    text.push_str(&format!(" exports.{exported} = {tmp}.{orig};"));
                }
                text
            }
            None => {
                let mut text = String::new();
                for (local, exported) in &entries {
                    text.push_str(&format!("exports.{exported} = {local}; "));
                }
                text.trim_end().to_string()
            }
        };
        self.replace_tokens(i, end, replacement);
        Ok(Some(end))
    }

    fn lower_export_star(&mut self, i: usize, star: usize) -> Result<Option<usize>, PassError> {
        let mut namespace: Option<String> = None;
        let mut k = star + 1;
        if let Some(a) = self.next_significant(k) {
            if self.is_ident(a, "as") {
                if let Some(n) = self.next_significant(a + 1) {
                    namespace = Some(self.text(n).to_string());
                    k = n + 1;
                }
            }
        }
        let Some(f) = self.next_significant(k).filter(|&f| self.is_ident(f, "from")) else {
            return Ok(None);
        };
        let Some(m) = self
            .next_significant(f + 1)
            .filter(|&m| self.kind(m) == TokenKind::String)
        else {
            return Ok(None);
        };
        let module = self.text(m).to_string();
        let end = self.statement_end_after(m);
        let tmp = self.fresh_import();
        let replacement = match namespace {
            Some(ns) => {
                format!("const {tmp} = require({module}); exports.{ns} = {tmp};")
            }
            None => format!(
                "const {tmp} = require({module}); for (const __k in {tmp}) if (__k !== \"default\" && !Object.prototype.hasOwnProperty.call(exports, __k)) exports[__k] = {tmp}[__k];"
            ),
        };
        self.replace_tokens(i, end, replacement);
        Ok(Some(end))
    }

    // ------------------------------------------------------------------
    // Scanning helpers
    // ------------------------------------------------------------------

    /// Index past the `}` that closes the body of a function or class
    /// declaration starting at `kw`.
    fn declaration_body_end(&self, kw: usize) -> Option<usize> {
        let mut j = kw + 1;
        let mut paren = 0i32;
        while j < self.toks.len() {
            match self.kind(j) {
                TokenKind::Punct('(' | '[') => paren += 1,
                TokenKind::Punct(')' | ']') => paren -= 1,
                TokenKind::Punct('{') if paren == 0 => {
                    return self.balanced_end(j);
                }
                _ => {}
            }
            j += 1;
        }
        None
    }

    fn balanced_end(&self, open: usize) -> Option<usize> {
        let (oc, cc) = match self.kind(open) {
            TokenKind::Punct('{') => ('{', '}'),
            TokenKind::Punct('[') => ('[', ']'),
            TokenKind::Punct('(') => ('(', ')'),
            _ => return None,
        };
        let mut depth = 0i32;
        let mut j = open;
        while j < self.toks.len() {
            match self.kind(j) {
                TokenKind::Punct(c) if c == oc => depth += 1,
                TokenKind::Punct(c) if c == cc => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(j + 1);
                    }
                }
                _ => {}
            }
            j += 1;
        }
        None
    }

    /// Collect binding names from a destructuring pattern's tokens. Skips
    /// initializer expressions after `=` and keys before `:`.
    fn pattern_names(&self, from: usize, to: usize, out: &mut Vec<String>) {
        let mut k = from;
        let mut skip_depth: Option<i32> = None;
        let mut depth = 0i32;
        while k < to {
            match self.kind(k) {
                TokenKind::Punct('{' | '[' | '(') => depth += 1,
                TokenKind::Punct('}' | ']' | ')') => {
                    depth -= 1;
                    if let Some(d) = skip_depth {
                        if depth < d {
                            skip_depth = None;
                        }
                    }
                }
                TokenKind::Punct(',') => {
                    if let Some(d) = skip_depth {
                        if depth <= d {
                            skip_depth = None;
                        }
                    }
                }
                TokenKind::Punct('=') if skip_depth.is_none() => {
                    skip_depth = Some(depth);
                    // The binding before the default still counts; it was
                    // already collected below.
                }
                TokenKind::Ident if skip_depth.is_none() => {
                    let is_binding = self
                        .next_significant(k + 1)
                        .map(|n| {
                            self.is_punct(n, ',')
                                || self.is_punct(n, '}')
                                || self.is_punct(n, ']')
                                || self.is_punct(n, '=')
                        })
                        .unwrap_or(true);
                    if is_binding {
                        out.push(self.text(k).to_string());
                    }
                }
                _ => {}
            }
            k += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower(source: &str) -> String {
        lower_modules(source).unwrap()
    }

    #[test]
    fn test_default_import_uses_interop() {
        let out = lower("import React from \"react\";\nReact.go();");
        assert!(out.contains("const React = __jitte_interop(require(\"react\"));"));
        assert!(out.starts_with("var __jitte_interop"));
    }

    #[test]
    fn test_named_imports_destructure() {
        let out = lower("import { a, b as c } from './m';\n");
        assert!(out.contains("const { a, b: c } = require('./m');"));
    }

    #[test]
    fn test_namespace_import() {
        let out = lower("import * as ns from './m';\n");
        assert!(out.contains("const ns = require('./m');"));
    }

    #[test]
    fn test_mixed_import() {
        let out = lower("import d, { a } from './m';\n");
        assert!(out.contains("const __jitte_import_0 = require('./m');"));
        assert!(out.contains("const d = __jitte_interop(__jitte_import_0);"));
        assert!(out.contains("const { a } = __jitte_import_0;"));
    }

    #[test]
    fn test_side_effect_import() {
        assert!(lower("import './setup';\n").contains("require('./setup');"));
    }

    #[test]
    fn test_export_const() {
        let out = lower("export const x = 1;\n");
        assert!(out.starts_with("exports.__esModule = true;"));
        assert!(out.contains("const x = 1; exports.x = x;"));
    }

    #[test]
    fn test_export_multiple_declarators() {
        let out = lower("export let a = 1, b = 2;\n");
        assert!(out.contains("exports.a = a;"));
        assert!(out.contains("exports.b = b;"));
    }

    #[test]
    fn test_export_destructuring() {
        let out = lower("export const { a, b: c } = obj;\n");
        assert!(out.contains("exports.a = a;"));
        assert!(out.contains("exports.c = c;"));
        assert!(!out.contains("exports.b = b;"));
    }

    #[test]
    fn test_export_function_keeps_declaration() {
        let out = lower("export function sum(a, b) { return a + b; }\nsum(1, 2);");
        assert!(out.contains("function sum(a, b) { return a + b; } exports.sum = sum;"));
    }

    #[test]
    fn test_export_default_expression() {
        let out = lower("export default 42;\n");
        assert!(out.contains("exports.default = 42;"));
    }

    #[test]
    fn test_export_default_named_function() {
        let out = lower("export default function main() { return 1; }\nmain();");
        assert!(out.contains("function main() { return 1; } exports.default = main;"));
        assert!(!out.contains("export"));
        // `exports.__esModule` marker goes in front.
        assert!(out.starts_with(ESMODULE_MARKER));
    }

    #[test]
    fn test_export_default_anonymous_function() {
        let out = lower("export default function () { return 1; }\n");
        assert!(out.contains("exports.default = function () { return 1; };"));
    }

    #[test]
    fn test_export_clause_with_alias() {
        let out = lower("const a = 1;\nexport { a as alias };\n");
        assert!(out.contains("exports.alias = a;"));
    }

    #[test]
    fn test_reexport_clause() {
        let out = lower("export { x } from './m';\n");
        assert!(out.contains("const __jitte_import_0 = require('./m');"));
        assert!(out.contains("exports.x = __jitte_import_0.x;"));
    }

    #[test]
    fn test_export_star() {
        let out = lower("export * from './m';\n");
        assert!(out.contains("const __jitte_import_0 = require('./m');"));
        assert!(out.contains("exports[__k] = __jitte_import_0[__k];"));
    }

    #[test]
    fn test_line_count_preserved_for_multiline_import() {
        let source = "import {\n  a,\n  b,\n} from './m';\nconst c = a + b;\n";
        let out = lower(source);
        assert_eq!(out.lines().count(), source.lines().count());
        assert!(out.contains("const { a, b } = require('./m');"));
    }

    #[test]
    fn test_plain_commonjs_is_untouched() {
        let source = "const fs = require('fs');\nmodule.exports = { fs };\n";
        assert_eq!(lower(source), source);
    }

    #[test]
    fn test_dynamic_import_expression_is_left_alone() {
        let source = "const p = import('./x');\n";
        assert_eq!(lower(source), source);
    }
}
