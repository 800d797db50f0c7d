// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Typed-syntax removal
//!
//! Strips TypeScript syntax from a token stream, leaving runnable JavaScript:
//! type annotations and return types, generics in declaration and call
//! positions, `interface` and `type` declarations, `declare` statements,
//! `implements` clauses, access modifiers, `readonly`/`abstract`/`override`,
//! optional `?` and definite-assignment `!` markers, `as`/`satisfies`
//! assertions, `import type`/`export type`, and decorators. Constructor
//! parameter properties synthesize `this.x = x` assignments, and `enum`
//! declarations lower to the usual object-with-reverse-mapping IIFE.
//!
//! Types are never validated, only removed. All rewrites preserve line
//! numbers: deletions keep their newlines and insertions are single-line.

use super::lexer::{self, Token, TokenKind};
use super::{EditList, PassError};

/// Access modifiers and friends erased at class-member level.
const MEMBER_MODIFIERS: &[&str] = &[
    "public", "private", "protected", "readonly", "abstract", "override", "declare",
];

/// Modifiers that turn a constructor parameter into a property.
const PARAM_PROPERTY_MODIFIERS: &[&str] = &["public", "private", "protected", "readonly"];

/// Strip typed syntax from `source`.
pub fn strip_types(source: &str) -> Result<String, PassError> {
    let toks = lexer::lex(source).map_err(PassError::from)?;
    let removed = vec![false; toks.len()];
    let mut stripper = Stripper {
        src: source,
        toks,
        removed,
        edits: EditList::new(),
        frames: Vec::new(),
        var_decl: None,
    };
    stripper.run()?;
    Ok(stripper.edits.apply(source))
}

/// What an open bracketing token means to the walker.
#[derive(Debug)]
enum Frame {
    /// Class body: member-level state plus pending parameter properties.
    ClassBody {
        has_extends: bool,
        member_state: MemberState,
        pending_props: Option<Vec<String>>,
    },
    /// A function, method, or arrow parameter list under rewrite.
    ParamList {
        state: ParamState,
        ctor: bool,
        decl_start: Option<usize>,
        current_name: Option<String>,
        current_has_modifier: bool,
        drop_comma: bool,
        props: Vec<String>,
    },
    /// Anything else: blocks, call parens, object literals, brackets.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberState {
    AtStart,
    Named,
    InValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamState {
    AtStart,
    AfterBinding,
    InDefault,
}

/// Declarator tracking for `const`/`let`/`var` statements.
#[derive(Debug)]
struct VarDecl {
    depth: usize,
    state: ParamState,
}

struct Stripper<'s> {
    src: &'s str,
    toks: Vec<Token>,
    /// Tokens consumed by a deletion; lookbehind skips these.
    removed: Vec<bool>,
    edits: EditList,
    frames: Vec<Frame>,
    var_decl: Option<VarDecl>,
}

impl<'s> Stripper<'s> {
    fn run(&mut self) -> Result<(), PassError> {
        let mut i = 0;
        while i < self.toks.len() {
            i = self.step(i)?;
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
        (0..i).rev().find(|&j| {
            !self.removed[j]
                && !matches!(self.kind(j), TokenKind::LineComment | TokenKind::BlockComment)
        })
    }

    /// True when the previous significant token can end an expression value.
    fn prev_is_value(&self, i: usize) -> bool {
        match self.prev_significant(i) {
            None => false,
            Some(j) => match self.kind(j) {
                TokenKind::Number | TokenKind::String | TokenKind::Regex => true,
                TokenKind::TemplateChunk => self.src[..self.toks[j].span.end].ends_with('`'),
                TokenKind::Punct(c) => matches!(c, ')' | ']'),
                TokenKind::Ident => !matches!(
                    self.text(j),
                    "return" | "typeof" | "instanceof" | "in" | "of" | "new" | "delete" | "void"
                        | "throw" | "case" | "do" | "else" | "yield" | "await"
                ),
                _ => false,
            },
        }
    }

    /// Are tokens `i` and `i + 1` contiguous in the source?
    fn adjacent(&self, i: usize) -> bool {
        i + 1 < self.toks.len() && self.toks[i].span.end == self.toks[i + 1].span.start
    }

    // ------------------------------------------------------------------
    // Deletion helpers
    // ------------------------------------------------------------------

    /// Delete a byte range, also swallowing one adjacent space so the output
    /// keeps natural spacing. Newlines inside the range survive via the edit
    /// list.
    fn delete_span(&mut self, start: usize, end: usize) {
        let bytes = self.src.as_bytes();
        let (mut s, mut e) = (start, end);
        if s > 0 && matches!(bytes[s - 1], b' ' | b'\t') {
            s -= 1;
        } else if e < bytes.len() && matches!(bytes[e], b' ' | b'\t') {
            e += 1;
        }
        self.edits.delete_range(s, e);
    }

    fn delete_token(&mut self, i: usize) {
        let span = self.toks[i].span;
        self.delete_span(span.start, span.end);
        self.removed[i] = true;
    }

    fn delete_tokens(&mut self, from: usize, to: usize) {
        if from >= to {
            return;
        }
        self.delete_span(self.toks[from].span.start, self.toks[to - 1].span.end);
        for j in from..to {
            self.removed[j] = true;
        }
    }

    /// Delete a type expression beginning right after the token at `marker`
    /// (a `:`, `as`, or similar), marker included. Returns the index past it.
    fn delete_type_from(&mut self, marker: usize) -> usize {
        let end = self.type_end(marker + 1);
        self.delete_tokens(marker, end);
        end
    }

    // ------------------------------------------------------------------
    // Main dispatch
    // ------------------------------------------------------------------

    fn step(&mut self, i: usize) -> Result<usize, PassError> {
        if self.removed[i] {
            return Ok(i + 1);
        }
        match self.kind(i) {
            TokenKind::LineComment | TokenKind::BlockComment => Ok(i + 1),
            TokenKind::Ident => self.step_ident(i),
            TokenKind::Punct(c) => self.step_punct(i, c),
            _ => Ok(i + 1),
        }
    }

    fn step_ident(&mut self, i: usize) -> Result<usize, PassError> {
        // Property accesses never start typed declarations.
        let after_dot = self
            .prev_significant(i)
            .is_some_and(|j| self.kind(j) == TokenKind::Punct('.'));
        match self.text(i) {
            "interface" if !after_dot => {
                if let Some(end) = self.try_interface(i) {
                    return Ok(end);
                }
            }
            "type" if !after_dot => {
                if let Some(end) = self.try_type_alias(i) {
                    return Ok(end);
                }
            }
            "declare" if !after_dot && !self.at_class_member_level() => {
                if let Some(end) = self.try_declare(i) {
                    return Ok(end);
                }
            }
            "enum" if !after_dot => {
                if let Some(end) = self.try_enum(i, i) {
                    return Ok(end);
                }
            }
            "const" if !after_dot => {
                // `const enum` erases to the same IIFE as a plain enum.
                if let Some(j) = self.next_significant(i + 1) {
                    if self.is_ident(j, "enum") {
                        if let Some(end) = self.try_enum(i, j) {
                            return Ok(end);
                        }
                    }
                }
                self.begin_var_decl();
                return Ok(i + 1);
            }
            "let" | "var" if !after_dot => {
                self.begin_var_decl();
                return Ok(i + 1);
            }
            "abstract" => {
                // `abstract class` keeps the class, loses the keyword.
                if let Some(j) = self.next_significant(i + 1) {
                    if self.is_ident(j, "class") {
                        self.delete_token(i);
                        return Ok(i + 1);
                    }
                }
            }
            "class" if !after_dot => return Ok(self.class_header(i)),
            "import" if !after_dot => {
                if let Some(end) = self.try_import(i) {
                    return Ok(end);
                }
            }
            "export" if !after_dot => {
                if let Some(end) = self.try_export_clause(i) {
                    return Ok(end);
                }
            }
            "as" | "satisfies" if self.prev_is_value(i) => {
                return Ok(self.delete_type_from(i));
            }
            _ => {}
        }

        // Modifiers and member names inside a class body.
        if self.at_class_member_level() {
            return Ok(self.step_class_member_ident(i));
        }

        // Generic call arguments: `identity<string>(value)`.
        if self.is_punct(i + 1, '<') {
            if let Some(end) = self.try_generic_call(i) {
                return Ok(end);
            }
        }

        // `function name<T>(...)` type parameters.
        if self.is_ident(i, "function") || self.follows_function_keyword(i) {
            if let Some(j) = self.next_significant(i + 1) {
                if self.is_punct(j, '<') {
                    if let Some(end) = self.angles_end(j) {
                        self.delete_tokens(j, end);
                        return Ok(end);
                    }
                }
            }
        }

        self.track_var_decl_ident(i);
        self.track_param_ident(i);
        Ok(i + 1)
    }

    fn follows_function_keyword(&self, i: usize) -> bool {
        self.prev_significant(i)
            .is_some_and(|j| self.kind(j) == TokenKind::Ident && self.text(j) == "function")
    }

    fn step_punct(&mut self, i: usize, c: char) -> Result<usize, PassError> {
        match c {
            '(' => Ok(self.open_paren(i)),
            '{' => Ok(self.open_brace(i)),
            '[' => {
                self.frames.push(Frame::Other);
                Ok(i + 1)
            }
            ')' | '}' | ']' => Ok(self.close_frame(i, c)),
            ':' => Ok(self.colon(i)),
            '?' => Ok(self.question(i)),
            '!' => Ok(self.bang(i)),
            '=' => Ok(self.equals(i)),
            ',' => Ok(self.comma(i)),
            ';' => Ok(self.semicolon(i)),
            '@' => Ok(self.decorator(i)),
            _ => Ok(i + 1),
        }
    }

    // ------------------------------------------------------------------
    // Statements that vanish entirely
    // ------------------------------------------------------------------

    /// `interface X extends A, B<T> { ... }` including an `export` prefix.
    fn try_interface(&mut self, i: usize) -> Option<usize> {
        let name = self.next_significant(i + 1)?;
        if self.kind(name) != TokenKind::Ident {
            return None;
        }
        // Scan to the body `{` outside any angle nesting.
        let mut j = name + 1;
        let mut angle = 0i32;
        while j < self.toks.len() {
            match self.kind(j) {
                TokenKind::Punct('<') => angle += 1,
                TokenKind::Punct('>') => angle -= 1,
                TokenKind::Punct('{') if angle <= 0 => break,
                _ => {}
            }
            j += 1;
        }
        let body_end = self.balanced_end(j, '{', '}')?;
        let start = self.export_prefix(i);
        self.delete_tokens(start, body_end);
        Some(body_end)
    }

    /// `type X<T> = ...;` including an `export` prefix.
    fn try_type_alias(&mut self, i: usize) -> Option<usize> {
        let name = self.next_significant(i + 1)?;
        if self.kind(name) != TokenKind::Ident {
            return None;
        }
        let mut j = self.next_significant(name + 1)?;
        if self.is_punct(j, '<') {
            j = self.angles_end(j)?;
            j = self.next_significant(j)?;
        }
        if !self.is_punct(j, '=') {
            return None;
        }
        let mut end = self.type_end(j + 1);
        if end < self.toks.len() && self.is_punct(end, ';') {
            end += 1;
        }
        let start = self.export_prefix(i);
        self.delete_tokens(start, end);
        Some(end)
    }

    /// `declare ...` ambient statement: through `;` or a matching block.
    fn try_declare(&mut self, i: usize) -> Option<usize> {
        let j = self.next_significant(i + 1)?;
        if self.kind(j) != TokenKind::Ident
            || !matches!(
                self.text(j),
                "const" | "let" | "var" | "function" | "class" | "enum" | "namespace"
                    | "module" | "global" | "abstract" | "type" | "interface"
            )
        {
            return None;
        }
        let mut k = j;
        while k < self.toks.len() {
            match self.kind(k) {
                TokenKind::Punct(';') => {
                    k += 1;
                    break;
                }
                TokenKind::Punct('{') => {
                    k = self.balanced_end(k, '{', '}')?;
                    break;
                }
                _ => k += 1,
            }
        }
        let start = self.export_prefix(i);
        self.delete_tokens(start, k);
        Some(k)
    }

    /// Include a directly preceding `export` keyword in a deletion.
    fn export_prefix(&self, i: usize) -> usize {
        match self.prev_significant(i) {
            Some(j) if self.kind(j) == TokenKind::Ident && self.text(j) == "export" => j,
            _ => i,
        }
    }

    // ------------------------------------------------------------------
    // Enums
    // ------------------------------------------------------------------

    /// Lower `enum Color { Red, Green = 5, Name = "n" }` to the reverse-mapped
    /// IIFE form. `start` is `const` for a const enum, otherwise the `enum`
    /// keyword itself.
    fn try_enum(&mut self, start: usize, enum_kw: usize) -> Option<usize> {
        let name_idx = self.next_significant(enum_kw + 1)?;
        if self.kind(name_idx) != TokenKind::Ident {
            return None;
        }
        let name = self.text(name_idx).to_string();
        let open = self.next_significant(name_idx + 1)?;
        if !self.is_punct(open, '{') {
            return None;
        }
        let end = self.balanced_end(open, '{', '}')?;

        let mut body = String::new();
        let mut last = EnumValue::None;
        let mut j = open + 1;
        while j < end - 1 {
            let member = match self.kind(j) {
                TokenKind::Ident => self.text(j).to_string(),
                TokenKind::String => self.text(j)[1..self.text(j).len() - 1].to_string(),
                _ => {
                    j += 1;
                    continue;
                }
            };
            j += 1;
            let mut init: Option<String> = None;
            if j < end - 1 && self.is_punct(j, '=') {
                // Initializer text up to a comma at this nesting level.
                let init_start = self.toks[j + 1].span.start;
                let mut depth = 0i32;
                let mut k = j + 1;
                while k < end - 1 {
                    match self.kind(k) {
                        TokenKind::Punct('(' | '[' | '{') => depth += 1,
                        TokenKind::Punct(')' | ']' | '}') => depth -= 1,
                        TokenKind::Punct(',') if depth == 0 => break,
                        _ => {}
                    }
                    k += 1;
                }
                let init_end = self.toks[k - 1].span.end;
                init = Some(self.src[init_start..init_end].trim().to_string());
                j = k;
            }
            last = push_enum_member(&mut body, &name, &member, init, last);
        }

        let replacement = format!(
            "var {name} = (function ({name}) {{ {body}return {name}; }})({name} || {{}});"
        );
        self.edits.replace_range(
            self.toks[start].span.start,
            self.toks[end - 1].span.end,
            replacement,
        );
        for k in start..end {
            self.removed[k] = true;
        }
        Some(end)
    }

    // ------------------------------------------------------------------
    // import / export statements
    // ------------------------------------------------------------------

    /// Handle `import ...` at statement position. Deletes type-only imports
    /// and inline `type` specifiers, then jumps past the statement so its
    /// `as` keywords are left alone.
    fn try_import(&mut self, i: usize) -> Option<usize> {
        let j = self.next_significant(i + 1)?;
        // `import(...)` and `import.meta` are expressions.
        if self.is_punct(j, '(') || self.is_punct(j, '.') {
            return None;
        }
        let end = self.import_statement_end(i)?;
        // `import type ...` unless `type` is itself the default binding.
        if self.is_ident(j, "type") {
            if let Some(k) = self.next_significant(j + 1) {
                if !self.is_ident(k, "from") {
                    self.delete_tokens(i, end);
                    return Some(end);
                }
            }
        }
        // Inline `type` specifiers inside the braces.
        let mut k = j;
        while k < end {
            if self.is_punct(k, '{') {
                let close = self.balanced_end(k, '{', '}')?;
                self.delete_type_specifiers(k + 1, close - 1);
                k = close;
            } else {
                k += 1;
            }
        }
        Some(end)
    }

    /// Delete `type name [as alias]` entries plus a neighboring comma.
    fn delete_type_specifiers(&mut self, from: usize, to: usize) {
        let mut k = from;
        while k < to {
            if self.is_ident(k, "type") && k + 1 < to && self.kind(k + 1) == TokenKind::Ident {
                let mut e = k + 2;
                if e < to && self.is_ident(e, "as") && e + 1 < to {
                    e += 2;
                }
                if e < to && self.is_punct(e, ',') {
                    e += 1;
                }
                self.delete_tokens(k, e);
                k = e;
            } else {
                k += 1;
            }
        }
    }

    fn import_statement_end(&self, i: usize) -> Option<usize> {
        let mut k = i + 1;
        while k < self.toks.len() {
            match self.kind(k) {
                TokenKind::String => {
                    let mut e = k + 1;
                    if e < self.toks.len() && self.is_punct(e, ';') {
                        e += 1;
                    }
                    return Some(e);
                }
                TokenKind::Punct(';') => return Some(k + 1),
                _ => k += 1,
            }
        }
        Some(self.toks.len())
    }

    /// Handle `export` at statement position: jump export-brace clauses so
    /// their `as` keywords survive, and delete `export type` lists.
    fn try_export_clause(&mut self, i: usize) -> Option<usize> {
        let j = self.next_significant(i + 1)?;
        if self.is_ident(j, "type") {
            if let Some(k) = self.next_significant(j + 1) {
                if self.is_punct(k, '{') {
                    let end = self.import_statement_end(k)?;
                    self.delete_tokens(i, end);
                    return Some(end);
                }
            }
            // `export type X = ...` is handled by the alias rule, which picks
            // up the export prefix itself.
            return None;
        }
        if self.is_punct(j, '{') || self.is_punct(j, '*') {
            return self.import_statement_end(j);
        }
        None
    }

    // ------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------

    /// Walk a class header: strip type parameters, `extends` type arguments,
    /// and the `implements` clause, then push the body frame.
    fn class_header(&mut self, class_kw: usize) -> usize {
        let mut has_extends = false;
        let mut j = class_kw + 1;
        let mut depth = 0i32;
        while j < self.toks.len() {
            match self.kind(j) {
                TokenKind::Punct('(' | '[') => depth += 1,
                TokenKind::Punct(')' | ']') => depth -= 1,
                TokenKind::Punct('{') if depth == 0 => {
                    self.frames.push(Frame::ClassBody {
                        has_extends,
                        member_state: MemberState::AtStart,
                        pending_props: None,
                    });
                    return j + 1;
                }
                TokenKind::Punct('<') if depth == 0 => {
                    if let Some(end) = self.angles_end(j) {
                        self.delete_tokens(j, end);
                        j = end;
                        continue;
                    }
                }
                TokenKind::Ident if depth == 0 && self.text(j) == "extends" => {
                    has_extends = true;
                }
                TokenKind::Ident if depth == 0 && self.text(j) == "implements" => {
                    // Delete from `implements` up to the body brace.
                    let mut k = j;
                    let mut inner = 0i32;
                    while k < self.toks.len() {
                        match self.kind(k) {
                            TokenKind::Punct('<') => inner += 1,
                            TokenKind::Punct('>') => inner -= 1,
                            TokenKind::Punct('{') if inner <= 0 => break,
                            _ => {}
                        }
                        k += 1;
                    }
                    self.delete_tokens(j, k);
                    j = k;
                    continue;
                }
                _ => {}
            }
            j += 1;
        }
        j
    }

    fn at_class_member_level(&self) -> bool {
        matches!(self.frames.last(), Some(Frame::ClassBody { .. }))
    }

    fn member_state(&self) -> Option<MemberState> {
        match self.frames.last() {
            Some(Frame::ClassBody { member_state, .. }) => Some(*member_state),
            _ => None,
        }
    }

    fn set_member_state(&mut self, state: MemberState) {
        if let Some(Frame::ClassBody { member_state, .. }) = self.frames.last_mut() {
            *member_state = state;
        }
    }

    /// Identifier seen at class-member level.
    fn step_class_member_ident(&mut self, i: usize) -> usize {
        let Some(state) = self.member_state() else {
            return i + 1;
        };
        match state {
            MemberState::AtStart => {
                let word = self.text(i).to_string();
                let next_is_name = self.next_significant(i + 1).is_some_and(|j| {
                    matches!(
                        self.kind(j),
                        TokenKind::Ident | TokenKind::String | TokenKind::Number
                    ) || self.is_punct(j, '[')
                        || self.is_punct(j, '#')
                        || self.is_punct(j, '*')
                });
                if MEMBER_MODIFIERS.contains(&word.as_str()) && next_is_name {
                    self.delete_token(i);
                    return i + 1;
                }
                if matches!(word.as_str(), "static" | "get" | "set" | "async") && next_is_name {
                    return i + 1;
                }
                // The member name itself.
                self.set_member_state(MemberState::Named);
                // Method type parameters: `name<T>(...)`.
                if self.is_punct(i + 1, '<') {
                    if let Some(end) = self.angles_end(i + 1) {
                        if end < self.toks.len() && self.is_punct(end, '(') {
                            self.delete_tokens(i + 1, end);
                        }
                    }
                }
                i + 1
            }
            _ => {
                // Expression-position identifiers inside initializers still
                // get generic-call stripping.
                if self.is_punct(i + 1, '<') {
                    if let Some(end) = self.try_generic_call(i) {
                        return end;
                    }
                }
                i + 1
            }
        }
    }

    // ------------------------------------------------------------------
    // Parens, braces, and frames
    // ------------------------------------------------------------------

    fn open_paren(&mut self, i: usize) -> usize {
        let frame = self.classify_paren(i);
        self.frames.push(frame);
        i + 1
    }

    fn classify_paren(&self, i: usize) -> Frame {
        let param_list = |ctor: bool, decl_start: Option<usize>| Frame::ParamList {
            state: ParamState::AtStart,
            ctor,
            decl_start,
            current_name: None,
            current_has_modifier: false,
            drop_comma: false,
            props: Vec::new(),
        };

        if let Some(p) = self.prev_significant(i) {
            if self.kind(p) == TokenKind::Ident {
                let prev_word = self.text(p);
                let member_context = matches!(
                    self.frames.last(),
                    Some(Frame::ClassBody {
                        member_state: MemberState::Named | MemberState::AtStart,
                        ..
                    })
                );
                if prev_word == "constructor" && member_context {
                    return param_list(true, Some(p));
                }
                if prev_word == "function" {
                    return param_list(false, Some(p));
                }
                if let Some(b) = self.prev_significant(p) {
                    if self.kind(b) == TokenKind::Ident && self.text(b) == "function" {
                        return param_list(false, Some(b));
                    }
                }
                if member_context {
                    // `name(` at member level is a method.
                    return param_list(false, Some(p));
                }
                // Object-literal method shorthand: `{ name(a, b) { ... } }`.
                // Statement keywords never open a parameter list.
                let statement_keyword = matches!(
                    prev_word,
                    "if" | "for" | "while" | "switch" | "catch" | "with" | "return" | "do"
                        | "else" | "typeof" | "await" | "yield" | "new" | "in" | "of" | "case"
                        | "throw" | "delete" | "void" | "instanceof"
                );
                if !statement_keyword {
                    let after_list_brace = self
                        .balanced_end(i, '(', ')')
                        .and_then(|close| self.next_significant(close))
                        .is_some_and(|j| self.is_punct(j, '{'));
                    let shorthand_position = self
                        .prev_significant(p)
                        .is_some_and(|b| self.is_punct(b, '{') || self.is_punct(b, ','));
                    if after_list_brace && shorthand_position {
                        return param_list(false, Some(p));
                    }
                }
            }
        }
        if self.arrow_lookahead(i) {
            return param_list(false, None);
        }
        Frame::Other
    }

    /// Does the paren at `i` close into `=>` (or `: Type =>`)?
    fn arrow_lookahead(&self, i: usize) -> bool {
        let Some(close) = self.balanced_end(i, '(', ')') else {
            return false;
        };
        let Some(mut j) = self.next_significant(close) else {
            return false;
        };
        if self.is_punct(j, ':') {
            let end = self.type_end(j + 1);
            let Some(next) = self.next_significant(end) else {
                return false;
            };
            j = next;
        }
        self.is_punct(j, '=') && self.adjacent(j) && self.is_punct(j + 1, '>')
    }

    fn open_brace(&mut self, i: usize) -> usize {
        // A constructor body opening after parameter properties were
        // collected receives the synthesized assignments.
        let pending = match self.frames.last_mut() {
            Some(Frame::ClassBody {
                pending_props, has_extends, ..
            }) if pending_props.is_some() => {
                let names = pending_props.take().unwrap_or_default();
                Some((names, *has_extends))
            }
            _ => None,
        };
        if let Some((names, has_extends)) = pending {
            self.insert_ctor_assignments(i, &names, has_extends);
        }
        self.frames.push(Frame::Other);
        i + 1
    }

    /// Insert `this.x = x;` after the constructor's `{`, or after the
    /// `super(...)` call when the class extends another.
    fn insert_ctor_assignments(&mut self, open: usize, names: &[String], has_extends: bool) {
        if names.is_empty() {
            return;
        }
        let mut assignments = String::new();
        for name in names {
            assignments.push_str(&format!(" this.{name} = {name};"));
        }
        let mut at = self.toks[open].span.end;
        if has_extends {
            if let Some(close) = self.balanced_end(open, '{', '}') {
                let mut k = open + 1;
                while k < close {
                    if self.is_ident(k, "super") && self.is_punct(k + 1, '(') {
                        if let Some(call_close) = self.balanced_end(k + 1, '(', ')') {
                            at = self.toks[call_close - 1].span.end;
                            if call_close < close && self.is_punct(call_close, ';') {
                                at = self.toks[call_close].span.end;
                            }
                        }
                        break;
                    }
                    k += 1;
                }
            }
        }
        self.edits.insert(at, assignments);
    }

    fn close_frame(&mut self, i: usize, c: char) -> usize {
        let popped = self.frames.pop();
        if let Some(Frame::ParamList {
            ctor,
            decl_start,
            mut props,
            current_name,
            current_has_modifier,
            ..
        }) = popped
        {
            if c == ')' {
                if ctor && current_has_modifier {
                    if let Some(name) = current_name {
                        props.push(name);
                    }
                }
                return self.after_param_list(i, ctor, decl_start, props);
            }
            return i + 1;
        }
        // A destructuring pattern closing at binding level finishes the
        // binding; a method body closing returns to member level.
        match self.frames.last_mut() {
            Some(Frame::ParamList { state, .. }) if matches!(c, '}' | ']') => {
                if *state == ParamState::AtStart {
                    *state = ParamState::AfterBinding;
                }
            }
            Some(Frame::ClassBody { member_state, .. }) if c == '}' => {
                *member_state = MemberState::AtStart;
            }
            _ => {}
        }
        self.var_decl_on_close();
        i + 1
    }

    fn var_decl_on_close(&mut self) {
        let len = self.frames.len();
        if let Some(vd) = &mut self.var_decl {
            if len < vd.depth {
                self.var_decl = None;
            } else if len == vd.depth && vd.state == ParamState::AtStart {
                vd.state = ParamState::AfterBinding;
            }
        }
    }

    /// After a parameter list closes: stash constructor properties, strip the
    /// return type, and delete overload signatures that have no body.
    fn after_param_list(
        &mut self,
        close: usize,
        ctor: bool,
        decl_start: Option<usize>,
        props: Vec<String>,
    ) -> usize {
        if ctor && !props.is_empty() {
            if let Some(Frame::ClassBody { pending_props, .. }) = self.frames.last_mut() {
                *pending_props = Some(props);
            }
        }
        let Some(next) = self.next_significant(close + 1) else {
            return close + 1;
        };
        if self.is_punct(next, ':') {
            let type_end = self.type_end(next + 1);
            if let Some(after) = self.next_significant(type_end) {
                if self.is_punct(after, ';') {
                    if let Some(start) = decl_start {
                        // Overload signature without a body.
                        self.delete_tokens(start, after + 1);
                        return after + 1;
                    }
                }
            }
            self.delete_tokens(next, type_end);
            return type_end;
        }
        if self.is_punct(next, ';') && !ctor && self.at_class_member_level() {
            if let Some(start) = decl_start {
                self.delete_tokens(start, next + 1);
                return next + 1;
            }
        }
        close + 1
    }

    // ------------------------------------------------------------------
    // Small strip sites
    // ------------------------------------------------------------------

    fn colon(&mut self, i: usize) -> usize {
        let annotate = match self.frames.last() {
            Some(Frame::ParamList { state, .. }) => *state == ParamState::AfterBinding,
            Some(Frame::ClassBody { member_state, .. }) => *member_state == MemberState::Named,
            _ => self.var_decl.as_ref().is_some_and(|vd| {
                vd.depth == self.frames.len() && vd.state == ParamState::AfterBinding
            }),
        };
        if annotate {
            return self.delete_type_from(i);
        }
        i + 1
    }

    fn question(&mut self, i: usize) -> usize {
        // Optional markers only in binding positions; `?.` and ternaries in
        // value positions are untouched.
        let optional_marker = match self.frames.last() {
            Some(Frame::ParamList { state, .. }) => *state == ParamState::AfterBinding,
            Some(Frame::ClassBody { member_state, .. }) => {
                *member_state == MemberState::Named && !self.is_punct(i + 1, '.')
            }
            _ => false,
        };
        if optional_marker {
            self.delete_token(i);
        }
        i + 1
    }

    fn bang(&mut self, i: usize) -> usize {
        // Postfix non-null assertion: the previous token is a value and the
        // `!` is not glued to `=` (that would be `!=` / `!==`).
        let part_of_neq = self.adjacent(i) && self.is_punct(i + 1, '=');
        if self.prev_is_value(i) && !part_of_neq {
            self.delete_token(i);
        }
        i + 1
    }

    fn equals(&mut self, i: usize) -> usize {
        if let Some(Frame::ParamList { state, .. }) = self.frames.last_mut() {
            if *state == ParamState::AfterBinding {
                *state = ParamState::InDefault;
            }
        }
        if let Some(Frame::ClassBody { member_state, .. }) = self.frames.last_mut() {
            if *member_state == MemberState::Named {
                *member_state = MemberState::InValue;
            }
        }
        let len = self.frames.len();
        if let Some(vd) = &mut self.var_decl {
            if vd.depth == len && vd.state == ParamState::AfterBinding {
                vd.state = ParamState::InDefault;
            }
        }
        i + 1
    }

    fn comma(&mut self, i: usize) -> usize {
        let mut delete_this_comma = false;
        if let Some(Frame::ParamList {
            state,
            current_name,
            current_has_modifier,
            drop_comma,
            ctor,
            props,
            ..
        }) = self.frames.last_mut()
        {
            if *ctor && *current_has_modifier {
                if let Some(name) = current_name.take() {
                    props.push(name);
                }
            }
            if *drop_comma {
                delete_this_comma = true;
                *drop_comma = false;
            }
            *state = ParamState::AtStart;
            *current_has_modifier = false;
            *current_name = None;
        }
        if delete_this_comma {
            self.delete_token(i);
        }
        let len = self.frames.len();
        if let Some(vd) = &mut self.var_decl {
            if vd.depth == len {
                vd.state = ParamState::AtStart;
            }
        }
        i + 1
    }

    fn semicolon(&mut self, i: usize) -> usize {
        let len = self.frames.len();
        if self.var_decl.as_ref().is_some_and(|vd| vd.depth == len) {
            self.var_decl = None;
        }
        if let Some(Frame::ClassBody { member_state, .. }) = self.frames.last_mut() {
            *member_state = MemberState::AtStart;
        }
        i + 1
    }

    /// `@decorator` or `@decorator(args)`: erased, as the engine has no
    /// runtime for them.
    fn decorator(&mut self, i: usize) -> usize {
        let mut j = i + 1;
        while j < self.toks.len() && (self.kind(j) == TokenKind::Ident || self.is_punct(j, '.')) {
            j += 1;
        }
        if j < self.toks.len() && self.is_punct(j, '(') {
            if let Some(close) = self.balanced_end(j, '(', ')') {
                j = close;
            }
        }
        self.delete_tokens(i, j);
        j
    }

    // ------------------------------------------------------------------
    // Declarator and parameter bookkeeping
    // ------------------------------------------------------------------

    fn begin_var_decl(&mut self) {
        self.var_decl = Some(VarDecl {
            depth: self.frames.len(),
            state: ParamState::AtStart,
        });
    }

    fn track_var_decl_ident(&mut self, i: usize) {
        let word = self.text(i).to_string();
        let len = self.frames.len();
        if let Some(vd) = &mut self.var_decl {
            if vd.depth == len {
                match word.as_str() {
                    "of" | "in" => self.var_decl = None,
                    _ if vd.state == ParamState::AtStart => {
                        vd.state = ParamState::AfterBinding;
                    }
                    _ => {}
                }
            }
        }
    }

    fn track_param_ident(&mut self, i: usize) {
        let at_start_ctor = matches!(
            self.frames.last(),
            Some(Frame::ParamList {
                state: ParamState::AtStart,
                ctor: true,
                ..
            })
        );
        if at_start_ctor && PARAM_PROPERTY_MODIFIERS.contains(&self.text(i)) {
            self.delete_token(i);
            if let Some(Frame::ParamList {
                current_has_modifier,
                ..
            }) = self.frames.last_mut()
            {
                *current_has_modifier = true;
            }
            return;
        }
        // A `this` parameter is type-only; drop it and its comma.
        let at_start = matches!(
            self.frames.last(),
            Some(Frame::ParamList {
                state: ParamState::AtStart,
                ..
            })
        );
        if at_start && self.text(i) == "this" {
            self.delete_token(i);
            if let Some(Frame::ParamList {
                state, drop_comma, ..
            }) = self.frames.last_mut()
            {
                *state = ParamState::AfterBinding;
                *drop_comma = true;
            }
            return;
        }
        let word = self.text(i).to_string();
        if let Some(Frame::ParamList {
            state,
            current_name,
            ..
        }) = self.frames.last_mut()
        {
            if *state == ParamState::AtStart {
                *current_name = Some(word);
                *state = ParamState::AfterBinding;
            }
        }
    }

    // ------------------------------------------------------------------
    // Generic call arguments
    // ------------------------------------------------------------------

    /// `name<...>(` or `name<...>` + template: strip the angle span when the
    /// contents look like type arguments. Heuristic, as in every lexer-level
    /// stripper: `a < b && c > (d)` survives because adjacent `&&`/`||` are
    /// rejected.
    fn try_generic_call(&mut self, name: usize) -> Option<usize> {
        let open = name + 1;
        let mut depth = 0i32;
        let mut j = open;
        let limit = (open + 256).min(self.toks.len());
        while j < limit {
            match self.kind(j) {
                TokenKind::Punct('<') => depth += 1,
                TokenKind::Punct('>') => {
                    depth -= 1;
                    if depth == 0 {
                        let after = self.next_significant(j + 1)?;
                        let call_like = self.is_punct(after, '(')
                            || matches!(self.kind(after), TokenKind::TemplateChunk);
                        if call_like {
                            self.delete_tokens(open, j + 1);
                            return Some(j + 1);
                        }
                        return None;
                    }
                }
                TokenKind::Punct('&') if self.adjacent(j) && self.is_punct(j + 1, '&') => {
                    return None;
                }
                TokenKind::Punct('|') if self.adjacent(j) && self.is_punct(j + 1, '|') => {
                    return None;
                }
                TokenKind::Ident | TokenKind::String | TokenKind::Number => {}
                TokenKind::Punct(
                    ',' | '.' | '|' | '&' | '[' | ']' | '(' | ')' | '{' | '}' | ':' | '?' | '='
                    | '-',
                ) => {}
                _ => return None,
            }
            j += 1;
        }
        None
    }

    // ------------------------------------------------------------------
    // Type-expression probing
    // ------------------------------------------------------------------

    /// Index just past one complete type expression starting at or after `i`.
    /// Pure probe; callers decide what to delete.
    fn type_end(&self, i: usize) -> usize {
        let Some(mut k) = self.next_significant(i) else {
            return i;
        };
        // Leading pipe of a multi-line union: `type A = | B | C`.
        if self.is_punct(k, '|') || self.is_punct(k, '&') {
            k += 1;
        }
        let Some(mut end) = self.type_primary_end(k) else {
            return i;
        };
        let mut saw_extends = false;
        loop {
            let Some(j) = self.next_significant(end) else {
                return end;
            };
            match self.kind(j) {
                TokenKind::Punct('|' | '&') if !self.glued_pair(j) => {
                    match self.type_primary_end_at(j + 1) {
                        Some(e) => end = e,
                        None => return end,
                    }
                }
                TokenKind::Punct('[') => match self.balanced_end(j, '[', ']') {
                    Some(e) => end = e,
                    None => return end,
                },
                TokenKind::Punct('.') => {
                    let Some(name) = self.next_significant(j + 1) else {
                        return end;
                    };
                    if self.kind(name) == TokenKind::Ident {
                        end = name + 1;
                    } else {
                        return end;
                    }
                }
                TokenKind::Punct('<') => match self.angles_end(j) {
                    Some(e) => end = e,
                    None => return end,
                },
                TokenKind::Ident if matches!(self.text(j), "extends" | "is") => {
                    if self.text(j) == "extends" {
                        saw_extends = true;
                    }
                    match self.type_primary_end_at(j + 1) {
                        Some(e) => end = e,
                        None => return end,
                    }
                }
                TokenKind::Punct('?') if saw_extends => {
                    // Conditional type: `T extends U ? A : B`.
                    let true_end = self.type_end(j + 1);
                    let Some(colon) = self.next_significant(true_end) else {
                        return end;
                    };
                    if self.is_punct(colon, ':') {
                        end = self.type_end(colon + 1);
                        saw_extends = false;
                    } else {
                        return end;
                    }
                }
                TokenKind::Punct('=') if self.adjacent(j) && self.is_punct(j + 1, '>') => {
                    end = self.type_end(j + 2);
                }
                _ => return end,
            }
        }
    }

    fn glued_pair(&self, j: usize) -> bool {
        self.adjacent(j) && self.kind(j + 1) == self.kind(j)
    }

    fn type_primary_end_at(&self, i: usize) -> Option<usize> {
        let j = self.next_significant(i)?;
        self.type_primary_end(j)
    }

    fn type_primary_end(&self, i: usize) -> Option<usize> {
        if i >= self.toks.len() {
            return None;
        }
        match self.kind(i) {
            TokenKind::Ident => {
                if matches!(
                    self.text(i),
                    "keyof" | "typeof" | "readonly" | "infer" | "unique" | "asserts" | "new"
                        | "abstract"
                ) {
                    return self.type_primary_end_at(i + 1);
                }
                let mut end = i + 1;
                if end < self.toks.len() && self.is_punct(end, '<') {
                    if let Some(close) = self.angles_end(end) {
                        end = close;
                    }
                }
                Some(end)
            }
            TokenKind::String | TokenKind::Number => Some(i + 1),
            TokenKind::TemplateChunk => Some(self.template_end(i)),
            TokenKind::Punct('{') => self.balanced_end(i, '{', '}'),
            TokenKind::Punct('[') => self.balanced_end(i, '[', ']'),
            TokenKind::Punct('(') => {
                let close = self.balanced_end(i, '(', ')')?;
                let Some(j) = self.next_significant(close) else {
                    return Some(close);
                };
                if self.is_punct(j, '=') && self.adjacent(j) && self.is_punct(j + 1, '>') {
                    Some(self.type_end(j + 2))
                } else {
                    Some(close)
                }
            }
            TokenKind::Punct('-') => {
                // Negative numeric literal type.
                let j = self.next_significant(i + 1)?;
                (self.kind(j) == TokenKind::Number).then_some(j + 1)
            }
            _ => None,
        }
    }

    /// Consume template-literal tokens through the chunk that closes it.
    fn template_end(&self, i: usize) -> usize {
        let mut j = i;
        while j < self.toks.len() {
            if self.kind(j) == TokenKind::TemplateChunk
                && self.src[..self.toks[j].span.end].ends_with('`')
            {
                return j + 1;
            }
            j += 1;
        }
        j
    }

    fn balanced_end(&self, open: usize, oc: char, cc: char) -> Option<usize> {
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

    /// Matching `>` for a `<` at `open`, tolerant of nested brackets.
    fn angles_end(&self, open: usize) -> Option<usize> {
        let mut angle = 0i32;
        let mut other = 0i32;
        let mut j = open;
        let limit = (open + 512).min(self.toks.len());
        while j < limit {
            match self.kind(j) {
                TokenKind::Punct('<') if other == 0 => angle += 1,
                TokenKind::Punct('>') if other == 0 => {
                    angle -= 1;
                    if angle == 0 {
                        return Some(j + 1);
                    }
                }
                TokenKind::Punct('(' | '[' | '{') => other += 1,
                TokenKind::Punct(')' | ']' | '}') => {
                    if other == 0 {
                        return None;
                    }
                    other -= 1;
                }
                TokenKind::Punct(';') => return None,
                _ => {}
            }
            j += 1;
        }
        None
    }
}

#[derive(Debug, Clone)]
enum EnumValue {
    None,
    Number(f64),
    Opaque(String),
}

/// Emit one enum member, returning the value state for auto-increment.
fn push_enum_member(
    body: &mut String,
    enum_name: &str,
    member: &str,
    init: Option<String>,
    last: EnumValue,
) -> EnumValue {
    match init {
        Some(text) if text.starts_with('"') || text.starts_with('\'') => {
            // String member: no reverse mapping.
            body.push_str(&format!("{enum_name}[\"{member}\"] = {text}; "));
            EnumValue::Opaque(member.to_string())
        }
        Some(text) => match text.parse::<f64>() {
            Ok(n) => {
                body.push_str(&format!(
                    "{enum_name}[{enum_name}[\"{member}\"] = {text}] = \"{member}\"; "
                ));
                EnumValue::Number(n)
            }
            Err(_) => {
                body.push_str(&format!(
                    "{enum_name}[{enum_name}[\"{member}\"] = ({text})] = \"{member}\"; "
                ));
                EnumValue::Opaque(member.to_string())
            }
        },
        None => {
            let value = match &last {
                EnumValue::None => "0".to_string(),
                EnumValue::Number(n) => format!("{}", n + 1.0),
                EnumValue::Opaque(prev) => format!("{enum_name}[\"{prev}\"] + 1"),
            };
            body.push_str(&format!(
                "{enum_name}[{enum_name}[\"{member}\"] = {value}] = \"{member}\"; "
            ));
            match value.parse::<f64>() {
                Ok(n) => EnumValue::Number(n),
                Err(_) => EnumValue::Opaque(member.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(source: &str) -> String {
        strip_types(source).unwrap()
    }

    #[test]
    fn test_variable_annotations() {
        assert_eq!(strip("const x: number = 1;"), "const x = 1;");
        assert_eq!(strip("let s: string[] | null = null;"), "let s = null;");
        assert_eq!(strip("let y!: number;"), "let y;");
    }

    #[test]
    fn test_ternary_in_initializer_is_kept() {
        assert_eq!(strip("const x = a ? b : c;"), "const x = a ? b : c;");
    }

    #[test]
    fn test_function_signature() {
        assert_eq!(
            strip("function add(a: number, b: number): number { return a + b; }"),
            "function add(a, b) { return a + b; }"
        );
    }

    #[test]
    fn test_arrow_with_annotations() {
        assert_eq!(
            strip("const f = (x: number): number => x * 2;"),
            "const f = (x) => x * 2;"
        );
    }

    #[test]
    fn test_optional_parameter_and_default() {
        assert_eq!(
            strip("function f(a?: string, b: number = 2) {}"),
            "function f(a, b = 2) {}"
        );
    }

    #[test]
    fn test_interface_and_type_alias_vanish() {
        let out = strip("interface P { name: string; }\nconst n = 1;");
        assert!(!out.contains("interface"));
        assert!(out.contains("const n = 1;"));
        assert_eq!(out.lines().count(), 2);

        let out = strip("export type Pair = [number, number];\nlet x = 0;");
        assert!(!out.contains("Pair"));
        assert!(!out.contains("export"));
        assert!(out.contains("let x = 0;"));
    }

    #[test]
    fn test_generic_call_and_comparison() {
        assert_eq!(strip("identity<string>('x');"), "identity('x');");
        assert_eq!(strip("if (a < b && c > d) {}"), "if (a < b && c > d) {}");
    }

    #[test]
    fn test_as_and_satisfies_assertions() {
        assert_eq!(strip("const v = data as string;"), "const v = data;");
        assert_eq!(strip("const v = x satisfies Foo;"), "const v = x;");
    }

    #[test]
    fn test_non_null_versus_inequality() {
        assert_eq!(strip("a!.b();"), "a.b();");
        assert_eq!(strip("if (a !== b) {}"), "if (a !== b) {}");
        assert_eq!(strip("if (a != b) {}"), "if (a != b) {}");
    }

    #[test]
    fn test_class_members() {
        let out = strip(
            "class A {\n  private count: number = 0;\n  readonly tag?: string;\n  get value(): number { return this.count; }\n}",
        );
        assert!(!out.contains("private"));
        assert!(!out.contains("readonly"));
        assert!(!out.contains("number"));
        assert!(out.contains("count = 0;"));
        assert!(out.contains("tag;"));
        assert!(out.contains("get value() { return this.count; }"));
    }

    #[test]
    fn test_parameter_properties() {
        let out =
            strip("class S {\n  constructor(public name: string, private age: number) { }\n}");
        assert!(out.contains("constructor(name, age)"));
        assert!(out.contains("this.name = name;"));
        assert!(out.contains("this.age = age;"));
    }

    #[test]
    fn test_parameter_properties_after_super() {
        let out = strip(
            "class S extends B {\n  constructor(public name: string) { super(name); this.go(); }\n}",
        );
        let sup = out.find("super(name);").unwrap();
        let assign = out.find("this.name = name;").unwrap();
        assert!(assign > sup);
    }

    #[test]
    fn test_implements_clause() {
        assert_eq!(
            strip("class S implements P, Q { go() {} }"),
            "class S { go() {} }"
        );
    }

    #[test]
    fn test_enum_lowering() {
        let out = strip("enum Color { Red, Green = 5, Blue }");
        assert!(out.starts_with("var Color = (function (Color)"));
        assert!(out.contains("Color[Color[\"Red\"] = 0] = \"Red\";"));
        assert!(out.contains("Color[Color[\"Green\"] = 5] = \"Green\";"));
        assert!(out.contains("Color[Color[\"Blue\"] = 6] = \"Blue\";"));
    }

    #[test]
    fn test_import_type_and_inline_type_specifiers() {
        let out = strip("import type { A } from './a';\nimport { type B, C } from './bc';\n");
        assert!(!out.contains("'./a'"));
        assert!(!out.contains("B"));
        assert!(out.contains("import { C } from './bc';"));
    }

    #[test]
    fn test_export_clause_alias_is_preserved() {
        let out = strip("const a = 1;\nexport { a as alias };\n");
        assert!(out.contains("export { a as alias };"));
    }

    #[test]
    fn test_declare_statement() {
        let out = strip("declare const VERSION: string;\nlet v = 1;");
        assert!(!out.contains("VERSION"));
        assert!(out.contains("let v = 1;"));
    }

    #[test]
    fn test_generics_on_functions_and_classes() {
        assert_eq!(
            strip("function identity<T>(arg: T): T { return arg; }"),
            "function identity(arg) { return arg; }"
        );
        assert_eq!(
            strip("class Box<T> extends Base<T> { }"),
            "class Box extends Base { }"
        );
    }

    #[test]
    fn test_this_parameter_is_dropped() {
        assert_eq!(
            strip("function tag(this: Element, key: string) {}"),
            "function tag( key) {}"
        );
    }

    #[test]
    fn test_decorator_is_erased() {
        let out = strip("class A {\n  @observed()\n  value = 1;\n}");
        assert!(!out.contains('@'));
        assert!(out.contains("value = 1;"));
    }

    #[test]
    fn test_conditional_type_versus_value_ternary() {
        let out = strip("const r = flag as boolean ? left : right;");
        assert_eq!(out, "const r = flag ? left : right;");
    }

    #[test]
    fn test_line_counts_survive() {
        let source = "interface X {\n  a: number;\n}\nconst q: number = 1;\n";
        let out = strip(source);
        assert_eq!(out.lines().count(), source.lines().count());
    }
}
