// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Markup-to-calls translation
//!
//! Rewrites JSX elements into factory calls: `<div id="x">{v}</div>` becomes
//! `React.createElement("div", { "id": "x" }, v)`, with the factory and
//! fragment expressions configurable. The pass is a character-level scanner
//! because element children are raw markup text, not JavaScript tokens; an
//! apostrophe in `<p>it's</p>` must not open a string literal.
//!
//! Selection is by file extension only. Sources that reach this pass keep
//! their line count: generated calls are single-line and the newlines an
//! element spanned are re-appended after it.

use super::PassError;
use unicode_xid::UnicodeXID;

/// Factory configuration for the markup rewrite.
#[derive(Debug, Clone)]
pub struct MarkupOptions {
    /// Call target for elements
    pub factory: String,
    /// Expression used for fragments
    pub fragment: String,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            factory: "React.createElement".to_string(),
            fragment: "React.Fragment".to_string(),
        }
    }
}

/// Keywords after which an expression (and therefore an element) may begin.
const EXPR_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await", "default",
];

/// Rewrite all JSX in `source` to factory calls.
pub fn transform_markup(source: &str, options: &MarkupOptions) -> Result<String, PassError> {
    let rewriter = Rewriter {
        src: source,
        bytes: source.as_bytes(),
        options,
    };
    let (out, end) = rewriter.scan(0, Mode::TopLevel)?;
    debug_assert_eq!(end, source.len());
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Scan to end of input.
    TopLevel,
    /// Scan to the `}` that closes the brace the caller consumed.
    Brace,
}

/// What the previously copied significant text allows next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Value,
    Operator,
}

struct Rewriter<'s> {
    src: &'s str,
    bytes: &'s [u8],
    options: &'s MarkupOptions,
}

impl<'s> Rewriter<'s> {
    /// Copy JavaScript from `pos`, rewriting any JSX encountered in
    /// expression position. Returns the output and the position after the
    /// scanned region (for `Mode::Brace`, past the closing `}`).
    fn scan(&self, mut pos: usize, mode: Mode) -> Result<(String, usize), PassError> {
        let mut out = String::new();
        let mut prev = Prev::Start;
        let mut depth = 0usize;
        while pos < self.bytes.len() {
            let c = self.bytes[pos];
            match c {
                b'}' if mode == Mode::Brace && depth == 0 => {
                    return Ok((out, pos + 1));
                }
                b'{' => {
                    depth += 1;
                    out.push('{');
                    pos += 1;
                    prev = Prev::Operator;
                }
                b'}' => {
                    depth = depth.saturating_sub(1);
                    out.push('}');
                    pos += 1;
                    prev = Prev::Value;
                }
                b'\'' | b'"' => {
                    let end = self.skip_string(pos)?;
                    out.push_str(&self.src[pos..end]);
                    pos = end;
                    prev = Prev::Value;
                }
                b'`' => {
                    let end = self.skip_template(pos)?;
                    out.push_str(&self.src[pos..end]);
                    pos = end;
                    prev = Prev::Value;
                }
                b'/' if self.bytes.get(pos + 1) == Some(&b'/') => {
                    let end = self.line_end(pos);
                    out.push_str(&self.src[pos..end]);
                    pos = end;
                }
                b'/' if self.bytes.get(pos + 1) == Some(&b'*') => {
                    let end = self.block_comment_end(pos)?;
                    out.push_str(&self.src[pos..end]);
                    pos = end;
                }
                b'/' if prev != Prev::Value => {
                    let end = self.skip_regex(pos)?;
                    out.push_str(&self.src[pos..end]);
                    pos = end;
                    prev = Prev::Value;
                }
                b'<' if prev != Prev::Value && self.element_follows(pos) => {
                    let (emitted, end) = self.parse_element(pos)?;
                    let missing = count_newlines(&self.src[pos..end])
                        .saturating_sub(count_newlines(&emitted));
                    out.push_str(&emitted);
                    for _ in 0..missing {
                        out.push('\n');
                    }
                    pos = end;
                    prev = Prev::Value;
                }
                _ => {
                    let ch = self.char_at(pos);
                    if is_ident_start(ch) {
                        let end = self.ident_end(pos);
                        let word = &self.src[pos..end];
                        out.push_str(word);
                        prev = if EXPR_KEYWORDS.contains(&word) {
                            Prev::Operator
                        } else {
                            Prev::Value
                        };
                        pos = end;
                    } else if ch.is_ascii_digit() {
                        let end = self.number_end(pos);
                        out.push_str(&self.src[pos..end]);
                        pos = end;
                        prev = Prev::Value;
                    } else {
                        out.push(ch);
                        pos += ch.len_utf8();
                        if !ch.is_whitespace() {
                            prev = match ch {
                                ')' | ']' => Prev::Value,
                                _ => Prev::Operator,
                            };
                        }
                    }
                }
            }
        }
        if mode == Mode::Brace {
            return Err(PassError {
                message: "unbalanced braces in markup expression".to_string(),
            });
        }
        Ok((out, pos))
    }

    /// Is the `<` at `pos` the start of an element or fragment?
    fn element_follows(&self, pos: usize) -> bool {
        match self.bytes.get(pos + 1) {
            Some(b'>') => true,
            Some(_) => is_ident_start(self.char_at(pos + 1)),
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Element parsing
    // ------------------------------------------------------------------

    /// Parse the element at `pos`, returning the generated call and the
    /// position just past the element.
    fn parse_element(&self, pos: usize) -> Result<(String, usize), PassError> {
        let mut p = pos + 1; // past '<'

        // Fragment: `<> ... </>`
        if self.bytes.get(p) == Some(&b'>') {
            let (children, end) = self.parse_children(p + 1, None)?;
            let call = self.emit_call(&self.options.fragment, &[], &children);
            return Ok((call, end));
        }

        let name_end = self.tag_name_end(p);
        let name = &self.src[p..name_end];
        p = name_end;
        let tag = tag_expression(name);

        // Attributes.
        let mut attrs: Vec<Attr> = Vec::new();
        loop {
            p = self.skip_ws(p);
            match self.bytes.get(p) {
                Some(b'/') if self.bytes.get(p + 1) == Some(&b'>') => {
                    let call = self.emit_call(&tag, &attrs, &[]);
                    return Ok((call, p + 2));
                }
                Some(b'>') => {
                    p += 1;
                    break;
                }
                Some(b'{') => {
                    // Spread attribute: `{...expr}`.
                    let mut q = self.skip_ws(p + 1);
                    if self.src[q..].starts_with("...") {
                        q += 3;
                    } else {
                        return Err(self.unexpected(p, "expected spread attribute"));
                    }
                    let (expr, end) = self.scan(q, Mode::Brace)?;
                    attrs.push(Attr::Spread(expr.trim().to_string()));
                    p = end;
                }
                Some(_) if is_ident_start(self.char_at(p)) => {
                    let attr_end = self.attr_name_end(p);
                    let attr_name = self.src[p..attr_end].to_string();
                    p = self.skip_ws(attr_end);
                    if self.bytes.get(p) == Some(&b'=') {
                        p = self.skip_ws(p + 1);
                        match self.bytes.get(p) {
                            Some(b'\'' | b'"') => {
                                let end = self.skip_string(p)?;
                                attrs.push(Attr::Pair(attr_name, self.src[p..end].to_string()));
                                p = end;
                            }
                            Some(b'{') => {
                                let (expr, end) = self.scan(p + 1, Mode::Brace)?;
                                attrs.push(Attr::Pair(attr_name, expr.trim().to_string()));
                                p = end;
                            }
                            _ => return Err(self.unexpected(p, "expected attribute value")),
                        }
                    } else {
                        attrs.push(Attr::Pair(attr_name, "true".to_string()));
                    }
                }
                _ => return Err(self.unexpected(p, "malformed element")),
            }
        }

        let (children, end) = self.parse_children(p, Some(name))?;
        let call = self.emit_call(&tag, &attrs, &children);
        Ok((call, end))
    }

    /// Parse children until the matching closing tag (or `</>` for
    /// fragments). Returns the emitted child expressions and the position
    /// past the closing tag.
    fn parse_children(
        &self,
        mut p: usize,
        open_tag: Option<&str>,
    ) -> Result<(Vec<String>, usize), PassError> {
        let mut children = Vec::new();
        loop {
            match self.bytes.get(p) {
                None => {
                    return Err(self.unexpected(
                        p,
                        &format!(
                            "unclosed element <{}>",
                            open_tag.unwrap_or_default()
                        ),
                    ));
                }
                Some(b'<') if self.bytes.get(p + 1) == Some(&b'/') => {
                    // Closing tag; the name is not re-validated.
                    let mut q = p + 2;
                    while q < self.bytes.len() && self.bytes[q] != b'>' {
                        q += 1;
                    }
                    if q >= self.bytes.len() {
                        return Err(self.unexpected(p, "unterminated closing tag"));
                    }
                    return Ok((children, q + 1));
                }
                Some(b'<') => {
                    let (emitted, end) = self.parse_element(p)?;
                    let missing = count_newlines(&self.src[p..end])
                        .saturating_sub(count_newlines(&emitted));
                    let mut child = emitted;
                    for _ in 0..missing {
                        child.push('\n');
                    }
                    children.push(child);
                    p = end;
                }
                Some(b'{') => {
                    let (expr, end) = self.scan(p + 1, Mode::Brace)?;
                    if !is_blank_expression(&expr) {
                        children.push(expr.trim().to_string());
                    }
                    p = end;
                }
                Some(_) => {
                    // Raw text run; newlines it covered are repaid by the
                    // element-level padding in `scan`.
                    let mut q = p;
                    while q < self.bytes.len() && self.bytes[q] != b'<' && self.bytes[q] != b'{' {
                        q += 1;
                    }
                    if let Some(text) = jsx_text(&self.src[p..q]) {
                        children.push(text);
                    }
                    p = q;
                }
            }
        }
    }

    fn emit_call(&self, tag: &str, attrs: &[Attr], children: &[String]) -> String {
        let mut call = format!("{}({}, {}", self.options.factory, tag, props_expression(attrs));
        for child in children {
            call.push_str(", ");
            call.push_str(child);
        }
        call.push(')');
        call
    }

    // ------------------------------------------------------------------
    // Low-level skipping
    // ------------------------------------------------------------------

    fn char_at(&self, pos: usize) -> char {
        self.src[pos..].chars().next().unwrap_or('\0')
    }

    fn skip_ws(&self, mut pos: usize) -> usize {
        while pos < self.bytes.len() && self.bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        pos
    }

    fn ident_end(&self, pos: usize) -> usize {
        let mut end = pos;
        for c in self.src[pos..].chars() {
            if is_ident_continue(c) {
                end += c.len_utf8();
            } else {
                break;
            }
        }
        end
    }

    fn tag_name_end(&self, pos: usize) -> usize {
        let mut end = pos;
        for c in self.src[pos..].chars() {
            if is_ident_continue(c) || c == '.' || c == '-' {
                end += c.len_utf8();
            } else {
                break;
            }
        }
        end
    }

    fn attr_name_end(&self, pos: usize) -> usize {
        let mut end = pos;
        for c in self.src[pos..].chars() {
            if is_ident_continue(c) || c == '-' || c == ':' {
                end += c.len_utf8();
            } else {
                break;
            }
        }
        end
    }

    fn number_end(&self, pos: usize) -> usize {
        let mut end = pos;
        while end < self.bytes.len()
            && (self.bytes[end].is_ascii_alphanumeric() || self.bytes[end] == b'.')
        {
            end += 1;
        }
        end
    }

    fn line_end(&self, pos: usize) -> usize {
        self.src[pos..]
            .find('\n')
            .map(|offset| pos + offset)
            .unwrap_or(self.bytes.len())
    }

    fn block_comment_end(&self, pos: usize) -> Result<usize, PassError> {
        self.src[pos + 2..]
            .find("*/")
            .map(|offset| pos + 2 + offset + 2)
            .ok_or_else(|| self.unexpected(pos, "unterminated block comment"))
    }

    fn skip_string(&self, pos: usize) -> Result<usize, PassError> {
        let quote = self.bytes[pos];
        let mut p = pos + 1;
        while p < self.bytes.len() {
            match self.bytes[p] {
                b'\\' => p += 2,
                b if b == quote => return Ok(p + 1),
                _ => p += 1,
            }
        }
        Err(self.unexpected(pos, "unterminated string literal"))
    }

    /// Skip a template literal, including interpolations (which are plain
    /// JavaScript; markup inside them is not rewritten).
    fn skip_template(&self, pos: usize) -> Result<usize, PassError> {
        let mut p = pos + 1;
        while p < self.bytes.len() {
            match self.bytes[p] {
                b'\\' => p += 2,
                b'`' => return Ok(p + 1),
                b'$' if self.bytes.get(p + 1) == Some(&b'{') => {
                    p = self.skip_plain_js_braced(p + 2)?;
                }
                _ => p += 1,
            }
        }
        Err(self.unexpected(pos, "unterminated template literal"))
    }

    /// Skip JavaScript until the `}` matching an already-consumed `{`.
    fn skip_plain_js_braced(&self, mut p: usize) -> Result<usize, PassError> {
        let mut depth = 0usize;
        while p < self.bytes.len() {
            match self.bytes[p] {
                b'\'' | b'"' => p = self.skip_string(p)?,
                b'`' => p = self.skip_template(p)?,
                b'{' => {
                    depth += 1;
                    p += 1;
                }
                b'}' => {
                    if depth == 0 {
                        return Ok(p + 1);
                    }
                    depth -= 1;
                    p += 1;
                }
                _ => p += 1,
            }
        }
        Err(self.unexpected(p, "unterminated interpolation"))
    }

    fn skip_regex(&self, pos: usize) -> Result<usize, PassError> {
        let mut p = pos + 1;
        let mut in_class = false;
        while p < self.bytes.len() {
            match self.bytes[p] {
                b'\\' => p += 2,
                b'\n' => return Err(self.unexpected(pos, "unterminated regular expression")),
                b'[' => {
                    in_class = true;
                    p += 1;
                }
                b']' => {
                    in_class = false;
                    p += 1;
                }
                b'/' if !in_class => {
                    p += 1;
                    while p < self.bytes.len() && self.bytes[p].is_ascii_lowercase() {
                        p += 1;
                    }
                    return Ok(p);
                }
                _ => p += 1,
            }
        }
        Err(self.unexpected(pos, "unterminated regular expression"))
    }

    fn unexpected(&self, pos: usize, message: &str) -> PassError {
        let line = count_newlines(&self.src[..pos.min(self.src.len())]) + 1;
        PassError {
            message: format!("{message} (line {line})"),
        }
    }
}

enum Attr {
    Pair(String, String),
    Spread(String),
}

/// Build the props argument: `null`, an object literal, or `Object.assign`
/// when spreads are present.
fn props_expression(attrs: &[Attr]) -> String {
    if attrs.is_empty() {
        return "null".to_string();
    }
    let has_spread = attrs.iter().any(|a| matches!(a, Attr::Spread(_)));
    if !has_spread {
        let pairs: Vec<String> = attrs
            .iter()
            .map(|a| match a {
                Attr::Pair(name, value) => format!("\"{name}\": {value}"),
                Attr::Spread(_) => unreachable!(),
            })
            .collect();
        return format!("{{ {} }}", pairs.join(", "));
    }
    // Object.assign keeps evaluation order across spreads and pairs.
    let mut parts: Vec<String> = vec!["{}".to_string()];
    let mut run: Vec<String> = Vec::new();
    for attr in attrs {
        match attr {
            Attr::Pair(name, value) => run.push(format!("\"{name}\": {value}")),
            Attr::Spread(expr) => {
                if !run.is_empty() {
                    parts.push(format!("{{ {} }}", run.join(", ")));
                    run.clear();
                }
                parts.push(expr.clone());
            }
        }
    }
    if !run.is_empty() {
        parts.push(format!("{{ {} }}", run.join(", ")));
    }
    format!("Object.assign({})", parts.join(", "))
}

/// Lowercase names are intrinsic tags; everything else is a component
/// reference.
fn tag_expression(name: &str) -> String {
    let intrinsic = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase())
        || name.contains('-');
    if intrinsic && !name.contains('.') {
        format!("\"{name}\"")
    } else {
        name.to_string()
    }
}

/// JSX text handling: lines are trimmed and joined with single spaces;
/// whitespace-only runs that contain a newline disappear.
fn jsx_text(raw: &str) -> Option<String> {
    let text = if raw.contains('\n') {
        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        raw.to_string()
    };
    if text.is_empty() {
        return None;
    }
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('"');
    for c in text.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped.push('"');
    Some(escaped)
}

/// An expression child that is only whitespace and comments is dropped,
/// matching `{/* note */}` usage.
fn is_blank_expression(expr: &str) -> bool {
    let mut rest = expr.trim();
    loop {
        if rest.starts_with("/*") {
            match rest[2..].find("*/") {
                Some(end) => rest = rest[2 + end + 2..].trim_start(),
                None => return false,
            }
        } else if rest.starts_with("//") {
            match rest.find('\n') {
                Some(end) => rest = rest[end + 1..].trim_start(),
                None => return true,
            }
        } else {
            return rest.is_empty();
        }
    }
}

fn count_newlines(s: &str) -> usize {
    s.bytes().filter(|&b| b == b'\n').count()
}

fn is_ident_start(c: char) -> bool {
    c == '$' || c == '_' || UnicodeXID::is_xid_start(c)
}

fn is_ident_continue(c: char) -> bool {
    c == '$' || c == '_' || UnicodeXID::is_xid_continue(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(source: &str) -> String {
        transform_markup(source, &MarkupOptions::default()).unwrap()
    }

    fn rewrite_with(source: &str, factory: &str, fragment: &str) -> String {
        transform_markup(
            source,
            &MarkupOptions {
                factory: factory.to_string(),
                fragment: fragment.to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_self_closing_element() {
        assert_eq!(
            rewrite("const e = <img/>;"),
            "const e = React.createElement(\"img\", null);"
        );
    }

    #[test]
    fn test_attributes() {
        assert_eq!(
            rewrite(r#"const e = <div className="box" onClick={handler} hidden/>;"#),
            "const e = React.createElement(\"div\", { \"className\": \"box\", \"onClick\": handler, \"hidden\": true });"
        );
    }

    #[test]
    fn test_children_and_text_trimming() {
        let out = rewrite("const e = (\n  <div>\n    Hello\n    {name}\n  </div>\n);");
        assert!(out.contains("React.createElement(\"div\", null, \"Hello\", name)"));
        // Line count preserved.
        assert_eq!(out.lines().count(), 6);
    }

    #[test]
    fn test_nested_elements() {
        assert_eq!(
            rewrite("const e = <ul><li>one</li><li>two</li></ul>;"),
            "const e = React.createElement(\"ul\", null, React.createElement(\"li\", null, \"one\"), React.createElement(\"li\", null, \"two\"));"
        );
    }

    #[test]
    fn test_component_versus_intrinsic() {
        let out = rewrite("const e = <Counter start={1}/>;");
        assert!(out.contains("React.createElement(Counter, { \"start\": 1 })"));
        let out = rewrite("const e = <App.Header/>;");
        assert!(out.contains("React.createElement(App.Header, null)"));
    }

    #[test]
    fn test_fragment() {
        assert_eq!(
            rewrite("const e = <>a<b/></>;"),
            "const e = React.createElement(React.Fragment, null, \"a\", React.createElement(\"b\", null));"
        );
    }

    #[test]
    fn test_custom_pragma() {
        assert_eq!(
            rewrite_with("const e = <p>hi</p>;", "h", "Frag"),
            "const e = h(\"p\", null, \"hi\");"
        );
    }

    #[test]
    fn test_spread_attributes() {
        let out = rewrite("const e = <div {...rest} id={x}/>;");
        assert!(out.contains("Object.assign({}, rest, { \"id\": x })"));
    }

    #[test]
    fn test_apostrophe_in_text() {
        assert_eq!(
            rewrite("const e = <p>it's fine</p>;"),
            "const e = React.createElement(\"p\", null, \"it's fine\");"
        );
    }

    #[test]
    fn test_comment_child_disappears() {
        assert_eq!(
            rewrite("const e = <div>{/* note */}</div>;"),
            "const e = React.createElement(\"div\", null);"
        );
    }

    #[test]
    fn test_expression_child_with_nested_markup() {
        let out = rewrite("const e = <ul>{items.map((i) => <li>{i}</li>)}</ul>;");
        assert!(out.contains(
            "items.map((i) => React.createElement(\"li\", null, i))"
        ));
    }

    #[test]
    fn test_comparison_is_not_markup() {
        assert_eq!(rewrite("const ok = a < b;"), "const ok = a < b;");
        assert_eq!(rewrite("if (x<y) {}"), "if (x<y) {}");
    }

    #[test]
    fn test_ternary_with_elements() {
        let out = rewrite("const e = flag ? <a/> : <b/>;");
        assert_eq!(
            out,
            "const e = flag ? React.createElement(\"a\", null) : React.createElement(\"b\", null);"
        );
    }
}
