// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host engine construction and capability detection
//!
//! The loader runs on an embedded Boa context with a console wired in. Some
//! hosts accept the typed dialect natively; that capability is probed once
//! at loader construction by evaluating a typed snippet, and carried as a
//! flag from then on. Boa answers no, so the probe exists for engine builds
//! (and tests) that answer yes — those skip the transform stage entirely.

use crate::error::{JitteError, Result};
use boa_engine::property::Attribute;
use boa_engine::{Context, JsString, Source};
use boa_runtime::Console;
use tracing::debug;

/// Host capabilities decided once at loader construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostSupport {
    /// The engine executes typed source directly; no transform needed.
    pub typed_dialect: bool,
}

impl HostSupport {
    /// Probe the engine by evaluating a snippet that only a typed-dialect
    /// host accepts.
    pub fn probe(context: &mut Context) -> Self {
        const PROBE: &str = "((value: number): number => value)(0);";
        let typed_dialect = context.eval(Source::from_bytes(PROBE)).is_ok();
        debug!(typed_dialect, "host capability probe");
        Self { typed_dialect }
    }

    /// A host with native typed-dialect support.
    pub fn native_typed() -> Self {
        Self {
            typed_dialect: true,
        }
    }
}

/// Build the engine context every loader owns: fresh realm, console global.
pub fn build_context() -> Result<Context> {
    let mut context = Context::default();
    let console = Console::init(&mut context);
    context
        .register_global_property(JsString::from(Console::NAME), console, Attribute::all())
        .map_err(|err| JitteError::evaluation("<init>", err.to_string()))?;
    Ok(context)
}
