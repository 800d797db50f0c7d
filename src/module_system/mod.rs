// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module system: resolution, caching, loading, and require interception
//!
//! The pipeline is resolve → cache-check → transform → execute →
//! cache-store. Every executing module receives its own `require` binding
//! that re-enters the pipeline for relative typed identifiers and delegates
//! the rest to the host-native loader.

mod cache;
mod loader;
mod require;
mod resolver;

pub use cache::{LoadedModule, ModuleCache};
pub use loader::Jitte;
pub use resolver::{Resolution, Resolver, NATIVE_EXTENSIONS};

pub(crate) use loader::{load, load_native, LoaderState, SharedState};
pub(crate) use require::bind as bind_require;
