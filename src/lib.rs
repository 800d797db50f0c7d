// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # jitte
//!
//! A just-in-time TypeScript/TSX module loader for the Boa JavaScript
//! engine: given a module identifier, jitte resolves a file on disk, strips
//! typed syntax (translating markup to factory calls where the extension
//! says so), lowers ES modules to CommonJS, executes the result in an
//! isolated module scope, and hands the exports back — synchronously,
//! lazily, one module at a time, on first reference.
//!
//! Nested relative requires re-enter the same pipeline, so a `.ts` entry
//! point can pull in further `.ts`/`.tsx` files while plain `.js`, `.json`,
//! and installed packages keep loading through the host-native path.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jitte::Jitte;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut loader = Jitte::new("app/index.js")?;
//!     let exports = loader.require("./server.ts")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```rust,ignore
//! use jitte::{Jitte, Options};
//!
//! let options = Options::default()
//!     .with_cache(false)        // re-transform on every call
//!     .with_source_maps(true);  // inline maps in transformed output
//! let mut loader = Jitte::with_options("app/index.js", options)?;
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Run a TypeScript file
//! jitte server.ts
//!
//! # Run a TSX file with markup translation
//! jitte view.tsx
//!
//! # Disable the module cache while iterating
//! jitte --no-cache server.ts
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod module_system;
pub mod options;
pub mod runtime;
pub mod transform;

// Re-exports
pub use error::{JitteError, Result};
pub use module_system::{Jitte, LoadedModule, ModuleCache, Resolution, Resolver};
pub use options::{Options, TransformOptions};
pub use runtime::HostSupport;
pub use transform::Strategy;

/// Version of the jitte loader
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
