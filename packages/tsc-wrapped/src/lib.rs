//! tsc-wrapped: the Angular compilation pipeline around the TypeScript front end.
//!
//! Collects decorator metadata, generates template factories, rewrites
//! decorators and module syntax for the emitted JavaScript and bundles the
//! metadata of a library into a flat module.

pub mod bundler;
pub mod codegen;
pub mod diagnostics;
pub mod host;
pub mod logging;
pub mod main_entry;
pub mod metadata;
pub mod module_namer;
pub mod perform_compile;

/// Package version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
