//! # extjs2react
//!
//! Compiles a codebase of `Ext.define` class declarations into framework-agnostic
//! ES modules: plain classes with synthesized accessors, or function components
//! rendering JSX.
//!
//! ## Phases
//!
//! 1. **Extract**: every `.js` unit is parsed on its own and its define calls are
//!    turned into [`ClassModel`]s. Units without a define call are copied through.
//! 2. **Register**: class names, alternate names and aliases are indexed. The first
//!    registration wins; duplicates are diagnostics.
//! 3. **Finalize**: parents, mixins, plugins and controllers are resolved into an
//!    explicit [`model::Resolution`] per class. Nothing asks for resolution data
//!    before this phase completes; doing so is a [`RegistryError::NotFinalized`].
//! 4. **Compile**: units are emitted in parallel against the immutable registry.
//!    Class bodies go through the rewrite rule engine, `items` trees through the
//!    element compiler, `tpl` strings through the template compiler.
//!
//! ## Scope
//!
//! A framework registry, built from a separate unit, sits behind the project
//! registry. Lookups try the local tables first, then the framework.
//!
//! ## Diagnostics
//!
//! Anything recoverable is a [`Diagnostic`] with a stable code. Fatal conditions are
//! the error enums in [`error`].

pub mod accessor;
pub mod ast;
pub mod cache;
pub mod capability;
pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod element;
pub mod emit;
pub mod error;
pub mod extract;
pub mod model;
pub mod naming;
pub mod pipeline;
pub mod registry;
pub mod rewrite;
pub mod rules;
pub mod template;
pub mod unit;

#[cfg(test)]
mod pipeline_tests;
#[cfg(test)]
mod scenario_tests;

pub use capability::{Capability, CapabilityTable, PropTransform};
pub use config::CompilerConfig;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{CompileError, PipelineError, RegistryError};
pub use extract::ParsedUnit;
pub use model::ClassModel;
pub use naming::NamingContext;
pub use pipeline::{Codebase, TranspileSummary, UnitOutput, UsageReport};
pub use registry::Registry;
pub use unit::{compile_unit, CompiledUnit};
