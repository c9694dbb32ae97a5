//! Compiler lifecycle and orchestration for Crucible.
//!
//! A [`Compiler`] is an extensible shell around an opaque
//! [`BuildPipeline`]: every lifecycle step fires a hook from the
//! [`CompilerHooks`] catalog, and plugins extend the compiler exclusively by
//! tapping those hooks during [`create_compiler`]. A [`MultiCompiler`] runs
//! several compilers with name-based dependency edges between them,
//! validated acyclic at construction time.
//!
//! # Example
//!
//! ```ignore
//! use crucible_compiler::{create_compiler, PluginDecl, RawOptions};
//!
//! let options = RawOptions {
//!     name: Some("web".into()),
//!     entries: vec!["./src/main".into()],
//!     plugins: vec![Some(PluginDecl::func(|compiler| {
//!         compiler.hooks.done.tap("reporter", |stats| {
//!             let passes = stats.passes;
//!             async move {
//!                 println!("built in {passes} pass(es)");
//!                 Ok(())
//!             }
//!         })
//!     }))],
//!     ..RawOptions::default()
//! };
//!
//! let compiler = create_compiler(options)?;
//! let stats = compiler.run().await?;
//! ```

/// The compiler object and its run/watch/close lifecycle.
pub mod compiler;

mod controller;

/// Filesystem traits and the environment plugin.
pub mod environment;

/// Compiler and multi-compiler error types.
pub mod error;

/// Compiler construction.
pub mod factory;

/// The compiler's hook catalog.
pub mod hooks;

/// Multi-compiler orchestration.
pub mod multi;

/// Compiler configuration.
pub mod options;

mod options_apply;

/// The build pipeline collaborator.
pub mod pipeline;

/// Plugin declaration and application.
pub mod plugin;

pub use compiler::{Compiler, Watching};
pub use environment::{EnvironmentPlugin, HostFileSystem, InputFileSystem, OutputFileSystem};
pub use error::{CompileError, MultiCompilerError, PipelineError};
pub use factory::{create_compiler, create_multi_compiler};
pub use hooks::{CompilerHooks, EntryOptions, RunContext};
pub use multi::{MultiCompiler, MultiStats, MultiWatching};
pub use options::{CompilerOptions, RawOptions, WatchOptions};
pub use pipeline::{BuildOutput, BuildPipeline, NoopPipeline, Stats};
pub use plugin::{Plugin, PluginDecl, apply_plugins};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::compiler::{Compiler, Watching};
    pub use crate::environment::{
        EnvironmentPlugin, HostFileSystem, InputFileSystem, OutputFileSystem,
    };
    pub use crate::error::{CompileError, MultiCompilerError, PipelineError};
    pub use crate::factory::{create_compiler, create_multi_compiler};
    pub use crate::hooks::{CompilerHooks, EntryOptions, RunContext};
    pub use crate::multi::{MultiCompiler, MultiStats, MultiWatching};
    pub use crate::options::{CompilerOptions, RawOptions, WatchOptions};
    pub use crate::pipeline::{BuildOutput, BuildPipeline, NoopPipeline, Stats};
    pub use crate::plugin::{Plugin, PluginDecl};
}
