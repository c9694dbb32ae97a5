//! Errors produced by the compiler lifecycle and the multi-compiler
//! orchestrator.

use crucible_hooks::{HookError, RegistrationError};

/// Opaque error type returned by [`BuildPipeline`](crate::BuildPipeline)
/// implementations.
pub type PipelineError = Box<dyn core::error::Error + Send + Sync>;

/// Errors from a single compiler's lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The compiler has been closed; `run` and `watch` are permanently
    /// unavailable.
    #[error("compiler is closed")]
    Closed,

    /// A `run` or `watch` is already in flight.
    #[error("compiler is already running")]
    AlreadyRunning,

    /// A plugin failed to register a tap during application.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// A tap failed during a lifecycle hook call.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// The build pipeline collaborator reported a failure.
    #[error("build pipeline failed: {0}")]
    Pipeline(#[source] PipelineError),

    /// A `shutdown` tap failed while closing the compiler.
    #[error("close failed: {0}")]
    CloseFailed(#[source] HookError),

    /// The build failed and the unconditional close afterwards failed too.
    /// Both outcomes are preserved.
    #[error("build failed: {build}; close also failed: {close}")]
    BuildAndCloseFailed {
        /// The build-phase error.
        build: Box<CompileError>,
        /// The close-phase error.
        close: Box<CompileError>,
    },

    /// The watch task could not be joined.
    #[error("watch task failed: {0}")]
    WatchTask(#[from] tokio::task::JoinError),
}

/// Errors from multi-compiler construction and orchestration.
#[derive(Debug, thiserror::Error)]
pub enum MultiCompilerError {
    /// Two member compilers share a name; dependency edges would be
    /// ambiguous.
    #[error("duplicate compiler name '{name}'")]
    DuplicateName {
        /// The name used more than once.
        name: String,
    },

    /// `set_dependencies` was called for a name no member carries.
    #[error("no compiler named '{name}'")]
    UnknownCompiler {
        /// The unresolved compiler name.
        name: String,
    },

    /// A dependency edge references a name no member carries.
    #[error("compiler '{compiler}' depends on unknown compiler '{dependency}'")]
    UnknownDependency {
        /// The member declaring the dependency.
        compiler: String,
        /// The unresolved dependency name.
        dependency: String,
    },

    /// The dependency edges form a cycle; no member is ever run.
    #[error("dependency cycle involving compilers {names:?}")]
    DependencyCycle {
        /// Members participating in (or downstream of) the cycle.
        names: Vec<String>,
    },

    /// A member compiler failed; dependents were not started.
    #[error("compiler '{name}' failed: {source}")]
    MemberFailed {
        /// Name (or declaration index) of the failing member.
        name: String,
        /// The member's error.
        #[source]
        source: CompileError,
    },

    /// A member's task could not be joined.
    #[error("compiler task failed to join: {0}")]
    Join(#[from] tokio::task::JoinError),
}
