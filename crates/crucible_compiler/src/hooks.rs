//! The compiler's hook catalog.
//!
//! [`CompilerHooks`] is constructed once with the compiler and its fields are
//! fixed: plugins tap existing hooks, they never add new ones. Each field's
//! type encodes the invocation semantics and the argument/return contract,
//! so a plugin tapping the wrong way is a compile error rather than a
//! runtime surprise.

use std::path::PathBuf;

use crucible_hooks::{AsyncSeriesHook, SyncBailHook, SyncHook, SyncWaterfallHook};

use crate::pipeline::Stats;

/// Arguments for the `entry_option` hook.
#[derive(Clone, Debug)]
pub struct EntryOptions {
    /// Base directory entries are resolved against.
    pub context: PathBuf,
    /// Entry point specifiers.
    pub entries: Vec<String>,
}

/// Arguments for the `before_run` / `run` / `watch_run` hooks.
#[derive(Clone, Debug)]
pub struct RunContext {
    /// Name of the compiler starting a build cycle.
    pub name: Option<String>,
    /// Entry point specifiers for this cycle.
    pub entries: Vec<String>,
}

/// Every extension point the compiler exposes, in lifecycle order.
///
/// Construction-time hooks (`environment` through `initialize`) fire during
/// [`create_compiler`](crate::create_compiler); the rest fire from `run`,
/// `watch` and `close`.
pub struct CompilerHooks {
    /// Filesystem handles have been wired.
    pub environment: SyncHook<()>,
    /// Environment setup is complete; plugins tapping later hooks may rely
    /// on the filesystem handles.
    pub after_environment: SyncHook<()>,
    /// All plugins (user and internal) have been applied.
    pub after_plugins: SyncHook<()>,
    /// Construction is complete; last hook of the factory sequence.
    pub initialize: SyncHook<()>,
    /// A plugin may claim entry handling by returning `Some(true)`.
    pub entry_option: SyncBailHook<EntryOptions, bool>,
    /// Fires before each `run` build cycle.
    pub before_run: AsyncSeriesHook<RunContext>,
    /// Fires after `before_run`, immediately before the pipeline.
    pub run: AsyncSeriesHook<RunContext>,
    /// Fires before each watch-mode build cycle.
    pub watch_run: AsyncSeriesHook<RunContext>,
    /// A `Some(true)` after a pipeline pass schedules another pass in the
    /// same build cycle.
    pub need_additional_pass: SyncBailHook<(), bool>,
    /// The build cycle produced stats; async observers run here.
    pub done: AsyncSeriesHook<Stats>,
    /// Last observation point of a successful build cycle.
    pub after_done: SyncHook<Stats>,
    /// A build cycle failed; receives the rendered error.
    pub failed: SyncHook<String>,
    /// Rewrites output path templates; see
    /// [`Compiler::asset_path`](crate::Compiler::asset_path).
    pub asset_path: SyncWaterfallHook<String>,
    /// Watch mode detected (or polled into) a new cycle.
    pub invalid: SyncHook<()>,
    /// Watch mode is shutting down.
    pub watch_close: SyncHook<()>,
    /// The compiler is closing; fires exactly once per compiler.
    pub shutdown: AsyncSeriesHook<()>,
}

impl CompilerHooks {
    /// Creates the full catalog with empty tap lists.
    #[must_use]
    pub fn new() -> Self {
        Self {
            environment: SyncHook::new("environment"),
            after_environment: SyncHook::new("after_environment"),
            after_plugins: SyncHook::new("after_plugins"),
            initialize: SyncHook::new("initialize"),
            entry_option: SyncBailHook::new("entry_option"),
            before_run: AsyncSeriesHook::new("before_run"),
            run: AsyncSeriesHook::new("run"),
            watch_run: AsyncSeriesHook::new("watch_run"),
            need_additional_pass: SyncBailHook::new("need_additional_pass"),
            done: AsyncSeriesHook::new("done"),
            after_done: SyncHook::new("after_done"),
            failed: SyncHook::new("failed"),
            asset_path: SyncWaterfallHook::new("asset_path"),
            invalid: SyncHook::new("invalid"),
            watch_close: SyncHook::new("watch_close"),
            shutdown: AsyncSeriesHook::new("shutdown"),
        }
    }
}

impl Default for CompilerHooks {
    fn default() -> Self {
        Self::new()
    }
}
