//! Typed extension hooks for Crucible.
//!
//! A hook is a named extension point owning an ordered list of registered
//! callbacks ("taps"). Each hook type fixes one invocation semantics at the
//! type level:
//!
//! | Type | Semantics |
//! |---|---|
//! | [`SyncHook`] | every tap, in order, return values ignored |
//! | [`SyncBailHook`] | first `Some` return short-circuits |
//! | [`SyncWaterfallHook`] | each tap may rewrite the threaded value |
//! | [`SyncLoopHook`] | any `Some` return restarts the pass |
//! | [`AsyncParallelHook`] | all taps concurrently, join on all settled |
//! | [`AsyncParallelBailHook`] | concurrent, first registered `Some` wins |
//! | [`AsyncSeriesHook`] | one tap at a time |
//! | [`AsyncSeriesBailHook`] | series with short-circuit |
//! | [`AsyncSeriesWaterfallHook`] | series with value threading |
//!
//! "No result" is always `None` — there is no shared sentinel value.
//! Argument and return types are declared per hook at catalog definition
//! time, so calling conventions are checked by the compiler rather than
//! probed at run time.
//!
//! # Ordering and snapshots
//!
//! Taps fire in registration order (refinable with `tap_before` /
//! `tap_after`). A call iterates a snapshot of the tap list taken at
//! invocation start; registering during a call only affects later calls.
//!
//! # Example
//!
//! ```
//! use crucible_hooks::SyncWaterfallHook;
//!
//! let hook: SyncWaterfallHook<String> = SyncWaterfallHook::new("asset_path");
//! hook.tap("prefix", |path| Ok(Some(format!("dist/{path}")))).unwrap();
//! hook.tap("keep", |_| Ok(None)).unwrap();
//!
//! let out = hook.call("main.js".to_string()).unwrap();
//! assert_eq!(out, "dist/main.js");
//! ```

use core::pin::Pin;

/// Boxed future type used by async tap callbacks.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Async hook types.
pub mod async_hooks;

/// Hook error types.
pub mod error;

/// Sync hook types.
pub mod sync;

/// Tap storage shared by every hook type.
pub mod tap;

pub use async_hooks::{
    AsyncParallelBailHook, AsyncParallelHook, AsyncSeriesBailHook, AsyncSeriesHook,
    AsyncSeriesWaterfallHook,
};
pub use error::{HookError, RegistrationError, TapError};
pub use sync::{SyncBailHook, SyncHook, SyncLoopHook, SyncWaterfallHook};
pub use tap::Tap;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::async_hooks::*;
    pub use crate::error::*;
    pub use crate::sync::*;
    pub use crate::tap::*;
}
