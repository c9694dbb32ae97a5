//! Synchronous hook types.
//!
//! All four kinds execute entirely on the calling thread, in registration
//! order, without suspension. A tap returning `Err` aborts the remaining taps
//! of that call and propagates as [`HookError`].

use crate::error::{HookError, RegistrationError, TapError};
use crate::tap::TapList;

type SyncTapFn<A> = dyn Fn(&A) -> Result<(), TapError> + Send + Sync;
type BailTapFn<A, R> = dyn Fn(&A) -> Result<Option<R>, TapError> + Send + Sync;
type WaterfallTapFn<A> = dyn Fn(&A) -> Result<Option<A>, TapError> + Send + Sync;
type LoopTapFn<A> = dyn Fn(&A) -> Result<Option<()>, TapError> + Send + Sync;

// ─────────────────────────────────────────────────────────────────────────────
// SyncHook
// ─────────────────────────────────────────────────────────────────────────────

/// Invokes every tap in order with the same arguments; return values carry no
/// meaning beyond success.
///
/// # Example
///
/// ```
/// use crucible_hooks::SyncHook;
///
/// let hook: SyncHook<u32> = SyncHook::new("environment");
/// hook.tap("logger", |n| {
///     assert_eq!(*n, 7);
///     Ok(())
/// })
/// .unwrap();
/// hook.call(&7).unwrap();
/// ```
pub struct SyncHook<A: 'static> {
    taps: TapList<SyncTapFn<A>>,
}

impl<A: 'static> SyncHook<A> {
    /// Creates an empty hook with the given name.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            taps: TapList::new(name),
        }
    }

    /// The hook's name, unique within its owning catalog.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.taps.hook()
    }

    /// Registers a callback at the end of the tap list.
    pub fn tap<F>(&self, label: impl Into<String>, callback: F) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Result<(), TapError> + Send + Sync + 'static,
    {
        self.taps.insert(label, Box::new(callback))
    }

    /// Registers a callback before the tap named `anchor` (or first, if the
    /// anchor is not registered).
    pub fn tap_before<F>(
        &self,
        anchor: &'static str,
        label: impl Into<String>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Result<(), TapError> + Send + Sync + 'static,
    {
        self.taps.insert_before(anchor, label, Box::new(callback))
    }

    /// Registers a callback after the tap named `anchor` (or last, if the
    /// anchor is not registered).
    pub fn tap_after<F>(
        &self,
        anchor: &'static str,
        label: impl Into<String>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Result<(), TapError> + Send + Sync + 'static,
    {
        self.taps.insert_after(anchor, label, Box::new(callback))
    }

    /// Invokes every tap in order. The first failing tap aborts the rest.
    pub fn call(&self, args: &A) -> Result<(), HookError> {
        for tap in self.taps.snapshot() {
            (tap.callback)(args)
                .map_err(|err| HookError::new(self.name(), tap.label.clone(), err))?;
        }
        Ok(())
    }

    /// Number of registered taps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Returns true if no taps are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Returns true if a tap with the given label is registered.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.taps.contains(label)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SyncBailHook
// ─────────────────────────────────────────────────────────────────────────────

/// Invokes taps in order until one returns `Some`; that value becomes the
/// call's result and the remaining taps are skipped.
pub struct SyncBailHook<A: 'static, R: 'static> {
    taps: TapList<BailTapFn<A, R>>,
}

impl<A: 'static, R: 'static> SyncBailHook<A, R> {
    /// Creates an empty hook with the given name.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            taps: TapList::new(name),
        }
    }

    /// The hook's name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.taps.hook()
    }

    /// Registers a callback at the end of the tap list.
    pub fn tap<F>(&self, label: impl Into<String>, callback: F) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Result<Option<R>, TapError> + Send + Sync + 'static,
    {
        self.taps.insert(label, Box::new(callback))
    }

    /// Registers a callback before the tap named `anchor`.
    pub fn tap_before<F>(
        &self,
        anchor: &'static str,
        label: impl Into<String>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Result<Option<R>, TapError> + Send + Sync + 'static,
    {
        self.taps.insert_before(anchor, label, Box::new(callback))
    }

    /// Registers a callback after the tap named `anchor`.
    pub fn tap_after<F>(
        &self,
        anchor: &'static str,
        label: impl Into<String>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Result<Option<R>, TapError> + Send + Sync + 'static,
    {
        self.taps.insert_after(anchor, label, Box::new(callback))
    }

    /// Invokes taps in order; the first `Some` return short-circuits.
    ///
    /// Returns `None` when every tap declined to produce a result.
    pub fn call(&self, args: &A) -> Result<Option<R>, HookError> {
        for tap in self.taps.snapshot() {
            let result = (tap.callback)(args)
                .map_err(|err| HookError::new(self.name(), tap.label.clone(), err))?;
            if result.is_some() {
                return Ok(result);
            }
        }
        Ok(None)
    }

    /// Number of registered taps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Returns true if no taps are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Returns true if a tap with the given label is registered.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.taps.contains(label)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SyncWaterfallHook
// ─────────────────────────────────────────────────────────────────────────────

/// Threads a value through the taps in order.
///
/// Each tap receives the current value and may replace it by returning
/// `Some(next)`; returning `None` leaves the value unchanged. The final
/// threaded value is the call's result.
pub struct SyncWaterfallHook<A: 'static> {
    taps: TapList<WaterfallTapFn<A>>,
}

impl<A: 'static> SyncWaterfallHook<A> {
    /// Creates an empty hook with the given name.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            taps: TapList::new(name),
        }
    }

    /// The hook's name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.taps.hook()
    }

    /// Registers a callback at the end of the tap list.
    pub fn tap<F>(&self, label: impl Into<String>, callback: F) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Result<Option<A>, TapError> + Send + Sync + 'static,
    {
        self.taps.insert(label, Box::new(callback))
    }

    /// Registers a callback before the tap named `anchor`.
    pub fn tap_before<F>(
        &self,
        anchor: &'static str,
        label: impl Into<String>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Result<Option<A>, TapError> + Send + Sync + 'static,
    {
        self.taps.insert_before(anchor, label, Box::new(callback))
    }

    /// Registers a callback after the tap named `anchor`.
    pub fn tap_after<F>(
        &self,
        anchor: &'static str,
        label: impl Into<String>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Result<Option<A>, TapError> + Send + Sync + 'static,
    {
        self.taps.insert_after(anchor, label, Box::new(callback))
    }

    /// Threads `init` through every tap and returns the final value.
    pub fn call(&self, init: A) -> Result<A, HookError> {
        let mut current = init;
        for tap in self.taps.snapshot() {
            let next = (tap.callback)(&current)
                .map_err(|err| HookError::new(self.name(), tap.label.clone(), err))?;
            if let Some(next) = next {
                current = next;
            }
        }
        Ok(current)
    }

    /// Number of registered taps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Returns true if no taps are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Returns true if a tap with the given label is registered.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.taps.contains(label)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SyncLoopHook
// ─────────────────────────────────────────────────────────────────────────────

/// Invokes taps in repeated passes.
///
/// A tap returning `Some(())` restarts the pass from the first tap; the call
/// returns once a complete pass produced `None` from every tap. Guarding
/// against a never-terminating tap chain is the callers' responsibility.
pub struct SyncLoopHook<A: 'static> {
    taps: TapList<LoopTapFn<A>>,
}

impl<A: 'static> SyncLoopHook<A> {
    /// Creates an empty hook with the given name.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            taps: TapList::new(name),
        }
    }

    /// The hook's name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.taps.hook()
    }

    /// Registers a callback at the end of the tap list.
    pub fn tap<F>(&self, label: impl Into<String>, callback: F) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Result<Option<()>, TapError> + Send + Sync + 'static,
    {
        self.taps.insert(label, Box::new(callback))
    }

    /// Registers a callback before the tap named `anchor`.
    pub fn tap_before<F>(
        &self,
        anchor: &'static str,
        label: impl Into<String>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Result<Option<()>, TapError> + Send + Sync + 'static,
    {
        self.taps.insert_before(anchor, label, Box::new(callback))
    }

    /// Registers a callback after the tap named `anchor`.
    pub fn tap_after<F>(
        &self,
        anchor: &'static str,
        label: impl Into<String>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Result<Option<()>, TapError> + Send + Sync + 'static,
    {
        self.taps.insert_after(anchor, label, Box::new(callback))
    }

    /// Runs passes over the taps until one completes with every tap
    /// returning `None`.
    pub fn call(&self, args: &A) -> Result<(), HookError> {
        let taps = self.taps.snapshot();
        'pass: loop {
            for tap in &taps {
                let restart = (tap.callback)(args)
                    .map_err(|err| HookError::new(self.name(), tap.label.clone(), err))?;
                if restart.is_some() {
                    continue 'pass;
                }
            }
            return Ok(());
        }
    }

    /// Number of registered taps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Returns true if no taps are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Returns true if a tap with the given label is registered.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.taps.contains(label)
    }
}
