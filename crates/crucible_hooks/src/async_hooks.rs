//! Asynchronous hook types.
//!
//! These are the only suspension points in the hook engine. The `Series`
//! kinds suspend between taps: each tap starts only after the previous one
//! settled. The `Parallel` kinds dispatch every tap of the snapshot in
//! registration order and join once all of them have settled — a failing tap
//! never leaves a sibling's work unobserved.
//!
//! Outcome selection when several parallel taps fail or produce values is
//! deterministic: the first error (or, for the bail variant, the first value)
//! in registration order wins once everything has settled.
//!
//! Async callbacks receive the arguments by reference and return an owned
//! future: whatever the future needs is cloned out while the callback body
//! runs synchronously.
//!
//! # Example
//!
//! ```
//! use crucible_hooks::AsyncSeriesHook;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let hook: AsyncSeriesHook<String> = AsyncSeriesHook::new("before_run");
//! hook.tap("emitter", |name: &String| {
//!     let name = name.clone();
//!     async move {
//!         assert_eq!(name, "main");
//!         Ok(())
//!     }
//! })
//! .unwrap();
//! hook.call(&"main".to_string()).await.unwrap();
//! # });
//! ```

use futures::future::join_all;

use crate::BoxFuture;
use crate::error::{HookError, RegistrationError, TapError};
use crate::tap::TapList;

type AsyncTapFn<A> = dyn Fn(&A) -> BoxFuture<'static, Result<(), TapError>> + Send + Sync;
type AsyncBailTapFn<A, R> =
    dyn Fn(&A) -> BoxFuture<'static, Result<Option<R>, TapError>> + Send + Sync;
type AsyncWaterfallTapFn<A> =
    dyn Fn(&A) -> BoxFuture<'static, Result<Option<A>, TapError>> + Send + Sync;

fn boxed<A, F, Fut, T>(callback: F) -> Box<dyn Fn(&A) -> BoxFuture<'static, T> + Send + Sync>
where
    A: 'static,
    T: 'static,
    F: Fn(&A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    Box::new(move |args: &A| -> BoxFuture<'static, T> { Box::pin(callback(args)) })
}

// ─────────────────────────────────────────────────────────────────────────────
// AsyncParallelHook
// ─────────────────────────────────────────────────────────────────────────────

/// Invokes all taps concurrently; completes once every tap has settled.
///
/// If any tap fails, the call fails with the first failure in registration
/// order — after all concurrent work has finished.
pub struct AsyncParallelHook<A: 'static> {
    taps: TapList<AsyncTapFn<A>>,
}

impl<A: 'static> AsyncParallelHook<A> {
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
    pub fn tap<F, Fut>(
        &self,
        label: impl Into<String>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TapError>> + Send + 'static,
    {
        self.taps.insert(label, boxed(callback))
    }

    /// Registers a callback before the tap named `anchor` (or first, if the
    /// anchor is not registered).
    pub fn tap_before<F, Fut>(
        &self,
        anchor: &'static str,
        label: impl Into<String>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TapError>> + Send + 'static,
    {
        self.taps.insert_before(anchor, label, boxed(callback))
    }

    /// Registers a callback after the tap named `anchor` (or last, if the
    /// anchor is not registered).
    pub fn tap_after<F, Fut>(
        &self,
        anchor: &'static str,
        label: impl Into<String>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TapError>> + Send + 'static,
    {
        self.taps.insert_after(anchor, label, boxed(callback))
    }

    /// Dispatches every tap concurrently and waits for all of them.
    pub async fn call(&self, args: &A) -> Result<(), HookError> {
        let taps = self.taps.snapshot();
        let results = join_all(taps.iter().map(|tap| (tap.callback)(args))).await;

        for (tap, result) in taps.iter().zip(results) {
            result.map_err(|err| HookError::new(self.name(), tap.label.clone(), err))?;
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
}

// ─────────────────────────────────────────────────────────────────────────────
// AsyncParallelBailHook
// ─────────────────────────────────────────────────────────────────────────────

/// Concurrent invocation with bail semantics.
///
/// Every tap of the snapshot runs to completion; the call's result is the
/// first error or `Some` value in registration order, and the remaining
/// results are discarded.
pub struct AsyncParallelBailHook<A: 'static, R: 'static> {
    taps: TapList<AsyncBailTapFn<A, R>>,
}

impl<A: 'static, R: 'static> AsyncParallelBailHook<A, R> {
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
    pub fn tap<F, Fut>(
        &self,
        label: impl Into<String>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<R>, TapError>> + Send + 'static,
    {
        self.taps.insert(label, boxed(callback))
    }

    /// Dispatches every tap concurrently; the first `Some` in registration
    /// order becomes the result once all taps have settled.
    pub async fn call(&self, args: &A) -> Result<Option<R>, HookError> {
        let taps = self.taps.snapshot();
        let results = join_all(taps.iter().map(|tap| (tap.callback)(args))).await;

        for (tap, result) in taps.iter().zip(results) {
            match result {
                Err(err) => return Err(HookError::new(self.name(), tap.label.clone(), err)),
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => {}
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
}

// ─────────────────────────────────────────────────────────────────────────────
// AsyncSeriesHook
// ─────────────────────────────────────────────────────────────────────────────

/// Invokes taps one at a time; each starts only after the previous settled.
///
/// A failing tap aborts the remaining taps and propagates.
pub struct AsyncSeriesHook<A: 'static> {
    taps: TapList<AsyncTapFn<A>>,
}

impl<A: 'static> AsyncSeriesHook<A> {
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
    pub fn tap<F, Fut>(
        &self,
        label: impl Into<String>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TapError>> + Send + 'static,
    {
        self.taps.insert(label, boxed(callback))
    }

    /// Registers a callback before the tap named `anchor`.
    pub fn tap_before<F, Fut>(
        &self,
        anchor: &'static str,
        label: impl Into<String>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TapError>> + Send + 'static,
    {
        self.taps.insert_before(anchor, label, boxed(callback))
    }

    /// Registers a callback after the tap named `anchor`.
    pub fn tap_after<F, Fut>(
        &self,
        anchor: &'static str,
        label: impl Into<String>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TapError>> + Send + 'static,
    {
        self.taps.insert_after(anchor, label, boxed(callback))
    }

    /// Awaits every tap in order. The first failing tap aborts the rest.
    pub async fn call(&self, args: &A) -> Result<(), HookError> {
        for tap in self.taps.snapshot() {
            (tap.callback)(args)
                .await
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
// AsyncSeriesBailHook
// ─────────────────────────────────────────────────────────────────────────────

/// Series invocation with bail semantics: the first `Some` return
/// short-circuits the remaining taps.
pub struct AsyncSeriesBailHook<A: 'static, R: 'static> {
    taps: TapList<AsyncBailTapFn<A, R>>,
}

impl<A: 'static, R: 'static> AsyncSeriesBailHook<A, R> {
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
    pub fn tap<F, Fut>(
        &self,
        label: impl Into<String>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<R>, TapError>> + Send + 'static,
    {
        self.taps.insert(label, boxed(callback))
    }

    /// Awaits taps in order; the first `Some` return short-circuits.
    pub async fn call(&self, args: &A) -> Result<Option<R>, HookError> {
        for tap in self.taps.snapshot() {
            let result = (tap.callback)(args)
                .await
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
}

// ─────────────────────────────────────────────────────────────────────────────
// AsyncSeriesWaterfallHook
// ─────────────────────────────────────────────────────────────────────────────

/// Series invocation with waterfall value threading; each step may suspend.
pub struct AsyncSeriesWaterfallHook<A: 'static> {
    taps: TapList<AsyncWaterfallTapFn<A>>,
}

impl<A: 'static> AsyncSeriesWaterfallHook<A> {
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
    pub fn tap<F, Fut>(
        &self,
        label: impl Into<String>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<A>, TapError>> + Send + 'static,
    {
        self.taps.insert(label, boxed(callback))
    }

    /// Threads `init` through every tap in order and returns the final value.
    pub async fn call(&self, init: A) -> Result<A, HookError> {
        let mut current = init;
        for tap in self.taps.snapshot() {
            let next = (tap.callback)(&current)
                .await
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn parallel_failure_waits_for_siblings() {
        let hook: AsyncParallelHook<()> = AsyncParallelHook::new("test");
        let finished = Arc::new(AtomicUsize::new(0));

        hook.tap("a", |_: &()| async { Err::<(), TapError>("a failed".into()) })
            .unwrap();

        let finished_clone = Arc::clone(&finished);
        hook.tap("b", move |_: &()| {
            let finished = Arc::clone(&finished_clone);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .unwrap();

        let err = hook.call(&()).await.unwrap_err();
        assert_eq!(err.label, "a");
        // b was not orphaned: it ran to completion before the error surfaced.
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn parallel_taps_run_concurrently() {
        let hook: AsyncParallelHook<()> = AsyncParallelHook::new("test");
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let tx = Arc::new(Mutex::new(Some(tx)));
        let rx = Arc::new(Mutex::new(Some(rx)));

        // If dispatch were serial, "waiter" would stall waiting on
        // "signaler", which is registered after it.
        let rx_slot = Arc::clone(&rx);
        hook.tap("waiter", move |_: &()| {
            let rx = rx_slot.lock().unwrap().take();
            async move {
                if let Some(rx) = rx {
                    let _ = rx.await;
                }
                Ok(())
            }
        })
        .unwrap();

        let tx_slot = Arc::clone(&tx);
        hook.tap("signaler", move |_: &()| {
            let tx = tx_slot.lock().unwrap().take();
            async move {
                if let Some(tx) = tx {
                    let _ = tx.send(());
                }
                Ok(())
            }
        })
        .unwrap();

        tokio::time::timeout(Duration::from_secs(1), hook.call(&()))
            .await
            .expect("parallel taps must not serialize")
            .unwrap();
    }

    #[tokio::test]
    async fn parallel_bail_first_registered_value_wins() {
        let hook: AsyncParallelBailHook<(), &'static str> = AsyncParallelBailHook::new("test");

        // Registered first but slow: still wins over the fast later tap.
        hook.tap("slow", |_: &()| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(Some("slow"))
        })
        .unwrap();
        hook.tap("fast", |_: &()| async { Ok(Some("fast")) })
            .unwrap();

        assert_eq!(hook.call(&()).await.unwrap(), Some("slow"));
    }

    #[tokio::test]
    async fn parallel_bail_none_when_all_decline() {
        let hook: AsyncParallelBailHook<(), u32> = AsyncParallelBailHook::new("test");
        hook.tap("a", |_: &()| async { Ok(None) }).unwrap();
        hook.tap("b", |_: &()| async { Ok(None) }).unwrap();

        assert_eq!(hook.call(&()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn series_taps_do_not_overlap() {
        let hook: AsyncSeriesHook<()> = AsyncSeriesHook::new("test");
        let order = Arc::new(Mutex::new(Vec::new()));

        let o = Arc::clone(&order);
        hook.tap("first", move |_: &()| {
            let o = Arc::clone(&o);
            async move {
                o.lock().unwrap().push("first:start");
                tokio::time::sleep(Duration::from_millis(10)).await;
                o.lock().unwrap().push("first:end");
                Ok(())
            }
        })
        .unwrap();

        let o = Arc::clone(&order);
        hook.tap("second", move |_: &()| {
            let o = Arc::clone(&o);
            async move {
                o.lock().unwrap().push("second:start");
                Ok(())
            }
        })
        .unwrap();

        hook.call(&()).await.unwrap();
        assert_eq!(
            *order.lock().unwrap(),
            vec!["first:start", "first:end", "second:start"]
        );
    }

    #[tokio::test]
    async fn series_failure_aborts_remaining() {
        let hook: AsyncSeriesHook<()> = AsyncSeriesHook::new("test");
        let later = Arc::new(AtomicUsize::new(0));

        hook.tap("fails", |_: &()| async {
            Err::<(), TapError>("series tap failed".into())
        })
        .unwrap();
        let later_clone = Arc::clone(&later);
        hook.tap("after", move |_: &()| {
            let later = Arc::clone(&later_clone);
            async move {
                later.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .unwrap();

        let err = hook.call(&()).await.unwrap_err();
        assert_eq!(err.label, "fails");
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn series_bail_short_circuits() {
        let hook: AsyncSeriesBailHook<u32, u32> = AsyncSeriesBailHook::new("test");
        let later = Arc::new(AtomicUsize::new(0));

        hook.tap("f", |n: &u32| {
            let n = *n;
            async move { Ok(Some(n + 1)) }
        })
        .unwrap();
        let later_clone = Arc::clone(&later);
        hook.tap("g", move |_: &u32| {
            let later = Arc::clone(&later_clone);
            async move {
                later.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }
        })
        .unwrap();

        assert_eq!(hook.call(&41).await.unwrap(), Some(42));
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn series_waterfall_threads_values() {
        let hook: AsyncSeriesWaterfallHook<String> = AsyncSeriesWaterfallHook::new("test");

        hook.tap("prefix", |s: &String| {
            let s = s.clone();
            async move { Ok(Some(format!("dist/{s}"))) }
        })
        .unwrap();
        hook.tap("keep", |_: &String| async { Ok(None) }).unwrap();
        hook.tap("suffix", |s: &String| {
            let s = s.clone();
            async move { Ok(Some(format!("{s}?v=1"))) }
        })
        .unwrap();

        assert_eq!(
            hook.call("main.js".to_string()).await.unwrap(),
            "dist/main.js?v=1"
        );
    }

    #[tokio::test]
    async fn empty_async_hooks_complete_immediately() {
        let series: AsyncSeriesHook<()> = AsyncSeriesHook::new("series");
        let parallel: AsyncParallelHook<()> = AsyncParallelHook::new("parallel");

        series.call(&()).await.unwrap();
        parallel.call(&()).await.unwrap();
    }
}
