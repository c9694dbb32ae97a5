//! Tap storage shared by every hook type.
//!
//! A [`Tap`] is one registered callback with the label of the plugin that
//! registered it. [`TapList`] owns the ordered sequence of taps behind a
//! [`RwLock`], so registration goes through `&self` while calls iterate a
//! snapshot taken at invocation start.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::RegistrationError;

// ─────────────────────────────────────────────────────────────────────────────
// Tap
// ─────────────────────────────────────────────────────────────────────────────

/// One registered callback attached to a hook.
///
/// The callback is shared by reference for the hook's lifetime and never
/// mutated after registration.
pub struct Tap<F: ?Sized> {
    /// Identifying name of the registering plugin, for diagnostics.
    pub label: String,
    /// The registered extension code.
    pub callback: Box<F>,
}

// ─────────────────────────────────────────────────────────────────────────────
// TapList
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered, labeled tap storage.
///
/// Insertion order is call order unless a tap is placed relative to another
/// named tap via [`insert_before`](Self::insert_before) /
/// [`insert_after`](Self::insert_after).
pub(crate) struct TapList<F: ?Sized> {
    hook: &'static str,
    taps: RwLock<Vec<Arc<Tap<F>>>>,
}

/// Where to place a new tap relative to the existing list.
enum Position {
    End,
    /// Before the named tap; falls back to the beginning if not found.
    Before(&'static str),
    /// After the named tap; falls back to the end if not found.
    After(&'static str),
}

impl<F: ?Sized> TapList<F> {
    pub(crate) fn new(hook: &'static str) -> Self {
        Self {
            hook,
            taps: RwLock::new(Vec::new()),
        }
    }

    /// The owning hook's name.
    pub(crate) fn hook(&self) -> &'static str {
        self.hook
    }

    pub(crate) fn insert(
        &self,
        label: impl Into<String>,
        callback: Box<F>,
    ) -> Result<(), RegistrationError> {
        self.insert_at(Position::End, label, callback)
    }

    pub(crate) fn insert_before(
        &self,
        anchor: &'static str,
        label: impl Into<String>,
        callback: Box<F>,
    ) -> Result<(), RegistrationError> {
        self.insert_at(Position::Before(anchor), label, callback)
    }

    pub(crate) fn insert_after(
        &self,
        anchor: &'static str,
        label: impl Into<String>,
        callback: Box<F>,
    ) -> Result<(), RegistrationError> {
        self.insert_at(Position::After(anchor), label, callback)
    }

    fn insert_at(
        &self,
        position: Position,
        label: impl Into<String>,
        callback: Box<F>,
    ) -> Result<(), RegistrationError> {
        let label = label.into();
        let mut taps = self.taps.write();

        if taps.iter().any(|tap| tap.label == label) {
            return Err(RegistrationError::DuplicateLabel {
                hook: self.hook,
                label,
            });
        }

        let index = match position {
            Position::End => taps.len(),
            Position::Before(anchor) => taps
                .iter()
                .position(|tap| tap.label == anchor)
                .unwrap_or(0),
            Position::After(anchor) => taps
                .iter()
                .position(|tap| tap.label == anchor)
                .map(|i| i + 1)
                .unwrap_or(taps.len()),
        };

        taps.insert(index, Arc::new(Tap { label, callback }));
        Ok(())
    }

    /// The tap list as of now. Calls iterate this snapshot, so taps
    /// registered while a call is in flight only affect later calls.
    pub(crate) fn snapshot(&self) -> Vec<Arc<Tap<F>>> {
        self.taps.read().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.taps.read().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.taps.read().is_empty()
    }

    pub(crate) fn contains(&self, label: &str) -> bool {
        self.taps.read().iter().any(|tap| tap.label == label)
    }

    pub(crate) fn labels(&self) -> Vec<String> {
        self.taps.read().iter().map(|tap| tap.label.clone()).collect()
    }
}
