//! Errors produced by tap registration and hook invocation.

/// Error type returned by tap callbacks.
///
/// Plugins surface their own error types through this boxed form; the hook
/// engine never inspects it beyond attaching diagnostics.
pub type TapError = Box<dyn core::error::Error + Send + Sync>;

/// A tap failed during a hook call.
///
/// Carries the hook name and the label of the failing tap so diagnostics can
/// point at the responsible plugin. For synchronous and series kinds the
/// remaining taps of that call were not invoked; for parallel kinds every tap
/// of the snapshot was allowed to settle before this error was delivered.
#[derive(Debug, thiserror::Error)]
#[error("tap '{label}' on hook '{hook}' failed: {source}")]
pub struct HookError {
    /// Name of the hook that was being called.
    pub hook: &'static str,
    /// Label of the tap whose callback failed.
    pub label: String,
    /// The callback's error.
    #[source]
    pub source: TapError,
}

impl HookError {
    pub(crate) fn new(hook: &'static str, label: impl Into<String>, source: TapError) -> Self {
        Self {
            hook,
            label: label.into(),
            source,
        }
    }
}

/// Errors that can occur while registering a tap.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// A tap with this label already exists on the hook.
    #[error("tap '{label}' already registered on hook '{hook}'")]
    DuplicateLabel {
        /// Name of the hook.
        hook: &'static str,
        /// The duplicate tap label.
        label: String,
    },
}
