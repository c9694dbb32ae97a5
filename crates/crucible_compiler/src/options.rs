//! Compiler configuration.
//!
//! Users hand in [`RawOptions`] with everything optional; the factory runs it
//! through [`normalize_options`], [`apply_base_defaults`] (before plugin
//! application) and [`apply_defaults`] (after plugin application, so plugins
//! observe the user's values rather than filled-in defaults). The resulting
//! [`CompilerOptions`] is read-only for the compiler's lifetime.

use core::time::Duration;
use std::path::PathBuf;

use crate::plugin::PluginDecl;

/// User-supplied configuration, everything optional.
#[derive(Default)]
pub struct RawOptions {
    /// Compiler name; required for members of a multi-compiler that others
    /// depend on.
    pub name: Option<String>,
    /// Base directory for relative paths. Defaults to the current directory.
    pub context: Option<PathBuf>,
    /// Entry point specifiers.
    pub entries: Vec<String>,
    /// Directory build outputs are written under.
    pub output_dir: Option<PathBuf>,
    /// Whether this configuration is intended for watch mode.
    pub watch: bool,
    /// Watch-mode tuning.
    pub watch_options: Option<WatchOptions>,
    /// Emit per-build timing via the `done` hook.
    pub profile: bool,
    /// Plugins to apply, in declaration order. `None` entries are skipped,
    /// so conditional plugin lists need no filtering at the call site.
    pub plugins: Vec<Option<PluginDecl>>,
    /// Names of sibling compilers this one depends on (multi-compiler only).
    pub dependencies: Vec<String>,
}

/// Normalized configuration, read-only after construction.
#[derive(Clone, Debug)]
pub struct CompilerOptions {
    /// Compiler name, if any.
    pub name: Option<String>,
    /// Base directory for relative paths.
    pub context: PathBuf,
    /// Entry point specifiers.
    pub entries: Vec<String>,
    /// Directory build outputs are written under.
    pub output_dir: PathBuf,
    /// Whether this configuration is intended for watch mode.
    pub watch: bool,
    /// Watch-mode tuning.
    pub watch_options: WatchOptions,
    /// Emit per-build timing via the `done` hook.
    pub profile: bool,
}

/// Watch-mode tuning knobs.
#[derive(Clone, Debug)]
pub struct WatchOptions {
    /// Interval between rebuild cycles.
    pub poll_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
        }
    }
}

/// Maps user input onto the full option struct without filling defaults
/// that plugins might want to observe as absent.
///
/// Plugins and dependency edges are not part of the normalized options; the
/// factory peels them off first.
#[must_use]
pub fn normalize_options(raw: RawOptions) -> CompilerOptions {
    CompilerOptions {
        name: raw.name,
        context: raw.context.unwrap_or_default(),
        entries: raw.entries,
        output_dir: raw.output_dir.unwrap_or_default(),
        watch: raw.watch,
        watch_options: raw.watch_options.unwrap_or_default(),
        profile: raw.profile,
    }
}

/// Defaults the compiler object itself needs before any plugin runs.
pub fn apply_base_defaults(options: &mut CompilerOptions) {
    if options.context.as_os_str().is_empty() {
        options.context = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }
}

/// Remaining defaults, resolved after plugin application so plugins saw the
/// user's values.
pub fn apply_defaults(options: &mut CompilerOptions) {
    if options.entries.is_empty() {
        options.entries.push("./src".to_string());
    }
    if options.output_dir.as_os_str().is_empty() {
        options.output_dir = options.context.join("dist");
    }
    if options.watch_options.poll_interval.is_zero() {
        options.watch_options.poll_interval = WatchOptions::default().poll_interval;
    }
}
