//! # Crucible Internal Library
//!
//! Re-exports the core Crucible crates for convenience.

/// Layer 1: typed hook engine.
pub use crucible_hooks;

/// Layer 2: compiler lifecycle and orchestration.
pub use crucible_compiler;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crucible_compiler::prelude::*;
    pub use crucible_hooks::prelude::*;
}
