//! A hook-based plugin orchestration kernel for build tooling in Rust.
//!

pub use crucible_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crucible_internal::prelude::*;
}
