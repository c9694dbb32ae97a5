//! Filesystem wiring.
//!
//! The compiler reads and writes through the [`InputFileSystem`] and
//! [`OutputFileSystem`] handles rather than touching `std::fs` directly, so
//! embeddings can substitute virtual or recording filesystems.
//! [`EnvironmentPlugin`] wires the host implementations before any user
//! plugin is applied: plugins tapping `after_environment` (or anything
//! later) are guaranteed the handles exist.

use std::io;
use std::path::Path;
use std::sync::Arc;

use crucible_hooks::RegistrationError;

use crate::Compiler;
use crate::plugin::Plugin;

/// Read-side filesystem handle.
pub trait InputFileSystem: Send + Sync {
    /// Reads the full contents of a file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Write-side filesystem handle.
pub trait OutputFileSystem: Send + Sync {
    /// Creates a directory and its missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Writes a file, replacing any existing contents.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// Host filesystem over `std::fs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostFileSystem;

impl InputFileSystem for HostFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

impl OutputFileSystem for HostFileSystem {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        std::fs::write(path, contents)
    }
}

/// Wires [`HostFileSystem`] handles onto the compiler.
///
/// Applied by the factory before user plugins, so they may replace the
/// handles but never observe them missing.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvironmentPlugin;

impl Plugin for EnvironmentPlugin {
    fn apply(&self, compiler: &mut Compiler) -> Result<(), RegistrationError> {
        compiler.set_input_filesystem(Arc::new(HostFileSystem));
        compiler.set_output_filesystem(Arc::new(HostFileSystem));
        compiler.hooks.environment.tap("EnvironmentPlugin", |_| {
            tracing::debug!("host filesystem handles wired");
            Ok(())
        })
    }

    fn name(&self) -> &str {
        "EnvironmentPlugin"
    }
}
