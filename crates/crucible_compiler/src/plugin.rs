//! Plugin declaration and application.
//!
//! A plugin extends the compiler by tapping hooks from its
//! [`CompilerHooks`](crate::CompilerHooks) catalog during application.
//! Configuration accepts two declaration forms, resolved once at declaration
//! time rather than probed at apply time: a bare function, or a value
//! implementing [`Plugin`].
//!
//! # Example
//!
//! ```ignore
//! struct BannerPlugin;
//!
//! impl Plugin for BannerPlugin {
//!     fn apply(&self, compiler: &mut Compiler) -> Result<(), RegistrationError> {
//!         compiler
//!             .hooks
//!             .asset_path
//!             .tap("BannerPlugin", |path| Ok(Some(format!("banner/{path}"))))
//!     }
//! }
//!
//! let options = RawOptions {
//!     plugins: vec![Some(PluginDecl::applier(BannerPlugin))],
//!     ..RawOptions::default()
//! };
//! ```

use crucible_hooks::RegistrationError;

use crate::Compiler;

/// A compiler extension.
pub trait Plugin: Send + Sync {
    /// Registers this plugin's taps on the compiler's hooks.
    ///
    /// Runs exactly once, during compiler construction. A registration
    /// failure aborts construction and is reported to the factory caller.
    fn apply(&self, compiler: &mut Compiler) -> Result<(), RegistrationError>;

    /// Identifying name, used in application logs.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }
}

type PluginFn = dyn Fn(&mut Compiler) -> Result<(), RegistrationError> + Send + Sync;

/// One declared plugin, in either declaration form.
///
/// The form is fixed when the declaration is built; application handles both
/// uniformly.
pub enum PluginDecl {
    /// A bare function, invoked with the compiler.
    Func(Box<PluginFn>),
    /// A [`Plugin`] value whose `apply` is invoked with the compiler.
    Applier(Box<dyn Plugin>),
}

impl PluginDecl {
    /// Declares a function-form plugin.
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&mut Compiler) -> Result<(), RegistrationError> + Send + Sync + 'static,
    {
        Self::Func(Box::new(f))
    }

    /// Declares an applier-form plugin.
    pub fn applier<P: Plugin + 'static>(plugin: P) -> Self {
        Self::Applier(Box::new(plugin))
    }
}

/// Applies declared plugins in declaration order.
///
/// `None` entries are skipped, so conditionally assembled plugin lists need
/// no filtering. The first registration failure aborts application.
pub fn apply_plugins(
    compiler: &mut Compiler,
    plugins: Vec<Option<PluginDecl>>,
) -> Result<(), RegistrationError> {
    for decl in plugins.into_iter().flatten() {
        match decl {
            PluginDecl::Func(f) => f(compiler)?,
            PluginDecl::Applier(plugin) => {
                tracing::debug!(plugin = plugin.name(), "applying plugin");
                plugin.apply(compiler)?;
            }
        }
    }
    Ok(())
}
