//! Translates normalized options into internal taps.
//!
//! Runs as step nine of the factory sequence, after user plugins and the
//! construction environment hooks. This is where configuration that is not
//! plugin-shaped becomes hook registrations.

use crate::Compiler;
use crate::error::CompileError;
use crate::hooks::EntryOptions;

/// Applies the configuration surface onto the compiler's hooks.
pub(crate) struct OptionsApply;

impl OptionsApply {
    /// Fires `after_plugins`, gives plugins a chance to claim entry handling
    /// via `entry_option`, and installs the built-in entry and profile taps.
    pub(crate) fn process(compiler: &mut Compiler) -> Result<(), CompileError> {
        compiler.hooks.after_plugins.call(&())?;

        let options = compiler.options().clone();
        let entry_options = EntryOptions {
            context: options.context.clone(),
            entries: options.entries.clone(),
        };

        let claimed = compiler.hooks.entry_option.call(&entry_options)?;
        if claimed != Some(true) {
            compiler
                .hooks
                .before_run
                .tap("EntryOptionPlugin", |ctx: &crate::hooks::RunContext| {
                    let entries = ctx.entries.clone();
                    async move {
                        tracing::debug!(?entries, "entries scheduled");
                        Ok(())
                    }
                })?;
        }

        if options.profile {
            compiler
                .hooks
                .done
                .tap("ProfilePlugin", |stats: &crate::pipeline::Stats| {
                    let duration = stats.duration;
                    let passes = stats.passes;
                    async move {
                        tracing::info!(?duration, passes, "build profile");
                        Ok(())
                    }
                })?;
        }

        Ok(())
    }
}
