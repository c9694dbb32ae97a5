//! Compiler construction.
//!
//! [`create_compiler`] runs a fixed sequence: normalize options, apply base
//! defaults, construct the compiler, wire the environment, apply user
//! plugins, apply the remaining defaults, fire the construction hooks
//! (`environment`, `after_environment`), translate options into internal
//! taps, and fire `initialize`. Plugins therefore run against the user's
//! option values, while hooks fired later observe the fully defaulted
//! options.

use crate::Compiler;
use crate::environment::EnvironmentPlugin;
use crate::error::{CompileError, MultiCompilerError};
use crate::multi::MultiCompiler;
use crate::options::{RawOptions, apply_base_defaults, apply_defaults, normalize_options};
use crate::options_apply::OptionsApply;
use crate::plugin::{Plugin, apply_plugins};

/// Builds a configured compiler.
///
/// Dependency edges in `raw.dependencies` only have meaning for
/// [`create_multi_compiler`] and are ignored here.
pub fn create_compiler(mut raw: RawOptions) -> Result<Compiler, CompileError> {
    let plugins = core::mem::take(&mut raw.plugins);

    let mut options = normalize_options(raw);
    apply_base_defaults(&mut options);

    let mut compiler = Compiler::new(options.clone());
    EnvironmentPlugin.apply(&mut compiler)?;
    apply_plugins(&mut compiler, plugins)?;

    apply_defaults(&mut options);
    compiler.set_options(options);

    compiler.hooks.environment.call(&())?;
    compiler.hooks.after_environment.call(&())?;
    OptionsApply::process(&mut compiler)?;
    compiler.hooks.initialize.call(&())?;

    Ok(compiler)
}

/// Builds a multi-compiler from one option set per member.
///
/// Each member is built with [`create_compiler`]; `dependencies` entries
/// become name-based edges. Unknown names and dependency cycles fail
/// construction — no member ever runs in that case.
pub fn create_multi_compiler(raws: Vec<RawOptions>) -> Result<MultiCompiler, MultiCompilerError> {
    let mut compilers = Vec::with_capacity(raws.len());
    let mut edges = Vec::new();

    for (index, mut raw) in raws.into_iter().enumerate() {
        let dependencies = core::mem::take(&mut raw.dependencies);
        let label = raw
            .name
            .clone()
            .unwrap_or_else(|| index.to_string());

        let compiler =
            create_compiler(raw).map_err(|source| MultiCompilerError::MemberFailed {
                name: label,
                source,
            })?;
        compilers.push(compiler);

        if !dependencies.is_empty() {
            edges.push((index, dependencies));
        }
    }

    let mut multi = MultiCompiler::new(compilers)?;
    for (index, dependencies) in edges {
        multi.set_dependencies_at(index, dependencies)?;
    }
    Ok(multi)
}
