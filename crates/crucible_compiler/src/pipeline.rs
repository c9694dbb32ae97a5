//! The build pipeline collaborator.
//!
//! Module graph building, resolution and code generation live behind
//! [`BuildPipeline`]; the compiler invokes it once per pipeline pass and
//! knows nothing about its internals. Each pass produces a [`BuildOutput`],
//! an opaque payload the compiler carries into [`Stats`] untouched, so
//! pipeline implementations have a channel to deliver their result object
//! to `done` observers and to the caller. [`NoopPipeline`] is the default,
//! useful for tests and for exercising the lifecycle without a real build.

use core::any::Any;
use core::fmt;
use core::time::Duration;
use std::sync::Arc;

use crucible_hooks::BoxFuture;

use crate::Compiler;
use crate::error::PipelineError;

/// Opaque result payload produced by a build pipeline pass.
///
/// The compiler never inspects it; callers that know the concrete pipeline
/// recover the value with [`downcast_ref`](Self::downcast_ref).
#[derive(Clone)]
pub struct BuildOutput(Arc<dyn Any + Send + Sync>);

impl BuildOutput {
    /// Wraps a pipeline's result object.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Recovers the concrete payload, if it has the expected type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl Default for BuildOutput {
    fn default() -> Self {
        Self::new(())
    }
}

impl fmt::Debug for BuildOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BuildOutput")
    }
}

/// Summary of one completed build cycle.
#[derive(Clone, Debug)]
pub struct Stats {
    /// Name of the compiler that produced this cycle, if it has one.
    pub name: Option<String>,
    /// Wall-clock duration of the cycle, across all passes.
    pub duration: Duration,
    /// Number of pipeline passes in the cycle (1 unless a
    /// `need_additional_pass` tap asked for more).
    pub passes: u32,
    /// The pipeline's result object, from the cycle's final pass.
    pub output: BuildOutput,
}

/// The opaque build collaborator.
///
/// Implementations read inputs through the compiler's filesystem handles and
/// may call [`Compiler::asset_path`] for output placement.
pub trait BuildPipeline: Send + Sync {
    /// Performs one build pass and returns its result payload.
    fn build<'a>(
        &'a self,
        compiler: &'a Compiler,
    ) -> BoxFuture<'a, Result<BuildOutput, PipelineError>>;
}

/// A pipeline that builds nothing, successfully.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopPipeline;

impl BuildPipeline for NoopPipeline {
    fn build<'a>(
        &'a self,
        _compiler: &'a Compiler,
    ) -> BoxFuture<'a, Result<BuildOutput, PipelineError>> {
        Box::pin(async { Ok(BuildOutput::default()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_output_round_trips_concrete_payloads() {
        let output = BuildOutput::new(vec!["main.js".to_string()]);
        assert_eq!(
            output.downcast_ref::<Vec<String>>().unwrap(),
            &vec!["main.js".to_string()]
        );
        assert!(output.downcast_ref::<u32>().is_none());
    }
}
