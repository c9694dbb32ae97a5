//! The compiler object and its run/watch/close lifecycle.
//!
//! A [`Compiler`] owns the hook catalog, the normalized options, the
//! filesystem handles and the build pipeline. It is constructed through
//! [`create_compiler`](crate::create_compiler); the lifecycle entry points
//! are [`run`](Compiler::run), [`watch`](Compiler::watch) and
//! [`close`](Compiler::close).
//!
//! `run` performs exactly one build cycle and **always closes the compiler
//! before returning**, success or failure — a compiler that has run cannot
//! run again. `watch` hands the compiler to a background task that delivers
//! one result per rebuild cycle through the returned [`Watching`] handle;
//! stopping the watch hands the compiler back.
//!
//! # Example
//!
//! ```ignore
//! let compiler = create_compiler(RawOptions::default())?;
//! let stats = compiler.run().await?;
//! tracing::info!(passes = stats.passes, "build finished");
//! ```

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crucible_hooks::HookError;

use crate::controller::ExecutionController;
use crate::environment::{InputFileSystem, OutputFileSystem};
use crate::error::CompileError;
use crate::hooks::{CompilerHooks, RunContext};
use crate::options::{CompilerOptions, WatchOptions};
use crate::pipeline::{BuildPipeline, NoopPipeline, Stats};

/// A configured compiler.
pub struct Compiler {
    /// The hook catalog plugins tap into.
    pub hooks: CompilerHooks,
    options: CompilerOptions,
    input_fs: Option<Arc<dyn InputFileSystem>>,
    output_fs: Option<Arc<dyn OutputFileSystem>>,
    pipeline: Arc<dyn BuildPipeline>,
    pub(crate) controller: ExecutionController,
}

impl Compiler {
    /// Creates a compiler with empty hooks and no filesystem handles.
    ///
    /// Callers normally go through [`create_compiler`](crate::create_compiler),
    /// which also applies plugins, defaults and the construction hooks.
    #[must_use]
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            hooks: CompilerHooks::new(),
            options,
            input_fs: None,
            output_fs: None,
            pipeline: Arc::new(NoopPipeline),
            controller: ExecutionController::new(),
        }
    }

    /// The normalized options, read-only for the compiler's lifetime.
    #[must_use]
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub(crate) fn set_options(&mut self, options: CompilerOptions) {
        self.options = options;
    }

    /// The compiler's name, if it has one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.options.name.as_deref()
    }

    /// The read-side filesystem handle, once wired.
    #[must_use]
    pub fn input_filesystem(&self) -> Option<&Arc<dyn InputFileSystem>> {
        self.input_fs.as_ref()
    }

    /// The write-side filesystem handle, once wired.
    #[must_use]
    pub fn output_filesystem(&self) -> Option<&Arc<dyn OutputFileSystem>> {
        self.output_fs.as_ref()
    }

    /// Replaces the read-side filesystem handle.
    pub fn set_input_filesystem(&mut self, fs: Arc<dyn InputFileSystem>) {
        self.input_fs = Some(fs);
    }

    /// Replaces the write-side filesystem handle.
    pub fn set_output_filesystem(&mut self, fs: Arc<dyn OutputFileSystem>) {
        self.output_fs = Some(fs);
    }

    /// Replaces the build pipeline. Plugins typically call this during
    /// application.
    pub fn set_pipeline(&mut self, pipeline: impl BuildPipeline + 'static) {
        self.pipeline = Arc::new(pipeline);
    }

    /// Runs an output path through the `asset_path` waterfall.
    pub fn asset_path(&self, path: String) -> Result<String, HookError> {
        self.hooks.asset_path.call(path)
    }

    fn run_context(&self) -> RunContext {
        RunContext {
            name: self.options.name.clone(),
            entries: self.options.entries.clone(),
        }
    }

    /// Pipeline passes plus the `done`/`after_done` observation hooks.
    /// Shared by `run` and watch cycles.
    async fn execute_build(&self) -> Result<Stats, CompileError> {
        let start = Instant::now();
        let mut passes = 0u32;
        let output = loop {
            passes += 1;
            let output = self
                .pipeline
                .build(self)
                .await
                .map_err(CompileError::Pipeline)?;
            match self.hooks.need_additional_pass.call(&())? {
                Some(true) => {
                    tracing::debug!(passes, "additional pipeline pass requested");
                }
                _ => break output,
            }
        };

        let stats = Stats {
            name: self.options.name.clone(),
            duration: start.elapsed(),
            passes,
            output,
        };
        self.hooks.done.call(&stats).await?;
        self.hooks.after_done.call(&stats)?;
        Ok(stats)
    }

    /// Observers of `failed` must not be able to mask the original error.
    fn report_failure(&self, err: &CompileError) {
        tracing::error!(name = self.options.name.as_deref(), %err, "build failed");
        if let Err(hook_err) = self.hooks.failed.call(&err.to_string()) {
            tracing::warn!(%hook_err, "failed hook tap errored");
        }
    }

    /// Performs one build cycle and closes the compiler.
    ///
    /// Exactly one terminal outcome per invocation: the cycle's stats, the
    /// cycle's error, or — when the unconditional close also fails after a
    /// failed build — [`CompileError::BuildAndCloseFailed`] carrying both.
    pub async fn run(&self) -> Result<Stats, CompileError> {
        self.controller.begin_run()?;
        tracing::info!(name = self.options.name.as_deref(), "starting build");

        let ctx = self.run_context();
        let outcome = async {
            self.hooks.before_run.call(&ctx).await?;
            self.hooks.run.call(&ctx).await?;
            self.execute_build().await
        }
        .await;

        if let Err(err) = &outcome {
            self.report_failure(err);
        }

        self.controller.finish();
        let closed = self.close().await;
        match (outcome, closed) {
            (Ok(stats), Ok(())) => Ok(stats),
            (Ok(_), Err(close)) => Err(close),
            (Err(build), Ok(())) => Err(build),
            (Err(build), Err(close)) => Err(CompileError::BuildAndCloseFailed {
                build: Box::new(build),
                close: Box::new(close),
            }),
        }
    }

    /// Fires `shutdown` and transitions to the terminal `Closed` state.
    ///
    /// Closing an already-closed compiler is a no-op; `shutdown` fires at
    /// most once per compiler.
    pub async fn close(&self) -> Result<(), CompileError> {
        if !self.controller.close()? {
            return Ok(());
        }
        self.hooks
            .shutdown
            .call(&())
            .await
            .map_err(CompileError::CloseFailed)?;
        tracing::info!(name = self.options.name.as_deref(), "compiler closed");
        Ok(())
    }

    /// Moves the compiler into a background watch task.
    ///
    /// The task builds immediately, then rebuilds every
    /// `watch_options.poll_interval`, delivering one result per cycle to the
    /// returned [`Watching`] handle. `invalid` fires before every rebuild
    /// (not before the initial build); `watch_close` fires once when the
    /// watch stops.
    pub fn watch(self, watch_options: WatchOptions) -> Result<Watching, CompileError> {
        self.controller.begin_watch()?;
        tracing::info!(name = self.options.name.as_deref(), "starting watch");

        let poll = watch_options.poll_interval;
        let (results_tx, results_rx) = mpsc::channel(16);
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let handle: JoinHandle<Compiler> = tokio::spawn(async move {
            let compiler = self;
            let mut first = true;
            loop {
                if first {
                    first = false;
                } else {
                    let stop = tokio::select! {
                        changed = stop_rx.changed() => Some(changed.is_err()),
                        () = tokio::time::sleep(poll) => None,
                    };
                    match stop {
                        Some(true) => {
                            tracing::warn!(
                                "watch handle dropped without stopping; shutting watch down"
                            );
                            break;
                        }
                        Some(false) => break,
                        None => {}
                    }
                    if let Err(err) = compiler.hooks.invalid.call(&()) {
                        tracing::warn!(%err, "invalid hook tap errored");
                    }
                }

                let ctx = compiler.run_context();
                let result = async {
                    compiler.hooks.watch_run.call(&ctx).await?;
                    compiler.execute_build().await
                }
                .await;
                if let Err(err) = &result {
                    compiler.report_failure(err);
                }

                // A stop during delivery discards the in-flight result.
                let stopped = tokio::select! {
                    _ = stop_rx.changed() => true,
                    sent = results_tx.send(result) => {
                        if sent.is_err() {
                            tracing::warn!(
                                "watch results receiver dropped without stopping; shutting watch down"
                            );
                            true
                        } else {
                            false
                        }
                    }
                };
                if stopped {
                    break;
                }
            }

            if let Err(err) = compiler.hooks.watch_close.call(&()) {
                tracing::warn!(%err, "watch_close hook tap errored");
            }
            compiler.controller.finish();
            compiler
        });

        Ok(Watching {
            results: results_rx,
            stop: stop_tx,
            handle,
        })
    }
}

/// Handle to a compiler running in watch mode.
///
/// Receive per-cycle results with [`recv`](Watching::recv); stop the watch
/// and take the compiler back with [`stop`](Watching::stop). Dropping the
/// handle without stopping is treated as a caller error: the watch task logs
/// a warning and performs the same orderly stop, but the compiler is lost
/// with the task.
pub struct Watching {
    results: mpsc::Receiver<Result<Stats, CompileError>>,
    stop: watch::Sender<bool>,
    handle: JoinHandle<Compiler>,
}

impl Watching {
    /// Receives the next cycle result. `None` once the watch task has gone
    /// away.
    pub async fn recv(&mut self) -> Option<Result<Stats, CompileError>> {
        self.results.recv().await
    }

    /// Stops the watch and hands the compiler back, idle again.
    ///
    /// An in-flight cycle completes and is discarded. The compiler can run,
    /// watch again, or be closed.
    pub async fn stop(self) -> Result<Compiler, CompileError> {
        let _ = self.stop.send(true);
        let compiler = self.handle.await?;
        Ok(compiler)
    }

    /// Stops the watch and closes the compiler.
    pub async fn close(self) -> Result<(), CompileError> {
        let compiler = self.stop().await?;
        compiler.close().await
    }
}
