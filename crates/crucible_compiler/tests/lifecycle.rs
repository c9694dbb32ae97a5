//! Integration tests for the single-compiler lifecycle: construction hook
//! ordering, run semantics, the unconditional close, and watch mode.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crucible_compiler::{
    BuildOutput, BuildPipeline, CompileError, Compiler, PipelineError, PluginDecl, RawOptions,
    RunContext, Stats, WatchOptions, create_compiler,
};
use crucible_hooks::BoxFuture;

type Log = Arc<Mutex<Vec<&'static str>>>;

fn log_sync(log: &Log, entry: &'static str) {
    log.lock().unwrap().push(entry);
}

/// A pipeline that always fails, for exercising the error path.
struct FailingPipeline;

impl BuildPipeline for FailingPipeline {
    fn build<'a>(
        &'a self,
        _compiler: &'a Compiler,
    ) -> BoxFuture<'a, Result<BuildOutput, PipelineError>> {
        Box::pin(async { Err("pipeline exploded".into()) })
    }
}

#[test]
fn construction_fires_hooks_in_factory_order() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let plugin_log = Arc::clone(&log);
    let options = RawOptions {
        plugins: vec![Some(PluginDecl::func(move |compiler| {
            for (hook, entry) in [
                (&compiler.hooks.environment, "environment"),
                (&compiler.hooks.after_environment, "after_environment"),
                (&compiler.hooks.after_plugins, "after_plugins"),
                (&compiler.hooks.initialize, "initialize"),
            ] {
                let log = Arc::clone(&plugin_log);
                hook.tap(entry, move |_| {
                    log_sync(&log, entry);
                    Ok(())
                })?;
            }
            let log = Arc::clone(&plugin_log);
            compiler.hooks.entry_option.tap("entry_option", move |_| {
                log_sync(&log, "entry_option");
                Ok(None)
            })
        }))],
        ..RawOptions::default()
    };

    create_compiler(options).unwrap();
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "environment",
            "after_environment",
            "after_plugins",
            "entry_option",
            "initialize"
        ]
    );
}

#[tokio::test]
async fn run_fires_lifecycle_hooks_in_order() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let plugin_log = Arc::clone(&log);
    let compiler = create_compiler(RawOptions {
        plugins: vec![Some(PluginDecl::func(move |compiler| {
            let l = Arc::clone(&plugin_log);
            compiler.hooks.before_run.tap("t", move |_: &RunContext| {
                let l = Arc::clone(&l);
                async move {
                    log_sync(&l, "before_run");
                    Ok(())
                }
            })?;
            let l = Arc::clone(&plugin_log);
            compiler.hooks.run.tap("t", move |_: &RunContext| {
                let l = Arc::clone(&l);
                async move {
                    log_sync(&l, "run");
                    Ok(())
                }
            })?;
            let l = Arc::clone(&plugin_log);
            compiler.hooks.done.tap("t", move |_: &Stats| {
                let l = Arc::clone(&l);
                async move {
                    log_sync(&l, "done");
                    Ok(())
                }
            })?;
            let l = Arc::clone(&plugin_log);
            compiler.hooks.after_done.tap("t", move |_: &Stats| {
                log_sync(&l, "after_done");
                Ok(())
            })?;
            let l = Arc::clone(&plugin_log);
            compiler.hooks.shutdown.tap("t", move |_: &()| {
                let l = Arc::clone(&l);
                async move {
                    log_sync(&l, "shutdown");
                    Ok(())
                }
            })
        }))],
        ..RawOptions::default()
    })
    .unwrap();

    let stats = compiler.run().await.unwrap();
    assert_eq!(stats.passes, 1);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["before_run", "run", "done", "after_done", "shutdown"]
    );
}

#[tokio::test]
async fn need_additional_pass_schedules_extra_pipeline_pass() {
    let compiler = create_compiler(RawOptions {
        plugins: vec![Some(PluginDecl::func(|compiler| {
            let asked = AtomicBool::new(false);
            compiler.hooks.need_additional_pass.tap("once", move |_| {
                if asked.swap(true, Ordering::SeqCst) {
                    Ok(None)
                } else {
                    Ok(Some(true))
                }
            })
        }))],
        ..RawOptions::default()
    })
    .unwrap();

    let stats = compiler.run().await.unwrap();
    assert_eq!(stats.passes, 2);
}

#[tokio::test]
async fn run_closes_the_compiler_exactly_once() {
    let shutdowns = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&shutdowns);
    let compiler = create_compiler(RawOptions {
        plugins: vec![Some(PluginDecl::func(move |compiler| {
            let counter = Arc::clone(&counter);
            compiler.hooks.shutdown.tap("count", move |_: &()| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
        }))],
        ..RawOptions::default()
    })
    .unwrap();

    compiler.run().await.unwrap();
    assert_eq!(shutdowns.load(Ordering::SeqCst), 1);

    // A compiler that has run is closed; running again is an error, and the
    // explicit close is a no-op that does not re-fire shutdown.
    assert!(matches!(compiler.run().await, Err(CompileError::Closed)));
    compiler.close().await.unwrap();
    assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn pipeline_output_reaches_done_taps_and_the_caller() {
    /// A stand-in for a real pipeline's result object.
    #[derive(Debug, PartialEq)]
    struct Manifest {
        assets: Vec<String>,
    }

    struct ManifestPipeline;

    impl BuildPipeline for ManifestPipeline {
        fn build<'a>(
            &'a self,
            compiler: &'a Compiler,
        ) -> BoxFuture<'a, Result<BuildOutput, PipelineError>> {
            Box::pin(async {
                let asset = compiler.asset_path("main.js".to_string())?;
                Ok(BuildOutput::new(Manifest {
                    assets: vec![asset],
                }))
            })
        }
    }

    let seen_by_done = Arc::new(Mutex::new(Vec::<String>::new()));

    let seen = Arc::clone(&seen_by_done);
    let compiler = create_compiler(RawOptions {
        plugins: vec![Some(PluginDecl::func(move |compiler| {
            compiler.set_pipeline(ManifestPipeline);
            compiler
                .hooks
                .asset_path
                .tap("hash", |path| Ok(Some(format!("{path}?v=abc123"))))?;
            let seen = Arc::clone(&seen);
            compiler.hooks.done.tap("inspect", move |stats: &Stats| {
                let manifest = stats.output.downcast_ref::<Manifest>().unwrap();
                seen.lock().unwrap().extend(manifest.assets.clone());
                async { Ok(()) }
            })
        }))],
        ..RawOptions::default()
    })
    .unwrap();

    let stats = compiler.run().await.unwrap();
    let manifest = stats.output.downcast_ref::<Manifest>().unwrap();
    assert_eq!(manifest.assets, vec!["main.js?v=abc123".to_string()]);
    assert_eq!(
        *seen_by_done.lock().unwrap(),
        vec!["main.js?v=abc123".to_string()]
    );
}

#[tokio::test]
async fn failing_build_reports_failed_hook_and_still_closes() {
    let observed = Arc::new(Mutex::new(Vec::<String>::new()));
    let shutdowns = Arc::new(AtomicUsize::new(0));

    let obs = Arc::clone(&observed);
    let counter = Arc::clone(&shutdowns);
    let compiler = create_compiler(RawOptions {
        plugins: vec![Some(PluginDecl::func(move |compiler| {
            compiler.set_pipeline(FailingPipeline);
            let obs = Arc::clone(&obs);
            compiler.hooks.failed.tap("observe", move |message: &String| {
                obs.lock().unwrap().push(message.clone());
                Ok(())
            })?;
            let counter = Arc::clone(&counter);
            compiler.hooks.shutdown.tap("count", move |_: &()| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
        }))],
        ..RawOptions::default()
    })
    .unwrap();

    let err = compiler.run().await.unwrap_err();
    assert!(matches!(err, CompileError::Pipeline(_)));

    let observed = observed.lock().unwrap();
    assert_eq!(observed.len(), 1);
    assert!(observed[0].contains("pipeline exploded"));
    assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
}

#[test]
fn asset_path_waterfall_rewrites_templates() {
    let compiler = create_compiler(RawOptions {
        plugins: vec![Some(PluginDecl::func(|compiler| {
            compiler
                .hooks
                .asset_path
                .tap("hash", |path| Ok(Some(format!("{path}?v=abc123"))))?;
            compiler
                .hooks
                .asset_path
                .tap_before("hash", "prefix", |path| Ok(Some(format!("assets/{path}"))))
        }))],
        ..RawOptions::default()
    })
    .unwrap();

    assert_eq!(
        compiler.asset_path("main.js".to_string()).unwrap(),
        "assets/main.js?v=abc123"
    );
}

#[tokio::test]
async fn watch_delivers_cycles_and_hands_the_compiler_back() {
    let invalids = Arc::new(AtomicUsize::new(0));
    let watch_closes = Arc::new(AtomicUsize::new(0));

    let inv = Arc::clone(&invalids);
    let wc = Arc::clone(&watch_closes);
    let compiler = create_compiler(RawOptions {
        plugins: vec![Some(PluginDecl::func(move |compiler| {
            let inv = Arc::clone(&inv);
            compiler.hooks.invalid.tap("count", move |_| {
                inv.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })?;
            let wc = Arc::clone(&wc);
            compiler.hooks.watch_close.tap("count", move |_| {
                wc.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }))],
        ..RawOptions::default()
    })
    .unwrap();

    let mut watching = compiler
        .watch(WatchOptions {
            poll_interval: core::time::Duration::from_millis(10),
        })
        .unwrap();

    // Initial cycle plus at least one polled rebuild.
    watching.recv().await.unwrap().unwrap();
    watching.recv().await.unwrap().unwrap();
    assert!(invalids.load(Ordering::SeqCst) >= 1);

    let compiler = watching.stop().await.unwrap();
    assert_eq!(watch_closes.load(Ordering::SeqCst), 1);

    // The compiler is idle again and can still run (which then closes it).
    compiler.run().await.unwrap();
}

#[tokio::test]
async fn failing_build_and_failing_close_surface_both_errors() {
    let compiler = create_compiler(RawOptions {
        plugins: vec![Some(PluginDecl::func(|compiler| {
            compiler.set_pipeline(FailingPipeline);
            compiler.hooks.shutdown.tap("teardown", |_: &()| async {
                Err("shutdown exploded".into())
            })
        }))],
        ..RawOptions::default()
    })
    .unwrap();

    let (build, close) = match compiler.run().await.unwrap_err() {
        CompileError::BuildAndCloseFailed { build, close } => (build, close),
        other => panic!("expected BuildAndCloseFailed, got {other}"),
    };
    assert!(matches!(*build, CompileError::Pipeline(_)));
    assert!(build.to_string().contains("pipeline exploded"));
    assert!(matches!(*close, CompileError::CloseFailed(_)));
    assert!(close.to_string().contains("shutdown exploded"));
}

#[tokio::test]
async fn dropped_watch_handle_still_stops_the_watch_cleanly() {
    let watch_closes = Arc::new(AtomicUsize::new(0));

    let wc = Arc::clone(&watch_closes);
    let compiler = create_compiler(RawOptions {
        plugins: vec![Some(PluginDecl::func(move |compiler| {
            let wc = Arc::clone(&wc);
            compiler.hooks.watch_close.tap("count", move |_| {
                wc.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }))],
        ..RawOptions::default()
    })
    .unwrap();

    let mut watching = compiler
        .watch(WatchOptions {
            poll_interval: core::time::Duration::from_millis(10),
        })
        .unwrap();
    watching.recv().await.unwrap().unwrap();
    drop(watching);

    // The watch task notices the dropped handle on its next poll and winds
    // down through watch_close.
    tokio::time::timeout(core::time::Duration::from_secs(2), async {
        while watch_closes.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(core::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("watch task never fired watch_close after its handle was dropped");
    assert_eq!(watch_closes.load(Ordering::SeqCst), 1);
}
