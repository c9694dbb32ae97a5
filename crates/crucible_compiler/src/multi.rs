//! Orchestration of multiple compilers with dependency-ordered scheduling.
//!
//! Members are identified by their option names; `set_dependencies` records
//! name-based edges and re-validates acyclicity on every change, so a cycle
//! is caught at construction time and no member ever runs.
//!
//! `run` wave-schedules members: everything with no unfinished dependencies
//! runs concurrently, and a member starts only once all of its dependencies
//! completed successfully. A failure prevents dependents from starting;
//! members that never started are still closed before the orchestrator
//! returns.

use futures::future::select_all;
use hashbrown::HashMap;
use tokio::task::JoinSet;

use crate::compiler::{Compiler, Watching};
use crate::error::{CompileError, MultiCompilerError};
use crate::pipeline::Stats;

/// Per-member build results, in declaration order.
#[derive(Clone, Debug)]
pub struct MultiStats {
    /// One entry per member.
    pub stats: Vec<Stats>,
}

/// A set of compilers with dependency edges between them.
pub struct MultiCompiler {
    compilers: Vec<Compiler>,
    /// Dependency indices per member.
    deps: Vec<Vec<usize>>,
}

impl core::fmt::Debug for MultiCompiler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let labels: Vec<String> = (0..self.compilers.len())
            .map(|i| self.member_label(i))
            .collect();
        f.debug_struct("MultiCompiler")
            .field("compilers", &labels)
            .field("deps", &self.deps)
            .finish()
    }
}

impl MultiCompiler {
    /// Wraps compilers into an orchestrator with no dependency edges.
    ///
    /// Names must be unique among the named members, otherwise edges would
    /// be ambiguous.
    pub fn new(compilers: Vec<Compiler>) -> Result<Self, MultiCompilerError> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (index, compiler) in compilers.iter().enumerate() {
            if let Some(name) = compiler.name()
                && seen.insert(name, index).is_some()
            {
                return Err(MultiCompilerError::DuplicateName {
                    name: name.to_string(),
                });
            }
        }
        drop(seen);
        let deps = vec![Vec::new(); compilers.len()];
        Ok(Self { compilers, deps })
    }

    /// Number of member compilers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.compilers.len()
    }

    /// Returns true if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.compilers.is_empty()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.compilers.iter().position(|c| c.name() == Some(name))
    }

    fn member_label(&self, index: usize) -> String {
        self.compilers[index]
            .name()
            .map_or_else(|| index.to_string(), str::to_string)
    }

    /// Replaces the named member's dependency edges and re-validates
    /// acyclicity.
    pub fn set_dependencies(
        &mut self,
        name: &str,
        dependencies: Vec<String>,
    ) -> Result<(), MultiCompilerError> {
        let index = self
            .index_of(name)
            .ok_or_else(|| MultiCompilerError::UnknownCompiler {
                name: name.to_string(),
            })?;
        self.set_dependencies_at(index, dependencies)
    }

    pub(crate) fn set_dependencies_at(
        &mut self,
        index: usize,
        dependencies: Vec<String>,
    ) -> Result<(), MultiCompilerError> {
        let mut resolved = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            let dep_index =
                self.index_of(&dependency)
                    .ok_or_else(|| MultiCompilerError::UnknownDependency {
                        compiler: self.member_label(index),
                        dependency: dependency.clone(),
                    })?;
            resolved.push(dep_index);
        }
        self.deps[index] = resolved;
        self.check_acyclic()
    }

    /// Kahn's algorithm; members left unprocessed are on (or downstream of)
    /// a cycle.
    fn check_acyclic(&self) -> Result<(), MultiCompilerError> {
        let n = self.compilers.len();
        let mut remaining: Vec<usize> = self.deps.iter().map(Vec::len).collect();
        let mut dependents = vec![Vec::new(); n];
        for (index, deps) in self.deps.iter().enumerate() {
            for &dep in deps {
                dependents[dep].push(index);
            }
        }

        let mut queue: Vec<usize> = (0..n).filter(|&i| remaining[i] == 0).collect();
        let mut processed = 0;
        while let Some(index) = queue.pop() {
            processed += 1;
            for &dependent in &dependents[index] {
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    queue.push(dependent);
                }
            }
        }

        if processed == n {
            Ok(())
        } else {
            let names = (0..n)
                .filter(|&i| remaining[i] > 0)
                .map(|i| self.member_label(i))
                .collect();
            Err(MultiCompilerError::DependencyCycle { names })
        }
    }

    /// Runs every member once, respecting dependency order.
    ///
    /// Members whose dependencies have all completed run concurrently. On a
    /// member failure no dependent starts, already-running members settle,
    /// never-started members are closed, and the first failure is returned.
    pub async fn run(self) -> Result<MultiStats, MultiCompilerError> {
        let n = self.compilers.len();
        let labels: Vec<String> = (0..n).map(|i| self.member_label(i)).collect();

        let mut remaining: Vec<usize> = self.deps.iter().map(Vec::len).collect();
        let mut dependents = vec![Vec::new(); n];
        for (index, deps) in self.deps.iter().enumerate() {
            for &dep in deps {
                dependents[dep].push(index);
            }
        }

        let mut slots: Vec<Option<Compiler>> = self.compilers.into_iter().map(Some).collect();
        let mut stats: Vec<Option<Stats>> = (0..n).map(|_| None).collect();
        let mut set: JoinSet<(usize, Result<Stats, CompileError>)> = JoinSet::new();
        let mut failure: Option<MultiCompilerError> = None;

        for index in 0..n {
            if remaining[index] == 0
                && let Some(compiler) = slots[index].take()
            {
                tracing::debug!(member = %labels[index], "starting compiler");
                set.spawn(async move { (index, compiler.run().await) });
            }
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Err(err) => {
                    if failure.is_none() {
                        failure = Some(MultiCompilerError::Join(err));
                    }
                }
                Ok((index, Ok(member_stats))) => {
                    tracing::debug!(member = %labels[index], "compiler finished");
                    stats[index] = Some(member_stats);
                    for &dependent in &dependents[index] {
                        remaining[dependent] -= 1;
                        if remaining[dependent] == 0
                            && failure.is_none()
                            && let Some(compiler) = slots[dependent].take()
                        {
                            tracing::debug!(member = %labels[dependent], "starting compiler");
                            set.spawn(async move { (dependent, compiler.run().await) });
                        }
                    }
                }
                Ok((index, Err(err))) => {
                    if failure.is_none() {
                        failure = Some(MultiCompilerError::MemberFailed {
                            name: labels[index].clone(),
                            source: err,
                        });
                    }
                }
            }
        }

        for slot in &mut slots {
            if let Some(compiler) = slot.take()
                && let Err(err) = compiler.close().await
            {
                tracing::warn!(%err, "failed to close unstarted compiler");
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(MultiStats {
                stats: stats.into_iter().flatten().collect(),
            }),
        }
    }

    /// Moves every member into watch mode.
    ///
    /// Dependency edges gate `run` scheduling only; steady-state watch
    /// rebuilds are independent per member.
    pub fn watch(self) -> Result<MultiWatching, CompileError> {
        let mut names = Vec::with_capacity(self.compilers.len());
        let mut watchings = Vec::with_capacity(self.compilers.len());
        for compiler in self.compilers {
            let watch_options = compiler.options().watch_options.clone();
            names.push(compiler.options().name.clone());
            watchings.push(compiler.watch(watch_options)?);
        }
        Ok(MultiWatching { names, watchings })
    }

    /// Closes every member. All members are closed even if one fails; the
    /// first failure is returned.
    pub async fn close(self) -> Result<(), CompileError> {
        let mut first_err = None;
        for compiler in self.compilers {
            if let Err(err) = compiler.close().await {
                if first_err.is_none() {
                    first_err = Some(err);
                } else {
                    tracing::warn!(%err, "additional close failure");
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// Handle to a set of compilers running in watch mode.
pub struct MultiWatching {
    names: Vec<Option<String>>,
    watchings: Vec<Watching>,
}

impl MultiWatching {
    /// Member names, indexed like the results from [`recv`](Self::recv).
    #[must_use]
    pub fn names(&self) -> &[Option<String>] {
        &self.names
    }

    /// Receives the next cycle result from any member, tagged with the
    /// member's index.
    pub async fn recv(&mut self) -> Option<(usize, Result<Stats, CompileError>)> {
        if self.watchings.is_empty() {
            return None;
        }
        let futures: Vec<_> = self
            .watchings
            .iter_mut()
            .enumerate()
            .map(|(index, watching)| Box::pin(async move { (index, watching.recv().await) }))
            .collect();
        let ((index, result), _, _) = select_all(futures).await;
        result.map(|r| (index, r))
    }

    /// Stops every member's watch and hands the compilers back.
    pub async fn stop(self) -> Result<Vec<Compiler>, CompileError> {
        let mut compilers = Vec::with_capacity(self.watchings.len());
        for watching in self.watchings {
            compilers.push(watching.stop().await?);
        }
        Ok(compilers)
    }

    /// Stops every member's watch and closes the compilers.
    pub async fn close(self) -> Result<(), CompileError> {
        let compilers = self.stop().await?;
        let mut first_err = None;
        for compiler in compilers {
            if let Err(err) = compiler.close().await
                && first_err.is_none()
            {
                first_err = Some(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{CompilerOptions, WatchOptions};

    fn named(name: &str) -> Compiler {
        Compiler::new(CompilerOptions {
            name: Some(name.to_string()),
            context: ".".into(),
            entries: Vec::new(),
            output_dir: "dist".into(),
            watch: false,
            watch_options: WatchOptions::default(),
            profile: false,
        })
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = MultiCompiler::new(vec![named("web"), named("web")]).unwrap_err();
        assert!(matches!(err, MultiCompilerError::DuplicateName { name } if name == "web"));
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let mut multi = MultiCompiler::new(vec![named("web"), named("api")]).unwrap();
        let err = multi
            .set_dependencies("web", vec!["missing".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            MultiCompilerError::UnknownDependency { compiler, dependency }
                if compiler == "web" && dependency == "missing"
        ));
    }

    #[test]
    fn dependency_cycle_is_rejected() {
        let mut multi = MultiCompiler::new(vec![named("a"), named("b")]).unwrap();
        multi
            .set_dependencies("a", vec!["b".to_string()])
            .unwrap();
        let err = multi
            .set_dependencies("b", vec!["a".to_string()])
            .unwrap_err();
        assert!(matches!(err, MultiCompilerError::DependencyCycle { .. }));
    }

    #[test]
    fn diamond_dependencies_are_acyclic() {
        let mut multi =
            MultiCompiler::new(vec![named("base"), named("web"), named("api"), named("e2e")])
                .unwrap();
        multi
            .set_dependencies("web", vec!["base".to_string()])
            .unwrap();
        multi
            .set_dependencies("api", vec!["base".to_string()])
            .unwrap();
        multi
            .set_dependencies("e2e", vec!["web".to_string(), "api".to_string()])
            .unwrap();
    }
}
