//! Build plan execution.
//!
//! Actions run on a bounded pool of plain OS threads pulling from a shared
//! queue behind one mutex; build-action cost dwarfs the locking overhead,
//! so there is no work stealing. Phases are strictly ordered: every
//! compile finishes before the first archive starts, and every archive
//! before the first link.
//!
//! Failure is fail-fast and edge-triggered: the first failing action is
//! recorded under the queue lock, workers observe it on their next dequeue
//! and drain out, and in-flight subprocesses run to completion.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::builder::deps::{parse_mkfile_deps, parse_msvc_deps, FileDeps};
use crate::builder::plan::{BuildPlan, CompileFilePlan, CreateArchivePlan, LinkExecutablePlan};
use crate::toolchain::{DepsMode, Toolchain};
use crate::usage::UsageRequirementMap;
use crate::util::fs::ensure_dir;
use crate::util::process::{find_executable, ProcessBuilder};
use crate::util::shlex::quote_command;

/// Everything an action needs to synthesize and run its command.
#[derive(Debug, Clone)]
pub struct BuildEnv {
    /// The realized toolchain commands are built with.
    pub toolchain: Toolchain,
    /// Root directory for all build outputs.
    pub output_root: PathBuf,
    /// Usage requirements of every library visible to this build.
    pub ureqs: UsageRequirementMap,
}

/// Drain `items` through `run` on a pool of `n_jobs` worker threads.
///
/// A `n_jobs` of zero sizes the pool at hardware parallelism plus two,
/// which keeps the pipeline fed while actions block on subprocess I/O.
/// Every failure is logged; the returned error only carries the count.
pub fn parallel_run<T, F>(items: Vec<T>, n_jobs: usize, run: F) -> Result<()>
where
    T: Send,
    F: Fn(T) -> Result<()> + Sync,
{
    let n_jobs = if n_jobs == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            + 2
    } else {
        n_jobs
    };

    let total = items.len();
    let state = Mutex::new((items.into_iter(), Vec::<anyhow::Error>::new()));

    std::thread::scope(|scope| {
        for _ in 0..n_jobs {
            scope.spawn(|| loop {
                let item = {
                    let mut guard = state.lock().unwrap();
                    if !guard.1.is_empty() {
                        break;
                    }
                    match guard.0.next() {
                        Some(item) => item,
                        None => break,
                    }
                };
                if let Err(err) = run(item) {
                    state.lock().unwrap().1.push(err);
                    break;
                }
            });
        }
    });

    let (_, errors) = state.into_inner().unwrap();
    if errors.is_empty() {
        return Ok(());
    }
    for err in &errors {
        tracing::error!("{:#}", err);
    }
    bail!("{} of {} build action(s) failed", errors.len(), total)
}

impl BuildPlan {
    /// Run every compile action of the plan.
    pub fn compile_all(&self, env: &BuildEnv, n_jobs: usize) -> Result<()> {
        let mut actions: Vec<&CompileFilePlan> = Vec::new();
        for lib in self.libraries() {
            if let Some(archive) = lib.archive() {
                actions.extend(archive.compile_files());
            }
            actions.extend(lib.executables().iter().map(|exe| exe.compile_file()));
        }
        parallel_run(actions, n_jobs, |plan| {
            run_compile(plan, env).map(|_deps| ())
        })
        .context("compilation failed")
    }

    /// Run every archive action. Expects all compiles to have completed.
    pub fn archive_all(&self, env: &BuildEnv, n_jobs: usize) -> Result<()> {
        let actions: Vec<&CreateArchivePlan> =
            self.libraries().iter().filter_map(|l| l.archive()).collect();
        parallel_run(actions, n_jobs, |archive| run_archive(archive, env))
            .context("archiving failed")
    }

    /// Run every link action. Expects all archives to have completed.
    pub fn link_all(&self, env: &BuildEnv, n_jobs: usize) -> Result<()> {
        let mut actions = Vec::new();
        for lib in self.libraries() {
            let archive_path = lib.archive().map(|a| a.archive_file_path(env));
            for exe in lib.executables() {
                actions.push((lib.name(), archive_path.clone(), exe));
            }
        }
        parallel_run(actions, n_jobs, |(lib_name, archive_path, exe)| {
            run_link(lib_name.as_str(), exe, archive_path, env)
        })
        .context("linking failed")
    }

    /// Execute the full plan: compile, then archive, then link, with a
    /// barrier between each phase.
    pub fn execute(&self, env: &BuildEnv, n_jobs: usize) -> Result<()> {
        self.compile_all(env, n_jobs)?;
        self.archive_all(env, n_jobs)?;
        self.link_all(env, n_jobs)
    }
}

/// Compile one translation unit, returning its header dependencies when
/// the toolchain reports them.
pub fn run_compile(plan: &CompileFilePlan, env: &BuildEnv) -> Result<Option<FileDeps>> {
    let object_path = plan.object_file_path(env);
    if let Some(parent) = object_path.parent() {
        ensure_dir(parent)?;
    }

    let info = plan.generate_compile_command(env)?;
    let source_rel = plan.source().relative_path();
    tracing::info!("[{}] compile: {}", plan.qualifier(), source_rel.display());

    let (output, millis) = spawn_action(&info.command)?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    // showIncludes notes are dependency data, not compiler output.
    let (msvc_inputs, stdout) = if env.toolchain.deps_mode() == DepsMode::Msvc {
        parse_msvc_deps(&stdout)
    } else {
        (Vec::new(), stdout)
    };

    tracing::debug!(
        "[{}] compile: {} - {}ms",
        plan.qualifier(),
        source_rel.display(),
        millis
    );

    if !output.status.success() {
        tracing::error!(
            "compilation failed for {}",
            plan.source().path.display()
        );
        tracing::error!(
            "subcommand FAILED: {}\n{}{}",
            quote_command(&info.command),
            stdout,
            stderr
        );
        bail!("compilation failed for {}", plan.source().path.display());
    }

    let deps = match env.toolchain.deps_mode() {
        DepsMode::Gnu => match &info.gnu_depfile {
            // The depfile stays next to the object for later use; here we
            // only parse it for the caller.
            Some(depfile) if depfile.exists() => {
                let parsed = std::fs::read_to_string(depfile)
                    .with_context(|| {
                        format!("failed to read dependency file: {}", depfile.display())
                    })
                    .and_then(|text| parse_mkfile_deps(&text));
                match parsed {
                    Ok(deps) => Some(deps),
                    Err(err) => {
                        tracing::warn!(
                            "failed to parse dependency file {}: {}",
                            depfile.display(),
                            err
                        );
                        None
                    }
                }
            }
            _ => None,
        },
        DepsMode::Msvc => Some(FileDeps {
            output: object_path,
            inputs: msvc_inputs,
        }),
        DepsMode::None => None,
    };

    Ok(deps)
}

/// Create one static archive. Expects the member objects to exist.
pub fn run_archive(archive: &CreateArchivePlan, env: &BuildEnv) -> Result<()> {
    let out_path = archive.archive_file_path(env);
    if let Some(parent) = out_path.parent() {
        ensure_dir(parent)?;
    }

    let command = archive.generate_archive_command(env);
    let out_rel =
        pathdiff::diff_paths(&out_path, &env.output_root).unwrap_or_else(|| out_path.clone());
    tracing::info!("[{}] archive: {}", archive.name(), out_rel.display());

    let (output, millis) = spawn_action(&command)?;
    tracing::debug!(
        "[{}] archive: {} - {}ms",
        archive.name(),
        out_rel.display(),
        millis
    );

    if !output.status.success() {
        tracing::error!("creating static library archive failed: {}", out_rel.display());
        log_failed_subcommand(&command, &output);
        bail!(
            "creating archive [{}] failed for `{}`",
            out_rel.display(),
            archive.name()
        );
    }
    Ok(())
}

/// Link one executable. Expects objects and archives to exist.
pub fn run_link(
    lib_name: &str,
    exe: &LinkExecutablePlan,
    library_archive: Option<PathBuf>,
    env: &BuildEnv,
) -> Result<()> {
    let out_path = exe.executable_path(env);
    if let Some(parent) = out_path.parent() {
        ensure_dir(parent)?;
    }

    let command = exe.generate_link_command(env, library_archive.as_deref())?;
    let out_rel =
        pathdiff::diff_paths(&out_path, &env.output_root).unwrap_or_else(|| out_path.clone());
    tracing::info!("[{}] link: {}", lib_name, out_rel.display());

    let (output, millis) = spawn_action(&command)?;
    tracing::debug!("[{}] link: {} - {}ms", lib_name, out_rel.display(), millis);

    if !output.status.success() {
        tracing::error!("linking failed for {}", out_rel.display());
        log_failed_subcommand(&command, &output);
        bail!("linking executable [{}] failed for `{}`", out_rel.display(), lib_name);
    }
    Ok(())
}

/// Spawn an argv with captured output, timing it. A spawn failure for a
/// program that is nowhere on PATH gets the clearer diagnostic.
fn spawn_action(argv: &[String]) -> Result<(std::process::Output, u128)> {
    let builder = ProcessBuilder::from_argv(argv)?;
    let start = Instant::now();
    let output = builder.exec().map_err(|err| {
        if find_executable(&argv[0]).is_none() {
            err.context(format!("executable `{}` was not found on PATH", argv[0]))
        } else {
            err
        }
    })?;
    Ok((output, start.elapsed().as_millis()))
}

fn log_failed_subcommand(command: &[String], output: &std::process::Output) {
    tracing::error!(
        "subcommand FAILED: {}\n{}{}",
        quote_command(command),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Build executor with progress reporting.
pub struct BuildExecutor<'a> {
    env: &'a BuildEnv,
    verbose: bool,
}

impl<'a> BuildExecutor<'a> {
    /// Create a new build executor.
    pub fn new(env: &'a BuildEnv) -> Self {
        BuildExecutor {
            env,
            verbose: false,
        }
    }

    /// Enable verbose output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Execute a build plan with phase-grained progress reporting.
    pub fn execute(&self, plan: &BuildPlan, jobs: Option<usize>) -> Result<()> {
        let start = Instant::now();
        let n_jobs = jobs.unwrap_or(0);

        let compile_count = plan.compile_count();
        let archive_count = plan.archive_count();
        let link_count = plan.link_count();
        let total = compile_count + archive_count + link_count;

        if self.verbose {
            eprintln!("   Compiling {} file(s)", compile_count);
            eprintln!("   Archiving {} file(s)", archive_count);
            eprintln!("     Linking {} executable(s)", link_count);
        }

        let pb = if !self.verbose && total > 1 {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        plan.compile_all(self.env, n_jobs)?;
        if let Some(pb) = &pb {
            pb.set_position(compile_count as u64);
        }
        plan.archive_all(self.env, n_jobs)?;
        if let Some(pb) = &pb {
            pb.set_position((compile_count + archive_count) as u64);
        }
        plan.link_all(self.env, n_jobs)?;

        if let Some(pb) = pb {
            pb.finish_with_message("done");
        }

        let elapsed = start.elapsed();
        eprintln!(
            "    Finished {} target(s) in {:.2}s",
            archive_count + link_count,
            elapsed.as_secs_f64()
        );

        Ok(())
    }
}
