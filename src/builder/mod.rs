//! Build planning and execution.

pub mod deps;
pub mod executor;
pub mod library;
pub mod plan;
pub mod source;

pub use executor::{BuildEnv, BuildExecutor};
pub use library::Library;
pub use plan::{BuildPlan, LibraryBuildParams, LibraryPlan};
pub use source::{SourceFile, SourceKind};

use std::path::PathBuf;

use anyhow::Result;

use crate::toolchain::Toolchain;
use crate::usage::UsageRequirementMap;

/// Parameters for a whole-library build.
#[derive(Debug, Clone)]
pub struct BuildParams {
    /// Root directory for build outputs.
    pub out_root: PathBuf,
    /// Compile with warning flags.
    pub enable_warnings: bool,
    /// Build application executables.
    pub build_apps: bool,
    /// Build test executables.
    pub build_tests: bool,
    /// Worker-pool size; `None` sizes it from hardware parallelism.
    pub parallel_jobs: Option<usize>,
    /// Emit per-phase counts instead of a progress bar.
    pub verbose: bool,
}

impl Default for BuildParams {
    fn default() -> Self {
        BuildParams {
            out_root: PathBuf::from("_build"),
            enable_warnings: false,
            build_apps: true,
            build_tests: true,
            parallel_jobs: None,
            verbose: false,
        }
    }
}

/// Plan and execute the build of a single library.
pub fn build(
    lib: &Library,
    toolchain: Toolchain,
    ureqs: UsageRequirementMap,
    params: &BuildParams,
) -> Result<()> {
    let lib_params = LibraryBuildParams {
        enable_warnings: params.enable_warnings,
        build_apps: params.build_apps,
        build_tests: params.build_tests,
        ..LibraryBuildParams::default()
    };

    let mut build_plan = BuildPlan::new();
    build_plan.add_library(LibraryPlan::create(lib, &lib_params)?);

    let env = BuildEnv {
        toolchain,
        output_root: params.out_root.clone(),
        ureqs,
    };

    BuildExecutor::new(&env)
        .verbose(params.verbose)
        .execute(&build_plan, params.parallel_jobs)
}
