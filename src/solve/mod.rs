//! The dependency solver driver.
//!
//! The solving algorithm itself is PubGrub; this module adapts it to the
//! two oracles the repository provides: candidate versions by name and
//! dependency lists by concrete identity. Solving is pure and
//! deterministic given those oracles; all I/O happens behind them.

pub mod version;

use std::error::Error as StdError;
use std::fmt;

use anyhow::{bail, Result};
use pubgrub::{
    Dependencies, DefaultStringReporter, DependencyProvider, PackageResolutionStatistics, Range,
    Reporter,
};
use semver::Version;

use crate::core::name::Name;
use crate::core::{Dependency, PackageId};
use version::version_req_to_range;

/// A solver-side package: the synthetic root carrying the requested
/// dependency set, or a real package name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SolverPackage {
    Root,
    Named(Name),
}

impl fmt::Display for SolverPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverPackage::Root => write!(f, "(root)"),
            SolverPackage::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Error type bridging oracle failures through the solver.
#[derive(Debug)]
pub struct SolveFailure(String);

impl fmt::Display for SolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for SolveFailure {}

struct SolveAdapter<C, D> {
    root_deps: Vec<Dependency>,
    candidates_by_name: C,
    dependencies_of: D,
}

impl<C, D> SolveAdapter<C, D>
where
    C: Fn(&str) -> Result<Vec<PackageId>>,
{
    fn candidate_versions(&self, name: &str) -> Result<Vec<Version>, SolveFailure> {
        let ids = (self.candidates_by_name)(name)
            .map_err(|e| SolveFailure(format!("failed to list candidates for `{}`: {:#}", name, e)))?;
        Ok(ids.into_iter().map(|id| id.version().clone()).collect())
    }
}

impl<C, D> DependencyProvider for SolveAdapter<C, D>
where
    C: Fn(&str) -> Result<Vec<PackageId>>,
    D: Fn(&PackageId) -> Result<Vec<Dependency>>,
{
    type P = SolverPackage;
    type V = Version;
    type VS = Range<Version>;
    type M = String;
    type Err = SolveFailure;
    type Priority = u32;

    fn prioritize(
        &self,
        package: &Self::P,
        _range: &Self::VS,
        _stats: &PackageResolutionStatistics,
    ) -> Self::Priority {
        // Packages with few candidate versions are decided first.
        match package {
            SolverPackage::Root => 1000,
            SolverPackage::Named(name) => {
                let count = self
                    .candidate_versions(name.as_ref())
                    .map(|v| v.len())
                    .unwrap_or(0);
                (1000 - count.min(1000)) as u32
            }
        }
    }

    fn choose_version(
        &self,
        package: &Self::P,
        range: &Self::VS,
    ) -> Result<Option<Self::V>, Self::Err> {
        match package {
            SolverPackage::Root => {
                let root = Version::new(0, 0, 0);
                Ok(range.contains(&root).then_some(root))
            }
            SolverPackage::Named(name) => {
                let best = self
                    .candidate_versions(name.as_ref())?
                    .into_iter()
                    .filter(|v| range.contains(v))
                    .max();
                Ok(best)
            }
        }
    }

    fn get_dependencies(
        &self,
        package: &Self::P,
        version: &Self::V,
    ) -> Result<Dependencies<Self::P, Self::VS, Self::M>, Self::Err> {
        let deps = match package {
            SolverPackage::Root => self.root_deps.clone(),
            SolverPackage::Named(name) => {
                let id = PackageId::new(*name, version.clone());
                match (self.dependencies_of)(&id) {
                    Ok(deps) => deps,
                    Err(e) => {
                        return Ok(Dependencies::Unavailable(format!(
                            "no dependency information for {}: {:#}",
                            id, e
                        )))
                    }
                }
            }
        };

        let constraints = deps
            .iter()
            .map(|dep| {
                (
                    SolverPackage::Named(dep.name()),
                    version_req_to_range(dep.version_req()),
                )
            })
            .collect();
        Ok(Dependencies::Available(constraints))
    }
}

/// Solve a dependency set against the two oracles, yielding the concrete
/// identities that satisfy it, ordered by name then version.
pub fn solve<C, D>(deps: &[Dependency], candidates_by_name: C, dependencies_of: D) -> Result<Vec<PackageId>>
where
    C: Fn(&str) -> Result<Vec<PackageId>>,
    D: Fn(&PackageId) -> Result<Vec<Dependency>>,
{
    let adapter = SolveAdapter {
        root_deps: deps.to_vec(),
        candidates_by_name,
        dependencies_of,
    };

    match pubgrub::resolve(&adapter, SolverPackage::Root, Version::new(0, 0, 0)) {
        Ok(solution) => {
            let mut ids: Vec<PackageId> = solution
                .into_iter()
                .filter_map(|(pkg, version)| match pkg {
                    SolverPackage::Root => None,
                    SolverPackage::Named(name) => Some(PackageId::new(name, version)),
                })
                .collect();
            ids.sort();
            Ok(ids)
        }
        Err(pubgrub::PubGrubError::NoSolution(tree)) => {
            let report = DefaultStringReporter::report(&tree);
            bail!("dependency resolution failed:\n{}", report);
        }
        Err(e) => {
            bail!("dependency resolution error: {:?}", e);
        }
    }
}
