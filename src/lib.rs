//! Caravel - a package manager and build system for C and C++
//!
//! This crate provides the core library functionality for Caravel: the
//! toolchain abstraction that turns declarative compiler descriptions into
//! concrete command lines, build-plan construction and parallel execution,
//! the lock-protected local package repository, the dependency-solver
//! driver, and usage-requirement resolution.

pub mod builder;
pub mod core;
pub mod error;
pub mod repo;
pub mod solve;
pub mod toolchain;
pub mod usage;
pub mod util;

pub use crate::core::{Dependency, Name, PackageId, PackageManifest};
pub use crate::error::UserError;
pub use crate::repo::{IfExists, PackageCatalog, Repository, Sdist};
pub use crate::toolchain::{get_builtin, parse_toolchain_file, Toolchain};
pub use crate::usage::{UsageKey, UsageRequirementMap};
