//! Pre-realization toolchain state.
//!
//! All deduction happens while filling a `ToolchainPrep` from the
//! declarative description; realization is a pure move of the finished
//! fields into the immutable [`Toolchain`].

use crate::toolchain::{DepsMode, Toolchain};

/// A toolchain under construction. Field meanings match [`Toolchain`].
#[derive(Debug, Clone, Default)]
pub struct ToolchainPrep {
    pub c_compile: Vec<String>,
    pub cxx_compile: Vec<String>,
    pub include_template: Vec<String>,
    pub external_include_template: Vec<String>,
    pub define_template: Vec<String>,
    pub link_archive: Vec<String>,
    pub link_exe: Vec<String>,
    pub warning_flags: Vec<String>,
    pub c_version_flags: Vec<String>,
    pub cxx_version_flags: Vec<String>,
    pub archive_prefix: String,
    pub archive_suffix: String,
    pub object_prefix: String,
    pub object_suffix: String,
    pub exe_prefix: String,
    pub exe_suffix: String,
    pub deps_mode: DepsMode,
}

impl ToolchainPrep {
    /// Convert the preparation into a realized toolchain.
    pub fn realize(self) -> Toolchain {
        Toolchain {
            c_compile: self.c_compile,
            cxx_compile: self.cxx_compile,
            include_template: self.include_template,
            external_include_template: self.external_include_template,
            define_template: self.define_template,
            link_archive: self.link_archive,
            link_exe: self.link_exe,
            warning_flags: self.warning_flags,
            c_version_flags: self.c_version_flags,
            cxx_version_flags: self.cxx_version_flags,
            archive_prefix: self.archive_prefix,
            archive_suffix: self.archive_suffix,
            object_prefix: self.object_prefix,
            object_suffix: self.object_suffix,
            exe_prefix: self.exe_prefix,
            exe_suffix: self.exe_suffix,
            deps_mode: self.deps_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realize_is_a_field_copy() {
        let prep = ToolchainPrep {
            c_compile: vec!["gcc".into(), "<FLAGS>".into()],
            archive_suffix: ".a".into(),
            deps_mode: DepsMode::Gnu,
            ..ToolchainPrep::default()
        };

        let tc = prep.realize();
        assert_eq!(tc.c_compile, vec!["gcc", "<FLAGS>"]);
        assert_eq!(tc.archive_suffix, ".a");
        assert_eq!(tc.deps_mode(), DepsMode::Gnu);
    }
}
