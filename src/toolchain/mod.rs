//! Toolchain abstraction for C/C++ compilers.
//!
//! A toolchain is a declarative description of a compiler family that has
//! been *realized* into concrete argv templates for three operations:
//! compile one file, create a static archive, and link an executable.
//! Templates are ordered token sequences; `<FLAGS>`, `<PATH>` and `<DEF>`
//! are whole-token placeholders, while `<IN>` and `<OUT>` substitute as
//! substrings inside any token.

pub mod builtin;
pub mod from_file;
pub mod prep;

pub use builtin::get_builtin;
pub use from_file::{parse_toolchain_file, toolchain_from_pairs};
pub use prep::ToolchainPrep;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Source language of a translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C
    C,
    /// C++
    #[serde(alias = "c++", alias = "cpp")]
    Cxx,
    /// Decide from the source file extension at command-construction time.
    #[default]
    Automatic,
}

impl Language {
    /// Resolve `Automatic` from a source path: `.c` and `.C` select C,
    /// everything else selects C++.
    pub fn resolve_for(self, source_path: &Path) -> Language {
        match self {
            Language::Automatic => {
                let ext = source_path.extension().and_then(|e| e.to_str());
                if matches!(ext, Some("c") | Some("C")) {
                    Language::C
                } else {
                    Language::Cxx
                }
            }
            resolved => resolved,
        }
    }
}

/// How the toolchain reports header dependencies of a compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DepsMode {
    /// A makefile-rule dependency file, requested via `-MD -MF`.
    Gnu,
    /// `Note: including file:` lines on stdout, requested via
    /// `/showIncludes`.
    Msvc,
    /// The compiler emits no dependency information.
    #[default]
    None,
}

/// Input for compiling one source file.
#[derive(Debug, Clone)]
pub struct CompileFileSpec {
    /// Source file to compile.
    pub source_path: PathBuf,
    /// Output object file.
    pub out_path: PathBuf,
    /// Source language; `Automatic` resolves from the extension.
    pub language: Language,
    /// Include directories of the library being compiled.
    pub include_dirs: Vec<PathBuf>,
    /// Include directories of external dependencies (warnings suppressed
    /// where the family supports it).
    pub external_include_dirs: Vec<PathBuf>,
    /// Preprocessor definitions, as `NAME` or `NAME=value`.
    pub definitions: Vec<String>,
    /// Whether to pass the toolchain's warning flags.
    pub enable_warnings: bool,
}

impl Default for CompileFileSpec {
    fn default() -> Self {
        CompileFileSpec {
            source_path: PathBuf::new(),
            out_path: PathBuf::new(),
            language: Language::Automatic,
            include_dirs: Vec::new(),
            external_include_dirs: Vec::new(),
            definitions: Vec::new(),
            enable_warnings: false,
        }
    }
}

/// Input for creating a static archive.
#[derive(Debug, Clone)]
pub struct ArchiveSpec {
    /// Output archive file.
    pub out_path: PathBuf,
    /// Object files to collect, in order.
    pub input_files: Vec<PathBuf>,
}

/// Input for linking an executable.
#[derive(Debug, Clone, Default)]
pub struct LinkExeSpec {
    /// Output executable path.
    pub output: PathBuf,
    /// Objects and archives to link, in order.
    pub inputs: Vec<PathBuf>,
    /// Additional library inputs appended after `inputs`.
    pub libraries: Vec<PathBuf>,
}

/// A generated compile command, with the dependency file the compiler will
/// write when the deps mode calls for one.
#[derive(Debug, Clone)]
pub struct CompileCommand {
    /// The argv vector, program first.
    pub command: Vec<String>,
    /// Path of the makefile-format dependency file; present iff the deps
    /// mode is [`DepsMode::Gnu`].
    pub gnu_depfile: Option<PathBuf>,
}

/// A realized toolchain. All templates are concrete; realization happens in
/// [`ToolchainPrep::realize`] after the deduction rules have run.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub(crate) c_compile: Vec<String>,
    pub(crate) cxx_compile: Vec<String>,
    pub(crate) include_template: Vec<String>,
    pub(crate) external_include_template: Vec<String>,
    pub(crate) define_template: Vec<String>,
    pub(crate) link_archive: Vec<String>,
    pub(crate) link_exe: Vec<String>,
    pub(crate) warning_flags: Vec<String>,
    pub(crate) c_version_flags: Vec<String>,
    pub(crate) cxx_version_flags: Vec<String>,
    pub(crate) archive_prefix: String,
    pub(crate) archive_suffix: String,
    pub(crate) object_prefix: String,
    pub(crate) object_suffix: String,
    pub(crate) exe_prefix: String,
    pub(crate) exe_suffix: String,
    pub(crate) deps_mode: DepsMode,
}

impl Toolchain {
    /// The deps mode this toolchain compiles with.
    pub fn deps_mode(&self) -> DepsMode {
        self.deps_mode
    }

    /// Archive filename for a library base name, e.g. `foo` -> `libfoo.a`.
    pub fn archive_file_name(&self, base: &str) -> String {
        format!("{}{}{}", self.archive_prefix, base, self.archive_suffix)
    }

    /// Object filename for a source filename; the suffix is appended after
    /// the existing extension, e.g. `foo.cpp` -> `foo.cpp.o`.
    pub fn object_file_name(&self, source_file_name: &str) -> String {
        format!(
            "{}{}{}",
            self.object_prefix, source_file_name, self.object_suffix
        )
    }

    /// Executable filename for a base name.
    pub fn executable_file_name(&self, base: &str) -> String {
        format!("{}{}{}", self.exe_prefix, base, self.exe_suffix)
    }

    /// Arguments selecting one ordinary include directory.
    pub fn include_args(&self, dir: &Path) -> Vec<String> {
        expand_token(&self.include_template, "<PATH>", &dir.display().to_string())
    }

    /// Arguments selecting one external (system-style) include directory.
    pub fn external_include_args(&self, dir: &Path) -> Vec<String> {
        expand_token(
            &self.external_include_template,
            "<PATH>",
            &dir.display().to_string(),
        )
    }

    /// Arguments for one preprocessor definition.
    pub fn definition_args(&self, def: &str) -> Vec<String> {
        expand_token(&self.define_template, "<DEF>", def)
    }

    /// Generate the argv for compiling one file.
    pub fn create_compile_command(&self, spec: &CompileFileSpec) -> CompileCommand {
        let language = spec.language.resolve_for(&spec.source_path);
        let (template, version_flags) = match language {
            Language::C => (&self.c_compile, &self.c_version_flags),
            _ => (&self.cxx_compile, &self.cxx_version_flags),
        };

        let source = spec.source_path.display().to_string();
        let out = spec.out_path.display().to_string();

        let mut flags = Vec::new();
        for dir in &spec.include_dirs {
            flags.extend(self.include_args(dir));
        }
        for dir in &spec.external_include_dirs {
            flags.extend(self.external_include_args(dir));
        }
        for def in &spec.definitions {
            flags.extend(self.definition_args(def));
        }
        if spec.enable_warnings {
            flags.extend(self.warning_flags.iter().cloned());
        }
        flags.extend(version_flags.iter().cloned());

        let mut gnu_depfile = None;
        if self.deps_mode == DepsMode::Gnu {
            let depfile = PathBuf::from(format!("{}.d", out));
            flags.extend([
                "-MD".to_string(),
                "-MF".to_string(),
                depfile.display().to_string(),
                "-MT".to_string(),
                out.clone(),
            ]);
            gnu_depfile = Some(depfile);
        }

        let mut command = Vec::new();
        for arg in template {
            if arg == "<FLAGS>" {
                command.extend(flags.iter().cloned());
            } else {
                command.push(arg.replace("<IN>", &source).replace("<OUT>", &out));
            }
        }

        if self.deps_mode == DepsMode::Msvc {
            command.push("/showIncludes".to_string());
        }

        CompileCommand {
            command,
            gnu_depfile,
        }
    }

    /// Generate the argv for creating a static archive.
    pub fn create_archive_command(&self, spec: &ArchiveSpec) -> Vec<String> {
        let out = spec.out_path.display().to_string();
        let mut command = Vec::new();
        for arg in &self.link_archive {
            if arg == "<IN>" {
                command.extend(spec.input_files.iter().map(|p| p.display().to_string()));
            } else {
                command.push(arg.replace("<OUT>", &out));
            }
        }
        command
    }

    /// Generate the argv for linking an executable.
    pub fn create_link_executable_command(&self, spec: &LinkExeSpec) -> Vec<String> {
        let out = spec.output.display().to_string();
        let mut command = Vec::new();
        for arg in &self.link_exe {
            if arg == "<IN>" {
                command.extend(spec.inputs.iter().map(|p| p.display().to_string()));
                command.extend(spec.libraries.iter().map(|p| p.display().to_string()));
            } else {
                command.push(arg.replace("<OUT>", &out));
            }
        }
        command
    }
}

/// Expand a template by replacing each token equal to `placeholder` with
/// `value`. Placeholders other than `<IN>`/`<OUT>` are whole tokens.
fn expand_token(template: &[String], placeholder: &str, value: &str) -> Vec<String> {
    template
        .iter()
        .map(|tok| {
            if tok == placeholder {
                value.to_string()
            } else {
                tok.clone()
            }
        })
        .collect()
}
