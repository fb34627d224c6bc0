//! Build plan construction.
//!
//! Plans are immutable value trees: a [`BuildPlan`] owns library plans, a
//! library plan owns its optional archive plan and its link-executable
//! plans, and those own their compile-file plans. No node references
//! another except by ownership, so execution can walk the tree freely.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::executor::BuildEnv;
use crate::builder::library::Library;
use crate::builder::source::{executable_stem, SourceFile, SourceKind};
use crate::core::name::Name;
use crate::toolchain::{ArchiveSpec, CompileCommand, CompileFileSpec, Language, LinkExeSpec};
use crate::usage::UsageKey;

/// Compilation settings shared by the translation units of one library.
#[derive(Debug, Clone, Default)]
pub struct CompileRules {
    /// Include directories of the library itself.
    pub include_dirs: Vec<PathBuf>,
    /// Preprocessor definitions, as `NAME` or `NAME=value`.
    pub definitions: Vec<String>,
    /// Whether to compile with the toolchain's warning flags.
    pub enable_warnings: bool,
    /// Libraries whose headers these translation units may include.
    pub uses: Vec<UsageKey>,
}

/// The intent to compile a single source file.
#[derive(Debug, Clone)]
pub struct CompileFilePlan {
    rules: CompileRules,
    source: SourceFile,
    qualifier: Name,
    subdir: PathBuf,
}

impl CompileFilePlan {
    /// Create a compile plan for one source file.
    pub fn new(
        rules: CompileRules,
        source: SourceFile,
        qualifier: Name,
        subdir: impl Into<PathBuf>,
    ) -> Self {
        CompileFilePlan {
            rules,
            source,
            qualifier,
            subdir: subdir.into(),
        }
    }

    /// The source file being compiled.
    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    /// The owning library's name, used to label log output.
    pub fn qualifier(&self) -> Name {
        self.qualifier
    }

    /// The compile rules for this file.
    pub fn rules(&self) -> &CompileRules {
        &self.rules
    }

    /// Where the object file will be written: the plan subdirectory plus
    /// the source path relative to its root, with the toolchain's object
    /// suffix appended (`foo.cpp` -> `foo.cpp.o`).
    pub fn object_file_path(&self, env: &BuildEnv) -> PathBuf {
        let rel = self.source.relative_path();
        let file_name = env
            .toolchain
            .object_file_name(&rel.file_name().unwrap_or_default().to_string_lossy());
        let mut out = env.output_root.join(&self.subdir);
        if let Some(parent) = rel.parent() {
            if !parent.as_os_str().is_empty() {
                out = out.join(parent);
            }
        }
        out.join(file_name)
    }

    /// Generate the compile argv for this file. Include paths of `uses`
    /// entries are resolved through the usage-requirement map and passed
    /// as external include directories.
    pub fn generate_compile_command(&self, env: &BuildEnv) -> Result<CompileCommand> {
        let mut external_include_dirs = Vec::new();
        for key in &self.rules.uses {
            external_include_dirs.extend(env.ureqs.include_paths(key)?);
        }
        let spec = CompileFileSpec {
            source_path: self.source.path.clone(),
            out_path: self.object_file_path(env),
            language: Language::Automatic,
            include_dirs: self.rules.include_dirs.clone(),
            external_include_dirs,
            definitions: self.rules.definitions.clone(),
            enable_warnings: self.rules.enable_warnings,
        };
        Ok(env.toolchain.create_compile_command(&spec))
    }
}

/// The intent to collect a library's objects into a static archive.
#[derive(Debug, Clone)]
pub struct CreateArchivePlan {
    name: Name,
    subdir: PathBuf,
    compile_files: Vec<CompileFilePlan>,
}

impl CreateArchivePlan {
    /// Create an archive plan owning the compile plans of its members.
    pub fn new(
        name: Name,
        subdir: impl Into<PathBuf>,
        compile_files: Vec<CompileFilePlan>,
    ) -> Self {
        CreateArchivePlan {
            name,
            subdir: subdir.into(),
            compile_files,
        }
    }

    /// Base name of the archive (not the filename).
    pub fn name(&self) -> Name {
        self.name
    }

    /// The compile plans whose objects form this archive.
    pub fn compile_files(&self) -> &[CompileFilePlan] {
        &self.compile_files
    }

    /// Where the archive will be written, e.g. `<out>/libfoo.a` for GNU
    /// toolchains.
    pub fn archive_file_path(&self, env: &BuildEnv) -> PathBuf {
        env.output_root
            .join(&self.subdir)
            .join(env.toolchain.archive_file_name(self.name.as_ref()))
    }

    /// Generate the archiver argv, given all member objects exist.
    pub fn generate_archive_command(&self, env: &BuildEnv) -> Vec<String> {
        let spec = ArchiveSpec {
            out_path: self.archive_file_path(env),
            input_files: self
                .compile_files
                .iter()
                .map(|cf| cf.object_file_path(env))
                .collect(),
        };
        env.toolchain.create_archive_command(&spec)
    }
}

/// The intent to link one executable from an entry-point source.
#[derive(Debug, Clone)]
pub struct LinkExecutablePlan {
    extra_inputs: Vec<PathBuf>,
    links: Vec<UsageKey>,
    compile_file: CompileFilePlan,
    out_subdir: PathBuf,
    name: String,
}

impl LinkExecutablePlan {
    /// Create a link plan owning the compile plan of its entry source.
    pub fn new(
        extra_inputs: Vec<PathBuf>,
        links: Vec<UsageKey>,
        compile_file: CompileFilePlan,
        out_subdir: impl Into<PathBuf>,
        name: impl Into<String>,
    ) -> Self {
        LinkExecutablePlan {
            extra_inputs,
            links,
            compile_file,
            out_subdir: out_subdir.into(),
            name: name.into(),
        }
    }

    /// Base name of the executable.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The compile plan for the entry source.
    pub fn compile_file(&self) -> &CompileFilePlan {
        &self.compile_file
    }

    /// Where the executable will be written.
    pub fn executable_path(&self, env: &BuildEnv) -> PathBuf {
        env.output_root
            .join(&self.out_subdir)
            .join(env.toolchain.executable_file_name(&self.name))
    }

    /// Generate the linker argv. Inputs are the entry object, the owning
    /// library's archive when it has one, and the transitive link paths of
    /// every usage key; extra inputs (test harness archives) follow.
    pub fn generate_link_command(
        &self,
        env: &BuildEnv,
        library_archive: Option<&Path>,
    ) -> Result<Vec<String>> {
        let mut inputs = vec![self.compile_file.object_file_path(env)];
        if let Some(archive) = library_archive {
            inputs.push(archive.to_path_buf());
        }
        for key in &self.links {
            inputs.extend(env.ureqs.link_paths(key)?);
        }
        let spec = LinkExeSpec {
            output: self.executable_path(env),
            inputs,
            libraries: self.extra_inputs.clone(),
        };
        Ok(env.toolchain.create_link_executable_command(&spec))
    }
}

/// Parameters for building one library's plan.
#[derive(Debug, Clone)]
pub struct LibraryBuildParams {
    /// Subdirectory of the build output root for this library.
    pub out_subdir: PathBuf,
    /// Compile with warning flags.
    pub enable_warnings: bool,
    /// Generate executables for `*.main.*` sources.
    pub build_apps: bool,
    /// Generate executables for `*.test.*` sources.
    pub build_tests: bool,
    /// Additional `uses` keys visible only to test sources.
    pub test_uses: Vec<UsageKey>,
    /// Additional linker inputs for test executables.
    pub test_link_files: Vec<PathBuf>,
}

impl Default for LibraryBuildParams {
    fn default() -> Self {
        LibraryBuildParams {
            out_subdir: PathBuf::new(),
            enable_warnings: false,
            build_apps: true,
            build_tests: true,
            test_uses: Vec::new(),
            test_link_files: Vec::new(),
        }
    }
}

/// The complete plan for one library: an optional archive and the
/// executables of its entry-point sources.
#[derive(Debug, Clone)]
pub struct LibraryPlan {
    name: Name,
    archive: Option<CreateArchivePlan>,
    executables: Vec<LinkExecutablePlan>,
}

impl LibraryPlan {
    /// Build the plan for a library.
    pub fn create(lib: &Library, params: &LibraryBuildParams) -> Result<LibraryPlan> {
        // Sources split three ways; headers participate in no action.
        let mut app_sources = Vec::new();
        let mut test_sources = Vec::new();
        let mut lib_sources = Vec::new();

        let src_dir = lib.src_dir();
        if src_dir.exists() {
            for sf in src_dir.collect_sources()? {
                match sf.kind {
                    SourceKind::Source => lib_sources.push(sf),
                    SourceKind::App if params.build_apps => app_sources.push(sf),
                    SourceKind::Test if params.build_tests => test_sources.push(sf),
                    _ => {}
                }
            }
        }

        let mut compile_rules = lib.base_compile_rules();
        compile_rules.enable_warnings = params.enable_warnings;
        compile_rules.uses = lib.manifest().uses.clone();

        let obj_subdir = params.out_subdir.join("obj");

        let lib_compile_files: Vec<CompileFilePlan> = lib_sources
            .into_iter()
            .map(|sf| CompileFilePlan::new(compile_rules.clone(), sf, lib.name(), &obj_subdir))
            .collect();

        let archive = if lib_compile_files.is_empty() {
            None
        } else {
            Some(CreateArchivePlan::new(
                lib.name(),
                &params.out_subdir,
                lib_compile_files,
            ))
        };

        // Executables link everything the library uses and links.
        let mut links = lib.manifest().uses.clone();
        links.extend(lib.manifest().links.iter().copied());

        // Tests may see additional usage requirements and linker inputs.
        let mut test_rules = compile_rules.clone();
        test_rules.uses.extend(params.test_uses.iter().copied());
        let mut test_links = links.clone();
        test_links.extend(params.test_uses.iter().copied());

        let mut executables = Vec::new();
        for source in app_sources.into_iter().chain(test_sources) {
            let is_test = source.kind == SourceKind::Test;
            let subdir_base = if is_test {
                params.out_subdir.join("test")
            } else {
                params.out_subdir.clone()
            };
            // Executables land in a subdirectory mirroring the source tree.
            let rel_parent = source
                .relative_path()
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let subdir = if rel_parent.as_os_str().is_empty() {
                subdir_base
            } else {
                subdir_base.join(rel_parent)
            };
            let rules = if is_test {
                test_rules.clone()
            } else {
                compile_rules.clone()
            };
            let extra_inputs = if is_test {
                params.test_link_files.clone()
            } else {
                Vec::new()
            };
            let exe_links = if is_test {
                test_links.clone()
            } else {
                links.clone()
            };
            let name = executable_stem(&source.path);
            executables.push(LinkExecutablePlan::new(
                extra_inputs,
                exe_links,
                CompileFilePlan::new(rules, source, lib.name(), &obj_subdir),
                subdir,
                name,
            ));
        }

        Ok(LibraryPlan {
            name: lib.name(),
            archive,
            executables,
        })
    }

    /// The library's name.
    pub fn name(&self) -> Name {
        self.name
    }

    /// The archive plan, absent when the library has no regular sources.
    pub fn archive(&self) -> Option<&CreateArchivePlan> {
        self.archive.as_ref()
    }

    /// The link-executable plans, apps before tests.
    pub fn executables(&self) -> &[LinkExecutablePlan] {
        &self.executables
    }
}

/// An ordered list of library plans. Libraries must appear after the
/// libraries they depend on so their archives exist by link time.
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    libraries: Vec<LibraryPlan>,
}

impl BuildPlan {
    /// Create an empty build plan.
    pub fn new() -> Self {
        BuildPlan::default()
    }

    /// Append a library plan.
    pub fn add_library(&mut self, lib: LibraryPlan) {
        self.libraries.push(lib);
    }

    /// The library plans, in build order.
    pub fn libraries(&self) -> &[LibraryPlan] {
        &self.libraries
    }

    /// Total number of compile actions.
    pub fn compile_count(&self) -> usize {
        self.libraries
            .iter()
            .map(|lib| {
                lib.archive().map_or(0, |a| a.compile_files().len()) + lib.executables().len()
            })
            .sum()
    }

    /// Total number of archive actions.
    pub fn archive_count(&self) -> usize {
        self.libraries.iter().filter(|l| l.archive().is_some()).count()
    }

    /// Total number of link actions.
    pub fn link_count(&self) -> usize {
        self.libraries.iter().map(|l| l.executables().len()).sum()
    }
}
