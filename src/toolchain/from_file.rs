//! Parsing and deduction of toolchain descriptions.
//!
//! A description is an ordered `Key: value` dictionary. Most fields may be
//! omitted when a `Compiler-ID` is given; the deduction rules in this
//! module fill them in from a per-family table. Everything here produces a
//! [`ToolchainPrep`]; realization is a pure copy.

use anyhow::{Context, Result};

use crate::error::UserError;
use crate::toolchain::prep::ToolchainPrep;
use crate::toolchain::{DepsMode, Language, Toolchain};
use crate::util::dym::suggestion_for;
use crate::util::kv::{parse_kv_text, KeyValue};
use crate::util::shlex::split_shell_string;

/// Every key a toolchain description may contain.
const KNOWN_KEYS: &[&str] = &[
    "Compiler-ID",
    "C-Compiler",
    "C++-Compiler",
    "C-Version",
    "C++-Version",
    "Include-Template",
    "External-Include-Template",
    "Define-Template",
    "Warning-Flags",
    "Flags",
    "C-Flags",
    "C++-Flags",
    "Link-Flags",
    "Optimize",
    "Debug",
    "Compiler-Launcher",
    "Deps-Mode",
    "C-Compile-File",
    "C++-Compile-File",
    "Create-Archive",
    "Link-Executable",
    "Archive-Prefix",
    "Archive-Suffix",
    "Object-Prefix",
    "Object-Suffix",
    "Executable-Prefix",
    "Executable-Suffix",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Gnu,
    Clang,
    Msvc,
}

#[derive(Debug, Clone, Copy)]
enum CVersion {
    C89,
    C99,
    C11,
    C18,
}

#[derive(Debug, Clone, Copy)]
enum CxxVersion {
    Cxx98,
    Cxx03,
    Cxx11,
    Cxx14,
    Cxx17,
    Cxx20,
}

/// Parse a toolchain description document and realize it.
///
/// `context` names the origin of the text (a file path, `<command-line>`,
/// ...) for error messages.
pub fn parse_toolchain_file(text: &str, context: &str) -> Result<Toolchain> {
    let pairs = parse_kv_text(text, context)?;
    toolchain_from_pairs(&pairs, context)
}

/// Build a toolchain from an already-parsed key/value dictionary.
pub fn toolchain_from_pairs(pairs: &[KeyValue], context: &str) -> Result<Toolchain> {
    let mut compiler_id: Option<String> = None;
    let mut c_compiler: Option<String> = None;
    let mut cxx_compiler: Option<String> = None;
    let mut c_version: Option<String> = None;
    let mut cxx_version: Option<String> = None;
    let mut archive_prefix: Option<String> = None;
    let mut archive_suffix: Option<String> = None;
    let mut object_prefix: Option<String> = None;
    let mut object_suffix: Option<String> = None;
    let mut exe_prefix: Option<String> = None;
    let mut exe_suffix: Option<String> = None;
    let mut deps_mode_str: Option<String> = None;
    let mut do_debug: Option<bool> = None;
    let mut do_optimize: Option<bool> = None;
    let mut include_template: Option<Vec<String>> = None;
    let mut external_include_template: Option<Vec<String>> = None;
    let mut define_template: Option<Vec<String>> = None;
    let mut compiler_launcher: Option<Vec<String>> = None;
    let mut c_compile_file: Option<Vec<String>> = None;
    let mut cxx_compile_file: Option<Vec<String>> = None;
    let mut create_archive: Option<Vec<String>> = None;
    let mut link_executable: Option<Vec<String>> = None;
    let mut warning_flags: Option<Vec<String>> = None;
    let mut flags: Option<Vec<String>> = None;
    let mut c_flags: Option<Vec<String>> = None;
    let mut cxx_flags: Option<Vec<String>> = None;
    let mut link_flags: Option<Vec<String>> = None;

    for kv in pairs {
        let key = kv.key.as_str();
        let value = kv.value.as_str();
        match key {
            "Compiler-ID" => read_unique(context, key, &mut compiler_id, value)?,
            "C-Compiler" => read_unique(context, key, &mut c_compiler, value)?,
            "C++-Compiler" => read_unique(context, key, &mut cxx_compiler, value)?,
            "C-Version" => read_unique(context, key, &mut c_version, value)?,
            "C++-Version" => read_unique(context, key, &mut cxx_version, value)?,
            "Archive-Prefix" => read_unique(context, key, &mut archive_prefix, value)?,
            "Archive-Suffix" => read_unique(context, key, &mut archive_suffix, value)?,
            "Object-Prefix" => read_unique(context, key, &mut object_prefix, value)?,
            "Object-Suffix" => read_unique(context, key, &mut object_suffix, value)?,
            "Executable-Prefix" => read_unique(context, key, &mut exe_prefix, value)?,
            "Executable-Suffix" => read_unique(context, key, &mut exe_suffix, value)?,
            "Deps-Mode" => read_unique(context, key, &mut deps_mode_str, value)?,
            "Debug" => read_bool(context, key, &mut do_debug, value)?,
            "Optimize" => read_bool(context, key, &mut do_optimize, value)?,
            "Include-Template" => read_argv(context, key, &mut include_template, value)?,
            "External-Include-Template" => {
                read_argv(context, key, &mut external_include_template, value)?
            }
            "Define-Template" => read_argv(context, key, &mut define_template, value)?,
            "Compiler-Launcher" => read_argv(context, key, &mut compiler_launcher, value)?,
            "C-Compile-File" => read_argv(context, key, &mut c_compile_file, value)?,
            "C++-Compile-File" => read_argv(context, key, &mut cxx_compile_file, value)?,
            "Create-Archive" => read_argv(context, key, &mut create_archive, value)?,
            "Link-Executable" => read_argv(context, key, &mut link_executable, value)?,
            "Warning-Flags" => read_argv_acc(context, key, &mut warning_flags, value)?,
            "Flags" => read_argv_acc(context, key, &mut flags, value)?,
            "C-Flags" => read_argv_acc(context, key, &mut c_flags, value)?,
            "C++-Flags" => read_argv_acc(context, key, &mut cxx_flags, value)?,
            "Link-Flags" => read_argv_acc(context, key, &mut link_flags, value)?,
            unknown => {
                return Err(UserError::UnknownToolchainKey {
                    context: context.to_string(),
                    key: unknown.to_string(),
                    hint: suggestion_for(unknown, KNOWN_KEYS.iter().copied()),
                }
                .into())
            }
        }
    }

    let family = match compiler_id.as_deref() {
        None => None,
        Some("GNU") => Some(Family::Gnu),
        Some("Clang") => Some(Family::Clang),
        Some("MSVC") => Some(Family::Msvc),
        Some(other) => {
            return Err(UserError::UnknownCompilerId {
                context: context.to_string(),
                id: other.to_string(),
            }
            .into())
        }
    };
    let is_gnu_like = matches!(family, Some(Family::Gnu | Family::Clang));
    let is_msvc = family == Some(Family::Msvc);
    let optimize = do_optimize.unwrap_or(false);
    let debug = do_debug.unwrap_or(false);

    let deps_mode = match deps_mode_str.as_deref() {
        None if is_gnu_like => DepsMode::Gnu,
        None if is_msvc => DepsMode::Msvc,
        None => DepsMode::None,
        Some("GNU") => DepsMode::Gnu,
        Some("MSVC") => DepsMode::Msvc,
        Some("None") => DepsMode::None,
        Some(other) => {
            return Err(UserError::UnknownDepsMode {
                context: context.to_string(),
                value: other.to_string(),
            }
            .into())
        }
    };

    let c_version_tag = match c_version.as_deref() {
        None => None,
        Some("C89") => Some(CVersion::C89),
        Some("C99") => Some(CVersion::C99),
        Some("C11") => Some(CVersion::C11),
        Some("C18") => Some(CVersion::C18),
        Some(other) => {
            return Err(UserError::UnknownLanguageVersion {
                context: context.to_string(),
                key: "C-Version".to_string(),
                value: other.to_string(),
            }
            .into())
        }
    };
    let cxx_version_tag = match cxx_version.as_deref() {
        None => None,
        Some("C++98") => Some(CxxVersion::Cxx98),
        Some("C++03") => Some(CxxVersion::Cxx03),
        Some("C++11") => Some(CxxVersion::Cxx11),
        Some("C++14") => Some(CxxVersion::Cxx14),
        Some("C++17") => Some(CxxVersion::Cxx17),
        Some("C++20") => Some(CxxVersion::Cxx20),
        Some(other) => {
            return Err(UserError::UnknownLanguageVersion {
                context: context.to_string(),
                key: "C++-Version".to_string(),
                value: other.to_string(),
            }
            .into())
        }
    };

    let deduction_failure = |message: &str| -> anyhow::Error {
        UserError::ToolchainDeduction {
            context: context.to_string(),
            message: message.to_string(),
        }
        .into()
    };

    let c_version_flags = match c_version_tag {
        None => Vec::new(),
        Some(tag) => {
            let family = family.ok_or_else(|| {
                deduction_failure("unable to deduce flags for 'C-Version' without 'Compiler-ID'")
            })?;
            c_version_flag_table(family, tag)
        }
    };
    let cxx_version_flags = match cxx_version_tag {
        None => Vec::new(),
        Some(tag) => {
            let family = family.ok_or_else(|| {
                deduction_failure("unable to deduce flags for 'C++-Version' without 'Compiler-ID'")
            })?;
            cxx_version_flag_table(family, tag)
        }
    };

    let get_compiler = |lang: Language| -> Result<String> {
        if lang == Language::Cxx {
            if let Some(cxx) = &cxx_compiler {
                return Ok(cxx.clone());
            }
        }
        if lang == Language::C {
            if let Some(c) = &c_compiler {
                return Ok(c.clone());
            }
        }
        match family {
            Some(Family::Gnu) => Ok(if lang == Language::Cxx { "g++" } else { "gcc" }.to_string()),
            Some(Family::Clang) => {
                Ok(if lang == Language::Cxx { "clang++" } else { "clang" }.to_string())
            }
            Some(Family::Msvc) => Ok("cl.exe".to_string()),
            None => Err(deduction_failure("unable to determine what compiler to use")),
        }
    };

    let compile_template = |lang: Language, overridden: &Option<Vec<String>>| -> Result<Vec<String>> {
        if let Some(t) = overridden {
            return Ok(t.clone());
        }
        let mut cmd: Vec<String> = Vec::new();
        if let Some(launcher) = &compiler_launcher {
            cmd.extend(launcher.iter().cloned());
        }
        cmd.push(get_compiler(lang)?);
        let lang_flags = if lang == Language::Cxx { &cxx_flags } else { &c_flags };
        if let Some(lf) = lang_flags {
            cmd.extend(lf.iter().cloned());
        }
        let family = family
            .ok_or_else(|| deduction_failure("unable to deduce a compile command without 'Compiler-ID'"))?;
        match family {
            Family::Msvc => {
                let mut runtime = "/MT";
                if optimize {
                    cmd.push("/O2".to_string());
                }
                if debug {
                    cmd.extend(["/Z7".to_string(), "/DEBUG".to_string()]);
                    runtime = "/MTd";
                }
                cmd.push(runtime.to_string());
                if lang == Language::Cxx {
                    cmd.push("/EHsc".to_string());
                }
                cmd.extend(
                    ["/nologo", "/permissive-", "<FLAGS>", "/c", "<IN>", "/Fo<OUT>"]
                        .map(str::to_string),
                );
            }
            Family::Gnu | Family::Clang => {
                if optimize {
                    cmd.push("-O2".to_string());
                }
                if debug {
                    cmd.push("-g".to_string());
                }
                cmd.extend(
                    [
                        "-fPIC",
                        "-fdiagnostics-color",
                        "-pthread",
                        "<FLAGS>",
                        "-c",
                        "<IN>",
                        "-o<OUT>",
                    ]
                    .map(str::to_string),
                );
            }
        }
        if let Some(generic) = &flags {
            cmd.extend(generic.iter().cloned());
        }
        Ok(cmd)
    };

    let c_compile = compile_template(Language::C, &c_compile_file)?;
    let cxx_compile = compile_template(Language::Cxx, &cxx_compile_file)?;

    let link_exe = match link_executable {
        Some(t) => t,
        None => {
            let fam = family.ok_or_else(|| {
                deduction_failure("unable to deduce how to link executables without 'Compiler-ID'")
            })?;
            let mut cmd = match fam {
                Family::Msvc => vec![
                    get_compiler(Language::Cxx)?,
                    "/nologo".to_string(),
                    "/EHsc".to_string(),
                    "<IN>".to_string(),
                    "/Fe<OUT>".to_string(),
                ],
                Family::Gnu => vec![
                    get_compiler(Language::Cxx)?,
                    "-fPIC".to_string(),
                    "-fdiagnostics-color".to_string(),
                    "<IN>".to_string(),
                    "-pthread".to_string(),
                    "-lstdc++fs".to_string(),
                    "-o<OUT>".to_string(),
                ],
                Family::Clang => vec![
                    get_compiler(Language::Cxx)?,
                    "-fPIC".to_string(),
                    "-fdiagnostics-color".to_string(),
                    "<IN>".to_string(),
                    "-pthread".to_string(),
                    "-o<OUT>".to_string(),
                ],
            };
            if is_msvc {
                let mut runtime = "/MT";
                if optimize {
                    cmd.push("/O2".to_string());
                }
                if debug {
                    cmd.extend(["/Z7".to_string(), "/DEBUG".to_string()]);
                    runtime = "/MTd";
                }
                cmd.push(runtime.to_string());
            } else {
                if optimize {
                    cmd.push("-O2".to_string());
                }
                if debug {
                    cmd.push("-g".to_string());
                }
            }
            if let Some(lf) = &link_flags {
                cmd.extend(lf.iter().cloned());
            }
            cmd
        }
    };

    let link_archive = match create_archive {
        Some(t) => t,
        None => {
            let fam = family.ok_or_else(|| {
                deduction_failure("unable to deduce archive creation rules without 'Compiler-ID'")
            })?;
            match fam {
                Family::Msvc => ["lib", "/nologo", "/OUT:<OUT>", "<IN>"]
                    .map(str::to_string)
                    .to_vec(),
                Family::Gnu | Family::Clang => {
                    ["ar", "rcs", "<OUT>", "<IN>"].map(str::to_string).to_vec()
                }
            }
        }
    };

    let include_template = match include_template {
        Some(t) => t,
        None => {
            if is_gnu_like {
                vec!["-I".to_string(), "<PATH>".to_string()]
            } else if is_msvc {
                vec!["/I".to_string(), "<PATH>".to_string()]
            } else {
                return Err(deduction_failure(
                    "cannot deduce 'Include-Template' without 'Compiler-ID'",
                ));
            }
        }
    };
    let external_include_template = match external_include_template {
        Some(t) => t,
        // MSVC external-header support is not ready; reuse the plain
        // include arguments there.
        None if is_gnu_like => vec!["-isystem".to_string(), "<PATH>".to_string()],
        None => include_template.clone(),
    };
    let define_template = match define_template {
        Some(t) => t,
        None => {
            if is_gnu_like {
                vec!["-D".to_string(), "<DEF>".to_string()]
            } else if is_msvc {
                vec!["/D".to_string(), "<DEF>".to_string()]
            } else {
                return Err(deduction_failure(
                    "cannot deduce 'Define-Template' without 'Compiler-ID'",
                ));
            }
        }
    };

    let warning_flags = warning_flags.unwrap_or_else(|| {
        if is_msvc {
            vec!["/W4".to_string()]
        } else if is_gnu_like {
            ["-Wall", "-Wextra", "-Wpedantic", "-Wconversion"]
                .map(str::to_string)
                .to_vec()
        } else {
            // No Compiler-ID is fine here: there are just no warning flags.
            Vec::new()
        }
    });

    let archive_suffix = match archive_suffix {
        Some(s) => s,
        None if is_gnu_like => ".a".to_string(),
        None if is_msvc => ".lib".to_string(),
        None => {
            return Err(deduction_failure(
                "cannot deduce the archive file extension without 'Compiler-ID'",
            ))
        }
    };
    let object_suffix = match object_suffix {
        Some(s) => s,
        None if is_gnu_like => ".o".to_string(),
        None if is_msvc => ".obj".to_string(),
        None => {
            return Err(deduction_failure(
                "cannot deduce the object file extension without 'Compiler-ID'",
            ))
        }
    };
    let exe_suffix = exe_suffix.unwrap_or_else(|| {
        if cfg!(windows) {
            ".exe".to_string()
        } else {
            String::new()
        }
    });

    let prep = ToolchainPrep {
        c_compile,
        cxx_compile,
        include_template,
        external_include_template,
        define_template,
        link_archive,
        link_exe,
        warning_flags,
        c_version_flags,
        cxx_version_flags,
        archive_prefix: archive_prefix.unwrap_or_else(|| "lib".to_string()),
        archive_suffix,
        object_prefix: object_prefix.unwrap_or_default(),
        object_suffix,
        exe_prefix: exe_prefix.unwrap_or_default(),
        exe_suffix,
        deps_mode,
    };
    Ok(prep.realize())
}

fn c_version_flag_table(family: Family, version: CVersion) -> Vec<String> {
    match (family, version) {
        // cl.exe has no dialect switch for these C standards.
        (Family::Msvc, _) => Vec::new(),
        (_, CVersion::C89) => vec!["-std=c89".to_string()],
        (_, CVersion::C99) => vec!["-std=c99".to_string()],
        (_, CVersion::C11) => vec!["-std=c11".to_string()],
        (_, CVersion::C18) => vec!["-std=c18".to_string()],
    }
}

fn cxx_version_flag_table(family: Family, version: CxxVersion) -> Vec<String> {
    match (family, version) {
        (Family::Msvc, CxxVersion::Cxx14) => vec!["/std:c++14".to_string()],
        (Family::Msvc, CxxVersion::Cxx17) => vec!["/std:c++17".to_string()],
        (Family::Msvc, CxxVersion::Cxx20) => vec!["/std:c++latest".to_string()],
        (Family::Msvc, _) => Vec::new(),
        (_, CxxVersion::Cxx98) => vec!["-std=c++98".to_string()],
        (_, CxxVersion::Cxx03) => vec!["-std=c++03".to_string()],
        (_, CxxVersion::Cxx11) => vec!["-std=c++11".to_string()],
        (_, CxxVersion::Cxx14) => vec!["-std=c++14".to_string()],
        (_, CxxVersion::Cxx17) => vec!["-std=c++17".to_string()],
        (_, CxxVersion::Cxx20) => vec!["-std=c++20".to_string()],
    }
}

fn read_unique(
    context: &str,
    key: &str,
    slot: &mut Option<String>,
    value: &str,
) -> Result<(), UserError> {
    if slot.is_some() {
        return Err(UserError::DuplicateToolchainKey {
            context: context.to_string(),
            key: key.to_string(),
        });
    }
    *slot = Some(value.to_string());
    Ok(())
}

fn read_bool(
    context: &str,
    key: &str,
    slot: &mut Option<bool>,
    value: &str,
) -> Result<(), UserError> {
    if slot.is_some() {
        return Err(UserError::DuplicateToolchainKey {
            context: context.to_string(),
            key: key.to_string(),
        });
    }
    *slot = Some(match value {
        "True" => true,
        "False" => false,
        other => {
            return Err(UserError::InvalidBool {
                context: context.to_string(),
                key: key.to_string(),
                value: other.to_string(),
            })
        }
    });
    Ok(())
}

fn read_argv(
    context: &str,
    key: &str,
    slot: &mut Option<Vec<String>>,
    value: &str,
) -> Result<()> {
    if slot.is_some() {
        return Err(UserError::DuplicateToolchainKey {
            context: context.to_string(),
            key: key.to_string(),
        }
        .into());
    }
    *slot = Some(
        split_shell_string(value)
            .with_context(|| format!("{}: invalid value for key `{}`", context, key))?,
    );
    Ok(())
}

fn read_argv_acc(
    context: &str,
    key: &str,
    slot: &mut Option<Vec<String>>,
    value: &str,
) -> Result<()> {
    let tokens = split_shell_string(value)
        .with_context(|| format!("{}: invalid value for key `{}`", context, key))?;
    slot.get_or_insert_with(Vec::new).extend(tokens);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::CompileFileSpec;
    use std::path::PathBuf;

    fn user_error(err: &anyhow::Error) -> &UserError {
        err.downcast_ref::<UserError>().expect("expected UserError")
    }

    fn compile_argv(tc: &Toolchain, src: &str, out: &str) -> Vec<String> {
        tc.create_compile_command(&CompileFileSpec {
            source_path: PathBuf::from(src),
            out_path: PathBuf::from(out),
            ..CompileFileSpec::default()
        })
        .command
    }

    #[test]
    fn unknown_key_suggests_closest() {
        let err = parse_toolchain_file("Compiler-Id: GNU\n", "tc").unwrap_err();
        let err = user_error(&err);
        assert_eq!(err.code(), "caravel::toolchain::unknown_key");
        assert!(err.to_string().contains("did you mean `Compiler-ID`"));
    }

    #[test]
    fn duplicate_non_accumulating_key_is_an_error() {
        let err =
            parse_toolchain_file("Compiler-ID: GNU\nCompiler-ID: Clang\n", "tc").unwrap_err();
        assert_eq!(user_error(&err).code(), "caravel::toolchain::duplicate_key");
    }

    #[test]
    fn accumulating_keys_concatenate_in_order() {
        let tc = parse_toolchain_file(
            "Compiler-ID: GNU\nFlags: -fno-inline\nFlags: -fstack-protector\n",
            "tc",
        )
        .unwrap();
        let argv = compile_argv(&tc, "a.c", "a.o");
        let i = argv.iter().position(|a| a == "-fno-inline").unwrap();
        assert_eq!(argv[i + 1], "-fstack-protector");
    }

    #[test]
    fn unknown_enumerants_are_rejected() {
        let err = parse_toolchain_file("Compiler-ID: Borland\n", "tc").unwrap_err();
        assert_eq!(
            user_error(&err).code(),
            "caravel::toolchain::unknown_compiler_id"
        );

        let err = parse_toolchain_file("Compiler-ID: GNU\nC++-Version: C++19\n", "tc").unwrap_err();
        assert_eq!(
            user_error(&err).code(),
            "caravel::toolchain::unknown_language_version"
        );

        let err = parse_toolchain_file("Compiler-ID: GNU\nDeps-Mode: Strange\n", "tc").unwrap_err();
        assert_eq!(
            user_error(&err).code(),
            "caravel::toolchain::unknown_deps_mode"
        );
    }

    #[test]
    fn language_version_without_compiler_id_fails() {
        let err = parse_toolchain_file("C-Compiler: mycc\nC-Version: C99\n", "tc").unwrap_err();
        assert_eq!(user_error(&err).code(), "caravel::toolchain::deduction");
    }

    #[test]
    fn c_compile_uses_c_compiler_and_c_version() {
        let tc = parse_toolchain_file("Compiler-ID: GNU\nC-Version: C99\n", "tc").unwrap();
        let argv = compile_argv(&tc, "a.c", "a.o");
        assert_eq!(argv[0], "gcc");
        assert!(argv.contains(&"-std=c99".to_string()));
    }

    #[test]
    fn msvc_c_versions_map_to_nothing() {
        let tc = parse_toolchain_file("Compiler-ID: MSVC\nC-Version: C11\n", "tc").unwrap();
        let argv = compile_argv(&tc, "a.c", "a.obj");
        assert!(!argv.iter().any(|a| a.contains("std")));
    }

    #[test]
    fn explicit_compiler_paths_win_over_deduction() {
        let tc = parse_toolchain_file(
            "Compiler-ID: GNU\nC-Compiler: gcc-9\nC++-Compiler: g++-9\n",
            "tc",
        )
        .unwrap();
        assert_eq!(compile_argv(&tc, "a.c", "a.o")[0], "gcc-9");
        assert_eq!(compile_argv(&tc, "a.cpp", "a.o")[0], "g++-9");
    }

    #[test]
    fn compiler_launcher_prefixes_compile_commands() {
        let tc = parse_toolchain_file("Compiler-ID: GNU\nCompiler-Launcher: ccache\n", "tc")
            .unwrap();
        let argv = compile_argv(&tc, "a.cpp", "a.o");
        assert_eq!(argv[0], "ccache");
        assert_eq!(argv[1], "g++");
    }

    #[test]
    fn separate_include_and_external_include_templates() {
        let tc = parse_toolchain_file(
            "Compiler-ID: GNU\nInclude-Template: -iquote <PATH>\n",
            "tc",
        )
        .unwrap();
        assert_eq!(
            tc.include_args(std::path::Path::new("inc")),
            vec!["-iquote", "inc"]
        );
        // The external template keeps its own deduced default.
        assert_eq!(
            tc.external_include_args(std::path::Path::new("inc")),
            vec!["-isystem", "inc"]
        );
    }

    #[test]
    fn msvc_external_includes_fall_back_to_plain_includes() {
        let tc = parse_toolchain_file("Compiler-ID: MSVC\n", "tc").unwrap();
        assert_eq!(
            tc.external_include_args(std::path::Path::new("x")),
            vec!["/I", "x"]
        );
    }

    #[test]
    fn full_template_override_bypasses_deduction() {
        let tc = parse_toolchain_file(
            "Compiler-ID: GNU\nC++-Compile-File: mycc --special <FLAGS> <IN> <OUT>\n",
            "tc",
        )
        .unwrap();
        let argv = compile_argv(&tc, "a.cpp", "a.o");
        assert_eq!(argv[0], "mycc");
        assert_eq!(argv[1], "--special");
        assert!(argv.contains(&"a.cpp".to_string()));
    }

    #[test]
    fn gnu_affix_defaults() {
        let tc = parse_toolchain_file("Compiler-ID: GNU\n", "tc").unwrap();
        assert_eq!(tc.archive_file_name("foo"), "libfoo.a");
        assert_eq!(tc.object_file_name("a.cpp"), "a.cpp.o");
        if cfg!(windows) {
            assert_eq!(tc.executable_file_name("app"), "app.exe");
        } else {
            assert_eq!(tc.executable_file_name("app"), "app");
        }
    }

    #[test]
    fn clang_link_omits_stdcxxfs() {
        let gnu = parse_toolchain_file("Compiler-ID: GNU\n", "tc").unwrap();
        let clang = parse_toolchain_file("Compiler-ID: Clang\n", "tc").unwrap();
        let spec = crate::toolchain::LinkExeSpec {
            output: PathBuf::from("app"),
            inputs: vec![PathBuf::from("a.o")],
            libraries: vec![],
        };
        assert!(gnu
            .create_link_executable_command(&spec)
            .contains(&"-lstdc++fs".to_string()));
        assert!(!clang
            .create_link_executable_command(&spec)
            .contains(&"-lstdc++fs".to_string()));
    }

    #[test]
    fn link_flags_append_to_link_command() {
        let tc = parse_toolchain_file(
            "Compiler-ID: GNU\nOptimize: True\nLink-Flags: -static-libgcc\n",
            "tc",
        )
        .unwrap();
        let cmd = tc.create_link_executable_command(&crate::toolchain::LinkExeSpec {
            output: PathBuf::from("app"),
            inputs: vec![PathBuf::from("a.o")],
            libraries: vec![],
        });
        let o2 = cmd.iter().position(|a| a == "-O2").unwrap();
        let libgcc = cmd.iter().position(|a| a == "-static-libgcc").unwrap();
        assert!(o2 < libgcc);
    }

    #[test]
    fn bool_values_must_be_true_or_false() {
        let err = parse_toolchain_file("Compiler-ID: GNU\nDebug: yes\n", "tc").unwrap_err();
        assert_eq!(user_error(&err).code(), "caravel::toolchain::invalid_bool");
    }
}
