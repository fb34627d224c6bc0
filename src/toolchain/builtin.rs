//! Built-in toolchain shorthands.
//!
//! A compact identifier such as `debug:ccache:c++17:gcc-9` expands into a
//! toolchain description by peeling semantic prefixes off the front and
//! matching the residue against the known compiler patterns.

use anyhow::Result;

use crate::error::UserError;
use crate::toolchain::{from_file::parse_toolchain_file, Toolchain};

const CXX_VERSION_TAGS: &[(&str, &str)] = &[
    ("c++98:", "C++98"),
    ("c++03:", "C++03"),
    ("c++11:", "C++11"),
    ("c++14:", "C++14"),
    ("c++17:", "C++17"),
    ("c++20:", "C++20"),
];

const COMPILER_VERSION_SUFFIXES: &[&str] = &["-7", "-8", "-9", "-10", "-11", "-12", "-13"];

/// Expand a built-in toolchain identifier.
pub fn get_builtin(id: &str) -> Result<Toolchain> {
    let mut content = String::new();
    let mut rest = id;

    if let Some(r) = rest.strip_prefix("debug:") {
        content.push_str("Debug: True\n");
        rest = r;
    }
    if let Some(r) = rest.strip_prefix("ccache:") {
        content.push_str("Compiler-Launcher: ccache\n");
        rest = r;
    }
    for (tag, version) in CXX_VERSION_TAGS {
        if let Some(r) = rest.strip_prefix(tag) {
            content.push_str(&format!("C++-Version: {}\n", version));
            rest = r;
        }
    }

    let Some((c, cxx, compiler_id)) = match_compiler(rest) else {
        return Err(UserError::NoSuchBuiltin { id: id.to_string() }.into());
    };

    content.push_str(&format!("C-Compiler: {}\n", c));
    content.push_str(&format!("C++-Compiler: {}\n", cxx));
    content.push_str(&format!("Compiler-ID: {}\n", compiler_id));

    parse_toolchain_file(&content, &format!("built-in toolchain `{}`", id))
}

/// Match the residue of a shorthand against `gcc[-N]`, `clang[-N]` and
/// `msvc`, yielding the C compiler, C++ compiler, and compiler ID.
fn match_compiler(residue: &str) -> Option<(String, String, &'static str)> {
    if residue == "msvc" {
        return Some(("cl.exe".to_string(), "cl.exe".to_string(), "MSVC"));
    }

    let (c_base, cxx_base, compiler_id) = if residue.starts_with("gcc") {
        ("gcc", "g++", "GNU")
    } else if residue.starts_with("clang") {
        ("clang", "clang++", "Clang")
    } else {
        return None;
    };

    let suffix = COMPILER_VERSION_SUFFIXES
        .iter()
        .find(|s| residue.ends_with(**s))
        .copied()
        .unwrap_or("");

    let c_name = format!("{}{}", c_base, suffix);
    if c_name != residue {
        return None;
    }
    Some((c_name, format!("{}{}", cxx_base, suffix), compiler_id))
}
