//! User-facing error types.
//!
//! Every variant carries enough context to print a one-line summary, and
//! maps to a stable error-code string (`code()`) that scripts can match on
//! instead of parsing messages.

use thiserror::Error;

/// An error caused by bad user input.
///
/// These are raised at the boundary where the bad value is first seen and
/// are recoverable by the caller; they never abort the process.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("{context}: unknown key `{key}`{hint}")]
    UnknownToolchainKey {
        context: String,
        key: String,
        hint: String,
    },

    #[error("{context}: more than one value provided for key `{key}`")]
    DuplicateToolchainKey { context: String, key: String },

    #[error("{context}: invalid value `{value}` for key `{key}`, expected `True` or `False`")]
    InvalidBool {
        context: String,
        key: String,
        value: String,
    },

    #[error("{context}: unknown Compiler-ID `{id}`")]
    UnknownCompilerId { context: String, id: String },

    #[error("{context}: unknown {key} `{value}`")]
    UnknownLanguageVersion {
        context: String,
        key: String,
        value: String,
    },

    #[error("{context}: unknown Deps-Mode `{value}`")]
    UnknownDepsMode { context: String, value: String },

    #[error("{context}: {message}")]
    ToolchainDeduction { context: String, message: String },

    #[error("{context}: malformed entry at line {line}: expected `Key: value`")]
    MalformedKeyValue { context: String, line: usize },

    #[error("no built-in toolchain named `{id}`")]
    NoSuchBuiltin { id: String },

    #[error("source distribution `{id}` is already available in the local repository")]
    SdistExists { id: String },

    #[error("more than one library is registered as `{key}`")]
    DuplicateUsageKey { key: String },

    #[error("unable to find usage requirement `{key}`{hint}")]
    UnknownUsageKey { key: String, hint: String },

    #[error("dependency cycle in usage requirements: {chain}")]
    UsageCycle { chain: String },
}

impl UserError {
    /// Stable error code for scripting.
    pub fn code(&self) -> &'static str {
        match self {
            UserError::UnknownToolchainKey { .. } => "caravel::toolchain::unknown_key",
            UserError::DuplicateToolchainKey { .. } => "caravel::toolchain::duplicate_key",
            UserError::InvalidBool { .. } => "caravel::toolchain::invalid_bool",
            UserError::UnknownCompilerId { .. } => "caravel::toolchain::unknown_compiler_id",
            UserError::UnknownLanguageVersion { .. } => {
                "caravel::toolchain::unknown_language_version"
            }
            UserError::UnknownDepsMode { .. } => "caravel::toolchain::unknown_deps_mode",
            UserError::ToolchainDeduction { .. } => "caravel::toolchain::deduction",
            UserError::MalformedKeyValue { .. } => "caravel::toolchain::malformed_line",
            UserError::NoSuchBuiltin { .. } => "caravel::toolchain::no_such_builtin",
            UserError::SdistExists { .. } => "caravel::repo::sdist_exists",
            UserError::DuplicateUsageKey { .. } => "caravel::usage::duplicate_key",
            UserError::UnknownUsageKey { .. } => "caravel::usage::unknown_key",
            UserError::UsageCycle { .. } => "caravel::usage::cycle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_and_namespaced() {
        let err = UserError::SdistExists {
            id: "foo@1.0.0".to_string(),
        };
        assert_eq!(err.code(), "caravel::repo::sdist_exists");
        assert!(err.to_string().contains("foo@1.0.0"));
    }

    #[test]
    fn unknown_key_message_carries_hint() {
        let err = UserError::UnknownToolchainKey {
            context: "tc.cvl".to_string(),
            key: "Compiler-Id".to_string(),
            hint: " (did you mean `Compiler-ID`?)".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("unknown key `Compiler-Id`"));
        assert!(msg.contains("did you mean `Compiler-ID`"));
    }
}
