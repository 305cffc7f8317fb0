//! Error Types
//!
//! Failure taxonomy of the shader system. Source-resolution errors are fatal
//! to descriptor initialization; compile/link errors are fatal to the
//! requested permutation build; an illegal macro combination surfaces as
//! [`ShaderError::InvalidConfiguration`] on bind. Binary-cache problems are
//! *never* errors: a bad cache entry silently falls through to
//! recompilation.

use thiserror::Error;

use crate::backend::StageKind;

/// The error type for shader assembly, compilation, and binding.
#[derive(Error, Debug)]
pub enum ShaderError {
    /// No source text exists for a logical fragment path, neither in the
    /// built-in table nor in the configured external directory.
    #[error("no shader source found for '{0}'")]
    SourceNotFound(String),

    /// An external shader file exists but could not be read.
    #[error("cannot read shader source '{path}': {source}")]
    SourceIo {
        /// Logical fragment path.
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An external shader file resolved to empty text.
    #[error("shader source is empty: '{0}'")]
    EmptySource(String),

    /// The driver rejected a shader stage; the numbered source and the
    /// driver's info log have already been dumped to the log.
    #[error("couldn't compile {stage} shader: '{name}'")]
    Compile {
        /// Logical shader name.
        name: String,
        /// Stage that failed.
        stage: StageKind,
    },

    /// The driver rejected the program link; the link log has already been
    /// dumped to the log.
    #[error("shader program failed to link: '{name}'")]
    Link {
        /// Logical shader name.
        name: String,
    },

    /// The requested macro combination is illegal (conflicting macros or a
    /// missing runtime prerequisite) and can never be built.
    #[error("invalid shader configuration: shader = '{name}', macros = '{macros}'")]
    InvalidConfiguration {
        /// Logical shader name.
        name: String,
        /// Space-separated names of the requested macros.
        macros: String,
    },
}

/// Alias for `Result<T, ShaderError>`.
pub type Result<T> = std::result::Result<T, ShaderError>;
