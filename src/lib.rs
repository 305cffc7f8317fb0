//! GLSL shader permutation compilation and caching.
//!
//! A logical shader (e.g. `lightMapping`) declares a set of optional compile
//! macros; every legal combination of those macros (further multiplied by
//! per-draw vertex deform programs) is a distinct GPU program permutation.
//! This crate assembles the GLSL source for each permutation, drives the
//! graphics API (behind [`GlBackend`]) to compile and link it, and persists
//! linked program binaries to disk so later runs skip compilation entirely,
//! invalidating stale artifacts by format version, driver fingerprint, macro
//! set, and source checksum.
//!
//! Entry point is [`ShaderManager`]: register shader profiles, then either
//! [`ShaderManager::build_all`] for eager enumeration or
//! [`ShaderManager::bind`] for lazy build-on-first-use.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod attributes;
pub mod backend;
pub mod capabilities;
pub mod errors;
pub mod shader;

pub use attributes::VertexAttributes;
pub use backend::{GlBackend, ProgramBinary, ProgramHandle, StageHandle, StageKind};
pub use capabilities::{GlCapabilities, ShaderSettings};
pub use errors::{Result, ShaderError};
pub use shader::binary_cache::BinaryCache;
pub use shader::deform::{DeformStep, Waveform};
pub use shader::descriptor::{
    SamplerBinding, ShaderDescriptor, ShaderProfile, UniformBlockDescriptor, UniformDescriptor,
};
pub use shader::macros::MacroKind;
pub use shader::manager::{ShaderHandle, ShaderManager};
pub use shader::permutation::ProgramEntry;
