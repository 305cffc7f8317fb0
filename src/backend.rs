//! Graphics-API Boundary
//!
//! The shader system never touches the graphics API directly; everything it
//! needs from the driver is behind [`GlBackend`]. The engine's platform layer
//! implements this over its GL bindings; tests substitute a scripted mock.
//!
//! Stage and program handles are thin `Copy` newtypes around the driver's
//! object names. Using distinct newtypes prevents accidentally mixing up
//! stage and program handles.

use std::fmt;

/// Shader stage selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    /// Filename suffix used by the on-disk GLSL layout (`*_vp.glsl` /
    /// `*_fp.glsl`).
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            StageKind::Vertex => "vp",
            StageKind::Fragment => "fp",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Handle to a compiled shader stage object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageHandle(pub u32);

/// Handle to a linked shader program object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// A driver-produced program binary: an opaque format tag plus the payload,
/// exactly as returned by the driver and fed back to it verbatim.
#[derive(Debug, Clone)]
pub struct ProgramBinary {
    /// GPU-native binary format tag. Opaque, passed through.
    pub format: u32,
    /// Raw binary payload.
    pub data: Vec<u8>,
}

/// Everything the shader system asks of the graphics driver.
///
/// Compile and link failures carry the driver's info log as the error value;
/// the caller is responsible for dumping it. Binary retrieval returns `None`
/// both when unsupported and when the driver reports a zero-length binary;
/// the two cases are deliberately indistinguishable, since neither is
/// actionable beyond "don't cache".
pub trait GlBackend {
    /// Compile one stage from multiple source segments. Segments are
    /// submitted separately (not pre-concatenated) so the driver's
    /// line/segment diagnostics stay informative.
    fn compile_stage(
        &mut self,
        kind: StageKind,
        segments: &[&str],
    ) -> std::result::Result<StageHandle, String>;

    /// Link the given stages into a program. `attributes` is the fixed
    /// attribute-index-to-name association applied before linking so that
    /// attribute locations are stable across permutations. When
    /// `retrievable` is set the driver is asked to keep the binary
    /// retrievable for [`GlBackend::program_binary`].
    fn link_program(
        &mut self,
        stages: &[StageHandle],
        attributes: &[(u32, &'static str)],
        retrievable: bool,
    ) -> std::result::Result<ProgramHandle, String>;

    /// Fetch the linked program's binary, if the driver can produce one.
    fn program_binary(&mut self, program: ProgramHandle) -> Option<ProgramBinary>;

    /// Create a program directly from a previously saved binary. `None`
    /// when the driver rejects the blob (it then must not leak the handle).
    fn load_binary(&mut self, binary: &ProgramBinary) -> Option<ProgramHandle>;

    /// Uniform location lookup after a successful link.
    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<i32>;

    /// Uniform block index lookup after a successful link.
    fn uniform_block_index(&mut self, program: ProgramHandle, name: &str) -> Option<u32>;

    /// Assign a sampler uniform to a fixed texture unit. The program is
    /// bound when this is called.
    fn set_sampler_unit(&mut self, program: ProgramHandle, name: &str, unit: i32);

    /// Make `program` current, or unbind with `None`.
    fn bind_program(&mut self, program: Option<ProgramHandle>);

    fn delete_stage(&mut self, stage: StageHandle);

    fn delete_program(&mut self, program: ProgramHandle);
}
