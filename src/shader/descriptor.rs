//! Shader Descriptors
//!
//! A [`ShaderDescriptor`] is the static definition of one logical shader:
//! name, required vertex attributes, declared macros (bit = declaration
//! order), declared uniforms and uniform blocks, library fragment lists,
//! and fixed sampler bindings. Descriptors are immutable after
//! construction and owned by the manager for its lifetime.
//!
//! Concrete shaders implement [`ShaderProfile`], a small fixed capability
//! set, and the descriptor is built from the profile in one explicit
//! registration step, so there is no dependence on construction order
//! between a shader and its member objects.

use smallvec::SmallVec;

use crate::attributes::VertexAttributes;
use crate::capabilities::GlCapabilities;
use crate::shader::macros::{MacroKind, ShaderMacro};

/// One declared uniform: its GLSL name plus the number of bytes reserved in
/// the permutation's firewall buffer for redundant-upload detection.
///
/// A size of zero opts the uniform out of firewalling (arrays and other
/// uniforms too large to be worth shadowing); such uniforms always report
/// dirty.
#[derive(Debug, Clone, Copy)]
pub struct UniformDescriptor {
    pub name: &'static str,
    pub size: usize,
    offset: usize,
}

impl UniformDescriptor {
    #[must_use]
    pub fn new(name: &'static str, size: usize) -> Self {
        Self {
            name,
            size,
            offset: 0,
        }
    }

    /// Byte offset of this uniform within the firewall buffer. Assigned at
    /// descriptor construction.
    #[must_use]
    pub fn firewall_offset(&self) -> usize {
        self.offset
    }
}

/// One declared uniform block (requires uniform-buffer-object support).
#[derive(Debug, Clone, Copy)]
pub struct UniformBlockDescriptor {
    pub name: &'static str,
}

impl UniformBlockDescriptor {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

/// A fixed sampler-name-to-texture-unit association, applied once via the
/// backend after a successful link.
#[derive(Debug, Clone, Copy)]
pub struct SamplerBinding {
    pub name: &'static str,
    pub unit: i32,
}

impl SamplerBinding {
    #[must_use]
    pub fn new(name: &'static str, unit: i32) -> Self {
        Self { name, unit }
    }
}

/// Per-shader behavior as a small fixed capability set.
///
/// Implementations are plain unit structs (see [`crate::shader::library`]);
/// everything a shader contributes beyond its GLSL text is declared here.
pub trait ShaderProfile {
    /// Stable shader name; also names the binary-cache subdirectory.
    fn name(&self) -> &'static str;

    /// Name of the main GLSL source pair, when it differs from
    /// [`ShaderProfile::name`].
    fn main_name(&self) -> &'static str {
        self.name()
    }

    /// Vertex attributes every permutation of this shader requires.
    fn required_attributes(&self) -> VertexAttributes;

    /// Optional compile macros, in declaration order. Bit positions in the
    /// permutation bitmask follow this order.
    fn macros(&self) -> &[MacroKind] {
        &[]
    }

    /// Declared uniforms, in declaration order.
    fn uniforms(&self) -> Vec<UniformDescriptor> {
        Vec::new()
    }

    /// Declared uniform blocks, in declaration order.
    fn uniform_blocks(&self) -> Vec<UniformBlockDescriptor> {
        Vec::new()
    }

    /// Library fragments concatenated ahead of the vertex main body.
    fn vertex_libs(&self) -> &'static [&'static str] {
        &[]
    }

    /// Library fragments concatenated ahead of the fragment main body.
    fn fragment_libs(&self) -> &'static [&'static str] {
        &[]
    }

    /// Fixed sampler bindings applied after link. Capability-dependent
    /// bindings (e.g. a sampler that only exists without UBO support) can
    /// inspect `caps`.
    fn sampler_bindings(&self, caps: &GlCapabilities) -> Vec<SamplerBinding> {
        let _ = caps;
        Vec::new()
    }
}

/// Immutable static definition of one logical shader.
#[derive(Debug)]
pub struct ShaderDescriptor {
    name: &'static str,
    main_name: &'static str,
    required_attributes: VertexAttributes,
    macros: Vec<ShaderMacro>,
    uniforms: Vec<UniformDescriptor>,
    uniform_blocks: Vec<UniformBlockDescriptor>,
    samplers: Vec<SamplerBinding>,
    vertex_libs: &'static [&'static str],
    fragment_libs: &'static [&'static str],
    uniform_storage_size: usize,
}

impl ShaderDescriptor {
    /// Build a descriptor from a profile: assign macro bits in declaration
    /// order and lay out the uniform firewall buffer.
    #[must_use]
    pub fn from_profile(profile: &dyn ShaderProfile, caps: &GlCapabilities) -> Self {
        let macros = profile
            .macros()
            .iter()
            .enumerate()
            .map(|(bit, &kind)| ShaderMacro {
                kind,
                bit: bit as u32,
            })
            .collect();

        let mut uniforms = profile.uniforms();
        let mut storage = 0;
        for uniform in &mut uniforms {
            uniform.offset = storage;
            storage += uniform.size;
        }

        Self {
            name: profile.name(),
            main_name: profile.main_name(),
            required_attributes: profile.required_attributes(),
            macros,
            uniforms,
            uniform_blocks: profile.uniform_blocks(),
            samplers: profile.sampler_bindings(caps),
            vertex_libs: profile.vertex_libs(),
            fragment_libs: profile.fragment_libs(),
            uniform_storage_size: storage,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn main_name(&self) -> &'static str {
        self.main_name
    }

    #[must_use]
    pub fn required_attributes(&self) -> VertexAttributes {
        self.required_attributes
    }

    #[must_use]
    pub fn macros(&self) -> &[ShaderMacro] {
        &self.macros
    }

    /// Number of declared macros; the permutation space is `2^num_macros`.
    #[must_use]
    pub fn num_macros(&self) -> usize {
        self.macros.len()
    }

    /// Size of the base (deform 0) permutation array.
    #[must_use]
    pub fn permutation_count(&self) -> usize {
        1 << self.macros.len()
    }

    #[must_use]
    pub fn uniforms(&self) -> &[UniformDescriptor] {
        &self.uniforms
    }

    #[must_use]
    pub fn uniform_blocks(&self) -> &[UniformBlockDescriptor] {
        &self.uniform_blocks
    }

    #[must_use]
    pub fn sampler_bindings(&self) -> &[SamplerBinding] {
        &self.samplers
    }

    #[must_use]
    pub fn vertex_libs(&self) -> &'static [&'static str] {
        self.vertex_libs
    }

    #[must_use]
    pub fn fragment_libs(&self) -> &'static [&'static str] {
        self.fragment_libs
    }

    /// Total firewall buffer size across all declared uniforms.
    #[must_use]
    pub fn uniform_storage_size(&self) -> usize {
        self.uniform_storage_size
    }

    /// Identity tags of the declared macros, in declaration order. Written
    /// into binary-cache headers and compared on load.
    #[must_use]
    pub fn macro_tags(&self) -> SmallVec<[u32; 16]> {
        self.macros.iter().map(|m| m.kind.tag()).collect()
    }

    /// Names of the macros set in `mask`, in declaration order.
    #[must_use]
    pub fn macro_names(&self, mask: usize) -> Vec<&'static str> {
        self.macros
            .iter()
            .filter(|m| mask & m.bit_mask() != 0)
            .map(|m| m.kind.define())
            .collect()
    }
}
