//! Permutation Selection & Program Entries
//!
//! A permutation is one (macro bitmask, deform index) pair of a shader.
//! Selection decides whether a requested bitmask is legal, rejecting any
//! mask with conflicting macros or a macro whose runtime prerequisite is
//! missing, and produces the canonical `#define` list for legal masks.
//! Rejection is total: a permutation is never silently degraded to a
//! smaller macro set.
//!
//! [`ProgramEntry`] is the built artifact stored in the permutation arena:
//! the linked program, its transiently retained stage handles (reused when
//! deform variants link against the same compiled stages), and the
//! uniform-location / firewall bookkeeping filled in after link.

use crate::attributes::VertexAttributes;
use crate::backend::{GlBackend, ProgramHandle, StageHandle};
use crate::capabilities::{GlCapabilities, ShaderSettings};
use crate::shader::descriptor::{ShaderDescriptor, UniformDescriptor};

/// Storage index of a (macro bitmask, deform index) pair within the
/// permutation arena.
#[must_use]
pub fn storage_index(macro_index: usize, deform_index: usize, num_macros: usize) -> usize {
    macro_index + (deform_index << num_macros)
}

/// Decide whether `mask` is a legal permutation of `descriptor`'s macros.
///
/// Returns the active macro `#define` names in declaration order, or `None`
/// when the mask contains a conflicting pair or a macro with a missing
/// prerequisite. The check is pairwise and order-independent.
#[must_use]
pub fn select_permutation(
    descriptor: &ShaderDescriptor,
    mask: usize,
    caps: &GlCapabilities,
    settings: &ShaderSettings,
) -> Option<Vec<&'static str>> {
    let macros = descriptor.macros();
    let mut names = Vec::new();

    for m in macros {
        if mask & m.bit_mask() == 0 {
            continue;
        }

        for other in macros {
            if other.bit != m.bit
                && mask & other.bit_mask() != 0
                && m.kind.conflicts_with(other.kind)
            {
                return None;
            }
        }

        if !m.kind.is_available(caps, settings) {
            return None;
        }

        names.push(m.kind.define());
    }

    Some(names)
}

/// The `#define` prefix injected ahead of the assembled stage text for an
/// active macro list.
#[must_use]
pub fn macro_defines(names: &[&str]) -> String {
    let mut out = String::new();
    for name in names {
        out.push_str(&format!("#ifndef {name}\n#define {name} 1\n#endif\n"));
    }
    out
}

/// One built shader program permutation.
#[derive(Debug)]
pub struct ProgramEntry {
    /// The linked program.
    pub program: ProgramHandle,
    /// Vertex attributes this permutation consumes.
    pub attributes: VertexAttributes,
    vertex: Option<StageHandle>,
    fragment: Option<StageHandle>,
    uniform_locations: Vec<Option<i32>>,
    uniform_block_indices: Vec<Option<u32>>,
    firewall: Vec<u8>,
}

impl ProgramEntry {
    /// Resolve uniform locations, block indices (when UBOs are available)
    /// and allocate the firewall buffer for a freshly linked program.
    pub fn resolve(
        backend: &mut dyn GlBackend,
        program: ProgramHandle,
        vertex: Option<StageHandle>,
        fragment: Option<StageHandle>,
        attributes: VertexAttributes,
        descriptor: &ShaderDescriptor,
        caps: &GlCapabilities,
    ) -> Self {
        let uniform_locations = descriptor
            .uniforms()
            .iter()
            .map(|u| backend.uniform_location(program, u.name))
            .collect();

        let uniform_block_indices = if caps.uniform_buffer_object {
            descriptor
                .uniform_blocks()
                .iter()
                .map(|b| backend.uniform_block_index(program, b.name))
                .collect()
        } else {
            Vec::new()
        };

        Self {
            program,
            attributes,
            vertex,
            fragment,
            uniform_locations,
            uniform_block_indices,
            firewall: vec![0; descriptor.uniform_storage_size()],
        }
    }

    /// Location of the `index`-th declared uniform, if the linker kept it.
    #[must_use]
    pub fn uniform_location(&self, index: usize) -> Option<i32> {
        self.uniform_locations.get(index).copied().flatten()
    }

    /// Block index of the `index`-th declared uniform block.
    #[must_use]
    pub fn uniform_block_index(&self, index: usize) -> Option<u32> {
        self.uniform_block_indices.get(index).copied().flatten()
    }

    /// Redundant-upload check: compare `data` against the firewall copy of
    /// `uniform`. Returns `true` (and stores the new value) when the upload
    /// must happen; `false` when the driver already holds this value.
    /// Uniforms with a zero firewall size always report dirty.
    pub fn uniform_dirty(&mut self, uniform: &UniformDescriptor, data: &[u8]) -> bool {
        if uniform.size == 0 || data.len() != uniform.size {
            return true;
        }

        let offset = uniform.firewall_offset();
        let shadow = &mut self.firewall[offset..offset + uniform.size];
        if &shadow[..] == data {
            return false;
        }
        shadow.copy_from_slice(data);
        true
    }

    /// Compiled stage handles, when still retained.
    #[must_use]
    pub fn stages(&self) -> (Option<StageHandle>, Option<StageHandle>) {
        (self.vertex, self.fragment)
    }

    pub(crate) fn set_stages(&mut self, vertex: StageHandle, fragment: StageHandle) {
        self.vertex = Some(vertex);
        self.fragment = Some(fragment);
    }

    /// Delete the program and any retained stages through the backend.
    pub(crate) fn release(&self, backend: &mut dyn GlBackend) {
        if let Some(stage) = self.vertex {
            backend.delete_stage(stage);
        }
        if let Some(stage) = self.fragment {
            backend.delete_stage(stage);
        }
        backend.delete_program(self.program);
    }
}
