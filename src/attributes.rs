//! Vertex Attributes
//!
//! Bitmask of the vertex attributes a shader (or an active macro) requires,
//! plus the fixed attribute-index-to-name table bound into every program
//! before linking. Bit position doubles as the bound attribute index, which
//! is what keeps attribute locations stable across permutations.

use bitflags::bitflags;

bitflags! {
    /// Required vertex attribute set of a shader program.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct VertexAttributes: u32 {
        const POSITION     = 1 << 0;
        const TEXCOORD     = 1 << 1;
        const LIGHTCOORD   = 1 << 2;
        const QTANGENT     = 1 << 3;
        const COLOR        = 1 << 4;
        const BONE_FACTORS = 1 << 5;
        /// Second position stream for vertex animation.
        const POSITION2    = 1 << 6;
        /// Second tangent-space stream for vertex animation.
        const QTANGENT2    = 1 << 7;
    }
}

/// GLSL attribute names, indexed by bit position.
pub const ATTRIBUTE_NAMES: [&str; 8] = [
    "attr_Position",
    "attr_TexCoord0",
    "attr_TexCoord1",
    "attr_QTangent",
    "attr_Color",
    "attr_BoneFactors",
    "attr_Position2",
    "attr_QTangent2",
];

/// The full index→name association bound before every link.
///
/// All indices are bound regardless of which attributes a permutation uses;
/// the driver ignores names that don't occur in the program.
#[must_use]
pub fn attribute_bindings() -> [(u32, &'static str); 8] {
    let mut bindings = [(0, ""); 8];
    for (i, name) in ATTRIBUTE_NAMES.iter().enumerate() {
        bindings[i] = (i as u32, *name);
    }
    bindings
}
