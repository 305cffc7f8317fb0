//! Compile Macros
//!
//! Every optional compile-time shader feature is a [`MacroKind`]: a tagged
//! variant carrying its `#define` name, a stable integer identity (written
//! into binary-cache headers), its conflict set, its runtime prerequisite,
//! and any extra vertex attributes it demands. Shaders declare macros in
//! order; the declaration position becomes the macro's bit in the
//! permutation bitmask ([`ShaderMacro`]).

use crate::attributes::VertexAttributes;
use crate::capabilities::{GlCapabilities, ShaderSettings};

/// An optional compile-time shader feature.
///
/// The discriminant is the macro's *identity tag*: it must stay stable
/// across builds because it is persisted in binary-cache headers and
/// compared on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MacroKind {
    BspSurface = 0,
    VertexSkinning = 1,
    VertexAnimation = 2,
    VertexSprite = 3,
    TcgenEnvironment = 4,
    TcgenLightmap = 5,
    LightMapping = 6,
    DeluxeMapping = 7,
    HeightMapInNormalMap = 8,
    ReliefMapping = 9,
    ReflectiveSpecular = 10,
    PhysicalMapping = 11,
    DepthFade = 12,
    AlphaTesting = 13,
    LightDirectional = 14,
}

impl MacroKind {
    /// The `#define` symbol injected when this macro is active.
    #[must_use]
    pub fn define(self) -> &'static str {
        match self {
            MacroKind::BspSurface => "USE_BSP_SURFACE",
            MacroKind::VertexSkinning => "USE_VERTEX_SKINNING",
            MacroKind::VertexAnimation => "USE_VERTEX_ANIMATION",
            MacroKind::VertexSprite => "USE_VERTEX_SPRITE",
            MacroKind::TcgenEnvironment => "USE_TCGEN_ENVIRONMENT",
            MacroKind::TcgenLightmap => "USE_TCGEN_LIGHTMAP",
            MacroKind::LightMapping => "USE_LIGHT_MAPPING",
            MacroKind::DeluxeMapping => "USE_DELUXE_MAPPING",
            MacroKind::HeightMapInNormalMap => "USE_HEIGHTMAP_IN_NORMALMAP",
            MacroKind::ReliefMapping => "USE_RELIEF_MAPPING",
            MacroKind::ReflectiveSpecular => "USE_REFLECTIVE_SPECULAR",
            MacroKind::PhysicalMapping => "USE_PHYSICAL_MAPPING",
            MacroKind::DepthFade => "USE_DEPTH_FADE",
            MacroKind::AlphaTesting => "USE_ALPHA_TESTING",
            MacroKind::LightDirectional => "LIGHT_DIRECTIONAL",
        }
    }

    /// Stable identity tag persisted in binary-cache headers.
    #[must_use]
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Pairwise conflict check, order-independent: `a.conflicts_with(b)` and
    /// `b.conflicts_with(a)` agree for every declared pair.
    #[must_use]
    pub fn conflicts_with(self, other: MacroKind) -> bool {
        use MacroKind::{
            DepthFade, PhysicalMapping, ReflectiveSpecular, TcgenEnvironment, TcgenLightmap,
            VertexAnimation, VertexSkinning, VertexSprite,
        };
        matches!(
            (self, other),
            (VertexSkinning, VertexAnimation | VertexSprite)
                | (VertexAnimation, VertexSkinning | VertexSprite)
                | (VertexSprite, VertexSkinning | VertexAnimation | DepthFade)
                | (DepthFade, VertexSprite)
                | (TcgenEnvironment, TcgenLightmap)
                | (TcgenLightmap, TcgenEnvironment)
                | (ReflectiveSpecular, PhysicalMapping | VertexSprite)
                | (PhysicalMapping | VertexSprite, ReflectiveSpecular)
        )
    }

    /// Whether the runtime prerequisites for this macro are satisfied.
    ///
    /// A `false` result rejects every permutation requesting the macro; the
    /// slot is recorded as unused and never compiled.
    #[must_use]
    pub fn is_available(self, caps: &GlCapabilities, settings: &ShaderSettings) -> bool {
        match self {
            MacroKind::VertexSkinning => caps.vertex_skinning,
            MacroKind::DeluxeMapping => settings.deluxe_mapping,
            MacroKind::PhysicalMapping => settings.physical_mapping,
            // Reflective specular is not implemented for physical mapping,
            // so it rides on the classic specular toggle.
            MacroKind::ReflectiveSpecular => settings.specular_mapping,
            MacroKind::ReliefMapping => settings.relief_mapping,
            MacroKind::HeightMapInNormalMap => {
                settings.relief_mapping || settings.normal_mapping
            }
            _ => true,
        }
    }

    /// Extra vertex attributes required when this macro is active.
    #[must_use]
    pub fn extra_attributes(self) -> VertexAttributes {
        match self {
            MacroKind::VertexSkinning => VertexAttributes::BONE_FACTORS,
            MacroKind::VertexAnimation => {
                VertexAttributes::POSITION2 | VertexAttributes::QTANGENT2
            }
            _ => VertexAttributes::empty(),
        }
    }
}

/// A macro as declared by one shader: the kind plus its bit position in the
/// permutation bitmask (equal to declaration order).
#[derive(Debug, Clone, Copy)]
pub struct ShaderMacro {
    pub kind: MacroKind,
    pub bit: u32,
}

impl ShaderMacro {
    /// Single-bit mask of this macro within the permutation index.
    #[must_use]
    pub fn bit_mask(&self) -> usize {
        1 << self.bit
    }
}
