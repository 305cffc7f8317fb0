//! Runtime Capabilities & Settings
//!
//! Read-only inputs to shader assembly: what the driver can do
//! ([`GlCapabilities`], filled in once context/driver info is known) and what
//! the user asked for ([`ShaderSettings`]). Both feed macro prerequisite
//! checks and the generated engine-constant headers; neither is mutated by
//! this crate.

use std::path::PathBuf;

use xxhash_rust::xxh3::xxh3_64;

/// Graphics-API features negotiated at context creation.
///
/// Mirrors what the platform layer reports after extension negotiation.
/// The `renderer` / `version` strings identify the driver; their checksum
/// ([`GlCapabilities::driver_fingerprint`]) stands in for "has the driver or
/// GPU changed since a program binary was written", since binaries are not
/// portable across drivers.
#[derive(Debug, Clone)]
pub struct GlCapabilities {
    /// `GL_RENDERER` string.
    pub renderer: String,
    /// `GL_VERSION` string.
    pub version: String,
    /// Shading language version, e.g. `330`.
    pub glsl_version: u32,
    /// Core (vs. compatibility) profile context.
    pub core_profile: bool,
    pub texture_rg: bool,
    pub texture_integer: bool,
    pub texture_gather: bool,
    pub gpu_shader4: bool,
    pub gpu_shader5: bool,
    pub uniform_buffer_object: bool,
    /// Hardware vertex skinning on the GPU.
    pub vertex_skinning: bool,
    /// Bone limit when `vertex_skinning` is available.
    pub max_skinning_bones: u32,
    /// `glGetProgramBinary` and friends are usable.
    pub program_binary: bool,
    /// Current framebuffer size in pixels.
    pub framebuffer_size: (u32, u32),
    /// Step between light tiles in NDC units.
    pub tile_step: (f32, f32),
}

impl Default for GlCapabilities {
    fn default() -> Self {
        Self {
            renderer: String::new(),
            version: String::new(),
            glsl_version: 330,
            core_profile: true,
            texture_rg: true,
            texture_integer: true,
            texture_gather: true,
            gpu_shader4: true,
            gpu_shader5: false,
            uniform_buffer_object: true,
            vertex_skinning: true,
            max_skinning_bones: 256,
            program_binary: true,
            framebuffer_size: (1280, 720),
            tile_step: (0.025, 0.044),
        }
    }
}

impl GlCapabilities {
    /// Checksum of the driver's identifying strings, computed once at manager
    /// construction and written into every binary-cache entry.
    #[must_use]
    pub fn driver_fingerprint(&self) -> u64 {
        let mut info = String::with_capacity(self.renderer.len() + self.version.len());
        info.push_str(&self.renderer);
        info.push_str(&self.version);
        xxh3_64(info.as_bytes())
    }
}

/// User-facing renderer settings that shape generated shader code.
///
/// Settings gate optional shader features (a disabled feature rejects every
/// permutation that requests its macro) and contribute numeric constants to
/// the engine-constant header, so the header is regenerated whenever a
/// manager is constructed.
#[derive(Debug, Clone)]
pub struct ShaderSettings {
    pub ambient_scale: f32,
    pub specular_scale: f32,
    /// Near clip plane distance.
    pub z_near: f32,

    // Feature toggles checked by macro prerequisites.
    pub normal_mapping: bool,
    pub deluxe_mapping: bool,
    pub specular_mapping: bool,
    pub physical_mapping: bool,
    pub relief_mapping: bool,
    pub glow_mapping: bool,

    pub precomputed_lighting: bool,
    pub half_lambert_lighting: bool,
    pub rim_lighting: bool,
    pub rim_exponent: f32,

    // Debug visualization toggles.
    pub show_light_maps: bool,
    pub show_deluxe_maps: bool,
    pub show_normal_maps: bool,
    pub show_material_maps: bool,

    /// Master switch for the on-disk program binary cache.
    pub binary_cache: bool,
    /// Directory holding cached program binaries. `None` disables caching.
    pub cache_dir: Option<PathBuf>,
    /// Directory of externally edited GLSL sources. Setting this overrides
    /// the built-in table and disables the binary cache, since on-disk
    /// sources are expected to change between runs.
    pub external_shader_dir: Option<PathBuf>,
}

impl Default for ShaderSettings {
    fn default() -> Self {
        Self {
            ambient_scale: 1.0,
            specular_scale: 1.0,
            z_near: 3.0,
            normal_mapping: true,
            deluxe_mapping: false,
            specular_mapping: true,
            physical_mapping: false,
            relief_mapping: false,
            glow_mapping: true,
            precomputed_lighting: true,
            half_lambert_lighting: false,
            rim_lighting: false,
            rim_exponent: 3.0,
            show_light_maps: false,
            show_deluxe_maps: false,
            show_normal_maps: false,
            show_material_maps: false,
            binary_cache: true,
            cache_dir: None,
            external_shader_dir: None,
        }
    }
}
