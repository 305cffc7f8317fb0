//! Source Assembler
//!
//! Produces the complete GLSL text for one stage of one logical shader:
//! library fragments and the main body resolved through the
//! [`SourceProvider`], prefixed by an environment block of engine-wide
//! defines. A `#line 0` reset directive follows the environment block and
//! every library fragment so that driver diagnostics stay locally
//! meaningful; the source dump on compile failure resets its line counter
//! at the same markers.
//!
//! The shared stage headers (version declaration, compatibility shims,
//! stage IN/OUT macros, engine constants) are generated once per manager
//! from the current capabilities and settings and submitted as separate
//! source segments at compile time.

use xxhash_rust::xxh3::Xxh3;

use crate::backend::StageKind;
use crate::capabilities::{GlCapabilities, ShaderSettings};
use crate::errors::Result;
use crate::shader::source::{SourceProvider, stage_path};

pub const MAX_SHADOWMAPS: u32 = 5;
pub const MAX_REF_LIGHTS: u32 = 1024;
pub const TILE_SIZE: u32 = 16;

// Epsilon for f32 is 5.96e-08, so exponential notation with 8 decimal
// places gives exact values.

fn add_define_int(out: &mut String, name: &str, value: i32) {
    out.push_str(&format!("#ifndef {name}\n#define {name} {value}\n#endif\n"));
}

fn add_define_float(out: &mut String, name: &str, value: f32) {
    out.push_str(&format!(
        "#ifndef {name}\n#define {name} {value:.8e}\n#endif\n"
    ));
}

fn add_define_vec2(out: &mut String, name: &str, v1: f32, v2: f32) {
    out.push_str(&format!(
        "#ifndef {name}\n#define {name} vec2({v1:.8e}, {v2:.8e})\n#endif\n"
    ));
}

fn add_const_int(out: &mut String, name: &str, value: i32) {
    out.push_str(&format!("const int {name} = {value};\n"));
}

fn add_const_float(out: &mut String, name: &str, value: f32) {
    out.push_str(&format!("const float {name} = {value:.8e};\n"));
}

fn add_extension(out: &mut String, supported: bool, min_glsl_version: u32, name: &str, caps: &GlCapabilities) {
    if !supported {
        // extension not available on this driver
    } else if caps.glsl_version >= min_glsl_version {
        // the extension is part of the core language
        out.push_str(&format!("#define HAVE_{name} 1\n"));
    } else {
        // extension has to be explicitly enabled
        out.push_str(&format!("#extension GL_{name} : require\n"));
        out.push_str(&format!("#define HAVE_{name} 1\n"));
    }
}

fn gen_version_declaration(caps: &GlCapabilities) -> String {
    let profile = if caps.glsl_version >= 150 {
        if caps.core_profile { "core" } else { "compatibility" }
    } else {
        ""
    };
    let mut out = format!("#version {} {profile}\n", caps.glsl_version);

    add_extension(&mut out, caps.texture_gather, 400, "ARB_texture_gather", caps);
    add_extension(&mut out, caps.gpu_shader4, 130, "EXT_gpu_shader4", caps);
    add_extension(&mut out, caps.gpu_shader5, 400, "ARB_gpu_shader5", caps);
    add_extension(
        &mut out,
        caps.uniform_buffer_object,
        140,
        "ARB_uniform_buffer_object",
        caps,
    );

    out
}

fn gen_compat_header(caps: &GlCapabilities) -> String {
    let mut out = String::new();

    // functions missing in early GLSL
    if caps.glsl_version <= 120 {
        out.push_str(
            "float smoothstep(float edge0, float edge1, float x) { float t = clamp((x - edge0) / (edge1 - edge0), 0.0, 1.0); return t * t * (3.0 - 2.0 * t); }\n",
        );
    }

    out
}

fn gen_vertex_header(caps: &GlCapabilities) -> String {
    if caps.glsl_version > 120 {
        "#define IN in\n\
         #define OUT(mode) mode out\n\
         #define textureCube texture\n\
         #define texture2D texture\n\
         #define texture2DProj textureProj\n\
         #define texture3D texture\n"
            .to_owned()
    } else {
        "#define IN attribute\n\
         #define OUT(mode) varying\n"
            .to_owned()
    }
}

fn gen_fragment_header(caps: &GlCapabilities) -> String {
    if caps.glsl_version > 120 {
        "#define IN(mode) mode in\n\
         #define DECLARE_OUTPUT(type) out type outputColor;\n\
         #define textureCube texture\n\
         #define texture2D texture\n\
         #define texture2DProj textureProj\n\
         #define texture3D texture\n"
            .to_owned()
    } else if caps.gpu_shader4 {
        "#define IN(mode) varying\n\
         #define DECLARE_OUTPUT(type) varying out type outputColor;\n"
            .to_owned()
    } else {
        "#define IN(mode) varying\n\
         #define outputColor gl_FragColor\n\
         #define DECLARE_OUTPUT(type) /* empty */\n"
            .to_owned()
    }
}

fn gen_engine_constants(caps: &GlCapabilities, settings: &ShaderSettings) -> String {
    let mut out = String::new();

    if settings.precomputed_lighting {
        add_define_int(&mut out, "r_precomputedLighting", 1);
    }

    if settings.show_light_maps {
        add_define_int(&mut out, "r_showLightMaps", 1);
    }

    if settings.show_deluxe_maps {
        add_define_int(&mut out, "r_showDeluxeMaps", 1);
    }

    if settings.show_normal_maps {
        add_define_int(&mut out, "r_showNormalMaps", 1);
    }

    if settings.show_material_maps {
        add_define_int(&mut out, "r_showMaterialMaps", 1);
    }

    if caps.vertex_skinning {
        add_define_int(&mut out, "r_vertexSkinning", 1);
        add_const_int(&mut out, "MAX_GLSL_BONES", caps.max_skinning_bones as i32);
    } else {
        add_const_int(&mut out, "MAX_GLSL_BONES", 4);
    }

    if settings.half_lambert_lighting {
        add_define_int(&mut out, "r_halfLambertLighting", 1);
    }

    if settings.rim_lighting {
        add_define_int(&mut out, "r_rimLighting", 1);
        add_const_float(&mut out, "r_RimExponent", settings.rim_exponent);
    }

    if settings.normal_mapping {
        add_define_int(&mut out, "r_normalMapping", 1);
    }

    if settings.specular_mapping {
        add_define_int(&mut out, "r_specularMapping", 1);
    }

    if settings.physical_mapping {
        add_define_int(&mut out, "r_physicalMapping", 1);
    }

    if settings.glow_mapping {
        add_define_int(&mut out, "r_glowMapping", 1);
    }

    out
}

/// The shared header snippets prepended (as separate source segments) to
/// every compiled stage.
#[derive(Debug, Clone)]
pub struct StageHeaders {
    pub version_declaration: String,
    pub compat: String,
    pub vertex: String,
    pub fragment: String,
    pub engine_constants: String,
}

impl StageHeaders {
    /// Generate all headers from the current capabilities and settings.
    #[must_use]
    pub fn generate(caps: &GlCapabilities, settings: &ShaderSettings) -> Self {
        Self {
            version_declaration: gen_version_declaration(caps),
            compat: gen_compat_header(caps),
            vertex: gen_vertex_header(caps),
            fragment: gen_fragment_header(caps),
            engine_constants: gen_engine_constants(caps, settings),
        }
    }

    /// Header segments for one stage, in submission order. The macro prefix
    /// and assembled body follow as the final segment.
    #[must_use]
    pub fn segments(&self, stage: StageKind) -> [&str; 4] {
        let stage_header = match stage {
            StageKind::Vertex => &self.vertex,
            StageKind::Fragment => &self.fragment,
        };
        [
            &self.version_declaration,
            stage_header,
            &self.compat,
            &self.engine_constants,
        ]
    }
}

/// The environment block prepended to every assembled stage: engine-wide
/// defines computed from current capabilities and settings. Not cached,
/// since settings may change between builds.
#[must_use]
pub fn environment_defines(caps: &GlCapabilities, settings: &ShaderSettings) -> String {
    let mut env = String::with_capacity(1024);

    if caps.texture_rg {
        add_define_int(&mut env, "TEXTURE_RG", 1);
    }

    if caps.uniform_buffer_object {
        add_define_int(&mut env, "UNIFORM_BUFFER_OBJECT", 1);
    }

    if caps.texture_integer {
        add_define_int(&mut env, "TEXTURE_INTEGER", 1);
    }

    add_define_float(&mut env, "r_AmbientScale", settings.ambient_scale);
    add_define_float(&mut env, "r_SpecularScale", settings.specular_scale);
    add_define_float(&mut env, "r_zNear", settings.z_near);

    add_define_float(&mut env, "M_PI", std::f32::consts::PI);
    add_define_int(&mut env, "MAX_SHADOWMAPS", MAX_SHADOWMAPS as i32);
    add_define_int(&mut env, "MAX_REF_LIGHTS", MAX_REF_LIGHTS as i32);
    add_define_int(&mut env, "TILE_SIZE", TILE_SIZE as i32);

    add_define_vec2(
        &mut env,
        "r_FBufSize",
        caps.framebuffer_size.0 as f32,
        caps.framebuffer_size.1 as f32,
    );

    add_define_vec2(&mut env, "r_tileStep", caps.tile_step.0, caps.tile_step.1);

    // Reset line counting so diagnostics point into the shader text proper.
    env.push_str("#line 0\n");

    env
}

/// Assemble the full source text for one stage of one logical shader:
/// environment block, then each library fragment, then the main body, with
/// `#line 0` resets between parts.
pub fn assemble_stage(
    provider: &SourceProvider,
    caps: &GlCapabilities,
    settings: &ShaderSettings,
    main_name: &str,
    libs: &[&str],
    stage: StageKind,
) -> Result<String> {
    let mut text = environment_defines(caps, settings);

    for lib in libs {
        text.push_str(&provider.resolve(&stage_path(lib, stage))?);
        text.push_str("#line 0\n");
    }

    text.push_str(&provider.resolve(&stage_path(main_name, stage))?);

    Ok(text)
}

/// Checksum of the fully assembled combined source: engine constants plus
/// both stage texts. Persisted per binary-cache entry; any source change
/// invalidates the entry.
#[must_use]
pub fn source_checksum(engine_constants: &str, vertex_text: &str, fragment_text: &str) -> u64 {
    let mut hasher = Xxh3::new();
    hasher.update(engine_constants.as_bytes());
    hasher.update(vertex_text.as_bytes());
    hasher.update(fragment_text.as_bytes());
    hasher.digest()
}
