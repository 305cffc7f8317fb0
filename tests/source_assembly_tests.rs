//! Source Assembly Tests
//!
//! Tests for:
//! - Environment define block content and formatting
//! - Library concatenation with `#line 0` resets
//! - Stage header generation across GLSL versions
//! - Combined source checksum sensitivity
//! - Provider path building and line-ending normalization
//! - Driver fingerprint stability

mod common;

use common::{test_caps, test_settings};
use glweave::backend::StageKind;
use glweave::capabilities::GlCapabilities;
use glweave::shader::assembler::{
    StageHeaders, assemble_stage, environment_defines, source_checksum,
};
use glweave::shader::source::{SourceProvider, normalize_line_endings, stage_path};

// ============================================================================
// Environment block
// ============================================================================

#[test]
fn environment_block_carries_capability_defines() {
    let env = environment_defines(&test_caps(), &test_settings());

    assert!(env.contains("#define TEXTURE_RG 1"));
    assert!(env.contains("#define UNIFORM_BUFFER_OBJECT 1"));
    assert!(env.contains("#define TEXTURE_INTEGER 1"));
    assert!(env.contains("#define MAX_REF_LIGHTS 1024"));
    assert!(env.contains("#define TILE_SIZE 16"));
    assert!(env.ends_with("#line 0\n"));
}

#[test]
fn environment_floats_use_exponential_notation() {
    let env = environment_defines(&test_caps(), &test_settings());

    // pi at 8 decimal places is exact for f32
    assert!(env.contains("#define M_PI 3.14159274e0"));
    assert!(env.contains("vec2(1.28000000e3, 7.20000000e2)"));
}

#[test]
fn environment_reflects_capability_changes() {
    let caps = GlCapabilities {
        texture_rg: false,
        ..test_caps()
    };
    let env = environment_defines(&caps, &test_settings());
    assert!(!env.contains("TEXTURE_RG"));
}

// ============================================================================
// Stage assembly
// ============================================================================

#[test]
fn assembly_resets_line_counts_between_fragments() {
    let provider = SourceProvider::new(None);
    let text = assemble_stage(
        &provider,
        &test_caps(),
        &test_settings(),
        "generic",
        &["vertexSimple", "vertexSkinning"],
        StageKind::Vertex,
    )
    .unwrap();

    // one reset after the environment block, one after each library
    assert_eq!(text.matches("#line 0\n").count(), 3);
    assert!(text.contains("vertexSimple_vp.glsl"));
    assert!(text.contains("vertexSkinning_vp.glsl"));
    assert!(text.contains("generic_vp.glsl"));
}

#[test]
fn assembly_fails_on_unknown_fragment() {
    let provider = SourceProvider::new(None);
    let result = assemble_stage(
        &provider,
        &test_caps(),
        &test_settings(),
        "generic",
        &["noSuchLib"],
        StageKind::Vertex,
    );
    assert!(result.is_err());
}

#[test]
fn fragment_stage_resolves_fp_sources() {
    let provider = SourceProvider::new(None);
    let text = assemble_stage(
        &provider,
        &test_caps(),
        &test_settings(),
        "generic",
        &[],
        StageKind::Fragment,
    )
    .unwrap();
    assert!(text.contains("generic_fp.glsl"));
}

// ============================================================================
// Stage headers
// ============================================================================

#[test]
fn modern_context_uses_in_out_qualifiers() {
    let headers = StageHeaders::generate(&test_caps(), &test_settings());

    assert!(headers.version_declaration.starts_with("#version 330 core\n"));
    assert!(headers.vertex.contains("#define IN in"));
    assert!(headers.fragment.contains("#define DECLARE_OUTPUT(type) out type outputColor;"));
    assert!(headers.compat.is_empty(), "no shims needed past GLSL 120");
}

#[test]
fn legacy_context_uses_attribute_varying_and_shims() {
    let caps = GlCapabilities {
        glsl_version: 120,
        core_profile: false,
        gpu_shader4: false,
        ..test_caps()
    };
    let headers = StageHeaders::generate(&caps, &test_settings());

    assert!(headers.version_declaration.starts_with("#version 120 \n"));
    assert!(headers.vertex.contains("#define IN attribute"));
    assert!(headers.fragment.contains("#define outputColor gl_FragColor"));
    assert!(headers.compat.contains("float smoothstep"));
}

#[test]
fn extensions_promote_to_core_defines_when_version_allows() {
    let headers = StageHeaders::generate(&test_caps(), &test_settings());
    // gpu_shader4 entered core at 130, so a 330 context defines HAVE_ only
    assert!(
        headers
            .version_declaration
            .contains("#define HAVE_EXT_gpu_shader4 1")
    );
    assert!(!headers.version_declaration.contains("#extension GL_EXT_gpu_shader4"));
}

#[test]
fn extensions_require_explicit_enable_below_core_version() {
    let caps = GlCapabilities {
        glsl_version: 120,
        core_profile: false,
        ..test_caps()
    };
    let headers = StageHeaders::generate(&caps, &test_settings());
    assert!(
        headers
            .version_declaration
            .contains("#extension GL_EXT_gpu_shader4 : require")
    );
}

#[test]
fn header_segments_pick_the_stage_header() {
    let headers = StageHeaders::generate(&test_caps(), &test_settings());
    let vertex = headers.segments(StageKind::Vertex);
    let fragment = headers.segments(StageKind::Fragment);

    assert_eq!(vertex[0], headers.version_declaration);
    assert_eq!(vertex[1], headers.vertex);
    assert_eq!(fragment[1], headers.fragment);
    assert_eq!(vertex[3], headers.engine_constants);
}

// ============================================================================
// Checksum
// ============================================================================

#[test]
fn checksum_is_stable_for_identical_inputs() {
    let a = source_checksum("consts", "vertex", "fragment");
    let b = source_checksum("consts", "vertex", "fragment");
    assert_eq!(a, b);
}

#[test]
fn checksum_changes_with_any_component() {
    let base = source_checksum("consts", "vertex", "fragment");
    assert_ne!(base, source_checksum("consts2", "vertex", "fragment"));
    assert_ne!(base, source_checksum("consts", "vertex2", "fragment"));
    assert_ne!(base, source_checksum("consts", "vertex", "fragment2"));
}

// ============================================================================
// Provider
// ============================================================================

#[test]
fn stage_paths_follow_the_glsl_layout() {
    assert_eq!(stage_path("generic", StageKind::Vertex), "glsl/generic_vp.glsl");
    assert_eq!(
        stage_path("computeLight", StageKind::Fragment),
        "glsl/computeLight_fp.glsl"
    );
}

#[test]
fn builtin_resolution_finds_embedded_sources() {
    let provider = SourceProvider::new(None);
    let text = provider.resolve("glsl/deformVertexes_vp.glsl").unwrap();
    assert!(text.contains("DEFORM_STEPS"));
}

#[test]
fn crlf_line_endings_normalize_to_lf() {
    assert_eq!(normalize_line_endings("a\r\nb\r\n"), "a\nb\n");
    assert_eq!(normalize_line_endings("a\nb"), "a\nb");
}

// ============================================================================
// Driver fingerprint
// ============================================================================

#[test]
fn fingerprint_tracks_driver_strings() {
    let caps = test_caps();
    assert_eq!(caps.driver_fingerprint(), caps.driver_fingerprint());

    let other = GlCapabilities {
        version: "4.6.0 mock-532.1".to_owned(),
        ..test_caps()
    };
    assert_ne!(caps.driver_fingerprint(), other.driver_fingerprint());
}
