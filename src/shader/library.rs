//! Stock Shader Profiles
//!
//! The engine's built-in logical shaders, each a unit struct implementing
//! [`ShaderProfile`]. Uniform firewall sizes follow the GLSL type: 4 bytes
//! per float, 12/16 per vec3/vec4, 64 per mat4; array uniforms opt out of
//! firewalling with size 0.

use crate::attributes::VertexAttributes;
use crate::capabilities::GlCapabilities;
use crate::shader::descriptor::{
    SamplerBinding, ShaderProfile, UniformBlockDescriptor, UniformDescriptor,
};
use crate::shader::macros::MacroKind;

const VERTEX_LIBS: &[&str] = &[
    "vertexSimple",
    "vertexSkinning",
    "vertexAnimation",
    "vertexSprite",
];

const VERTEX_LIBS_NO_SPRITE: &[&str] = &["vertexSimple", "vertexSkinning", "vertexAnimation"];

/// General-purpose single-texture shader.
pub struct Generic;

impl ShaderProfile for Generic {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn required_attributes(&self) -> VertexAttributes {
        VertexAttributes::POSITION | VertexAttributes::TEXCOORD | VertexAttributes::QTANGENT
    }

    fn macros(&self) -> &[MacroKind] {
        &[
            MacroKind::VertexSkinning,
            MacroKind::VertexAnimation,
            MacroKind::VertexSprite,
            MacroKind::TcgenEnvironment,
            MacroKind::TcgenLightmap,
            MacroKind::DepthFade,
            MacroKind::AlphaTesting,
        ]
    }

    fn uniforms(&self) -> Vec<UniformDescriptor> {
        vec![
            UniformDescriptor::new("u_TextureMatrix", 64),
            UniformDescriptor::new("u_ViewOrigin", 12),
            UniformDescriptor::new("u_ViewUp", 12),
            UniformDescriptor::new("u_AlphaThreshold", 4),
            UniformDescriptor::new("u_ModelMatrix", 64),
            UniformDescriptor::new("u_ProjectionMatrixTranspose", 64),
            UniformDescriptor::new("u_ModelViewProjectionMatrix", 64),
            UniformDescriptor::new("u_ColorModulate", 16),
            UniformDescriptor::new("u_Color", 16),
            UniformDescriptor::new("u_Bones", 0),
            UniformDescriptor::new("u_VertexInterpolation", 4),
            UniformDescriptor::new("u_DepthScale", 4),
        ]
    }

    fn vertex_libs(&self) -> &'static [&'static str] {
        VERTEX_LIBS
    }

    fn sampler_bindings(&self, _caps: &GlCapabilities) -> Vec<SamplerBinding> {
        vec![
            SamplerBinding::new("u_ColorMap", 0),
            SamplerBinding::new("u_DepthMap", 1),
        ]
    }
}

/// World-surface lighting with lightmaps, deluxe maps, and per-pixel
/// material response.
pub struct LightMapping;

impl ShaderProfile for LightMapping {
    fn name(&self) -> &'static str {
        "lightMapping"
    }

    fn required_attributes(&self) -> VertexAttributes {
        VertexAttributes::POSITION
            | VertexAttributes::TEXCOORD
            | VertexAttributes::QTANGENT
            | VertexAttributes::COLOR
    }

    fn macros(&self) -> &[MacroKind] {
        &[
            MacroKind::BspSurface,
            MacroKind::VertexSkinning,
            MacroKind::VertexAnimation,
            MacroKind::LightMapping,
            MacroKind::DeluxeMapping,
            MacroKind::HeightMapInNormalMap,
            MacroKind::ReliefMapping,
            MacroKind::ReflectiveSpecular,
            MacroKind::PhysicalMapping,
        ]
    }

    fn uniforms(&self) -> Vec<UniformDescriptor> {
        vec![
            UniformDescriptor::new("u_TextureMatrix", 64),
            UniformDescriptor::new("u_SpecularExponent", 8),
            UniformDescriptor::new("u_ColorModulate", 16),
            UniformDescriptor::new("u_Color", 16),
            UniformDescriptor::new("u_AlphaThreshold", 4),
            UniformDescriptor::new("u_ViewOrigin", 12),
            UniformDescriptor::new("u_ModelMatrix", 64),
            UniformDescriptor::new("u_ModelViewProjectionMatrix", 64),
            UniformDescriptor::new("u_Bones", 0),
            UniformDescriptor::new("u_VertexInterpolation", 4),
            UniformDescriptor::new("u_ReliefDepthScale", 4),
            UniformDescriptor::new("u_ReliefOffsetBias", 4),
            UniformDescriptor::new("u_NormalScale", 12),
            UniformDescriptor::new("u_EnvironmentInterpolation", 4),
            UniformDescriptor::new("u_LightWrapAround", 4),
            UniformDescriptor::new("u_LightGridOrigin", 12),
            UniformDescriptor::new("u_LightGridScale", 12),
            UniformDescriptor::new("u_numLights", 4),
        ]
    }

    fn uniform_blocks(&self) -> Vec<UniformBlockDescriptor> {
        vec![UniformBlockDescriptor::new("u_Lights")]
    }

    fn vertex_libs(&self) -> &'static [&'static str] {
        VERTEX_LIBS
    }

    fn fragment_libs(&self) -> &'static [&'static str] {
        &["computeLight", "reliefMapping"]
    }

    fn sampler_bindings(&self, caps: &GlCapabilities) -> Vec<SamplerBinding> {
        let mut samplers = vec![
            SamplerBinding::new("u_DiffuseMap", 0),
            SamplerBinding::new("u_NormalMap", 1),
            SamplerBinding::new("u_HeightMap", 2),
            SamplerBinding::new("u_MaterialMap", 3),
            SamplerBinding::new("u_LightMap", 4),
            SamplerBinding::new("u_DeluxeMap", 5),
            SamplerBinding::new("u_GlowMap", 6),
            SamplerBinding::new("u_EnvironmentMap0", 7),
            SamplerBinding::new("u_EnvironmentMap1", 8),
            SamplerBinding::new("u_LightTiles", 9),
        ];
        if !caps.uniform_buffer_object {
            // without UBO support the light list is a texture
            samplers.push(SamplerBinding::new("u_Lights", 10));
        }
        samplers
    }
}

/// Depth/color fill into shadow maps.
pub struct ShadowFill;

impl ShaderProfile for ShadowFill {
    fn name(&self) -> &'static str {
        "shadowFill"
    }

    fn required_attributes(&self) -> VertexAttributes {
        VertexAttributes::POSITION | VertexAttributes::TEXCOORD | VertexAttributes::QTANGENT
    }

    fn macros(&self) -> &[MacroKind] {
        &[
            MacroKind::VertexSkinning,
            MacroKind::VertexAnimation,
            MacroKind::LightDirectional,
        ]
    }

    fn uniforms(&self) -> Vec<UniformDescriptor> {
        vec![
            UniformDescriptor::new("u_TextureMatrix", 64),
            UniformDescriptor::new("u_ViewOrigin", 12),
            UniformDescriptor::new("u_AlphaThreshold", 4),
            UniformDescriptor::new("u_LightOrigin", 12),
            UniformDescriptor::new("u_LightRadius", 4),
            UniformDescriptor::new("u_ModelMatrix", 64),
            UniformDescriptor::new("u_ModelViewProjectionMatrix", 64),
            UniformDescriptor::new("u_Color", 16),
            UniformDescriptor::new("u_Bones", 0),
            UniformDescriptor::new("u_VertexInterpolation", 4),
        ]
    }

    fn vertex_libs(&self) -> &'static [&'static str] {
        VERTEX_LIBS_NO_SPRITE
    }

    fn sampler_bindings(&self, _caps: &GlCapabilities) -> Vec<SamplerBinding> {
        vec![SamplerBinding::new("u_ColorMap", 0)]
    }
}

/// Sky dome / cube rendering.
pub struct Skybox;

impl ShaderProfile for Skybox {
    fn name(&self) -> &'static str {
        "skybox"
    }

    fn required_attributes(&self) -> VertexAttributes {
        VertexAttributes::POSITION
    }

    fn uniforms(&self) -> Vec<UniformDescriptor> {
        vec![
            UniformDescriptor::new("u_ViewOrigin", 12),
            UniformDescriptor::new("u_ModelMatrix", 64),
            UniformDescriptor::new("u_ModelViewProjectionMatrix", 64),
        ]
    }

    fn sampler_bindings(&self, _caps: &GlCapabilities) -> Vec<SamplerBinding> {
        vec![SamplerBinding::new("u_ColorMap", 0)]
    }
}

/// Quake3-style volumetric fog.
pub struct FogQuake3;

impl ShaderProfile for FogQuake3 {
    fn name(&self) -> &'static str {
        "fogQuake3"
    }

    fn required_attributes(&self) -> VertexAttributes {
        VertexAttributes::POSITION | VertexAttributes::QTANGENT
    }

    fn macros(&self) -> &[MacroKind] {
        &[MacroKind::VertexSkinning, MacroKind::VertexAnimation]
    }

    fn uniforms(&self) -> Vec<UniformDescriptor> {
        vec![
            UniformDescriptor::new("u_ModelMatrix", 64),
            UniformDescriptor::new("u_ModelViewProjectionMatrix", 64),
            UniformDescriptor::new("u_Color", 16),
            UniformDescriptor::new("u_Bones", 0),
            UniformDescriptor::new("u_VertexInterpolation", 4),
            UniformDescriptor::new("u_FogDistanceVector", 16),
            UniformDescriptor::new("u_FogDepthVector", 16),
            UniformDescriptor::new("u_FogEyeT", 4),
        ]
    }

    fn vertex_libs(&self) -> &'static [&'static str] {
        VERTEX_LIBS_NO_SPRITE
    }

    fn sampler_bindings(&self, _caps: &GlCapabilities) -> Vec<SamplerBinding> {
        vec![SamplerBinding::new("u_ColorMap", 0)]
    }
}

/// Screen-space refraction for heat shimmer and similar effects.
pub struct HeatHaze;

impl ShaderProfile for HeatHaze {
    fn name(&self) -> &'static str {
        "heatHaze"
    }

    fn required_attributes(&self) -> VertexAttributes {
        VertexAttributes::POSITION | VertexAttributes::TEXCOORD | VertexAttributes::QTANGENT
    }

    fn macros(&self) -> &[MacroKind] {
        &[
            MacroKind::VertexSkinning,
            MacroKind::VertexAnimation,
            MacroKind::VertexSprite,
        ]
    }

    fn uniforms(&self) -> Vec<UniformDescriptor> {
        vec![
            UniformDescriptor::new("u_TextureMatrix", 64),
            UniformDescriptor::new("u_ViewOrigin", 12),
            UniformDescriptor::new("u_ViewUp", 12),
            UniformDescriptor::new("u_DeformMagnitude", 4),
            UniformDescriptor::new("u_ModelMatrix", 64),
            UniformDescriptor::new("u_ModelViewProjectionMatrix", 64),
            UniformDescriptor::new("u_ModelViewMatrixTranspose", 64),
            UniformDescriptor::new("u_ProjectionMatrixTranspose", 64),
            UniformDescriptor::new("u_ColorModulate", 16),
            UniformDescriptor::new("u_Color", 16),
            UniformDescriptor::new("u_Bones", 0),
            UniformDescriptor::new("u_NormalScale", 12),
            UniformDescriptor::new("u_VertexInterpolation", 4),
        ]
    }

    fn vertex_libs(&self) -> &'static [&'static str] {
        VERTEX_LIBS
    }

    fn fragment_libs(&self) -> &'static [&'static str] {
        &["reliefMapping"]
    }

    fn sampler_bindings(&self, _caps: &GlCapabilities) -> Vec<SamplerBinding> {
        vec![
            SamplerBinding::new("u_NormalMap", 0),
            SamplerBinding::new("u_CurrentMap", 1),
            SamplerBinding::new("u_HeightMap", 15),
        ]
    }
}

/// Water surfaces: refraction, fresnel, fog.
pub struct Liquid;

impl ShaderProfile for Liquid {
    fn name(&self) -> &'static str {
        "liquid"
    }

    fn required_attributes(&self) -> VertexAttributes {
        VertexAttributes::POSITION | VertexAttributes::TEXCOORD | VertexAttributes::QTANGENT
    }

    fn macros(&self) -> &[MacroKind] {
        &[MacroKind::HeightMapInNormalMap, MacroKind::ReliefMapping]
    }

    fn uniforms(&self) -> Vec<UniformDescriptor> {
        vec![
            UniformDescriptor::new("u_TextureMatrix", 64),
            UniformDescriptor::new("u_ViewOrigin", 12),
            UniformDescriptor::new("u_RefractionIndex", 4),
            UniformDescriptor::new("u_ModelMatrix", 64),
            UniformDescriptor::new("u_ModelViewProjectionMatrix", 64),
            UniformDescriptor::new("u_UnprojectMatrix", 64),
            UniformDescriptor::new("u_FresnelPower", 4),
            UniformDescriptor::new("u_FresnelScale", 4),
            UniformDescriptor::new("u_FresnelBias", 4),
            UniformDescriptor::new("u_ReliefDepthScale", 4),
            UniformDescriptor::new("u_ReliefOffsetBias", 4),
            UniformDescriptor::new("u_NormalScale", 12),
            UniformDescriptor::new("u_FogDensity", 4),
            UniformDescriptor::new("u_FogColor", 12),
            UniformDescriptor::new("u_SpecularExponent", 8),
            UniformDescriptor::new("u_LightGridOrigin", 12),
            UniformDescriptor::new("u_LightGridScale", 12),
        ]
    }

    fn fragment_libs(&self) -> &'static [&'static str] {
        &["computeLight", "reliefMapping"]
    }

    fn sampler_bindings(&self, _caps: &GlCapabilities) -> Vec<SamplerBinding> {
        vec![
            SamplerBinding::new("u_CurrentMap", 0),
            SamplerBinding::new("u_PortalMap", 1),
            SamplerBinding::new("u_DepthMap", 2),
            SamplerBinding::new("u_NormalMap", 3),
            SamplerBinding::new("u_LightGrid1", 6),
            SamplerBinding::new("u_LightGrid2", 7),
            SamplerBinding::new("u_HeightMap", 15),
        ]
    }
}

/// Cubemap reflections. The main GLSL source pair carries the `_CB`
/// (cubemap) suffix while the registered name stays `reflection`.
pub struct Reflection;

impl ShaderProfile for Reflection {
    fn name(&self) -> &'static str {
        "reflection"
    }

    fn main_name(&self) -> &'static str {
        "reflection_CB"
    }

    fn required_attributes(&self) -> VertexAttributes {
        VertexAttributes::POSITION | VertexAttributes::TEXCOORD | VertexAttributes::QTANGENT
    }

    fn macros(&self) -> &[MacroKind] {
        &[
            MacroKind::VertexSkinning,
            MacroKind::VertexAnimation,
            MacroKind::HeightMapInNormalMap,
            MacroKind::ReliefMapping,
        ]
    }

    fn uniforms(&self) -> Vec<UniformDescriptor> {
        vec![
            UniformDescriptor::new("u_TextureMatrix", 64),
            UniformDescriptor::new("u_ViewOrigin", 12),
            UniformDescriptor::new("u_ModelMatrix", 64),
            UniformDescriptor::new("u_ModelViewProjectionMatrix", 64),
            UniformDescriptor::new("u_Bones", 0),
            UniformDescriptor::new("u_ReliefDepthScale", 4),
            UniformDescriptor::new("u_ReliefOffsetBias", 4),
            UniformDescriptor::new("u_NormalScale", 12),
            UniformDescriptor::new("u_VertexInterpolation", 4),
        ]
    }

    fn vertex_libs(&self) -> &'static [&'static str] {
        VERTEX_LIBS_NO_SPRITE
    }

    fn fragment_libs(&self) -> &'static [&'static str] {
        &["reliefMapping"]
    }

    fn sampler_bindings(&self, _caps: &GlCapabilities) -> Vec<SamplerBinding> {
        vec![
            SamplerBinding::new("u_ColorMap", 0),
            SamplerBinding::new("u_NormalMap", 1),
            SamplerBinding::new("u_HeightMap", 15),
        ]
    }
}

/// Register every stock shader with a manager, in the order the renderer
/// binds them.
pub fn register_stock_shaders(
    manager: &mut crate::shader::manager::ShaderManager,
) -> crate::errors::Result<Vec<crate::shader::manager::ShaderHandle>> {
    let profiles: [&dyn ShaderProfile; 8] = [
        &Generic,
        &LightMapping,
        &ShadowFill,
        &Skybox,
        &FogQuake3,
        &HeatHaze,
        &Liquid,
        &Reflection,
    ];
    profiles.iter().map(|p| manager.register(*p)).collect()
}
