//! Deform Step Compiler
//!
//! Per-draw vertex deformation sequences (wave, bulge, move, normal noise,
//! rotate-grow) compile into small auxiliary vertex shaders: each sequence
//! renders to a `DEFORM_STEPS` macro of pseudo-instructions that the shared
//! `deformVertexes` body executes.
//!
//! The *rendered text* is the cache key, not the step list: numerically
//! distinct but textually identical sequences are intentionally treated as
//! identical to bound cache growth, which is why numeric parameters are
//! formatted at a fixed six-decimal precision. Index 0 is reserved for "no
//! deform" and links into every program that has no deform of its own.

use rustc_hash::FxHashMap;

use crate::backend::{GlBackend, StageHandle, StageKind};
use crate::errors::Result;
use crate::shader::assembler::StageHeaders;
use crate::shader::engine::compile_stage_checked;
use crate::shader::source::SourceProvider;

/// Waveform selector for wave-driven deform steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Waveform {
    #[default]
    None,
    Sin,
    Square,
    Triangle,
    Sawtooth,
    InverseSawtooth,
    Noise,
}

impl Waveform {
    /// Pseudo-instruction name of this waveform.
    #[must_use]
    pub fn step_name(self) -> &'static str {
        match self {
            Waveform::None => "DSTEP_NONE",
            Waveform::Sin => "DSTEP_SIN",
            Waveform::Square => "DSTEP_SQUARE",
            Waveform::Triangle => "DSTEP_TRIANGLE",
            Waveform::Sawtooth => "DSTEP_SAWTOOTH",
            Waveform::InverseSawtooth => "DSTEP_INV_SAWTOOTH",
            Waveform::Noise => "DSTEP_NOISE",
        }
    }
}

/// A waveform with its evaluation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Wave {
    pub func: Waveform,
    pub base: f32,
    pub amplitude: f32,
    pub phase: f32,
    pub frequency: f32,
}

/// One vertex deformation instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeformStep {
    /// Displace along the normal by a waveform of position.
    Wave {
        wave: Wave,
        /// Spatial spread of the wave phase across the surface.
        spread: f32,
    },
    /// Displace along the normal by a sine of the texture coordinate.
    Bulge { width: f32, height: f32, speed: f32 },
    /// Translate along a fixed vector by a waveform of time.
    Move { vector: [f32; 3], wave: Wave },
    /// Perturb normals with noise.
    Normals { amplitude: f32, frequency: f32 },
    /// Rotate and grow along a vector, fading color.
    RotGrow { vector: [f32; 3] },
}

/// Render a deform sequence to its canonical `DEFORM_STEPS` macro text.
///
/// This text is the deform cache key; the fixed `{:.6}` formatting is what
/// guarantees that equal parameters always produce equal keys.
#[must_use]
pub fn render_deform_steps(steps: &[DeformStep]) -> String {
    let mut out = String::with_capacity(256);

    out.push_str("#define DEFORM_STEPS ");
    for step in steps {
        match *step {
            DeformStep::Wave { wave, spread } => {
                out.push_str("DSTEP_LOAD_POS(1.0, 1.0, 1.0) ");
                out.push_str(&format!(
                    "{}({:.6}, {:.6}, {:.6}) ",
                    wave.func.step_name(),
                    wave.phase,
                    spread,
                    wave.frequency
                ));
                out.push_str("DSTEP_LOAD_NORM(1.0, 1.0, 1.0) ");
                out.push_str(&format!(
                    "DSTEP_MODIFY_POS({:.6}, {:.6}, 1.0) ",
                    wave.base, wave.amplitude
                ));
            }
            DeformStep::Bulge {
                width,
                height,
                speed,
            } => {
                out.push_str("DSTEP_LOAD_TC(1.0, 0.0, 0.0) ");
                out.push_str(&format!("DSTEP_SIN(0.0, {width:.6}, {:.6}) ", speed * 0.001));
                out.push_str("DSTEP_LOAD_NORM(1.0, 1.0, 1.0) ");
                out.push_str(&format!("DSTEP_MODIFY_POS(0.0, {height:.6}, 1.0) "));
            }
            DeformStep::Move { vector, wave } => {
                out.push_str(&format!(
                    "{}({:.6}, 0.0, {:.6}) ",
                    wave.func.step_name(),
                    wave.phase,
                    wave.frequency
                ));
                out.push_str(&format!(
                    "DSTEP_LOAD_VEC({:.6}, {:.6}, {:.6}) ",
                    vector[0], vector[1], vector[2]
                ));
                out.push_str(&format!(
                    "DSTEP_MODIFY_POS({:.6}, {:.6}, 1.0) ",
                    wave.base, wave.amplitude
                ));
            }
            DeformStep::Normals {
                amplitude,
                frequency,
            } => {
                out.push_str("DSTEP_LOAD_POS(1.0, 1.0, 1.0) ");
                out.push_str(&format!("DSTEP_NOISE(0.0, 0.0, {frequency:.6}) "));
                out.push_str(&format!(
                    "DSTEP_MODIFY_NORM(0.0, {:.6}, 1.0) ",
                    0.98 * amplitude
                ));
            }
            DeformStep::RotGrow { vector } => {
                out.push_str("DSTEP_LOAD_POS(1.0, 1.0, 1.0) ");
                out.push_str(&format!(
                    "DSTEP_ROTGROW({:.6}, {:.6}, {:.6}) ",
                    vector[0], vector[1], vector[2]
                ));
                out.push_str("DSTEP_LOAD_COLOR(1.0, 1.0, 1.0) ");
                out.push_str("DSTEP_MODIFY_COLOR(-1.0, 1.0, 0.0) ");
            }
        }
    }

    out
}

struct DeformEntry {
    text: String,
    stage: Option<StageHandle>,
}

/// Cache of compiled deform vertex stages, keyed by canonical step text.
pub struct DeformCache {
    entries: Vec<DeformEntry>,
    lookup: FxHashMap<String, usize>,
}

impl Default for DeformCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DeformCache {
    /// A fresh cache with index 0 reserved for "no deform"; its stage is
    /// compiled lazily the first time any program links.
    #[must_use]
    pub fn new() -> Self {
        let default_text = render_deform_steps(&[]);
        let mut lookup = FxHashMap::default();
        lookup.insert(default_text.clone(), 0);
        Self {
            entries: vec![DeformEntry {
                text: default_text,
                stage: None,
            }],
            lookup,
        }
    }

    /// Number of distinct deform programs seen so far (including index 0).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a step sequence to its deform index, compiling a new stage
    /// when the rendered text has not been seen before.
    pub fn index(
        &mut self,
        backend: &mut dyn GlBackend,
        provider: &SourceProvider,
        headers: &StageHeaders,
        steps: &[DeformStep],
    ) -> Result<usize> {
        let text = render_deform_steps(steps);

        if let Some(&index) = self.lookup.get(&text) {
            return Ok(index);
        }

        let stage = compile_deform_stage(backend, provider, headers, &text)?;
        let index = self.entries.len();
        self.entries.push(DeformEntry {
            text: text.clone(),
            stage: Some(stage),
        });
        self.lookup.insert(text, index);
        Ok(index)
    }

    /// Stage handle for a deform index, compiling the reserved default on
    /// first use. `None` when the index was never issued by
    /// [`DeformCache::index`].
    pub fn stage(
        &mut self,
        backend: &mut dyn GlBackend,
        provider: &SourceProvider,
        headers: &StageHeaders,
        index: usize,
    ) -> Result<Option<StageHandle>> {
        if index >= self.entries.len() {
            return Ok(None);
        }

        if let Some(stage) = self.entries[index].stage {
            return Ok(Some(stage));
        }

        let text = self.entries[index].text.clone();
        let stage = compile_deform_stage(backend, provider, headers, &text)?;
        self.entries[index].stage = Some(stage);
        Ok(Some(stage))
    }

    /// Delete all compiled stages and reset to the freshly constructed
    /// state.
    pub fn clear(&mut self, backend: &mut dyn GlBackend) {
        for entry in &self.entries {
            if let Some(stage) = entry.stage {
                backend.delete_stage(stage);
            }
        }
        *self = Self::new();
    }
}

fn compile_deform_stage(
    backend: &mut dyn GlBackend,
    provider: &SourceProvider,
    headers: &StageHeaders,
    steps_text: &str,
) -> Result<StageHandle> {
    let mut text = String::with_capacity(steps_text.len() + 1024);
    text.push_str(steps_text);
    text.push('\n');
    // Reset line counting so driver diagnostics point into the body.
    text.push_str("#line 0\n");
    text.push_str(&provider.resolve("glsl/deformVertexes_vp.glsl")?);

    compile_stage_checked(
        backend,
        "deformVertexes",
        StageKind::Vertex,
        &[&headers.version_declaration, &headers.vertex, &text],
    )
}
