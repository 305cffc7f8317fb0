//! Build Orchestrator
//!
//! [`ShaderManager`] owns every registered shader's permutation arena, the
//! deform stage cache, the binary cache, and the eager build queue. Two
//! build strategies are exposed: [`ShaderManager::build_all`] drains the
//! queue and enumerates every macro permutation of every queued shader
//! (deform variants are always built lazily, per draw), and
//! [`ShaderManager::bind`] synchronously builds a missing permutation on
//! first use.
//!
//! All compilation, linking, and disk I/O happen on the calling thread,
//! the thread that owns the graphics context. A permutation, once built,
//! is never rebuilt or replaced; repeated binds are idempotent reads of the
//! stored entry.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::attributes::VertexAttributes;
use crate::backend::{GlBackend, StageHandle, StageKind};
use crate::capabilities::{GlCapabilities, ShaderSettings};
use crate::errors::{Result, ShaderError};
use crate::shader::assembler::{self, StageHeaders};
use crate::shader::binary_cache::BinaryCache;
use crate::shader::deform::{DeformCache, DeformStep};
use crate::shader::descriptor::{ShaderDescriptor, ShaderProfile};
use crate::shader::engine::{compile_stage_checked, link_program_checked};
use crate::shader::permutation::{ProgramEntry, macro_defines, select_permutation, storage_index};
use crate::shader::source::SourceProvider;

/// Handle to a registered shader.
///
/// Thin `Copy` wrapper around an index into the manager's shader storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub(crate) u32);

impl ShaderHandle {
    /// Raw index into the shader storage array.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One registered shader: its static descriptor, the assembled stage texts
/// shared by all permutations (macro defines are injected at compile time
/// as a text prefix), the combined source checksum, and the permutation
/// arena.
struct ShaderRecord {
    descriptor: ShaderDescriptor,
    vertex_text: String,
    fragment_text: String,
    checksum: u64,
    programs: Vec<Option<ProgramEntry>>,
}

/// Owner of all shader build state for one graphics context.
pub struct ShaderManager {
    caps: GlCapabilities,
    settings: ShaderSettings,
    provider: SourceProvider,
    headers: StageHeaders,
    binary_cache: BinaryCache,
    deforms: DeformCache,
    shaders: Vec<ShaderRecord>,
    build_queue: VecDeque<ShaderHandle>,
    total_build_time: Duration,
}

impl ShaderManager {
    /// Construct a manager for the given driver capabilities and settings.
    ///
    /// The driver fingerprint is computed here, once, and the binary cache
    /// is enabled only when configuration, driver support, and the absence
    /// of an external shader directory all allow it.
    #[must_use]
    pub fn new(caps: GlCapabilities, settings: ShaderSettings) -> Self {
        let fingerprint = caps.driver_fingerprint();
        let cache_enabled =
            settings.binary_cache && caps.program_binary && settings.external_shader_dir.is_none();
        let binary_cache =
            BinaryCache::new(settings.cache_dir.clone(), cache_enabled, fingerprint);
        let provider = SourceProvider::new(settings.external_shader_dir.clone());
        let headers = StageHeaders::generate(&caps, &settings);

        Self {
            caps,
            settings,
            provider,
            headers,
            binary_cache,
            deforms: DeformCache::new(),
            shaders: Vec::new(),
            build_queue: VecDeque::new(),
            total_build_time: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn capabilities(&self) -> &GlCapabilities {
        &self.caps
    }

    #[must_use]
    pub fn settings(&self) -> &ShaderSettings {
        &self.settings
    }

    #[must_use]
    pub fn binary_cache(&self) -> &BinaryCache {
        &self.binary_cache
    }

    /// Aggregate wall-clock time spent building permutations.
    #[must_use]
    pub fn total_build_time(&self) -> Duration {
        self.total_build_time
    }

    /// Number of distinct deform programs seen so far.
    #[must_use]
    pub fn deform_count(&self) -> usize {
        self.deforms.len()
    }

    /// Register a shader profile: build its descriptor, assemble both stage
    /// texts, checksum the combined source, and queue it for eager build.
    ///
    /// Fails when any library fragment or main body cannot be resolved;
    /// that is fatal to the descriptor's initialization.
    pub fn register(&mut self, profile: &dyn ShaderProfile) -> Result<ShaderHandle> {
        let descriptor = ShaderDescriptor::from_profile(profile, &self.caps);

        let vertex_text = assembler::assemble_stage(
            &self.provider,
            &self.caps,
            &self.settings,
            descriptor.main_name(),
            descriptor.vertex_libs(),
            StageKind::Vertex,
        )?;
        let fragment_text = assembler::assemble_stage(
            &self.provider,
            &self.caps,
            &self.settings,
            descriptor.main_name(),
            descriptor.fragment_libs(),
            StageKind::Fragment,
        )?;
        let checksum = assembler::source_checksum(
            &self.headers.engine_constants,
            &vertex_text,
            &fragment_text,
        );

        let programs = (0..descriptor.permutation_count()).map(|_| None).collect();
        let handle = ShaderHandle(self.shaders.len() as u32);
        self.shaders.push(ShaderRecord {
            descriptor,
            vertex_text,
            fragment_text,
            checksum,
            programs,
        });
        self.build_queue.push_back(handle);
        Ok(handle)
    }

    #[must_use]
    pub fn descriptor(&self, handle: ShaderHandle) -> &ShaderDescriptor {
        &self.shaders[handle.index()].descriptor
    }

    /// Checksum of the shader's fully assembled combined source.
    #[must_use]
    pub fn source_checksum(&self, handle: ShaderHandle) -> u64 {
        self.shaders[handle.index()].checksum
    }

    /// The built entry for a (macro bitmask, deform index) pair, if any.
    #[must_use]
    pub fn program(
        &self,
        handle: ShaderHandle,
        macro_index: usize,
        deform_index: usize,
    ) -> Option<&ProgramEntry> {
        let record = &self.shaders[handle.index()];
        let index = storage_index(macro_index, deform_index, record.descriptor.num_macros());
        record.programs.get(index).and_then(Option::as_ref)
    }

    /// Mutable access to a built entry, for per-draw uniform firewall
    /// updates.
    #[must_use]
    pub fn program_mut(
        &mut self,
        handle: ShaderHandle,
        macro_index: usize,
        deform_index: usize,
    ) -> Option<&mut ProgramEntry> {
        let record = &mut self.shaders[handle.index()];
        let index = storage_index(macro_index, deform_index, record.descriptor.num_macros());
        record.programs.get_mut(index).and_then(Option::as_mut)
    }

    /// Whether a permutation slot holds a built program.
    #[must_use]
    pub fn is_built(&self, handle: ShaderHandle, macro_index: usize, deform_index: usize) -> bool {
        self.program(handle, macro_index, deform_index).is_some()
    }

    /// Number of registered shaders.
    #[must_use]
    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    /// Resolve a deform step sequence to its index, compiling the deform
    /// stage if this exact rendering has not been seen before.
    pub fn deform_index(
        &mut self,
        backend: &mut dyn GlBackend,
        steps: &[DeformStep],
    ) -> Result<usize> {
        self.deforms
            .index(backend, &self.provider, &self.headers, steps)
    }

    /// Eager build: drain the queue, enumerating every macro permutation of
    /// every queued shader (deform 0 only) and logging the aggregate time.
    pub fn build_all(&mut self, backend: &mut dyn GlBackend) -> Result<()> {
        while let Some(handle) = self.build_queue.pop_front() {
            let permutations = self.shaders[handle.index()].descriptor.permutation_count();
            for macro_index in 0..permutations {
                self.build_permutation(backend, handle, macro_index, 0)?;
            }
        }

        log::info!(
            "glsl shaders took {} msec to build",
            self.total_build_time.as_millis()
        );
        Ok(())
    }

    /// Build one permutation, loading it from the binary cache when
    /// possible. A rejected (conflicting / prerequisite-missing) permutation
    /// is recorded as unused: the call succeeds but the slot stays empty.
    pub fn build_permutation(
        &mut self,
        backend: &mut dyn GlBackend,
        handle: ShaderHandle,
        macro_index: usize,
        deform_index: usize,
    ) -> Result<()> {
        let num_macros = self.shaders[handle.index()].descriptor.num_macros();
        let index = storage_index(macro_index, deform_index, num_macros);

        // program already exists
        if self.shaders[handle.index()]
            .programs
            .get(index)
            .is_some_and(Option::is_some)
        {
            return Ok(());
        }

        let Some(macro_names) = select_permutation(
            &self.shaders[handle.index()].descriptor,
            macro_index,
            &self.caps,
            &self.settings,
        ) else {
            return Ok(());
        };

        let start = Instant::now();

        // Deform variants share the base permutation's compiled stages.
        if deform_index > 0 {
            self.build_permutation(backend, handle, macro_index, 0)?;
        }

        let name = self.shaders[handle.index()].descriptor.name();

        log::debug!(
            "building {name} shader permutation with macros: {}",
            if macro_names.is_empty() {
                "none".to_owned()
            } else {
                macro_names.join(" ")
            }
        );

        let (tags, checksum) = {
            let record = &self.shaders[handle.index()];
            (record.descriptor.macro_tags(), record.checksum)
        };

        let loaded = if deform_index == 0 {
            self.binary_cache
                .load(backend, name, index, &tags, checksum)
        } else {
            None
        };

        let record = &mut self.shaders[handle.index()];
        let descriptor = &record.descriptor;
        let vertex_text = &record.vertex_text;
        let fragment_text = &record.fragment_text;
        let programs = &mut record.programs;

        if index >= programs.len() {
            programs.resize_with((deform_index + 1) << num_macros, || None);
        }

        let (program, vertex, fragment) = if let Some(program) = loaded {
            (program, None, None)
        } else if deform_index > 0 {
            let deform_stage = self
                .deforms
                .stage(backend, &self.provider, &self.headers, deform_index)?
                .ok_or_else(|| ShaderError::InvalidConfiguration {
                    name: name.to_owned(),
                    macros: macro_names.join(" "),
                })?;
            let base = programs[macro_index]
                .as_mut()
                .ok_or_else(|| ShaderError::InvalidConfiguration {
                    name: name.to_owned(),
                    macros: macro_names.join(" "),
                })?;
            // The base may have come from the binary cache, in which case
            // its stages were never compiled.
            let (vs, fs) = match base.stages() {
                (Some(vs), Some(fs)) => (vs, fs),
                _ => {
                    let (vs, fs) = compile_stage_pair(
                        backend,
                        &self.headers,
                        name,
                        &macro_names,
                        vertex_text,
                        fragment_text,
                    )?;
                    base.set_stages(vs, fs);
                    (vs, fs)
                }
            };
            let program = link_program_checked(
                backend,
                name,
                &[vs, deform_stage, fs],
                self.caps.program_binary,
            )?;
            // Deform variants are never binary-cached; their stages live in
            // the base entry.
            (program, None, None)
        } else {
            let deform_stage = self
                .deforms
                .stage(backend, &self.provider, &self.headers, 0)?
                .ok_or_else(|| ShaderError::InvalidConfiguration {
                    name: name.to_owned(),
                    macros: macro_names.join(" "),
                })?;
            let (vs, fs) = compile_stage_pair(
                backend,
                &self.headers,
                name,
                &macro_names,
                vertex_text,
                fragment_text,
            )?;
            let program = link_program_checked(
                backend,
                name,
                &[vs, deform_stage, fs],
                self.caps.program_binary,
            )?;
            self.binary_cache
                .save(backend, name, index, &tags, checksum, program);
            (program, Some(vs), Some(fs))
        };

        let attributes = permutation_attributes(descriptor, macro_index);
        let entry = ProgramEntry::resolve(
            backend, program, vertex, fragment, attributes, descriptor, &self.caps,
        );

        // Apply the fixed sampler bindings once, with the program bound.
        backend.bind_program(Some(program));
        for sampler in descriptor.sampler_bindings() {
            backend.set_sampler_unit(program, sampler.name, sampler.unit);
        }
        backend.bind_program(None);

        programs[index] = Some(entry);
        self.total_build_time += start.elapsed();
        Ok(())
    }

    /// Bind the program for an active-macro bitmask and deform index,
    /// building it first if the manager hasn't gotten to it yet.
    ///
    /// Fails with [`ShaderError::InvalidConfiguration`] when the permutation
    /// was rejected and can never be built.
    pub fn bind(
        &mut self,
        backend: &mut dyn GlBackend,
        handle: ShaderHandle,
        active_macros: usize,
        deform_index: usize,
    ) -> Result<&ProgramEntry> {
        let num_macros = self.shaders[handle.index()].descriptor.num_macros();
        let macro_index = active_macros & ((1 << num_macros) - 1);

        if !self.is_built(handle, macro_index, deform_index) {
            self.build_permutation(backend, handle, macro_index, deform_index)?;
        }

        let record = &self.shaders[handle.index()];
        let index = storage_index(macro_index, deform_index, num_macros);
        let Some(entry) = record.programs.get(index).and_then(Option::as_ref) else {
            return Err(ShaderError::InvalidConfiguration {
                name: record.descriptor.name().to_owned(),
                macros: record.descriptor.macro_names(macro_index).join(" "),
            });
        };

        backend.bind_program(Some(entry.program));
        Ok(entry)
    }

    /// Tear down all build state: release every program and stage handle,
    /// clear the deform table and build queue, reset the build-time
    /// counter. Registered shaders are gone after this; the manager is
    /// ready for a fresh round of registrations (e.g. after a full
    /// graphics-context reset).
    pub fn free_all(&mut self, backend: &mut dyn GlBackend) {
        for record in &self.shaders {
            for entry in record.programs.iter().flatten() {
                entry.release(backend);
            }
        }
        self.shaders.clear();
        self.deforms.clear(backend);
        self.build_queue.clear();
        self.total_build_time = Duration::ZERO;
    }
}

/// Compile the vertex and fragment stages of one permutation: shared header
/// segments, then the macro `#define` prefix joined to the assembled body
/// as the final segment.
fn compile_stage_pair(
    backend: &mut dyn GlBackend,
    headers: &StageHeaders,
    name: &str,
    macro_names: &[&str],
    vertex_text: &str,
    fragment_text: &str,
) -> Result<(StageHandle, StageHandle)> {
    let prefix = macro_defines(macro_names);

    let vertex_full = format!("{prefix}{vertex_text}");
    let mut segments: Vec<&str> = headers.segments(StageKind::Vertex).to_vec();
    segments.push(&vertex_full);
    let vs = compile_stage_checked(backend, name, StageKind::Vertex, &segments)?;

    let fragment_full = format!("{prefix}{fragment_text}");
    let mut segments: Vec<&str> = headers.segments(StageKind::Fragment).to_vec();
    segments.push(&fragment_full);
    let fs = compile_stage_checked(backend, name, StageKind::Fragment, &segments)?;

    Ok((vs, fs))
}

/// Attributes a permutation consumes: the shader's required set plus
/// whatever its active macros demand.
fn permutation_attributes(descriptor: &ShaderDescriptor, mask: usize) -> VertexAttributes {
    let mut attributes = descriptor.required_attributes();
    for m in descriptor.macros() {
        if mask & m.bit_mask() != 0 {
            attributes |= m.kind.extra_attributes();
        }
    }
    attributes
}
