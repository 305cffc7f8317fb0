//! Shared test support: a scripted in-memory [`GlBackend`], capability /
//! settings presets, and a configurable shader profile.

#![allow(dead_code)]

use std::path::PathBuf;

use glweave::attributes::VertexAttributes;
use glweave::backend::{GlBackend, ProgramBinary, ProgramHandle, StageHandle, StageKind};
use glweave::capabilities::{GlCapabilities, ShaderSettings};
use glweave::shader::descriptor::ShaderProfile;
use glweave::shader::macros::MacroKind;

/// In-memory backend that records every call and never talks to a driver.
pub struct MockBackend {
    next_handle: u32,
    /// `(stage kind, concatenated segments)` per successful compile.
    pub compiled: Vec<(StageKind, String)>,
    /// Stage lists of every successful link.
    pub linked: Vec<Vec<StageHandle>>,
    /// Number of successful binary restores.
    pub binary_loads: usize,
    pub deleted_stages: Vec<StageHandle>,
    pub deleted_programs: Vec<ProgramHandle>,
    /// `(program, sampler name, unit)` in application order.
    pub sampler_units: Vec<(ProgramHandle, String, i32)>,
    /// Bind history, including the `None` unbinds.
    pub bind_history: Vec<Option<ProgramHandle>>,
    /// When set, compiles whose source contains this substring fail.
    pub fail_compile_containing: Option<&'static str>,
    /// When set, every link fails with this log.
    pub fail_link: bool,
    /// Report zero-length binaries, as a broken driver would.
    pub empty_binaries: bool,
    /// Binary format tag reported by the driver.
    pub binary_format: u32,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            compiled: Vec::new(),
            linked: Vec::new(),
            binary_loads: 0,
            deleted_stages: Vec::new(),
            deleted_programs: Vec::new(),
            sampler_units: Vec::new(),
            bind_history: Vec::new(),
            fail_compile_containing: None,
            fail_link: false,
            empty_binaries: false,
            binary_format: 0x8740,
        }
    }

    pub fn compile_count(&self) -> usize {
        self.compiled.len()
    }

    pub fn link_count(&self) -> usize {
        self.linked.len()
    }

    fn next(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl GlBackend for MockBackend {
    fn compile_stage(
        &mut self,
        kind: StageKind,
        segments: &[&str],
    ) -> Result<StageHandle, String> {
        let source = segments.concat();
        if let Some(marker) = self.fail_compile_containing
            && source.contains(marker)
        {
            return Err(format!("0:1(1): error: mock rejection of '{marker}'"));
        }
        self.compiled.push((kind, source));
        Ok(StageHandle(self.next()))
    }

    fn link_program(
        &mut self,
        stages: &[StageHandle],
        _attributes: &[(u32, &'static str)],
        _retrievable: bool,
    ) -> Result<ProgramHandle, String> {
        if self.fail_link {
            return Err("error: mock link failure".to_owned());
        }
        self.linked.push(stages.to_vec());
        Ok(ProgramHandle(self.next()))
    }

    fn program_binary(&mut self, program: ProgramHandle) -> Option<ProgramBinary> {
        if self.empty_binaries {
            return Some(ProgramBinary {
                format: self.binary_format,
                data: Vec::new(),
            });
        }
        let mut data = vec![0u8; 16];
        data[..4].copy_from_slice(&program.0.to_le_bytes());
        Some(ProgramBinary {
            format: self.binary_format,
            data,
        })
    }

    fn load_binary(&mut self, binary: &ProgramBinary) -> Option<ProgramHandle> {
        if binary.data.is_empty() {
            return None;
        }
        self.binary_loads += 1;
        Some(ProgramHandle(self.next()))
    }

    fn uniform_location(&mut self, _program: ProgramHandle, name: &str) -> Option<i32> {
        // deterministic pseudo-locations, stable per name
        Some(name.len() as i32)
    }

    fn uniform_block_index(&mut self, _program: ProgramHandle, _name: &str) -> Option<u32> {
        Some(0)
    }

    fn set_sampler_unit(&mut self, program: ProgramHandle, name: &str, unit: i32) {
        self.sampler_units.push((program, name.to_owned(), unit));
    }

    fn bind_program(&mut self, program: Option<ProgramHandle>) {
        self.bind_history.push(program);
    }

    fn delete_stage(&mut self, stage: StageHandle) {
        self.deleted_stages.push(stage);
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.deleted_programs.push(program);
    }
}

/// Initialize logging for a test binary; safe to call repeatedly.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Capabilities of a well-behaved modern driver.
pub fn test_caps() -> GlCapabilities {
    GlCapabilities {
        renderer: "Mock Renderer 3000".to_owned(),
        version: "4.6.0 mock-531.0".to_owned(),
        ..GlCapabilities::default()
    }
}

/// Settings with the binary cache off (most tests don't want disk traffic).
pub fn test_settings() -> ShaderSettings {
    ShaderSettings {
        binary_cache: false,
        ..ShaderSettings::default()
    }
}

/// A fresh, empty temp directory for cache tests, unique per test name.
pub fn temp_cache_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("glweave-test-{}-{tag}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create temp cache dir");
    dir
}

/// Configurable shader profile backed by the built-in `generic` sources.
pub struct TestProfile {
    pub name: &'static str,
    pub main: &'static str,
    pub attributes: VertexAttributes,
    pub macros: Vec<MacroKind>,
}

impl Default for TestProfile {
    fn default() -> Self {
        Self {
            name: "generic",
            main: "generic",
            attributes: VertexAttributes::POSITION | VertexAttributes::TEXCOORD,
            macros: Vec::new(),
        }
    }
}

impl ShaderProfile for TestProfile {
    fn name(&self) -> &'static str {
        self.name
    }

    fn main_name(&self) -> &'static str {
        self.main
    }

    fn required_attributes(&self) -> VertexAttributes {
        self.attributes
    }

    fn macros(&self) -> &[MacroKind] {
        &self.macros
    }
}
