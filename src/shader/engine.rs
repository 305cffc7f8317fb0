//! Compile/Link Engine
//!
//! Drives the [`GlBackend`] to produce stage objects and linked programs,
//! and extracts actionable diagnostics on failure: the full resolved source
//! is dumped with running line numbers (reset at each `#line 0` marker so
//! numbers match what the assembler's reset directives promise), followed
//! by the driver's own info log.

use crate::attributes::attribute_bindings;
use crate::backend::{GlBackend, ProgramHandle, StageHandle, StageKind};
use crate::errors::{Result, ShaderError};

/// Compile one stage from its source segments, logging diagnostics and the
/// numbered source dump on failure.
pub fn compile_stage_checked(
    backend: &mut dyn GlBackend,
    name: &str,
    stage: StageKind,
    segments: &[&str],
) -> Result<StageHandle> {
    match backend.compile_stage(stage, segments) {
        Ok(handle) => Ok(handle),
        Err(info_log) => {
            dump_numbered_source(name, segments);
            log::warn!("compile log:\n{info_log}");
            Err(ShaderError::Compile {
                name: name.to_owned(),
                stage,
            })
        }
    }
}

/// Link stages into a program, binding the fixed attribute locations first
/// and requesting binary retrievability when the cache can use it.
pub fn link_program_checked(
    backend: &mut dyn GlBackend,
    name: &str,
    stages: &[StageHandle],
    retrievable: bool,
) -> Result<ProgramHandle> {
    match backend.link_program(stages, &attribute_bindings(), retrievable) {
        Ok(program) => Ok(program),
        Err(info_log) => {
            log::warn!("link log:\n{info_log}");
            Err(ShaderError::Link {
                name: name.to_owned(),
            })
        }
    }
}

/// Dump the full resolved source with running line numbers, resetting the
/// counter after each `#line 0` line.
fn dump_numbered_source(name: &str, segments: &[&str]) {
    let mut buffer = String::new();
    let mut line_number = 0usize;

    for segment in segments {
        for line in segment.lines() {
            buffer.push_str(&format!("{line_number:>4}: {line}\n"));
            if line == "#line 0" {
                line_number = 0;
            } else {
                line_number += 1;
            }
        }
    }

    log::warn!("source for shader program {name}:\n{buffer}");
}
