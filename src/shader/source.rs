//! Shader Source Provider
//!
//! Resolves logical fragment paths (`glsl/<name>_vp.glsl`) to GLSL text.
//! Sources ship compiled into the binary via `rust-embed`; when an external
//! shader directory is configured (shader development workflow) files from
//! that directory take over, with a warning whenever a file diverges from
//! its built-in counterpart so the developer can tell which files carry
//! local edits.

use std::path::PathBuf;

use rust_embed::RustEmbed;

use crate::backend::StageKind;
use crate::errors::{Result, ShaderError};

#[derive(RustEmbed)]
#[folder = "src/shader/glsl"]
struct BuiltinShaders;

/// Logical path of a stage's source file for a fragment name.
#[must_use]
pub fn stage_path(name: &str, stage: StageKind) -> String {
    format!("glsl/{name}_{}.glsl", stage.suffix())
}

/// CR/LF pairs wind up in shader files through version control and Windows
/// editors; fold them to LF so content comparisons compare apples with
/// apples.
#[must_use]
pub fn normalize_line_endings(text: &str) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n")
    } else {
        text.to_owned()
    }
}

/// Resolves logical fragment paths to GLSL source text.
#[derive(Debug)]
pub struct SourceProvider {
    external_dir: Option<PathBuf>,
}

impl SourceProvider {
    #[must_use]
    pub fn new(external_dir: Option<PathBuf>) -> Self {
        Self { external_dir }
    }

    /// Whether sources come from an external directory instead of the
    /// built-in table.
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.external_dir.is_some()
    }

    /// Resolve `path` to source text.
    ///
    /// Fails with [`ShaderError::SourceNotFound`] / [`ShaderError::SourceIo`]
    /// / [`ShaderError::EmptySource`]; all are fatal to the initialization
    /// of the descriptor being assembled.
    pub fn resolve(&self, path: &str) -> Result<String> {
        let Some(dir) = &self.external_dir else {
            return Self::builtin(path).ok_or_else(|| ShaderError::SourceNotFound(path.to_owned()));
        };

        let file_path = dir.join(path);
        log::info!("loading shader '{}'", file_path.display());

        let text = std::fs::read_to_string(&file_path).map_err(|source| ShaderError::SourceIo {
            path: path.to_owned(),
            source,
        })?;
        let text = normalize_line_endings(&text);

        // Point out local edits: in normal conditions the file on disk and
        // the built-in copy are identical, so any difference means either
        // work in progress or a stale built-in table.
        if let Some(builtin) = Self::builtin(path)
            && builtin != text
        {
            log::warn!("shader file differs from built-in shader: {path}");
        }

        if text.is_empty() {
            return Err(ShaderError::EmptySource(path.to_owned()));
        }

        Ok(text)
    }

    fn builtin(path: &str) -> Option<String> {
        let name = path.strip_prefix("glsl/").unwrap_or(path);
        let file = BuiltinShaders::get(name)?;
        let text = std::str::from_utf8(file.data.as_ref()).ok()?;
        Some(normalize_line_endings(text))
    }
}
