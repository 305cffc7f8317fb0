//! Binary Cache
//!
//! Persists linked program binaries to disk so that identical (descriptor,
//! permutation, source) triples skip the compile/link step on later runs.
//! One file per (shader name, permutation index), little-endian layout:
//!
//! | field | type |
//! |---|---|
//! | format version | u32 |
//! | driver fingerprint | u64 |
//! | macro count | u32 |
//! | macro identity tags | u32 × count |
//! | binary format tag | u32 |
//! | binary length | u32 |
//! | source checksum | u64 |
//! | payload | bytes |
//!
//! Cache problems are never surfaced as errors: every structural mismatch
//! falls through to recompilation. Format-version and driver-fingerprint
//! mismatches additionally invalidate the whole cache for the rest of the
//! run: those fields are shared by all entries, so no further disk reads
//! can succeed. Checksum mismatch is the authoritative per-entry
//! invalidation signal; the per-entry binary format tag is passed through
//! to the driver untouched.

use std::path::{Path, PathBuf};

use crate::backend::{GlBackend, ProgramBinary, ProgramHandle};

/// Current on-disk format version. Bump on any layout change.
pub const BINARY_FORMAT_VERSION: u32 = 3;

/// On-disk program binary cache for one run.
///
/// Holds the run-wide invalidation state and the driver fingerprint, both
/// explicit fields here rather than globals, initialized once the driver
/// info is known.
#[derive(Debug)]
pub struct BinaryCache {
    dir: Option<PathBuf>,
    enabled: bool,
    fingerprint: u64,
    invalidated: bool,
    disk_attempts: usize,
}

impl BinaryCache {
    /// `dir` is the cache root; `enabled` folds together every reason not
    /// to cache (configuration, missing driver support, external shader
    /// sources in use).
    #[must_use]
    pub fn new(dir: Option<PathBuf>, enabled: bool, fingerprint: u64) -> Self {
        Self {
            enabled: enabled && dir.is_some(),
            dir,
            fingerprint,
            invalidated: false,
            disk_attempts: 0,
        }
    }

    /// Whether the cache was invalidated for the rest of this run.
    #[must_use]
    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    /// Number of times a load actually touched the disk. After
    /// invalidation this stops growing.
    #[must_use]
    pub fn disk_attempts(&self) -> usize {
        self.disk_attempts
    }

    /// Try to restore a previously saved program.
    ///
    /// Returns `None` (silently, this is an expected path) when caching is
    /// off, the cache is invalidated, the file is absent or malformed, or
    /// any identity field (version, fingerprint, macro set, checksum)
    /// doesn't match the current in-memory state. Loaded handles are only
    /// returned when the driver accepted the payload.
    pub fn load(
        &mut self,
        backend: &mut dyn GlBackend,
        shader_name: &str,
        permutation_index: usize,
        macro_tags: &[u32],
        source_checksum: u64,
    ) -> Option<ProgramHandle> {
        if !self.enabled || self.invalidated {
            return None;
        }

        let path = self.entry_path(shader_name, permutation_index)?;
        self.disk_attempts += 1;

        let data = std::fs::read(&path).ok()?;
        let mut cursor = Cursor::new(&data);

        let version = cursor.read_u32()?;
        let fingerprint = cursor.read_u64()?;
        if version != BINARY_FORMAT_VERSION || fingerprint != self.fingerprint {
            // These two fields are the same for every entry, so don't
            // bother opening any of the remaining files this run.
            log::warn!("invalidating shader binary cache");
            self.invalidated = true;
            return None;
        }

        let num_macros = cursor.read_u32()? as usize;
        if num_macros != macro_tags.len() {
            return None;
        }
        for &expected in macro_tags {
            if cursor.read_u32()? != expected {
                return None;
            }
        }

        let binary_format = cursor.read_u32()?;
        let binary_length = cursor.read_u32()? as usize;
        let checksum = cursor.read_u64()?;
        if checksum != source_checksum {
            return None;
        }

        let payload = cursor.read_bytes(binary_length)?;

        backend.load_binary(&ProgramBinary {
            format: binary_format,
            data: payload.to_vec(),
        })
    }

    /// Persist a linked program's binary. Never fails the caller: a missing
    /// or zero-length driver binary is a silent no-op, a write failure is
    /// logged and dropped.
    pub fn save(
        &mut self,
        backend: &mut dyn GlBackend,
        shader_name: &str,
        permutation_index: usize,
        macro_tags: &[u32],
        source_checksum: u64,
        program: ProgramHandle,
    ) {
        if !self.enabled {
            return;
        }

        let Some(path) = self.entry_path(shader_name, permutation_index) else {
            return;
        };

        // The driver may report a zero-length binary on error; nothing to
        // save then.
        let Some(binary) = backend.program_binary(program) else {
            return;
        };
        if binary.data.is_empty() {
            return;
        }

        let mut out = Vec::with_capacity(32 + 4 * macro_tags.len() + binary.data.len());
        out.extend_from_slice(&BINARY_FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&self.fingerprint.to_le_bytes());
        out.extend_from_slice(&(macro_tags.len() as u32).to_le_bytes());
        for &tag in macro_tags {
            out.extend_from_slice(&tag.to_le_bytes());
        }
        out.extend_from_slice(&binary.format.to_le_bytes());
        out.extend_from_slice(&(binary.data.len() as u32).to_le_bytes());
        out.extend_from_slice(&source_checksum.to_le_bytes());
        out.extend_from_slice(&binary.data);

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            log::warn!("couldn't create shader cache directory: {e}");
            return;
        }
        if let Err(e) = std::fs::write(&path, &out) {
            log::warn!("couldn't write shader binary {}: {e}", path.display());
        }
    }

    fn entry_path(&self, shader_name: &str, permutation_index: usize) -> Option<PathBuf> {
        let dir: &Path = self.dir.as_deref()?;
        Some(
            dir.join(shader_name)
                .join(format!("{shader_name}_{permutation_index}.bin")),
        )
    }
}

/// Minimal little-endian reader over a cache file; every accessor returns
/// `None` on a short read, which the loader treats as a cache miss.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read_u32(&mut self) -> Option<u32> {
        let bytes = self.read_bytes(4)?;
        Some(u32::from_le_bytes(bytes.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        let bytes = self.read_bytes(8)?;
        Some(u64::from_le_bytes(bytes.try_into().ok()?))
    }

    fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        if end > self.data.len() {
            return None;
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Some(slice)
    }
}
