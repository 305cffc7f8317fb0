//! Binary Cache Tests
//!
//! Tests for:
//! - Save/load round trip with matching identity fields
//! - Per-field invalidation: version, fingerprint, macro set, checksum
//! - Run-wide invalidation short-circuit (no further disk reads)
//! - Short/truncated files and disabled configurations as silent misses
//! - Save never fails the caller

mod common;

use std::path::Path;

use common::{MockBackend, temp_cache_dir};
use glweave::backend::ProgramHandle;
use glweave::shader::binary_cache::{BINARY_FORMAT_VERSION, BinaryCache};

const FINGERPRINT: u64 = 0x00c0_ffee_d00d_f00d;
const CHECKSUM: u64 = 0x1234_5678_9abc_def0;
const TAGS: [u32; 2] = [1, 12];

fn entry_file(dir: &Path, name: &str, index: usize) -> std::path::PathBuf {
    dir.join(name).join(format!("{name}_{index}.bin"))
}

fn populated_cache(tag: &str) -> (std::path::PathBuf, MockBackend) {
    let dir = temp_cache_dir(tag);
    let mut backend = MockBackend::new();
    let mut cache = BinaryCache::new(Some(dir.clone()), true, FINGERPRINT);
    cache.save(
        &mut backend,
        "generic",
        3,
        &TAGS,
        CHECKSUM,
        ProgramHandle(9),
    );
    assert!(entry_file(&dir, "generic", 3).exists());
    (dir, backend)
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn round_trip_restores_program_without_recompilation() {
    let (dir, _) = populated_cache("roundtrip");

    let mut backend = MockBackend::new();
    let mut cache = BinaryCache::new(Some(dir), true, FINGERPRINT);
    let program = cache.load(&mut backend, "generic", 3, &TAGS, CHECKSUM);

    assert!(program.is_some());
    assert_eq!(backend.binary_loads, 1);
    assert_eq!(backend.compile_count(), 0);
    assert_eq!(cache.disk_attempts(), 1);
    assert!(!cache.is_invalidated());
}

#[test]
fn missing_file_is_a_silent_miss() {
    let dir = temp_cache_dir("missing");
    let mut backend = MockBackend::new();
    let mut cache = BinaryCache::new(Some(dir), true, FINGERPRINT);

    assert!(
        cache
            .load(&mut backend, "generic", 0, &TAGS, CHECKSUM)
            .is_none()
    );
    assert!(!cache.is_invalidated());
    assert_eq!(cache.disk_attempts(), 1);
}

// ============================================================================
// Per-field invalidation
// ============================================================================

#[test]
fn stale_format_version_invalidates_whole_cache() {
    common::init_test_logging();
    let (dir, _) = populated_cache("version");

    // rewrite the version field to one less than current
    let path = entry_file(&dir, "generic", 3);
    let mut data = std::fs::read(&path).unwrap();
    data[..4].copy_from_slice(&(BINARY_FORMAT_VERSION - 1).to_le_bytes());
    std::fs::write(&path, &data).unwrap();

    let mut backend = MockBackend::new();
    let mut cache = BinaryCache::new(Some(dir), true, FINGERPRINT);

    assert!(
        cache
            .load(&mut backend, "generic", 3, &TAGS, CHECKSUM)
            .is_none()
    );
    assert!(cache.is_invalidated());
    assert_eq!(cache.disk_attempts(), 1);

    // a second, unrelated permutation must not touch the disk again
    assert!(
        cache
            .load(&mut backend, "lightMapping", 0, &TAGS, CHECKSUM)
            .is_none()
    );
    assert_eq!(cache.disk_attempts(), 1);
    assert_eq!(backend.binary_loads, 0);
}

#[test]
fn changed_driver_fingerprint_invalidates_whole_cache() {
    let (dir, _) = populated_cache("fingerprint");

    let mut backend = MockBackend::new();
    let mut cache = BinaryCache::new(Some(dir), true, FINGERPRINT ^ 1);

    assert!(
        cache
            .load(&mut backend, "generic", 3, &TAGS, CHECKSUM)
            .is_none()
    );
    assert!(cache.is_invalidated());
}

#[test]
fn macro_count_mismatch_rejects_entry_only() {
    let (dir, _) = populated_cache("macro-count");

    let mut backend = MockBackend::new();
    let mut cache = BinaryCache::new(Some(dir), true, FINGERPRINT);

    assert!(
        cache
            .load(&mut backend, "generic", 3, &TAGS[..1], CHECKSUM)
            .is_none()
    );
    assert!(
        !cache.is_invalidated(),
        "a macro mismatch is per-entry, not run-wide"
    );
    assert_eq!(cache.disk_attempts(), 1);
}

#[test]
fn macro_identity_mismatch_rejects_entry() {
    let (dir, _) = populated_cache("macro-identity");

    let mut backend = MockBackend::new();
    let mut cache = BinaryCache::new(Some(dir), true, FINGERPRINT);

    assert!(
        cache
            .load(&mut backend, "generic", 3, &[TAGS[0], 99], CHECKSUM)
            .is_none()
    );
    assert!(!cache.is_invalidated());
}

#[test]
fn source_checksum_mismatch_rejects_entry() {
    let (dir, _) = populated_cache("checksum");

    let mut backend = MockBackend::new();
    let mut cache = BinaryCache::new(Some(dir), true, FINGERPRINT);

    assert!(
        cache
            .load(&mut backend, "generic", 3, &TAGS, CHECKSUM ^ 1)
            .is_none()
    );
    assert!(!cache.is_invalidated());
    assert_eq!(backend.binary_loads, 0);
}

// ============================================================================
// Malformed files
// ============================================================================

#[test]
fn short_file_is_a_silent_miss() {
    let dir = temp_cache_dir("short");
    let path = entry_file(&dir, "generic", 0);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, [1, 2, 3]).unwrap();

    let mut backend = MockBackend::new();
    let mut cache = BinaryCache::new(Some(dir), true, FINGERPRINT);

    assert!(
        cache
            .load(&mut backend, "generic", 0, &TAGS, CHECKSUM)
            .is_none()
    );
    assert!(!cache.is_invalidated());
}

#[test]
fn truncated_payload_is_a_silent_miss() {
    let (dir, _) = populated_cache("truncated");

    let path = entry_file(&dir, "generic", 3);
    let data = std::fs::read(&path).unwrap();
    std::fs::write(&path, &data[..data.len() - 4]).unwrap();

    let mut backend = MockBackend::new();
    let mut cache = BinaryCache::new(Some(dir), true, FINGERPRINT);

    assert!(
        cache
            .load(&mut backend, "generic", 3, &TAGS, CHECKSUM)
            .is_none()
    );
    assert_eq!(backend.binary_loads, 0);
}

// ============================================================================
// Disabled configurations
// ============================================================================

#[test]
fn disabled_cache_never_touches_disk() {
    let (dir, _) = populated_cache("disabled");

    let mut backend = MockBackend::new();
    let mut cache = BinaryCache::new(Some(dir), false, FINGERPRINT);

    assert!(
        cache
            .load(&mut backend, "generic", 3, &TAGS, CHECKSUM)
            .is_none()
    );
    assert_eq!(cache.disk_attempts(), 0);
}

#[test]
fn cache_without_directory_is_disabled() {
    let mut backend = MockBackend::new();
    let mut cache = BinaryCache::new(None, true, FINGERPRINT);

    assert!(
        cache
            .load(&mut backend, "generic", 0, &TAGS, CHECKSUM)
            .is_none()
    );
    assert_eq!(cache.disk_attempts(), 0);

    // save is likewise a no-op
    cache.save(
        &mut backend,
        "generic",
        0,
        &TAGS,
        CHECKSUM,
        ProgramHandle(1),
    );
}

// ============================================================================
// Save behavior
// ============================================================================

#[test]
fn zero_length_driver_binary_saves_nothing() {
    let dir = temp_cache_dir("zero-length");
    let mut backend = MockBackend::new();
    backend.empty_binaries = true;

    let mut cache = BinaryCache::new(Some(dir.clone()), true, FINGERPRINT);
    cache.save(
        &mut backend,
        "generic",
        0,
        &TAGS,
        CHECKSUM,
        ProgramHandle(1),
    );

    assert!(!entry_file(&dir, "generic", 0).exists());
}

#[test]
fn unwritable_cache_directory_never_panics() {
    // point the cache root at a regular file so directory creation fails
    let dir = temp_cache_dir("unwritable");
    let bogus_root = dir.join("not-a-directory");
    std::fs::write(&bogus_root, b"occupied").unwrap();

    let mut backend = MockBackend::new();
    let mut cache = BinaryCache::new(Some(bogus_root), true, FINGERPRINT);
    cache.save(
        &mut backend,
        "generic",
        0,
        &TAGS,
        CHECKSUM,
        ProgramHandle(1),
    );
}
