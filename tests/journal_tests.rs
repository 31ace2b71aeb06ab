//! Tests for the Journal
//!
//! These tests verify:
//! - Record round-trip for every tag
//! - Record size rounding
//! - Replay precedence, tombstones and wipes
//! - Idempotent INIT and key mismatch detection
//! - Partial trailing records (crash mid-append)
//! - Fatal format errors (version, tag, checksum)

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use fieldstore::config::{Config, JournalSyncStrategy};
use fieldstore::journal::{
    Journal, JournalRecord, RecordHeader, RecordTag, HEADER_SIZE, SCHEMA_FILENAME, TOC_FILENAME,
};
use fieldstore::{FieldError, Key};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn db_key() -> Key {
    Key::new().with("class", "od").with("expver", "0001")
}

fn setup_journal() -> (TempDir, Journal) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .sync_strategy(JournalSyncStrategy::OsBuffered)
        .build()
        .unwrap();
    let journal = Journal::new(temp_dir.path().join("od:0001"), &config);
    (temp_dir, journal)
}

fn setup_initialised_journal() -> (TempDir, Journal) {
    let (temp, journal) = setup_journal();
    journal.write_init(&db_key()).unwrap();
    (temp, journal)
}

fn segment_ids(journal: &Journal) -> Vec<(String, u64)> {
    journal
        .reconstruct()
        .unwrap()
        .into_iter()
        .map(|s| (s.id.path, s.id.offset))
        .collect()
}

/// Append raw bytes to the journal file (for crafting torn tails and corruption)
fn append_raw(path: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
}

/// Overwrite bytes at `offset` in the journal file
fn patch(path: &Path, offset: usize, bytes: &[u8]) {
    let mut data = fs::read(path).unwrap();
    data[offset..offset + bytes.len()].copy_from_slice(bytes);
    fs::write(path, data).unwrap();
}

// =============================================================================
// Record Encoding Tests
// =============================================================================

#[test]
fn test_encoded_record_is_rounded() {
    let record = JournalRecord::Index {
        path: "index.1".to_string(),
        offset: 42,
        metadata: vec![7u8; 3000],
    };

    let bytes = record.encode(2, 1024).unwrap();
    assert_eq!(bytes.len(), 3072);

    let header: [u8; HEADER_SIZE] = bytes[..HEADER_SIZE].try_into().unwrap();
    let header = RecordHeader::decode(&header);
    assert_eq!(header.tag, RecordTag::Index as u8);
    assert_eq!(header.version, 2);
    assert_eq!(header.size, 3072);
    assert!(header.payload_len as usize > 3000);
}

#[test]
fn test_wipe_record_fills_one_block() {
    let bytes = JournalRecord::Wipe.encode(2, 1024).unwrap();
    assert_eq!(bytes.len(), 1024);
    assert!(bytes[HEADER_SIZE..].iter().all(|&b| b == 0));
}

#[test]
fn test_records_round_trip_every_tag() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_index("index.1", 0, b"meta-a").unwrap();
    journal.write_clear("index.1", 0).unwrap();
    journal.write_wipe().unwrap();

    let records = journal.records().unwrap();
    assert_eq!(
        records,
        vec![
            JournalRecord::Init { key: db_key() },
            JournalRecord::Index {
                path: "index.1".to_string(),
                offset: 0,
                metadata: b"meta-a".to_vec(),
            },
            JournalRecord::Clear {
                path: "index.1".to_string(),
                offset: 0,
            },
            JournalRecord::Wipe,
        ]
    );

    let len = fs::metadata(journal.path()).unwrap().len();
    assert_eq!(len, 4 * 1024);
}

#[test]
fn test_custom_round_size() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder().round_size(64).build().unwrap();
    let journal = Journal::new(temp.path().join("db:1"), &config);

    journal.write_init(&db_key()).unwrap();
    journal.write_wipe().unwrap();

    let len = fs::metadata(journal.path()).unwrap().len();
    assert_eq!(len % 64, 0);
    assert_eq!(journal.records().unwrap().len(), 2);
}

// =============================================================================
// Init Tests
// =============================================================================

#[test]
fn test_init_creates_directory_and_toc() {
    let (_temp, journal) = setup_journal();
    assert!(!journal.exists());

    journal.write_init(&db_key()).unwrap();

    assert!(journal.exists());
    assert!(Journal::can_handle(journal.directory()));
    assert_eq!(journal.path(), journal.directory().join(TOC_FILENAME));
    assert_eq!(journal.database_key().unwrap(), db_key());
}

#[test]
fn test_init_is_idempotent() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_init(&db_key()).unwrap();

    let reordered = Key::new().with("expver", "0001").with("class", "od");
    journal.write_init(&reordered).unwrap();

    assert_eq!(journal.records().unwrap().len(), 1);
}

#[test]
fn test_init_with_different_key_fails() {
    let (_temp, journal) = setup_initialised_journal();
    let other = Key::new().with("class", "od").with("expver", "0002");

    let result = journal.write_init(&other);
    assert!(matches!(result, Err(FieldError::KeyMismatch { .. })));
    assert_eq!(journal.records().unwrap().len(), 1);
}

#[test]
fn test_init_copies_schema() {
    let temp = TempDir::new().unwrap();
    let schema_path = temp.path().join("master-schema");
    fs::write(&schema_path, "[class,expver[date[param]]]").unwrap();

    let config = Config::builder().schema_path(&schema_path).build().unwrap();
    let journal = Journal::new(temp.path().join("od:0001"), &config);
    journal.write_init(&db_key()).unwrap();

    let copied = fs::read_to_string(journal.directory().join(SCHEMA_FILENAME)).unwrap();
    assert_eq!(copied, "[class,expver[date[param]]]");
}

#[test]
fn test_init_truncates_torn_first_record() {
    let (_temp, journal) = setup_journal();
    fs::create_dir_all(journal.directory()).unwrap();
    fs::write(journal.path(), [1u8, 0, 2]).unwrap();

    journal.write_init(&db_key()).unwrap();

    assert_eq!(fs::metadata(journal.path()).unwrap().len(), 1024);
    assert_eq!(journal.database_key().unwrap(), db_key());
}

#[test]
fn test_append_without_init_fails() {
    let (_temp, journal) = setup_journal();
    let result = journal.write_index("index.1", 0, b"");
    assert!(matches!(result, Err(FieldError::Io { .. })));
}

#[test]
fn test_database_key_without_init_record() {
    let (_temp, journal) = setup_journal();
    fs::create_dir_all(journal.directory()).unwrap();
    fs::write(journal.path(), JournalRecord::Wipe.encode(2, 1024).unwrap()).unwrap();

    let result = journal.database_key();
    assert!(matches!(result, Err(FieldError::MissingInit { .. })));
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_replay_missing_journal_is_empty() {
    let (_temp, journal) = setup_journal();
    let replay = journal.replay().unwrap();
    assert!(replay.key.is_none());
    assert!(replay.segments.is_empty());
    assert_eq!(replay.records_read, 0);
}

#[test]
fn test_replay_newest_first() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_index("index.a", 0, b"a").unwrap();
    journal.write_index("index.b", 0, b"b").unwrap();
    journal.write_index("index.a", 4096, b"c").unwrap();

    assert_eq!(
        segment_ids(&journal),
        vec![
            ("index.a".to_string(), 4096),
            ("index.b".to_string(), 0),
            ("index.a".to_string(), 0),
        ]
    );
}

#[test]
fn test_replay_materializes_segments() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_index("index.a", 128, b"metadata").unwrap();

    let replay = journal.replay().unwrap();
    assert_eq!(replay.key, Some(db_key()));
    assert_eq!(replay.records_read, 2);
    assert!(!replay.torn_tail);

    let segment = &replay.segments[0];
    assert_eq!(segment.path(), "index.a");
    assert_eq!(segment.offset(), 128);
    assert_eq!(segment.location, journal.directory().join("index.a"));
    assert_eq!(segment.metadata, b"metadata".to_vec());
}

#[test]
fn test_replay_is_idempotent() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_index("index.a", 0, b"a").unwrap();
    journal.write_index("index.b", 0, b"b").unwrap();
    journal.write_clear("index.a", 0).unwrap();

    let first = journal.reconstruct().unwrap();
    let second = journal.reconstruct().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_clear_removes_segment() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_index("index.a", 0, b"a").unwrap();
    journal.write_index("index.b", 0, b"b").unwrap();
    journal.write_clear("index.a", 0).unwrap();

    assert_eq!(segment_ids(&journal), vec![("index.b".to_string(), 0)]);
}

#[test]
fn test_clear_matches_path_and_offset() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_index("index.a", 0, b"a").unwrap();
    journal.write_index("index.a", 512, b"b").unwrap();
    journal.write_clear("index.a", 512).unwrap();

    assert_eq!(segment_ids(&journal), vec![("index.a".to_string(), 0)]);
}

#[test]
fn test_clear_of_unknown_segment_is_ignored() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_index("index.a", 0, b"a").unwrap();
    journal.write_clear("index.zzz", 0).unwrap();

    assert_eq!(segment_ids(&journal), vec![("index.a".to_string(), 0)]);
}

#[test]
fn test_clear_removes_one_duplicate() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_index("index.a", 0, b"first").unwrap();
    journal.write_index("index.a", 0, b"second").unwrap();
    journal.write_clear("index.a", 0).unwrap();

    let segments = journal.reconstruct().unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].metadata, b"second".to_vec());
}

#[test]
fn test_wipe_drops_everything() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_index("index.a", 0, b"a").unwrap();
    journal.write_index("index.b", 0, b"b").unwrap();
    journal.write_wipe().unwrap();

    assert!(journal.reconstruct().unwrap().is_empty());
}

#[test]
fn test_index_after_wipe_is_live() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_index("index.a", 0, b"a").unwrap();
    journal.write_wipe().unwrap();
    journal.write_clear("index.a", 0).unwrap();
    journal.write_index("index.c", 0, b"c").unwrap();
    journal.write_index("index.d", 0, b"d").unwrap();

    assert_eq!(
        segment_ids(&journal),
        vec![("index.d".to_string(), 0), ("index.c".to_string(), 0)]
    );
}

#[test]
fn test_version_one_records_are_readable() {
    let temp = TempDir::new().unwrap();
    let directory = temp.path().join("od:0001");

    let old = Config::builder().write_version(1).build().unwrap();
    let writer = Journal::new(&directory, &old);
    writer.write_init(&db_key()).unwrap();
    writer.write_index("index.a", 0, b"a").unwrap();

    let reader = Journal::new(&directory, &Config::default());
    assert_eq!(reader.reconstruct().unwrap().len(), 1);
}

// =============================================================================
// Partial Write Tests
// =============================================================================

#[test]
fn test_partial_header_is_end_of_log() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_index("index.a", 0, b"a").unwrap();
    append_raw(journal.path(), &[2u8, 0, 2, 0, 0]);

    let replay = journal.replay().unwrap();
    assert!(replay.torn_tail);
    assert_eq!(replay.records_read, 2);
    assert_eq!(replay.segments.len(), 1);
}

#[test]
fn test_partial_payload_is_end_of_log() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_index("index.a", 0, b"a").unwrap();

    let record = JournalRecord::Index {
        path: "index.b".to_string(),
        offset: 0,
        metadata: b"b".to_vec(),
    };
    let bytes = record.encode(2, 1024).unwrap();
    append_raw(journal.path(), &bytes[..600]);

    let replay = journal.replay().unwrap();
    assert!(replay.torn_tail);
    assert_eq!(
        replay.segments.iter().map(|s| s.path()).collect::<Vec<_>>(),
        vec!["index.a"]
    );
}

#[test]
fn test_append_after_partial_record_truncates_it() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_index("index.a", 0, b"a").unwrap();

    let record = JournalRecord::Index {
        path: "index.b".to_string(),
        offset: 0,
        metadata: b"b".to_vec(),
    };
    let bytes = record.encode(2, 1024).unwrap();
    append_raw(journal.path(), &bytes[..600]);

    journal.write_index("index.c", 0, b"c").unwrap();
    assert_eq!(fs::metadata(journal.path()).unwrap().len(), 3 * 1024);

    let replay = journal.replay().unwrap();
    assert!(!replay.torn_tail);
    assert_eq!(
        segment_ids(&journal),
        vec![("index.c".to_string(), 0), ("index.a".to_string(), 0)]
    );
}

#[test]
fn test_append_after_block_aligned_partial_record() {
    let (_temp, journal) = setup_initialised_journal();

    // A 3072 byte record cut after its first block
    let record = JournalRecord::Index {
        path: "index.big".to_string(),
        offset: 0,
        metadata: vec![7u8; 3000],
    };
    let bytes = record.encode(2, 1024).unwrap();
    assert_eq!(bytes.len(), 3072);
    append_raw(journal.path(), &bytes[..1024]);

    journal.write_wipe().unwrap();
    journal.write_index("index.a", 0, b"a").unwrap();

    assert_eq!(journal.records().unwrap().len(), 3);
    assert_eq!(segment_ids(&journal), vec![("index.a".to_string(), 0)]);
}

#[test]
fn test_append_refuses_corrupt_record_size() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_index("index.a", 0, b"a").unwrap();

    // size field of the INDEX record
    patch(journal.path(), 1024 + 4, &1000u32.to_le_bytes());

    let result = journal.write_index("index.b", 0, b"b");
    assert!(matches!(result, Err(FieldError::Format { offset: 1024, .. })));
    assert_eq!(fs::metadata(journal.path()).unwrap().len(), 2048);
}

// =============================================================================
// Format Error Tests
// =============================================================================

#[test]
fn test_unsupported_version_is_fatal() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_index("index.a", 0, b"a").unwrap();
    patch(journal.path(), 1024 + 2, &99u16.to_le_bytes());

    let err = journal.replay().unwrap_err();
    assert!(err.is_format());
    match err {
        FieldError::UnsupportedVersion { version, .. } => assert_eq!(version, 99),
        other => panic!("expected version error, got {:?}", other),
    }
}

#[test]
fn test_version_outside_configured_list_is_fatal() {
    let temp = TempDir::new().unwrap();
    let directory = temp.path().join("od:0001");
    Journal::new(&directory, &Config::default())
        .write_init(&db_key())
        .unwrap();

    let strict = Config::builder()
        .write_version(1)
        .supported_versions(vec![1])
        .build()
        .unwrap();
    let result = Journal::new(&directory, &strict).replay();
    assert!(matches!(result, Err(FieldError::UnsupportedVersion { .. })));
}

#[test]
fn test_unknown_tag_is_fatal() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_wipe().unwrap();
    patch(journal.path(), 1024, &[9u8]);

    let result = journal.replay();
    assert!(matches!(
        result,
        Err(FieldError::UnknownTag { tag: 9, offset: 1024, .. })
    ));
}

#[test]
fn test_inconsistent_size_is_fatal() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_wipe().unwrap();
    patch(journal.path(), 1024 + 4, &1000u32.to_le_bytes());

    let result = journal.replay();
    assert!(matches!(result, Err(FieldError::Format { .. })));
}

#[test]
fn test_checksum_mismatch_is_fatal() {
    let (_temp, journal) = setup_initialised_journal();
    journal.write_index("index.a", 0, b"payload").unwrap();
    patch(journal.path(), 1024 + HEADER_SIZE + 2, &[0xff]);

    let result = journal.replay();
    assert!(matches!(result, Err(FieldError::Format { .. })));
}

#[test]
fn test_second_init_with_other_key_is_fatal() {
    let (_temp, journal) = setup_initialised_journal();
    let other = Key::new().with("class", "rd");
    append_raw(
        journal.path(),
        &JournalRecord::Init { key: other }.encode(2, 1024).unwrap(),
    );

    let result = journal.replay();
    assert!(matches!(result, Err(FieldError::KeyMismatch { .. })));
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_rejects_tiny_round_size() {
    let result = Config::builder().round_size(8).build();
    assert!(matches!(result, Err(FieldError::Config(_))));
}

#[test]
fn test_config_rejects_unsupported_write_version() {
    let result = Config::builder().write_version(7).build();
    assert!(matches!(result, Err(FieldError::Config(_))));
}

#[test]
fn test_zero_round_size_is_rejected() {
    let temp = TempDir::new().unwrap();
    let mut config = Config::default();
    config.journal.round_size = 0;

    let journal = Journal::new(temp.path().join("od:0001"), &config);
    let result = journal.write_init(&db_key());
    assert!(matches!(result, Err(FieldError::Config(_))));
    assert!(matches!(journal.records(), Err(FieldError::Config(_))));
    assert!(matches!(
        JournalRecord::Wipe.encode(2, 0),
        Err(FieldError::Config(_))
    ));
}

#[test]
fn test_default_supported_versions() {
    let config = Config::default();
    assert_eq!(config.journal.supported_versions, vec![1, 2]);
    assert!(config.journal.validate().is_ok());
}
