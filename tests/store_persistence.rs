use contourmatch::{Contour, ContourMatchError, Point2, TemplateStore};

fn square(half: f64) -> Contour {
    Contour::new(vec![
        Point2::new(-half, -half),
        Point2::new(half, -half),
        Point2::new(half, half),
        Point2::new(-half, half),
    ])
}

fn arrow() -> Contour {
    Contour::new(vec![
        Point2::new(0.0, 10.0),
        Point2::new(30.0, 10.0),
        Point2::new(30.0, 0.0),
        Point2::new(50.0, 20.0),
        Point2::new(30.0, 40.0),
        Point2::new(30.0, 30.0),
        Point2::new(0.0, 30.0),
    ])
}

fn sample_store() -> TemplateStore {
    let mut store = TemplateStore::new();
    store.add_sample("AA", &square(10.0)).unwrap();
    store.add_sample("AB", &arrow()).unwrap();
    store.add_sample("AA", &square(17.5)).unwrap();
    store.set_preferred_angle_no_more_90("AB", true).unwrap();
    store
}

fn corrupt_reason(bytes: &[u8]) -> String {
    match TemplateStore::from_bytes(bytes) {
        Err(ContourMatchError::CorruptStore { reason }) => reason,
        other => panic!("expected CorruptStore, got {other:?}"),
    }
}

#[test]
fn bytes_round_trip_exactly() {
    let store = sample_store();
    let restored = TemplateStore::from_bytes(&store.to_bytes()).unwrap();
    assert_eq!(restored, store);
    assert!(restored.get("AB").unwrap().preferred_angle_no_more_90());
    assert_eq!(restored.get("AA").unwrap().samples().len(), 2);
}

#[test]
fn file_round_trip() {
    let store = sample_store();
    let path = std::env::temp_dir().join(format!(
        "contourmatch-store-{}.cmts",
        std::process::id()
    ));
    store.save_file(&path).unwrap();
    let restored = TemplateStore::load_file(&path);
    std::fs::remove_file(&path).unwrap();
    assert_eq!(restored.unwrap(), store);
}

#[test]
fn reader_round_trip_with_custom_sample_count() {
    let mut store = TemplateStore::with_sample_count(48).unwrap();
    store.add_sample("arrow", &arrow()).unwrap();
    let mut buf = Vec::new();
    store.write_to(&mut buf).unwrap();
    let restored = TemplateStore::read_from(&mut buf.as_slice()).unwrap();
    assert_eq!(restored.sample_count(), 48);
    assert_eq!(restored, store);
}

#[test]
fn missing_file_is_an_io_error() {
    let path = std::env::temp_dir().join("contourmatch-definitely-missing.cmts");
    assert!(matches!(
        TemplateStore::load_file(path),
        Err(ContourMatchError::Io { .. })
    ));
}

#[test]
fn rejects_bad_magic() {
    let mut bytes = sample_store().to_bytes();
    bytes[0] = b'X';
    assert_eq!(corrupt_reason(&bytes), "bad magic");
}

#[test]
fn rejects_duplicate_names() {
    let mut bytes = sample_store().to_bytes();
    let needle = [2u8, 0, 0, 0, b'A', b'B'];
    let pos = bytes
        .windows(needle.len())
        .position(|w| w == needle)
        .unwrap();
    bytes[pos + 5] = b'A';
    assert_eq!(corrupt_reason(&bytes), "duplicate template name `AA`");
}

#[test]
fn rejects_non_finite_points() {
    let mut bytes = sample_store().to_bytes();
    // header (14) + name length (4) + "AA" (2) + flags (1) + sample count (4)
    // + point count (4)
    let offset = 14 + 4 + 2 + 1 + 4 + 4;
    bytes[offset..offset + 8].copy_from_slice(&f64::NAN.to_le_bytes());
    assert_eq!(corrupt_reason(&bytes), "non-finite contour point");
}

#[test]
fn rejects_absurd_counts_without_allocating() {
    let mut bytes = TemplateStore::new().to_bytes();
    // template count = u32::MAX with no template data behind it
    bytes[10..14].copy_from_slice(&u32::MAX.to_le_bytes());
    assert!(corrupt_reason(&bytes).starts_with("unexpected end of data"));
}

#[test]
fn rejects_invalid_utf8_names() {
    let mut bytes = sample_store().to_bytes();
    bytes[18] = 0xFF;
    assert_eq!(corrupt_reason(&bytes), "template name is not valid UTF-8");
}

// Header (14) + name length (4) + "AA" (2) + flags (1) + sample count (4)
// + point count (4) + four points (64) + norm (8).
const FIRST_SUMMARY_OFFSET: usize = 14 + 4 + 2 + 1 + 4 + 4 + 64 + 8;
const FIRST_EDGE_OFFSET: usize = FIRST_SUMMARY_OFFSET + 16;

#[test]
fn rejects_tampered_acf_summary() {
    let mut bytes = sample_store().to_bytes();
    bytes[FIRST_SUMMARY_OFFSET..FIRST_SUMMARY_OFFSET + 4].copy_from_slice(&i32::MIN.to_le_bytes());
    assert_eq!(
        corrupt_reason(&bytes),
        "acf summary does not match descriptor edges"
    );
}

#[test]
fn rejects_edges_that_are_not_unit_norm() {
    let mut bytes = sample_store().to_bytes();
    bytes[FIRST_EDGE_OFFSET..FIRST_EDGE_OFFSET + 8].copy_from_slice(&3.0f64.to_le_bytes());
    assert_eq!(corrupt_reason(&bytes), "descriptor edges are not unit norm");
}

#[test]
fn loaded_store_matches_without_panicking() {
    use contourmatch::{Sample, TemplateFinder};
    use std::sync::Arc;

    let store = TemplateStore::from_bytes(&sample_store().to_bytes()).unwrap();
    let query = Arc::new(Sample::from_contour(square(30.0), store.sample_count()).unwrap());
    let found = TemplateFinder::default().find(&store, &query).unwrap();
    assert_eq!(found.name(), "AA");
}
