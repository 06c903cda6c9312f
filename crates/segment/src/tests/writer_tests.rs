use super::helpers::{frame, framed_pairs};
use crate::*;
use tempfile::tempdir;

#[test]
fn writes_exact_frame_concatenation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("segment-1.data");

    SegmentWriter::write_pairs(&path, framed_pairs(&[("hello", "world")])).unwrap();

    let mut expected = frame("hello");
    expected.extend_from_slice(&frame("world"));
    assert_eq!(std::fs::read(&path).unwrap(), expected);
}

#[test]
fn no_temp_file_remains_after_write() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("segment-1.data");

    SegmentWriter::write_pairs(&path, framed_pairs(&[("a", "1"), ("b", "2")])).unwrap();

    assert!(path.exists());
    assert!(!temp_path(&path).exists());
}

#[test]
fn empty_pair_list_writes_empty_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("segment-1.data");

    SegmentWriter::write_pairs(&path, Vec::new()).unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), b"");
}

#[test]
fn rewriting_a_path_replaces_contents() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("segment-1.data");

    SegmentWriter::write_pairs(&path, framed_pairs(&[("old", "old")])).unwrap();
    SegmentWriter::write_pairs(&path, framed_pairs(&[("new", "new")])).unwrap();

    let mut expected = frame("new");
    expected.extend_from_slice(&frame("new"));
    assert_eq!(std::fs::read(&path).unwrap(), expected);
}

#[test]
fn temp_path_appends_suffix() {
    let p = std::path::Path::new("/x/segment-4.data");
    assert_eq!(
        temp_path(p),
        std::path::Path::new("/x/segment-4.data.tmp")
    );
}
