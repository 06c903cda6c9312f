use super::helpers::{count_segment_files, framed_pair, segment_bytes};
use crate::*;
use anyhow::Result;
use tempfile::tempdir;

// --------------------- Recency preservation ---------------------

#[test]
fn merge_keeps_newer_value_on_duplicate_key() -> Result<()> {
    let dir = tempdir()?;
    let mut tree = Tree::open(dir.path())?;

    tree.put("hello", "first")?;
    tree.flush()?;
    tree.put("hello", "second")?;
    tree.flush()?;

    tree.merge(1, 2)?;

    assert_eq!(tree.segments(), &[1]);
    assert_eq!(count_segment_files(dir.path()), 1);
    assert!(!segment::segment_path(dir.path(), 2).exists());

    // Exactly the one pair, with the newer value.
    assert_eq!(segment_bytes(dir.path(), 1), framed_pair("hello", "second"));
    assert_eq!(tree.fetch("hello")?, Some(Value::from("second")));
    Ok(())
}

#[test]
fn merge_interleaves_disjoint_sorted_runs() -> Result<()> {
    let dir = tempdir()?;
    let mut tree = Tree::open(dir.path())?;

    for i in [1, 2, 7, 8] {
        tree.put(format!("hello{}", i).as_str(), "v")?;
    }
    tree.flush()?;
    for i in 3..=6 {
        tree.put(format!("hello{}", i).as_str(), "v")?;
    }
    tree.flush()?;

    tree.merge(1, 2)?;

    assert_eq!(tree.segments(), &[1]);
    let mut expected = Vec::new();
    for i in 1..=8 {
        expected.extend_from_slice(&framed_pair(&format!("hello{}", i), "v"));
    }
    assert_eq!(segment_bytes(dir.path(), 1), expected);

    for i in 1..=8 {
        assert_eq!(
            tree.fetch(format!("hello{}", i).as_str())?,
            Some(Value::from("v"))
        );
    }
    Ok(())
}

#[test]
fn merged_segment_stays_older_than_untouched_ones() -> Result<()> {
    let dir = tempdir()?;
    let mut tree = Tree::open(dir.path())?;

    tree.put("k", "oldest")?;
    tree.flush()?;
    tree.put("k", "middle")?;
    tree.flush()?;
    tree.put("k", "newest")?;
    tree.flush()?;

    // Fuse the two older segments; segment 3 must still win.
    tree.merge(1, 2)?;

    assert_eq!(tree.segments(), &[3, 1]);
    assert_eq!(tree.fetch("k")?, Some(Value::from("newest")));
    Ok(())
}

// --------------------- Bloom is untouched ---------------------

#[test]
fn merge_leaves_bloom_unchanged() -> Result<()> {
    let dir = tempdir()?;
    let mut tree = Tree::open(dir.path())?;

    tree.put("a", "1")?;
    tree.flush()?;
    tree.put("b", "2")?;
    tree.flush()?;

    let before = tree.bloom().clone();
    tree.merge(1, 2)?;
    assert_eq!(tree.bloom(), &before);
    Ok(())
}

// --------------------- Preconditions ---------------------

#[test]
fn self_merge_is_rejected() -> Result<()> {
    let dir = tempdir()?;
    let mut tree = Tree::open(dir.path())?;

    tree.put("a", "1")?;
    tree.flush()?;

    let err = tree.merge(1, 1).unwrap_err();
    assert_eq!(
        err.downcast_ref::<TreeError>(),
        Some(&TreeError::SelfMerge(1))
    );
    Ok(())
}

#[test]
fn out_of_order_merge_is_rejected() -> Result<()> {
    let dir = tempdir()?;
    let mut tree = Tree::open(dir.path())?;

    tree.put("a", "1")?;
    tree.flush()?;
    tree.put("b", "2")?;
    tree.flush()?;

    let err = tree.merge(2, 1).unwrap_err();
    assert_eq!(
        err.downcast_ref::<TreeError>(),
        Some(&TreeError::MergeOutOfOrder { older: 2, newer: 1 })
    );
    Ok(())
}

#[test]
fn rejected_merge_leaves_state_intact() -> Result<()> {
    let dir = tempdir()?;
    let mut tree = Tree::open(dir.path())?;

    tree.put("a", "1")?;
    tree.flush()?;
    tree.put("b", "2")?;
    tree.flush()?;

    assert!(tree.merge(2, 1).is_err());
    assert!(tree.merge(1, 1).is_err());

    assert_eq!(tree.segments(), &[2, 1]);
    assert_eq!(count_segment_files(dir.path()), 2);
    assert_eq!(tree.fetch("a")?, Some(Value::from("1")));
    assert_eq!(tree.fetch("b")?, Some(Value::from("2")));
    Ok(())
}

// --------------------- Merge then continue ---------------------

#[test]
fn flush_after_merge_resumes_id_sequence() -> Result<()> {
    let dir = tempdir()?;
    let mut tree = Tree::open(dir.path())?;

    tree.put("a", "1")?;
    tree.flush()?;
    tree.put("b", "2")?;
    tree.flush()?;
    tree.merge(1, 2)?;

    tree.put("c", "3")?;
    tree.flush()?;

    // The next id is max existing + 1, so id 2 is usable again after the
    // merge retired it.
    assert_eq!(tree.segments(), &[2, 1]);
    assert_eq!(tree.fetch("c")?, Some(Value::from("3")));
    Ok(())
}
