#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

/// Compare `actual` against the stored BED snapshot, or rewrite the snapshot
/// when `CLIPCALL_UPDATE_SNAPSHOTS` is set.
pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var_os("CLIPCALL_UPDATE_SNAPSHOTS").is_some() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let stored = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("cannot read BED snapshot {}: {err}", path.display()));
    let stored_lines: Vec<&str> = stored.lines().collect();
    let actual_lines: Vec<&str> = actual.lines().collect();
    assert!(
        stored_lines == actual_lines,
        "BED output differs from {} (rerun with CLIPCALL_UPDATE_SNAPSHOTS=1 to accept)\n--- stored\n{}\n--- produced\n{}",
        path.display(),
        stored_lines.join("\n"),
        actual_lines.join("\n"),
    );
}

/// Fresh scratch directory unique to this test process and call.
pub fn scratch_dir(label: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "clipcall-{label}-{}-{id}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch directory");
    dir
}

/// One SAM record line with a placeholder sequence of `seq_len` bases.
pub fn sam_record(name: &str, chrom: &str, pos: i64, cigar: &str, seq_len: usize) -> String {
    let seq = "ACGT".chars().cycle().take(seq_len).collect::<String>();
    let qual = "I".repeat(seq_len);
    format!("{name}\t0\t{chrom}\t{pos}\t60\t{cigar}\t*\t0\t0\t{seq}\t{qual}")
}

/// Small SAM document with a header, two chromosomes and a clip cluster.
pub fn fixture_sam() -> String {
    let mut lines = vec![
        "@HD\tVN:1.6\tSO:coordinate".to_string(),
        "@SQ\tSN:chr2\tLN:5000".to_string(),
        "@SQ\tSN:chr1\tLN:5000".to_string(),
        "@PG\tID:aligner\tPN:aligner".to_string(),
    ];
    // chr2: a cluster of trailing clips at 1030 plus a neighbour at 1031
    for i in 0..8 {
        lines.push(sam_record(&format!("c2_{i}"), "chr2", 1000, "30M10S", 40));
    }
    lines.push(sam_record("c2_n", "chr2", 1001, "30M10S", 40));
    // chr2: a lone leading clip
    lines.push(sam_record("c2_l", "chr2", 3000, "5S35M", 40));
    // chr1: leading clips at 200 (x3) and one at 201, hard clips outside
    for i in 0..3 {
        lines.push(sam_record(&format!("c1_{i}"), "chr1", 200, "20H6S34M", 40));
    }
    lines.push(sam_record("c1_n", "chr1", 201, "6S34M", 40));
    // chr1: fully aligned and unmapped reads contribute nothing
    lines.push(sam_record("c1_m", "chr1", 400, "40M", 40));
    lines.push("u1\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\tIIII".to_string());
    lines.join("\n") + "\n"
}

pub fn write_file(path: &Path, contents: &str) {
    fs::write(path, contents).expect("write fixture");
}
