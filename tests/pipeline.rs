#[path = "common/mod.rs"]
mod common;
use common::{sam_record, scratch_dir, write_file};

use std::fs;

use clipcall::{BreakpointCaller, CallerConfig, CallerError, MalformedPolicy};

#[test]
fn trailing_clip_example_lands_at_projected_end() {
    let dir = scratch_dir("example");
    let input = dir.join("one.sam");
    write_file(&input, &(sam_record("r1", "chr1", 100, "5M3S", 8) + "\n"));

    let caller = BreakpointCaller::new(CallerConfig::default().with_threshold(0)).unwrap();
    let summary = caller.run(&input, dir.join("one")).unwrap();

    assert_eq!(
        fs::read_to_string(summary.hits_path).unwrap(),
        "chr1\t105\t106\tsoftclip\t1\n"
    );
    assert_eq!(fs::read_to_string(summary.rejects_path).unwrap(), "");
}

#[test]
fn even_window_fails_before_any_output_exists() {
    let dir = scratch_dir("even-window");
    let input = dir.join("missing.sam");
    let prefix = dir.join("out");

    let err = BreakpointCaller::new(CallerConfig::default().with_window(4))
        .and_then(|caller| caller.run(&input, &prefix))
        .unwrap_err();

    assert!(matches!(err, CallerError::InvalidWindowSize(_)));
    assert!(err.to_string().contains("invalid window size 4"));
    let (hits, rejects) = clipcall::output_paths(&prefix);
    assert!(!hits.exists());
    assert!(!rejects.exists());
}

#[test]
fn missing_input_names_the_path() {
    let dir = scratch_dir("missing-input");
    let input = dir.join("nope.sam");
    let caller = BreakpointCaller::new(CallerConfig::default()).unwrap();

    let err = caller.run(&input, dir.join("out")).unwrap_err();
    assert!(matches!(err, CallerError::InputAccess { .. }));
    assert!(err.to_string().contains("nope.sam"));
    assert!(!dir.join("out_hits.bed").exists());
}

#[test]
fn unwritable_output_names_the_path() {
    let dir = scratch_dir("bad-output");
    let input = dir.join("in.sam");
    write_file(&input, &(sam_record("r1", "chr1", 100, "5M3S", 8) + "\n"));
    let prefix = dir.join("no-such-dir").join("out");

    let caller = BreakpointCaller::new(CallerConfig::default()).unwrap();
    let err = caller.run(&input, &prefix).unwrap_err();
    assert!(matches!(err, CallerError::OutputAccess { .. }));
    assert!(err.to_string().contains("out_hits.bed"));
}

#[test]
fn structural_input_errors_name_file_and_line() {
    let dir = scratch_dir("short-record");
    let input = dir.join("short.sam");
    let text = format!(
        "@HD\tVN:1.6\n{}\nr2\t0\tchr1\t100\t60\t5M\n",
        sam_record("r1", "chr1", 100, "5M3S", 8)
    );
    write_file(&input, &text);

    let caller = BreakpointCaller::new(CallerConfig::default()).unwrap();
    let err = caller.run(&input, dir.join("out")).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("short.sam"), "{message}");
    assert!(message.contains("line 3"), "{message}");
    assert!(!dir.join("out_hits.bed").exists());
}

#[test]
fn aborting_policy_reports_malformed_line() {
    let dir = scratch_dir("malformed");
    let input = dir.join("bad.sam");
    let text = format!(
        "{}\n{}\n",
        sam_record("r1", "chr1", 100, "5M3S", 8),
        sam_record("r2", "chr1", 100, "5M3", 8)
    );
    write_file(&input, &text);

    let skipping = BreakpointCaller::new(CallerConfig::default().with_threshold(0)).unwrap();
    let summary = skipping.run(&input, dir.join("skip")).unwrap();
    assert_eq!(summary.ingest.malformed, 1);
    assert_eq!(summary.hits, 1);

    let aborting = BreakpointCaller::new(
        CallerConfig::default().with_malformed_policy(MalformedPolicy::Abort),
    )
    .unwrap();
    let err = aborting.run(&input, dir.join("abort")).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("bad.sam"), "{message}");
    assert!(message.contains("line 2"), "{message}");
    assert!(!dir.join("abort_hits.bed").exists());
}

#[test]
fn leading_and_trailing_clips_of_one_read_are_both_counted() {
    let dir = scratch_dir("both-ends");
    let input = dir.join("both.sam");
    let text = [
        sam_record("r1", "chr3", 50, "2S6M4S", 12),
        sam_record("r2", "chr3", 30, "8S", 8),
    ]
    .join("\n");
    write_file(&input, &text);

    let caller =
        BreakpointCaller::new(CallerConfig::default().with_window(1).with_threshold(2)).unwrap();
    let summary = caller.run(&input, dir.join("both")).unwrap();

    assert_eq!(
        fs::read_to_string(summary.hits_path).unwrap(),
        "chr3\t30\t31\tsoftclip\t2\n"
    );
    assert_eq!(
        fs::read_to_string(summary.rejects_path).unwrap(),
        "chr3\t50\t51\tsoftclip\t1\nchr3\t58\t59\tsoftclip\t1\n"
    );
}
