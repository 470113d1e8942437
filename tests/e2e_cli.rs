//! CLI end-to-end tests
//!
//! Tests for the mp4split command-line interface.

use assert_cmd::prelude::*;
use mp4split_media::fmp4::{FileBuilder, TrackSpec};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};

/// Get a command for the mp4split binary
#[allow(deprecated)]
fn mp4split_cmd() -> Command {
    Command::cargo_bin("mp4split").unwrap()
}

/// Video track 1 and audio track 2, interleaved fragments.
fn interleaved() -> FileBuilder {
    FileBuilder::new()
        .track(TrackSpec::video(1))
        .track(TrackSpec::audio(2))
        .fragment(&[1], b"video-0")
        .fragment(&[2], b"audio-0")
        .fragment(&[1], b"video-1")
        .fragment(&[2], b"audio-1")
}

/// Write `data` as input.mp4 in a fresh directory.
fn write_input(data: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.mp4");
    fs::write(&input, data).unwrap();
    (dir, input)
}

fn split_cmd(dir: &Path, input: &Path) -> Command {
    let mut cmd = mp4split_cmd();
    cmd.current_dir(dir)
        .arg("split")
        .arg(input)
        .arg("-o")
        .arg(dir.join("out"));
    cmd
}

fn sorted_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = mp4split_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = mp4split_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mp4split"));
}

#[test]
fn test_cli_split_help() {
    let mut cmd = mp4split_cmd();
    cmd.args(["split", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--track-id"))
        .stdout(predicate::str::contains("--init-only"));
}

#[test]
fn test_split_nonexistent_file() {
    let dir = tempdir().unwrap();
    let mut cmd = split_cmd(dir.path(), &dir.path().join("missing.mp4"));
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_split_all_tracks() {
    let builder = interleaved().mfra();
    let (dir, input) = write_input(&builder.build());

    split_cmd(dir.path(), &input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 5 segments"));

    let out = dir.path().join("out");
    assert_eq!(
        sorted_names(&out),
        vec![
            "init.mp4",
            "segment-1.0001.m4s",
            "segment-1.0003.m4s",
            "segment-2.0002.m4s",
            "segment-2.0004.m4s",
        ]
    );

    // Segments in order reproduce the input, minus mfra.
    let mut joined = fs::read(out.join("init.mp4")).unwrap();
    for name in [
        "segment-1.0001.m4s",
        "segment-2.0002.m4s",
        "segment-1.0003.m4s",
        "segment-2.0004.m4s",
    ] {
        joined.extend(fs::read(out.join(name)).unwrap());
    }
    assert_eq!(joined, interleaved().build());
}

#[test]
fn test_split_track_filter() {
    let (dir, input) = write_input(&interleaved().build());

    split_cmd(dir.path(), &input)
        .args(["--track-id", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 segments"));

    let out = dir.path().join("out");
    assert_eq!(
        sorted_names(&out),
        vec!["init.mp4", "segment-2.0001.m4s", "segment-2.0002.m4s"]
    );

    let segment = fs::read(out.join("segment-2.0001.m4s")).unwrap();
    let needle = b"audio-0";
    assert!(segment.windows(needle.len()).any(|w| w == needle));
    assert!(!segment.windows(5).any(|w| w == b"video"));
}

#[test]
fn test_split_video_selector() {
    let (dir, input) = write_input(&interleaved().build());

    split_cmd(dir.path(), &input)
        .arg("--video")
        .assert()
        .success();

    assert_eq!(
        sorted_names(&dir.path().join("out")),
        vec!["init.mp4", "segment-1.0001.m4s", "segment-1.0002.m4s"]
    );
}

#[test]
fn test_split_audio_selector_without_audio_track() {
    let data = FileBuilder::new()
        .track(TrackSpec::video(1))
        .fragment(&[1], b"v")
        .build();
    let (dir, input) = write_input(&data);

    split_cmd(dir.path(), &input)
        .arg("--audio")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No audio track"));
}

#[test]
fn test_split_init_only() {
    let builder = interleaved();
    let (dir, input) = write_input(&builder.build());

    split_cmd(dir.path(), &input)
        .args(["--init-only", "--init-segment", "header.mp4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote init segment"));

    let out = dir.path().join("out");
    assert_eq!(sorted_names(&out), vec!["header.mp4"]);
    assert_eq!(
        fs::read(out.join("header.mp4")).unwrap(),
        builder.init_bytes()
    );
}

#[test]
fn test_split_naming_overrides() {
    let (dir, input) = write_input(&interleaved().build());

    split_cmd(dir.path(), &input)
        .args([
            "--track-id",
            "1",
            "--media-segment",
            "chunk-{number:03}.m4s",
            "--start-number",
            "5",
        ])
        .assert()
        .success();

    assert_eq!(
        sorted_names(&dir.path().join("out")),
        vec!["chunk-005.m4s", "chunk-006.m4s", "init.mp4"]
    );
}

#[test]
fn test_split_invalid_pattern() {
    let (dir, input) = write_input(&interleaved().build());

    split_cmd(dir.path(), &input)
        .args(["--media-segment", "chunk.m4s"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("placeholder"));
}

#[test]
fn test_split_without_moov_exits_100() {
    let data = mp4split_media::fmp4::leaf_box(b"ftyp", b"iso6\0\0\0\0");
    let (dir, input) = write_input(&data);

    split_cmd(dir.path(), &input)
        .assert()
        .failure()
        .code(100)
        .stderr(predicate::str::contains("moov"));
}

#[test]
fn test_split_malformed_fragment_exits_103() {
    let data = FileBuilder::new()
        .track(TrackSpec::video(1))
        .moof(mp4split_media::fmp4::FragmentBuilder::new(1).traf_without_tfhd())
        .build();
    let (dir, input) = write_input(&data);

    split_cmd(dir.path(), &input).assert().failure().code(103);
}

#[test]
fn test_split_trailing_garbage() {
    let data = interleaved().raw(&[0, 0, 0, 3, 1, 2]).build();
    let (dir, input) = write_input(&data);

    split_cmd(dir.path(), &input)
        .assert()
        .success()
        .stderr(predicate::str::contains("Warning"))
        .stdout(predicate::str::contains("Wrote 5 segments"));

    let (dir, input) = write_input(&data);
    split_cmd(dir.path(), &input)
        .arg("--strict")
        .assert()
        .failure()
        .code(104);
}

#[test]
fn test_split_with_config_file() {
    let (dir, input) = write_input(&interleaved().build());
    let config = dir.path().join("custom.toml");
    fs::write(
        &config,
        r#"
[split]
init_segment = "init.m4i"
media_segment = "part{number}.m4s"
track_ids = [1]
"#,
    )
    .unwrap();

    split_cmd(dir.path(), &input)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert_eq!(
        sorted_names(&dir.path().join("out")),
        vec!["init.m4i", "part1.m4s", "part2.m4s"]
    );
}

#[test]
fn test_inspect_text() {
    let (dir, input) = write_input(&interleaved().mfra().build());

    mp4split_cmd()
        .current_dir(dir.path())
        .arg("inspect")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Tracks: 2"))
        .stdout(predicate::str::contains("moof"))
        .stdout(predicate::str::contains("track 2"))
        .stdout(predicate::str::contains("mfra"));
}

#[test]
fn test_inspect_json() {
    let data = FileBuilder::new()
        .track(TrackSpec::video(1))
        .track(TrackSpec::audio(2))
        .fragment(&[1, 2], b"muxed")
        .build();
    let (dir, input) = write_input(&data);

    let output = mp4split_cmd()
        .current_dir(dir.path())
        .args(["inspect", "--json"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let boxes = report["boxes"].as_array().unwrap();
    let types: Vec<&str> = boxes.iter().map(|b| b["type"].as_str().unwrap()).collect();
    assert_eq!(types, vec!["ftyp", "moov", "moof", "mdat"]);
    assert_eq!(boxes[0]["offset"], 0);
    assert_eq!(boxes[2]["fragment"], "ambiguous");
    assert_eq!(report["movie"]["tracks"].as_array().unwrap().len(), 2);
    assert_eq!(report["movie"]["fragmented"], true);
}

#[test]
fn test_validate_default() {
    let dir = tempdir().unwrap();
    mp4split_cmd()
        .current_dir(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("segment-{track}.{number:04}.m4s"));
}
