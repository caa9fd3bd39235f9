//! Leakage Carry-Forward Tests
//!
//! Writes a sequence of furnace logs to disk, loads them the way the CLI
//! does, and checks that each cycle record carries the leak-rate estimate
//! current after its own file, in file order.

use furnace_cycles::config::AnalysisConfig;
use furnace_cycles::ingest::load_table;
use furnace_cycles::pipeline::{passport_or_stem, run_cycle_batch, CycleSource, LoadFailure};
use furnace_cycles::types::RunStatus;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

const HEADER: &str = "Piro,BP2,Form,DL,DR,TL,TR";

/// One pouring cycle. With `ramp_slope`, a form-closed stretch comes
/// first: 100 samples at rest, then 200 samples creeping up by that slope
/// (scaled units per sample).
fn furnace_log(ramp_slope: Option<f64>, with_dl: bool) -> String {
    let mut text = String::new();
    let header = if with_dl { HEADER.to_string() } else { HEADER.replace(",DL", "") };
    writeln!(text, "{header}").unwrap();

    let mut row = |piro: f64, bp2: &str, form: f64| {
        let dl = if with_dl { ",1550" } else { "" };
        writeln!(text, "{piro},{bp2},{form}{dl},1400,1400,1510").unwrap();
    };

    if let Some(slope) = ramp_slope {
        for k in 0..300 {
            let scaled = if k < 100 { 5.0 } else { 5.0 + slope * f64::from(k - 99) };
            row(20.0, &format!("{}", scaled / 1000.0), 0.0);
        }
    }
    row(20.0, "", 0.0);
    for (piro, form) in [
        (1500.0, 1.0),
        (1600.0, 1.0),
        (1650.0, 1.5),
        (1640.0, 2.0),
        (1640.0, 2.5),
        (1620.0, 3.0),
        (1100.0, 3.5),
        (1150.0, 3.0),
        (1400.0, 2.0),
    ] {
        row(piro, "0.05", form);
    }
    row(20.0, "", 0.0);
    text
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn load(path: &Path) -> Result<CycleSource, LoadFailure> {
    let source = path.display().to_string();
    let table = load_table(path).map_err(|e| LoadFailure {
        source: source.clone(),
        error: e.to_string(),
    })?;
    let stem = path.file_stem().unwrap().to_string_lossy().into_owned();
    Ok(CycleSource {
        source,
        table,
        passport: passport_or_stem(None, &stem),
    })
}

#[test]
fn estimate_is_carried_until_superseded() {
    let dir = tempfile::tempdir().unwrap();
    let paths = [
        write(dir.path(), "01.csv", &furnace_log(None, true)),
        write(dir.path(), "02.csv", &furnace_log(Some(0.1), true)),
        write(dir.path(), "03.csv", &furnace_log(None, true)),
        write(dir.path(), "04.csv", &furnace_log(Some(0.15), true)),
        write(dir.path(), "05.csv", &furnace_log(None, true)),
    ];
    let inputs: Vec<_> = paths.iter().map(|p| load(p)).collect();
    let run = run_cycle_batch(Some("UVNK1"), &inputs, &AnalysisConfig::default());

    assert_eq!(run.records.len(), 5);
    let second = paths[1].display().to_string();
    let fourth = paths[3].display().to_string();

    assert_eq!(run.records[0].leakage_rate, None);
    for r in &run.records[1..3] {
        assert_eq!(r.leakage_source.as_deref(), Some(second.as_str()));
        assert!((r.leakage_rate.unwrap() - 82.0).abs() < 1e-3);
        assert_eq!(r.leakage_offset, Some(120));
    }
    for r in &run.records[3..] {
        assert_eq!(r.leakage_source.as_deref(), Some(fourth.as_str()));
        assert!((r.leakage_rate.unwrap() - 123.0).abs() < 1e-3);
    }
}

#[test]
fn skipped_and_unreadable_files_keep_their_place() {
    let dir = tempfile::tempdir().unwrap();
    let paths = [
        write(dir.path(), "a.csv", &furnace_log(Some(0.1), false)),
        write(dir.path(), "b.csv", "Piro,BP2,Form\n1,2,3\n1,2\n"),
        write(dir.path(), "c.csv", &furnace_log(None, true)),
    ];
    let inputs: Vec<_> = paths.iter().map(|p| load(p)).collect();
    assert!(inputs[1].is_err());

    let run = run_cycle_batch(None, &inputs, &AnalysisConfig::default());
    let statuses: Vec<RunStatus> = run.log.iter().map(|e| e.status).collect();
    assert_eq!(statuses, vec![RunStatus::Skipped, RunStatus::Failed, RunStatus::Success]);
    assert!(run.log[1].reason.contains("line 3"));

    // the skipped file still measured its leak ramp
    assert_eq!(run.records.len(), 1);
    let first = paths[0].display().to_string();
    assert_eq!(run.records[0].leakage_source.as_deref(), Some(first.as_str()));
}

#[test]
fn cycle_rows_do_not_count_as_leak_ramp() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "only_cycle.csv", &furnace_log(None, true));
    let run = run_cycle_batch(Some("UVNK3"), &[load(&path)], &AnalysisConfig::default());
    assert_eq!(run.records.len(), 1);
    assert_eq!(run.records[0].leakage_offset, None);
    assert_eq!(run.log[0].reason, "1 segments processed");
}
