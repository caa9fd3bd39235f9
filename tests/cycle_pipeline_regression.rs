//! Cycle Pipeline Regression Tests
//!
//! Runs a semicolon-separated furnace log (comma decimals, a broken
//! thermocouple cell) through ingestion and the cycle report, and pins the
//! per-cycle metrics.

use furnace_cycles::config::AnalysisConfig;
use furnace_cycles::ingest::read_table;
use furnace_cycles::pipeline::{build_cycle_records, passport_or_stem, run_cycle_batch, CycleSource};
use furnace_cycles::types::{RunStatus, SampleTable, SkipReason};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Cursor;

/// Render columns as a `;` separated log with comma decimals
fn render(columns: &[(&str, Vec<String>)]) -> String {
    let header: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    let rows = columns[0].1.len();
    let mut text = header.join(";") + "\n";
    for row in 0..rows {
        let cells: Vec<String> = columns.iter().map(|(_, values)| values[row].replace('.', ",")).collect();
        text.push_str(&cells.join(";"));
        text.push('\n');
    }
    text
}

fn cells(values: &[f64]) -> Vec<String> {
    values.iter().map(f64::to_string).collect()
}

/// Seventeen rows, two form-active cycles; only the first one pours.
fn furnace_log() -> String {
    let mut piro = cells(&[
        20.0, 20.0, 1500.0, 1600.0, 1650.0, 1640.0, 1640.0, 1620.0, 1100.0, 1150.0, 1400.0, 20.0, 1500.0,
        1600.0, 1610.0, 1605.0, 20.0,
    ]);
    piro[0] = "обрыв".to_string();
    let form = cells(&[
        0.0, 0.0, 1.0, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 3.0, 2.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0,
    ]);
    let bp2: Vec<String> = (1..=17).map(|i| format!("0.{i:02}")).collect();
    let mut tp = vec!["н/д".to_string(); 17];
    for (pos, value) in [(2, "1600"), (3, "1600"), (4, "1600"), (5, "1690"), (6, "1750"), (7, "1600")] {
        tp[pos] = value.to_string();
    }

    render(&[
        ("Piro", piro),
        (" BP2 ", bp2),
        ("Form", form),
        ("DL", vec!["1550".to_string(); 17]),
        ("DR", vec!["1400".to_string(); 17]),
        ("TL", vec!["1400".to_string(); 17]),
        ("TR", vec!["1510".to_string(); 17]),
        ("TP", tp),
    ])
}

fn load(text: &str) -> SampleTable {
    read_table(Cursor::new(text), "furnace.csv").unwrap()
}

#[test]
fn furnace_log_yields_one_cycle_record() {
    let table = load(&furnace_log());
    let passport = passport_or_stem(None, "furnace");
    let records =
        build_cycle_records(&table, "furnace.csv", Some("UVNK1"), &passport, &AnalysisConfig::default()).unwrap();
    assert_eq!(records.len(), 1, "second cycle never dips and must be dropped");

    let r = &records[0];
    assert_eq!(r.installation.as_deref(), Some("UVNK1"));
    assert_eq!((r.segment_start, r.segment_end), (3, 11));
    assert_eq!(r.fill_index, 8);
    assert_eq!(r.fill_temperature, Some(1620.0));
    assert_eq!(r.heating_start, 4);
    assert!((r.heating_minutes - 25.0 / 60.0).abs() < 1e-12);
    assert_eq!(r.min_pressure, Some(0.04));
    assert_eq!(r.max_pressure, Some(0.08));
    assert!((r.ppf_holding_minutes - 0.5).abs() < 1e-12);
    assert_eq!(r.holding_time, 25);
    assert_eq!(r.max_temperature, Some(1650.0));
    assert_eq!(r.thermocouple_max, Some(1690.0));
    assert_eq!(r.max_form_position, Some(3.5));
    assert_eq!(r.passport.get("passport_number").map(String::as_str), Some("furnace"));

    assert_eq!(r.fill_row.get("Piro"), Some(&Some(1620.0)));
    assert_eq!(r.fill_row.get("TP"), Some(&Some(1600.0)));
    assert_eq!(r.leakage_rate, None);
}

#[test]
fn fill_row_and_nulls_serialize_as_json() {
    let table = load(&furnace_log());
    let records = build_cycle_records(
        &table,
        "furnace.csv",
        None,
        &passport_or_stem(None, "furnace"),
        &AnalysisConfig::default(),
    )
    .unwrap();
    let json = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(json["fill_index"], 8);
    assert!(json["leakage_rate"].is_null());
    assert!(json["installation"].is_null());
    assert!(json["form_status"].is_string());
    assert!(json["fill_row"]["TP"].is_number());
}

#[test]
fn log_without_form_channel_is_skipped() {
    let table = load("Piro;BP2;DL;DR;TL;TR\n1500;0,1;1;1;1;1\n");
    let err = build_cycle_records(
        &table,
        "x.csv",
        None,
        &passport_or_stem(None, "x"),
        &AnalysisConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err, SkipReason::MissingChannel("Form".to_string()));
}

/// Random logs of idle stretches and pour-shaped cycles
fn random_log(rng: &mut StdRng) -> SampleTable {
    let mut piro = Vec::new();
    let mut form = Vec::new();
    for _ in 0..rng.gen_range(1..6) {
        for _ in 0..rng.gen_range(1..5) {
            piro.push(20.0);
            form.push(0.0);
        }
        let rise = rng.gen_range(2..6);
        let peak = rng.gen_range(1450.0..1700.0);
        for k in 0..rise {
            piro.push(peak - 40.0 * f64::from(rise - k));
            form.push(rng.gen_range(0.5..4.0));
        }
        piro.push(peak);
        form.push(2.0);
        piro.push(rng.gen_range(1000.0..1300.0));
        form.push(1.0);
    }
    let n = piro.len();
    SampleTable::new(n)
        .with_channel("Piro", piro)
        .unwrap()
        .with_channel("Form", form)
        .unwrap()
        .with_channel("BP2", (0..n).map(|_| rng.gen_range(0.0..0.1)).collect())
        .unwrap()
        .with_channel("DL", vec![1550.0; n])
        .unwrap()
        .with_channel("DR", vec![1400.0; n])
        .unwrap()
        .with_channel("TL", vec![1400.0; n])
        .unwrap()
        .with_channel("TR", vec![1510.0; n])
        .unwrap()
}

#[test]
fn random_logs_keep_records_inside_their_segments() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let config = AnalysisConfig::default();

    let inputs: Vec<_> = (0..20)
        .map(|k| {
            Ok(CycleSource {
                source: format!("log{k}.csv"),
                table: random_log(&mut rng),
                passport: passport_or_stem(None, &format!("log{k}")),
            })
        })
        .collect();

    let first = run_cycle_batch(Some("UVNK1"), &inputs, &config);
    let second = run_cycle_batch(Some("UVNK1"), &inputs, &config);
    assert_eq!(first.records, second.records, "re-running must not change the output");
    assert_eq!(first.log.len(), inputs.len());

    for r in &first.records {
        assert!(r.segment_start <= r.fill_index && r.fill_index <= r.segment_end);
        assert!(r.segment_start <= r.heating_start && r.heating_start <= r.segment_end);
        assert!(r.holding_time % config.sampling.period_secs == 0);
    }
    assert!(first
        .log
        .iter()
        .all(|e| matches!(e.status, RunStatus::Success | RunStatus::Skipped)));
}
