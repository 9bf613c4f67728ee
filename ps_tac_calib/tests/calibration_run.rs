use crate::util::*;
mod util;

use pretty_assertions::assert_eq;
use ps_tac_calib::config::prelude::*;
use ps_tac_calib::processor::PsVsTacCalibration;
use ps_tac_calib::registry::HistoKey;
use ps_tac_calib::sink::container::read_container;
use ps_tac_calib::stats::RunSummary;
use ps_tac_calib::trigger::{Subsystem, TriggerBit};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn bit(b: u8) -> TriggerBit {
    TriggerBit::new(b).unwrap()
}

fn entries(summary: &RunSummary, key: HistoKey, b: u8) -> u64 {
    summary.registry.bucket(key, bit(b)).unwrap().entries()
}

/// Runs `events` through one run of a fresh calibration and returns the summary
fn run_events(config: MockConfig, events: &[RecordedEvent]) -> RunSummary {
    let mut calibration =
        PsVsTacCalibration::new(config, Arc::new(AtomicBool::new(false))).unwrap();
    calibration.init().unwrap();
    calibration.begin_run(1).unwrap();
    for event in events {
        calibration.event(event, event.event_number).unwrap();
    }
    let _ = calibration.end_run().unwrap();
    calibration.finalize().unwrap()
}

#[test]
fn irrelevant_trigger_touches_no_bucket() {
    let tmp_d = TempDir::new().unwrap();
    let event = tac_event(1, 1).with_trigger(0b1000_0000);

    let summary = run_events(MockConfig::new_with_output_dir(tmp_d.path()), &[event]);

    assert_eq!(summary.registry.iter().map(|b| b.entries()).sum::<u64>(), 0);
    assert_eq!(summary.trigger_stats.dropped_events(), 1);
    assert_eq!(summary.trigger_stats.invocations(Subsystem::Tac), 0);
}

#[test]
fn missing_trigger_treated_as_irrelevant() {
    let tmp_d = TempDir::new().unwrap();
    let event = RecordedEvent::new(1, 1).with_tac_hits("", vec![TacHit::new(1.0, 900.0)]);

    let summary = run_events(MockConfig::new_with_output_dir(tmp_d.path()), &[event]);

    assert_eq!(summary.trigger_stats.events_seen(), 1);
    assert_eq!(summary.registry.iter().map(|b| b.entries()).sum::<u64>(), 0);
}

#[test]
fn below_threshold_only_counts_hits() {
    let tmp_d = TempDir::new().unwrap();
    let event = RecordedEvent::new(1, 1)
        .with_trigger(TAC_BIT)
        .with_tac_hits("", vec![TacHit::new(1.0, 499.9), TacHit::new(2.0, 10.0)])
        .with_tagh_hits(vec![TaghHit::new(3.0, 9.0, 1)])
        .with_rf_time("TOF", 0.0);

    let summary = run_events(MockConfig::new_with_output_dir(tmp_d.path()), &[event]);

    assert_eq!(entries(&summary, HistoKey::TAC_NHITS, 1), 1);
    assert_eq!(summary.registry.family_entries(Subsystem::Tac, bit(1)), 1);
    let nhits = summary
        .registry
        .bucket(HistoKey::TAC_NHITS, bit(1))
        .unwrap()
        .as_1d()
        .unwrap();
    assert_eq!(nhits.bin_content(2), Some(1.0));
}

#[test]
fn empty_tac_collection_fills_nhits_at_zero() {
    let tmp_d = TempDir::new().unwrap();
    let event = RecordedEvent::new(1, 1).with_trigger(TAC_BIT);

    let summary = run_events(MockConfig::new_with_output_dir(tmp_d.path()), &[event]);

    let nhits = summary
        .registry
        .bucket(HistoKey::TAC_NHITS, bit(1))
        .unwrap()
        .as_1d()
        .unwrap();
    assert_eq!(nhits.entries(), 1);
    assert_eq!(nhits.bin_content(0), Some(1.0));
    assert_eq!(summary.registry.family_entries(Subsystem::Tac, bit(1)), 1);
}

#[test]
fn best_and_worst_match_fill_separate_buckets() {
    let tmp_d = TempDir::new().unwrap();
    let summary = run_events(
        MockConfig::new_with_output_dir(tmp_d.path()),
        &[tac_event(1, 1)],
    );

    let matched = summary
        .registry
        .bucket(HistoKey::TAC_TAGH_TIME_MATCHED, bit(1))
        .unwrap()
        .as_1d()
        .unwrap();
    let unmatched = summary
        .registry
        .bucket(HistoKey::TAC_TAGH_TIME_UNMATCHED, bit(1))
        .unwrap()
        .as_1d()
        .unwrap();
    // TAGH at 5.0 is 1 ns from the TAC hit, TAGH at -40.0 is 44 ns away
    assert_eq!(matched.mean(), Some(1.0));
    assert_eq!(unmatched.mean(), Some(-44.0));
    assert_eq!(entries(&summary, HistoKey::TAC_TAGH_TIME, 1), 2);
    assert_eq!(entries(&summary, HistoKey::TAC_TAGH_ENERGY, 1), 2);
}

#[test]
fn single_tagh_hit_is_best_and_worst() {
    let tmp_d = TempDir::new().unwrap();
    let event = RecordedEvent::new(1, 1)
        .with_trigger(TAC_BIT)
        .with_tac_hits("", vec![TacHit::new(0.0, 600.0)])
        .with_tagh_hits(vec![TaghHit::new(7.0, 4.0, 9)]);

    let summary = run_events(MockConfig::new_with_output_dir(tmp_d.path()), &[event]);

    for key in [
        HistoKey::TAC_TAGH_ENERGY_MATCHED,
        HistoKey::TAC_TAGH_ENERGY_UNMATCHED,
    ] {
        let hist = summary.registry.bucket(key, bit(1)).unwrap().as_1d().unwrap();
        assert_eq!(hist.mean(), Some(4.0), "{key}");
    }
    // No TOF RF time, no RF relative fills
    assert_eq!(entries(&summary, HistoKey::TAC_RF_TIME, 1), 0);
    assert_eq!(entries(&summary, HistoKey::TAC_TIME, 1), 0);
}

#[test]
fn overlapping_masks_fan_out_per_bit_and_subsystem() {
    let tmp_d = TempDir::new().unwrap();
    let config = MockConfig {
        tac_trigger_mask: 0b11,
        ps_trigger_mask: 0b11,
        ..MockConfig::new_with_output_dir(tmp_d.path())
    };
    let event = tac_event(1, 1)
        .with_trigger(0b11)
        .with_psc_hits(vec![PscHit::new(2.0, Arm::North, 1, true)]);

    let summary = run_events(config, &[event]);

    assert_eq!(summary.trigger_stats.invocations(Subsystem::Tac), 2);
    assert_eq!(summary.trigger_stats.invocations(Subsystem::Ps), 2);
    for b in [0, 1] {
        assert_eq!(entries(&summary, HistoKey::TAC_NHITS, b), 1);
        assert_eq!(entries(&summary, HistoKey::PSC_TIME, b), 1);
    }
}

#[test]
fn psc_without_tdc_still_fills_tagh_totals() {
    let tmp_d = TempDir::new().unwrap();
    let event = ps_event(1, 1).with_psc_hits(vec![PscHit::new(12.0, Arm::North, 3, false)]);

    let summary = run_events(MockConfig::new_with_output_dir(tmp_d.path()), &[event]);

    assert_eq!(entries(&summary, HistoKey::PSC_TIME, 0), 0);
    assert_eq!(entries(&summary, HistoKey::PSC_RF_TIME, 0), 0);
    assert_eq!(entries(&summary, HistoKey::PSC_TAGH_TIME, 0), 1);
    // TAGH 2 ns before the PSC hit is below the [0, 400) range
    let tagh_time = summary
        .registry
        .bucket(HistoKey::PSC_TAGH_TIME, bit(0))
        .unwrap()
        .as_1d()
        .unwrap();
    assert_eq!(tagh_time.underflow(), 1.0);
    assert_eq!(entries(&summary, HistoKey::PSC_TAGH_ENERGY, 0), 1);
    // PS matched and unmatched are never filled
    assert_eq!(entries(&summary, HistoKey::PSC_TAGH_TIME_MATCHED, 0), 0);
}

#[test]
fn checkpoint_interval_adds_one_flush() {
    let tmp_d = TempDir::new().unwrap();
    let config = MockConfig {
        checkpoint_interval: 3,
        ..MockConfig::new_with_output_dir(tmp_d.path())
    };
    let events: Vec<RecordedEvent> = (1..=4).map(|n| tac_event(1, n)).collect();

    let summary = run_events(config, &events);

    // Event 3 and end of run
    assert_eq!(summary.flushes, 2);
}

#[test]
fn default_checkpoint_interval_from_params() {
    let tmp_d = TempDir::new().unwrap();
    let interval = CalibParams::default().checkpoint_interval();
    assert_eq!(interval, 200_000);
    let config = MockConfig {
        checkpoint_interval: interval,
        ..MockConfig::new_with_output_dir(tmp_d.path())
    };
    let events = [
        tac_event(1, 199_999),
        tac_event(1, 200_000),
        tac_event(1, 200_001),
        tac_event(1, 399_999),
    ];

    let summary = run_events(config, &events);

    // Event 200000 and end of run
    assert_eq!(summary.flushes, 2);
}

#[test]
fn end_of_run_container_holds_every_bucket() {
    let tmp_d = TempDir::new().unwrap();
    let summary = run_events(
        MockConfig::new_with_output_dir(tmp_d.path()),
        &[tac_event(1, 1), ps_event(1, 2)],
    );

    let path = summary.last_output.clone().unwrap();
    assert_eq!(path, tmp_d.path().join("ps_vs_tac_calib_1.hist"));
    let container = read_container(&path).unwrap();
    assert_eq!(container.run_number, 1);
    assert_eq!(container.histograms.len(), summary.registry.len());
    for (stored, bucket) in container.histograms.iter().zip(summary.registry.iter()) {
        assert_eq!(stored.name(), bucket.name());
        assert_eq!(stored.title(), bucket.title());
        assert_eq!(stored.entries(), bucket.entries(), "{}", bucket.name());
        match (stored.as_1d(), bucket.as_1d()) {
            (Some(stored), Some(hist)) => assert_eq!(stored.contents(), hist.contents()),
            (None, None) => assert_eq!(
                stored.as_2d().unwrap().cells().collect::<Vec<_>>(),
                bucket.as_2d().unwrap().cells().collect::<Vec<_>>()
            ),
            _ => panic!("{} changed dimension", bucket.name()),
        }
    }
}

#[test]
fn process_drives_runs_from_events_file() {
    let tmp_d = TempDir::new().unwrap();
    let events: Vec<RecordedEvent> = (1..=50)
        .map(|n| {
            if n % 2 == 0 {
                tac_event(9, n)
            } else {
                ps_event(9, n)
            }
        })
        .collect();
    let events_path = write_events(&tmp_d, &events);
    let config = MockConfig {
        worker_threads: 3,
        ..MockConfig::new_with_output_dir(tmp_d.path())
    };

    let reader = init_reader(Some(&events_path)).unwrap();
    let summary = ps_tac_calib::process(
        &config,
        EventScanner::new(reader),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();

    assert_eq!(summary.trigger_stats.events_seen(), 50);
    assert_eq!(summary.trigger_stats.useful_events(), 50);
    assert_eq!(entries(&summary, HistoKey::TAC_NHITS, 1), 25);
    assert_eq!(entries(&summary, HistoKey::PSC_TIME, 0), 25);
    assert!(tmp_d.path().join("ps_vs_tac_calib_9.hist").exists());
}
