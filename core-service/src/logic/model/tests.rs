//! Detector lifecycle tests: train, persist, reload, predict.

use std::fs;
use std::sync::Arc;
use std::thread;

use tempfile::{tempdir, TempDir};

use super::detector::AnomalyDetector;
use super::prediction::Label;
use crate::logic::config::MonitorConfig;
use crate::logic::error::PipelineError;
use crate::logic::features::FeatureExtractor;
use crate::logic::packet::PacketRecord;

fn detector_in(dir: &TempDir) -> AnomalyDetector {
    let config = MonitorConfig {
        model_dir: dir.path().join("models"),
        dataset_path: dir.path().join("live_traffic.csv"),
        buffer_capacity: 500,
        contamination: 0.1,
    };
    AnomalyDetector::with_extractor(config, FeatureExtractor::seeded(42))
}

/// One packet per second, mostly small with a few oversized frames
fn traffic(n: usize) -> Vec<PacketRecord> {
    (0..n)
        .map(|i| {
            let length = if i % 25 == 0 { 1400 + (i as u64 % 100) } else { 60 + (i as u64 * 13) % 500 };
            PacketRecord::new(
                format!("2024-05-01 10:{:02}:{:02}", (i / 60) % 60, i % 60),
                "192.168.1.23",
                "142.250.74.46",
                if i % 4 == 0 { 17 } else { 6 },
                length,
            )
        })
        .collect()
}

#[test]
fn test_predict_without_model_is_not_ready() {
    let dir = tempdir().unwrap();
    let detector = detector_in(&dir);

    let result = detector.predict(&traffic(5));
    assert!(matches!(result, Err(PipelineError::ModelNotReady)));
    assert!(!detector.is_trained());
    assert_eq!(detector.status().failed_loads, 1);
}

#[test]
fn test_train_empty_is_data_unavailable() {
    let dir = tempdir().unwrap();
    let detector = detector_in(&dir);

    let err = detector.train(&[]).unwrap_err();
    assert!(err.is_empty_result());
    assert!(!detector.is_trained());
    assert!(!detector.config().model_path().exists());
}

#[test]
fn test_train_persists_and_reports() {
    let dir = tempdir().unwrap();
    let detector = detector_in(&dir);
    let records = traffic(200);

    let report = detector.train(&records).unwrap();
    assert_eq!(report.total_packets, 200);
    assert_eq!(report.anomalous_packets, 8);
    assert_eq!(report.normal_packets, 192);
    assert!(report.accuracy > 0.0 && report.accuracy <= 1.0);
    assert!(report.predicted_anomalies > 0);

    assert!(detector.is_trained());
    assert!(detector.config().model_path().exists());
    assert!(detector.config().scaler_path().exists());

    let status = detector.status();
    assert_eq!(status.model_id, Some(report.model_id));
    assert_eq!(status.num_trees, Some(100));
    assert_eq!(status.contamination, 0.1);
    assert_eq!(status.decision_offset, Some(report.model.forest.offset()));

    let untrained = detector_in(&tempdir().unwrap()).status();
    assert!(untrained.decision_offset.is_none());
}

#[test]
fn test_save_load_round_trip_same_predictions() {
    let dir = tempdir().unwrap();
    let records = traffic(150);

    let trained = detector_in(&dir);
    let report = trained.train(&records).unwrap();
    trained.save().unwrap();
    let before = trained.predict(&records).unwrap();

    let fresh = detector_in(&dir);
    assert!(fresh.load());
    assert_eq!(fresh.handle().unwrap().model_id, report.model_id);

    let after = fresh.predict(&records).unwrap();
    assert_eq!(before.labels, after.labels);
    for (a, b) in before.scores.iter().zip(&after.scores) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn test_predict_lazily_loads_from_disk() {
    let dir = tempdir().unwrap();
    let records = traffic(80);
    detector_in(&dir).train(&records).unwrap();

    let fresh = detector_in(&dir);
    assert!(!fresh.is_trained());
    let predictions = fresh.predict(&records).unwrap();
    assert_eq!(predictions.len(), records.len());
    assert!(fresh.is_trained());
}

#[test]
fn test_oversized_packet_scores_most_anomalous() {
    let dir = tempdir().unwrap();
    let detector = detector_in(&dir);
    let records: Vec<PacketRecord> = [500u64, 1500, 200]
        .iter()
        .map(|&len| PacketRecord::new("2024-05-01 10:00:00", "10.0.0.5", "10.0.0.1", 6, len))
        .collect();

    detector.train(&records).unwrap();
    let predictions = detector.predict(&records).unwrap();
    let scores = &predictions.scores;

    // higher = more normal
    assert!(scores[1] < scores[0], "scores {:?}", scores);
    assert!(scores[1] < scores[2], "scores {:?}", scores);
    assert_eq!(predictions.labels[1], Label::Anomaly);
}

#[test]
fn test_corrupt_artifact_keeps_untrained() {
    let dir = tempdir().unwrap();
    let detector = detector_in(&dir);
    detector.train(&traffic(40)).unwrap();
    fs::write(detector.config().model_path(), b"{ not json").unwrap();

    let fresh = detector_in(&dir);
    assert!(!fresh.load());
    assert!(matches!(fresh.try_load(), Err(PipelineError::CorruptArtifact { .. })));
    assert!(!fresh.is_trained());
    assert!(matches!(fresh.predict(&traffic(3)), Err(PipelineError::ModelNotReady)));
}

#[test]
fn test_mismatched_artifacts_rejected() {
    let dir_a = tempdir().unwrap();
    let dir_b = tempdir().unwrap();
    let a = detector_in(&dir_a);
    let b = detector_in(&dir_b);
    a.train(&traffic(30)).unwrap();
    b.train(&traffic(30)).unwrap();

    fs::copy(b.config().scaler_path(), a.config().scaler_path()).unwrap();

    let fresh = detector_in(&dir_a);
    let err = fresh.try_load().unwrap_err();
    assert!(err.to_string().contains("different training runs"));
}

#[test]
fn test_save_without_model_is_not_ready() {
    let dir = tempdir().unwrap();
    assert!(matches!(detector_in(&dir).save(), Err(PipelineError::ModelNotReady)));
}

#[test]
fn test_persistence_failure_keeps_previous_model() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocked");
    fs::write(&blocker, b"file, not a directory").unwrap();

    let config = MonitorConfig {
        model_dir: blocker.join("models"),
        dataset_path: dir.path().join("none.csv"),
        buffer_capacity: 10,
        contamination: 0.1,
    };
    let detector = AnomalyDetector::with_extractor(config, FeatureExtractor::seeded(1));

    let err = detector.train(&traffic(20)).unwrap_err();
    assert!(matches!(err, PipelineError::Persistence { .. }));
    assert!(!detector.is_trained());
}

#[test]
fn test_blocked_model_write_keeps_previous_pair() {
    let dir = tempdir().unwrap();
    let detector = detector_in(&dir);
    let first = detector.train(&traffic(60)).unwrap();

    fs::create_dir(detector.config().model_path().with_extension("json.tmp")).unwrap();
    let err = detector.train(&traffic(90)).unwrap_err();
    assert!(matches!(err, PipelineError::Persistence { .. }));
    assert_eq!(detector.handle().unwrap().model_id, first.model_id);
    assert!(!detector.config().scaler_path().with_extension("json.tmp").exists());

    let fresh = detector_in(&dir);
    assert!(fresh.load());
    assert_eq!(fresh.handle().unwrap().model_id, first.model_id);
}

#[test]
fn test_failed_model_commit_restores_scaler() {
    let dir = tempdir().unwrap();
    let detector = detector_in(&dir);
    let first = detector.train(&traffic(60)).unwrap();

    // model.json cannot be moved aside, so its commit fails after the scaler's
    let backup = detector.config().model_path().with_extension("json.bak");
    fs::create_dir(&backup).unwrap();
    fs::write(backup.join("occupied"), b"x").unwrap();

    assert!(detector.train(&traffic(90)).is_err());
    assert_eq!(detector.handle().unwrap().model_id, first.model_id);

    let fresh = detector_in(&dir);
    assert!(fresh.load(), "previous scaler/model pair should still load");
    assert_eq!(fresh.handle().unwrap().model_id, first.model_id);
    assert_eq!(fresh.handle().unwrap().trained_on, 60);
}

#[test]
fn test_ensure_ready_trains_from_dataset() {
    let dir = tempdir().unwrap();
    let detector = detector_in(&dir);
    let mut csv = String::from("No.,Time,Source,Destination,Proto,Length\n");
    for (i, r) in traffic(60).iter().enumerate() {
        csv.push_str(&format!("{},{},{},{},{},{}\n", i + 1, r.timestamp, r.source_ip, r.dest_ip, r.protocol, r.length));
    }
    fs::write(&detector.config().dataset_path, csv).unwrap();

    detector.ensure_ready().unwrap();
    assert!(detector.is_trained());
    assert_eq!(detector.status().trained_on, Some(60));

    // second call loads nothing new
    detector.ensure_ready().unwrap();
}

#[test]
fn test_ensure_ready_without_dataset() {
    let dir = tempdir().unwrap();
    let err = detector_in(&dir).ensure_ready().unwrap_err();
    assert!(err.is_empty_result());
}

#[test]
fn test_retrain_during_predictions() {
    let dir = tempdir().unwrap();
    let detector = Arc::new(detector_in(&dir));
    let records = traffic(120);
    detector.train(&records).unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let detector = Arc::clone(&detector);
            let records = records.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    let predictions = detector.predict(&records).unwrap();
                    assert_eq!(predictions.len(), records.len());
                    assert!(predictions.scores.iter().all(|s| s.is_finite()));
                }
            })
        })
        .collect();

    for _ in 0..3 {
        detector.train(&records).unwrap();
    }

    for reader in readers {
        reader.join().unwrap();
    }

    // disk matches memory after the last retrain
    let fresh = detector_in(&dir);
    assert!(fresh.load());
    assert_eq!(fresh.handle().unwrap().model_id, detector.handle().unwrap().model_id);
}
