#![cfg(feature = "live-tests")]
//! End-to-end tests against a running classification backend
//!
//! The backend URL comes from `.env`. Tests skip themselves when it is
//! missing.
//!
//! # Running the tests
//!
//! ```bash
//! cargo test --features live-tests --test e2e_live -- --nocapture
//! ```
//!
//! # Environment variables (.env file)
//!
//! - `BATSCOPE_BACKEND_URL` - Backend base URL (e.g., http://localhost:8000)
//! - `BATSCOPE_SAMPLE_WAV` - Recording for the upload tests (optional)

mod common;

use batscope::{AnalysisParams, BatchOutcome, BatchPhase, Event, ExportFormat, UploadFile};
use common::{create_live_dashboard, has_live_backend, sample_wav};
use std::time::Duration;

#[tokio::test]
async fn test_backend_health_and_statistics() {
    if !has_live_backend() {
        eprintln!("Skipping: BATSCOPE_BACKEND_URL not found in .env");
        return;
    }
    let dashboard = create_live_dashboard().unwrap();

    let view = dashboard.refresh_all().await;

    assert!(view.is_online, "backend should answer the health check");
    assert!(view.statistics.is_some());
    println!(
        "Backend has {} stored results, services: {:?}",
        view.results.len(),
        view.health.map(|h| h.services)
    );
}

#[tokio::test]
async fn test_batch_of_one_recording() {
    if !has_live_backend() {
        eprintln!("Skipping: BATSCOPE_BACKEND_URL not found in .env");
        return;
    }
    let Some(wav) = sample_wav() else {
        eprintln!("Skipping: BATSCOPE_SAMPLE_WAV not set");
        return;
    };
    let dashboard = create_live_dashboard().unwrap();
    let mut events = dashboard.subscribe();

    let upload = UploadFile::from_path(&wav).await.unwrap();
    let outcome = tokio::time::timeout(
        Duration::from_secs(300),
        dashboard.submit_batch(vec![upload], &AnalysisParams::default()),
    )
    .await
    .expect("batch should finish within five minutes")
    .unwrap();

    assert!(matches!(
        outcome,
        BatchOutcome::Completed { completed: 1, .. } | BatchOutcome::EndedWithoutSummary
    ));

    let snapshot = dashboard.batch_snapshot().await;
    assert_eq!(snapshot.phase, BatchPhase::Completed);
    assert_eq!(snapshot.progress.total, 1);
    for line in &snapshot.logs {
        println!("{line}");
    }

    let mut saw_start = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, Event::BatchStarted { .. }) {
            saw_start = true;
        }
    }
    assert!(saw_start, "batch_start should be announced");
}

#[tokio::test]
async fn test_csv_export() {
    if !has_live_backend() {
        eprintln!("Skipping: BATSCOPE_BACKEND_URL not found in .env");
        return;
    }
    let dashboard = create_live_dashboard().unwrap();

    let download = dashboard
        .client()
        .export_all(ExportFormat::Csv)
        .await
        .unwrap();

    assert!(download.filename.ends_with(".csv"));
    println!("Exported {} bytes as {}", download.bytes.len(), download.filename);
}
