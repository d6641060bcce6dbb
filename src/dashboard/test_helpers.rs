//! Shared test helpers for creating Dashboard instances in tests.

use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::types::Event;
use std::time::Duration;
use wiremock::MockServer;

/// Config pointing at `base_url` with the background monitor disabled
pub(crate) fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.backend.base_url = base_url.to_string();
    config.backend.timeout = Duration::from_secs(5);
    config.monitor.enabled = false;
    config
}

/// Dashboard talking to a wiremock backend
pub(crate) fn create_test_dashboard(server: &MockServer) -> Dashboard {
    Dashboard::new(test_config(&server.uri())).unwrap()
}

/// Dashboard whose backend refuses connections
pub(crate) fn create_offline_dashboard() -> Dashboard {
    Dashboard::new(test_config("http://127.0.0.1:9")).unwrap()
}

/// Receive events until one matches `predicate`, failing after two seconds
pub(crate) async fn wait_for_event<F>(
    events: &mut tokio::sync::broadcast::Receiver<Event>,
    predicate: F,
) -> Event
where
    F: Fn(&Event) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let event = events.recv().await.unwrap();
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// NDJSON body for a batch of `results` successes and `failures` errors
pub(crate) fn batch_body(batch_id: &str, results: usize, failures: usize) -> String {
    let total = results + failures;
    let mut body = format!(
        "{{\"type\":\"batch_start\",\"batch_id\":\"{batch_id}\",\"total_files\":{total}}}\n"
    );
    for i in 0..results {
        body.push_str(&format!(
            "{{\"type\":\"result\",\"data\":{{\"file_id\":\"{batch_id}-f{i}\",\"original_filename\":\"rec_{i}.wav\",\"species_detected\":[{{\"species\":\"Myotis daubentonii\",\"confidence\":0.8}}]}}}}\n"
        ));
    }
    for i in 0..failures {
        body.push_str(&format!(
            "{{\"type\":\"error\",\"filename\":\"bad_{i}.wav\",\"error\":\"unreadable\"}}\n"
        ));
    }
    body.push_str(&format!(
        "{{\"type\":\"batch_complete\",\"completed\":{total},\"failed\":{failures}}}\n"
    ));
    body
}
