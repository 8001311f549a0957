use pulsemap_geo::GeoResolver;
use pulsemap_server::{app, AppState};
use pulsemap_tracker::{OriginTracker, TrackerConfig};
use std::time::Duration;
use tokio::net::TcpListener;

async fn spawn_server() -> (String, AppState) {
    let geo = GeoResolver::new();
    let resolver = geo.clone();
    let tracker = OriginTracker::new(
        TrackerConfig {
            cooldown: Duration::from_secs(60),
            observer_queue: 64,
        },
        move |origin: &str| resolver.resolve(origin),
    );

    let state = AppState {
        tracker,
        geo,
        static_dir: String::new(),
    };

    let app = app(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), state)
}

#[tokio::test]
async fn test_sse_event_stream() {
    let (url, state) = spawn_server().await;

    // 1. Seed an observation so hydration carries state
    state.tracker.observe("203.0.113.9");

    // 2. Connect to the SSE stream
    let client = reqwest::Client::new();
    let mut response = client
        .get(format!("{}/events/stream", url))
        .send()
        .await
        .expect("failed to connect to SSE stream");

    assert!(response.status().is_success());

    // 3. First chunk is the hydration snapshot
    // We expect "data: {...}\n\n"
    let chunk = response
        .chunk()
        .await
        .expect("failed to read chunk")
        .expect("stream closed");
    let chunk_str = String::from_utf8(chunk.to_vec()).unwrap();

    assert!(chunk_str.starts_with("data:"));
    assert!(chunk_str.contains("HYDRATE"));
    assert!(chunk_str.contains("203.0.113.9"));

    // 4. Trigger a live event and read it off the stream
    state.tracker.observe("198.51.100.7");

    let mut live = String::new();
    while !live.contains("CREATED") {
        let chunk = tokio::time::timeout(Duration::from_secs(2), response.chunk())
            .await
            .expect("timed out waiting for live event")
            .expect("failed to read chunk")
            .expect("stream closed");
        live.push_str(&String::from_utf8(chunk.to_vec()).unwrap());
    }

    assert!(live.contains("TOTAL_CHANGED"));
    assert!(live.contains("198.51.100.7"));
}

#[tokio::test]
async fn test_sse_disconnect_prunes_observer() {
    let (url, state) = spawn_server().await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/events/stream", url))
        .send()
        .await
        .expect("failed to connect to SSE stream");
    assert!(response.status().is_success());

    // Wait for the observer to register
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while state.tracker.observer_count() != 1 {
        assert!(tokio::time::Instant::now() < deadline, "observer never attached");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // Dropping the response closes the connection; the tracker prunes the
    // observer on publish once the queue is gone.
    drop(response);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        state.tracker.observe("203.0.113.9");
        if state.tracker.observer_count() == 0 {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "disconnected observer was never pruned"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
