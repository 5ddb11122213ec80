use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tokio::time::sleep;

const PINNED_DATE: &str = "2024-01-15";

#[derive(Debug, Deserialize)]
struct CycleResponse {
    current_day: u32,
    cycle_length: u32,
    phase: String,
    days_until_next: u32,
    next_period_date: String,
    last_period_date: String,
    progress_percent: u32,
    phase_info: PhaseInfo,
}

#[derive(Debug, Deserialize)]
struct PhaseInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreateProfileResponse {
    link_code: String,
}

#[derive(Debug, Deserialize)]
struct PartnerNotification {
    phase: String,
    urgency: String,
    cycle_day: u32,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    onboarded: bool,
    partner_linked: bool,
}

#[derive(Debug, Deserialize)]
struct PhaseMessage {
    phase: String,
    message: String,
}

struct TestServer {
    base_url: String,
    data_path: PathBuf,
    child: Child,
    client: Client,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_file(&self.data_path);
    }
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn onboard(&self, last_period_date: &str, cycle_length: u32) -> CreateProfileResponse {
        let response = self
            .client
            .post(self.url("/api/profile"))
            .json(&serde_json::json!({
                "name": "Sam",
                "cycle_length": cycle_length,
                "last_period_date": last_period_date,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.unwrap()
    }

    async fn cycle(&self) -> CycleResponse {
        self.client
            .get(self.url("/api/cycle"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("moodsync_http_{}_{}.json", std::process::id(), nanos));
    path
}

async fn wait_until_ready(client: &Client, base_url: &str) {
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/status")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_moodsync"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", &data_path)
        .env("APP_FIXED_DATE", PINNED_DATE)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    let client = Client::new();
    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&client, &base_url).await;

    TestServer {
        base_url,
        data_path,
        child,
        client,
    }
}

#[tokio::test]
async fn http_cycle_snapshot_for_pinned_date() {
    let server = spawn_server().await;

    let missing = server.client.get(server.url("/api/cycle")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    server.onboard("2024-01-01", 28).await;
    let cycle = server.cycle().await;

    assert_eq!(cycle.current_day, 14);
    assert_eq!(cycle.cycle_length, 28);
    assert_eq!(cycle.phase, "ovulation");
    assert_eq!(cycle.phase_info.name, "Ovulation");
    assert_eq!(cycle.next_period_date, "2024-01-29");
    assert_eq!(cycle.last_period_date, "2024-01-01");
    assert_eq!(cycle.days_until_next, 14);
    assert_eq!(cycle.progress_percent, 50);

    let again = server.cycle().await;
    assert_eq!(again.current_day, cycle.current_day);
    assert_eq!(again.phase, cycle.phase);
}

#[tokio::test]
async fn http_rejects_invalid_profiles() {
    let server = spawn_server().await;

    for body in [
        serde_json::json!({ "name": "Sam", "cycle_length": 0, "last_period_date": "2024-01-01" }),
        serde_json::json!({ "name": "Sam", "cycle_length": 28, "last_period_date": "yesterday" }),
        serde_json::json!({ "name": "  ", "last_period_date": "2024-01-01" }),
        serde_json::json!({ "name": "Sam", "last_period_date": "2024-02-01" }),
    ] {
        let response = server
            .client
            .post(server.url("/api/profile"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }

    let status: StatusResponse = server
        .client
        .get(server.url("/api/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!status.onboarded);
}

#[tokio::test]
async fn http_logging_a_period_moves_the_cycle() {
    let server = spawn_server().await;
    server.onboard("2023-12-20", 30).await;

    let response = server
        .client
        .post(server.url("/api/periods"))
        .json(&serde_json::json!({ "start_date": "2024-01-13", "notes": "light" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let cycle = server.cycle().await;
    assert_eq!(cycle.last_period_date, "2024-01-13");
    assert_eq!(cycle.cycle_length, 30);
    assert_eq!(cycle.current_day, 2);
    assert_eq!(cycle.phase, "menstrual");
    assert_eq!(cycle.next_period_date, "2024-02-12");

    let periods: Vec<serde_json::Value> = server
        .client
        .get(server.url("/api/periods"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(periods.len(), 1);
    assert_eq!(periods[0]["notes"], "light");
}

#[tokio::test]
async fn http_partner_linking_and_notification() {
    let server = spawn_server().await;
    let created = server.onboard("2023-12-21", 28).await;

    let wrong = server
        .client
        .post(server.url("/api/partner"))
        .json(&serde_json::json!({ "name": "Alex", "link_code": "ZZZZZZ" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);

    let linked = server
        .client
        .post(server.url("/api/partner"))
        .json(&serde_json::json!({
            "name": "Alex",
            "link_code": created.link_code.to_lowercase(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(linked.status(), StatusCode::CREATED);

    let status: StatusResponse = server
        .client
        .get(server.url("/api/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(status.onboarded);
    assert!(status.partner_linked);

    // 2023-12-21 + 25 days puts the pinned date on day 25 with 3 days left.
    let notification: PartnerNotification = server
        .client
        .get(server.url("/api/partner/notification"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(notification.phase, "late_luteal");
    assert_eq!(notification.cycle_day, 25);
    assert_eq!(notification.urgency, "high");
}

#[tokio::test]
async fn http_messages_rotate_without_repeats() {
    let server = spawn_server().await;
    server.onboard("2024-01-01", 28).await;

    let mut seen = Vec::new();
    for _ in 0..4 {
        let message: PhaseMessage = server
            .client
            .get(server.url("/api/messages/next"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(message.phase, "ovulation");
        assert!(!seen.contains(&message.message));
        seen.push(message.message);
    }

    let reset = server
        .client
        .delete(server.url("/api/messages/rotation"))
        .send()
        .await
        .unwrap();
    assert_eq!(reset.status(), StatusCode::NO_CONTENT);

    let first_again: PhaseMessage = server
        .client
        .get(server.url("/api/messages/next"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first_again.message, seen[0]);
}

#[tokio::test]
async fn http_clear_data_resets_everything() {
    let server = spawn_server().await;
    server.onboard("2024-01-01", 28).await;

    let cleared = server.client.delete(server.url("/api/data")).send().await.unwrap();
    assert_eq!(cleared.status(), StatusCode::NO_CONTENT);

    let profile = server.client.get(server.url("/api/profile")).send().await.unwrap();
    assert_eq!(profile.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_profile_patch_is_all_or_nothing() {
    let server = spawn_server().await;
    server.onboard("2024-01-01", 28).await;

    let rejected = server
        .client
        .patch(server.url("/api/profile"))
        .json(&serde_json::json!({ "name": "Renamed", "cycle_length": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let profile: serde_json::Value = server
        .client
        .get(server.url("/api/profile"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["name"], "Sam");
    assert_eq!(profile["cycle_length"], 28);

    let updated = server
        .client
        .patch(server.url("/api/profile"))
        .json(&serde_json::json!({ "cycle_length": 35 }))
        .send()
        .await
        .unwrap();
    assert!(updated.status().is_success());

    // Day 14 of 35 is still follicular once the boundary moves to day 16.
    let cycle = server.cycle().await;
    assert_eq!(cycle.cycle_length, 35);
    assert_eq!(cycle.current_day, 14);
    assert_eq!(cycle.phase, "follicular");
    assert_eq!(cycle.next_period_date, "2024-02-05");
}

#[tokio::test]
async fn http_settings_roundtrip_and_validation() {
    let server = spawn_server().await;

    let defaults: serde_json::Value = server
        .client
        .get(server.url("/api/settings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(defaults["notifications"], true);
    assert_eq!(defaults["theme"], "dark");

    let saved = server
        .client
        .put(server.url("/api/settings"))
        .json(&serde_json::json!({ "notifications": false, "partner_view": true, "theme": "light" }))
        .send()
        .await
        .unwrap();
    assert!(saved.status().is_success());

    let current: serde_json::Value = server
        .client
        .get(server.url("/api/settings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["notifications"], false);
    assert_eq!(current["theme"], "light");

    let bad_theme = server
        .client
        .put(server.url("/api/settings"))
        .json(&serde_json::json!({ "theme": "sepia" }))
        .send()
        .await
        .unwrap();
    assert!(bad_theme.status().is_client_error());
}

#[tokio::test]
async fn http_moods_are_journaled() {
    let server = spawn_server().await;

    let blank = server
        .client
        .post(server.url("/api/moods"))
        .json(&serde_json::json!({ "mood": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let logged = server
        .client
        .post(server.url("/api/moods"))
        .json(&serde_json::json!({ "mood": "calm", "notes": " slept well " }))
        .send()
        .await
        .unwrap();
    assert_eq!(logged.status(), StatusCode::CREATED);

    let moods: Vec<serde_json::Value> = server
        .client
        .get(server.url("/api/moods"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(moods.len(), 1);
    assert_eq!(moods[0]["mood"], "calm");
    assert_eq!(moods[0]["notes"], "slept well");
    assert_eq!(moods[0]["date"], "2024-01-15T00:00:00");
}

#[tokio::test]
async fn http_link_code_is_stable() {
    let server = spawn_server().await;

    let first: serde_json::Value = server
        .client
        .get(server.url("/api/link-code"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let code = first["link_code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);

    let second: serde_json::Value = server
        .client
        .get(server.url("/api/link-code"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["link_code"], code.as_str());

    let created = server.onboard("2024-01-01", 28).await;
    assert_eq!(created.link_code, code);
}

#[tokio::test]
async fn http_notify_dispatches_partner_notification() {
    let server = spawn_server().await;

    let missing = server.client.post(server.url("/api/notify")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    server.onboard("2024-01-01", 28).await;
    let sent: serde_json::Value = server
        .client
        .post(server.url("/api/notify"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(sent["title"], "MoodSync · Ovulation");
    assert_eq!(sent["urgency"], "positive");
    assert!(!sent["body"].as_str().unwrap().is_empty());
}
