//! Integration tests for the lodge registry backend.

use std::io::Cursor;
use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::bulk::parse_workbook;
use crate::cards::CardRenderer;
use crate::config::{AiConfig, Config};
use crate::db::{init_database, Repository};
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_ai(None).await
    }

    async fn with_ai(ai: Option<AiConfig>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        // Create config; the font directory is absent so cards use built-in fonts
        let config = Config {
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            lodge_name: "ΑΚΡΟΠΟΛΙΣ Υπ ΑΡΙΘΜ 84".to_string(),
            font_dir: temp_dir.path().join("fonts"),
            email: None,
            ai,
        };

        let state = AppState {
            repo,
            cards: Arc::new(CardRenderer::from_config(&config)),
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn create_member(&self, fields: Value) -> i64 {
        let resp = self
            .client
            .post(self.url("/api/members"))
            .json(&fields)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"]["member_id"].as_i64().unwrap()
    }

    async fn get_json(&self, path: &str) -> Value {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), 200, "GET {}", path);
        resp.json().await.unwrap()
    }
}

fn header_text(resp: &reqwest::Response, name: &str) -> String {
    resp.headers()
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_features_reflect_config() {
    let fixture = TestFixture::new().await;
    let body = fixture.get_json("/api/features").await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["core"], true);
    assert_eq!(body["data"]["tasks"], true);
    assert_eq!(body["data"]["email"], false);
    assert_eq!(body["data"]["ai"], false);

    let with_ai = TestFixture::with_ai(Some(AiConfig {
        api_key: "key".to_string(),
    }))
    .await;
    let body = with_ai.get_json("/api/features").await;
    assert_eq!(body["data"]["ai"], true);
}

#[tokio::test]
async fn test_member_crud() {
    let fixture = TestFixture::new().await;

    // Create member
    let member_id = fixture
        .create_member(json!({
            "last_name": "Ιωαννίδης",
            "first_name": "Πέτρος",
            "email": "p@example.org",
            "city": "Αθήνα"
        }))
        .await;

    // Get member
    let get_body = fixture
        .get_json(&format!("/api/members/{}", member_id))
        .await;
    assert_eq!(get_body["data"]["last_name"], "Ιωαννίδης");
    assert_eq!(get_body["data"]["member_status"], "Ενεργό");
    assert_eq!(get_body["data"]["current_degree"], "Μαθητής");

    // Partial update: set one field, clear another, leave the rest
    let update_resp = fixture
        .client
        .put(fixture.url(&format!("/api/members/{}", member_id)))
        .json(&json!({ "city": "Πάτρα", "email": null }))
        .send()
        .await
        .unwrap();

    assert_eq!(update_resp.status(), 200);
    let update_body: Value = update_resp.json().await.unwrap();
    assert_eq!(update_body["data"]["city"], "Πάτρα");
    assert_eq!(update_body["data"]["email"], Value::Null);
    assert_eq!(update_body["data"]["first_name"], "Πέτρος");

    // List and search
    fixture
        .create_member(json!({ "last_name": "Άλλος", "member_status": "Ανενεργό" }))
        .await;
    let list_body = fixture.get_json("/api/members").await;
    assert_eq!(list_body["data"].as_array().unwrap().len(), 2);

    let search_body = fixture.get_json("/api/members?q=Ιωαν").await;
    let found = search_body["data"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["member_id"], member_id);
}

#[tokio::test]
async fn test_validation_errors() {
    let fixture = TestFixture::new().await;
    let member_id = fixture.create_member(json!({ "last_name": "Κ" })).await;

    // Value outside the rank vocabulary
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/members/{}", member_id)))
        .json(&json!({ "current_degree": "Grand Master" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Empty change set
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/members/{}", member_id)))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Unknown column never reaches the database
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/members/{}", member_id)))
        .json(&json!({ "last_name = 'x'; --": "y" }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn test_not_found_errors() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/members/4242"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let resp = fixture
        .client
        .put(fixture.url("/api/members/4242"))
        .json(&json!({ "city": "Λαμία" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .get(fixture.url("/api/members/4242/card"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_statistics_merge_rank_labels() {
    let fixture = TestFixture::new().await;
    fixture
        .create_member(json!({ "current_degree": "Δάσκαλος" }))
        .await;
    fixture
        .create_member(json!({ "current_degree": "Διδάσκαλος", "member_status": "Διαγραφέν" }))
        .await;
    fixture.create_member(json!({})).await;

    let body = fixture.get_json("/api/members/statistics").await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["active"], 2);
    assert_eq!(body["data"]["byRank"]["Διδάσκαλος"], 2);
    assert_eq!(body["data"]["byRank"]["Μαθητής"], 1);
    assert_eq!(body["data"]["byStatus"]["Διαγραφέν"], 1);
}

#[tokio::test]
async fn test_card_download() {
    let fixture = TestFixture::new().await;
    let member_id = fixture
        .create_member(json!({
            "last_name": "Μαυρίδης",
            "first_name": "Άγγελος",
            "current_degree": "Δάσκαλος",
            "lodge_reg_no": "77"
        }))
        .await;

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/members/{}/card", member_id)))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(header_text(&resp, "content-type"), "application/pdf");
    let disposition = header_text(&resp, "content-disposition");
    assert!(disposition.contains("Kartela_Μαυρίδης_Άγγελος.pdf"));
    assert!(disposition.contains("filename*=UTF-8''Kartela_%CE%9C"));
    let bytes = resp.bytes().await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_card_archive_for_filter() {
    let fixture = TestFixture::new().await;
    for (last, status) in [
        ("Α", "Ενεργό"),
        ("Β", "Ενεργό"),
        ("Γ", "Ανενεργό"),
        ("Δ", "Ενεργό"),
    ] {
        fixture
            .create_member(json!({ "last_name": last, "first_name": "Χ", "member_status": status }))
            .await;
    }

    let resp = fixture
        .client
        .get(fixture.url("/api/cards/archive"))
        .query(&[("status", "Ενεργό")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(header_text(&resp, "content-type"), "application/zip");
    assert!(header_text(&resp, "content-disposition").contains("Karteles_Melon_"));
    assert_eq!(header_text(&resp, "x-cards-rendered"), "3");

    let bytes = resp.bytes().await.unwrap();
    let archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    assert_eq!(archive.len(), 3);
}

#[tokio::test]
async fn test_export_edit_import_roundtrip() {
    let fixture = TestFixture::new().await;
    let first = fixture
        .create_member(json!({ "last_name": "Ζερβός", "email": "z@example.org" }))
        .await;
    let second = fixture
        .create_member(json!({ "last_name": "Θεοδώρου", "city": "Κοζάνη" }))
        .await;

    // Export
    let resp = fixture
        .client
        .get(fixture.url("/api/members/export"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(header_text(&resp, "content-disposition").contains("Mitroo_Melon_"));
    let exported = resp.bytes().await.unwrap().to_vec();
    assert_eq!(parse_workbook(&exported).unwrap().len(), 2);

    // Re-import unchanged
    let resp = fixture
        .client
        .post(fixture.url("/api/members/import"))
        .body(exported)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["attempted"], 2);
    assert_eq!(body["data"]["updated"], 2);

    let member = fixture.get_json(&format!("/api/members/{}", first)).await;
    assert_eq!(member["data"]["email"], "z@example.org");
    let member = fixture.get_json(&format!("/api/members/{}", second)).await;
    assert_eq!(member["data"]["city"], "Κοζάνη");
}

#[tokio::test]
async fn test_malformed_import_is_rejected() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/members/import"))
        .body("Α/Α;Επώνυμο\n1;Χ\n")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "MALFORMED_INPUT");
}

#[tokio::test]
async fn test_bulk_change_and_inline_edits() {
    let fixture = TestFixture::new().await;
    let a = fixture.create_member(json!({ "last_name": "Α" })).await;
    let b = fixture.create_member(json!({ "last_name": "Β" })).await;
    fixture
        .create_member(json!({ "last_name": "Γ", "member_status": "Ανενεργό" }))
        .await;

    // Promote every active apprentice
    let resp = fixture
        .client
        .post(fixture.url("/api/members/bulk-change"))
        .json(&json!({
            "status": "Ενεργό",
            "rank": "Μαθητής",
            "field": "rank",
            "value": "Εταίρος"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["matched"], 2);
    assert_eq!(body["data"]["updated"], 2);

    let stats = fixture.get_json("/api/members/statistics").await;
    assert_eq!(stats["data"]["byRank"]["Εταίρος"], 2);
    assert_eq!(stats["data"]["byRank"]["Μαθητής"], 1);

    // Inline edits: one valid, one missing member
    let resp = fixture
        .client
        .put(fixture.url("/api/members/batch"))
        .json(&json!([
            { "memberId": a, "changes": { "mobile_phone": "6900000000" } },
            { "memberId": 9_999, "changes": { "mobile_phone": "6911111111" } },
            { "memberId": b, "changes": { "email": null } }
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["attempted"], 3);
    assert_eq!(body["data"]["updated"], 2);
    assert_eq!(body["data"]["failures"][0]["row"], 2);
    assert_eq!(body["data"]["failures"][0]["memberId"], 9_999);
}

#[tokio::test]
async fn test_task_lifecycle() {
    let fixture = TestFixture::new().await;
    let today = chrono::Local::now().date_naive();
    let soon = today + chrono::Duration::days(3);
    let past = today - chrono::Duration::days(3);

    let mut ids = Vec::new();
    for (title, due) in [("Ανανέωση μισθωτηρίου", soon), ("Συνδρομές", past)] {
        let resp = fixture
            .client
            .post(fixture.url("/api/tasks"))
            .json(&json!({
                "title": title,
                "dueDate": due.format("%Y-%m-%d").to_string(),
                "priority": "Υψηλή",
                "relatedTo": "Ταμείο"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"]["status"], "Εκκρεμής");
        assert_eq!(body["data"]["category"], "Γενικά");
        ids.push(body["data"]["taskId"].as_i64().unwrap());
    }

    let upcoming = fixture.get_json("/api/tasks/upcoming?days=7").await;
    assert_eq!(upcoming["data"].as_array().unwrap().len(), 1);
    assert_eq!(upcoming["data"][0]["taskId"], ids[0]);

    let overdue = fixture.get_json("/api/tasks/overdue").await;
    assert_eq!(overdue["data"].as_array().unwrap().len(), 1);
    assert_eq!(overdue["data"][0]["taskId"], ids[1]);

    let resp = fixture
        .client
        .get(fixture.url("/api/tasks/upcoming?days=100000000"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Complete the overdue task
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/tasks/{}/status", ids[1])))
        .json(&json!({ "status": "Ολοκληρωμένη" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["completedAt"].is_string());

    let overdue = fixture.get_json("/api/tasks/overdue").await;
    assert!(overdue["data"].as_array().unwrap().is_empty());

    // Delete
    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/tasks/{}", ids[0])))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let all = fixture.get_json("/api/tasks").await;
    assert_eq!(all["data"].as_array().unwrap().len(), 1);

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/tasks/{}", ids[0])))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
