//! Integration tests for the school backend.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::db::{init_database, new_id, SqliteStore};
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let store = Arc::new(SqliteStore::new(pool, Duration::from_secs(5)));

        let state = AppState::new(store);
        state
            .repo
            .ensure_indexes()
            .await
            .expect("Failed to create indexes");

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

    async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    async fn post_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    async fn put_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .put(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    /// Create a student and return its id.
    async fn student(&self, body: Value) -> String {
        let (status, body) = self.post_json("/api/students", body).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"]["_id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_root_and_health() {
    let fixture = TestFixture::new().await;

    let resp = fixture.client.get(fixture.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "School Server is running!");

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
async fn test_student_crud() {
    let fixture = TestFixture::new().await;

    let id = fixture
        .student(json!({
            "name": "Rahim Uddin",
            "roll": 12,
            "className": "9",
            "section": "A",
            "village": "Shantipur"
        }))
        .await;

    // Get student
    let (status, body) = fixture.get_json(&format!("/api/students/{}", id)).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["roll"], "12");
    assert!(body["data"]["createdAt"].is_string());

    // Update merges into the stored record
    let (status, body) = fixture
        .put_json(
            &format!("/api/students/{}", id),
            json!({"section": "B", "_id": new_id()}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["_id"], id.as_str());
    assert_eq!(body["data"]["section"], "B");
    assert_eq!(body["data"]["village"], "Shantipur");
    assert!(body["data"]["updatedAt"].is_string());

    // Delete student
    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/students/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (status, body) = fixture.get_json(&format!("/api/students/{}", id)).await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_duplicate_student_rejected() {
    let fixture = TestFixture::new().await;

    fixture
        .student(json!({"name": "A", "roll": "12", "className": "9"}))
        .await;

    let (status, body) = fixture
        .post_json(
            "/api/students",
            json!({"name": "B", "roll": "12", "className": "9"}),
        )
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "DUPLICATE");
    assert_eq!(
        body["error"]["details"]["key"],
        json!({"roll": "12", "className": "9"})
    );

    // Same roll in another class is a different student
    fixture
        .student(json!({"name": "C", "roll": "12", "className": "10"}))
        .await;

    let (_, body) = fixture.get_json("/api/students?roll=12&className=9").await;
    assert_eq!(body["data"]["total"], 1);

    // A numeric class is the same class
    let (status, body) = fixture
        .post_json(
            "/api/students",
            json!({"name": "D", "roll": "12", "className": 9}),
        )
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "DUPLICATE");

    let id = fixture
        .student(json!({"name": "E", "roll": "13", "className": 9}))
        .await;
    let (_, body) = fixture.get_json(&format!("/api/students/{}", id)).await;
    assert_eq!(body["data"]["className"], "9");
    let (_, body) = fixture.get_json("/api/students?class=9").await;
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn test_roll_change_conflict() {
    let fixture = TestFixture::new().await;

    let id = fixture
        .student(json!({"name": "A", "roll": "12", "className": "9"}))
        .await;
    fixture
        .student(json!({"name": "B", "roll": "13", "className": "9"}))
        .await;

    let (status, body) = fixture
        .put_json(&format!("/api/students/{}", id), json!({"roll": "13"}))
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "DUPLICATE");

    let (_, body) = fixture.get_json(&format!("/api/students/{}", id)).await;
    assert_eq!(body["data"]["roll"], "12");
    assert_eq!(body["data"]["name"], "A");

    let (status, body) = fixture
        .put_json(&format!("/api/students/{}", id), json!({"className": null}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let (_, body) = fixture.get_json(&format!("/api/students/{}", id)).await;
    assert_eq!(body["data"]["className"], "9");
}

#[tokio::test]
async fn test_pagination_totals_and_sort() {
    let fixture = TestFixture::new().await;

    for (class, roll) in [
        ("9", 3),
        ("10", 1),
        ("9", 1),
        ("8", 2),
        ("10", 2),
        ("9", 2),
        ("8", 1),
        ("10", 3),
        ("9", 4),
        ("8", 3),
        ("10", 4),
        ("9", 5),
    ] {
        fixture
            .student(json!({"roll": roll, "className": class, "status": "active"}))
            .await;
    }

    let mut rows = Vec::new();
    for page in 1..=3 {
        let (status, body) = fixture
            .get_json(&format!("/api/students?page={}&limit=5", page))
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["total"], 12);
        assert_eq!(body["data"]["pages"], 3);
        assert_eq!(body["data"]["page"], page);
        for item in body["data"]["items"].as_array().unwrap() {
            rows.push((
                item["className"].as_str().unwrap().to_string(),
                item["roll"].as_str().unwrap().to_string(),
            ));
        }
    }
    assert_eq!(rows.len(), 12);

    // Default sort: className then roll, both ascending
    for pair in rows.windows(2) {
        assert!(pair[0] <= pair[1], "{:?} out of order", pair);
    }

    // Beyond the last page is empty, not an error
    let (status, body) = fixture.get_json("/api/students?page=4&limit=5").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["items"], json!([]));
    assert_eq!(body["data"]["total"], 12);

    // Explicit descending sort
    let (_, body) = fixture
        .get_json("/api/students?className=9&sort=-roll&limit=2")
        .await;
    let rolls: Vec<&str> = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["roll"].as_str().unwrap())
        .collect();
    assert_eq!(rolls, vec!["5", "4"]);
    assert_eq!(body["data"]["total"], 5);
}

#[tokio::test]
async fn test_invalid_paging_rejected() {
    let fixture = TestFixture::new().await;

    for query in ["page=0", "limit=0", "limit=-1", "page=abc"] {
        let (status, body) = fixture
            .get_json(&format!("/api/students?{}", query))
            .await;
        assert_eq!(status, 400, "{}", query);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let fixture = TestFixture::new().await;

    fixture
        .student(json!({"name": "Rahim", "roll": 1, "className": "9", "district": "Dhaka"}))
        .await;
    fixture
        .student(json!({"name": "Karim", "roll": 2, "className": "9", "district": "Khulna"}))
        .await;
    fixture
        .student(json!({"name": "Sumon", "roll": 3, "className": "10", "fatherName": "Abdul Rahman"}))
        .await;

    let (_, body) = fixture.get_json("/api/students?search=RAH").await;
    assert_eq!(body["data"]["total"], 2);

    let (_, body) = fixture
        .get_json("/api/students?search=rah&className=9")
        .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["name"], "Rahim");

    // Blank criteria add no constraint
    let (_, body) = fixture.get_json("/api/students?className=&search=").await;
    assert_eq!(body["data"]["total"], 3);

    fixture
        .student(json!({"name": "Émile Ölander", "roll": 4, "className": "10"}))
        .await;
    for term in ["émile", "ÖLANDER", "mile öl"] {
        let (_, body) = fixture
            .get_json(&format!("/api/students?search={}", term))
            .await;
        assert_eq!(body["data"]["total"], 1, "{}", term);
        assert_eq!(body["data"]["items"][0]["name"], "Émile Ölander");
    }
}

#[tokio::test]
async fn test_migrate_all_or_nothing() {
    let fixture = TestFixture::new().await;

    let mut ids = Vec::new();
    for roll in 1..=4 {
        ids.push(
            fixture
                .student(json!({"roll": roll, "className": "9", "academicYear": "2024"}))
                .await,
        );
    }
    let ghost = new_id();
    let mut requested = ids.clone();
    requested.push(ghost.clone());

    let (status, body) = fixture
        .post_json(
            "/api/students/migrate",
            json!({"studentIds": requested, "className": "10", "academicYear": 2025}),
        )
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["details"]["missingIds"], json!([ghost]));

    let (_, body) = fixture.get_json("/api/students?className=10").await;
    assert_eq!(body["data"]["total"], 0);

    // Missing target is invalid input
    let (status, _) = fixture
        .post_json(
            "/api/students/migrate",
            json!({"studentIds": ids, "className": "10"}),
        )
        .await;
    assert_eq!(status, 400);

    let (status, body) = fixture
        .post_json(
            "/api/students/migrate",
            json!({"studentIds": ids, "className": "10", "academicYear": 2025}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["modified"], 4);
    assert_eq!(body["data"]["academicYear"], "2025");

    let (_, body) = fixture.get_json(&format!("/api/students/{}", ids[0])).await;
    assert_eq!(body["data"]["className"], "10");
    assert_eq!(body["data"]["academicYear"], "2025");
}

#[tokio::test]
async fn test_malformed_id_rejected() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/staff/not-a-uuid").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_staff_roles_and_reports() {
    let fixture = TestFixture::new().await;

    for (index, subject, designation, gender) in [
        (101, "Math", "Assistant Teacher", "Male"),
        (102, "Math", "Assistant Teacher", "Female"),
        (103, "Math", "Head Teacher", "Male"),
        (201, "N/A", "Office Assistant", "Male"),
        (202, "N/A", "Night Guard", "Female"),
    ] {
        let (status, _) = fixture
            .post_json(
                "/api/staff",
                json!({
                    "name": format!("Staff {}", index),
                    "indexNumber": index,
                    "subject": subject,
                    "designation": designation,
                    "gender": gender
                }),
            )
            .await;
        assert_eq!(status, 201);
    }

    // Index numbers are unique
    let (status, _) = fixture
        .post_json("/api/staff", json!({"indexNumber": "101", "subject": "English"}))
        .await;
    assert_eq!(status, 409);

    let (_, body) = fixture.get_json("/api/teachers").await;
    assert_eq!(body["data"]["total"], 3);
    let (_, body) = fixture.get_json("/api/support-staff").await;
    assert_eq!(body["data"]["total"], 2);
    let (_, body) = fixture.get_json("/api/teachers?gender=Female").await;
    assert_eq!(body["data"]["total"], 1);

    let (status, body) = fixture.get_json("/api/reports/teachers/subjects").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"], json!([{"subject": "Math", "count": 3}]));

    let (_, body) = fixture.get_json("/api/reports/teachers/designations").await;
    assert_eq!(
        body["data"],
        json!([
            {"designation": "Assistant Teacher", "count": 2},
            {"designation": "Head Teacher", "count": 1}
        ])
    );

    let (_, body) = fixture.get_json("/api/reports/overview").await;
    assert_eq!(
        body["data"]["teachers"],
        json!({"total": 3, "male": 2, "female": 1})
    );
    assert_eq!(body["data"]["supportStaff"]["total"], 2);
}

#[tokio::test]
async fn test_student_reports() {
    let fixture = TestFixture::new().await;

    for (roll, class, section, religion, gender, status) in [
        (1, "9", "A", "Islam", "Male", "active"),
        (2, "9", "A", "Hinduism", "Female", "active"),
        (3, "9", "B", "Islam", "Female", "active"),
        (1, "10", "A", "Islam", "Male", "active"),
        (2, "10", "A", "Islam", "Male", "inactive"),
    ] {
        fixture
            .student(json!({
                "roll": roll,
                "className": class,
                "section": section,
                "religion": religion,
                "gender": gender,
                "status": status
            }))
            .await;
    }

    let (_, body) = fixture.get_json("/api/reports/students/classes").await;
    assert_eq!(
        body["data"],
        json!([
            {"className": "10", "total": 1, "male": 1, "female": 0},
            {"className": "9", "total": 3, "male": 1, "female": 2}
        ])
    );

    let (_, body) = fixture
        .get_json("/api/reports/students/class-religion")
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"][1]["className"], "9");
    assert_eq!(body["data"][1]["religion"], "Hinduism");

    let (_, body) = fixture.get_json("/api/reports/students/genders").await;
    assert_eq!(
        body["data"],
        json!([{"gender": "Female", "count": 2}, {"gender": "Male", "count": 2}])
    );

    let (_, body) = fixture.get_json("/api/reports/students/religions").await;
    assert_eq!(
        body["data"],
        json!([{"religion": "Hinduism", "count": 1}, {"religion": "Islam", "count": 3}])
    );

    let (_, body) = fixture.get_json("/api/reports/overview").await;
    assert_eq!(body["data"]["students"]["total"], 5);
    assert_eq!(body["data"]["religion"], json!({"islam": 4, "hinduism": 1}));
}

#[tokio::test]
async fn test_admission_status_patch() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post_json(
            "/api/admissions",
            json!({"name": "Nila", "className": "6", "status": "pending"}),
        )
        .await;
    assert_eq!(status, 201);
    let id = body["data"]["_id"].as_str().unwrap().to_string();

    let resp = fixture
        .client
        .patch(fixture.url(&format!("/api/admissions/{}/status", id)))
        .json(&json!({"status": "approved"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "approved");
    assert_eq!(body["data"]["name"], "Nila");

    let resp = fixture
        .client
        .patch(fixture.url(&format!("/api/admissions/{}/status", id)))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let (_, body) = fixture.get_json("/api/admissions?status=approved").await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_marks_and_classes() {
    let fixture = TestFixture::new().await;

    let entry = json!({
        "examType": "Final",
        "className": "9",
        "roll": 7,
        "examYear": 2024,
        "subject": "Math",
        "marks": 88
    });
    let (status, _) = fixture.post_json("/api/marks", entry.clone()).await;
    assert_eq!(status, 201);
    let (status, _) = fixture.post_json("/api/marks", entry).await;
    assert_eq!(status, 409);

    // Another exam year is a separate entry
    let (status, _) = fixture
        .post_json(
            "/api/marks",
            json!({"examType": "Final", "className": "9", "roll": "7", "examYear": "2025"}),
        )
        .await;
    assert_eq!(status, 201);

    let (_, body) = fixture.get_json("/api/marks?roll=7&examYear=2024").await;
    assert_eq!(body["data"]["total"], 1);

    let (status, _) = fixture
        .post_json("/api/classes", json!({"className": "Nine"}))
        .await;
    assert_eq!(status, 201);
    let (status, _) = fixture
        .post_json("/api/classes", json!({"className": "Nine"}))
        .await;
    assert_eq!(status, 409);

    let (_, body) = fixture.get_json("/api/classes?search=nin").await;
    assert_eq!(body["data"]["total"], 1);
}
