//! Ticket submission, dashboard and staff mutations over HTTP

mod common;

use common::{TestApp, png_bytes};
use http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new().await;
    let response = app.get("/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn anomaly_categories_are_published() {
    let app = TestApp::new().await;
    let response = app.get("/api/tickets/anomaly-categories", None).await;
    assert_eq!(response.status, StatusCode::OK);
    let categories = response.data().as_array().unwrap();
    assert_eq!(categories.len(), 11);
    assert!(categories.contains(&json!("Spie/Allarmi")));
}

#[tokio::test]
async fn vehicle_submission_creates_new_unassigned_ticket() {
    let app = TestApp::new().await;
    let response = app
        .post_multipart(
            "/api/tickets/vehicle",
            &[
                ("requester_name", "Marco Ferrari"),
                ("vehicle_type", "Forklift"),
                ("anomaly_category", "Spie/Allarmi"),
                ("description", "Spia olio accesa"),
            ],
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.code(), 0);
    assert_eq!(response.data()["status"], "NEW");
    assert_eq!(response.data()["kind"], "VEHICLE");
    assert_eq!(response.data()["attachment_dropped"], false);
    let id = response.data()["id"].as_i64().unwrap();
    assert!(id > 0);

    let cookie = app.login_admin().await;
    let detail = app.get(&format!("/api/admin/tickets/{id}"), Some(&cookie)).await;
    let ticket = &detail.data()["ticket"];
    assert_eq!(ticket["requester_name"], "Marco Ferrari");
    assert!(ticket["started_at"].is_null());
    assert!(ticket["closed_at"].is_null());
    assert!(ticket["assigned_to_id"].is_null());
    assert!(ticket["vehicle_number"].is_null());
}

#[tokio::test]
async fn submission_missing_field_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .post_multipart(
            "/api/tickets/technical",
            &[("requester_name", "Anna"), ("description", "Printer down")],
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.code(), 7);
    assert_eq!(response.body["details"]["field"], "title");
}

#[tokio::test]
async fn technical_priority_defaults_to_medium() {
    let app = TestApp::new().await;
    let id = app.submit_technical("VPN", None).await;

    let cookie = app.login_admin().await;
    let detail = app.get(&format!("/api/admin/tickets/{id}"), Some(&cookie)).await;
    assert_eq!(detail.data()["ticket"]["priority"], "MEDIUM");
    assert_eq!(detail.data()["ticket"]["department"], "Logistics");
}

#[tokio::test]
async fn image_is_stored_or_dropped() {
    let app = TestApp::new().await;
    let fields = [
        ("requester_name", "Marco Ferrari"),
        ("vehicle_type", "Forklift"),
        ("anomaly_category", "Pneumatici"),
        ("description", "Gomma a terra"),
    ];

    let png = png_bytes();
    let stored = app
        .post_multipart("/api/tickets/vehicle", &fields, Some(("gomma.png", &png)))
        .await;
    assert_eq!(stored.data()["attachment_dropped"], false);

    let dropped = app
        .post_multipart(
            "/api/tickets/vehicle",
            &fields,
            Some(("script.sh", b"#!/bin/sh".as_slice())),
        )
        .await;
    assert_eq!(dropped.status, StatusCode::OK);
    assert_eq!(dropped.data()["attachment_dropped"], true);

    let cookie = app.login_admin().await;
    let id = stored.data()["id"].as_i64().unwrap();
    let detail = app.get(&format!("/api/admin/tickets/{id}"), Some(&cookie)).await;
    let filename = detail.data()["ticket"]["image_filename"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(filename.ends_with("_gomma.png"));

    let download = app
        .send(
            http::Request::builder()
                .uri(format!("/api/admin/attachments/{filename}"))
                .header(http::header::COOKIE, &cookie)
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.headers[http::header::CONTENT_TYPE], "image/png");

    let missing = app
        .get("/api/admin/attachments/nope.png", Some(&cookie))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let anonymous = app
        .get(&format!("/api/admin/attachments/{filename}"), None)
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn status_transitions_stamp_timestamps() {
    let app = TestApp::new().await;
    let cookie = app.login_admin().await;
    let id = app.submit_vehicle("Rumore freni").await;

    let started = app
        .ticket_action(&cookie, id, json!({"action": "update_status", "status": "IN_PROGRESS"}))
        .await;
    assert_eq!(started.status, StatusCode::OK, "{}", started.body);
    let started_at = started.data()["started_at"].as_i64().unwrap();
    assert!(started.data()["closed_at"].is_null());

    let resolved = app
        .ticket_action(&cookie, id, json!({"action": "update_status", "status": "RESOLVED"}))
        .await;
    assert_eq!(resolved.data()["started_at"].as_i64(), Some(started_at));
    assert!(resolved.data()["closed_at"].as_i64().unwrap() >= started_at);
    assert_eq!(resolved.data()["created_at"], started.data()["created_at"]);

    let invalid = app
        .ticket_action(&cookie, id, json!({"action": "update_status", "status": "CLOSED"}))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.code(), 3002);
}

#[tokio::test]
async fn priority_updates_only_apply_to_technical_tickets() {
    let app = TestApp::new().await;
    let cookie = app.login_admin().await;
    let vehicle = app.submit_vehicle("Freni").await;
    let technical = app.submit_technical("VPN", Some("LOW")).await;

    let rejected = app
        .ticket_action(&cookie, vehicle, json!({"action": "update_priority", "priority": "HIGH"}))
        .await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert_eq!(rejected.code(), 3004);

    let invalid = app
        .ticket_action(&cookie, technical, json!({"action": "update_priority", "priority": "URGENT"}))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    let detail = app
        .get(&format!("/api/admin/tickets/{technical}"), Some(&cookie))
        .await;
    assert_eq!(detail.data()["ticket"]["priority"], "LOW");

    let updated = app
        .ticket_action(&cookie, technical, json!({"action": "update_priority", "priority": "HIGH"}))
        .await;
    assert_eq!(updated.data()["priority"], "HIGH");
}

#[tokio::test]
async fn assignment_and_comments() {
    let app = TestApp::new().await;
    let cookie = app.login_admin().await;
    let id = app.submit_vehicle("Perdita olio").await;

    let staff = app.get("/api/admin/staff", Some(&cookie)).await;
    let admin_id = staff.data()[0]["id"].as_i64().unwrap();

    let assigned = app
        .ticket_action(&cookie, id, json!({"action": "assign", "assigned_to_id": admin_id}))
        .await;
    assert_eq!(assigned.data()["assigned_to_id"].as_i64(), Some(admin_id));
    assert_eq!(assigned.data()["assigned_to_username"], "admin");

    let unknown = app
        .ticket_action(&cookie, id, json!({"action": "assign", "assigned_to_id": 9999}))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let cleared = app
        .ticket_action(&cookie, id, json!({"action": "assign", "assigned_to_id": "none"}))
        .await;
    assert!(cleared.data()["assigned_to_id"].is_null());

    for body in ["first", "second"] {
        let added = app
            .ticket_action(
                &cookie,
                id,
                json!({"action": "add_comment", "author_name": "Luca", "comment_body": body}),
            )
            .await;
        assert_eq!(added.status, StatusCode::OK);
    }
    let empty = app
        .ticket_action(
            &cookie,
            id,
            json!({"action": "add_comment", "author_name": "Luca", "comment_body": "  "}),
        )
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let detail = app.get(&format!("/api/admin/tickets/{id}"), Some(&cookie)).await;
    let comments = detail.data()["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["body"], "second");
}

#[tokio::test]
async fn delete_removes_comments_and_attachment() {
    let app = TestApp::new().await;
    let cookie = app.login_admin().await;
    let png = png_bytes();
    let submitted = app
        .post_multipart(
            "/api/tickets/vehicle",
            &[
                ("requester_name", "Marco Ferrari"),
                ("vehicle_type", "Forklift"),
                ("anomaly_category", "Carrozzeria"),
                ("description", "Ammaccatura"),
            ],
            Some(("danno.jpg.png", &png)),
        )
        .await;
    let id = submitted.data()["id"].as_i64().unwrap();

    for body in ["a", "b", "c"] {
        app.ticket_action(
            &cookie,
            id,
            json!({"action": "add_comment", "author_name": "Luca", "comment_body": body}),
        )
        .await;
    }
    let detail = app.get(&format!("/api/admin/tickets/{id}"), Some(&cookie)).await;
    let filename = detail.data()["ticket"]["image_filename"]
        .as_str()
        .unwrap()
        .to_string();
    let path = app.state.attachments.dir().join(&filename);
    assert!(path.exists());

    let deleted = app
        .ticket_action(&cookie, id, json!({"action": "delete"}))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert!(!path.exists());

    let comments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE ticket_id = ?")
        .bind(id)
        .fetch_one(&app.state.pool)
        .await
        .unwrap();
    assert_eq!(comments, 0);

    let gone = app.get(&format!("/api/admin/tickets/{id}"), Some(&cookie)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.code(), 3001);
}

#[tokio::test]
async fn search_filters_and_pagination() {
    let app = TestApp::with_config(|config| config.page_size = 2).await;
    let cookie = app.login_admin().await;

    let first = app.submit_vehicle("Il FORKLIFT non parte").await;
    app.submit_vehicle("Spia accesa").await;
    let third = app.submit_technical("VPN", None).await;

    let by_text = app
        .get("/api/admin/tickets?search=forklift", Some(&cookie))
        .await;
    let ids: Vec<i64> = by_text.data()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![first]);

    let by_id = app
        .get(&format!("/api/admin/tickets?search={third}"), Some(&cookie))
        .await;
    assert_eq!(by_id.data()["data"][0]["id"].as_i64(), Some(third));

    let page_one = app.get("/api/admin/tickets", Some(&cookie)).await;
    assert_eq!(page_one.data()["total"], 3);
    assert_eq!(page_one.data()["total_pages"], 2);
    assert_eq!(page_one.data()["data"][0]["id"].as_i64(), Some(third));

    let page_two = app.get("/api/admin/tickets?page=2", Some(&cookie)).await;
    assert_eq!(page_two.data()["data"].as_array().unwrap().len(), 1);

    let beyond = app.get("/api/admin/tickets?page=9", Some(&cookie)).await;
    assert_eq!(beyond.status, StatusCode::OK);
    assert!(beyond.data()["data"].as_array().unwrap().is_empty());

    let lenient = app.get("/api/admin/tickets?page=abc", Some(&cookie)).await;
    assert_eq!(lenient.data()["page"], 1);

    let unassigned = app
        .get("/api/admin/tickets?assigned=unassigned&status=NEW", Some(&cookie))
        .await;
    assert_eq!(unassigned.data()["total"], 3);

    let bad_status = app
        .get("/api/admin/tickets?status=OPEN", Some(&cookie))
        .await;
    assert_eq!(bad_status.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_action_is_rejected() {
    let app = TestApp::new().await;
    let cookie = app.login_admin().await;
    let id = app.submit_vehicle("x").await;

    let response = app
        .ticket_action(&cookie, id, json!({"action": "archive"}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.code(), 5);
}
