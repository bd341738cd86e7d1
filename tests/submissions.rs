//! Submission endpoint behavior against in-memory collaborators.

use axum::http::StatusCode;
use serde_json::{json, Value};

use contact_handlers::config::EmailFailurePolicy;
use contact_handlers::services::RecordStore;

mod common;
use common::{get, submit_request, test_config, Harness, LOCAL_PROXY};

fn form() -> Value {
    json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "message": "I'd like a quote for an analytical engine.",
        "company": "Babbage & Co"
    })
}

#[tokio::test]
async fn accepts_valid_submission_and_notifies_in_order() {
    let h = Harness::new(test_config());

    let (status, _, body) = h.send(submit_request("203.0.113.1", &form())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Submission received successfully");
    let id = body["submissionId"].as_str().unwrap().to_string();

    let stored = h.submissions();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["id"], id.as_str());
    assert_eq!(stored[0]["status"], "new");
    assert_eq!(stored[0]["service"], "General Inquiry");
    assert_eq!(stored[0]["ipAddress"], "203.0.113.1");
    assert_eq!(stored[0]["createdAt"], stored[0]["updatedAt"]);

    let sent = h.email.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, vec![h.state.config().email.operator.clone()]);
    assert_eq!(sent[1].to, vec!["ada@example.com".to_string()]);
}

#[tokio::test]
async fn each_submission_gets_a_distinct_id() {
    let h = Harness::new(test_config());

    let (_, _, first) = h.send(submit_request("198.51.100.1", &form())).await;
    let (_, _, second) = h.send(submit_request("198.51.100.2", &form())).await;
    assert_ne!(first["submissionId"], second["submissionId"]);
    assert_eq!(h.submissions().len(), 2);
}

#[tokio::test]
async fn fourth_attempt_in_window_is_rate_limited() {
    let h = Harness::new(test_config());

    for _ in 0..3 {
        let (status, _, _) = h.send(submit_request("192.0.2.10", &form())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _, body) = h.send(submit_request("192.0.2.10", &form())).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Too many submissions. Please try again later.");
    assert_eq!(h.submissions().len(), 3);

    // Other clients have their own allowance.
    let (status, _, _) = h.send(submit_request("192.0.2.11", &form())).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rotating_forwarded_for_from_an_untrusted_peer_is_still_limited() {
    let h = Harness::with_peer(test_config(), "198.51.100.9:51000".parse().unwrap());

    let mut statuses = Vec::new();
    for n in 0..6 {
        let (status, _, _) = h.send(submit_request(&format!("10.0.0.{n}"), &form())).await;
        statuses.push(status);
    }
    assert_eq!(statuses[..3], [StatusCode::OK; 3]);
    assert_eq!(statuses[3..], [StatusCode::TOO_MANY_REQUESTS; 3]);

    let stored = h.submissions();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|s| s["ipAddress"] == "198.51.100.9"));
}

#[tokio::test]
async fn trusted_proxy_reports_the_hop_it_saw() {
    let h = Harness::new(test_config());

    let chain = format!("1.2.3.4, 203.0.113.77, {}", LOCAL_PROXY.ip());
    let (status, _, _) = h.send(submit_request(&chain, &form())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.submissions()[0]["ipAddress"], "203.0.113.77");
}

#[tokio::test]
async fn disabled_rate_limit_admits_everything() {
    let mut config = test_config();
    config.rate_limit.enabled = false;
    let h = Harness::new(config);

    for _ in 0..5 {
        let (status, _, _) = h.send(submit_request("192.0.2.20", &form())).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn missing_fields_are_rejected_without_side_effects() {
    let h = Harness::new(test_config());

    let (status, _, body) = h
        .send(submit_request("192.0.2.30", &json!({ "email": "ada@example.com", "name": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields: name, message");
    assert!(h.submissions().is_empty());
    assert!(h.objects.is_empty());
    assert!(h.email.sent().is_empty());
}

#[tokio::test]
async fn invalid_email_is_rejected() {
    let h = Harness::new(test_config());
    let mut body = form();
    body["email"] = json!("not an email");

    let (status, _, body) = h.send(submit_request("192.0.2.31", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email address");
    assert!(h.submissions().is_empty());
}

#[tokio::test]
async fn unparseable_body_is_a_generic_failure() {
    let h = Harness::new(test_config());
    let request = axum::http::Request::post("/api/submit")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let (status, _, body) = h.send(request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to process submission" }));
}

#[tokio::test]
async fn resume_is_uploaded_with_metadata() {
    let h = Harness::new(test_config());
    let mut body = form();
    body["resumeFile"] = json!("data:application/pdf;base64,JVBERi0xLjQ=");
    body["resumeFileName"] = json!("ada cv.pdf");

    let (status, _, response) = h.send(submit_request("192.0.2.40", &body)).await;
    assert_eq!(status, StatusCode::OK);
    let id = response["submissionId"].as_str().unwrap();

    let stored = &h.submissions()[0];
    assert_eq!(stored["resumeFileName"], "ada cv.pdf");
    let url = stored["resumeUrl"].as_str().unwrap();
    let bucket = h.state.config().storage.resume_bucket.clone();
    let key = url
        .strip_prefix(&format!("memory://{bucket}/"))
        .unwrap()
        .to_string();
    assert!(key.starts_with(&format!("resumes/{id}/")));
    assert!(key.ends_with("-ada cv.pdf"));

    let object = h.objects.get(&bucket, &key).unwrap();
    assert_eq!(object.bytes, b"%PDF-1.4");
    assert_eq!(object.content_type, "application/pdf");
    assert_eq!(object.metadata["submissionId"], id);
    assert_eq!(object.metadata["originalName"], "ada cv.pdf");
}

#[tokio::test]
async fn upload_failure_still_accepts_submission() {
    let h = Harness::new(test_config());
    h.objects.set_failing(true);
    let mut body = form();
    body["resumeFile"] = json!("JVBERi0xLjQ=");
    body["resumeFileName"] = json!("cv.pdf");

    let (status, _, _) = h.send(submit_request("192.0.2.41", &body)).await;
    assert_eq!(status, StatusCode::OK);

    let stored = &h.submissions()[0];
    assert!(stored.get("resumeUrl").is_none());
    assert!(stored.get("resumeFileName").is_none());
}

#[tokio::test]
async fn undecodable_resume_is_skipped() {
    let h = Harness::new(test_config());
    let mut body = form();
    body["resumeFile"] = json!("%%% not base64 %%%");
    body["resumeFileName"] = json!("cv.pdf");

    let (status, _, _) = h.send(submit_request("192.0.2.42", &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(h.objects.is_empty());
    assert!(h.submissions()[0].get("resumeUrl").is_none());
}

#[tokio::test]
async fn email_failure_aborts_after_record_write() {
    let h = Harness::new(test_config());
    h.email.set_failing(true);

    let (status, _, body) = h.send(submit_request("192.0.2.50", &form())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to process submission" }));
    assert_eq!(h.submissions().len(), 1);
}

#[tokio::test]
async fn email_failure_can_be_logged_instead() {
    let mut config = test_config();
    config.email.failure_policy = EmailFailurePolicy::Log;
    let h = Harness::new(config);
    h.email.set_failing(true);

    let (status, _, body) = h.send(submit_request("192.0.2.51", &form())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["submissionId"].is_string());
}

#[tokio::test]
async fn record_store_failure_is_generic() {
    let h = Harness::new(test_config());
    h.records.set_failing(true);

    let (status, _, body) = h.send(submit_request("192.0.2.52", &form())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to process submission" }));
    assert!(h.email.sent().is_empty());
}

#[tokio::test]
async fn idempotent_retries_return_the_original_id() {
    let h = Harness::new(test_config());
    let request = || {
        let mut request = submit_request("192.0.2.60", &form());
        request
            .headers_mut()
            .insert("idempotency-key", "retry-abc".parse().unwrap());
        request
    };

    let (_, _, first) = h.send(request()).await;
    for _ in 0..4 {
        let (status, _, replay) = h.send(request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(replay["submissionId"], first["submissionId"]);
    }
    assert_eq!(h.submissions().len(), 1);
    assert_eq!(h.submissions()[0]["idempotencyKey"], "retry-abc");
    assert_eq!(h.email.sent().len(), 2);

    // Replays didn't use up the client's allowance.
    for _ in 0..2 {
        let (status, _, _) = h.send(submit_request("192.0.2.60", &form())).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn listing_is_newest_first_with_credentials() {
    let h = Harness::new(test_config());
    let table = h.state.config().storage.submissions_table.clone();
    for (id, created_at) in [("a", 1_000u64), ("b", 3_000), ("c", 2_000)] {
        h.records
            .put(
                &table,
                json!({
                    "id": id,
                    "name": "N",
                    "email": "n@example.com",
                    "message": "M",
                    "createdAt": created_at,
                    "updatedAt": created_at
                }),
            )
            .await
            .unwrap();
    }

    let (status, headers, body) = h.send(get("/api/submissions")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["access-control-allow-credentials"], "true");
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(body["count"], 3);
    let ids: Vec<&str> = body["submissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["b", "c", "a"]);
}

#[tokio::test]
async fn listing_failure_hides_details_outside_dev_mode() {
    let h = Harness::new(test_config());
    h.records.set_failing(true);

    let (status, _, body) = h.send(get("/api/submissions")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to fetch submissions" }));

    let mut config = test_config();
    config.security.dev_mode = true;
    let h = Harness::new(config);
    h.records.set_failing(true);

    let (_, _, body) = h.send(get("/api/submissions")).await;
    assert_eq!(body["error"], "Failed to fetch submissions");
    assert!(body["details"].as_str().unwrap().contains("record store"));
}
