mod common;

use common::TestApp;
use reqwest::StatusCode;
use serde_json::json;

async fn register_student(app: &TestApp) -> serde_json::Value {
    let response = app
        .post("/api/students/register")
        .json(&json!({
            "name": "Asha Rao",
            "email": "a@x.com",
            "password": "secret1",
            "studentId": "S100"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
}

async fn login_student(app: &TestApp, email: &str, password: &str) -> reqwest::Response {
    app.post("/api/students/login")
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
async fn test_register_returns_registration_token() {
    let app = TestApp::spawn().await;

    let body = register_student(&app).await;
    assert!(body["token"].is_string());

    // Registration never triggers a mail.
    assert_eq!(app.notifier.sent_count(), 0);
}

#[tokio::test]
async fn test_register_validates_fields() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/students/register")
        .json(&json!({
            "name": "",
            "email": "not-an-email",
            "password": "short",
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    let paths: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|violation| violation["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["name", "email", "password", "studentId"]);
}

#[tokio::test]
async fn test_login_before_activation_steps_up_never_session() {
    let app = TestApp::spawn().await;
    register_student(&app).await;

    let response = login_student(&app, "a@x.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies: Vec<String> = response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("studentVerifyToken=")));

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["msg"], "OTP sent to your email");
    // No 30-day session artifact before OTP verification.
    assert!(body.get("loginToken").is_none());

    let otp = app.notifier.last_otp_for("a@x.com").expect("No OTP sent");
    assert_eq!(otp.len(), 6);
}

#[tokio::test]
async fn test_full_activation_flow() {
    let app = TestApp::spawn().await;
    register_student(&app).await;

    // Step-up via login; the verify cookie lands in the client's jar.
    login_student(&app, "a@x.com", "secret1").await;
    let otp = app.notifier.last_otp_for("a@x.com").unwrap();

    // The step-up cookie is enough; no Authorization header needed.
    let response = app
        .post("/api/students/verify-otp")
        .json(&json!({ "otp": otp }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["msg"], "OTP verified successfully");
    assert!(body["token"].is_string());

    // Active principal now logs straight in.
    let response = login_student(&app, "a@x.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["msg"], "Login successful");
    assert!(body["loginToken"].is_string());

    // And no further OTP went out for the second login.
    assert_eq!(app.notifier.sent_count(), 1);
}

#[tokio::test]
async fn test_verify_otp_accepts_bearer_header() {
    let app = TestApp::spawn().await;
    register_student(&app).await;

    let response = login_student(&app, "a@x.com", "secret1").await;
    let step_up_token = response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .find_map(|v| {
            v.to_str()
                .ok()?
                .strip_prefix("studentVerifyToken=")?
                .split(';')
                .next()
                .map(str::to_string)
        })
        .expect("No step-up cookie");
    let otp = app.notifier.last_otp_for("a@x.com").unwrap();

    // Fresh client: no cookies, header only.
    let response = reqwest::Client::new()
        .post(format!("{}/api/students/verify-otp", app.address))
        .header("Authorization", format!("Bearer {}", step_up_token))
        .json(&json!({ "otp": otp }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_verify_otp_without_credential_is_unauthorized() {
    let app = TestApp::spawn().await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/students/verify-otp", app.address))
        .json(&json!({ "otp": "123456" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["msg"], "Authorization header missing");
}

#[tokio::test]
async fn test_verify_otp_rejects_wrong_then_accepts_correct_code() {
    let app = TestApp::spawn().await;
    register_student(&app).await;
    login_student(&app, "a@x.com", "secret1").await;

    let otp = app.notifier.last_otp_for("a@x.com").unwrap();
    let wrong = if otp == "123456" { "654321" } else { "123456" };

    let response = app
        .post("/api/students/verify-otp")
        .json(&json!({ "otp": wrong }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["msg"], "Invalid or expired OTP");

    // A failed attempt does not consume the challenge.
    let response = app
        .post("/api/students/verify-otp")
        .json(&json!({ "otp": otp }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_verify_otp_is_single_use() {
    let app = TestApp::spawn().await;
    register_student(&app).await;
    login_student(&app, "a@x.com", "secret1").await;
    let otp = app.notifier.last_otp_for("a@x.com").unwrap();

    let first = app
        .post("/api/students/verify-otp")
        .json(&json!({ "otp": otp }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .post("/api/students/verify-otp")
        .json(&json!({ "otp": otp }))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expired_otp_is_rejected() {
    // Non-positive window: every code is born expired.
    let app = TestApp::spawn_with_otp_window(0).await;
    register_student(&app).await;
    login_student(&app, "a@x.com", "secret1").await;
    let otp = app.notifier.last_otp_for("a@x.com").unwrap();

    let response = app
        .post("/api/students/verify-otp")
        .json(&json!({ "otp": otp }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_resend_otp_single_flight() {
    let app = TestApp::spawn().await;
    register_student(&app).await;
    login_student(&app, "a@x.com", "secret1").await;
    let first_otp = app.notifier.last_otp_for("a@x.com").unwrap();

    // The issued code is still live: resend is refused.
    let response = app.post("/api/students/resend-otp").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["msg"].as_str().unwrap().contains("already been sent"));
    assert_eq!(app.notifier.last_otp_for("a@x.com").unwrap(), first_otp);
}

#[tokio::test]
async fn test_resend_otp_after_expiry_invalidates_old_code() {
    let app = TestApp::spawn_with_otp_window(0).await;
    register_student(&app).await;
    login_student(&app, "a@x.com", "secret1").await;
    let old_otp = app.notifier.last_otp_for("a@x.com").unwrap();

    let response = app.post("/api/students/resend-otp").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["msg"], "OTP sent successfully");

    let new_otp = app.notifier.last_otp_for("a@x.com").unwrap();
    assert_eq!(app.notifier.sent_count(), 2);

    // Verifying the replaced code must fail even if it differs from the new
    // one; if the six-digit draw collided, the assertion still holds.
    if new_otp != old_otp {
        let response = app
            .post("/api/students/verify-otp")
            .json(&json!({ "otp": old_otp }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_uniqueness_holds_across_roles() {
    let app = TestApp::spawn().await;
    register_student(&app).await;

    // Same email as the student, via the teacher family.
    let response = app
        .post("/api/teachers/register")
        .json(&json!({
            "name": "T One",
            "email": "a@x.com",
            "password": "secret1",
            "teacherId": "T100",
            "subjects": ["Maths"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["msg"].as_str().unwrap().contains("student"));

    // Same external id, different email.
    let response = app
        .post("/api/teachers/register")
        .json(&json!({
            "name": "T One",
            "email": "t@x.com",
            "password": "secret1",
            "teacherId": "S100",
            "subjects": ["Maths"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_field_specific_errors() {
    let app = TestApp::spawn().await;
    register_student(&app).await;

    let response = login_student(&app, "missing@x.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["email"], "Invalid Credentials! Email is incorrect.");

    let response = login_student(&app, "a@x.com", "wrong01").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["password"], "Invalid Credentials! Password is incorrect.");
}

#[tokio::test]
async fn test_check_email_is_role_aware() {
    let app = TestApp::spawn().await;
    register_student(&app).await;

    let response = app
        .get("/api/teachers/check-email/a@x.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["exists"], true);
    assert_eq!(
        body["message"],
        "User already exists as a student, use a new email!"
    );

    let response = app
        .get("/api/students/check-email/a@x.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User already exists, you can login!");

    let response = app
        .get("/api/students/check-email/fresh@x.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["exists"], false);
}

#[tokio::test]
async fn test_check_enrollment_against_roster() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/api/students/check-studentId/S100?name=Asha%20Rao")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["proceed"], true);

    let response = app
        .get("/api/students/check-studentId/S100?name=Asha%20Singh")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["proceed"], false);

    let response = app
        .get("/api/students/check-studentId/S999?name=Asha%20Rao")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // A registered student id is reported taken.
    register_student(&app).await;
    let response = app
        .get("/api/students/check-studentId/S100?name=Asha%20Rao")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("student ID"));
}

#[tokio::test]
async fn test_password_reset_round_trip() {
    let app = TestApp::spawn().await;
    register_student(&app).await;

    let response = app
        .post("/api/students/forgot-password")
        .json(&json!({ "email": "a@x.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["msg"], "Email sent");

    let reset_url = app.notifier.last_reset_url_for("a@x.com").unwrap();
    let token = reset_url.rsplit('/').next().unwrap().to_string();
    assert!(reset_url.contains("/student/reset-password/"));

    let response = app
        .get(&format!("/api/students/check-reset-token/{}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post(&format!("/api/students/reset-password/{}", token))
        .json(&json!({ "password": "newpass1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["msg"], "Password reset successful");

    // Old password is dead, new one works (still inactive, so step-up).
    let response = login_student(&app, "a@x.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = login_student(&app, "a@x.com", "newpass1").await;
    assert_eq!(response.status(), StatusCode::OK);

    // The token was consumed.
    let response = app
        .get(&format!("/api/students/check-reset-token/{}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = app
        .post(&format!("/api/students/reset-password/{}", token))
        .json(&json!({ "password": "another1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_forgot_password_reissue_invalidates_prior_token() {
    let app = TestApp::spawn().await;
    register_student(&app).await;

    app.post("/api/students/forgot-password")
        .json(&json!({ "email": "a@x.com" }))
        .send()
        .await
        .unwrap();
    let first_url = app.notifier.last_reset_url_for("a@x.com").unwrap();
    let first_token = first_url.rsplit('/').next().unwrap().to_string();

    app.post("/api/students/forgot-password")
        .json(&json!({ "email": "a@x.com" }))
        .send()
        .await
        .unwrap();

    let response = app
        .get(&format!("/api/students/check-reset-token/{}", first_token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_forgot_password_unknown_email() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/students/forgot-password")
        .json(&json!({ "email": "ghost@x.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["msg"], "Student does not exist");
}

#[tokio::test]
async fn test_protected_route_returns_session_claims() {
    let app = TestApp::spawn().await;
    register_student(&app).await;
    login_student(&app, "a@x.com", "secret1").await;
    let otp = app.notifier.last_otp_for("a@x.com").unwrap();
    app.post("/api/students/verify-otp")
        .json(&json!({ "otp": otp }))
        .send()
        .await
        .unwrap();

    // The session cookie set by verify-otp authenticates the request.
    let response = app.get("/api/protected").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["email"], "a@x.com");
    assert_eq!(body["role"], "student");
    assert_eq!(body["name"], "Asha Rao");

    // No cookie, no entry.
    let response = reqwest::Client::new()
        .get(format!("{}/api/protected", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

async fn activated_teacher_session(app: &TestApp) -> String {
    app.post("/api/teachers/register")
        .json(&json!({
            "name": "T One",
            "email": "t@x.com",
            "password": "secret1",
            "teacherId": "T100",
            "subjects": ["Maths", "Physics"]
        }))
        .send()
        .await
        .unwrap();
    app.post("/api/teachers/login")
        .json(&json!({ "email": "t@x.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    let otp = app.notifier.last_otp_for("t@x.com").unwrap();
    let response = app
        .post("/api/teachers/verify-otp")
        .json(&json!({ "otp": otp }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_note_upload_is_teacher_gated() {
    let app = TestApp::spawn().await;
    let teacher_token = activated_teacher_session(&app).await;

    let form = || {
        reqwest::multipart::Form::new()
            .text("subject", "Data Structures")
            .text("title", "Week 1")
            .text("uploadedBy", "T100")
            .part(
                "file",
                reqwest::multipart::Part::bytes(b"lecture notes".to_vec())
                    .file_name("week1.pdf")
                    .mime_str("application/pdf")
                    .unwrap(),
            )
    };

    let response = reqwest::Client::new()
        .post(format!("{}/api/notes/upload", app.address))
        .header("Authorization", format!("Bearer {}", teacher_token))
        .multipart(form())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["msg"], "Notes stored successfully");
    assert!(body["viewURL"].as_str().unwrap().contains("DATA_STRUCTURES"));
    assert!(body["downloadURL"]
        .as_str()
        .unwrap()
        .ends_with("?download=true"));

    // A student session is forbidden.
    register_student(&app).await;
    login_student(&app, "a@x.com", "secret1").await;
    let otp = app.notifier.last_otp_for("a@x.com").unwrap();
    let response = app
        .post("/api/students/verify-otp")
        .json(&json!({ "otp": otp }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    let student_token = body["token"].as_str().unwrap();

    let response = reqwest::Client::new()
        .post(format!("{}/api/notes/upload", app.address))
        .header("Authorization", format!("Bearer {}", student_token))
        .multipart(form())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // No credential at all.
    let response = reqwest::Client::new()
        .post(format!("{}/api/notes/upload", app.address))
        .multipart(form())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
