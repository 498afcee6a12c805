mod common;

use common::*;
use serde_json::Value;

async fn error_code(response: reqwest::Response) -> String {
    let json: Value = response.json().await.unwrap();
    json["error"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let portal = spawn_seeded().await;
    let client = client();
    signed_in(&client, &portal, EMPLOYEE).await;

    let response = client
        .post(portal.url("/punches"))
        .form(&[("note", "x")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(error_code(response).await, "invalid_csrf_token");

    // The handler never ran.
    assert!(portal.state.punches.history(attendance_portal::auth::UserId(1)).is_empty());

    portal.stop().await;
}

#[tokio::test]
async fn test_mismatched_token_is_rejected() {
    let portal = spawn_seeded().await;
    let client = client();
    let token = signed_in(&client, &portal, EMPLOYEE).await;

    let response = client
        .post(portal.url("/punches"))
        .form(&[("csrf_token", format!("{token}x"))])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(error_code(response).await, "invalid_csrf_token");

    portal.stop().await;
}

#[tokio::test]
async fn test_token_from_another_session_is_rejected() {
    let portal = spawn_seeded().await;
    let alice = client();
    let bob = client();
    signed_in(&alice, &portal, EMPLOYEE).await;
    let bobs_token = signed_in(&bob, &portal, TENANT_ADMIN).await;

    let response = alice
        .post(portal.url("/punches"))
        .form(&[("csrf_token", bobs_token.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    portal.stop().await;
}

#[tokio::test]
async fn test_matching_token_passes_as_field_or_header() {
    let portal = spawn_seeded().await;
    let client = client();
    let token = signed_in(&client, &portal, EMPLOYEE).await;

    let response = client
        .post(portal.url("/punches"))
        .form(&[("csrf_token", token.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/dashboard");

    let response = client
        .post(portal.url("/punches"))
        .header("x-csrf-token", token.as_str())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 303);

    let punches: Value = client.get(portal.url("/punches")).send().await.unwrap().json().await.unwrap();
    assert_eq!(punches[0]["kind"], "clock_in");
    assert_eq!(punches[1]["kind"], "clock_out");

    portal.stop().await;
}

#[tokio::test]
async fn test_multipart_token_is_accepted() {
    let portal = spawn_seeded().await;
    let client = client();
    let token = signed_in(&client, &portal, EMPLOYEE).await;

    let form = reqwest::multipart::Form::new()
        .text("note", "on site")
        .text("csrf_token", token.clone());
    let response = client.post(portal.url("/punches")).multipart(form).send().await.unwrap();
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/dashboard");

    let form = reqwest::multipart::Form::new().text("csrf_token", format!("{token}x"));
    let response = client.post(portal.url("/punches")).multipart(form).send().await.unwrap();
    assert_eq!(response.status(), 400);

    assert_eq!(portal.state.punches.history(attendance_portal::auth::UserId(1)).len(), 1);

    portal.stop().await;
}

#[tokio::test]
async fn test_form_media_type_is_case_insensitive() {
    let portal = spawn_seeded().await;
    let client = client();
    let token = signed_in(&client, &portal, EMPLOYEE).await;

    let response = client
        .post(portal.url("/punches"))
        .header("content-type", "Application/X-WWW-Form-Urlencoded")
        .body(format!("csrf_token={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/dashboard");

    portal.stop().await;
}

#[tokio::test]
async fn test_non_form_body_without_header_is_rejected() {
    let portal = spawn_seeded().await;
    let client = client();
    let token = signed_in(&client, &portal, EMPLOYEE).await;

    let response = client
        .post(portal.url("/punches"))
        .json(&serde_json::json!({ "csrf_token": token }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    portal.stop().await;
}

#[tokio::test]
async fn test_other_state_changing_methods_are_checked() {
    let portal = spawn_seeded().await;
    let client = client();
    signed_in(&client, &portal, EMPLOYEE).await;

    for method in [reqwest::Method::PUT, reqwest::Method::PATCH, reqwest::Method::DELETE] {
        let response = client
            .request(method.clone(), portal.url("/punches"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "{method}");
    }

    portal.stop().await;
}

#[tokio::test]
async fn test_csrf_runs_before_authorization() {
    let portal = spawn_seeded().await;
    let client = client();

    // Anonymous POST to a gated route is rejected for the token, not redirected.
    let response = client.post(portal.url("/admin/role-codes")).send().await.unwrap();
    assert_eq!(response.status(), 400);

    portal.stop().await;
}
