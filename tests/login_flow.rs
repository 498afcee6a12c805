mod common;

use common::*;
use serde_json::Value;

fn session_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("portal_session="))
        .map(|v| v.split(';').next().unwrap_or("").to_string())
}

#[tokio::test]
async fn test_login_dashboard_round_trip() {
    let portal = spawn_seeded().await;
    let client = client();

    let response = login(&client, &portal, EMPLOYEE, PASSWORD).await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/dashboard");

    let response = client.get(portal.url("/dashboard")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let html = response.text().await.unwrap();
    assert!(html.contains("Hello, erin"));
    assert!(html.contains("Acme"));

    portal.stop().await;
}

#[tokio::test]
async fn test_login_rotates_session_and_token() {
    let portal = spawn_seeded().await;
    let client = client();

    let response = client.get(portal.url("/login")).send().await.unwrap();
    let before_cookie = session_cookie(&response).expect("login form issues a session");
    let before_token = extract_csrf(&response.text().await.unwrap()).unwrap();

    // Token is stable while the session lives.
    assert_eq!(login_token(&client, &portal).await, before_token);

    let response = client
        .post(portal.url("/login"))
        .form(&[("email", EMPLOYEE), ("password", PASSWORD), ("csrf_token", before_token.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 303);
    let after_cookie = session_cookie(&response).expect("login issues a new session id");
    assert_ne!(before_cookie, after_cookie);

    let html = client.get(portal.url("/dashboard")).send().await.unwrap().text().await.unwrap();
    let after_token = extract_csrf(&html).unwrap();
    assert_ne!(before_token, after_token);

    // The pre-login token no longer passes.
    let response = client
        .post(portal.url("/punches"))
        .form(&[("csrf_token", before_token.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    portal.stop().await;
}

#[tokio::test]
async fn test_bad_password_flashes_and_stays_anonymous() {
    let portal = spawn_seeded().await;
    let client = client();

    let response = login(&client, &portal, EMPLOYEE, "wrong").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/login");

    let html = client.get(portal.url("/login")).send().await.unwrap().text().await.unwrap();
    assert!(html.contains("Invalid email or password."));
    // Flashes are shown once.
    let html = client.get(portal.url("/login")).send().await.unwrap().text().await.unwrap();
    assert!(!html.contains("Invalid email or password."));

    let response = client.get(portal.url("/whoami")).send().await.unwrap();
    assert_eq!(response.status(), 401);

    portal.stop().await;
}

#[tokio::test]
async fn test_unknown_disabled_and_suspended_accounts_cannot_sign_in() {
    let portal = spawn_seeded().await;

    for email in ["nobody@acme.test", DISABLED, SUSPENDED_TENANT_USER] {
        let client = client();
        let response = login(&client, &portal, email, PASSWORD).await;
        assert_eq!(location(&response), "/login", "{email}");

        let response = client.get(portal.url("/dashboard")).send().await.unwrap();
        assert_eq!(response.status(), 303, "{email}");
        assert_eq!(location(&response), "/login", "{email}");
    }

    portal.stop().await;
}

#[tokio::test]
async fn test_email_lookup_ignores_case() {
    let portal = spawn_seeded().await;
    let client = client();

    let response = login(&client, &portal, "Erin@ACME.test", PASSWORD).await;
    assert_eq!(location(&response), "/dashboard");

    portal.stop().await;
}

#[tokio::test]
async fn test_whoami_projection() {
    let portal = spawn_seeded().await;
    let client = client();
    signed_in(&client, &portal, TENANT_ADMIN).await;

    let response = client.get(portal.url("/whoami")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["email"], TENANT_ADMIN);
    assert_eq!(json["role"], "tenant_admin");
    assert_eq!(json["tenant_id"], 1);
    assert!(json.get("password_hash").is_none());

    portal.stop().await;
}

#[tokio::test]
async fn test_logout_ends_session() {
    let portal = spawn_seeded().await;
    let client = client();
    let token = signed_in(&client, &portal, EMPLOYEE).await;

    let response = client
        .post(portal.url("/logout"))
        .form(&[("csrf_token", token.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/login");
    let expired = session_cookie(&response).unwrap();
    assert_eq!(expired, "portal_session=");

    let response = client.get(portal.url("/dashboard")).send().await.unwrap();
    assert_eq!(location(&response), "/login");

    portal.stop().await;
}

#[tokio::test]
async fn test_signed_in_user_skips_login_form() {
    let portal = spawn_seeded().await;
    let client = client();
    signed_in(&client, &portal, EMPLOYEE).await;

    let response = client.get(portal.url("/login")).send().await.unwrap();
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/dashboard");

    portal.stop().await;
}

/// POST the code form with the session's current token.
async fn submit_code(client: &reqwest::Client, portal: &TestPortal, code: &str) -> reqwest::Response {
    let html = client.get(portal.url("/login/mfa")).send().await.unwrap().text().await.unwrap();
    let token = extract_csrf(&html).expect("code form carries a CSRF token");
    client
        .post(portal.url("/login/mfa"))
        .form(&[("code", code), ("csrf_token", token.as_str())])
        .send()
        .await
        .unwrap()
}

fn wrong_code() -> String {
    let code: u32 = current_code().parse().unwrap();
    format!("{:06}", (code + 500_000) % 1_000_000)
}

#[tokio::test]
async fn test_totp_account_needs_code_before_access() {
    let portal = spawn_portal(mfa_config()).await;
    let client = client();

    let response = login(&client, &portal, MFA_USER, PASSWORD).await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/login/mfa");

    // Password alone does not sign the session in.
    let response = client.get(portal.url("/dashboard")).send().await.unwrap();
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/login");
    let response = client.get(portal.url("/whoami")).send().await.unwrap();
    assert_eq!(response.status(), 401);

    let response = submit_code(&client, &portal, &wrong_code()).await;
    assert_eq!(location(&response), "/login/mfa");
    let html = client.get(portal.url("/login/mfa")).send().await.unwrap().text().await.unwrap();
    assert!(html.contains("Invalid verification code."));

    let response = submit_code(&client, &portal, &current_code()).await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/dashboard");

    let whoami: Value = client.get(portal.url("/whoami")).send().await.unwrap().json().await.unwrap();
    assert_eq!(whoami["email"], MFA_USER);

    portal.stop().await;
}

#[tokio::test]
async fn test_code_step_rotates_session() {
    let portal = spawn_portal(mfa_config()).await;
    let client = client();

    let response = login(&client, &portal, MFA_USER, PASSWORD).await;
    let pending_cookie = session_cookie(&response).expect("password step issues a session");
    let response = submit_code(&client, &portal, &current_code()).await;
    let signed_in_cookie = session_cookie(&response).expect("code step issues a new session id");
    assert_ne!(pending_cookie, signed_in_cookie);

    portal.stop().await;
}

#[tokio::test]
async fn test_code_form_without_pending_step_goes_to_login() {
    let portal = spawn_portal(mfa_config()).await;
    let client = client();

    let response = client.get(portal.url("/login/mfa")).send().await.unwrap();
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/login");

    // A user without a secret never sees the code step.
    let response = login(&client, &portal, EMPLOYEE, PASSWORD).await;
    assert_eq!(location(&response), "/dashboard");

    portal.stop().await;
}

#[tokio::test]
async fn test_too_many_wrong_codes_restart_sign_in() {
    let portal = spawn_portal(mfa_config()).await;
    let client = client();
    login(&client, &portal, MFA_USER, PASSWORD).await;

    for _ in 0..4 {
        let response = submit_code(&client, &portal, &wrong_code()).await;
        assert_eq!(location(&response), "/login/mfa");
    }
    let response = submit_code(&client, &portal, &wrong_code()).await;
    assert_eq!(location(&response), "/login");

    // The pending step is gone: even the right code is no use now.
    let response = client.get(portal.url("/login/mfa")).send().await.unwrap();
    assert_eq!(location(&response), "/login");

    portal.stop().await;
}
