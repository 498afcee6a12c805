//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;

use attendance_portal::auth::identity::{Role, TenantId, UserId};
use attendance_portal::auth::password::hash_password_with_cost;
use attendance_portal::auth::totp;
use attendance_portal::config::{PortalConfig, TenantSeed, UserSeed};
use attendance_portal::http::{AppState, HttpServer};
use attendance_portal::records::unix_now;
use attendance_portal::Shutdown;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const PASSWORD: &str = "correct horse battery staple";

pub const EMPLOYEE: &str = "erin@acme.test";
pub const TENANT_ADMIN: &str = "alex@acme.test";
pub const PLATFORM_ADMIN: &str = "pat@platform.test";
pub const DISABLED: &str = "dana@acme.test";
pub const SUSPENDED_TENANT_USER: &str = "sam@initech.test";
pub const MFA_USER: &str = "max@acme.test";

/// Raw TOTP secret of `MFA_USER`.
pub const TOTP_SEED: &[u8] = b"12345678901234567890123456789012";

pub const ACME: TenantId = TenantId(1);
pub const INITECH: TenantId = TenantId(2);

/// A portal running on an ephemeral port.
pub struct TestPortal {
    pub addr: SocketAddr,
    pub base: String,
    pub state: AppState,
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

impl TestPortal {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.task.await;
    }
}

fn user(id: u64, email: &str, role: Role, tenant: Option<TenantId>, active: bool) -> UserSeed {
    UserSeed {
        id: UserId(id),
        email: email.to_string(),
        name: email.split('@').next().unwrap_or(email).to_string(),
        role,
        tenant_id: tenant,
        // Minimal argon2 cost keeps the suite fast.
        password_hash: hash_password_with_cost(PASSWORD, 8, 1).unwrap(),
        totp_secret: None,
        active,
    }
}

/// Two tenants (Initech suspended) and one account per interesting state.
pub fn seeded_config() -> PortalConfig {
    let mut config = PortalConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.tenants = vec![
        TenantSeed { id: ACME, name: "Acme".into(), active: true },
        TenantSeed { id: INITECH, name: "Initech".into(), active: false },
    ];
    config.users = vec![
        user(1, EMPLOYEE, Role::Employee, Some(ACME), true),
        user(2, TENANT_ADMIN, Role::TenantAdmin, Some(ACME), true),
        user(3, PLATFORM_ADMIN, Role::PlatformAdmin, None, true),
        user(4, DISABLED, Role::Employee, Some(ACME), false),
        user(5, SUSPENDED_TENANT_USER, Role::Employee, Some(INITECH), true),
    ];
    config
}

/// The seeded accounts plus `MFA_USER`, who signs in with a TOTP code.
pub fn mfa_config() -> PortalConfig {
    let mut config = seeded_config();
    let mut seed = user(6, MFA_USER, Role::Employee, Some(ACME), true);
    seed.totp_secret = Some(URL_SAFE_NO_PAD.encode(TOTP_SEED));
    config.users.push(seed);
    config
}

/// The code `MFA_USER`'s authenticator shows right now.
pub fn current_code() -> String {
    totp::code_at(TOTP_SEED, unix_now()).unwrap()
}

pub async fn spawn_portal(config: PortalConfig) -> TestPortal {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config).unwrap();
    let state = server.state().clone();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    let task = tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    TestPortal {
        addr,
        base: format!("http://{}", addr),
        state,
        shutdown,
        task,
    }
}

pub async fn spawn_seeded() -> TestPortal {
    spawn_portal(seeded_config()).await
}

/// Browser-like client: keeps cookies, does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Pull the hidden CSRF field out of a rendered page.
pub fn extract_csrf(html: &str) -> Option<String> {
    let marker = "name=\"csrf_token\" value=\"";
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('"')?;
    Some(html[start..start + end].to_string())
}

/// GET /login and return the form's CSRF token.
pub async fn login_token(client: &reqwest::Client, portal: &TestPortal) -> String {
    let html = client
        .get(portal.url("/login"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    extract_csrf(&html).expect("login form carries a CSRF token")
}

/// Full login flow; returns the POST /login response.
pub async fn login(
    client: &reqwest::Client,
    portal: &TestPortal,
    email: &str,
    password: &str,
) -> reqwest::Response {
    let token = login_token(client, portal).await;
    client
        .post(portal.url("/login"))
        .form(&[("email", email), ("password", password), ("csrf_token", token.as_str())])
        .send()
        .await
        .unwrap()
}

/// Log in and return the post-login CSRF token from the dashboard.
pub async fn signed_in(client: &reqwest::Client, portal: &TestPortal, email: &str) -> String {
    let response = login(client, portal, email, PASSWORD).await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/dashboard");
    let html = client
        .get(portal.url("/dashboard"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    extract_csrf(&html).expect("dashboard carries a CSRF token")
}

pub fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
