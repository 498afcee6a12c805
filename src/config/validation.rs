//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (users reference existing tenants)
//! - Validate value ranges (lifetimes > 0, addresses parse)
//! - Detect duplicate accounts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PortalConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderValue;

use crate::auth::identity::{Role, TenantId, UserId};
use crate::auth::{password, totp};
use crate::config::schema::PortalConfig;
use crate::session::manager::MAX_LIFETIME_SECS;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid address for {field}: {value}")]
    InvalidAddress { field: &'static str, value: String },
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("session.cookie_name contains characters not allowed in a cookie name")]
    InvalidCookieName,
    #[error("security.content_security_policy is not a valid header value")]
    InvalidCsp,
    #[error("duplicate tenant id {0}")]
    DuplicateTenant(TenantId),
    #[error("duplicate user id {0}")]
    DuplicateUserId(UserId),
    #[error("duplicate user email {0}")]
    DuplicateEmail(String),
    #[error("user {user} references unknown tenant {tenant}")]
    UnknownTenant { user: UserId, tenant: TenantId },
    #[error("user {0} must belong to a tenant")]
    MissingTenant(UserId),
    #[error("user {0} has a malformed password hash")]
    InvalidPasswordHash(UserId),
    #[error("user {user} has an unusable TOTP secret: {reason}")]
    InvalidTotpSecret { user: UserId, reason: totp::TotpError },
    #[error("session.lifetime_secs must not exceed {MAX_LIFETIME_SECS}")]
    LifetimeTooLong,
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &PortalConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.trim().is_empty() {
            errors.push(ValidationError::Empty("listener.tls.cert_path"));
        }
        if tls.key_path.trim().is_empty() {
            errors.push(ValidationError::Empty("listener.tls.key_path"));
        }
    }

    let session = &config.session;
    if session.cookie_name.is_empty() {
        errors.push(ValidationError::Empty("session.cookie_name"));
    } else if !session
        .cookie_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        errors.push(ValidationError::InvalidCookieName);
    }
    if session.lifetime_secs == 0 {
        errors.push(ValidationError::Zero("session.lifetime_secs"));
    } else if session.lifetime_secs > MAX_LIFETIME_SECS {
        errors.push(ValidationError::LifetimeTooLong);
    }
    if session.sweep_interval_secs == 0 {
        errors.push(ValidationError::Zero("session.sweep_interval_secs"));
    }

    let csp = &config.security.content_security_policy;
    if csp.trim().is_empty() {
        errors.push(ValidationError::Empty("security.content_security_policy"));
    } else if HeaderValue::from_str(csp).is_err() {
        errors.push(ValidationError::InvalidCsp);
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero("security.max_body_size"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    validate_accounts(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_accounts(config: &PortalConfig, errors: &mut Vec<ValidationError>) {
    let mut tenant_ids = HashSet::new();
    for tenant in &config.tenants {
        if !tenant_ids.insert(tenant.id) {
            errors.push(ValidationError::DuplicateTenant(tenant.id));
        }
    }

    let mut user_ids = HashSet::new();
    let mut emails = HashSet::new();
    for user in &config.users {
        if !user_ids.insert(user.id) {
            errors.push(ValidationError::DuplicateUserId(user.id));
        }
        if !emails.insert(user.email.to_lowercase()) {
            errors.push(ValidationError::DuplicateEmail(user.email.clone()));
        }
        match user.tenant_id {
            Some(tenant) if !tenant_ids.contains(&tenant) => {
                errors.push(ValidationError::UnknownTenant { user: user.id, tenant });
            }
            None if user.role != Role::PlatformAdmin => {
                errors.push(ValidationError::MissingTenant(user.id));
            }
            _ => {}
        }
        if !password::is_well_formed(&user.password_hash) {
            errors.push(ValidationError::InvalidPasswordHash(user.id));
        }
        if let Some(Err(reason)) = user.totp_secret.as_deref().map(totp::decode_secret) {
            errors.push(ValidationError::InvalidTotpSecret { user: user.id, reason });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{TenantSeed, UserSeed};

    fn seed_user(id: u64, email: &str, role: Role, tenant: Option<u64>) -> UserSeed {
        UserSeed {
            id: UserId(id),
            email: email.to_string(),
            name: "Test".to_string(),
            role,
            tenant_id: tenant.map(TenantId),
            password_hash: password::hash_password_with_cost("pw", 8, 1).unwrap(),
            totp_secret: None,
            active: true,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&PortalConfig::default()).is_ok());
    }

    #[test]
    fn test_bad_bind_address() {
        let mut config = PortalConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidAddress { .. }));
    }

    #[test]
    fn test_account_integrity() {
        let mut config = PortalConfig::default();
        config.tenants.push(TenantSeed { id: TenantId(1), name: "Acme".into(), active: true });
        config.users.push(seed_user(1, "a@acme.test", Role::Employee, Some(1)));
        config.users.push(seed_user(1, "A@acme.test", Role::Employee, Some(2)));
        config.users.push(seed_user(3, "c@acme.test", Role::TenantAdmin, None));
        config.users.push(seed_user(4, "root@platform.test", Role::PlatformAdmin, None));

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateUserId(UserId(1))));
        assert!(errors.contains(&ValidationError::DuplicateEmail("A@acme.test".into())));
        assert!(errors.contains(&ValidationError::UnknownTenant { user: UserId(1), tenant: TenantId(2) }));
        assert!(errors.contains(&ValidationError::MissingTenant(UserId(3))));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_malformed_password_hash() {
        let mut config = PortalConfig::default();
        let mut user = seed_user(9, "root@platform.test", Role::PlatformAdmin, None);
        user.password_hash = "plaintext".to_string();
        config.users.push(user);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidPasswordHash(UserId(9))]);
    }

    #[test]
    fn test_totp_secret_must_decode() {
        let mut config = PortalConfig::default();
        let mut short = seed_user(1, "a@platform.test", Role::PlatformAdmin, None);
        short.totp_secret = Some("c2hvcnQ".into());
        let mut garbled = seed_user(2, "b@platform.test", Role::PlatformAdmin, None);
        garbled.totp_secret = Some("not base64!".into());
        let mut good = seed_user(3, "c@platform.test", Role::PlatformAdmin, None);
        good.totp_secret = Some("MTIzNDU2Nzg5MDEyMzQ1Njc4OTAxMjM0NTY3ODkwMTI".into());
        config.users.extend([short, garbled, good]);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidTotpSecret { user: UserId(1), reason: totp::TotpError::TooShort },
                ValidationError::InvalidTotpSecret { user: UserId(2), reason: totp::TotpError::Encoding },
            ]
        );
    }

    #[test]
    fn test_session_lifetime_is_bounded() {
        let mut config = PortalConfig::default();
        config.session.lifetime_secs = MAX_LIFETIME_SECS + 1;
        assert_eq!(validate_config(&config).unwrap_err(), vec![ValidationError::LifetimeTooLong]);
    }
}
