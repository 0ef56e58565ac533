//! Authentication types for JWT pass-through identity.
//!
//! Vidya does not own login or registration; tokens are minted by the
//! upstream identity service using a shared secret. This module only
//! carries the claims shape and the role-tier helper the fee engine needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role names that count as admin-tier for fee policy checks.
const ADMIN_TIER_ROLES: [&str; 3] = ["SUPER_ADMIN", "PLATFORM_ADMIN", "ADMIN"];

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Tenant ID (current school context).
    pub tid: Uuid,
    /// User's role within the tenant.
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, tenant_id: Uuid, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            tid: tenant_id,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the tenant ID from claims.
    #[must_use]
    pub const fn tenant_id(&self) -> Uuid {
        self.tid
    }

    /// Returns true if the role is admin-tier (may author catalog and
    /// template rows, and approve high-value discounts).
    #[must_use]
    pub fn is_admin_tier(&self) -> bool {
        ADMIN_TIER_ROLES
            .iter()
            .any(|r| self.role.eq_ignore_ascii_case(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_claims(role: &str) -> Claims {
        Claims::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            role,
            Utc::now() + Duration::minutes(15),
        )
    }

    #[test]
    fn test_admin_tier_roles() {
        assert!(make_claims("ADMIN").is_admin_tier());
        assert!(make_claims("SUPER_ADMIN").is_admin_tier());
        assert!(make_claims("PLATFORM_ADMIN").is_admin_tier());
        assert!(make_claims("admin").is_admin_tier());
    }

    #[test]
    fn test_non_admin_tier_roles() {
        assert!(!make_claims("ACCOUNTANT").is_admin_tier());
        assert!(!make_claims("TEACHER").is_admin_tier());
        assert!(!make_claims("").is_admin_tier());
    }

    #[test]
    fn test_claims_accessors() {
        let user_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();
        let claims = Claims::new(user_id, tenant_id, "ADMIN", Utc::now() + Duration::hours(1));
        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.tenant_id(), tenant_id);
        assert!(claims.exp > claims.iat);
    }
}
