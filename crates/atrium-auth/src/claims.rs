// SPDX-License-Identifier: Apache-2.0
//! Access-token claims and the guard predicates evaluated against them.

use atrium_core::rbac::PermissionKey;
use atrium_core::{Error, OrgId, UserId};

/// Claims embedded in a session token.
///
/// Authoritative for the lifetime of a request: guards read only this
/// struct, never the database.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AccessClaims {
    /// Authenticated user.
    #[serde(rename = "user_id")]
    pub user: UserId,
    /// Login email at mint time.
    pub email: String,
    /// Active tenant for this session.
    #[serde(rename = "org_id")]
    pub org: OrgId,
    /// Role name at mint time (display only; guards use `perms`).
    pub role: String,
    /// Effective permission set, resolved at mint time.
    pub perms: Vec<PermissionKey>,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

impl AccessClaims {
    /// Whether the claims grant `key`.
    #[must_use]
    pub fn has_permission(&self, key: PermissionKey) -> bool {
        self.perms.contains(&key)
    }

    /// Guard: fails with [`Error::MissingPermission`] when `key` is absent.
    pub fn require(&self, key: PermissionKey) -> Result<(), Error> {
        if self.has_permission(key) {
            Ok(())
        } else {
            Err(Error::MissingPermission(key))
        }
    }

    /// Tenant guard: an explicitly requested tenant must match the token's
    /// active organization.
    pub fn require_tenant(&self, requested: Option<OrgId>) -> Result<(), Error> {
        match requested {
            Some(org) if org != self.org => Err(Error::TenantMismatch),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(perms: Vec<PermissionKey>) -> AccessClaims {
        AccessClaims {
            user: UserId::generate(),
            email: "a@x.io".into(),
            org: OrgId::generate(),
            role: "Editor".into(),
            perms,
            iat: 0,
            exp: i64::MAX,
        }
    }

    #[test]
    fn require_passes_when_granted() {
        let c = claims(vec![PermissionKey::GraphEdit]);
        assert!(c.require(PermissionKey::GraphEdit).is_ok());
    }

    #[test]
    fn require_fails_closed() {
        let c = claims(vec![]);
        assert_eq!(
            c.require(PermissionKey::GraphPublish),
            Err(Error::MissingPermission(PermissionKey::GraphPublish))
        );
    }

    #[test]
    fn tenant_guard_accepts_missing_header_and_own_org() {
        let c = claims(vec![]);
        assert!(c.require_tenant(None).is_ok());
        assert!(c.require_tenant(Some(c.org)).is_ok());
    }

    #[test]
    fn tenant_guard_rejects_foreign_org() {
        let c = claims(vec![]);
        assert_eq!(
            c.require_tenant(Some(OrgId::generate())),
            Err(Error::TenantMismatch)
        );
    }
}
