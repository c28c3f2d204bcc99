// SPDX-License-Identifier: Apache-2.0
//! Role management and system-role bootstrap.

use chrono::Utc;

use atrium_core::rbac::{PermissionKey, Role, SystemRole};
use atrium_core::{Error, Result, RoleId};
use atrium_store::{RoleStore, Stores};

use crate::{store_err, Actor};

/// One permission catalog entry, for role-editor UIs.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionInfo {
    /// Wire key.
    pub key: PermissionKey,
    /// Human-readable description.
    pub description: &'static str,
}

/// Permission keys clustered by display group.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGroup {
    /// Group label ("CMS", "Graph", …).
    pub group: &'static str,
    /// Keys in the group, in catalog order.
    pub items: Vec<PermissionInfo>,
}

/// Seeds the system roles if any are missing. Idempotent; the daemon runs
/// this at startup so a fresh database is usable immediately.
pub async fn bootstrap_system_roles(stores: &Stores) -> Result<()> {
    for role in SystemRole::ALL {
        if stores
            .roles
            .system_role(role.name())
            .await
            .map_err(store_err)?
            .is_none()
        {
            stores
                .roles
                .insert(&Role {
                    id: RoleId::generate(),
                    org: None,
                    name: role.name().to_owned(),
                    description: role.description().to_owned(),
                    is_system: true,
                    permissions: role.permissions(),
                    created_at: Utc::now(),
                })
                .await
                .map_err(store_err)?;
        }
    }
    Ok(())
}

/// Role listing, custom role creation, and the permission catalog.
#[derive(Clone)]
pub struct RoleService {
    stores: Stores,
}

impl RoleService {
    /// Builds the service over a storage bundle.
    #[must_use]
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// System roles plus the caller's org-scoped custom roles.
    pub async fn list_roles(&self, actor: Actor) -> Result<Vec<Role>> {
        self.stores
            .roles
            .roles_visible_to(actor.org)
            .await
            .map_err(store_err)
    }

    /// Creates a custom role scoped to the caller's organization.
    pub async fn create_custom_role(
        &self,
        actor: Actor,
        name: &str,
        description: &str,
        permissions: Vec<PermissionKey>,
    ) -> Result<Role> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("role name is required".into()));
        }
        if SystemRole::ALL.iter().any(|r| r.name().eq_ignore_ascii_case(name)) {
            return Err(Error::InvalidInput(
                "role name collides with a system role".into(),
            ));
        }
        let role = Role {
            id: RoleId::generate(),
            org: Some(actor.org),
            name: name.to_owned(),
            description: description.to_owned(),
            is_system: false,
            permissions,
            created_at: Utc::now(),
        };
        self.stores.roles.insert(&role).await.map_err(store_err)?;
        Ok(role)
    }

    /// The full permission catalog, grouped for display.
    #[must_use]
    pub fn permission_catalog(&self) -> Vec<PermissionGroup> {
        let mut groups: Vec<PermissionGroup> = Vec::new();
        for key in PermissionKey::ALL {
            let info = PermissionInfo {
                key,
                description: key.description(),
            };
            match groups.iter_mut().find(|g| g.group == key.group()) {
                Some(group) => group.items.push(info),
                None => groups.push(PermissionGroup {
                    group: key.group(),
                    items: vec![info],
                }),
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use atrium_store_mem::MemBackend;

    use super::*;

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let stores = MemBackend::new().stores();
        bootstrap_system_roles(&stores).await.unwrap();
        bootstrap_system_roles(&stores).await.unwrap();
        let owner = stores.roles.system_role("Owner").await.unwrap().unwrap();
        assert_eq!(owner.permissions, PermissionKey::ALL.to_vec());
        let visible = stores
            .roles
            .roles_visible_to(atrium_core::OrgId::generate())
            .await
            .unwrap();
        assert_eq!(visible.len(), 3);
    }

    #[tokio::test]
    async fn custom_role_cannot_shadow_system_names() {
        let stores = MemBackend::new().stores();
        let service = RoleService::new(stores);
        let actor = Actor {
            user: atrium_core::UserId::generate(),
            org: atrium_core::OrgId::generate(),
        };
        let err = service
            .create_custom_role(actor, "owner", "", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn catalog_groups_follow_key_order() {
        let service = RoleService::new(MemBackend::new().stores());
        let catalog = service.permission_catalog();
        let groups: Vec<_> = catalog.iter().map(|g| g.group).collect();
        assert_eq!(groups, vec!["CMS", "Graph", "Org", "Team", "Media"]);
        assert_eq!(
            catalog.iter().map(|g| g.items.len()).sum::<usize>(),
            PermissionKey::ALL.len()
        );
    }
}
