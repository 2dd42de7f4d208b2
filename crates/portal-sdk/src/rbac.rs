//! Service permissions of a user.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::{PortalError, PortalResult};

/// A permission granted for a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    /// Permission ID (a UUID).
    pub id: String,
    /// Human-readable identifier.
    pub slug: String,
    /// Code of the service the permission belongs to.
    pub service: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserAccessControl {
    access_control: AccessControl,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessControl {
    service_permissions: Vec<ServiceEntry>,
}

#[derive(Deserialize)]
struct ServiceEntry {
    service: ServiceCode,
    permissions: Vec<PermissionEntry>,
}

#[derive(Deserialize)]
struct ServiceCode {
    code: String,
}

#[derive(Deserialize)]
struct PermissionEntry {
    id: String,
    slug: String,
}

/// Indexed permissions, in response order.
///
/// Only the services that were asked for are present, so a missing permission
/// may still be granted for another service.
#[derive(Debug, Clone, Default)]
pub struct ServicePermissions {
    permissions: Vec<Permission>,
    by_service: HashMap<String, Vec<usize>>,
    by_id: HashMap<String, usize>,
    by_slug: HashMap<String, usize>,
}

impl ServicePermissions {
    /// Index the `user` object of a permissions query response.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::ResponseShape`] when
    /// `accessControl.servicePermissions` or any entry's service code,
    /// permission ID or slug is missing.
    pub fn build(user: &Value) -> PortalResult<Self> {
        let user = UserAccessControl::deserialize(user)
            .map_err(|err| PortalError::ResponseShape(format!("service permissions: {err}")))?;

        let mut index = Self::default();
        for entry in user.access_control.service_permissions {
            let service = entry.service.code;
            for permission in entry.permissions {
                index.push(Permission {
                    id: permission.id,
                    slug: permission.slug,
                    service: service.clone(),
                });
            }
        }
        Ok(index)
    }

    fn push(&mut self, permission: Permission) {
        let position = self.permissions.len();
        self.by_service
            .entry(permission.service.clone())
            .or_default()
            .push(position);
        self.by_id.insert(permission.id.clone(), position);
        self.by_slug.insert(permission.slug.clone(), position);
        self.permissions.push(permission);
    }

    /// Permissions in response order.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    /// Number of indexed permissions.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// No permissions at all.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Permission with the given ID.
    pub fn by_id(&self, id: &str) -> Option<&Permission> {
        self.by_id.get(id).map(|&position| &self.permissions[position])
    }

    /// Permission with the given slug.
    pub fn by_slug_key(&self, slug: &str) -> Option<&Permission> {
        self.by_slug
            .get(slug)
            .map(|&position| &self.permissions[position])
    }

    /// Permissions of one service, in response order.
    pub fn for_service<'a>(
        &'a self,
        service: &str,
    ) -> impl Iterator<Item = &'a Permission> + use<'a> {
        self.by_service
            .get(service)
            .into_iter()
            .flatten()
            .map(|&position| &self.permissions[position])
    }

    /// True when `id_or_slug` names an indexed permission.
    ///
    /// IDs and slugs share one namespace here: a slug that equals another
    /// permission's ID counts as present.
    pub fn has(&self, id_or_slug: &str) -> bool {
        self.by_slug.contains_key(id_or_slug) || self.by_id.contains_key(id_or_slug)
    }

    /// Slugs grouped by service code.
    pub fn by_slug(&self) -> HashMap<String, Vec<String>> {
        let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
        for permission in &self.permissions {
            grouped
                .entry(permission.service.clone())
                .or_default()
                .push(permission.slug.clone());
        }
        grouped
    }
}

impl<'a> IntoIterator for &'a ServicePermissions {
    type Item = &'a Permission;
    type IntoIter = std::slice::Iter<'a, Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.permissions.iter()
    }
}
