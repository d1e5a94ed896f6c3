// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role to permission table.

use crate::types::{Permission, Role};

const VIEWER: &[Permission] = &[
	Permission::SecretsList,
	Permission::SecretsRead,
	Permission::ProjectsRead,
	Permission::OrganizationsRead,
];

const EDITOR: &[Permission] = &[
	Permission::SecretsList,
	Permission::SecretsRead,
	Permission::SecretsWrite,
	Permission::ProjectsRead,
	Permission::ProjectsWrite,
	Permission::OrganizationsRead,
	Permission::OrganizationsWrite,
];

const OWNER: &[Permission] = &[
	Permission::SecretsList,
	Permission::SecretsRead,
	Permission::SecretsWrite,
	Permission::SecretsDelete,
	Permission::SecretsAdmin,
	Permission::ProjectsRead,
	Permission::ProjectsWrite,
	Permission::ProjectsDelete,
	Permission::ProjectsAdmin,
	Permission::ProjectsCreate,
	Permission::OrganizationsRead,
	Permission::OrganizationsWrite,
	Permission::OrganizationsDelete,
	Permission::OrganizationsAdmin,
	Permission::OrganizationsCreate,
];

/// Returns the permissions granted by `role`.
///
/// Each role's set contains every permission of the roles below it.
pub fn permissions_for(role: Role) -> &'static [Permission] {
	match role {
		Role::Unspecified => &[],
		Role::Viewer => VIEWER,
		Role::Editor => EDITOR,
		Role::Owner => OWNER,
	}
}

/// Returns true if `role` carries `permission`.
pub fn has_permission(role: Role, permission: Permission) -> bool {
	permissions_for(role).contains(&permission)
}
