// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scope cascade tables.
//!
//! A cascade lets a grant on a containing resource satisfy a check on a contained
//! one. Each directed scope pair has its own table, and a permission missing from
//! a table never cascades.
//!
//! ```text
//! Secret  ← Project       list/write/delete/admin only; reading values never cascades
//! Secret  ← Organization  nothing
//! Project ← Organization  same verb at organization scope
//! anything ← narrower     nothing (permissions never flow upward)
//! ```

use crate::types::{Permission, Scope};

/// One row of a cascade table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeRule {
	/// Permission checked at the narrower scope.
	pub required: Permission,
	/// Permission at the broader scope that satisfies it, or `None` for "never".
	pub substitute: Option<Permission>,
}

const fn rule(required: Permission, substitute: Option<Permission>) -> CascadeRule {
	CascadeRule {
		required,
		substitute,
	}
}

const SECRET_FROM_PROJECT: &[CascadeRule] = &[
	rule(Permission::SecretsList, Some(Permission::ProjectsRead)),
	rule(Permission::SecretsRead, None),
	rule(Permission::SecretsWrite, Some(Permission::ProjectsWrite)),
	rule(Permission::SecretsDelete, Some(Permission::ProjectsAdmin)),
	rule(Permission::SecretsAdmin, Some(Permission::ProjectsAdmin)),
];

const SECRET_FROM_ORGANIZATION: &[CascadeRule] = &[
	rule(Permission::SecretsList, None),
	rule(Permission::SecretsRead, None),
	rule(Permission::SecretsWrite, None),
	rule(Permission::SecretsDelete, None),
	rule(Permission::SecretsAdmin, None),
];

const PROJECT_FROM_ORGANIZATION: &[CascadeRule] = &[
	rule(Permission::ProjectsRead, Some(Permission::OrganizationsRead)),
	rule(Permission::ProjectsWrite, Some(Permission::OrganizationsWrite)),
	rule(Permission::ProjectsDelete, Some(Permission::OrganizationsDelete)),
	rule(Permission::ProjectsAdmin, Some(Permission::OrganizationsAdmin)),
	rule(Permission::ProjectsCreate, Some(Permission::OrganizationsCreate)),
];

/// Returns the cascade table from `source` scope grants into `target` scope checks.
///
/// Pairs with no table (same scope, or a narrower source) return an empty slice.
pub fn cascade_rules(target: Scope, source: Scope) -> &'static [CascadeRule] {
	match (target, source) {
		(Scope::Secret, Scope::Project) => SECRET_FROM_PROJECT,
		(Scope::Secret, Scope::Organization) => SECRET_FROM_ORGANIZATION,
		(Scope::Project, Scope::Organization) => PROJECT_FROM_ORGANIZATION,
		_ => &[],
	}
}

/// Returns the permission a `source` scope grant must carry to stand in for
/// `required`, or `None` if no cascade path exists.
pub fn cascade_permission(required: Permission, source: Scope) -> Option<Permission> {
	cascade_rules(required.scope(), source)
		.iter()
		.find(|r| r.required == required)
		.and_then(|r| r.substitute)
}
