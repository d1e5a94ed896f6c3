// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for authorization.
//!
//! This module defines the closed vocabulary the rest of the crate reasons in:
//!
//! - **Roles**: the ordered [`Role`] ladder shared by every resource scope
//! - **Scopes**: the resource tiers ([`Scope`]) a permission applies to
//! - **Permissions**: scope-qualified capabilities ([`Permission`])
//! - **Principals**: user emails and group names, compared with [`principal_eq`]
//!
//! Roles arrive on the wire as free-form strings. [`Role::from_name`] is the only
//! place a string becomes a role, and [`Role::as_str`] the only place a role becomes
//! a string again.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// =============================================================================
// Roles
// =============================================================================

/// Roles a principal can hold on a resource.
///
/// Roles are totally ordered by [`Role::level`]. Code must compare levels, never
/// variants, so that a role inserted between two existing ones keeps working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
	/// No role. Grants nothing.
	#[default]
	Unspecified,
	/// Read-only access.
	Viewer,
	/// Read and write access.
	Editor,
	/// Full control, including delete, sharing administration, and creation of children.
	Owner,
}

impl Role {
	/// Returns all roles in ascending level order.
	pub fn all() -> &'static [Role] {
		&[Role::Unspecified, Role::Viewer, Role::Editor, Role::Owner]
	}

	/// Returns the ordinal used for every role comparison.
	pub fn level(self) -> u8 {
		match self {
			Role::Unspecified => 0,
			Role::Viewer => 1,
			Role::Editor => 2,
			Role::Owner => 3,
		}
	}

	/// Returns the role at the given level, or [`Role::Unspecified`] if none exists.
	pub fn from_level(level: u8) -> Role {
		Role::all()
			.iter()
			.copied()
			.find(|role| role.level() == level)
			.unwrap_or(Role::Unspecified)
	}

	/// Parses a persisted role name. Matching is case-insensitive and any
	/// unrecognised input, including the empty string, yields [`Role::Unspecified`].
	pub fn from_name(name: &str) -> Role {
		if name.eq_ignore_ascii_case("viewer") {
			Role::Viewer
		} else if name.eq_ignore_ascii_case("editor") {
			Role::Editor
		} else if name.eq_ignore_ascii_case("owner") {
			Role::Owner
		} else {
			Role::Unspecified
		}
	}

	/// Returns the persisted name of this role.
	pub fn as_str(self) -> &'static str {
		match self {
			Role::Unspecified => "unspecified",
			Role::Viewer => "viewer",
			Role::Editor => "editor",
			Role::Owner => "owner",
		}
	}

	/// Returns true if this role ranks at least as high as `other`.
	pub fn at_least(self, other: Role) -> bool {
		self.level() >= other.level()
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for Role {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for Role {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let name = String::deserialize(deserializer)?;
		Ok(Role::from_name(&name))
	}
}

// =============================================================================
// Scopes
// =============================================================================

/// Resource tiers, nested `Organization ⊃ Project ⊃ Secret`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
	Secret,
	Project,
	Organization,
}

impl Scope {
	/// Returns the scope that directly contains this one, if any.
	pub fn parent(self) -> Option<Scope> {
		match self {
			Scope::Secret => Some(Scope::Project),
			Scope::Project => Some(Scope::Organization),
			Scope::Organization => None,
		}
	}
}

impl fmt::Display for Scope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Scope::Secret => write!(f, "secret"),
			Scope::Project => write!(f, "project"),
			Scope::Organization => write!(f, "organization"),
		}
	}
}

// =============================================================================
// Permissions
// =============================================================================

/// Capabilities checked by console operations, each bound to one [`Scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
	/// Enumerate the secrets of a project (names only).
	SecretsList,
	/// Read secret values.
	SecretsRead,
	SecretsWrite,
	SecretsDelete,
	/// Manage a secret's sharing grants.
	SecretsAdmin,

	ProjectsRead,
	ProjectsWrite,
	ProjectsDelete,
	/// Manage a project's sharing grants.
	ProjectsAdmin,
	/// Create secrets inside a project.
	ProjectsCreate,

	OrganizationsRead,
	OrganizationsWrite,
	OrganizationsDelete,
	/// Manage an organization's sharing grants.
	OrganizationsAdmin,
	/// Create projects inside an organization.
	OrganizationsCreate,
}

impl Permission {
	/// Returns all known permissions.
	pub fn all() -> &'static [Permission] {
		&[
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
		]
	}

	/// Returns the scope this permission is checked at.
	pub fn scope(self) -> Scope {
		match self {
			Permission::SecretsList
			| Permission::SecretsRead
			| Permission::SecretsWrite
			| Permission::SecretsDelete
			| Permission::SecretsAdmin => Scope::Secret,
			Permission::ProjectsRead
			| Permission::ProjectsWrite
			| Permission::ProjectsDelete
			| Permission::ProjectsAdmin
			| Permission::ProjectsCreate => Scope::Project,
			Permission::OrganizationsRead
			| Permission::OrganizationsWrite
			| Permission::OrganizationsDelete
			| Permission::OrganizationsAdmin
			| Permission::OrganizationsCreate => Scope::Organization,
		}
	}

	/// Returns the permission required to edit sharing grants at `scope`.
	pub fn admin_for(scope: Scope) -> Permission {
		match scope {
			Scope::Secret => Permission::SecretsAdmin,
			Scope::Project => Permission::ProjectsAdmin,
			Scope::Organization => Permission::OrganizationsAdmin,
		}
	}

	/// Returns a stable dotted name, e.g. `secrets.read`.
	pub fn as_str(self) -> &'static str {
		match self {
			Permission::SecretsList => "secrets.list",
			Permission::SecretsRead => "secrets.read",
			Permission::SecretsWrite => "secrets.write",
			Permission::SecretsDelete => "secrets.delete",
			Permission::SecretsAdmin => "secrets.admin",
			Permission::ProjectsRead => "projects.read",
			Permission::ProjectsWrite => "projects.write",
			Permission::ProjectsDelete => "projects.delete",
			Permission::ProjectsAdmin => "projects.admin",
			Permission::ProjectsCreate => "projects.create",
			Permission::OrganizationsRead => "organizations.read",
			Permission::OrganizationsWrite => "organizations.write",
			Permission::OrganizationsDelete => "organizations.delete",
			Permission::OrganizationsAdmin => "organizations.admin",
			Permission::OrganizationsCreate => "organizations.create",
		}
	}

	/// Parses a dotted permission name.
	pub fn from_name(name: &str) -> Option<Permission> {
		Permission::all()
			.iter()
			.copied()
			.find(|p| p.as_str().eq_ignore_ascii_case(name))
	}
}

impl fmt::Display for Permission {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

// =============================================================================
// Principals
// =============================================================================

/// Compares two principals (emails or group names) case-insensitively.
///
/// Every lookup in this crate goes through this function; principals are stored
/// exactly as written.
pub fn principal_eq(a: &str, b: &str) -> bool {
	a.chars()
		.flat_map(char::to_lowercase)
		.eq(b.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn role_levels_are_ordered() {
		assert_eq!(Role::Unspecified.level(), 0);
		assert_eq!(Role::Viewer.level(), 1);
		assert_eq!(Role::Editor.level(), 2);
		assert_eq!(Role::Owner.level(), 3);
		assert!(Role::Owner.at_least(Role::Editor));
		assert!(!Role::Viewer.at_least(Role::Editor));
	}

	#[test]
	fn role_from_name_is_case_insensitive() {
		assert_eq!(Role::from_name("viewer"), Role::Viewer);
		assert_eq!(Role::from_name("EDITOR"), Role::Editor);
		assert_eq!(Role::from_name("Owner"), Role::Owner);
	}

	#[test]
	fn role_from_name_degrades_to_unspecified() {
		assert_eq!(Role::from_name(""), Role::Unspecified);
		assert_eq!(Role::from_name("admin"), Role::Unspecified);
		assert_eq!(Role::from_name(" owner"), Role::Unspecified);
	}

	#[test]
	fn role_from_level_roundtrips() {
		for role in Role::all() {
			assert_eq!(Role::from_level(role.level()), *role);
		}
		assert_eq!(Role::from_level(42), Role::Unspecified);
	}

	#[test]
	fn role_deserializes_unknown_names_without_error() {
		let role: Role = serde_json::from_str("\"superuser\"").unwrap();
		assert_eq!(role, Role::Unspecified);
		let role: Role = serde_json::from_str("\"Editor\"").unwrap();
		assert_eq!(role, Role::Editor);
	}

	#[test]
	fn permission_scopes() {
		assert_eq!(Permission::SecretsList.scope(), Scope::Secret);
		assert_eq!(Permission::ProjectsCreate.scope(), Scope::Project);
		assert_eq!(Permission::OrganizationsAdmin.scope(), Scope::Organization);
		for scope in [Scope::Secret, Scope::Project, Scope::Organization] {
			assert_eq!(Permission::admin_for(scope).scope(), scope);
		}
	}

	#[test]
	fn permission_names_parse_back() {
		for permission in Permission::all() {
			assert_eq!(Permission::from_name(permission.as_str()), Some(*permission));
		}
		assert_eq!(Permission::from_name("secrets.peek"), None);
	}

	#[test]
	fn scope_parents() {
		assert_eq!(Scope::Secret.parent(), Some(Scope::Project));
		assert_eq!(Scope::Project.parent(), Some(Scope::Organization));
		assert_eq!(Scope::Organization.parent(), None);
	}

	#[test]
	fn principal_eq_ignores_case() {
		assert!(principal_eq("Alice@Example.com", "alice@example.com"));
		assert!(principal_eq("ENG", "eng"));
		assert!(!principal_eq("alice", "alice2"));
		assert!(!principal_eq("", "a"));
	}

	proptest! {
		#[test]
		fn principal_eq_is_symmetric(a in "[a-zA-Z@.]{0,12}", b in "[a-zA-Z@.]{0,12}") {
			prop_assert_eq!(principal_eq(&a, &b), principal_eq(&b, &a));
		}

		#[test]
		fn principal_eq_matches_uppercased_self(a in "[a-z@.]{0,20}") {
			prop_assert!(principal_eq(&a, &a.to_uppercase()));
		}
	}
}
