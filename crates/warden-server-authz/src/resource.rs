// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resources as the authorizer sees them.
//!
//! A resource carries two persisted grant buckets (users and groups) stored under
//! annotation keys. Projects may name a parent organization; secrets always carry
//! their parent project.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthzResult;
use crate::grant::{active_grants, deduplicate, parse_grants, serialize_grants, ActiveGrantMap, Grant};

/// Default annotation holding user grants.
pub const DEFAULT_USER_GRANTS_ANNOTATION: &str = "warden.dev/user-grants";
/// Default annotation holding group grants.
pub const DEFAULT_GROUP_GRANTS_ANNOTATION: &str = "warden.dev/group-grants";
/// Later-schema name of the group bucket, read when the primary key is absent.
pub const DEFAULT_LEGACY_GROUP_GRANTS_ANNOTATION: &str = "warden.dev/role-grants";

/// The authenticated identity behind a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
	pub email: String,
	#[serde(default)]
	pub groups: Vec<String>,
}

impl Caller {
	pub fn new(email: impl Into<String>, groups: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self {
			email: email.into(),
			groups: groups.into_iter().map(Into::into).collect(),
		}
	}
}

/// Annotation keys under which grant buckets are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantAnnotationKeys {
	pub user_key: String,
	pub group_key: String,
	pub legacy_group_key: String,
}

impl Default for GrantAnnotationKeys {
	fn default() -> Self {
		Self {
			user_key: DEFAULT_USER_GRANTS_ANNOTATION.to_string(),
			group_key: DEFAULT_GROUP_GRANTS_ANNOTATION.to_string(),
			legacy_group_key: DEFAULT_LEGACY_GROUP_GRANTS_ANNOTATION.to_string(),
		}
	}
}

/// Settings the [`Authorizer`](crate::Authorizer) is constructed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthzSettings {
	/// Whether project checks may fall back to organization grants.
	pub org_cascade_enabled: bool,
	pub annotations: GrantAnnotationKeys,
}

impl Default for AuthzSettings {
	fn default() -> Self {
		Self {
			org_cascade_enabled: true,
			annotations: GrantAnnotationKeys::default(),
		}
	}
}

/// The two persisted grant buckets of one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceGrants {
	pub users: Vec<Grant>,
	pub groups: Vec<Grant>,
}

impl ResourceGrants {
	pub fn new(users: Vec<Grant>, groups: Vec<Grant>) -> Self {
		Self { users, groups }
	}

	/// Decodes both buckets from a resource's annotations.
	///
	/// Missing annotations yield empty buckets. A malformed annotation is an error,
	/// and the caller must treat the resource as unreadable.
	pub fn from_annotations(
		annotations: &BTreeMap<String, String>,
		keys: &GrantAnnotationKeys,
	) -> AuthzResult<Self> {
		let users = parse_grants(
			&keys.user_key,
			annotations.get(&keys.user_key).map(String::as_str),
		)?;

		let groups = match annotations.get(&keys.group_key) {
			Some(raw) => parse_grants(&keys.group_key, Some(raw.as_str()))?,
			None => parse_grants(
				&keys.legacy_group_key,
				annotations.get(&keys.legacy_group_key).map(String::as_str),
			)?,
		};

		Ok(Self { users, groups })
	}

	/// Encodes both buckets under the primary keys. Empty buckets encode as `[]`.
	pub fn to_annotations(
		&self,
		keys: &GrantAnnotationKeys,
	) -> Result<BTreeMap<String, String>, serde_json::Error> {
		let mut out = BTreeMap::new();
		out.insert(keys.user_key.clone(), serialize_grants(&self.users)?);
		out.insert(keys.group_key.clone(), serialize_grants(&self.groups)?);
		Ok(out)
	}

	/// Filters both buckets to the grants usable at `now`, then keeps each
	/// principal's highest live role.
	pub fn active(&self, now: DateTime<Utc>) -> ActiveGrants {
		ActiveGrants {
			users: active_bucket(&self.users, now),
			groups: active_bucket(&self.groups, now),
		}
	}
}

fn active_bucket(grants: &[Grant], now: DateTime<Utc>) -> ActiveGrantMap {
	let live: Vec<Grant> = grants
		.iter()
		.filter(|g| g.is_active_at(now))
		.cloned()
		.collect();
	active_grants(&deduplicate(&live), now)
}

/// Active grant maps for both buckets of one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveGrants {
	pub users: ActiveGrantMap,
	pub groups: ActiveGrantMap,
}

impl ActiveGrants {
	pub fn new(users: ActiveGrantMap, groups: ActiveGrantMap) -> Self {
		Self { users, groups }
	}

	pub fn is_empty(&self) -> bool {
		self.users.is_empty() && self.groups.is_empty()
	}
}

/// A project and, when it belongs to one, its organization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectResource {
	pub name: String,
	pub organization: Option<String>,
	pub grants: ResourceGrants,
}

impl ProjectResource {
	pub fn new(name: impl Into<String>, grants: ResourceGrants) -> Self {
		Self {
			name: name.into(),
			organization: None,
			grants,
		}
	}

	pub fn in_organization(mut self, organization: impl Into<String>) -> Self {
		self.organization = Some(organization.into());
		self
	}
}

/// A secret together with the project that contains it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretResource {
	pub name: String,
	pub grants: ResourceGrants,
	pub project: ProjectResource,
}

impl SecretResource {
	pub fn new(name: impl Into<String>, grants: ResourceGrants, project: ProjectResource) -> Self {
		Self {
			name: name.into(),
			grants,
			project,
		}
	}
}
