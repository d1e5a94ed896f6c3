// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Best-role resolution and the grant check.
//!
//! Both functions scan the caller's email against the user bucket and each of the
//! caller's groups against the group bucket, folding every match into one maximum
//! role level. Matching is case-insensitive.

use tracing::{debug, instrument};

use super::roles::has_permission;
use crate::error::{AuthzError, AuthzResult};
use crate::grant::ActiveGrantMap;
use crate::types::{Permission, Role};

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
	Allowed,
	Denied,
}

impl Decision {
	pub fn is_allowed(self) -> bool {
		matches!(self, Decision::Allowed)
	}

	/// Converts a denial into [`AuthzError::PermissionDenied`].
	pub fn into_result(self) -> AuthzResult<()> {
		match self {
			Decision::Allowed => Ok(()),
			Decision::Denied => Err(AuthzError::PermissionDenied),
		}
	}
}

impl From<bool> for Decision {
	fn from(allowed: bool) -> Self {
		if allowed {
			Decision::Allowed
		} else {
			Decision::Denied
		}
	}
}

fn max_matching_level(
	email: &str,
	groups: &[String],
	users: &ActiveGrantMap,
	group_grants: &ActiveGrantMap,
) -> u8 {
	let from_users = users.matching(email).map(Role::level).max().unwrap_or(0);
	let from_groups = groups
		.iter()
		.flat_map(|group| group_grants.matching(group))
		.map(Role::level)
		.max()
		.unwrap_or(0);
	from_users.max(from_groups)
}

/// Returns the highest role the caller holds across both grant buckets.
///
/// Returns [`Role::Unspecified`] when nothing matches.
pub fn best_role(
	email: &str,
	groups: &[String],
	users: &ActiveGrantMap,
	group_grants: &ActiveGrantMap,
) -> Role {
	Role::from_level(max_matching_level(email, groups, users, group_grants))
}

/// Decides whether the caller's grants carry `permission`.
///
/// Only the maximum matching level is tested. Role permission sets grow with level,
/// so a lower level can never hold a permission the top one lacks.
#[instrument(level = "debug", skip(email, groups, users, group_grants), fields(permission = %permission))]
pub fn check_grants(
	email: &str,
	groups: &[String],
	users: &ActiveGrantMap,
	group_grants: &ActiveGrantMap,
	permission: Permission,
) -> Decision {
	let level = max_matching_level(email, groups, users, group_grants);
	let allowed = Role::all()
		.iter()
		.filter(|role| role.level() == level)
		.any(|role| has_permission(*role, permission));

	if !allowed {
		debug!(permission = %permission, "grant check denied");
	}
	Decision::from(allowed)
}
