// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sharing grants: persisted form, time windows, and deduplication.
//!
//! A resource carries two lists of [`Grant`] records, one keyed by user email and
//! one keyed by group name. On disk each list is a JSON array:
//!
//! ```text
//! [{"principal":"alice@example.com","role":"owner","exp":1767225600}]
//! ```
//!
//! At check time a list is reduced to an [`ActiveGrantMap`] for a reference instant.
//! The window is inclusive on `nbf` and exclusive on `exp`: a grant expiring at
//! `now` is already gone, a grant starting at `now` is already usable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AuthzError, AuthzResult};
use crate::types::{principal_eq, Role};

/// A principal-to-role assignment with an optional validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
	/// User email or group name, stored as written.
	#[serde(default)]
	pub principal: String,
	#[serde(default)]
	pub role: Role,
	/// Not-before, Unix seconds. Absent means active since the beginning of time.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub nbf: Option<i64>,
	/// Expiry, Unix seconds. Absent means the grant never expires.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exp: Option<i64>,
}

impl Grant {
	/// Creates a grant with no time bounds.
	pub fn new(principal: impl Into<String>, role: Role) -> Self {
		Self {
			principal: principal.into(),
			role,
			nbf: None,
			exp: None,
		}
	}

	/// Builder: set the not-before instant.
	pub fn with_not_before(mut self, at: DateTime<Utc>) -> Self {
		self.nbf = Some(at.timestamp());
		self
	}

	/// Builder: set the expiry instant.
	pub fn with_expiry(mut self, at: DateTime<Utc>) -> Self {
		self.exp = Some(at.timestamp());
		self
	}

	/// Returns true if the grant is usable at `now`.
	pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
		let now = now.timestamp();
		let started = self.nbf.is_none_or(|nbf| nbf <= now);
		let unexpired = self.exp.is_none_or(|exp| exp > now);
		started && unexpired
	}

	/// Returns true if the grant can never become usable again after `now`.
	pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
		self.exp.is_some_and(|exp| exp <= now.timestamp())
	}
}

// =============================================================================
// Codec
// =============================================================================

/// Decodes a persisted grant list.
///
/// `raw` is the stored value for `field`. An absent or blank value is an empty list,
/// not an error. Anything else that fails to decode is reported as
/// [`AuthzError::MalformedGrants`] and must be treated as a denial by the caller.
pub fn parse_grants(field: &str, raw: Option<&str>) -> AuthzResult<Vec<Grant>> {
	let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
		return Ok(Vec::new());
	};

	let grants: Option<Vec<Grant>> =
		serde_json::from_str(raw).map_err(|source| AuthzError::MalformedGrants {
			field: field.to_string(),
			source,
		})?;

	Ok(grants.unwrap_or_default())
}

/// Encodes a grant list. An empty list encodes as `[]`.
pub fn serialize_grants(grants: &[Grant]) -> Result<String, serde_json::Error> {
	serde_json::to_string(grants)
}

// =============================================================================
// Active grants
// =============================================================================

/// Principal-to-role map of the grants usable at one instant.
///
/// Keys keep their stored case; lookups go through [`principal_eq`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveGrantMap {
	entries: BTreeMap<String, Role>,
}

impl ActiveGrantMap {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a map from role names as produced by an external grant backend.
	pub fn from_role_names<I, K, V>(entries: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: AsRef<str>,
	{
		let mut map = Self::new();
		for (principal, role) in entries {
			map.insert(principal, Role::from_name(role.as_ref()));
		}
		map
	}

	/// Inserts a grant. Empty principals are ignored; a repeated key overwrites.
	pub fn insert(&mut self, principal: impl Into<String>, role: Role) {
		let principal = principal.into();
		if principal.is_empty() {
			return;
		}
		self.entries.insert(principal, role);
	}

	/// Returns the role stored under exactly this key.
	pub fn get(&self, principal: &str) -> Option<Role> {
		self.entries.get(principal).copied()
	}

	/// Iterates over entries whose key matches `principal` case-insensitively.
	pub fn matching<'a>(&'a self, principal: &'a str) -> impl Iterator<Item = Role> + 'a {
		self
			.entries
			.iter()
			.filter(move |(key, _)| principal_eq(key, principal))
			.map(|(_, role)| *role)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, Role)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), *v))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl FromIterator<(String, Role)> for ActiveGrantMap {
	fn from_iter<T: IntoIterator<Item = (String, Role)>>(iter: T) -> Self {
		let mut map = Self::new();
		for (principal, role) in iter {
			map.insert(principal, role);
		}
		map
	}
}

/// Reduces a grant list to the grants usable at `now`.
///
/// Later records overwrite earlier ones for the same stored principal; run
/// [`deduplicate`] first when the list may hold more than one record per principal.
pub fn active_grants(grants: &[Grant], now: DateTime<Utc>) -> ActiveGrantMap {
	grants
		.iter()
		.filter(|g| !g.principal.is_empty() && g.is_active_at(now))
		.map(|g| (g.principal.clone(), g.role))
		.collect()
}

// =============================================================================
// Deduplication and editing
// =============================================================================

/// Collapses a grant list to one record per principal.
///
/// For each principal the record with the highest role level wins, keeping its own
/// time window. Ties keep the first record at the winning level. Principals are
/// compared exactly as stored; empty principals are dropped. Output order follows
/// each principal's first appearance.
pub fn deduplicate(grants: &[Grant]) -> Vec<Grant> {
	let mut out: Vec<Grant> = Vec::with_capacity(grants.len());
	let mut index: BTreeMap<&str, usize> = BTreeMap::new();

	for grant in grants {
		if grant.principal.is_empty() {
			continue;
		}
		match index.get(grant.principal.as_str()) {
			Some(&pos) => {
				if !out[pos].role.at_least(grant.role) {
					out[pos] = grant.clone();
				}
			}
			None => {
				index.insert(grant.principal.as_str(), out.len());
				out.push(grant.clone());
			}
		}
	}

	out
}

/// Adds a grant, keeping whichever record for the principal ranks higher.
pub fn upsert_grant(grants: &[Grant], grant: Grant) -> AuthzResult<Vec<Grant>> {
	validate_principal(&grant.principal)?;
	let mut next = grants.to_vec();
	next.push(grant);
	Ok(deduplicate(&next))
}

/// Replaces every record stored under exactly the grant's principal, including
/// higher-ranked ones. Differently-cased records are left alone, matching how
/// [`deduplicate`] keys principals.
pub fn set_grant(grants: &[Grant], grant: Grant) -> AuthzResult<Vec<Grant>> {
	validate_principal(&grant.principal)?;
	let mut next: Vec<Grant> = grants
		.iter()
		.filter(|g| g.principal != grant.principal)
		.cloned()
		.collect();
	next.push(grant);
	Ok(deduplicate(&next))
}

/// Removes every record for `principal`, compared case-insensitively.
pub fn revoke_grant(grants: &[Grant], principal: &str) -> Vec<Grant> {
	grants
		.iter()
		.filter(|g| !principal_eq(&g.principal, principal))
		.cloned()
		.collect()
}

/// Drops grants that have expired at `now`. Grants that have not started yet are kept.
pub fn prune_expired(grants: &[Grant], now: DateTime<Utc>) -> Vec<Grant> {
	grants
		.iter()
		.filter(|g| !g.is_expired_at(now))
		.cloned()
		.collect()
}

fn validate_principal(principal: &str) -> AuthzResult<()> {
	if principal.trim().is_empty() {
		return Err(AuthzError::InvalidGrant(
			"principal must not be empty".to_string(),
		));
	}
	Ok(())
}
