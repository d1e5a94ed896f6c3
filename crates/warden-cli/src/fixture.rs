// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Offline access checks against a JSON fixture.
//!
//! A fixture describes up to one organization, project, and secret, each with the
//! annotations it would carry in the cluster:
//!
//! ```text
//! {
//!   "organization": {"name": "acme", "annotations": {"warden.dev/user-grants": "[...]"}},
//!   "project":      {"name": "billing", "annotations": {...}},
//!   "secret":       {"name": "db-password", "annotations": {...}}
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use warden_server_authz::{
	ActiveGrants, Authorizer, AuthzError, AuthzResult, AuthzSettings, Caller, Decision,
	GrantAnnotationKeys, OrgGrantResolver, Permission, ProjectResource, ResourceGrants, Role,
	Scope, SecretResource,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureResource {
	pub name: String,
	#[serde(default)]
	pub annotations: BTreeMap<String, String>,
}

impl FixtureResource {
	fn grants(&self, keys: &GrantAnnotationKeys) -> AuthzResult<ResourceGrants> {
		ResourceGrants::from_annotations(&self.annotations, keys)
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
	pub organization: Option<FixtureResource>,
	pub project: Option<FixtureResource>,
	pub secret: Option<FixtureResource>,
}

impl Fixture {
	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read fixture {}", path.display()))?;
		serde_json::from_str(&content)
			.with_context(|| format!("failed to parse fixture {}", path.display()))
	}
}

/// Serves the fixture's organization grants as if they came from the cluster.
struct FixtureOrgResolver {
	name: String,
	grants: ResourceGrants,
}

#[async_trait]
impl OrgGrantResolver for FixtureOrgResolver {
	async fn org_grants(&self, organization: &str, now: DateTime<Utc>) -> AuthzResult<ActiveGrants> {
		if organization != self.name {
			return Err(AuthzError::OrgGrantLookup(format!(
				"organization {organization} is not in the fixture"
			)));
		}
		Ok(self.grants.active(now))
	}
}

/// Result of an offline check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
	pub decision: Decision,
	/// Caller's best role from the target resource's own grants.
	pub direct_role: Role,
}

/// Evaluates `permission` for `caller` against the fixture resource of the
/// permission's scope.
///
/// Malformed annotations are errors, never an empty grant list.
pub async fn evaluate(
	fixture: &Fixture,
	settings: AuthzSettings,
	caller: &Caller,
	permission: Permission,
	now: DateTime<Utc>,
) -> anyhow::Result<Outcome> {
	let keys = settings.annotations.clone();
	let mut authz = Authorizer::new(settings);

	if let Some(org) = &fixture.organization {
		let grants = org
			.grants(&keys)
			.with_context(|| format!("organization {}", org.name))?;
		authz = authz.with_org_resolver(Arc::new(FixtureOrgResolver {
			name: org.name.clone(),
			grants,
		}));
	}

	match permission.scope() {
		Scope::Organization => {
			let Some(org) = &fixture.organization else {
				bail!("{permission} needs an organization in the fixture");
			};
			let grants = org.grants(&keys)?;
			let decision = authz
				.check_organization(caller, &org.name, permission, now)
				.await;
			Ok(Outcome {
				decision,
				direct_role: authz.best_role_for(caller, &grants, now),
			})
		}
		Scope::Project => {
			let project = load_project(fixture, &keys)?;
			let decision = authz.check_project(caller, &project, permission, now).await;
			Ok(Outcome {
				decision,
				direct_role: authz.best_role_for(caller, &project.grants, now),
			})
		}
		Scope::Secret => {
			let Some(secret) = &fixture.secret else {
				bail!("{permission} needs a secret in the fixture");
			};
			let grants = secret
				.grants(&keys)
				.with_context(|| format!("secret {}", secret.name))?;
			let resource = SecretResource::new(&secret.name, grants, load_project(fixture, &keys)?);
			let decision = authz.check_secret(caller, &resource, permission, now);
			Ok(Outcome {
				decision,
				direct_role: authz.best_role_for(caller, &resource.grants, now),
			})
		}
	}
}

fn load_project(fixture: &Fixture, keys: &GrantAnnotationKeys) -> anyhow::Result<ProjectResource> {
	let Some(project) = &fixture.project else {
		bail!("the fixture has no project");
	};
	let grants = project
		.grants(keys)
		.with_context(|| format!("project {}", project.name))?;
	let mut resource = ProjectResource::new(&project.name, grants);
	if let Some(org) = &fixture.organization {
		resource = resource.in_organization(&org.name);
	}
	Ok(resource)
}
