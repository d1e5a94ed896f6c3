// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-operation access checks.
//!
//! Every check follows the same order:
//!
//! ```text
//! check_<scope>(caller, resource, permission, now)
//!     │
//!     ├── permission belongs to another scope → deny
//!     │
//!     ├── direct grants on the resource → allow
//!     │
//!     ├── parent grants through the cascade table → allow
//!     │   (secret ← project direct grants, project ← organization resolver)
//!     │
//!     └── deny
//! ```
//!
//! Direct grants are always tried first and the cascade is a separate second
//! scan. A failing organization resolver only disables the cascade step.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

use crate::error::AuthzResult;
use crate::policy::{best_role, cascade_permission, check_grants, Decision};
use crate::resource::{ActiveGrants, AuthzSettings, Caller, ProjectResource, ResourceGrants, SecretResource};
use crate::types::{Permission, Role, Scope};

/// Looks up the active grants of an organization.
///
/// Implementations return [`AuthzError::OrgGrantLookup`](crate::AuthzError::OrgGrantLookup)
/// or any other error on backend failure; the [`Authorizer`] treats every error as
/// "cascade unavailable".
#[async_trait]
pub trait OrgGrantResolver: Send + Sync {
	async fn org_grants(&self, organization: &str, now: DateTime<Utc>) -> AuthzResult<ActiveGrants>;
}

/// Decides access to organizations, projects, and secrets.
#[derive(Clone, Default)]
pub struct Authorizer {
	settings: AuthzSettings,
	org_resolver: Option<Arc<dyn OrgGrantResolver>>,
}

impl std::fmt::Debug for Authorizer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Authorizer")
			.field("settings", &self.settings)
			.field("org_resolver", &self.org_resolver.is_some())
			.finish()
	}
}

impl Authorizer {
	pub fn new(settings: AuthzSettings) -> Self {
		Self {
			settings,
			org_resolver: None,
		}
	}

	pub fn with_org_resolver(mut self, resolver: Arc<dyn OrgGrantResolver>) -> Self {
		self.org_resolver = Some(resolver);
		self
	}

	pub fn settings(&self) -> &AuthzSettings {
		&self.settings
	}

	/// Checks a permission on an organization.
	///
	/// Organization grants come only from the resolver. Without one, or when it
	/// fails, the check is denied.
	#[instrument(level = "debug", skip(self, caller, now), fields(permission = %permission))]
	pub async fn check_organization(
		&self,
		caller: &Caller,
		organization: &str,
		permission: Permission,
		now: DateTime<Utc>,
	) -> Decision {
		if !scope_matches(permission, Scope::Organization) {
			return Decision::Denied;
		}

		match self.resolve_org_grants(organization, now).await {
			Some(grants) => check_active(caller, &grants, permission),
			None => {
				debug!(permission = %permission, "organization grants unavailable");
				Decision::Denied
			}
		}
	}

	/// Checks a permission on a project, falling back to organization grants.
	#[instrument(level = "debug", skip(self, caller, project, now), fields(permission = %permission))]
	pub async fn check_project(
		&self,
		caller: &Caller,
		project: &ProjectResource,
		permission: Permission,
		now: DateTime<Utc>,
	) -> Decision {
		if !scope_matches(permission, Scope::Project) {
			return Decision::Denied;
		}

		let direct = project.grants.active(now);
		if check_active(caller, &direct, permission).is_allowed() {
			return Decision::Allowed;
		}

		if !self.settings.org_cascade_enabled {
			return Decision::Denied;
		}
		let (Some(organization), Some(substitute)) = (
			project.organization.as_deref(),
			cascade_permission(permission, Scope::Organization),
		) else {
			return Decision::Denied;
		};

		match self.resolve_org_grants(organization, now).await {
			Some(org_grants) => check_active(caller, &org_grants, substitute),
			None => Decision::Denied,
		}
	}

	/// Checks a permission on a secret, falling back to the project's direct grants.
	///
	/// Organization grants never reach secrets.
	#[instrument(level = "debug", skip(self, caller, secret, now), fields(permission = %permission))]
	pub fn check_secret(
		&self,
		caller: &Caller,
		secret: &SecretResource,
		permission: Permission,
		now: DateTime<Utc>,
	) -> Decision {
		if !scope_matches(permission, Scope::Secret) {
			return Decision::Denied;
		}

		let direct = secret.grants.active(now);
		if check_active(caller, &direct, permission).is_allowed() {
			return Decision::Allowed;
		}

		match cascade_permission(permission, Scope::Project) {
			Some(substitute) => {
				let project = secret.project.grants.active(now);
				check_active(caller, &project, substitute)
			}
			None => Decision::Denied,
		}
	}

	/// Permission required to change the grants of a resource at `scope`.
	pub fn grant_management_permission(scope: Scope) -> Permission {
		Permission::admin_for(scope)
	}

	/// Returns the caller's best role from a resource's own grants.
	pub fn best_role_for(&self, caller: &Caller, grants: &ResourceGrants, now: DateTime<Utc>) -> Role {
		let active = grants.active(now);
		best_role(&caller.email, &caller.groups, &active.users, &active.groups)
	}

	async fn resolve_org_grants(&self, organization: &str, now: DateTime<Utc>) -> Option<ActiveGrants> {
		let resolver = self.org_resolver.as_ref()?;
		match resolver.org_grants(organization, now).await {
			Ok(grants) => Some(grants),
			Err(e) => {
				warn!(organization = %organization, error = %e, "organization grant lookup failed; cascade unavailable");
				None
			}
		}
	}
}

fn check_active(caller: &Caller, grants: &ActiveGrants, permission: Permission) -> Decision {
	check_grants(
		&caller.email,
		&caller.groups,
		&grants.users,
		&grants.groups,
		permission,
	)
}

fn scope_matches(permission: Permission, scope: Scope) -> bool {
	if permission.scope() == scope {
		return true;
	}
	warn!(
		permission = %permission,
		expected = %scope,
		"permission checked against the wrong scope"
	);
	false
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::AuthzError;
	use crate::grant::{ActiveGrantMap, Grant};
	use chrono::TimeZone;
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn now() -> DateTime<Utc> {
		Utc.timestamp_opt(1_700_000_000, 0).single().unwrap()
	}

	fn alice() -> Caller {
		Caller::new("alice@example.com", Vec::<String>::new())
	}

	fn user_grants(entries: &[(&str, Role)]) -> ResourceGrants {
		ResourceGrants::new(
			entries.iter().map(|(p, r)| Grant::new(*p, *r)).collect(),
			Vec::new(),
		)
	}

	struct StaticResolver {
		grants: ActiveGrants,
		calls: AtomicUsize,
	}

	impl StaticResolver {
		fn new(users: &[(&str, &str)]) -> Arc<Self> {
			Arc::new(Self {
				grants: ActiveGrants::new(
					ActiveGrantMap::from_role_names(users.iter().copied()),
					ActiveGrantMap::new(),
				),
				calls: AtomicUsize::new(0),
			})
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}

	#[async_trait]
	impl OrgGrantResolver for StaticResolver {
		async fn org_grants(&self, _organization: &str, _now: DateTime<Utc>) -> AuthzResult<ActiveGrants> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			Ok(self.grants.clone())
		}
	}

	struct FailingResolver;

	#[async_trait]
	impl OrgGrantResolver for FailingResolver {
		async fn org_grants(&self, organization: &str, _now: DateTime<Utc>) -> AuthzResult<ActiveGrants> {
			Err(AuthzError::OrgGrantLookup(format!("{organization}: backend unavailable")))
		}
	}

	fn project_in_acme(grants: ResourceGrants) -> ProjectResource {
		ProjectResource::new("billing", grants).in_organization("acme")
	}

	mod project_checks {
		use super::*;

		#[tokio::test]
		async fn direct_grant_allows_without_consulting_resolver() {
			let resolver = StaticResolver::new(&[]);
			let authz = Authorizer::default().with_org_resolver(resolver.clone());
			let project = project_in_acme(user_grants(&[("alice@example.com", Role::Editor)]));

			let decision = authz
				.check_project(&alice(), &project, Permission::ProjectsWrite, now())
				.await;

			assert_eq!(decision, Decision::Allowed);
			assert_eq!(resolver.calls(), 0);
		}

		#[tokio::test]
		async fn organization_owner_cascades_to_project_create() {
			let resolver = StaticResolver::new(&[("alice@example.com", "owner")]);
			let authz = Authorizer::default().with_org_resolver(resolver.clone());
			let project = project_in_acme(ResourceGrants::default());

			let decision = authz
				.check_project(&alice(), &project, Permission::ProjectsCreate, now())
				.await;

			assert_eq!(decision, Decision::Allowed);
			assert_eq!(resolver.calls(), 1);
		}

		#[tokio::test]
		async fn organization_viewer_does_not_cascade_to_project_write() {
			let resolver = StaticResolver::new(&[("alice@example.com", "viewer")]);
			let authz = Authorizer::default().with_org_resolver(resolver);
			let project = project_in_acme(ResourceGrants::default());

			assert!(authz
				.check_project(&alice(), &project, Permission::ProjectsRead, now())
				.await
				.is_allowed());
			assert!(!authz
				.check_project(&alice(), &project, Permission::ProjectsWrite, now())
				.await
				.is_allowed());
		}

		#[tokio::test]
		async fn project_without_organization_skips_cascade() {
			let resolver = StaticResolver::new(&[("alice@example.com", "owner")]);
			let authz = Authorizer::default().with_org_resolver(resolver.clone());
			let project = ProjectResource::new("loose", ResourceGrants::default());

			let decision = authz
				.check_project(&alice(), &project, Permission::ProjectsRead, now())
				.await;

			assert_eq!(decision, Decision::Denied);
			assert_eq!(resolver.calls(), 0);
		}

		#[tokio::test]
		async fn disabled_cascade_never_calls_resolver() {
			let resolver = StaticResolver::new(&[("alice@example.com", "owner")]);
			let settings = AuthzSettings {
				org_cascade_enabled: false,
				..AuthzSettings::default()
			};
			let authz = Authorizer::new(settings).with_org_resolver(resolver.clone());
			let project = project_in_acme(ResourceGrants::default());

			let decision = authz
				.check_project(&alice(), &project, Permission::ProjectsRead, now())
				.await;

			assert_eq!(decision, Decision::Denied);
			assert_eq!(resolver.calls(), 0);
		}

		#[tokio::test]
		async fn no_resolver_denies_after_direct_check() {
			let authz = Authorizer::default();
			let project = project_in_acme(ResourceGrants::default());

			let decision = authz
				.check_project(&alice(), &project, Permission::ProjectsRead, now())
				.await;

			assert_eq!(decision, Decision::Denied);
		}

		#[tokio::test]
		async fn failing_resolver_denies_cascade_but_keeps_direct_access() {
			let authz = Authorizer::default().with_org_resolver(Arc::new(FailingResolver));
			let granted = project_in_acme(user_grants(&[("alice@example.com", Role::Viewer)]));
			let ungranted = project_in_acme(ResourceGrants::default());

			assert!(authz
				.check_project(&alice(), &granted, Permission::ProjectsRead, now())
				.await
				.is_allowed());
			assert!(!authz
				.check_project(&alice(), &ungranted, Permission::ProjectsRead, now())
				.await
				.is_allowed());
		}

		#[tokio::test]
		async fn wrong_scope_permission_is_denied() {
			let authz = Authorizer::default();
			let project = project_in_acme(user_grants(&[("alice@example.com", Role::Owner)]));

			let decision = authz
				.check_project(&alice(), &project, Permission::SecretsRead, now())
				.await;

			assert_eq!(decision, Decision::Denied);
		}

		#[tokio::test]
		async fn expired_owner_record_keeps_live_viewer_access() {
			let authz = Authorizer::default();
			let at = Utc.timestamp_opt(100, 0).single().unwrap();
			let expired_owner = Grant::new("alice@example.com", Role::Owner)
				.with_expiry(Utc.timestamp_opt(50, 0).single().unwrap());
			let viewer_only = project_in_acme(user_grants(&[("alice@example.com", Role::Viewer)]));
			let with_expired = project_in_acme(ResourceGrants::new(
				vec![Grant::new("alice@example.com", Role::Viewer), expired_owner],
				Vec::new(),
			));

			for project in [&viewer_only, &with_expired] {
				assert_eq!(
					authz
						.check_project(&alice(), project, Permission::ProjectsRead, at)
						.await,
					Decision::Allowed
				);
			}
			assert_eq!(
				authz.best_role_for(&alice(), &with_expired.grants, at),
				Role::Viewer
			);
		}

		#[tokio::test]
		async fn expired_direct_grant_falls_through_to_cascade() {
			let resolver = StaticResolver::new(&[("alice@example.com", "editor")]);
			let authz = Authorizer::default().with_org_resolver(resolver.clone());
			let expired = Grant::new("alice@example.com", Role::Owner).with_expiry(now());
			let project = project_in_acme(ResourceGrants::new(vec![expired], Vec::new()));

			assert!(authz
				.check_project(&alice(), &project, Permission::ProjectsWrite, now())
				.await
				.is_allowed());
			assert!(!authz
				.check_project(&alice(), &project, Permission::ProjectsDelete, now())
				.await
				.is_allowed());
			assert_eq!(resolver.calls(), 2);
		}
	}

	mod secret_checks {
		use super::*;

		fn secret(grants: ResourceGrants, project: ProjectResource) -> SecretResource {
			SecretResource::new("db-password", grants, project)
		}

		#[test]
		fn reading_values_requires_a_direct_secret_grant() {
			let authz = Authorizer::default();
			let project = project_in_acme(user_grants(&[("alice@example.com", Role::Owner)]));
			let s = secret(ResourceGrants::default(), project);

			assert_eq!(
				authz.check_secret(&alice(), &s, Permission::SecretsRead, now()),
				Decision::Denied
			);
			assert_eq!(
				authz.check_secret(&alice(), &s, Permission::SecretsList, now()),
				Decision::Allowed
			);
			assert_eq!(
				authz.check_secret(&alice(), &s, Permission::SecretsDelete, now()),
				Decision::Allowed
			);
		}

		#[test]
		fn direct_secret_viewer_can_read() {
			let authz = Authorizer::default();
			let s = secret(
				user_grants(&[("alice@example.com", Role::Viewer)]),
				project_in_acme(ResourceGrants::default()),
			);
			assert!(authz
				.check_secret(&alice(), &s, Permission::SecretsRead, now())
				.is_allowed());
			assert!(!authz
				.check_secret(&alice(), &s, Permission::SecretsWrite, now())
				.is_allowed());
		}

		#[test]
		fn project_editor_cannot_delete_secrets() {
			let authz = Authorizer::default();
			let s = secret(
				ResourceGrants::default(),
				project_in_acme(user_grants(&[("alice@example.com", Role::Editor)])),
			);
			assert!(authz
				.check_secret(&alice(), &s, Permission::SecretsWrite, now())
				.is_allowed());
			assert!(!authz
				.check_secret(&alice(), &s, Permission::SecretsDelete, now())
				.is_allowed());
		}

		#[test]
		fn group_grant_on_project_cascades() {
			let authz = Authorizer::default();
			let caller = Caller::new("bob@example.com", ["Eng"]);
			let project = project_in_acme(ResourceGrants::new(
				Vec::new(),
				vec![Grant::new("eng", Role::Viewer)],
			));
			let s = secret(ResourceGrants::default(), project);
			assert!(authz
				.check_secret(&caller, &s, Permission::SecretsList, now())
				.is_allowed());
		}
	}

	mod organization_cascade {
		use super::*;

		#[tokio::test]
		async fn org_owner_creates_projects_but_cannot_read_secrets() {
			let resolver = StaticResolver::new(&[("alice@example.com", "owner")]);
			let authz = Authorizer::default().with_org_resolver(resolver);
			let project = project_in_acme(ResourceGrants::default());
			let s = SecretResource::new("api-key", ResourceGrants::default(), project.clone());

			assert!(authz
				.check_project(&alice(), &project, Permission::ProjectsCreate, now())
				.await
				.is_allowed());
			assert!(authz
				.check_project(&alice(), &project, Permission::ProjectsRead, now())
				.await
				.is_allowed());
			for permission in [
				Permission::SecretsRead,
				Permission::SecretsList,
				Permission::SecretsAdmin,
			] {
				assert_eq!(
					authz.check_secret(&alice(), &s, permission, now()),
					Decision::Denied
				);
			}
		}

		#[tokio::test]
		async fn check_organization_uses_resolver_grants() {
			let resolver = StaticResolver::new(&[("Alice@Example.com", "editor")]);
			let authz = Authorizer::default().with_org_resolver(resolver);

			assert!(authz
				.check_organization(&alice(), "acme", Permission::OrganizationsWrite, now())
				.await
				.is_allowed());
			assert!(!authz
				.check_organization(&alice(), "acme", Permission::OrganizationsAdmin, now())
				.await
				.is_allowed());
		}

		#[tokio::test]
		async fn check_organization_without_resolver_denies() {
			let authz = Authorizer::default();
			assert_eq!(
				authz
					.check_organization(&alice(), "acme", Permission::OrganizationsRead, now())
					.await,
				Decision::Denied
			);
		}

		#[tokio::test]
		async fn check_organization_with_failing_resolver_denies() {
			let authz = Authorizer::default().with_org_resolver(Arc::new(FailingResolver));
			assert_eq!(
				authz
					.check_organization(&alice(), "acme", Permission::OrganizationsRead, now())
					.await,
				Decision::Denied
			);
		}
	}

	mod roles_and_management {
		use super::*;

		#[test]
		fn best_role_for_uses_highest_active_grant() {
			let authz = Authorizer::default();
			let caller = Caller::new("alice@example.com", ["eng"]);
			let grants = ResourceGrants::new(
				vec![Grant::new("alice@example.com", Role::Viewer)],
				vec![Grant::new("ENG", Role::Owner).with_expiry(now())],
			);
			assert_eq!(authz.best_role_for(&caller, &grants, now()), Role::Viewer);
		}

		#[test]
		fn managing_grants_requires_admin() {
			let authz = Authorizer::default();
			assert_eq!(
				Authorizer::grant_management_permission(Scope::Secret),
				Permission::SecretsAdmin
			);

			let editor_project = project_in_acme(user_grants(&[("alice@example.com", Role::Editor)]));
			let s = SecretResource::new(
				"token",
				user_grants(&[("alice@example.com", Role::Editor)]),
				editor_project,
			);
			let needed = Authorizer::grant_management_permission(Scope::Secret);
			assert!(!authz.check_secret(&alice(), &s, needed, now()).is_allowed());
		}
	}
}
