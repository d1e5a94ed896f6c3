// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Grant storage on Kubernetes objects.
//!
//! - Organizations and projects are namespaces; a project namespace names its
//!   organization through a label
//! - Secrets are `Secret` objects; a label may name their project namespace,
//!   otherwise the containing namespace is the project
//! - Grants are JSON arrays in annotations on each object
//!
//! Reads always go to the API server; nothing is cached between checks.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};
use warden_server_authz::{
	ActiveGrants, AuthzError, AuthzResult, GrantAnnotationKeys, OrgGrantResolver, ProjectResource,
	ResourceGrants, SecretResource,
};

use crate::client::K8sClient;
use crate::error::{K8sError, K8sResult};
use crate::types::{annotations, label, ResourceLabels};

/// Loads and saves resource grants through a [`K8sClient`].
#[derive(Clone)]
pub struct NamespaceGrantStore {
	client: Arc<dyn K8sClient>,
	keys: GrantAnnotationKeys,
	labels: ResourceLabels,
}

impl NamespaceGrantStore {
	pub fn new(client: Arc<dyn K8sClient>, keys: GrantAnnotationKeys) -> Self {
		Self {
			client,
			keys,
			labels: ResourceLabels::default(),
		}
	}

	pub fn with_labels(mut self, labels: ResourceLabels) -> Self {
		self.labels = labels;
		self
	}

	/// Grants stored on an organization namespace.
	#[instrument(level = "debug", skip(self))]
	pub async fn organization_grants(&self, organization: &str) -> K8sResult<ResourceGrants> {
		let ns = self.client.get_namespace(organization).await?;
		Ok(ResourceGrants::from_annotations(
			&annotations(&ns.metadata),
			&self.keys,
		)?)
	}

	/// Loads a project namespace with its grants and organization link.
	#[instrument(level = "debug", skip(self))]
	pub async fn load_project(&self, name: &str) -> K8sResult<ProjectResource> {
		let ns = self.client.get_namespace(name).await?;
		let grants = ResourceGrants::from_annotations(&annotations(&ns.metadata), &self.keys)?;
		let mut project = ProjectResource::new(name, grants);
		if let Some(org) = label(&ns.metadata, &self.labels.organization_label) {
			project = project.in_organization(org);
		}
		debug!(
			project = %name,
			organization = ?project.organization,
			"loaded project grants"
		);
		Ok(project)
	}

	/// Loads a secret together with the project that contains it.
	#[instrument(level = "debug", skip(self))]
	pub async fn load_secret(&self, namespace: &str, name: &str) -> K8sResult<SecretResource> {
		let secret = self.client.get_secret(name, namespace).await?;
		let grants = ResourceGrants::from_annotations(&annotations(&secret.metadata), &self.keys)?;
		let project_name = label(&secret.metadata, &self.labels.project_label).unwrap_or(namespace);
		let project = self.load_project(project_name).await?;
		Ok(SecretResource::new(name, grants, project))
	}

	/// Replaces the grant annotations of an organization or project namespace.
	#[instrument(level = "debug", skip(self, grants))]
	pub async fn save_namespace_grants(&self, name: &str, grants: &ResourceGrants) -> K8sResult<()> {
		let annotations = grants.to_annotations(&self.keys)?;
		self
			.client
			.patch_namespace_annotations(name, annotations)
			.await
	}

	/// Replaces the grant annotations of a secret.
	#[instrument(level = "debug", skip(self, grants))]
	pub async fn save_secret_grants(
		&self,
		namespace: &str,
		name: &str,
		grants: &ResourceGrants,
	) -> K8sResult<()> {
		let annotations = grants.to_annotations(&self.keys)?;
		self
			.client
			.patch_secret_annotations(name, namespace, annotations)
			.await
	}
}

#[async_trait]
impl OrgGrantResolver for NamespaceGrantStore {
	async fn org_grants(&self, organization: &str, now: DateTime<Utc>) -> AuthzResult<ActiveGrants> {
		match self.organization_grants(organization).await {
			Ok(grants) => Ok(grants.active(now)),
			Err(K8sError::Grants(e)) => Err(e),
			Err(e) => Err(AuthzError::OrgGrantLookup(e.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mock::MockK8sClient;
	use chrono::TimeZone;
	use std::collections::BTreeMap;
	use warden_server_authz::{
		upsert_grant, Authorizer, AuthzSettings, Caller, Grant, Permission, Role,
		DEFAULT_GROUP_GRANTS_ANNOTATION, DEFAULT_USER_GRANTS_ANNOTATION,
	};

	fn now() -> DateTime<Utc> {
		Utc.timestamp_opt(1_700_000_000, 0).single().unwrap()
	}

	fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
		entries
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	fn store(mock: &MockK8sClient) -> NamespaceGrantStore {
		NamespaceGrantStore::new(Arc::new(mock.clone()), GrantAnnotationKeys::default())
	}

	fn seeded() -> MockK8sClient {
		let mock = MockK8sClient::new();
		mock.add_namespace(
			"acme",
			BTreeMap::new(),
			map(&[(
				DEFAULT_USER_GRANTS_ANNOTATION,
				r#"[{"principal":"alice@example.com","role":"owner"}]"#,
			)]),
		);
		mock.add_namespace(
			"billing",
			map(&[("warden.dev/organization", "acme")]),
			map(&[(
				DEFAULT_GROUP_GRANTS_ANNOTATION,
				r#"[{"principal":"eng","role":"viewer"}]"#,
			)]),
		);
		mock.add_secret(
			"billing",
			"db-password",
			BTreeMap::new(),
			BTreeMap::new(),
		);
		mock
	}

	mod loading {
		use super::*;

		#[tokio::test]
		async fn project_carries_organization_label() {
			let mock = seeded();
			let project = store(&mock).load_project("billing").await.unwrap();
			assert_eq!(project.organization.as_deref(), Some("acme"));
			assert_eq!(project.grants.groups, vec![Grant::new("eng", Role::Viewer)]);
		}

		#[tokio::test]
		async fn secret_defaults_to_its_namespace_as_project() {
			let mock = seeded();
			let secret = store(&mock)
				.load_secret("billing", "db-password")
				.await
				.unwrap();
			assert_eq!(secret.project.name, "billing");
			assert!(secret.grants.users.is_empty());
		}

		#[tokio::test]
		async fn secret_project_label_overrides_namespace() {
			let mock = seeded();
			mock.add_namespace("payments", BTreeMap::new(), BTreeMap::new());
			mock.add_secret(
				"billing",
				"stripe-key",
				map(&[("warden.dev/project", "payments")]),
				BTreeMap::new(),
			);
			let secret = store(&mock)
				.load_secret("billing", "stripe-key")
				.await
				.unwrap();
			assert_eq!(secret.project.name, "payments");
		}

		#[tokio::test]
		async fn malformed_annotation_is_an_error() {
			let mock = MockK8sClient::new();
			mock.add_namespace(
				"broken",
				BTreeMap::new(),
				map(&[(DEFAULT_USER_GRANTS_ANNOTATION, "[{")]),
			);
			let err = store(&mock).load_project("broken").await.unwrap_err();
			assert!(matches!(err, K8sError::Grants(AuthzError::MalformedGrants { .. })));
		}
	}

	mod resolver {
		use super::*;

		#[tokio::test]
		async fn resolves_active_org_grants() {
			let mock = seeded();
			let grants = store(&mock).org_grants("acme", now()).await.unwrap();
			assert_eq!(grants.users.get("alice@example.com"), Some(Role::Owner));
		}

		#[tokio::test]
		async fn api_failure_becomes_lookup_error() {
			let mock = seeded();
			mock.fail_with("etcd unavailable");
			let err = store(&mock).org_grants("acme", now()).await.unwrap_err();
			assert!(matches!(err, AuthzError::OrgGrantLookup(ref m) if m.contains("etcd unavailable")));
		}

		#[tokio::test]
		async fn missing_org_namespace_becomes_lookup_error() {
			let mock = MockK8sClient::new();
			let err = store(&mock).org_grants("ghost", now()).await.unwrap_err();
			assert!(matches!(err, AuthzError::OrgGrantLookup(_)));
		}

		#[tokio::test]
		async fn org_owner_reaches_project_but_not_secret_values() {
			let mock = seeded();
			let store = store(&mock);
			let authz =
				Authorizer::new(AuthzSettings::default()).with_org_resolver(Arc::new(store.clone()));
			let alice = Caller::new("alice@example.com", Vec::<String>::new());

			let project = store.load_project("billing").await.unwrap();
			assert!(authz
				.check_project(&alice, &project, Permission::ProjectsCreate, now())
				.await
				.is_allowed());

			let secret = store.load_secret("billing", "db-password").await.unwrap();
			assert!(!authz
				.check_secret(&alice, &secret, Permission::SecretsRead, now())
				.is_allowed());
		}
	}

	mod saving {
		use super::*;

		#[tokio::test]
		async fn saved_grants_load_back() {
			let mock = seeded();
			let store = store(&mock);

			let mut project = store.load_project("billing").await.unwrap();
			project.grants.users =
				upsert_grant(&project.grants.users, Grant::new("bob@example.com", Role::Editor))
					.unwrap();
			store
				.save_namespace_grants("billing", &project.grants)
				.await
				.unwrap();

			let reloaded = store.load_project("billing").await.unwrap();
			assert_eq!(reloaded.grants, project.grants);
		}

		#[tokio::test]
		async fn saving_secret_grants_writes_both_buckets() {
			let mock = seeded();
			let grants = ResourceGrants::new(vec![Grant::new("carol", Role::Viewer)], Vec::new());
			store(&mock)
				.save_secret_grants("billing", "db-password", &grants)
				.await
				.unwrap();

			let annotations = mock.secret_annotations("billing", "db-password").unwrap();
			assert_eq!(
				annotations.get(DEFAULT_GROUP_GRANTS_ANNOTATION).map(String::as_str),
				Some("[]")
			);
			assert!(annotations.contains_key(DEFAULT_USER_GRANTS_ANNOTATION));
		}
	}
}
