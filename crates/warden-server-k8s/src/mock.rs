// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory [`K8sClient`] for tests and offline tooling.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::client::K8sClient;
use crate::error::K8sError;
use crate::types::{Namespace, ObjectMeta, Secret};

#[derive(Default)]
struct MockState {
	namespaces: BTreeMap<String, Namespace>,
	secrets: BTreeMap<(String, String), Secret>,
	failure: Option<String>,
	calls: usize,
}

/// Mock K8s client holding namespaces and secrets in memory.
#[derive(Clone, Default)]
pub struct MockK8sClient {
	state: Arc<Mutex<MockState>>,
}

impl MockK8sClient {
	pub fn new() -> Self {
		Self::default()
	}

	fn state(&self) -> MutexGuard<'_, MockState> {
		self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	/// Add a namespace with the given labels and annotations.
	pub fn add_namespace(
		&self,
		name: &str,
		labels: BTreeMap<String, String>,
		annotations: BTreeMap<String, String>,
	) {
		let ns = Namespace {
			metadata: ObjectMeta {
				name: Some(name.to_string()),
				labels: Some(labels),
				annotations: Some(annotations),
				..Default::default()
			},
			..Default::default()
		};
		self.state().namespaces.insert(name.to_string(), ns);
	}

	/// Add a secret with the given labels and annotations.
	pub fn add_secret(
		&self,
		namespace: &str,
		name: &str,
		labels: BTreeMap<String, String>,
		annotations: BTreeMap<String, String>,
	) {
		let secret = Secret {
			metadata: ObjectMeta {
				name: Some(name.to_string()),
				namespace: Some(namespace.to_string()),
				labels: Some(labels),
				annotations: Some(annotations),
				..Default::default()
			},
			..Default::default()
		};
		self
			.state()
			.secrets
			.insert((namespace.to_string(), name.to_string()), secret);
	}

	/// Make every subsequent call fail with an API error.
	pub fn fail_with(&self, message: &str) {
		self.state().failure = Some(message.to_string());
	}

	/// Number of client calls made so far.
	pub fn calls(&self) -> usize {
		self.state().calls
	}

	/// Current annotations of a namespace, if it exists.
	pub fn namespace_annotations(&self, name: &str) -> Option<BTreeMap<String, String>> {
		self
			.state()
			.namespaces
			.get(name)
			.map(|ns| ns.metadata.annotations.clone().unwrap_or_default())
	}

	/// Current annotations of a secret, if it exists.
	pub fn secret_annotations(&self, namespace: &str, name: &str) -> Option<BTreeMap<String, String>> {
		self
			.state()
			.secrets
			.get(&(namespace.to_string(), name.to_string()))
			.map(|s| s.metadata.annotations.clone().unwrap_or_default())
	}

	fn begin_call(&self) -> Result<MutexGuard<'_, MockState>, K8sError> {
		let mut state = self.state();
		state.calls += 1;
		if let Some(message) = state.failure.clone() {
			return Err(K8sError::ApiError { message });
		}
		Ok(state)
	}
}

fn merge_annotations(meta: &mut ObjectMeta, annotations: BTreeMap<String, String>) {
	meta.annotations.get_or_insert_with(BTreeMap::new).extend(annotations);
}

#[async_trait]
impl K8sClient for MockK8sClient {
	async fn get_namespace(&self, name: &str) -> Result<Namespace, K8sError> {
		let state = self.begin_call()?;
		state
			.namespaces
			.get(name)
			.cloned()
			.ok_or_else(|| K8sError::NamespaceNotFound { name: name.into() })
	}

	async fn get_secret(&self, name: &str, namespace: &str) -> Result<Secret, K8sError> {
		let state = self.begin_call()?;
		state
			.secrets
			.get(&(namespace.to_string(), name.to_string()))
			.cloned()
			.ok_or_else(|| K8sError::SecretNotFound {
				namespace: namespace.into(),
				name: name.into(),
			})
	}

	async fn patch_namespace_annotations(
		&self,
		name: &str,
		annotations: BTreeMap<String, String>,
	) -> Result<(), K8sError> {
		let mut state = self.begin_call()?;
		let ns = state
			.namespaces
			.get_mut(name)
			.ok_or_else(|| K8sError::NamespaceNotFound { name: name.into() })?;
		merge_annotations(&mut ns.metadata, annotations);
		Ok(())
	}

	async fn patch_secret_annotations(
		&self,
		name: &str,
		namespace: &str,
		annotations: BTreeMap<String, String>,
	) -> Result<(), K8sError> {
		let mut state = self.begin_call()?;
		let secret = state
			.secrets
			.get_mut(&(namespace.to_string(), name.to_string()))
			.ok_or_else(|| K8sError::SecretNotFound {
				namespace: namespace.into(),
				name: name.into(),
			})?;
		merge_annotations(&mut secret.metadata, annotations);
		Ok(())
	}
}
