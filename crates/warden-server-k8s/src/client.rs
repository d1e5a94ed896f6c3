// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::K8sError;
use crate::types::{Namespace, Secret};

/// Trait for K8s client operations.
///
/// Organizations and projects are namespaces; secrets are `Secret` objects inside a
/// project namespace. Grants live in annotations on both.
#[async_trait]
pub trait K8sClient: Send + Sync {
	/// Get a namespace by name.
	async fn get_namespace(&self, name: &str) -> Result<Namespace, K8sError>;

	/// Get a secret by name from the specified namespace.
	async fn get_secret(&self, name: &str, namespace: &str) -> Result<Secret, K8sError>;

	/// Merge annotations into a namespace.
	async fn patch_namespace_annotations(
		&self,
		name: &str,
		annotations: BTreeMap<String, String>,
	) -> Result<(), K8sError>;

	/// Merge annotations into a secret.
	async fn patch_secret_annotations(
		&self,
		name: &str,
		namespace: &str,
		annotations: BTreeMap<String, String>,
	) -> Result<(), K8sError>;
}
