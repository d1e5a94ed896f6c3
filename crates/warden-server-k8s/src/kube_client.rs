// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Secret};
use kube::{
	api::{Api, Patch, PatchParams},
	Client,
};
use tracing::{debug, instrument};

use crate::client::K8sClient;
use crate::error::K8sError;

const FIELD_MANAGER: &str = "warden";

/// Production K8s client implementation using the kube crate.
pub struct KubeClient {
	client: Client,
}

impl KubeClient {
	/// Create a new KubeClient that auto-discovers cluster configuration.
	///
	/// This will attempt to load config from:
	/// 1. In-cluster service account (when running in K8s)
	/// 2. KUBECONFIG environment variable
	/// 3. ~/.kube/config
	pub async fn new() -> Result<Self, K8sError> {
		let client = Client::try_default().await?;
		debug!("K8s client initialized");
		Ok(Self { client })
	}

	pub fn from_client(client: Client) -> Self {
		Self { client }
	}
}

fn annotation_patch(annotations: BTreeMap<String, String>) -> serde_json::Value {
	serde_json::json!({ "metadata": { "annotations": annotations } })
}

#[async_trait]
impl K8sClient for KubeClient {
	#[instrument(level = "debug", skip(self))]
	async fn get_namespace(&self, name: &str) -> Result<Namespace, K8sError> {
		let namespaces: Api<Namespace> = Api::all(self.client.clone());
		match namespaces.get(name).await {
			Ok(ns) => Ok(ns),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				Err(K8sError::NamespaceNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(level = "debug", skip(self))]
	async fn get_secret(&self, name: &str, namespace: &str) -> Result<Secret, K8sError> {
		let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
		match secrets.get(name).await {
			Ok(secret) => Ok(secret),
			Err(kube::Error::Api(err)) if err.code == 404 => Err(K8sError::SecretNotFound {
				namespace: namespace.into(),
				name: name.into(),
			}),
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(level = "debug", skip(self, annotations))]
	async fn patch_namespace_annotations(
		&self,
		name: &str,
		annotations: BTreeMap<String, String>,
	) -> Result<(), K8sError> {
		let namespaces: Api<Namespace> = Api::all(self.client.clone());
		let params = PatchParams::apply(FIELD_MANAGER);
		match namespaces
			.patch(name, &params, &Patch::Merge(annotation_patch(annotations)))
			.await
		{
			Ok(_) => Ok(()),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				Err(K8sError::NamespaceNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(level = "debug", skip(self, annotations))]
	async fn patch_secret_annotations(
		&self,
		name: &str,
		namespace: &str,
		annotations: BTreeMap<String, String>,
	) -> Result<(), K8sError> {
		let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
		let params = PatchParams::apply(FIELD_MANAGER);
		match secrets
			.patch(name, &params, &Patch::Merge(annotation_patch(annotations)))
			.await
		{
			Ok(_) => Ok(()),
			Err(kube::Error::Api(err)) if err.code == 404 => Err(K8sError::SecretNotFound {
				namespace: namespace.into(),
				name: name.into(),
			}),
			Err(e) => Err(e.into()),
		}
	}
}
