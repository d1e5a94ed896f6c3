// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;
use warden_server_authz::AuthzError;

/// Result type alias for K8s operations.
pub type K8sResult<T> = Result<T, K8sError>;

/// Errors that can occur during K8s operations.
#[derive(Error, Debug)]
pub enum K8sError {
	#[error("K8s API error: {message}")]
	ApiError { message: String },

	#[error("Namespace not found: {name}")]
	NamespaceNotFound { name: String },

	#[error("Secret not found: {namespace}/{name}")]
	SecretNotFound { namespace: String, name: String },

	#[error("Unreadable grants: {0}")]
	Grants(#[from] AuthzError),

	#[error("Failed to encode grants: {0}")]
	Encode(#[from] serde_json::Error),
}

impl From<kube::Error> for K8sError {
	fn from(err: kube::Error) -> Self {
		K8sError::ApiError {
			message: err.to_string(),
		}
	}
}
