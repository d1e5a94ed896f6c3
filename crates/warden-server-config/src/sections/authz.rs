// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization configuration section.

use serde::{Deserialize, Serialize};
use warden_server_authz::{
	AuthzSettings, GrantAnnotationKeys, DEFAULT_GROUP_GRANTS_ANNOTATION,
	DEFAULT_LEGACY_GROUP_GRANTS_ANNOTATION, DEFAULT_USER_GRANTS_ANNOTATION,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthzConfigLayer {
	pub org_cascade_enabled: Option<bool>,
	pub user_grants_annotation: Option<String>,
	pub group_grants_annotation: Option<String>,
	pub legacy_group_grants_annotation: Option<String>,
}

impl AuthzConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.org_cascade_enabled.is_some() {
			self.org_cascade_enabled = other.org_cascade_enabled;
		}
		if other.user_grants_annotation.is_some() {
			self.user_grants_annotation = other.user_grants_annotation;
		}
		if other.group_grants_annotation.is_some() {
			self.group_grants_annotation = other.group_grants_annotation;
		}
		if other.legacy_group_grants_annotation.is_some() {
			self.legacy_group_grants_annotation = other.legacy_group_grants_annotation;
		}
	}

	pub fn finalize(self) -> AuthzConfig {
		AuthzConfig {
			org_cascade_enabled: self.org_cascade_enabled.unwrap_or(true),
			user_grants_annotation: self
				.user_grants_annotation
				.unwrap_or_else(|| DEFAULT_USER_GRANTS_ANNOTATION.to_string()),
			group_grants_annotation: self
				.group_grants_annotation
				.unwrap_or_else(|| DEFAULT_GROUP_GRANTS_ANNOTATION.to_string()),
			legacy_group_grants_annotation: self
				.legacy_group_grants_annotation
				.unwrap_or_else(|| DEFAULT_LEGACY_GROUP_GRANTS_ANNOTATION.to_string()),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthzConfig {
	/// Lets project checks fall back to organization grants.
	pub org_cascade_enabled: bool,
	pub user_grants_annotation: String,
	pub group_grants_annotation: String,
	/// Read when `group_grants_annotation` is absent on a resource.
	pub legacy_group_grants_annotation: String,
}

impl Default for AuthzConfig {
	fn default() -> Self {
		AuthzConfigLayer::default().finalize()
	}
}

impl AuthzConfig {
	pub fn annotation_keys(&self) -> GrantAnnotationKeys {
		GrantAnnotationKeys {
			user_key: self.user_grants_annotation.clone(),
			group_key: self.group_grants_annotation.clone(),
			legacy_group_key: self.legacy_group_grants_annotation.clone(),
		}
	}

	/// Settings to construct an `Authorizer` with.
	pub fn settings(&self) -> AuthzSettings {
		AuthzSettings {
			org_cascade_enabled: self.org_cascade_enabled,
			annotations: self.annotation_keys(),
		}
	}
}
