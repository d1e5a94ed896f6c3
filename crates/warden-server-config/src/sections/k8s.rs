// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Kubernetes storage configuration section.

use serde::{Deserialize, Serialize};

fn default_organization_label() -> String {
	"warden.dev/organization".to_string()
}

fn default_project_label() -> String {
	"warden.dev/project".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct K8sConfigLayer {
	pub organization_label: Option<String>,
	pub project_label: Option<String>,
}

impl K8sConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.organization_label.is_some() {
			self.organization_label = other.organization_label;
		}
		if other.project_label.is_some() {
			self.project_label = other.project_label;
		}
	}

	pub fn finalize(self) -> K8sConfig {
		K8sConfig {
			organization_label: self
				.organization_label
				.unwrap_or_else(default_organization_label),
			project_label: self.project_label.unwrap_or_else(default_project_label),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct K8sConfig {
	/// Label on a project namespace naming its organization namespace.
	pub organization_label: String,
	/// Label on a secret naming its project namespace.
	pub project_label: String,
}

impl Default for K8sConfig {
	fn default() -> Self {
		Self {
			organization_label: default_organization_label(),
			project_label: default_project_label(),
		}
	}
}
