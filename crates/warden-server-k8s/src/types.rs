// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

pub use k8s_openapi::api::core::v1::{Namespace, Secret};
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Label on a project namespace naming its organization namespace.
pub const DEFAULT_ORGANIZATION_LABEL: &str = "warden.dev/organization";
/// Label on a secret naming its project namespace.
pub const DEFAULT_PROJECT_LABEL: &str = "warden.dev/project";

/// Labels that link resources to their parents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLabels {
	pub organization_label: String,
	pub project_label: String,
}

impl Default for ResourceLabels {
	fn default() -> Self {
		Self {
			organization_label: DEFAULT_ORGANIZATION_LABEL.to_string(),
			project_label: DEFAULT_PROJECT_LABEL.to_string(),
		}
	}
}

pub(crate) fn annotations(meta: &ObjectMeta) -> BTreeMap<String, String> {
	meta.annotations.clone().unwrap_or_default()
}

pub(crate) fn label<'a>(meta: &'a ObjectMeta, key: &str) -> Option<&'a str> {
	meta.labels
		.as_ref()
		.and_then(|labels| labels.get(key))
		.map(String::as_str)
		.filter(|v| !v.is_empty())
}
