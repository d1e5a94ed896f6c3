// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for the Warden server.

pub mod authz;
pub mod k8s;
pub mod logging;

pub use authz::{AuthzConfig, AuthzConfigLayer};
pub use k8s::{K8sConfig, K8sConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
