// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Kubernetes-backed grant storage for Warden.
//!
//! This crate provides:
//! - A trait-based K8s client abstraction for testability
//! - Production implementation using the kube crate
//! - An in-memory mock client
//! - [`NamespaceGrantStore`], which reads and writes grant annotations and serves
//!   as the organization-grant resolver for the authorizer

mod client;
mod error;
mod grants;
mod kube_client;
mod mock;
mod types;

pub use client::K8sClient;
pub use error::{K8sError, K8sResult};
pub use grants::NamespaceGrantStore;
pub use kube_client::KubeClient;
pub use mock::MockK8sClient;
pub use types::{
	Namespace, ObjectMeta, ResourceLabels, Secret, DEFAULT_ORGANIZATION_LABEL,
	DEFAULT_PROJECT_LABEL,
};
