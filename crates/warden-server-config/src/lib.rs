// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the Warden server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`WARDEN_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use warden_server_config::load_config;
//! use warden_server_authz::Authorizer;
//!
//! let config = load_config()?;
//! let authorizer = Authorizer::new(config.authz.settings());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerConfig {
	pub authz: AuthzConfig,
	pub k8s: K8sConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WARDEN_SERVER_*`)
/// 2. Config file (`/etc/warden/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	let mut merged = ServerConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Load configuration from an explicit set of sources, applied in precedence order.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let authz = layer.authz.unwrap_or_default().finalize();
	let k8s = layer.k8s.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&authz, &k8s)?;

	info!(
		org_cascade_enabled = authz.org_cascade_enabled,
		user_grants_annotation = %authz.user_grants_annotation,
		group_grants_annotation = %authz.group_grants_annotation,
		organization_label = %k8s.organization_label,
		log_level = %logging.level,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		authz,
		k8s,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(authz: &AuthzConfig, k8s: &K8sConfig) -> Result<(), ConfigError> {
	let keys = [
		("authz.user_grants_annotation", &authz.user_grants_annotation),
		("authz.group_grants_annotation", &authz.group_grants_annotation),
		(
			"authz.legacy_group_grants_annotation",
			&authz.legacy_group_grants_annotation,
		),
		("k8s.organization_label", &k8s.organization_label),
		("k8s.project_label", &k8s.project_label),
	];
	for (name, value) in keys {
		if value.trim().is_empty() {
			return Err(ConfigError::Validation(format!("{name} must not be empty")));
		}
	}

	if authz.user_grants_annotation == authz.group_grants_annotation
		|| authz.user_grants_annotation == authz.legacy_group_grants_annotation
	{
		return Err(ConfigError::Validation(format!(
			"authz.user_grants_annotation '{}' collides with a group grants annotation; \
			 user and group grants must be stored under different keys",
			authz.user_grants_annotation
		)));
	}

	Ok(())
}
