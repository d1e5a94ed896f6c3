// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Warden operator CLI.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{DateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_server_authz::{Authorizer, Caller, Decision, Permission, Scope};
use warden_server_config::ServerConfig;
use warden_server_k8s::{KubeClient, NamespaceGrantStore, ResourceLabels};

mod fixture;
mod grants_cmd;

use fixture::Fixture;
use grants_cmd::GrantsAction;

/// Warden - access checks and grant maintenance for the console backend.
#[derive(Parser, Debug)]
#[command(name = "warden", about = "Warden authorization tooling", version)]
struct Args {
	/// Config file (defaults to /etc/warden/server.toml)
	#[arg(long, global = true, env = "WARDEN_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(clap::Args, Debug)]
struct CallerArgs {
	/// Caller email
	#[arg(long)]
	email: String,

	/// Group the caller belongs to (repeatable)
	#[arg(long = "group")]
	groups: Vec<String>,

	/// Permission to check, e.g. `projects.write`
	#[arg(long, value_parser = parse_permission)]
	permission: Permission,

	/// Reference instant in Unix seconds (defaults to now)
	#[arg(long)]
	now: Option<i64>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Check access against a JSON fixture
	Check {
		#[arg(long)]
		fixture: PathBuf,

		#[command(flatten)]
		caller: CallerArgs,
	},
	/// Check access against live cluster objects
	ClusterCheck {
		/// Organization or project namespace
		#[arg(long)]
		namespace: String,

		/// Secret name inside the namespace (for secret permissions)
		#[arg(long)]
		secret: Option<String>,

		#[command(flatten)]
		caller: CallerArgs,
	},
	/// Edit an encoded grant list read from a file, writing the result to stdout
	Grants {
		#[arg(long)]
		file: PathBuf,

		/// Reference instant in Unix seconds (defaults to now)
		#[arg(long, global = true)]
		now: Option<i64>,

		#[command(subcommand)]
		action: GrantsAction,
	},
}

fn parse_permission(s: &str) -> Result<Permission, String> {
	Permission::from_name(s).ok_or_else(|| {
		let known: Vec<&str> = Permission::all().iter().map(|p| p.as_str()).collect();
		format!("unknown permission '{s}', expected one of: {}", known.join(", "))
	})
}

fn reference_time(now: Option<i64>) -> anyhow::Result<DateTime<Utc>> {
	match now {
		Some(secs) => Utc
			.timestamp_opt(secs, 0)
			.single()
			.with_context(|| format!("timestamp {secs} is out of range")),
		None => Ok(Utc::now()),
	}
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<ServerConfig> {
	let config = match path {
		Some(path) => warden_server_config::load_config_with_file(path)?,
		None => warden_server_config::load_config()?,
	};
	Ok(config)
}

fn report(decision: Decision) -> ExitCode {
	if decision.is_allowed() {
		println!("allowed");
		ExitCode::SUCCESS
	} else {
		println!("{}", warden_server_authz::AuthzError::PermissionDenied);
		ExitCode::from(1)
	}
}

async fn cluster_check(
	config: &ServerConfig,
	namespace: &str,
	secret: Option<&str>,
	caller: &Caller,
	permission: Permission,
	now: DateTime<Utc>,
) -> anyhow::Result<Decision> {
	let client = KubeClient::new().await?;
	let store = NamespaceGrantStore::new(Arc::new(client), config.authz.annotation_keys()).with_labels(
		ResourceLabels {
			organization_label: config.k8s.organization_label.clone(),
			project_label: config.k8s.project_label.clone(),
		},
	);
	let authz = Authorizer::new(config.authz.settings()).with_org_resolver(Arc::new(store.clone()));

	let decision = match permission.scope() {
		Scope::Organization => {
			authz
				.check_organization(caller, namespace, permission, now)
				.await
		}
		Scope::Project => {
			let project = store.load_project(namespace).await?;
			authz.check_project(caller, &project, permission, now).await
		}
		Scope::Secret => {
			let Some(name) = secret else {
				bail!("--secret is required for {permission}");
			};
			let secret = store.load_secret(namespace, name).await?;
			authz.check_secret(caller, &secret, permission, now)
		}
	};
	Ok(decision)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
	let args = Args::parse();

	let config = load_config(args.config)?;

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	match args.command {
		Command::Check { fixture, caller } => {
			let loaded = Fixture::load(&fixture)?;
			let now = reference_time(caller.now)?;
			let who = Caller::new(caller.email, caller.groups);
			let outcome =
				fixture::evaluate(&loaded, config.authz.settings(), &who, caller.permission, now)
					.await?;
			tracing::info!(
				permission = %caller.permission,
				direct_role = %outcome.direct_role,
				"fixture check complete"
			);
			Ok(report(outcome.decision))
		}
		Command::ClusterCheck {
			namespace,
			secret,
			caller,
		} => {
			let now = reference_time(caller.now)?;
			let who = Caller::new(caller.email, caller.groups);
			let decision = cluster_check(
				&config,
				&namespace,
				secret.as_deref(),
				&who,
				caller.permission,
				now,
			)
			.await?;
			Ok(report(decision))
		}
		Command::Grants { file, now, action } => {
			let raw = std::fs::read_to_string(&file)
				.with_context(|| format!("failed to read {}", file.display()))?;
			let out = grants_cmd::apply(&action, &raw, reference_time(now)?)?;
			println!("{out}");
			Ok(ExitCode::SUCCESS)
		}
	}
}
