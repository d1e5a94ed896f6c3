// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Grant-list maintenance on a single persisted annotation value.

use anyhow::{bail, Context};
use chrono::{DateTime, TimeZone, Utc};
use clap::Subcommand;
use tracing::info;
use warden_server_authz::{
	deduplicate, parse_grants, prune_expired, revoke_grant, serialize_grants, set_grant,
	upsert_grant, Grant, Role,
};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum GrantsAction {
	/// Collapse the list to one record per principal, keeping the highest role
	Dedup,
	/// Add a grant; an existing higher role for the principal is kept
	Upsert {
		#[arg(long)]
		principal: String,
		/// viewer, editor, or owner
		#[arg(long)]
		role: String,
		/// Not-before, Unix seconds
		#[arg(long)]
		not_before: Option<i64>,
		/// Expiry, Unix seconds
		#[arg(long)]
		expires: Option<i64>,
		/// Replace the principal's records even with a lower role
		#[arg(long)]
		replace: bool,
	},
	/// Remove every record for a principal (case-insensitive)
	Revoke {
		#[arg(long)]
		principal: String,
	},
	/// Drop expired grants
	Prune,
}

fn timestamp(secs: i64) -> anyhow::Result<DateTime<Utc>> {
	Utc.timestamp_opt(secs, 0)
		.single()
		.with_context(|| format!("timestamp {secs} is out of range"))
}

fn parse_role(name: &str) -> anyhow::Result<Role> {
	match Role::from_name(name) {
		Role::Unspecified => bail!("unknown role '{name}', expected viewer, editor, or owner"),
		role => Ok(role),
	}
}

/// Applies `action` to the encoded grant list `raw` and returns the new encoding.
pub fn apply(action: &GrantsAction, raw: &str, now: DateTime<Utc>) -> anyhow::Result<String> {
	let grants = parse_grants("input", Some(raw))?;
	let before = grants.len();

	let updated = match action {
		GrantsAction::Dedup => deduplicate(&grants),
		GrantsAction::Upsert {
			principal,
			role,
			not_before,
			expires,
			replace,
		} => {
			let mut grant = Grant::new(principal.clone(), parse_role(role)?);
			if let Some(secs) = not_before {
				grant = grant.with_not_before(timestamp(*secs)?);
			}
			if let Some(secs) = expires {
				grant = grant.with_expiry(timestamp(*secs)?);
			}
			if *replace {
				set_grant(&grants, grant)?
			} else {
				upsert_grant(&grants, grant)?
			}
		}
		GrantsAction::Revoke { principal } => revoke_grant(&grants, principal),
		GrantsAction::Prune => prune_expired(&grants, now),
	};

	info!(before, after = updated.len(), "grant list updated");
	Ok(serialize_grants(&updated)?)
}
