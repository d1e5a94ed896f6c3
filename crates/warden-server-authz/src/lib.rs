// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Grant-based, scope-cascading authorization for Warden.
//!
//! Resources form three nested tiers: organizations contain projects, projects
//! contain secrets. Each resource carries sharing grants for users and groups.
//!
//! # Architecture
//!
//! - **Types** ([`types`]): roles, scopes, permissions, and principal comparison
//! - **Grants** ([`grant`]): the persisted codec, time windows, deduplication, and
//!   grant-list editing
//! - **Policy** ([`policy`]): the role table, the cascade tables, and the grant check
//! - **Resources** ([`resource`]): callers, grant buckets, and projects/secrets
//! - **Authorizer** ([`authorizer`]): per-operation checks combining the above
//!
//! Every decision is a pure function of the grants passed in and the reference
//! instant. The only asynchronous seam is [`OrgGrantResolver`], which loads
//! organization grants for the project cascade.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use warden_server_authz::{
//!     Authorizer, AuthzSettings, Caller, Grant, Permission, ProjectResource, ResourceGrants,
//!     Role, SecretResource,
//! };
//!
//! let project = ProjectResource::new(
//!     "billing",
//!     ResourceGrants::new(vec![Grant::new("alice@example.com", Role::Owner)], Vec::new()),
//! );
//! let secret = SecretResource::new("db-password", ResourceGrants::default(), project);
//! let authz = Authorizer::new(AuthzSettings::default());
//! let alice = Caller::new("Alice@Example.com", Vec::<String>::new());
//!
//! // Project owners manage secrets but never read their values.
//! assert!(authz.check_secret(&alice, &secret, Permission::SecretsList, Utc::now()).is_allowed());
//! assert!(!authz.check_secret(&alice, &secret, Permission::SecretsRead, Utc::now()).is_allowed());
//! ```

pub mod authorizer;
pub mod error;
pub mod grant;
pub mod policy;
pub mod resource;
pub mod types;

pub use authorizer::{Authorizer, OrgGrantResolver};
pub use error::{AuthzError, AuthzResult};
pub use grant::{
	active_grants, deduplicate, parse_grants, prune_expired, revoke_grant, serialize_grants,
	set_grant, upsert_grant, ActiveGrantMap, Grant,
};
pub use policy::{
	best_role, cascade_permission, cascade_rules, check_grants, has_permission, permissions_for,
	CascadeRule, Decision,
};
pub use resource::{
	ActiveGrants, AuthzSettings, Caller, GrantAnnotationKeys, ProjectResource, ResourceGrants,
	SecretResource, DEFAULT_GROUP_GRANTS_ANNOTATION, DEFAULT_LEGACY_GROUP_GRANTS_ANNOTATION,
	DEFAULT_USER_GRANTS_ANNOTATION,
};
pub use types::{principal_eq, Permission, Role, Scope};
