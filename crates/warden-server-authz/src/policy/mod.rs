// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fixed authorization policy.
//!
//! The policy is three static tables and the functions that read them:
//!
//! 1. **Roles** ([`roles`]): which permissions each [`Role`](crate::Role) carries
//! 2. **Cascade** ([`cascade`]): which broader-scope permission may stand in for a
//!    narrower one when no direct grant exists
//! 3. **Engine** ([`engine`]): best-role resolution and the grant check itself
//!
//! There is no rule composition, no attribute condition beyond the time windows
//! already applied to grants, and no deny-overrides.

pub mod cascade;
pub mod engine;
pub mod roles;

pub use cascade::{cascade_permission, cascade_rules, CascadeRule};
pub use engine::{best_role, check_grants, Decision};
pub use roles::{has_permission, permissions_for};
