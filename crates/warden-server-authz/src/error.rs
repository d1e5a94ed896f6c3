// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization error types.

use thiserror::Error;

/// Result type alias for authorization operations.
pub type AuthzResult<T> = Result<T, AuthzError>;

/// Errors that can occur while loading grants or deciding access.
#[derive(Debug, Error)]
pub enum AuthzError {
	/// A persisted grant list could not be decoded.
	///
	/// Callers must treat the resource as unreadable and deny, never as "no grants".
	#[error("malformed grants in {field}: {source}")]
	MalformedGrants {
		field: String,
		#[source]
		source: serde_json::Error,
	},

	/// A grant edit was rejected before touching the list.
	#[error("invalid grant: {0}")]
	InvalidGrant(String),

	/// The caller lacks the required permission.
	///
	/// The message is fixed and must never describe the grants that were checked.
	#[error("permission denied")]
	PermissionDenied,

	/// The organization-grant backend failed.
	#[error("organization grant lookup failed: {0}")]
	OrgGrantLookup(String),
}

impl AuthzError {
	/// Returns true for the denial outcome, as opposed to an operational failure.
	pub fn is_permission_denied(&self) -> bool {
		matches!(self, AuthzError::PermissionDenied)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn permission_denied_message_is_generic() {
		assert_eq!(AuthzError::PermissionDenied.to_string(), "permission denied");
		assert!(AuthzError::PermissionDenied.is_permission_denied());
	}

	#[test]
	fn malformed_grants_names_the_field() {
		let source = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
		let err = AuthzError::MalformedGrants {
			field: "warden.dev/user-grants".to_string(),
			source,
		};
		assert!(err.to_string().contains("warden.dev/user-grants"));
		assert!(!err.is_permission_denied());
	}
}
