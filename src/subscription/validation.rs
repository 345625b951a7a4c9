//! Input validation for tenant and plan identifiers.
//!
//! Identifiers come straight from request paths and session data, so they are
//! checked before being handed to a store.

use crate::error::{EntitlementError, Result};

/// Maximum length for tenant IDs.
const MAX_TENANT_ID_LENGTH: usize = 256;

/// Maximum length for plan IDs.
const MAX_PLAN_ID_LENGTH: usize = 64;

/// Validate a tenant (company) ID.
///
/// Tenant IDs must be non-empty, at most 256 characters, and contain only
/// alphanumeric characters, underscores, and hyphens.
///
/// # Errors
///
/// Returns `EntitlementError::BadRequest` if validation fails.
pub fn validate_tenant_id(id: &str) -> Result<()> {
    validate_identifier("tenant_id", id, MAX_TENANT_ID_LENGTH)
}

/// Validate a plan ID.
///
/// Same character rules as tenant IDs, capped at 64 characters.
///
/// # Errors
///
/// Returns `EntitlementError::BadRequest` if validation fails.
pub fn validate_plan_id(id: &str) -> Result<()> {
    validate_identifier("plan_id", id, MAX_PLAN_ID_LENGTH)
}

fn validate_identifier(field: &str, id: &str, max_len: usize) -> Result<()> {
    if id.is_empty() {
        return Err(EntitlementError::bad_request(format!("{} cannot be empty", field)));
    }

    if id.len() > max_len {
        return Err(EntitlementError::bad_request(format!(
            "{} exceeds maximum length of {}",
            field, max_len
        )));
    }

    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(EntitlementError::bad_request(format!(
            "{} contains invalid characters (only alphanumeric, underscore, and hyphen allowed)",
            field
        )));
    }

    Ok(())
}
