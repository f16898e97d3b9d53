//! Coarse authorization at the verified-token boundary
//!
//! Token verification happened upstream in the auth service; here the
//! claims are only mapped onto a domain principal and checked against the
//! role rules.

use crate::error::forbidden;
use crate::types::Claims;
use clinicq_core::domain::{Principal, Role};
use jsonrpsee::types::ErrorObjectOwned;

/// Map verified claims to a domain principal
pub fn principal(claims: &Claims) -> Result<Principal, ErrorObjectOwned> {
    let role = Role::parse(&claims.role)
        .ok_or_else(|| forbidden(format!("Unknown role: {}", claims.role)))?;
    Ok(Principal::new(claims.subject.clone(), role))
}

/// Queue mutations (admit, call-next, transitions) are staff/doctor only
pub fn require_queue_manager(claims: &Claims) -> Result<Principal, ErrorObjectOwned> {
    let principal = principal(claims)?;
    if !principal.role.may_manage_queue() {
        return Err(forbidden(format!(
            "Role {} may not manage the queue",
            principal.role
        )));
    }
    Ok(principal)
}
