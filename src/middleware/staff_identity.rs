use crate::core::AppError;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use std::future::{ready, Ready};

/// Acting staff identity, injected by the identity/authorization gateway as
/// request headers. Every mutating ledger operation is attributed to it.
///
/// Authentication itself happens upstream; this subsystem only consumes the
/// already-verified identity.
#[derive(Debug, Clone)]
pub struct StaffIdentity {
    pub staff_id: String,
    pub staff_name: String,
}

impl StaffIdentity {
    /// Label used for audit attribution in logs
    pub fn audit_label(&self) -> String {
        format!("{} ({})", self.staff_name, self.staff_id)
    }
}

impl FromRequest for StaffIdentity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let staff_id = req
            .headers()
            .get("X-Staff-Id")
            .and_then(|h| h.to_str().ok())
            .map(str::to_owned);

        let staff_name = req
            .headers()
            .get("X-Staff-Name")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("unknown")
            .to_owned();

        ready(match staff_id {
            Some(staff_id) if !staff_id.is_empty() => Ok(StaffIdentity {
                staff_id,
                staff_name,
            }),
            _ => Err(AppError::unauthorized("Missing X-Staff-Id header")),
        })
    }
}
