pub mod staff_identity;

pub use staff_identity::StaffIdentity;
