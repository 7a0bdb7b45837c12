pub mod device_identity_bo;
pub mod runtime_flags_bo;
