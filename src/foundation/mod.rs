//! Core value types, the error taxonomy, and small numeric helpers.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod math;
