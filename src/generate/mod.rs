/// Request/response boundary of the scene generation service.
pub(crate) mod service;
