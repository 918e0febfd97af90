//! Middleware module - inbound rate limiting

pub mod rate_limit;
