//! API module - route table and request handlers

pub mod handlers;
pub mod routes;
