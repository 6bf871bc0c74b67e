//! Integration tests

mod notification_flow;
mod rest_api;
