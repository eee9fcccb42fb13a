//! Business services on top of `models`.
//! - `lifecycle` owns every service-request status change and the paired
//!   professional availability bookkeeping.
//! - `profile_service` and `search_service` cover self-service profiles
//!   and the customer-facing professional directory.
//! - The remaining modules are plain CRUD and read-side helpers.

pub mod errors;
pub mod pagination;
pub mod auth;
pub mod lifecycle;
pub mod notify;
pub mod cache;
pub mod catalog_service;
pub mod request_service;
pub mod admin_service;
pub mod profile_service;
pub mod search_service;
pub mod stats_service;
#[cfg(test)]
pub mod test_support;
