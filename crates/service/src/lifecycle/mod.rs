//! Service-request lifecycle: the only code allowed to change a request's
//! status or a professional's availability.
//!
//! Layers follow the auth module: `domain` types, a pure `machine` planner
//! with its `tracker`, a `repository` trait (in-memory and SeaORM
//! implementations) and the `service` that ties them together.

pub mod domain;
pub mod errors;
pub mod tracker;
pub mod machine;
pub mod repository;
pub mod repo;
pub mod service;

pub use domain::{ActingUser, Command, LifecycleEvent, NewRequest, ProfessionalAvailability, ServiceRequest};
pub use errors::LifecycleError;
pub use service::LifecycleService;
