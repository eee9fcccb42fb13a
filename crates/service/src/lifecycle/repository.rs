use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{NewRequest, ProfessionalAvailability, ServiceRequest};
use super::errors::LifecycleError;
use super::machine::TransitionPlan;

/// Storage seam for the lifecycle.
///
/// `commit` must apply the request row and every professional row of the
/// plan atomically, each guarded by the version it was read at. A guard
/// that no longer matches fails the whole commit with
/// `LifecycleError::ConcurrencyConflict`.
#[async_trait]
pub trait LifecycleRepository: Send + Sync {
    async fn load_request(&self, id: Uuid) -> Result<Option<ServiceRequest>, LifecycleError>;
    async fn load_professional(&self, id: Uuid) -> Result<Option<ProfessionalAvailability>, LifecycleError>;
    async fn create_request(&self, new: NewRequest) -> Result<ServiceRequest, LifecycleError>;
    /// Returns the request as stored, with its bumped version.
    async fn commit(&self, plan: &TransitionPlan) -> Result<ServiceRequest, LifecycleError>;
}

/// In-memory repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use chrono::Utc;
    use models::service_request::RequestStatus;

    #[derive(Default)]
    struct Store {
        services: HashSet<Uuid>,
        requests: HashMap<Uuid, ServiceRequest>,
        professionals: HashMap<Uuid, ProfessionalAvailability>,
    }

    /// One mutex over everything, so a commit is all-or-nothing.
    #[derive(Default)]
    pub struct MockLifecycleRepository {
        store: Mutex<Store>,
        fail_next_commit: AtomicBool,
    }

    impl MockLifecycleRepository {
        pub fn add_service(&self, id: Uuid) {
            self.store.lock().unwrap().services.insert(id);
        }

        pub fn add_professional(&self, id: Uuid) {
            self.store.lock().unwrap().professionals.insert(id, ProfessionalAvailability::free(id));
        }

        pub fn professional(&self, id: Uuid) -> Option<ProfessionalAvailability> {
            self.store.lock().unwrap().professionals.get(&id).cloned()
        }

        pub fn request(&self, id: Uuid) -> Option<ServiceRequest> {
            self.store.lock().unwrap().requests.get(&id).cloned()
        }

        pub fn all_professionals(&self) -> Vec<ProfessionalAvailability> {
            self.store.lock().unwrap().professionals.values().cloned().collect()
        }

        /// Make the next `commit` fail as if the database went away.
        pub fn fail_next_commit(&self) {
            self.fail_next_commit.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl LifecycleRepository for MockLifecycleRepository {
        async fn load_request(&self, id: Uuid) -> Result<Option<ServiceRequest>, LifecycleError> {
            Ok(self.store.lock().unwrap().requests.get(&id).cloned())
        }

        async fn load_professional(&self, id: Uuid) -> Result<Option<ProfessionalAvailability>, LifecycleError> {
            Ok(self.store.lock().unwrap().professionals.get(&id).cloned())
        }

        async fn create_request(&self, new: NewRequest) -> Result<ServiceRequest, LifecycleError> {
            let mut store = self.store.lock().unwrap();
            if !store.services.contains(&new.service_id) {
                return Err(LifecycleError::NotFound(format!("service {}", new.service_id)));
            }
            let req = ServiceRequest {
                id: Uuid::new_v4(),
                service_id: new.service_id,
                customer_id: new.customer_id,
                professional_id: None,
                status: RequestStatus::Requested,
                request_date: Utc::now(),
                assigned_at: None,
                accepted_at: None,
                rejected_at: None,
                completion_date: None,
                closed_at: None,
                cancelled_at: None,
                rating: None,
                remarks: new.remarks,
                version: 0,
            };
            store.requests.insert(req.id, req.clone());
            Ok(req)
        }

        async fn commit(&self, plan: &TransitionPlan) -> Result<ServiceRequest, LifecycleError> {
            let mut store = self.store.lock().unwrap();
            if self.fail_next_commit.swap(false, Ordering::SeqCst) {
                return Err(LifecycleError::Persistence("simulated commit failure".into()));
            }

            // Check every guard before touching anything.
            let current = store
                .requests
                .get(&plan.request.id)
                .ok_or_else(|| LifecycleError::NotFound(format!("request {}", plan.request.id)))?;
            if current.version != plan.request.version {
                return Err(LifecycleError::ConcurrencyConflict);
            }
            for row in &plan.professionals {
                match store.professionals.get(&row.professional_id) {
                    Some(stored) if stored.version == row.version => {}
                    _ => return Err(LifecycleError::ConcurrencyConflict),
                }
            }

            for row in &plan.professionals {
                let mut updated = row.clone();
                updated.version += 1;
                store.professionals.insert(updated.professional_id, updated);
            }
            let mut updated = plan.request.clone();
            updated.version += 1;
            store.requests.insert(updated.id, updated.clone());
            Ok(updated)
        }
    }
}
