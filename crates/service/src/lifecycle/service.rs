use std::sync::Arc;

use chrono::Utc;
use models::user::Role;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use common::metrics;

use super::domain::{ActingUser, Command, LifecycleEvent, NewRequest, ServiceRequest};
use super::errors::LifecycleError;
use super::machine;
use super::repository::LifecycleRepository;
use crate::notify::Notifier;

/// The lifecycle controller. Framework independent; the HTTP layer hands in
/// the acting user and maps `LifecycleError` to responses.
pub struct LifecycleService<R: LifecycleRepository> {
    repo: Arc<R>,
    notifier: Notifier,
}

impl<R: LifecycleRepository> Clone for LifecycleService<R> {
    fn clone(&self) -> Self {
        Self { repo: self.repo.clone(), notifier: self.notifier.clone() }
    }
}

impl<R: LifecycleRepository> LifecycleService<R> {
    pub fn new(repo: Arc<R>, notifier: Notifier) -> Self { Self { repo, notifier } }

    pub fn repository(&self) -> &R { &self.repo }

    /// Open a new request in `requested` state.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::lifecycle::{ActingUser, LifecycleService, repository::mock::MockLifecycleRepository};
    /// use service::notify::Notifier;
    /// use models::{service_request::RequestStatus, user::Role};
    /// let repo = Arc::new(MockLifecycleRepository::default());
    /// let service_id = uuid::Uuid::new_v4();
    /// repo.add_service(service_id);
    /// let svc = LifecycleService::new(repo, Notifier::default());
    /// let customer = ActingUser::new(uuid::Uuid::new_v4(), Role::Customer);
    /// let req = tokio_test::block_on(svc.create(&customer, service_id, None)).unwrap();
    /// assert_eq!(req.status, RequestStatus::Requested);
    /// ```
    #[instrument(skip_all, fields(customer = %actor.id, service_id = %service_id))]
    pub async fn create(&self, actor: &ActingUser, service_id: Uuid, remarks: Option<String>) -> Result<ServiceRequest, LifecycleError> {
        if actor.role != Role::Customer {
            let err = LifecycleError::Forbidden("create requires the customer role".into());
            metrics::record_failure("create", err.kind());
            return Err(err);
        }
        let created = match self.repo.create_request(NewRequest { service_id, customer_id: actor.id, remarks }).await {
            Ok(r) => r,
            Err(e) => {
                metrics::record_failure("create", e.kind());
                return Err(e);
            }
        };
        metrics::record_transition("create");
        info!(request_id = %created.id, to = %created.status, "request_created");
        self.notifier.publish(LifecycleEvent {
            request_id: created.id,
            from: None,
            to: created.status,
            customer_id: created.customer_id,
            professionals: Vec::new(),
            at: created.request_date,
        });
        Ok(created)
    }

    #[instrument(skip_all, fields(request_id = %request_id, professional_id = %professional_id, actor = %actor.id))]
    pub async fn assign(&self, request_id: Uuid, professional_id: Uuid, actor: &ActingUser) -> Result<ServiceRequest, LifecycleError> {
        self.transition(request_id, actor, Command::Assign { professional_id }).await
    }

    #[instrument(skip_all, fields(request_id = %request_id, actor = %actor.id))]
    pub async fn accept(&self, request_id: Uuid, actor: &ActingUser) -> Result<ServiceRequest, LifecycleError> {
        self.transition(request_id, actor, Command::Accept).await
    }

    #[instrument(skip_all, fields(request_id = %request_id, actor = %actor.id))]
    pub async fn reject(&self, request_id: Uuid, actor: &ActingUser) -> Result<ServiceRequest, LifecycleError> {
        self.transition(request_id, actor, Command::Reject).await
    }

    #[instrument(skip_all, fields(request_id = %request_id, actor = %actor.id))]
    pub async fn complete(&self, request_id: Uuid, actor: &ActingUser) -> Result<ServiceRequest, LifecycleError> {
        self.transition(request_id, actor, Command::Complete).await
    }

    /// Rate and close a completed request.
    #[instrument(skip_all, fields(request_id = %request_id, rating = ?rating, actor = %actor.id))]
    pub async fn close(&self, request_id: Uuid, rating: Option<f64>, remarks: Option<String>, actor: &ActingUser) -> Result<ServiceRequest, LifecycleError> {
        self.transition(request_id, actor, Command::Close { rating, remarks }).await
    }

    #[instrument(skip_all, fields(request_id = %request_id, actor = %actor.id))]
    pub async fn unassign(&self, request_id: Uuid, actor: &ActingUser) -> Result<ServiceRequest, LifecycleError> {
        self.transition(request_id, actor, Command::Unassign).await
    }

    #[instrument(skip_all, fields(request_id = %request_id, actor = %actor.id))]
    pub async fn cancel(&self, request_id: Uuid, actor: &ActingUser) -> Result<ServiceRequest, LifecycleError> {
        self.transition(request_id, actor, Command::Cancel).await
    }

    async fn transition(&self, request_id: Uuid, actor: &ActingUser, command: Command) -> Result<ServiceRequest, LifecycleError> {
        let op = command.name();
        match self.apply(request_id, actor, &command).await {
            Ok((stored, event)) => {
                metrics::record_transition(op);
                info!(op, from = ?event.from, to = %event.to, version = stored.version, "request_transition");
                self.notifier.publish(event);
                Ok(stored)
            }
            Err(e) => {
                metrics::record_failure(op, e.kind());
                match &e {
                    LifecycleError::Persistence(_) => warn!(op, error = %e, "transition failed"),
                    _ => debug!(op, error = %e, "transition refused"),
                }
                Err(e)
            }
        }
    }

    async fn apply(&self, request_id: Uuid, actor: &ActingUser, command: &Command) -> Result<(ServiceRequest, LifecycleEvent), LifecycleError> {
        let request = self
            .repo
            .load_request(request_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("request {request_id}")))?;

        let mut professionals = Vec::new();
        for id in machine::involved_professionals(&request, command) {
            if let Some(row) = self.repo.load_professional(id).await? {
                professionals.push(row);
            }
        }

        let now = Utc::now();
        let plan = machine::plan(&request, actor, command, professionals, now)?;
        let stored = self.repo.commit(&plan).await?;
        Ok((stored, plan.event(now)))
    }
}
