use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use models::{catalog, professional, service_request};

use crate::lifecycle::domain::{NewRequest, ProfessionalAvailability, ServiceRequest};
use crate::lifecycle::errors::LifecycleError;
use crate::lifecycle::machine::TransitionPlan;
use crate::lifecycle::repository::LifecycleRepository;

pub struct SeaOrmLifecycleRepository {
    pub db: DatabaseConnection,
}

fn persistence(e: DbErr) -> LifecycleError {
    LifecycleError::Persistence(e.to_string())
}

fn utc(ts: Option<sea_orm::prelude::DateTimeWithTimeZone>) -> Option<DateTime<Utc>> {
    ts.map(|t| t.with_timezone(&Utc))
}

impl TryFrom<service_request::Model> for ServiceRequest {
    type Error = LifecycleError;

    fn try_from(m: service_request::Model) -> Result<Self, Self::Error> {
        let status = m.status().map_err(|e| LifecycleError::Persistence(e.to_string()))?;
        Ok(ServiceRequest {
            id: m.id,
            service_id: m.service_id,
            customer_id: m.customer_id,
            professional_id: m.professional_id,
            status,
            request_date: m.request_date.with_timezone(&Utc),
            assigned_at: utc(m.assigned_at),
            accepted_at: utc(m.accepted_at),
            rejected_at: utc(m.rejected_at),
            completion_date: utc(m.completion_date),
            closed_at: utc(m.closed_at),
            cancelled_at: utc(m.cancelled_at),
            rating: m.rating,
            remarks: m.remarks,
            version: m.version,
        })
    }
}

impl From<professional::Model> for ProfessionalAvailability {
    fn from(m: professional::Model) -> Self {
        ProfessionalAvailability {
            professional_id: m.user_id,
            available: m.available,
            current_request: m.current_request,
            version: m.version,
        }
    }
}

async fn write_request(txn: &DatabaseTransaction, r: &ServiceRequest, now: DateTime<Utc>) -> Result<(), LifecycleError> {
    let am = service_request::ActiveModel {
        professional_id: Set(r.professional_id),
        status: Set(r.status.as_str().to_string()),
        assigned_at: Set(r.assigned_at.map(Into::into)),
        accepted_at: Set(r.accepted_at.map(Into::into)),
        rejected_at: Set(r.rejected_at.map(Into::into)),
        completion_date: Set(r.completion_date.map(Into::into)),
        closed_at: Set(r.closed_at.map(Into::into)),
        cancelled_at: Set(r.cancelled_at.map(Into::into)),
        rating: Set(r.rating),
        remarks: Set(r.remarks.clone()),
        version: Set(r.version + 1),
        updated_at: Set(now.into()),
        ..Default::default()
    };
    let res = service_request::Entity::update_many()
        .set(am)
        .filter(service_request::Column::Id.eq(r.id))
        .filter(service_request::Column::Version.eq(r.version))
        .exec(txn)
        .await
        .map_err(persistence)?;
    if res.rows_affected == 0 {
        debug!(request_id = %r.id, version = r.version, "stale request version");
        return Err(LifecycleError::ConcurrencyConflict);
    }
    Ok(())
}

async fn write_professional(txn: &DatabaseTransaction, p: &ProfessionalAvailability) -> Result<(), LifecycleError> {
    let am = professional::ActiveModel {
        available: Set(p.available),
        current_request: Set(p.current_request),
        version: Set(p.version + 1),
        ..Default::default()
    };
    let res = professional::Entity::update_many()
        .set(am)
        .filter(professional::Column::UserId.eq(p.professional_id))
        .filter(professional::Column::Version.eq(p.version))
        .exec(txn)
        .await
        .map_err(persistence)?;
    if res.rows_affected == 0 {
        debug!(professional_id = %p.professional_id, version = p.version, "stale professional version");
        return Err(LifecycleError::ConcurrencyConflict);
    }
    Ok(())
}

#[async_trait::async_trait]
impl LifecycleRepository for SeaOrmLifecycleRepository {
    async fn load_request(&self, id: Uuid) -> Result<Option<ServiceRequest>, LifecycleError> {
        service_request::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(persistence)?
            .map(ServiceRequest::try_from)
            .transpose()
    }

    async fn load_professional(&self, id: Uuid) -> Result<Option<ProfessionalAvailability>, LifecycleError> {
        let found = professional::Entity::find_by_id(id).one(&self.db).await.map_err(persistence)?;
        Ok(found.map(Into::into))
    }

    async fn create_request(&self, new: NewRequest) -> Result<ServiceRequest, LifecycleError> {
        let exists = catalog::Entity::find_by_id(new.service_id)
            .one(&self.db)
            .await
            .map_err(persistence)?
            .is_some();
        if !exists {
            return Err(LifecycleError::NotFound(format!("service {}", new.service_id)));
        }
        let created = service_request::create(&self.db, new.service_id, new.customer_id, new.remarks)
            .await
            .map_err(|e| LifecycleError::Persistence(e.to_string()))?;
        ServiceRequest::try_from(created)
    }

    async fn commit(&self, plan: &TransitionPlan) -> Result<ServiceRequest, LifecycleError> {
        let now = Utc::now();
        let txn = self.db.begin().await.map_err(persistence)?;
        let written = async {
            write_request(&txn, &plan.request, now).await?;
            for row in &plan.professionals {
                write_professional(&txn, row).await?;
            }
            Ok::<_, LifecycleError>(())
        }
        .await;
        match written {
            Ok(()) => txn.commit().await.map_err(persistence)?,
            Err(e) => {
                txn.rollback().await.map_err(persistence)?;
                return Err(e);
            }
        }
        let mut stored = plan.request.clone();
        stored.version += 1;
        Ok(stored)
    }
}
