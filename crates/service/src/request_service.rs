//! Read side of service requests. Writes go through `lifecycle`.

use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use uuid::Uuid;

use common::types::Page;
use models::service_request::{self, RequestStatus};
use crate::{errors::ServiceError, lifecycle::ServiceRequest, pagination::Pagination};

/// Resolve a status filter. Professionals may also use the dashboard groups
/// `new`, `active` and `completed`.
pub fn statuses_for(filter: &str, allow_groups: bool) -> Result<Vec<RequestStatus>, ServiceError> {
    let f = filter.trim().to_lowercase();
    if allow_groups {
        match f.as_str() {
            "new" => return Ok(vec![RequestStatus::Assigned]),
            "active" => return Ok(vec![RequestStatus::Accepted]),
            "completed" => return Ok(vec![RequestStatus::Completed, RequestStatus::Closed]),
            _ => {}
        }
    }
    let status = f.parse::<RequestStatus>()?;
    Ok(vec![status])
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestFilter {
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
    pub professional_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
}

fn status_condition(statuses: &[RequestStatus]) -> sea_orm::sea_query::SimpleExpr {
    service_request::Column::Status.is_in(statuses.iter().map(|s| s.as_str()))
}

fn to_domain(m: service_request::Model) -> Result<ServiceRequest, ServiceError> {
    ServiceRequest::try_from(m).map_err(|e| ServiceError::Db(e.to_string()))
}

async fn fetch(db: &DatabaseConnection, cond: Condition, opts: Pagination) -> Result<Page<ServiceRequest>, ServiceError> {
    let (page_idx, per_page) = opts.normalize();
    let paginator = service_request::Entity::find()
        .filter(cond)
        .order_by_desc(service_request::Column::RequestDate)
        .paginate(db, per_page);
    let total = paginator.num_items().await?;
    let items = paginator
        .fetch_page(page_idx)
        .await?
        .into_iter()
        .map(to_domain)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(opts.into_page(items, total))
}

/// A customer's own requests, newest first.
pub async fn list_customer_requests(
    db: &DatabaseConnection,
    customer_id: Uuid,
    status: Option<&str>,
    opts: Pagination,
) -> Result<Page<ServiceRequest>, ServiceError> {
    let mut cond = Condition::all().add(service_request::Column::CustomerId.eq(customer_id));
    if let Some(s) = status.filter(|s| !s.trim().is_empty()) {
        cond = cond.add(status_condition(&statuses_for(s, false)?));
    }
    fetch(db, cond, opts).await
}

pub async fn get_customer_request(db: &DatabaseConnection, customer_id: Uuid, id: Uuid) -> Result<ServiceRequest, ServiceError> {
    let found = service_request::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("request"))?;
    if found.customer_id != customer_id {
        return Err(ServiceError::Forbidden("request belongs to another customer".into()));
    }
    to_domain(found)
}

/// Requests assigned to a professional, filtered by status or group.
pub async fn list_professional_requests(
    db: &DatabaseConnection,
    professional_id: Uuid,
    status: Option<&str>,
    opts: Pagination,
) -> Result<Page<ServiceRequest>, ServiceError> {
    let mut cond = Condition::all().add(service_request::Column::ProfessionalId.eq(professional_id));
    if let Some(s) = status.filter(|s| !s.trim().is_empty()) {
        cond = cond.add(status_condition(&statuses_for(s, true)?));
    }
    fetch(db, cond, opts).await
}

pub async fn list_all_requests(db: &DatabaseConnection, filter: &RequestFilter, opts: Pagination) -> Result<Page<ServiceRequest>, ServiceError> {
    let mut cond = Condition::all();
    if let Some(s) = filter.status.as_deref().filter(|s| !s.trim().is_empty()) {
        cond = cond.add(status_condition(&statuses_for(s, false)?));
    }
    if let Some(id) = filter.customer_id {
        cond = cond.add(service_request::Column::CustomerId.eq(id));
    }
    if let Some(id) = filter.professional_id {
        cond = cond.add(service_request::Column::ProfessionalId.eq(id));
    }
    if let Some(id) = filter.service_id {
        cond = cond.add(service_request::Column::ServiceId.eq(id));
    }
    fetch(db, cond, opts).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn professional_groups_expand() {
        assert_eq!(statuses_for("new", true).unwrap(), vec![RequestStatus::Assigned]);
        assert_eq!(statuses_for("completed", true).unwrap(), vec![RequestStatus::Completed, RequestStatus::Closed]);
        assert_eq!(statuses_for("Accepted", true).unwrap(), vec![RequestStatus::Accepted]);
    }

    #[test]
    fn groups_are_not_statuses_for_customers() {
        assert!(statuses_for("new", false).is_err());
        assert_eq!(statuses_for("completed", false).unwrap(), vec![RequestStatus::Completed]);
        assert!(matches!(statuses_for("bogus", true), Err(ServiceError::Model(_))));
    }
}
