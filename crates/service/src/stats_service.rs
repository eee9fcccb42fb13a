//! Dashboard statistics, served through `StatsCache`.

use std::collections::BTreeMap;

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use models::professional::{self, ProfessionalStatus};
use models::service_request::{self, RequestStatus};
use models::user::{self, Role};
use models::catalog;
use crate::cache::{StatsCache, StatsKey};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdminStats {
    pub total_services: u64,
    pub services_by_type: BTreeMap<String, u64>,
    pub total_requests: u64,
    pub pending_requests: u64,
    pub requests_by_status: BTreeMap<String, u64>,
    pub total_professionals: u64,
    pub active_professionals: u64,
    pub pending_professionals: u64,
    pub total_customers: u64,
    pub active_customers: u64,
}

/// Per-user breakdown shared by the customer and professional dashboards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestSummary {
    pub total_requests: u64,
    pub status_counts: BTreeMap<String, u64>,
    pub completed_requests: u64,
    pub rated_requests: u64,
    pub avg_rating: Option<f64>,
    /// Completed or closed over all requests, as a percentage.
    pub completion_rate: f64,
    /// Catalog price summed over completed or closed requests.
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Stats {
    Admin(AdminStats),
    Customer(RequestSummary),
    Professional(RequestSummary),
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Fold `(status, rating, price)` rows into a summary.
pub fn summarize(rows: &[(RequestStatus, Option<i32>, f64)]) -> RequestSummary {
    let mut s = RequestSummary { total_requests: rows.len() as u64, ..Default::default() };
    let mut rating_sum = 0i64;
    for (status, rating, price) in rows {
        *s.status_counts.entry(status.as_str().to_string()).or_default() += 1;
        if matches!(status, RequestStatus::Completed | RequestStatus::Closed) {
            s.completed_requests += 1;
            s.total_value += price;
        }
        if let Some(r) = rating {
            s.rated_requests += 1;
            rating_sum += i64::from(*r);
        }
    }
    if s.rated_requests > 0 {
        s.avg_rating = Some(round2(rating_sum as f64 / s.rated_requests as f64));
    }
    if s.total_requests > 0 {
        s.completion_rate = round2(s.completed_requests as f64 * 100.0 / s.total_requests as f64);
    }
    s.total_value = round2(s.total_value);
    s
}

async fn request_rows(
    db: &DatabaseConnection,
    filter: service_request::Column,
    id: Uuid,
) -> Result<Vec<(RequestStatus, Option<i32>, f64)>, ServiceError> {
    let rows = service_request::Entity::find()
        .filter(filter.eq(id))
        .find_also_related(catalog::Entity)
        .all(db)
        .await?;
    rows.into_iter()
        .map(|(r, svc)| -> Result<_, ServiceError> {
            Ok((r.status()?, r.rating, svc.map(|s| s.price).unwrap_or(0.0)))
        })
        .collect()
}

async fn grouped(db: &DatabaseConnection, select: sea_orm::Select<service_request::Entity>) -> Result<BTreeMap<String, u64>, ServiceError> {
    let rows: Vec<(String, i64)> = select
        .select_only()
        .column(service_request::Column::Status)
        .column_as(service_request::Column::Id.count(), "count")
        .group_by(service_request::Column::Status)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|(k, v)| (k, v as u64)).collect())
}

async fn compute_admin(db: &DatabaseConnection) -> Result<AdminStats, ServiceError> {
    let by_type: Vec<(String, i64)> = catalog::Entity::find()
        .select_only()
        .column(catalog::Column::ServiceType)
        .column_as(catalog::Column::Id.count(), "count")
        .group_by(catalog::Column::ServiceType)
        .into_tuple()
        .all(db)
        .await?;
    let services_by_type: BTreeMap<String, u64> = by_type.into_iter().map(|(k, v)| (k, v as u64)).collect();
    let requests_by_status = grouped(db, service_request::Entity::find()).await?;

    let customers = user::Entity::find().filter(user::Column::Role.eq(Role::Customer.as_str()));
    Ok(AdminStats {
        total_services: services_by_type.values().sum(),
        services_by_type,
        total_requests: requests_by_status.values().sum(),
        pending_requests: requests_by_status.get(RequestStatus::Requested.as_str()).copied().unwrap_or(0),
        requests_by_status,
        total_professionals: professional::Entity::find().count(db).await?,
        active_professionals: professional::Entity::find()
            .filter(professional::Column::Status.eq(ProfessionalStatus::Approved.as_str()))
            .filter(professional::Column::Available.eq(true))
            .count(db)
            .await?,
        pending_professionals: professional::Entity::find()
            .filter(professional::Column::Status.eq(ProfessionalStatus::Pending.as_str()))
            .count(db)
            .await?,
        total_customers: customers.clone().count(db).await?,
        active_customers: customers.filter(user::Column::Active.eq(true)).count(db).await?,
    })
}

pub async fn admin_stats(db: &DatabaseConnection, cache: &StatsCache) -> Result<AdminStats, ServiceError> {
    if let Some(Stats::Admin(s)) = cache.get(&StatsKey::Admin).await {
        debug!("admin stats cache hit");
        return Ok(s);
    }
    let s = compute_admin(db).await?;
    cache.insert(StatsKey::Admin, Stats::Admin(s.clone())).await;
    Ok(s)
}

pub async fn customer_stats(db: &DatabaseConnection, cache: &StatsCache, customer_id: Uuid) -> Result<RequestSummary, ServiceError> {
    let key = StatsKey::Customer(customer_id);
    if let Some(Stats::Customer(s)) = cache.get(&key).await {
        return Ok(s);
    }
    let s = summarize(&request_rows(db, service_request::Column::CustomerId, customer_id).await?);
    cache.insert(key, Stats::Customer(s.clone())).await;
    Ok(s)
}

pub async fn professional_stats(db: &DatabaseConnection, cache: &StatsCache, professional_id: Uuid) -> Result<RequestSummary, ServiceError> {
    let key = StatsKey::Professional(professional_id);
    if let Some(Stats::Professional(s)) = cache.get(&key).await {
        return Ok(s);
    }
    let s = summarize(&request_rows(db, service_request::Column::ProfessionalId, professional_id).await?);
    cache.insert(key, Stats::Professional(s.clone())).await;
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::test_support::get_db;

    #[test]
    fn summarize_empty_is_all_zero() {
        let s = summarize(&[]);
        assert_eq!(s.total_requests, 0);
        assert_eq!(s.avg_rating, None);
        assert_eq!(s.completion_rate, 0.0);
    }

    #[test]
    fn summarize_counts_ratings_and_completion() {
        let rows = [
            (RequestStatus::Closed, Some(5), 40.0),
            (RequestStatus::Closed, Some(4), 10.0),
            (RequestStatus::Completed, None, 25.5),
            (RequestStatus::Requested, None, 99.0),
        ];
        let s = summarize(&rows);
        assert_eq!(s.total_requests, 4);
        assert_eq!(s.completed_requests, 3);
        assert_eq!(s.rated_requests, 2);
        assert_eq!(s.avg_rating, Some(4.5));
        assert_eq!(s.completion_rate, 75.0);
        assert_eq!(s.total_value, 75.5);
        assert_eq!(s.status_counts.get("closed"), Some(&2));
    }

    #[tokio::test]
    async fn admin_stats_are_cached() -> anyhow::Result<()> {
        let Some(db) = get_db().await else { return Ok(()) };
        let cache = StatsCache::new(Duration::from_secs(60), 10);
        let first = admin_stats(&db, &cache).await?;
        catalog::create(&db, &format!("Cached {}", Uuid::new_v4()), "misc", 1.0, "1h", None).await?;
        let second = admin_stats(&db, &cache).await?;
        assert_eq!(first, second);

        cache.invalidate_all();
        let third = admin_stats(&db, &cache).await?;
        assert!(third.total_services > first.total_services);
        Ok(())
    }
}
