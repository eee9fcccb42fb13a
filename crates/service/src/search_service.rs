//! Customer-facing professional directory.
//!
//! Only approved professionals with an active account are listed. The
//! rating is the mean of the ratings left on their closed requests, so it
//! is computed here rather than stored.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use common::types::Page;
use models::professional::{self, ProfessionalStatus};
use models::{service_request, user};
use crate::catalog_service;
use crate::errors::ServiceError;
use crate::pagination::Pagination;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfessionalSearch {
    pub service_type: Option<String>,
    /// Inclusive lower bound on the average rating, 0 to 5. Unrated
    /// professionals are excluded whenever this is set.
    pub min_rating: Option<f64>,
    pub available: Option<bool>,
}

/// Public card for a professional; no contact details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfessionalCard {
    pub id: Uuid,
    pub name: String,
    pub service_type: String,
    pub experience: Option<String>,
    pub available: bool,
    pub avg_rating: Option<f64>,
    pub rated_jobs: u64,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Mean rating and count per professional from `(professional, rating)`
/// rows.
pub fn rating_index(rows: &[(Uuid, i32)]) -> HashMap<Uuid, (f64, u64)> {
    let mut sums: HashMap<Uuid, (i64, u64)> = HashMap::new();
    for (id, rating) in rows {
        let e = sums.entry(*id).or_default();
        e.0 += i64::from(*rating);
        e.1 += 1;
    }
    sums.into_iter()
        .map(|(id, (sum, n))| (id, (round2(sum as f64 / n as f64), n)))
        .collect()
}

pub fn validate_min_rating(min_rating: Option<f64>) -> Result<Option<f64>, ServiceError> {
    match min_rating {
        Some(r) if !r.is_finite() || !(0.0..=5.0).contains(&r) => {
            Err(ServiceError::Validation("min_rating must be between 0 and 5".into()))
        }
        other => Ok(other),
    }
}

/// Keep cards meeting `min_rating`, best rated first, then by name.
pub fn rank(mut cards: Vec<ProfessionalCard>, min_rating: Option<f64>) -> Vec<ProfessionalCard> {
    if let Some(min) = min_rating {
        cards.retain(|c| c.avg_rating.is_some_and(|r| r >= min));
    }
    cards.sort_by(|a, b| {
        let (ra, rb) = (a.avg_rating.unwrap_or(-1.0), b.avg_rating.unwrap_or(-1.0));
        rb.total_cmp(&ra).then_with(|| a.name.cmp(&b.name)).then_with(|| a.id.cmp(&b.id))
    });
    cards
}

fn paginate<T>(items: Vec<T>, opts: Pagination) -> Page<T> {
    let (page_idx, per_page) = opts.normalize();
    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip((page_idx * per_page) as usize)
        .take(per_page as usize)
        .collect();
    opts.into_page(items, total)
}

pub async fn search_professionals(
    db: &DatabaseConnection,
    search: &ProfessionalSearch,
    opts: Pagination,
) -> Result<Page<ProfessionalCard>, ServiceError> {
    let min_rating = validate_min_rating(search.min_rating)?;
    let mut cond = Condition::all()
        .add(professional::Column::Status.eq(ProfessionalStatus::Approved.as_str()))
        .add(professional::Column::Verified.eq(true))
        .add(user::Column::Active.eq(true));
    if let Some(t) = search.service_type.as_deref().filter(|t| !t.trim().is_empty()) {
        cond = cond.add(professional::Column::ServiceType.eq(professional::validate_service_type(t)?));
    }
    if let Some(a) = search.available {
        cond = cond.add(professional::Column::Available.eq(a));
    }
    let found = professional::Entity::find()
        .find_also_related(user::Entity)
        .filter(cond)
        .all(db)
        .await?;
    if found.is_empty() {
        return Ok(paginate(Vec::new(), opts));
    }

    let ids: Vec<Uuid> = found.iter().map(|(p, _)| p.user_id).collect();
    let rows: Vec<(Option<Uuid>, Option<i32>)> = service_request::Entity::find()
        .select_only()
        .column(service_request::Column::ProfessionalId)
        .column(service_request::Column::Rating)
        .filter(service_request::Column::ProfessionalId.is_in(ids))
        .filter(service_request::Column::Rating.is_not_null())
        .into_tuple()
        .all(db)
        .await?;
    let rated: Vec<(Uuid, i32)> = rows.into_iter().filter_map(|(p, r)| Some((p?, r?))).collect();
    let index = rating_index(&rated);
    debug!(candidates = found.len(), rated = index.len(), "professional search");

    let cards = found
        .into_iter()
        .filter_map(|(p, u)| {
            let u = u?;
            let (avg_rating, rated_jobs) = index
                .get(&p.user_id)
                .map(|(avg, n)| (Some(*avg), *n))
                .unwrap_or((None, 0));
            Some(ProfessionalCard {
                id: p.user_id,
                name: u.name,
                service_type: p.service_type,
                experience: p.experience,
                available: p.available,
                avg_rating,
                rated_jobs,
            })
        })
        .collect();
    Ok(paginate(rank(cards, min_rating), opts))
}

/// Professionals offering the type of catalog service `service_id`.
pub async fn professionals_for_service(
    db: &DatabaseConnection,
    service_id: Uuid,
    available: Option<bool>,
    opts: Pagination,
) -> Result<Page<ProfessionalCard>, ServiceError> {
    let service = catalog_service::get_service(db, service_id).await?;
    let search = ProfessionalSearch { service_type: Some(service.service_type), min_rating: None, available };
    search_professionals(db, &search, opts).await
}
