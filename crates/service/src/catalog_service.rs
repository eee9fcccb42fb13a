//! Service catalog CRUD. Admin-only writes are enforced by the HTTP layer.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use uuid::Uuid;

use common::types::Page;
use models::catalog;
use crate::{errors::ServiceError, pagination::Pagination};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceFilter {
    #[serde(rename = "type")]
    pub service_type: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewService {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub price: f64,
    pub time_required: String,
    pub description: Option<String>,
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceUpdate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub service_type: Option<String>,
    pub price: Option<f64>,
    pub time_required: Option<String>,
    pub description: Option<String>,
}

fn condition(filter: &ServiceFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(t) = filter.service_type.as_deref().filter(|t| !t.trim().is_empty()) {
        cond = cond.add(catalog::Column::ServiceType.eq(t.trim().to_lowercase()));
    }
    if let Some(q) = filter.search.as_deref().filter(|q| !q.trim().is_empty()) {
        let pattern = format!("%{}%", q.trim());
        cond = cond.add(
            Condition::any()
                .add(catalog::Column::Name.like(pattern.clone()))
                .add(catalog::Column::Description.like(pattern)),
        );
    }
    if let Some(min) = filter.min_price {
        cond = cond.add(catalog::Column::Price.gte(min));
    }
    if let Some(max) = filter.max_price {
        cond = cond.add(catalog::Column::Price.lte(max));
    }
    cond
}

/// List services matching `filter`, ordered by name.
pub async fn list_services(db: &DatabaseConnection, filter: &ServiceFilter, opts: Pagination) -> Result<Page<catalog::Model>, ServiceError> {
    let (page_idx, per_page) = opts.normalize();
    let paginator = catalog::Entity::find()
        .filter(condition(filter))
        .order_by_asc(catalog::Column::Name)
        .paginate(db, per_page);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page_idx).await?;
    Ok(opts.into_page(items, total))
}

/// Distinct service types, for the category picker.
pub async fn list_service_types(db: &DatabaseConnection) -> Result<Vec<String>, ServiceError> {
    let types: Vec<String> = catalog::Entity::find()
        .select_only()
        .column(catalog::Column::ServiceType)
        .distinct()
        .order_by_asc(catalog::Column::ServiceType)
        .into_tuple()
        .all(db)
        .await?;
    Ok(types)
}

pub async fn get_service(db: &DatabaseConnection, id: Uuid) -> Result<catalog::Model, ServiceError> {
    catalog::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("service"))
}

async fn ensure_unique_name(db: &DatabaseConnection, name: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
    let mut q = catalog::Entity::find().filter(catalog::Column::Name.eq(name.trim()));
    if let Some(id) = except {
        q = q.filter(catalog::Column::Id.ne(id));
    }
    if q.one(db).await?.is_some() {
        return Err(ServiceError::Conflict(format!("service '{}' already exists", name.trim())));
    }
    Ok(())
}

pub async fn create_service(db: &DatabaseConnection, input: NewService) -> Result<catalog::Model, ServiceError> {
    catalog::validate_name(&input.name)?;
    ensure_unique_name(db, &input.name, None).await?;
    let created = catalog::create(
        db,
        &input.name,
        &input.service_type,
        input.price,
        &input.time_required,
        input.description.as_deref(),
    )
    .await?;
    tracing::info!(service_id = %created.id, name = %created.name, "service_created");
    Ok(created)
}

pub async fn update_service(db: &DatabaseConnection, id: Uuid, input: ServiceUpdate) -> Result<catalog::Model, ServiceError> {
    let mut am: catalog::ActiveModel = get_service(db, id).await?.into();
    if let Some(name) = input.name {
        catalog::validate_name(&name)?;
        ensure_unique_name(db, &name, Some(id)).await?;
        am.name = Set(name.trim().to_string());
    }
    if let Some(t) = input.service_type {
        am.service_type = Set(catalog::normalize_type(&t)?);
    }
    if let Some(price) = input.price {
        catalog::validate_price(price)?;
        am.price = Set(price);
    }
    if let Some(time) = input.time_required {
        if time.trim().is_empty() {
            return Err(ServiceError::Validation("time_required required".into()));
        }
        am.time_required = Set(time.trim().to_string());
    }
    if let Some(d) = input.description {
        am.description = Set(Some(d));
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    Ok(updated)
}

/// Services referenced by requests cannot be removed.
pub async fn delete_service(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = catalog::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("service"));
    }
    tracing::info!(service_id = %id, "service_deleted");
    Ok(())
}
