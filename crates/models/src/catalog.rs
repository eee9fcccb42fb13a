//! Service catalog entries customers can request.
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub service_type: String,
    pub price: f64,
    pub time_required: String,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    let n = name.trim();
    if n.is_empty() || n.len() > 100 {
        return Err(ModelError::Validation("service name must be 1-100 characters".into()));
    }
    Ok(())
}

pub fn validate_price(price: f64) -> Result<(), ModelError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ModelError::Validation("price must be a non-negative number".into()));
    }
    Ok(())
}

/// Types are always stored lowercase.
pub fn normalize_type(service_type: &str) -> Result<String, ModelError> {
    let t = service_type.trim().to_lowercase();
    if t.is_empty() || t.len() > 50 {
        return Err(ModelError::Validation("service type must be 1-50 characters".into()));
    }
    Ok(t)
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    name: &str,
    service_type: &str,
    price: f64,
    time_required: &str,
    description: Option<&str>,
) -> Result<Model, errors::ModelError> {
    validate_name(name)?;
    validate_price(price)?;
    let service_type = normalize_type(service_type)?;
    if time_required.trim().is_empty() {
        return Err(ModelError::Validation("time_required required".into()));
    }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.trim().to_string()),
        service_type: Set(service_type),
        price: Set(price),
        time_required: Set(time_required.trim().to_string()),
        description: Set(description.map(str::to_string)),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_must_be_finite_and_non_negative() {
        assert!(validate_price(0.0).is_ok());
        assert!(validate_price(-1.0).is_err());
        assert!(validate_price(f64::NAN).is_err());
    }

    #[test]
    fn type_is_normalized() {
        assert_eq!(normalize_type("Cleaning").unwrap(), "cleaning");
    }
}
