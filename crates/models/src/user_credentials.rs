//! Login secret for an `app_user`. Exactly one row per account.
//!
//! Written at registration and again when the configured bootstrap admin
//! password changes between deployments. Only PHC-format hashes are
//! stored; the plaintext never reaches this module.

use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::user;

/// Hash schemes the login path can verify.
pub const SUPPORTED_ALGORITHMS: &[&str] = &["argon2"];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_credentials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    /// PHC string, e.g. `$argon2id$v=19$...`.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub password_algorithm: String,
    pub created_at: DateTimeWithTimeZone,
    /// Last registration or admin password rotation.
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Account }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Account => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A stored hash must be a PHC string produced by a supported scheme.
pub fn validate_secret(password_hash: &str, algorithm: &str) -> Result<(), ModelError> {
    if !SUPPORTED_ALGORITHMS.contains(&algorithm) {
        return Err(ModelError::Validation(format!("unsupported password algorithm: {algorithm}")));
    }
    if !password_hash.starts_with('$') {
        return Err(ModelError::Validation("password hash must be a PHC string".into()));
    }
    Ok(())
}

pub async fn find_for_account<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))
}

/// Store the login hash for `user_id`, replacing any earlier one.
pub async fn set_password<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    password_hash: String,
    algorithm: &str,
) -> Result<Model, ModelError> {
    validate_secret(&password_hash, algorithm)?;
    let now = Utc::now().into();
    let saved = match find_for_account(db, user_id).await? {
        Some(existing) => {
            let mut am: ActiveModel = existing.into();
            am.password_hash = Set(password_hash);
            am.password_algorithm = Set(algorithm.to_string());
            am.updated_at = Set(now);
            am.update(db).await
        }
        None => {
            ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                password_hash: Set(password_hash),
                password_algorithm: Set(algorithm.to_string()),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(db)
            .await
        }
    };
    saved.map_err(|e| ModelError::Db(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_phc_hashes_of_known_schemes_are_stored() {
        assert!(validate_secret("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA", "argon2").is_ok());
        assert!(validate_secret("plaintext", "argon2").is_err());
        assert!(validate_secret("$2b$12$abc", "bcrypt").is_err());
    }
}
