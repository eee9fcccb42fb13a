use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::{errors, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer_profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub address: Option<String>,
    pub pincode: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_pincode(pincode: &str) -> Result<(), errors::ModelError> {
    let p = pincode.trim();
    if p.is_empty() || p.len() > 10 || !p.chars().all(|c| c.is_ascii_digit()) {
        return Err(errors::ModelError::Validation("pincode must be 1-10 digits".into()));
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    address: Option<&str>,
    pincode: Option<&str>,
) -> Result<Model, errors::ModelError> {
    if let Some(p) = pincode { validate_pincode(p)?; }
    let am = ActiveModel {
        user_id: Set(user_id),
        address: Set(address.map(str::to_string)),
        pincode: Set(pincode.map(|p| p.trim().to_string())),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
