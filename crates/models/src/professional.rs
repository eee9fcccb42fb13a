use std::{fmt, str::FromStr};

use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{errors::{self, ModelError}, user};

/// Verification state of a professional account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfessionalStatus {
    Pending,
    Approved,
    Rejected,
    Blocked,
}

impl ProfessionalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfessionalStatus::Pending => "pending",
            ProfessionalStatus::Approved => "approved",
            ProfessionalStatus::Rejected => "rejected",
            ProfessionalStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for ProfessionalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfessionalStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProfessionalStatus::Pending),
            "approved" => Ok(ProfessionalStatus::Approved),
            "rejected" => Ok(ProfessionalStatus::Rejected),
            "blocked" => Ok(ProfessionalStatus::Blocked),
            other => Err(ModelError::Validation(format!("invalid professional status: {other}"))),
        }
    }
}

/// Professional profile. `available` and `current_request` are the
/// single-slot availability pair and move only with request transitions.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "professional")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub service_type: String,
    pub experience: Option<String>,
    pub status: String,
    pub verified: bool,
    pub verified_at: Option<DateTimeWithTimeZone>,
    pub verified_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub available: bool,
    pub current_request: Option<Uuid>,
    pub version: i32,
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

pub fn validate_service_type(service_type: &str) -> Result<String, ModelError> {
    let t = service_type.trim().to_lowercase();
    if t.is_empty() || t.len() > 50 {
        return Err(ModelError::Validation("service_type must be 1-50 characters".into()));
    }
    Ok(t)
}

/// New professionals start pending verification and free for assignment.
pub async fn create<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    service_type: &str,
    experience: Option<&str>,
) -> Result<Model, errors::ModelError> {
    let service_type = validate_service_type(service_type)?;
    let am = ActiveModel {
        user_id: Set(user_id),
        service_type: Set(service_type),
        experience: Set(experience.map(str::to_string)),
        status: Set(ProfessionalStatus::Pending.as_str().to_string()),
        verified: Set(false),
        verified_at: Set(None),
        verified_by: Set(None),
        rejection_reason: Set(None),
        available: Set(true),
        current_request: Set(None),
        version: Set(0),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Record an admin's verification decision.
pub async fn set_verification<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    approved: bool,
    admin_id: Uuid,
    reason: Option<String>,
) -> Result<Model, errors::ModelError> {
    let mut found: ActiveModel = Entity::find_by_id(user_id)
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?
        .ok_or_else(|| errors::ModelError::Validation("professional not found".into()))?
        .into();
    if approved {
        found.status = Set(ProfessionalStatus::Approved.as_str().to_string());
        found.verified = Set(true);
        found.verified_at = Set(Some(Utc::now().into()));
        found.verified_by = Set(Some(admin_id));
        found.rejection_reason = Set(None);
    } else {
        found.status = Set(ProfessionalStatus::Rejected.as_str().to_string());
        found.verified = Set(false);
        found.verified_at = Set(None);
        found.verified_by = Set(None);
        found.rejection_reason = Set(reason);
    }
    found.update(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
