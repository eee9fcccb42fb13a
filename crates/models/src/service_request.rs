use std::{fmt, str::FromStr};

use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{catalog, errors::{self, ModelError}, professional, user};

/// Request status. `closed` and `cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Requested,
    Assigned,
    Accepted,
    Rejected,
    Completed,
    Closed,
    Cancelled,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 7] = [
        RequestStatus::Requested,
        RequestStatus::Assigned,
        RequestStatus::Accepted,
        RequestStatus::Rejected,
        RequestStatus::Completed,
        RequestStatus::Closed,
        RequestStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Requested => "requested",
            RequestStatus::Assigned => "assigned",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Completed => "completed",
            RequestStatus::Closed => "closed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Closed | RequestStatus::Cancelled)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| ModelError::Validation(format!("invalid request status: {s}")))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub professional_id: Option<Uuid>,
    pub status: String,
    pub request_date: DateTimeWithTimeZone,
    pub assigned_at: Option<DateTimeWithTimeZone>,
    pub accepted_at: Option<DateTimeWithTimeZone>,
    pub rejected_at: Option<DateTimeWithTimeZone>,
    pub completion_date: Option<DateTimeWithTimeZone>,
    pub closed_at: Option<DateTimeWithTimeZone>,
    pub cancelled_at: Option<DateTimeWithTimeZone>,
    pub rating: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub remarks: Option<String>,
    pub version: i32,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Service,
    Customer,
    Professional,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Service => Entity::belongs_to(catalog::Entity)
                .from(Column::ServiceId)
                .to(catalog::Column::Id)
                .into(),
            Relation::Customer => Entity::belongs_to(user::Entity)
                .from(Column::CustomerId)
                .to(user::Column::Id)
                .into(),
            Relation::Professional => Entity::belongs_to(professional::Entity)
                .from(Column::ProfessionalId)
                .to(professional::Column::UserId)
                .into(),
        }
    }
}

impl Related<catalog::Entity> for Entity {
    fn to() -> RelationDef { Relation::Service.def() }
}

impl Related<professional::Entity> for Entity {
    fn to() -> RelationDef { Relation::Professional.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn status(&self) -> Result<RequestStatus, ModelError> {
        self.status.parse()
    }
}

/// Insert a fresh request in `requested` state.
pub async fn create<C: ConnectionTrait>(
    db: &C,
    service_id: Uuid,
    customer_id: Uuid,
    remarks: Option<String>,
) -> Result<Model, errors::ModelError> {
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        service_id: Set(service_id),
        customer_id: Set(customer_id),
        professional_id: Set(None),
        status: Set(RequestStatus::Requested.as_str().to_string()),
        request_date: Set(now),
        assigned_at: Set(None),
        accepted_at: Set(None),
        rejected_at: Set(None),
        completion_date: Set(None),
        closed_at: Set(None),
        cancelled_at: Set(None),
        rating: Set(None),
        remarks: Set(remarks),
        version: Set(0),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_parses_back() {
        for st in RequestStatus::ALL {
            assert_eq!(st.as_str().parse::<RequestStatus>().unwrap(), st);
        }
        assert!("pending".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn only_closed_and_cancelled_are_terminal() {
        let terminal: Vec<_> = RequestStatus::ALL.into_iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![RequestStatus::Closed, RequestStatus::Cancelled]);
    }
}
