use chrono::{DateTime, Utc};
use models::service_request::RequestStatus;
use models::user::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of a service request as the lifecycle sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: Uuid,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub professional_id: Option<Uuid>,
    pub status: RequestStatus,
    pub request_date: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub completion_date: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub rating: Option<i32>,
    pub remarks: Option<String>,
    pub version: i32,
}

/// The single-slot availability pair stored on a professional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessionalAvailability {
    pub professional_id: Uuid,
    pub available: bool,
    pub current_request: Option<Uuid>,
    pub version: i32,
}

impl ProfessionalAvailability {
    pub fn free(professional_id: Uuid) -> Self {
        Self { professional_id, available: true, current_request: None, version: 0 }
    }

    /// `available` and `current_request` never disagree.
    pub fn is_consistent(&self) -> bool {
        self.available == self.current_request.is_none()
    }
}

/// Who is calling, as established by the auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActingUser {
    pub id: Uuid,
    pub role: Role,
}

impl ActingUser {
    pub fn new(id: Uuid, role: Role) -> Self { Self { id, role } }
}

#[derive(Debug, Clone)]
pub struct NewRequest {
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub remarks: Option<String>,
}

/// A requested transition. `rating` stays a float here so that `4.0` and
/// `4` are both accepted; `None` means the caller sent no usable number.
/// Range checks happen in the planner, after the state checks.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Assign { professional_id: Uuid },
    Accept,
    Reject,
    Complete,
    Close { rating: Option<f64>, remarks: Option<String> },
    Unassign,
    Cancel,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Assign { .. } => "assign",
            Command::Accept => "accept",
            Command::Reject => "reject",
            Command::Complete => "complete",
            Command::Close { .. } => "close",
            Command::Unassign => "unassign",
            Command::Cancel => "cancel",
        }
    }

    pub fn target(&self) -> RequestStatus {
        match self {
            Command::Assign { .. } => RequestStatus::Assigned,
            Command::Accept => RequestStatus::Accepted,
            Command::Reject => RequestStatus::Rejected,
            Command::Complete => RequestStatus::Completed,
            Command::Close { .. } => RequestStatus::Closed,
            Command::Unassign => RequestStatus::Requested,
            Command::Cancel => RequestStatus::Cancelled,
        }
    }

    /// Role allowed to issue this command.
    pub fn actor_role(&self) -> Role {
        match self {
            Command::Assign { .. } | Command::Unassign => Role::Admin,
            Command::Accept | Command::Reject | Command::Complete => Role::Professional,
            Command::Close { .. } | Command::Cancel => Role::Customer,
        }
    }
}

/// Published once per committed change, consumed by cache invalidation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleEvent {
    pub request_id: Uuid,
    pub from: Option<RequestStatus>,
    pub to: RequestStatus,
    pub customer_id: Uuid,
    pub professionals: Vec<Uuid>,
    pub at: DateTime<Utc>,
}
