//! Pure transition planner. Every precondition is checked here and the
//! result is a complete description of the writes; nothing is persisted.

use chrono::{DateTime, Utc};
use models::service_request::RequestStatus;
use uuid::Uuid;

use super::domain::{ActingUser, Command, LifecycleEvent, ProfessionalAvailability, ServiceRequest};
use super::errors::LifecycleError;
use super::tracker::AvailabilityTracker;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// New request state plus the availability rows that changed. Versions are
/// still the ones that were read; the repository uses them as write guards.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    pub op: &'static str,
    pub from: RequestStatus,
    pub request: ServiceRequest,
    pub professionals: Vec<ProfessionalAvailability>,
}

impl TransitionPlan {
    pub fn event(&self, at: DateTime<Utc>) -> LifecycleEvent {
        let mut professionals: Vec<Uuid> = self.professionals.iter().map(|p| p.professional_id).collect();
        if let Some(p) = self.request.professional_id {
            if !professionals.contains(&p) {
                professionals.push(p);
            }
        }
        LifecycleEvent {
            request_id: self.request.id,
            from: Some(self.from),
            to: self.request.status,
            customer_id: self.request.customer_id,
            professionals,
            at,
        }
    }
}

/// Professional rows a command needs loaded before planning.
pub fn involved_professionals(request: &ServiceRequest, command: &Command) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = request.professional_id.into_iter().collect();
    if let Command::Assign { professional_id } = command {
        if !ids.contains(professional_id) {
            ids.push(*professional_id);
        }
    }
    ids
}

/// Accepts whole or fractional ratings in `[1, 5]`, stored rounded.
pub fn validate_rating(rating: Option<f64>) -> Result<i32, LifecycleError> {
    let Some(rating) = rating else {
        return Err(LifecycleError::Validation("rating must be a number".into()));
    };
    if !rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(LifecycleError::Validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }
    Ok(rating.round() as i32)
}

fn expect_status(request: &ServiceRequest, allowed: &[RequestStatus], to: RequestStatus) -> Result<(), LifecycleError> {
    if allowed.contains(&request.status) {
        Ok(())
    } else {
        Err(LifecycleError::InvalidTransition { from: request.status, to })
    }
}

fn expect_owner(request: &ServiceRequest, owner: Option<Uuid>, actor: &ActingUser, to: RequestStatus) -> Result<(), LifecycleError> {
    if owner == Some(actor.id) {
        Ok(())
    } else {
        tracing::debug!(request_id = %request.id, actor = %actor.id, "actor does not own request");
        Err(LifecycleError::InvalidTransition { from: request.status, to })
    }
}

/// Plan `command` against the current `request` and the rows named by
/// [`involved_professionals`].
pub fn plan(
    request: &ServiceRequest,
    actor: &ActingUser,
    command: &Command,
    professionals: Vec<ProfessionalAvailability>,
    now: DateTime<Utc>,
) -> Result<TransitionPlan, LifecycleError> {
    let required = command.actor_role();
    if actor.role != required {
        return Err(LifecycleError::Forbidden(format!("{} requires the {} role", command.name(), required)));
    }

    let to = command.target();
    let mut next = request.clone();
    let mut tracker = AvailabilityTracker::new(professionals);

    match command {
        Command::Assign { professional_id } => {
            match request.status {
                RequestStatus::Requested if request.professional_id.is_none() => {}
                RequestStatus::Rejected => {
                    if let Some(previous) = request.professional_id {
                        tracker.release_if_linked(previous, request.id);
                    }
                }
                _ => return Err(LifecycleError::InvalidTransition { from: request.status, to }),
            }
            tracker.mark_busy(*professional_id, request.id)?;
            next.professional_id = Some(*professional_id);
            next.assigned_at.get_or_insert(now);
        }
        Command::Accept => {
            expect_status(request, &[RequestStatus::Assigned], to)?;
            expect_owner(request, request.professional_id, actor, to)?;
            next.accepted_at.get_or_insert(now);
        }
        Command::Reject => {
            expect_status(request, &[RequestStatus::Assigned], to)?;
            expect_owner(request, request.professional_id, actor, to)?;
            tracker.mark_free(actor.id)?;
            next.rejected_at.get_or_insert(now);
        }
        Command::Complete => {
            expect_status(request, &[RequestStatus::Accepted], to)?;
            expect_owner(request, request.professional_id, actor, to)?;
            tracker.mark_free(actor.id)?;
            next.completion_date.get_or_insert(now);
        }
        Command::Close { rating, remarks } => {
            expect_status(request, &[RequestStatus::Completed], to)?;
            expect_owner(request, Some(request.customer_id), actor, to)?;
            let rating = validate_rating(*rating)?;
            if let Some(p) = request.professional_id {
                tracker.release_if_linked(p, request.id);
            }
            next.rating = Some(rating);
            if let Some(remarks) = remarks {
                next.remarks = Some(remarks.clone());
            }
            next.closed_at.get_or_insert(now);
        }
        Command::Unassign => {
            expect_status(request, &[RequestStatus::Assigned], to)?;
            if let Some(p) = request.professional_id {
                if tracker.get(p).is_some() {
                    tracker.mark_free(p)?;
                }
            }
            next.professional_id = None;
        }
        Command::Cancel => {
            expect_status(request, &[RequestStatus::Requested, RequestStatus::Assigned], to)?;
            expect_owner(request, Some(request.customer_id), actor, to)?;
            if let Some(p) = request.professional_id {
                tracker.release_if_linked(p, request.id);
            }
            next.cancelled_at.get_or_insert(now);
        }
    }

    next.status = to;
    let professionals = tracker.into_changes();
    debug_assert!(professionals.iter().all(ProfessionalAvailability::is_consistent));
    Ok(TransitionPlan { op: command.name(), from: request.status, request: next, professionals })
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::user::Role;

    struct Fixture {
        customer: ActingUser,
        admin: ActingUser,
        pro: ActingUser,
        other_pro: ActingUser,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                customer: ActingUser::new(Uuid::new_v4(), Role::Customer),
                admin: ActingUser::new(Uuid::new_v4(), Role::Admin),
                pro: ActingUser::new(Uuid::new_v4(), Role::Professional),
                other_pro: ActingUser::new(Uuid::new_v4(), Role::Professional),
            }
        }

        /// A request sitting in `status` with the invariants that state implies.
        fn request_in(&self, status: RequestStatus) -> (ServiceRequest, Vec<ProfessionalAvailability>) {
            let id = Uuid::new_v4();
            let linked = matches!(status, RequestStatus::Assigned | RequestStatus::Accepted);
            let has_pro = !matches!(status, RequestStatus::Requested | RequestStatus::Cancelled);
            let mut pro = ProfessionalAvailability::free(self.pro.id);
            if linked {
                pro.available = false;
                pro.current_request = Some(id);
            }
            let req = ServiceRequest {
                id,
                service_id: Uuid::new_v4(),
                customer_id: self.customer.id,
                professional_id: has_pro.then_some(self.pro.id),
                status,
                request_date: Utc::now(),
                assigned_at: has_pro.then(Utc::now),
                accepted_at: None,
                rejected_at: None,
                completion_date: None,
                closed_at: None,
                cancelled_at: None,
                rating: (status == RequestStatus::Closed).then_some(4),
                remarks: None,
                version: 3,
            };
            (req, vec![pro, ProfessionalAvailability::free(self.other_pro.id)])
        }

        fn actor_for(&self, command: &Command) -> ActingUser {
            match command.actor_role() {
                Role::Admin => self.admin,
                Role::Professional => self.pro,
                Role::Customer => self.customer,
            }
        }
    }

    fn commands(f: &Fixture) -> Vec<Command> {
        vec![
            Command::Assign { professional_id: f.other_pro.id },
            Command::Accept,
            Command::Reject,
            Command::Complete,
            Command::Close { rating: Some(4.0), remarks: None },
            Command::Unassign,
            Command::Cancel,
        ]
    }

    fn allowed_from(command: &Command) -> &'static [RequestStatus] {
        use RequestStatus::*;
        match command {
            Command::Assign { .. } => &[Requested, Rejected],
            Command::Accept | Command::Reject | Command::Unassign => &[Assigned],
            Command::Complete => &[Accepted],
            Command::Close { .. } => &[Completed],
            Command::Cancel => &[Requested, Assigned],
        }
    }

    #[test]
    fn transition_table_is_exhaustive() {
        let f = Fixture::new();
        for status in RequestStatus::ALL {
            for command in commands(&f) {
                let (req, pros) = f.request_in(status);
                let result = plan(&req, &f.actor_for(&command), &command, pros, Utc::now());
                if allowed_from(&command).contains(&status) {
                    let p = result.unwrap_or_else(|e| panic!("{} from {status}: {e}", command.name()));
                    assert_eq!(p.request.status, command.target());
                    assert!(p.professionals.iter().all(ProfessionalAvailability::is_consistent));
                    assert_eq!(p.request.rating.is_some(), p.request.status == RequestStatus::Closed);
                } else {
                    assert_eq!(
                        result.unwrap_err(),
                        LifecycleError::InvalidTransition { from: status, to: command.target() },
                        "{} from {status}",
                        command.name()
                    );
                }
            }
        }
    }

    #[test]
    fn wrong_role_is_forbidden() {
        let f = Fixture::new();
        let (req, pros) = f.request_in(RequestStatus::Requested);
        let err = plan(&req, &f.customer, &Command::Assign { professional_id: f.pro.id }, pros, Utc::now()).unwrap_err();
        assert!(matches!(err, LifecycleError::Forbidden(_)));
    }

    #[test]
    fn assign_marks_professional_busy_and_stamps_assigned_at() {
        let f = Fixture::new();
        let (req, pros) = f.request_in(RequestStatus::Requested);
        let now = Utc::now();
        let p = plan(&req, &f.admin, &Command::Assign { professional_id: f.pro.id }, pros, now).unwrap();
        assert_eq!(p.request.professional_id, Some(f.pro.id));
        assert_eq!(p.request.assigned_at, Some(now));
        assert_eq!(p.professionals.len(), 1);
        assert_eq!(p.professionals[0].current_request, Some(req.id));
        assert!(!p.professionals[0].available);
        assert_eq!(p.request.version, req.version);
    }

    #[test]
    fn assign_to_busy_professional_fails_validation() {
        let f = Fixture::new();
        let (req, mut pros) = f.request_in(RequestStatus::Requested);
        pros[0].available = false;
        pros[0].current_request = Some(Uuid::new_v4());
        let err = plan(&req, &f.admin, &Command::Assign { professional_id: f.pro.id }, pros, Utc::now()).unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
    }

    #[test]
    fn assign_to_unknown_professional_is_not_found() {
        let f = Fixture::new();
        let (req, pros) = f.request_in(RequestStatus::Requested);
        let err = plan(&req, &f.admin, &Command::Assign { professional_id: Uuid::new_v4() }, pros, Utc::now()).unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(_)));
    }

    #[test]
    fn reassign_after_reject_keeps_first_assigned_at() {
        let f = Fixture::new();
        let (req, pros) = f.request_in(RequestStatus::Rejected);
        let first = req.assigned_at;
        let p = plan(&req, &f.admin, &Command::Assign { professional_id: f.other_pro.id }, pros, Utc::now()).unwrap();
        assert_eq!(p.request.assigned_at, first);
        assert_eq!(p.request.professional_id, Some(f.other_pro.id));
        // The rejecting professional was already free, so only the new one changes.
        assert_eq!(p.professionals.len(), 1);
        assert_eq!(p.professionals[0].professional_id, f.other_pro.id);
    }

    #[test]
    fn reassign_leaves_previous_professional_alone_once_moved_on() {
        let f = Fixture::new();
        let (req, mut pros) = f.request_in(RequestStatus::Rejected);
        let elsewhere = Uuid::new_v4();
        pros[0].available = false;
        pros[0].current_request = Some(elsewhere);
        let p = plan(&req, &f.admin, &Command::Assign { professional_id: f.other_pro.id }, pros, Utc::now()).unwrap();
        assert!(p.professionals.iter().all(|row| row.professional_id != f.pro.id));
    }

    #[test]
    fn reassign_frees_previous_professional_still_linked() {
        let f = Fixture::new();
        let (req, mut pros) = f.request_in(RequestStatus::Rejected);
        pros[0].available = false;
        pros[0].current_request = Some(req.id);
        let p = plan(&req, &f.admin, &Command::Assign { professional_id: f.other_pro.id }, pros, Utc::now()).unwrap();
        let previous = p.professionals.iter().find(|r| r.professional_id == f.pro.id).unwrap();
        assert!(previous.available);
        assert_eq!(previous.current_request, None);
    }

    #[test]
    fn accept_by_another_professional_is_invalid() {
        let f = Fixture::new();
        let (req, pros) = f.request_in(RequestStatus::Assigned);
        let err = plan(&req, &f.other_pro, &Command::Accept, pros, Utc::now()).unwrap_err();
        assert_eq!(err, LifecycleError::InvalidTransition { from: RequestStatus::Assigned, to: RequestStatus::Accepted });
    }

    #[test]
    fn accept_keeps_professional_busy() {
        let f = Fixture::new();
        let (req, pros) = f.request_in(RequestStatus::Assigned);
        let p = plan(&req, &f.pro, &Command::Accept, pros, Utc::now()).unwrap();
        assert!(p.professionals.is_empty());
        assert!(p.request.accepted_at.is_some());
    }

    #[test]
    fn reject_and_complete_free_the_professional() {
        let f = Fixture::new();
        for (status, command) in [(RequestStatus::Assigned, Command::Reject), (RequestStatus::Accepted, Command::Complete)] {
            let (req, pros) = f.request_in(status);
            let p = plan(&req, &f.pro, &command, pros, Utc::now()).unwrap();
            assert_eq!(p.professionals.len(), 1);
            assert!(p.professionals[0].available);
            assert_eq!(p.professionals[0].current_request, None);
            assert_eq!(p.request.professional_id, Some(f.pro.id));
        }
    }

    #[test]
    fn close_validates_rating_range() {
        let f = Fixture::new();
        for bad in [6.0, 0.0, 0.99, 5.01, -3.0, f64::NAN, f64::INFINITY] {
            let (req, pros) = f.request_in(RequestStatus::Completed);
            let err = plan(&req, &f.customer, &Command::Close { rating: Some(bad), remarks: None }, pros, Utc::now()).unwrap_err();
            assert!(matches!(err, LifecycleError::Validation(_)), "rating {bad}");
        }
    }

    #[test]
    fn close_with_missing_rating_is_validation() {
        let f = Fixture::new();
        let (req, pros) = f.request_in(RequestStatus::Completed);
        let err = plan(&req, &f.customer, &Command::Close { rating: None, remarks: None }, pros, Utc::now()).unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
    }

    #[test]
    fn bad_rating_outside_completed_is_invalid_transition() {
        let f = Fixture::new();
        for status in [RequestStatus::Closed, RequestStatus::Requested, RequestStatus::Accepted] {
            for rating in [Some(6.0), None] {
                let (req, pros) = f.request_in(status);
                let err = plan(&req, &f.customer, &Command::Close { rating, remarks: None }, pros, Utc::now()).unwrap_err();
                assert_eq!(err, LifecycleError::InvalidTransition { from: status, to: RequestStatus::Closed }, "{status} {rating:?}");
            }
        }
    }

    #[test]
    fn bad_rating_from_stranger_is_invalid_transition() {
        let f = Fixture::new();
        let (req, pros) = f.request_in(RequestStatus::Completed);
        let stranger = ActingUser::new(Uuid::new_v4(), Role::Customer);
        let err = plan(&req, &stranger, &Command::Close { rating: Some(9.0), remarks: None }, pros, Utc::now()).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
    }

    #[test]
    fn close_sets_rating_remarks_and_closed_at() {
        let f = Fixture::new();
        let (req, pros) = f.request_in(RequestStatus::Completed);
        let command = Command::Close { rating: Some(3.0), remarks: Some("tidy work".into()) };
        let p = plan(&req, &f.customer, &command, pros, Utc::now()).unwrap();
        assert_eq!(p.request.rating, Some(3));
        assert_eq!(p.request.remarks.as_deref(), Some("tidy work"));
        assert!(p.request.closed_at.is_some());
    }

    #[test]
    fn close_without_remarks_keeps_existing_ones() {
        let f = Fixture::new();
        let (mut req, pros) = f.request_in(RequestStatus::Completed);
        req.remarks = Some("from creation".into());
        let p = plan(&req, &f.customer, &Command::Close { rating: Some(4.6), remarks: None }, pros, Utc::now()).unwrap();
        assert_eq!(p.request.rating, Some(5));
        assert_eq!(p.request.remarks.as_deref(), Some("from creation"));
    }

    #[test]
    fn close_force_frees_professional_still_linked() {
        let f = Fixture::new();
        let (req, mut pros) = f.request_in(RequestStatus::Completed);
        pros[0].available = false;
        pros[0].current_request = Some(req.id);
        let p = plan(&req, &f.customer, &Command::Close { rating: Some(5.0), remarks: None }, pros, Utc::now()).unwrap();
        assert_eq!(p.professionals.len(), 1);
        assert!(p.professionals[0].available);
    }

    #[test]
    fn close_by_other_customer_is_invalid() {
        let f = Fixture::new();
        let (req, pros) = f.request_in(RequestStatus::Completed);
        let stranger = ActingUser::new(Uuid::new_v4(), Role::Customer);
        let err = plan(&req, &stranger, &Command::Close { rating: Some(5.0), remarks: None }, pros, Utc::now()).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
    }

    #[test]
    fn unassign_clears_professional_reference() {
        let f = Fixture::new();
        let (req, pros) = f.request_in(RequestStatus::Assigned);
        let p = plan(&req, &f.admin, &Command::Unassign, pros, Utc::now()).unwrap();
        assert_eq!(p.request.status, RequestStatus::Requested);
        assert_eq!(p.request.professional_id, None);
        assert!(p.professionals[0].available);
    }

    #[test]
    fn cancel_assigned_request_frees_professional() {
        let f = Fixture::new();
        let (req, pros) = f.request_in(RequestStatus::Assigned);
        let p = plan(&req, &f.customer, &Command::Cancel, pros, Utc::now()).unwrap();
        assert_eq!(p.request.status, RequestStatus::Cancelled);
        assert!(p.request.cancelled_at.is_some());
        assert!(p.professionals[0].available);
    }

    #[test]
    fn event_names_every_touched_professional() {
        let f = Fixture::new();
        let (req, mut pros) = f.request_in(RequestStatus::Rejected);
        pros[0].available = false;
        pros[0].current_request = Some(req.id);
        let p = plan(&req, &f.admin, &Command::Assign { professional_id: f.other_pro.id }, pros, Utc::now()).unwrap();
        let ev = p.event(Utc::now());
        assert_eq!(ev.from, Some(RequestStatus::Rejected));
        assert_eq!(ev.to, RequestStatus::Assigned);
        assert!(ev.professionals.contains(&f.pro.id));
        assert!(ev.professionals.contains(&f.other_pro.id));
    }

    #[test]
    fn involved_professionals_includes_previous_and_target() {
        let f = Fixture::new();
        let (req, _) = f.request_in(RequestStatus::Rejected);
        let ids = involved_professionals(&req, &Command::Assign { professional_id: f.other_pro.id });
        assert_eq!(ids, vec![f.pro.id, f.other_pro.id]);
        assert_eq!(involved_professionals(&req, &Command::Assign { professional_id: f.pro.id }), vec![f.pro.id]);
    }
}
