use std::collections::BTreeMap;

use uuid::Uuid;

use super::domain::ProfessionalAvailability;
use super::errors::LifecycleError;

/// Working set of professional availability rows for one transition.
///
/// Rows are loaded up front; `mark_busy` and `mark_free` mutate the working
/// copies and `into_changes` hands back only the rows that actually moved,
/// so a no-op never turns into a write.
#[derive(Debug, Default)]
pub struct AvailabilityTracker {
    rows: BTreeMap<Uuid, ProfessionalAvailability>,
    original: BTreeMap<Uuid, ProfessionalAvailability>,
}

impl AvailabilityTracker {
    pub fn new(rows: impl IntoIterator<Item = ProfessionalAvailability>) -> Self {
        let rows: BTreeMap<_, _> = rows.into_iter().map(|r| (r.professional_id, r)).collect();
        Self { original: rows.clone(), rows }
    }

    pub fn get(&self, professional_id: Uuid) -> Option<&ProfessionalAvailability> {
        self.rows.get(&professional_id)
    }

    fn row_mut(&mut self, professional_id: Uuid) -> Result<&mut ProfessionalAvailability, LifecycleError> {
        self.rows
            .get_mut(&professional_id)
            .ok_or_else(|| LifecycleError::NotFound(format!("professional {professional_id}")))
    }

    /// Occupy the professional with `request_id`. Already holding the same
    /// request is a no-op; holding another one is refused.
    pub fn mark_busy(&mut self, professional_id: Uuid, request_id: Uuid) -> Result<(), LifecycleError> {
        let row = self.row_mut(professional_id)?;
        match row.current_request {
            Some(current) if current == request_id => Ok(()),
            Some(_) => Err(LifecycleError::Validation(format!(
                "professional {professional_id} is not available"
            ))),
            None if !row.available => Err(LifecycleError::Validation(format!(
                "professional {professional_id} is not available"
            ))),
            None => {
                row.available = false;
                row.current_request = Some(request_id);
                Ok(())
            }
        }
    }

    /// Release the professional. Idempotent.
    pub fn mark_free(&mut self, professional_id: Uuid) -> Result<(), LifecycleError> {
        let row = self.row_mut(professional_id)?;
        row.available = true;
        row.current_request = None;
        Ok(())
    }

    /// Release the professional only while it still points at `request_id`.
    /// Unknown professionals and ones already moved on are left alone.
    pub fn release_if_linked(&mut self, professional_id: Uuid, request_id: Uuid) {
        if let Some(row) = self.rows.get_mut(&professional_id) {
            if row.current_request == Some(request_id) {
                row.available = true;
                row.current_request = None;
            }
        }
    }

    /// Rows whose availability changed, in professional id order.
    pub fn into_changes(self) -> Vec<ProfessionalAvailability> {
        let original = self.original;
        self.rows
            .into_values()
            .filter(|row| original.get(&row.professional_id) != Some(row))
            .collect()
    }
}
