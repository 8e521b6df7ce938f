// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// Valid next statuses. Setting the current status again is always allowed.
pub fn valid_transitions(current: AppointmentStatus) -> &'static [AppointmentStatus] {
    match current {
        AppointmentStatus::Pending => &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled],
        AppointmentStatus::Confirmed => &[AppointmentStatus::Completed, AppointmentStatus::Cancelled],
        // Terminal states
        AppointmentStatus::Cancelled | AppointmentStatus::Completed => &[],
    }
}

pub fn validate_status_transition(
    current: AppointmentStatus,
    next: AppointmentStatus,
) -> Result<(), AppointmentError> {
    debug!("Validating status transition from {} to {}", current, next);

    if current == next || valid_transitions(current).contains(&next) {
        return Ok(());
    }

    warn!("Invalid status transition attempted: {} -> {}", current, next);
    Err(AppointmentError::InvalidStatusTransition { from: current, to: next })
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus::*;

    #[test]
    fn test_transitions() {
        assert!(validate_status_transition(Pending, Confirmed).is_ok());
        assert!(validate_status_transition(Pending, Cancelled).is_ok());
        assert!(validate_status_transition(Confirmed, Completed).is_ok());
        assert!(validate_status_transition(Pending, Pending).is_ok());

        assert!(validate_status_transition(Pending, Completed).is_err());
        assert!(validate_status_transition(Cancelled, Confirmed).is_err());
        assert!(validate_status_transition(Completed, Cancelled).is_err());
    }
}
