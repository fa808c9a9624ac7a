//! Appointment lifecycle.
//!
//! | from                             | action       | to          |
//! |----------------------------------|--------------|-------------|
//! | scheduled, rescheduled           | `confirm`    | confirmed   |
//! | scheduled, confirmed, rescheduled| `start`      | in-progress |
//! | in-progress                      | `complete`   | completed   |
//! | scheduled, confirmed, rescheduled| `cancel`     | cancelled   |
//! | scheduled, confirmed, rescheduled| `no-show`    | no-show     |
//! | scheduled, confirmed, rescheduled| `reschedule` | rescheduled |
//!
//! `completed`, `cancelled` and `no-show` are terminal.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
    Rescheduled,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::InProgress => "in-progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no-show",
            AppointmentStatus::Rescheduled => "rescheduled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    /// Every status except `cancelled` and `completed` holds the doctor's slot
    pub fn occupies_slot(self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Completed)
    }

    /// Booked but not yet started
    fn is_pending(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Scheduled | AppointmentStatus::Confirmed | AppointmentStatus::Rescheduled
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum StatusAction {
    Confirm,
    Start,
    Complete,
    Cancel,
    NoShow,
    Reschedule,
}

impl StatusAction {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusAction::Confirm => "confirm",
            StatusAction::Start => "start",
            StatusAction::Complete => "complete",
            StatusAction::Cancel => "cancel",
            StatusAction::NoShow => "no-show",
            StatusAction::Reschedule => "reschedule",
        }
    }
}

impl fmt::Display for StatusAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Cannot {action} an appointment that is {from}")]
pub struct TransitionRejected {
    pub from: AppointmentStatus,
    pub action: StatusAction,
}

/// Next status for `action` applied in `current`
///
/// # Errors
///
/// Returns [`TransitionRejected`] when `action` is not allowed from `current`.
pub fn transition(
    current: AppointmentStatus,
    action: StatusAction,
) -> Result<AppointmentStatus, TransitionRejected> {
    use AppointmentStatus as S;

    let next = match (current, action) {
        (S::Scheduled | S::Rescheduled, StatusAction::Confirm) => S::Confirmed,
        (from, StatusAction::Start) if from.is_pending() => S::InProgress,
        (S::InProgress, StatusAction::Complete) => S::Completed,
        (from, StatusAction::Cancel) if from.is_pending() => S::Cancelled,
        (from, StatusAction::NoShow) if from.is_pending() => S::NoShow,
        (from, StatusAction::Reschedule) if from.is_pending() => S::Rescheduled,
        (from, action) => return Err(TransitionRejected { from, action }),
    };
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus as S;

    const ALL: [AppointmentStatus; 7] = [
        S::Scheduled,
        S::Confirmed,
        S::InProgress,
        S::Completed,
        S::Cancelled,
        S::NoShow,
        S::Rescheduled,
    ];

    const ACTIONS: [StatusAction; 6] = [
        StatusAction::Confirm,
        StatusAction::Start,
        StatusAction::Complete,
        StatusAction::Cancel,
        StatusAction::NoShow,
        StatusAction::Reschedule,
    ];

    #[test]
    fn happy_path() {
        let confirmed = transition(S::Scheduled, StatusAction::Confirm).unwrap();
        let started = transition(confirmed, StatusAction::Start).unwrap();
        let done = transition(started, StatusAction::Complete).unwrap();
        assert_eq!(done, S::Completed);
    }

    #[test]
    fn terminal_states_reject_everything() {
        for status in ALL.into_iter().filter(|s| s.is_terminal()) {
            for action in ACTIONS {
                assert!(transition(status, action).is_err(), "{status} / {action}");
            }
        }
    }

    #[test]
    fn in_progress_can_only_complete() {
        for action in ACTIONS {
            let result = transition(S::InProgress, action);
            assert_eq!(result.is_ok(), action == StatusAction::Complete, "{action}");
        }
    }

    #[test]
    fn rescheduled_behaves_like_scheduled() {
        for action in ACTIONS {
            assert_eq!(
                transition(S::Rescheduled, action).is_ok(),
                transition(S::Scheduled, action).is_ok(),
                "{action}"
            );
        }
    }

    #[test]
    fn cannot_confirm_twice() {
        let err = transition(S::Confirmed, StatusAction::Confirm).unwrap_err();
        assert_eq!(err.to_string(), "Cannot confirm an appointment that is confirmed");
    }

    #[test]
    fn no_show_still_holds_the_slot() {
        assert!(S::NoShow.occupies_slot());
        assert!(!S::Cancelled.occupies_slot());
        assert!(!S::Completed.occupies_slot());
    }
}
