//! Transition evaluator
//!
//! Validates a requested action against the status registry and computes the
//! next status. Evaluation is pure and deterministic: identical inputs always
//! produce identical outputs, so a failed mutation can be retried by the user
//! without the evaluator drifting.

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

use crate::models::Document;
use crate::status::{allowed_actions, transition_target, Action, DocumentStatus, Role};

/// Why a transition was refused
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionError {
    /// The role may not perform this action (at all, or on another stage's document)
    #[error("{role} is not permitted to {action}")]
    UnauthorizedActor { role: Role, action: Action },

    /// The action is not valid from the current status
    #[error("cannot {action} a document that is {status}")]
    IllegalTransition { status: DocumentStatus, action: Action },

    /// The document moved on after it was read
    #[error("document changed from {expected} to {actual} since it was loaded")]
    StaleState {
        expected: DocumentStatus,
        actual: DocumentStatus,
    },

    /// Submission refused because the deadline has passed
    #[error("submission deadline {due} has passed")]
    DeadlinePassed { due: NaiveDateTime },
}

/// Evaluate `action` by `role` on a document in `current`
pub fn evaluate(
    current: DocumentStatus,
    role: Role,
    action: Action,
) -> Result<DocumentStatus, TransitionError> {
    if !role.permits(action) {
        return Err(TransitionError::UnauthorizedActor { role, action });
    }

    // Review actions belong to the reviewer of the document's current stage
    if action.is_review() {
        if let Some(stage) = current.stage() {
            if stage.reviewer() != role {
                return Err(TransitionError::UnauthorizedActor { role, action });
            }
        }
    }

    transition_target(current, role, action)
        .ok_or(TransitionError::IllegalTransition { status: current, action })
}

/// Evaluate against the status the client last read
///
/// `observed` is the status most recently fetched from the backend. If it
/// differs from `expected` another actor has moved the document and the
/// write is refused rather than applied on top of unseen changes.
pub fn evaluate_fresh(
    expected: DocumentStatus,
    observed: DocumentStatus,
    role: Role,
    action: Action,
) -> Result<DocumentStatus, TransitionError> {
    if expected != observed {
        return Err(TransitionError::StaleState {
            expected,
            actual: observed,
        });
    }
    evaluate(observed, role, action)
}

/// Evaluate an action on a concrete document at time `now`
///
/// Adds the submission deadline guard on top of [`evaluate`].
pub fn evaluate_document(
    document: &Document,
    role: Role,
    action: Action,
    now: NaiveDateTime,
) -> Result<DocumentStatus, TransitionError> {
    let next = evaluate(document.status, role, action)?;
    if action == Action::Submit {
        if let Some(due) = document.deadline {
            if now > due {
                return Err(TransitionError::DeadlinePassed { due });
            }
        }
    }
    Ok(next)
}

/// Convenience for UIs: can `role` do anything at all with this status?
pub fn has_any_action(status: DocumentStatus, role: Role) -> bool {
    !allowed_actions(status, role).is_empty()
}
