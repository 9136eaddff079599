//! Exhaustive checks over the lifecycle tables

use std::collections::BTreeSet;

use fyp_common::status::{allowed_actions, is_editable, transition_target, REVISION_STATUSES};
use fyp_common::transition::{evaluate, TransitionError};
use fyp_common::{Action, DocumentStatus, ReviewStage, Role};

/// Position of a status along the forward pipeline
fn pipeline_rank(status: DocumentStatus) -> usize {
    match status {
        DocumentStatus::Draft => 0,
        DocumentStatus::Submitted => 1,
        DocumentStatus::UnderSupervisorReview | DocumentStatus::SupervisorRevisionRequested => 2,
        DocumentStatus::SupervisorApproved => 3,
        DocumentStatus::UnderEvaluationCommitteeReview
        | DocumentStatus::EvaluationCommitteeRevisionRequested => 4,
        DocumentStatus::EvaluationCommitteeApproved => 5,
        DocumentStatus::UnderFypCommitteeReview | DocumentStatus::FypCommitteeRevisionRequested => 6,
        DocumentStatus::FypCommitteeApproved => 7,
        DocumentStatus::FinalApproved => 8,
        DocumentStatus::Rejected => usize::MAX,
    }
}

#[test]
fn editable_iff_draft_or_revision() {
    for status in DocumentStatus::ALL {
        let expected = status == DocumentStatus::Draft || REVISION_STATUSES.contains(&status);
        assert_eq!(is_editable(status), expected, "{}", status);
    }
}

#[test]
fn evaluate_succeeds_only_for_table_entries() {
    for status in DocumentStatus::ALL {
        for role in Role::ALL {
            let allowed = allowed_actions(status, role);
            for action in Action::ALL {
                let result = evaluate(status, role, action);
                if allowed.contains(&action) {
                    assert_eq!(result, Ok(transition_target(status, role, action).unwrap()));
                } else {
                    assert!(
                        matches!(
                            result,
                            Err(TransitionError::UnauthorizedActor { .. })
                                | Err(TransitionError::IllegalTransition { .. })
                        ),
                        "{} by {} on {} should fail, got {:?}",
                        action,
                        role,
                        status,
                        result
                    );
                }
            }
        }
    }
}

#[test]
fn evaluate_is_idempotent() {
    for status in DocumentStatus::ALL {
        for role in Role::ALL {
            for action in Action::ALL {
                assert_eq!(evaluate(status, role, action), evaluate(status, role, action));
            }
        }
    }
}

#[test]
fn role_without_permission_is_unauthorized_regardless_of_status() {
    for status in DocumentStatus::ALL {
        assert!(matches!(
            evaluate(status, Role::Student, Action::Approve),
            Err(TransitionError::UnauthorizedActor { .. })
        ));
        assert!(matches!(
            evaluate(status, Role::Supervisor, Action::Submit),
            Err(TransitionError::UnauthorizedActor { .. })
        ));
    }
}

#[test]
fn transitions_never_skip_a_stage() {
    for status in DocumentStatus::ALL {
        for role in Role::ALL {
            for action in allowed_actions(status, role) {
                let next = evaluate(status, role, action).unwrap();
                if next == DocumentStatus::Rejected || next == status {
                    continue;
                }
                let (from, to) = (pipeline_rank(status), pipeline_rank(next));
                // Forward by at most one review step; an awaiting status may
                // pass through its own review state to the decision.
                assert!(to >= from, "{} -> {} moves backwards", status, next);
                assert!(to - from <= 2, "{} -> {} skips a stage", status, next);
            }
        }
    }
}

#[test]
fn revision_resubmission_is_stage_scoped() {
    for stage in ReviewStage::ALL {
        let next = evaluate(stage.revision_status(), Role::Student, Action::Submit).unwrap();
        assert_eq!(next, stage.review_status());
    }
}

#[test]
fn full_happy_path_reaches_final_approval() {
    let steps = [
        (Role::Student, Action::Submit),
        (Role::Supervisor, Action::BeginReview),
        (Role::Supervisor, Action::Approve),
        (Role::Evaluator, Action::BeginReview),
        (Role::Evaluator, Action::Approve),
        (Role::FypCommittee, Action::BeginReview),
        (Role::FypCommittee, Action::Approve),
        (Role::FypCommittee, Action::Finalize),
    ];
    let mut status = DocumentStatus::Draft;
    let mut seen = BTreeSet::new();
    for (role, action) in steps {
        status = evaluate(status, role, action).unwrap();
        assert!(seen.insert(status), "{} visited twice", status);
    }
    assert_eq!(status, DocumentStatus::FinalApproved);
    assert!(status.is_terminal());
}

#[test]
fn revision_loop_then_approval() {
    let mut status = evaluate(DocumentStatus::Draft, Role::Student, Action::Submit).unwrap();
    status = evaluate(status, Role::Supervisor, Action::RequestRevision).unwrap();
    assert_eq!(status, DocumentStatus::SupervisorRevisionRequested);

    status = evaluate(status, Role::Student, Action::UploadVersion).unwrap();
    assert_eq!(status, DocumentStatus::SupervisorRevisionRequested);

    status = evaluate(status, Role::Student, Action::Submit).unwrap();
    assert_eq!(status, DocumentStatus::UnderSupervisorReview);

    status = evaluate(status, Role::Supervisor, Action::Approve).unwrap();
    assert_eq!(status, DocumentStatus::SupervisorApproved);
}

#[test]
fn rejection_is_terminal_from_every_review_stage() {
    for stage in ReviewStage::ALL {
        let next = evaluate(stage.review_status(), stage.reviewer(), Action::Reject).unwrap();
        assert_eq!(next, DocumentStatus::Rejected);
        for role in Role::ALL {
            assert!(allowed_actions(next, role).is_empty());
        }
    }
}

#[test]
fn submitted_flag_matches_status() {
    for status in DocumentStatus::ALL {
        assert_eq!(status.is_submitted(), status != DocumentStatus::Draft);
    }
}
