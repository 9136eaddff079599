//! Document lifecycle status registry
//!
//! Enumerates every document status, the portal roles, the actions a role
//! can request, and the legal transition table that ties them together.
//!
//! # Pipeline
//!
//! ```text
//! DRAFT → SUBMITTED → UNDER_SUPERVISOR_REVIEW → SUPERVISOR_APPROVED
//!       → UNDER_EVALUATION_COMMITTEE_REVIEW → EVALUATION_COMMITTEE_APPROVED
//!       → UNDER_FYP_COMMITTEE_REVIEW → FYP_COMMITTEE_APPROVED → FINAL_APPROVED
//! ```
//!
//! Each review stage may instead request a revision (`*_REVISION_REQUESTED`)
//! or reject (`REJECTED`, terminal). Revisions are stage-scoped: a resubmitted
//! revision re-enters the review state of the stage that asked for it, not
//! the start of the pipeline.
//!
//! All functions here are pure and total over the enumerations. Unknown
//! strings are rejected at parse time (`FromStr` / serde), never defaulted.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

// ========================================
// Document Status
// ========================================

/// Lifecycle status of a submitted document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Draft,
    Submitted,
    UnderSupervisorReview,
    SupervisorApproved,
    SupervisorRevisionRequested,
    UnderEvaluationCommitteeReview,
    EvaluationCommitteeApproved,
    EvaluationCommitteeRevisionRequested,
    UnderFypCommitteeReview,
    FypCommitteeApproved,
    FypCommitteeRevisionRequested,
    FinalApproved,
    Rejected,
}

/// Statuses counted as "approved" on dashboards
pub const APPROVED_STATUSES: [DocumentStatus; 4] = [
    DocumentStatus::SupervisorApproved,
    DocumentStatus::EvaluationCommitteeApproved,
    DocumentStatus::FypCommitteeApproved,
    DocumentStatus::FinalApproved,
];

/// Statuses counted as "under review" on dashboards
pub const UNDER_REVIEW_STATUSES: [DocumentStatus; 4] = [
    DocumentStatus::Submitted,
    DocumentStatus::UnderSupervisorReview,
    DocumentStatus::UnderEvaluationCommitteeReview,
    DocumentStatus::UnderFypCommitteeReview,
];

/// Statuses in which a reviewer has asked the student for changes
pub const REVISION_STATUSES: [DocumentStatus; 3] = [
    DocumentStatus::SupervisorRevisionRequested,
    DocumentStatus::EvaluationCommitteeRevisionRequested,
    DocumentStatus::FypCommitteeRevisionRequested,
];

impl DocumentStatus {
    /// Every status, in pipeline order
    pub const ALL: [DocumentStatus; 13] = [
        DocumentStatus::Draft,
        DocumentStatus::Submitted,
        DocumentStatus::UnderSupervisorReview,
        DocumentStatus::SupervisorApproved,
        DocumentStatus::SupervisorRevisionRequested,
        DocumentStatus::UnderEvaluationCommitteeReview,
        DocumentStatus::EvaluationCommitteeApproved,
        DocumentStatus::EvaluationCommitteeRevisionRequested,
        DocumentStatus::UnderFypCommitteeReview,
        DocumentStatus::FypCommitteeApproved,
        DocumentStatus::FypCommitteeRevisionRequested,
        DocumentStatus::FinalApproved,
        DocumentStatus::Rejected,
    ];

    /// Wire representation (matches the backend enum names)
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "DRAFT",
            DocumentStatus::Submitted => "SUBMITTED",
            DocumentStatus::UnderSupervisorReview => "UNDER_SUPERVISOR_REVIEW",
            DocumentStatus::SupervisorApproved => "SUPERVISOR_APPROVED",
            DocumentStatus::SupervisorRevisionRequested => "SUPERVISOR_REVISION_REQUESTED",
            DocumentStatus::UnderEvaluationCommitteeReview => "UNDER_EVALUATION_COMMITTEE_REVIEW",
            DocumentStatus::EvaluationCommitteeApproved => "EVALUATION_COMMITTEE_APPROVED",
            DocumentStatus::EvaluationCommitteeRevisionRequested => {
                "EVALUATION_COMMITTEE_REVISION_REQUESTED"
            }
            DocumentStatus::UnderFypCommitteeReview => "UNDER_FYP_COMMITTEE_REVIEW",
            DocumentStatus::FypCommitteeApproved => "FYP_COMMITTEE_APPROVED",
            DocumentStatus::FypCommitteeRevisionRequested => "FYP_COMMITTEE_REVISION_REQUESTED",
            DocumentStatus::FinalApproved => "FINAL_APPROVED",
            DocumentStatus::Rejected => "REJECTED",
        }
    }

    /// Human-readable label for listings
    pub fn label(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "Draft",
            DocumentStatus::Submitted => "Submitted",
            DocumentStatus::UnderSupervisorReview => "Under Supervisor Review",
            DocumentStatus::SupervisorApproved => "Supervisor Approved",
            DocumentStatus::SupervisorRevisionRequested => "Supervisor Requested Revision",
            DocumentStatus::UnderEvaluationCommitteeReview => "Under Evaluation Committee Review",
            DocumentStatus::EvaluationCommitteeApproved => "Evaluation Committee Approved",
            DocumentStatus::EvaluationCommitteeRevisionRequested => {
                "Evaluation Committee Requested Revision"
            }
            DocumentStatus::UnderFypCommitteeReview => "Under FYP Committee Review",
            DocumentStatus::FypCommitteeApproved => "FYP Committee Approved",
            DocumentStatus::FypCommitteeRevisionRequested => "FYP Committee Requested Revision",
            DocumentStatus::FinalApproved => "Final Approved",
            DocumentStatus::Rejected => "Rejected",
        }
    }

    /// True when the student may upload a new version
    pub fn is_editable(&self) -> bool {
        *self == DocumentStatus::Draft || self.is_revision_requested()
    }

    /// True when no further action is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::FinalApproved | DocumentStatus::Rejected)
    }

    /// True once the document has left DRAFT
    pub fn is_submitted(&self) -> bool {
        *self != DocumentStatus::Draft
    }

    pub fn is_revision_requested(&self) -> bool {
        REVISION_STATUSES.contains(self)
    }

    pub fn is_approved(&self) -> bool {
        APPROVED_STATUSES.contains(self)
    }

    pub fn is_under_review(&self) -> bool {
        UNDER_REVIEW_STATUSES.contains(self)
    }

    /// Review stage whose reviewer (or whose student resubmission) acts next
    ///
    /// `None` for DRAFT and for terminal statuses.
    pub fn stage(&self) -> Option<ReviewStage> {
        match self {
            DocumentStatus::Submitted
            | DocumentStatus::UnderSupervisorReview
            | DocumentStatus::SupervisorRevisionRequested => Some(ReviewStage::Supervisor),
            DocumentStatus::SupervisorApproved
            | DocumentStatus::UnderEvaluationCommitteeReview
            | DocumentStatus::EvaluationCommitteeRevisionRequested => {
                Some(ReviewStage::EvaluationCommittee)
            }
            DocumentStatus::EvaluationCommitteeApproved
            | DocumentStatus::UnderFypCommitteeReview
            | DocumentStatus::FypCommitteeRevisionRequested
            | DocumentStatus::FypCommitteeApproved => Some(ReviewStage::FypCommittee),
            DocumentStatus::Draft | DocumentStatus::FinalApproved | DocumentStatus::Rejected => {
                None
            }
        }
    }

    /// Display tone used when rendering a status badge
    pub fn tone(&self) -> StatusTone {
        if self.is_approved() {
            StatusTone::Positive
        } else if *self == DocumentStatus::Draft {
            StatusTone::Pending
        } else if self.is_under_review() {
            StatusTone::InProgress
        } else {
            StatusTone::Attention
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::UnknownStatus(s.to_string()))
    }
}

/// Badge tone for a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Positive,
    Pending,
    InProgress,
    Attention,
}

// ========================================
// Roles
// ========================================

/// Portal role of the acting user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Supervisor,
    Evaluator,
    FypCommittee,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Student,
        Role::Supervisor,
        Role::Evaluator,
        Role::FypCommittee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Supervisor => "SUPERVISOR",
            Role::Evaluator => "EVALUATOR",
            Role::FypCommittee => "FYP_COMMITTEE",
        }
    }

    /// Whether the role may ever request this action, independent of status
    pub fn permits(&self, action: Action) -> bool {
        match self {
            Role::Student => matches!(action, Action::UploadVersion | Action::Submit),
            Role::Supervisor | Role::Evaluator => action.is_review(),
            Role::FypCommittee => action.is_review() || action == Action::Finalize,
        }
    }

    /// Review decisions this role may record
    pub fn allowed_decisions(&self) -> &'static [ReviewDecision] {
        match self {
            Role::Student => &[],
            Role::Supervisor | Role::Evaluator | Role::FypCommittee => &ReviewDecision::ALL,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| Error::UnknownRole(s.to_string()))
    }
}

// ========================================
// Review stages
// ========================================

/// One reviewer stage of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewStage {
    Supervisor,
    EvaluationCommittee,
    FypCommittee,
}

impl ReviewStage {
    pub const ALL: [ReviewStage; 3] = [
        ReviewStage::Supervisor,
        ReviewStage::EvaluationCommittee,
        ReviewStage::FypCommittee,
    ];

    /// Role that reviews this stage
    pub fn reviewer(&self) -> Role {
        match self {
            ReviewStage::Supervisor => Role::Supervisor,
            ReviewStage::EvaluationCommittee => Role::Evaluator,
            ReviewStage::FypCommittee => Role::FypCommittee,
        }
    }

    /// Status a document sits in while waiting for this stage to pick it up
    pub fn awaiting_status(&self) -> DocumentStatus {
        match self {
            ReviewStage::Supervisor => DocumentStatus::Submitted,
            ReviewStage::EvaluationCommittee => DocumentStatus::SupervisorApproved,
            ReviewStage::FypCommittee => DocumentStatus::EvaluationCommitteeApproved,
        }
    }

    pub fn review_status(&self) -> DocumentStatus {
        match self {
            ReviewStage::Supervisor => DocumentStatus::UnderSupervisorReview,
            ReviewStage::EvaluationCommittee => DocumentStatus::UnderEvaluationCommitteeReview,
            ReviewStage::FypCommittee => DocumentStatus::UnderFypCommitteeReview,
        }
    }

    pub fn approved_status(&self) -> DocumentStatus {
        match self {
            ReviewStage::Supervisor => DocumentStatus::SupervisorApproved,
            ReviewStage::EvaluationCommittee => DocumentStatus::EvaluationCommitteeApproved,
            ReviewStage::FypCommittee => DocumentStatus::FypCommitteeApproved,
        }
    }

    pub fn revision_status(&self) -> DocumentStatus {
        match self {
            ReviewStage::Supervisor => DocumentStatus::SupervisorRevisionRequested,
            ReviewStage::EvaluationCommittee => {
                DocumentStatus::EvaluationCommitteeRevisionRequested
            }
            ReviewStage::FypCommittee => DocumentStatus::FypCommitteeRevisionRequested,
        }
    }

    /// Stage reviewed by the given role, if any
    pub fn for_reviewer(role: Role) -> Option<ReviewStage> {
        ReviewStage::ALL.iter().copied().find(|stage| stage.reviewer() == role)
    }
}

// ========================================
// Actions and review decisions
// ========================================

/// Action a user can request on a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    UploadVersion,
    Submit,
    BeginReview,
    Approve,
    RequestRevision,
    Reject,
    Finalize,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::UploadVersion,
        Action::Submit,
        Action::BeginReview,
        Action::Approve,
        Action::RequestRevision,
        Action::Reject,
        Action::Finalize,
    ];

    /// Reviewer-side actions (picking up a document or deciding on it)
    pub fn is_review(&self) -> bool {
        matches!(
            self,
            Action::BeginReview | Action::Approve | Action::RequestRevision | Action::Reject
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::UploadVersion => "upload_version",
            Action::Submit => "submit",
            Action::BeginReview => "begin_review",
            Action::Approve => "approve",
            Action::RequestRevision => "request_revision",
            Action::Reject => "reject",
            Action::Finalize => "finalize",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision recorded by a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewDecision {
    Approved,
    RevisionRequested,
    Rejected,
}

impl ReviewDecision {
    pub const ALL: [ReviewDecision; 3] = [
        ReviewDecision::Approved,
        ReviewDecision::RevisionRequested,
        ReviewDecision::Rejected,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReviewDecision::Approved => "Approved",
            ReviewDecision::RevisionRequested => "Revision Requested",
            ReviewDecision::Rejected => "Rejected",
        }
    }

    /// Lifecycle action the decision performs
    pub fn action(&self) -> Action {
        match self {
            ReviewDecision::Approved => Action::Approve,
            ReviewDecision::RevisionRequested => Action::RequestRevision,
            ReviewDecision::Rejected => Action::Reject,
        }
    }
}

impl FromStr for ReviewDecision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "APPROVED" | "APPROVE" => Ok(ReviewDecision::Approved),
            "REVISION_REQUESTED" | "REVISION" => Ok(ReviewDecision::RevisionRequested),
            "REJECTED" | "REJECT" => Ok(ReviewDecision::Rejected),
            _ => Err(Error::InvalidInput(format!("Unknown review decision: {}", s))),
        }
    }
}

// ========================================
// Transition table
// ========================================

/// The legal transition table
///
/// Returns the status reached when `role` performs `action` on a document in
/// `status`, or `None` if the combination is not in the table.
pub fn transition_target(
    status: DocumentStatus,
    role: Role,
    action: Action,
) -> Option<DocumentStatus> {
    match (role, action) {
        (Role::Student, Action::UploadVersion) => status.is_editable().then_some(status),
        (Role::Student, Action::Submit) => {
            if status == DocumentStatus::Draft {
                Some(DocumentStatus::Submitted)
            } else if status.is_revision_requested() {
                // Stage-scoped: re-enter the review of the stage that asked
                status.stage().map(|stage| stage.review_status())
            } else {
                None
            }
        }
        (Role::FypCommittee, Action::Finalize) => (status == DocumentStatus::FypCommitteeApproved)
            .then_some(DocumentStatus::FinalApproved),
        (reviewer, action) if action.is_review() => {
            let stage = status.stage()?;
            if stage.reviewer() != reviewer {
                return None;
            }
            let awaiting = status == stage.awaiting_status();
            if !awaiting && status != stage.review_status() {
                return None;
            }
            match action {
                Action::BeginReview => awaiting.then_some(stage.review_status()),
                Action::Approve => Some(stage.approved_status()),
                Action::RequestRevision => Some(stage.revision_status()),
                Action::Reject => Some(DocumentStatus::Rejected),
                _ => None,
            }
        }
        _ => None,
    }
}

/// True when the student may upload a new version in this status
pub fn is_editable(status: DocumentStatus) -> bool {
    status.is_editable()
}

/// True when the status admits no further action
pub fn is_terminal(status: DocumentStatus) -> bool {
    status.is_terminal()
}

/// Actions `role` may perform on a document in `status`
pub fn allowed_actions(status: DocumentStatus, role: Role) -> BTreeSet<Action> {
    Action::ALL
        .iter()
        .copied()
        .filter(|action| transition_target(status, role, *action).is_some())
        .collect()
}

// ========================================
// Tests
// ========================================
