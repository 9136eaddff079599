//! Portal entity models
//!
//! Wire types exchanged with the backend. Field names follow the backend's
//! camelCase JSON. The backend owns all of these; the client only caches them.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::status::{DocumentStatus, ReviewDecision, Role};
use crate::Error;

// ========================================
// Documents
// ========================================

/// Kind of FYP deliverable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    Proposal,
    DesignDocument,
    TestDocument,
    Thesis,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Proposal,
        DocumentKind::DesignDocument,
        DocumentKind::TestDocument,
        DocumentKind::Thesis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Proposal => "PROPOSAL",
            DocumentKind::DesignDocument => "DESIGN_DOCUMENT",
            DocumentKind::TestDocument => "TEST_DOCUMENT",
            DocumentKind::Thesis => "THESIS",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Proposal => "Proposal",
            DocumentKind::DesignDocument => "Design Document",
            DocumentKind::TestDocument => "Test Document",
            DocumentKind::Thesis => "Thesis",
        }
    }

    /// Match a free-text deadline label ("design document") to a kind
    pub fn from_label(label: &str) -> Option<DocumentKind> {
        let wanted = label.trim();
        DocumentKind::ALL.iter().copied().find(|kind| {
            kind.label().eq_ignore_ascii_case(wanted) || kind.as_str().eq_ignore_ascii_case(wanted)
        })
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocumentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentKind::from_label(s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown document kind: {}", s)))
    }
}

/// A student's document for one deliverable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: i64,
    pub student_id: i64,
    #[serde(default)]
    pub student_name: Option<String>,
    /// `None` for documents uploaded against a custom deadline label
    #[serde(rename = "type", default)]
    pub kind: Option<DocumentKind>,
    #[serde(default)]
    pub custom_type: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<i64>,
    pub version: u32,
    pub status: DocumentStatus,
    pub is_submitted: bool,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub is_late_submission: bool,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub submitted_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub supervisor_id: Option<i64>,
    #[serde(default)]
    pub supervisor_name: Option<String>,
    /// Due time copied from the deadline in force when the document was created
    #[serde(default)]
    pub deadline: Option<NaiveDateTime>,
}

impl Document {
    /// A freshly uploaded draft at version 1
    pub fn new_draft(
        id: i64,
        student_id: i64,
        kind: DocumentKind,
        title: impl Into<String>,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            student_id,
            student_name: None,
            kind: Some(kind),
            custom_type: None,
            title: title.into(),
            description: None,
            file_name: None,
            file_size: None,
            version: 1,
            status: DocumentStatus::Draft,
            is_submitted: false,
            is_locked: false,
            is_late_submission: false,
            created_at,
            submitted_at: None,
            updated_at: None,
            supervisor_id: None,
            supervisor_name: None,
            deadline: None,
        }
    }

    /// Move to `status`, keeping `is_submitted` in step with it
    pub fn set_status(&mut self, status: DocumentStatus) {
        self.status = status;
        self.is_submitted = status.is_submitted();
    }

    /// `is_submitted` agrees with the status
    pub fn is_consistent(&self) -> bool {
        self.is_submitted == self.status.is_submitted()
    }

    /// Kind label, falling back to the custom deadline label
    pub fn kind_label(&self) -> String {
        match (&self.kind, &self.custom_type) {
            (Some(kind), _) => kind.label().to_string(),
            (None, Some(custom)) => custom.clone(),
            (None, None) => "Document".to_string(),
        }
    }
}

/// One uploaded file version of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVersion {
    pub id: i64,
    pub document_id: i64,
    pub version_number: u32,
    pub file_name: String,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default)]
    pub change_description: Option<String>,
    #[serde(default)]
    pub was_submitted: bool,
    pub uploaded_at: NaiveDateTime,
}

// ========================================
// Reviews
// ========================================

/// Append-only review record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub document_id: i64,
    #[serde(default)]
    pub reviewer_id: Option<i64>,
    #[serde(default)]
    pub reviewer_name: Option<String>,
    #[serde(default)]
    pub reviewer_role: Option<Role>,
    pub comments: String,
    pub decision: ReviewDecision,
    pub review_round: u32,
    pub reviewed_at: NaiveDateTime,
}

/// Body of a create-review call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub document_id: i64,
    pub comments: String,
    pub decision: ReviewDecision,
    pub review_round: u32,
}

// ========================================
// Grades
// ========================================

/// Score for one rubric criterion of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: i64,
    pub document_id: i64,
    #[serde(default)]
    pub evaluator_id: Option<i64>,
    #[serde(default)]
    pub evaluator_name: Option<String>,
    pub rubric_criteria: String,
    pub score: f64,
    pub max_score: f64,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub is_released: bool,
    #[serde(default)]
    pub graded_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub released_at: Option<NaiveDateTime>,
}

impl Grade {
    /// `0 ≤ score ≤ max_score`
    pub fn is_valid(&self) -> bool {
        self.score >= 0.0 && self.max_score >= 0.0 && self.score <= self.max_score
    }
}

/// Body of a create/update grade call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGrade {
    pub document_id: i64,
    pub rubric_criteria: String,
    pub score: f64,
    pub max_score: f64,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl NewGrade {
    /// Reject out-of-range scores before they reach the backend
    pub fn validate(&self) -> crate::Result<()> {
        if self.rubric_criteria.trim().is_empty() {
            return Err(Error::InvalidInput("Rubric criteria is required".to_string()));
        }
        if self.max_score <= 0.0 {
            return Err(Error::InvalidInput("Max score must be positive".to_string()));
        }
        if self.score < 0.0 || self.score > self.max_score {
            return Err(Error::InvalidInput(format!(
                "Score {} must be between 0 and {}",
                self.score, self.max_score
            )));
        }
        Ok(())
    }
}

// ========================================
// Deadlines
// ========================================

/// Committee-set submission deadline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deadline {
    pub id: i64,
    /// Free-text label ("Proposal", "Code Files", ...)
    pub deadline_type: String,
    /// Explicit link to a document kind, when the committee set one
    #[serde(default)]
    pub document_type: Option<DocumentKind>,
    #[serde(rename = "deadline")]
    pub due: NaiveDateTime,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

fn default_true() -> bool {
    true
}

impl Deadline {
    /// Document kind this deadline governs (explicit link, else label match)
    pub fn linked_kind(&self) -> Option<DocumentKind> {
        self.document_type
            .or_else(|| DocumentKind::from_label(&self.deadline_type))
    }
}

// ========================================
// Notifications and chat
// ========================================

/// Notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    DocumentSubmitted,
    ReviewReceived,
    GradeReceived,
    GradeAssigned,
    DeadlineReminder,
    RevisionRequested,
    DocumentApproved,
    GradeReleased,
    DeadlineAdded,
    DeadlineApproaching,
    SystemAnnouncement,
}

/// A per-user notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub related_entity_type: Option<String>,
    #[serde(default)]
    pub related_entity_id: Option<i64>,
}

/// Sender shown next to a chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSender {
    pub id: i64,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Group chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i64,
    #[serde(default)]
    pub sender: Option<ChatSender>,
    pub content: String,
    pub sent_at: NaiveDateTime,
}

// ========================================
// Users
// ========================================

/// Authenticated user as returned by login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: i64,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}
