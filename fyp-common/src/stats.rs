//! Dashboard statistics and deadline derivations
//!
//! Pure functions over the document, review and deadline collections the
//! client already holds. No I/O.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{Deadline, Document, DocumentKind, Review};
use crate::status::{Action, DocumentStatus, ReviewStage, Role};
use crate::transition;

// ========================================
// Dashboard counts
// ========================================

/// Counts shown on a role dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    pub drafts: usize,
    pub under_review: usize,
    pub approved: usize,
    pub revision_requested: usize,
    pub final_approved: usize,
    pub rejected: usize,
}

impl DashboardStats {
    pub fn from_documents(documents: &[Document]) -> Self {
        let count = |pred: fn(&DocumentStatus) -> bool| {
            documents.iter().filter(|d| pred(&d.status)).count()
        };
        Self {
            total: documents.len(),
            drafts: count(|s| *s == DocumentStatus::Draft),
            under_review: count(DocumentStatus::is_under_review),
            approved: count(DocumentStatus::is_approved),
            revision_requested: count(DocumentStatus::is_revision_requested),
            final_approved: count(|s| *s == DocumentStatus::FinalApproved),
            rejected: count(|s| *s == DocumentStatus::Rejected),
        }
    }

    /// Documents that have left DRAFT
    pub fn submitted(&self) -> usize {
        self.total - self.drafts
    }
}

/// Documents waiting for `role` to act on them
pub fn pending_for(documents: &[Document], role: Role) -> Vec<&Document> {
    documents
        .iter()
        .filter(|d| transition::has_any_action(d.status, role))
        .collect()
}

// ========================================
// Reviews
// ========================================

/// Round number for the next review of `document_id` by `stage`
pub fn next_review_round(reviews: &[Review], document_id: i64, stage: ReviewStage) -> u32 {
    let prior = reviews
        .iter()
        .filter(|r| r.document_id == document_id && r.reviewer_role == Some(stage.reviewer()))
        .count();
    prior as u32 + 1
}

/// Most recent review of a document, by round then timestamp
pub fn latest_review(reviews: &[Review], document_id: i64) -> Option<&Review> {
    reviews
        .iter()
        .filter(|r| r.document_id == document_id)
        .max_by_key(|r| (r.review_round, r.reviewed_at))
}

// ========================================
// Deadlines
// ========================================

/// Deadline passed without a qualifying document
///
/// A document qualifies when it was created no later than the due time.
pub fn is_deadline_missed(
    due: NaiveDateTime,
    document: Option<&Document>,
    now: NaiveDateTime,
) -> bool {
    if now <= due {
        return false;
    }
    match document {
        None => true,
        Some(doc) => doc.created_at > due,
    }
}

/// Active, not yet passed, and due within `window` of `now`
pub fn is_deadline_approaching(deadline: &Deadline, now: NaiveDateTime, window: Duration) -> bool {
    deadline.is_active && deadline.due >= now && deadline.due - now <= window
}

/// The deadline in force for `kind`
///
/// Several active deadlines may name the same kind; the most recently
/// created wins, ties broken by the highest id.
pub fn in_force_deadline(deadlines: &[Deadline], kind: DocumentKind) -> Option<&Deadline> {
    deadlines
        .iter()
        .filter(|d| d.is_active && d.linked_kind() == Some(kind))
        .max_by_key(|d| (d.created_at, d.id))
}

/// One row of the student's "assigned documents" table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineRow {
    pub deadline: Deadline,
    /// Kind a new upload for this row would be filed under
    pub kind: Option<DocumentKind>,
    pub label: String,
    pub document: Option<Document>,
    pub is_passed: bool,
    pub is_missed: bool,
    pub can_upload: bool,
    pub can_submit: bool,
}

/// Find the student's document for a deadline
///
/// Linked deadlines match on kind; free-text deadlines fall back to a
/// case-insensitive match against the document title.
fn match_document<'a>(deadline: &Deadline, documents: &'a [Document]) -> Option<&'a Document> {
    match deadline.linked_kind() {
        Some(kind) => documents.iter().find(|d| d.kind == Some(kind)),
        None => {
            let wanted = deadline.deadline_type.to_lowercase();
            documents.iter().find(|d| {
                d.title.to_lowercase().contains(&wanted)
                    || d.custom_type
                        .as_deref()
                        .is_some_and(|c| c.eq_ignore_ascii_case(&deadline.deadline_type))
            })
        }
    }
}

/// Join active deadlines with the student's documents
pub fn deadline_rows(
    deadlines: &[Deadline],
    documents: &[Document],
    now: NaiveDateTime,
) -> Vec<DeadlineRow> {
    let mut rows: Vec<DeadlineRow> = deadlines
        .iter()
        .filter(|d| d.is_active)
        .map(|deadline| {
            let document = match_document(deadline, documents);
            let kind = deadline.linked_kind();
            let is_passed = now > deadline.due;
            let is_missed = is_deadline_missed(deadline.due, document, now);

            let can_upload = !is_missed
                && kind.is_some()
                && match document {
                    None => true,
                    Some(doc) => doc.status.is_editable(),
                };
            let can_submit = !is_missed
                && !is_passed
                && document.is_some_and(|doc| {
                    transition::evaluate(doc.status, Role::Student, Action::Submit).is_ok()
                });

            DeadlineRow {
                label: kind
                    .map(|k| k.label().to_string())
                    .unwrap_or_else(|| deadline.deadline_type.clone()),
                deadline: deadline.clone(),
                kind,
                document: document.cloned(),
                is_passed,
                is_missed,
                can_upload,
                can_submit,
            }
        })
        .collect();
    rows.sort_by_key(|row| row.deadline.due);
    rows
}
