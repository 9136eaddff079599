//! Screen-level composition
//!
//! Each view owns one [`ViewCache`](crate::coordinator::ViewCache) and routes
//! every user action through the shared
//! [`MutationCoordinator`](crate::coordinator::MutationCoordinator).

use fyp_common::models::UserProfile;
use fyp_common::Role;

use crate::error::{PortalError, Result};

pub mod deadlines;
pub mod documents;
pub mod grades;
pub mod notifications;

pub use deadlines::DeadlinesView;
pub use documents::{DocumentFeedback, DocumentScope, DocumentsView};
pub use grades::GradesView;
pub use notifications::NotificationsView;

/// Refuse an operation reserved for `role`
pub(crate) fn require_role(user: &UserProfile, role: Role, what: &str) -> Result<()> {
    if user.role == role {
        Ok(())
    } else {
        Err(PortalError::UnauthorizedActor(format!(
            "{} is not permitted to {}",
            user.role, what
        )))
    }
}
