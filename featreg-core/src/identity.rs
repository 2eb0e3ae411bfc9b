//! Identity types for registry metadata

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Identifier assigned to a project when its metadata entry is created.
pub type ProjectUuid = Uuid;

/// Generate a fresh random project UUID.
pub fn new_project_uuid() -> ProjectUuid {
    Uuid::new_v4()
}
