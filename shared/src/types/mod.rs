//! Common type definitions shared across Billix backend services

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Core identifier types
pub type UserId = Uuid;

/// One page of a cursor-paginated listing.
///
/// `next_cursor` is `None` once the final page has been served; feeding it
/// back into the same query resumes the listing without server-side state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorPage<T> {
    pub entries: Vec<T>,
    pub next_cursor: Option<i64>,
}

impl<T> CursorPage<T> {
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}
