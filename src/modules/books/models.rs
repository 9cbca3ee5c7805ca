use serde::{Deserialize, Serialize};

/// A stored book row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Storage-assigned identifier
    pub id: i64,
    pub name: Option<String>,
    /// URL or reference to the cover image
    pub img: Option<String>,
    pub summary: Option<String>,
}

/// Request body for creating or replacing a book.
///
/// Every field is optional; an omitted field is stored as null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookPayload {
    pub name: Option<String>,
    pub img: Option<String>,
    pub summary: Option<String>,
}

/// Response for a successful create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    pub id: i64,
}

/// Acknowledgement for update and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
