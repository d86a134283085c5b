use serde::{Serialize, Deserialize};

/// JSON error body returned by every failing endpoint. `field` names the
/// payload field the error is scoped to, when one applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub status: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, status: u16) -> Self {
        Self {
            error: error.into(),
            field: None,
            status,
        }
    }

    pub fn with_field(error: impl Into<String>, field: impl Into<String>, status: u16) -> Self {
        Self {
            error: error.into(),
            field: Some(field.into()),
            status,
        }
    }
}
