use serde::Serialize;

/// Success envelope shared by all endpoints.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ApiResponse<T> {
    /// Always `true`.
    #[schema(example = true)]
    pub success: bool,
    /// Number of items in `data`, for list responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            count: None,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(data)
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(data: Vec<T>) -> Self {
        Self {
            count: Some(data.len()),
            ..Self::new(data)
        }
    }
}

/// Comma-separated names of required fields that are absent or blank.
pub fn missing_fields(changes: &crate::reconcile::ChangeSet, required: &[(&str, &[&str])]) -> Option<String> {
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, aliases)| !changes.has_value(aliases))
        .map(|(field, _)| *field)
        .collect();
    (!missing.is_empty()).then(|| missing.join(", "))
}
