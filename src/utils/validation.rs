use crate::api::error::AppError;

/// Maximum filename length in bytes (common filesystem limit)
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Checks that a client-supplied filename can be stored verbatim inside the
/// owner's directory. Names are never rewritten: anything unsafe is rejected.
pub fn validate_filename(filename: &str) -> Result<(), AppError> {
    if filename.trim().is_empty() {
        return Err(AppError::BadRequest("Filename is required".to_string()));
    }

    if filename.len() > MAX_FILENAME_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Filename exceeds {} bytes",
            MAX_FILENAME_LENGTH
        )));
    }

    if filename == "." || filename == ".." || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {:?}", filename);
        return Err(AppError::BadRequest("Invalid filename".to_string()));
    }

    if filename.chars().any(|c| c.is_control()) {
        return Err(AppError::BadRequest(
            "Filename contains control characters".to_string(),
        ));
    }

    Ok(())
}

/// Rejects missing or whitespace-only required fields.
pub fn require_not_blank(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    Ok(())
}
