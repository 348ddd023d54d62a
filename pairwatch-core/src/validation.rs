//! Input validation for room credentials and uploads
//!
//! Limits defined here are shared by the services and the HTTP layer.

/// Maximum room name length
pub const ROOM_NAME_MAX: usize = 100;
/// Maximum room password length
pub const ROOM_PASSWORD_MAX: usize = 128;
/// Maximum site password length accepted at the gate
pub const SITE_PASSWORD_MAX: usize = 128;
/// Maximum upload filename length
pub const FILENAME_MAX: usize = 255;
/// Maximum catalog title length
pub const TITLE_MAX: usize = 200;

/// Video extensions accepted for upload
pub const UPLOAD_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv"];

/// Validation error
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid {field}: {message}")]
    Field { field: String, message: String },

    #[error("File too large: {size} bytes exceeds {max} bytes")]
    TooLarge { size: usize, max: usize },
}

impl ValidationError {
    fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Field {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<ValidationError> for crate::Error {
    fn from(err: ValidationError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Validation result
pub type ValidationResult<T> = Result<T, ValidationError>;

fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::field(field, "is required"));
    }
    if value.chars().count() > max {
        return Err(ValidationError::field(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

pub fn validate_room_name(name: &str) -> ValidationResult<()> {
    validate_required("room name", name, ROOM_NAME_MAX)?;
    if name.chars().any(char::is_control) {
        return Err(ValidationError::field(
            "room name",
            "cannot contain control characters",
        ));
    }
    Ok(())
}

pub fn validate_room_password(password: &str) -> ValidationResult<()> {
    validate_required("password", password, ROOM_PASSWORD_MAX)
}

pub fn validate_site_password(password: &str) -> ValidationResult<()> {
    validate_required("password", password, SITE_PASSWORD_MAX)
}

pub fn validate_title(title: &str) -> ValidationResult<()> {
    validate_required("title", title, TITLE_MAX)
}

/// Lowercased extension of a filename, if any
#[must_use]
pub fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Check an uploaded file's name and size
///
/// Names must be a bare filename with an allowed video extension.
pub fn validate_upload(filename: &str, size: usize, max_size: usize) -> ValidationResult<()> {
    validate_required("filename", filename, FILENAME_MAX)?;

    if filename.contains(['/', '\\']) || filename.starts_with('.') {
        return Err(ValidationError::field(
            "filename",
            "must be a plain file name",
        ));
    }

    match extension(filename) {
        Some(ext) if UPLOAD_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => {
            return Err(ValidationError::field(
                "file type",
                format!("allowed types are {}", UPLOAD_EXTENSIONS.join(", ")),
            ))
        }
    }

    if size == 0 {
        return Err(ValidationError::field("file", "is empty"));
    }
    if size > max_size {
        return Err(ValidationError::TooLarge {
            size,
            max: max_size,
        });
    }

    Ok(())
}

/// MIME type for a media filename
#[must_use]
pub fn content_type_for(filename: &str) -> &'static str {
    match extension(filename).as_deref() {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("m4v") => "video/x-m4v",
        Some("mpg" | "mpeg") => "video/mpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: usize = 1024 * 1024;

    #[test]
    fn test_room_name() {
        assert!(validate_room_name("Friday movie night").is_ok());
        assert!(validate_room_name("").is_err());
        assert!(validate_room_name("   ").is_err());
        assert!(validate_room_name(&"a".repeat(ROOM_NAME_MAX + 1)).is_err());
        assert!(validate_room_name("tab\there").is_err());
    }

    #[test]
    fn test_room_password() {
        assert!(validate_room_password("p").is_ok());
        assert!(validate_room_password("").is_err());
        assert!(validate_room_password(&"x".repeat(ROOM_PASSWORD_MAX + 1)).is_err());
    }

    #[test]
    fn test_upload_extension() {
        assert!(validate_upload("trip.mp4", MIB, 100 * MIB).is_ok());
        assert!(validate_upload("trip.WEBM", MIB, 100 * MIB).is_ok());
        assert!(validate_upload("trip.mkv", MIB, 100 * MIB).is_ok());
        assert!(validate_upload("trip.avi", MIB, 100 * MIB).is_err());
        assert!(validate_upload("mp4", MIB, 100 * MIB).is_err());
        assert!(validate_upload(".mp4", MIB, 100 * MIB).is_err());
    }

    #[test]
    fn test_upload_path_rejected() {
        assert!(validate_upload("../secret.mp4", MIB, 100 * MIB).is_err());
        assert!(validate_upload("dir\\clip.mp4", MIB, 100 * MIB).is_err());
    }

    #[test]
    fn test_upload_size() {
        assert!(validate_upload("clip.mp4", 0, 100 * MIB).is_err());
        assert!(validate_upload("clip.mp4", 100 * MIB, 100 * MIB).is_ok());
        assert!(matches!(
            validate_upload("clip.mp4", 100 * MIB + 1, 100 * MIB),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.mp4"), "video/mp4");
        assert_eq!(content_type_for("a.MKV"), "video/x-matroska");
        assert_eq!(content_type_for("a.mov"), "video/quicktime");
        assert_eq!(content_type_for("a.mpeg"), "video/mpeg");
        assert_eq!(content_type_for("a.txt"), "application/octet-stream");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
