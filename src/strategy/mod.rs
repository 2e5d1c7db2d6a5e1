//! Strategy orchestration.
//!
//! Each extraction method is a self-contained strategy behind a common
//! `attempt` trait; an orchestrator walks its ordered strategy list and
//! stops at the first accepted result, attaching provenance and confidence
//! together. Adding or reordering strategies is a data change in the
//! orchestrator constructor, not a control-flow change.

pub mod g28;
pub mod passport;

use crate::error::IntakeError;

/// Upload extensions the pipeline accepts. Checked before any strategy
/// runs, for every orchestrator.
const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png"];

/// Reject unsupported file types up front.
pub fn validate_extension(filename: &str) -> Result<(), IntakeError> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, e)| e.to_lowercase())
        .unwrap_or_default();
    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(IntakeError::UnsupportedFileType(filename.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_supported_extensions() {
        assert!(validate_extension("passport.pdf").is_ok());
        assert!(validate_extension("scan.JPG").is_ok());
        assert!(validate_extension("photo.jpeg").is_ok());
        assert!(validate_extension("page.png").is_ok());
    }

    #[test]
    fn rejects_everything_else() {
        assert!(matches!(
            validate_extension("resume.docx"),
            Err(IntakeError::UnsupportedFileType(_))
        ));
        assert!(validate_extension("noextension").is_err());
        assert!(validate_extension("archive.tar.gz").is_err());
    }
}
