//! Screenshot capture errors.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CaptureError {
    #[error("No tab ID provided")]
    NoTabId,

    #[error("Tab not found: {0}")]
    TabNotFound(i64),

    #[error("Tab is not accessible: {0}")]
    NotAccessible(String),

    #[error("Capture API unavailable: {0}")]
    ApiUnavailable(String),

    #[error("Capture failed: {0}")]
    Failed(String),
}

impl CaptureError {
    /// Map a raw host error message for `tab_id` onto a capture error.
    pub fn from_host_message(tab_id: i64, message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("no tab with id") || lower.contains("tab not found") {
            CaptureError::TabNotFound(tab_id)
        } else if lower.contains("cannot access")
            || lower.contains("permission")
            || lower.contains("chrome://")
        {
            CaptureError::NotAccessible(message.to_string())
        } else if lower.contains("not a function")
            || lower.contains("undefined")
            || lower.contains("not supported")
        {
            CaptureError::ApiUnavailable(message.to_string())
        } else {
            CaptureError::Failed(message.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_tab_id_message() {
        assert_eq!(CaptureError::NoTabId.to_string(), "No tab ID provided");
    }

    #[test]
    fn test_from_host_message() {
        assert_eq!(
            CaptureError::from_host_message(7, "No tab with id: 7."),
            CaptureError::TabNotFound(7)
        );
        assert!(matches!(
            CaptureError::from_host_message(7, "Cannot access contents of url"),
            CaptureError::NotAccessible(_)
        ));
        assert!(matches!(
            CaptureError::from_host_message(7, "captureVisibleTab is not a function"),
            CaptureError::ApiUnavailable(_)
        ));
        assert!(matches!(
            CaptureError::from_host_message(7, "boom"),
            CaptureError::Failed(_)
        ));
    }
}
