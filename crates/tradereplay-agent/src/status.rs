//! Popup status line.

use std::fmt;
use std::time::Duration;

const INFO_DISMISS: Duration = Duration::from_secs(3);
const ERROR_DISMISS: Duration = Duration::from_secs(6);
const MAX_DISMISS: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// A user-visible status message that dismisses itself.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
    pub dismiss_after: Duration,
}

impl StatusMessage {
    pub fn new(level: StatusLevel, text: impl Into<String>) -> Self {
        let dismiss_after = match level {
            StatusLevel::Error => ERROR_DISMISS,
            StatusLevel::Info | StatusLevel::Success => INFO_DISMISS,
        };
        Self {
            level,
            text: text.into(),
            dismiss_after,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Error, text)
    }

    /// Override the dismiss delay. Never longer than ten seconds.
    pub fn with_dismiss_after(mut self, delay: Duration) -> Self {
        self.dismiss_after = delay.min(MAX_DISMISS);
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == StatusLevel::Error
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.level {
            StatusLevel::Info => "",
            StatusLevel::Success => "✓ ",
            StatusLevel::Error => "✗ ",
        };
        write!(f, "{}{}", prefix, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_stay_longer() {
        assert_eq!(StatusMessage::info("x").dismiss_after, Duration::from_secs(3));
        assert_eq!(StatusMessage::success("x").dismiss_after, Duration::from_secs(3));
        assert_eq!(StatusMessage::error("x").dismiss_after, Duration::from_secs(6));
    }

    #[test]
    fn test_dismiss_is_capped() {
        let msg = StatusMessage::error("x").with_dismiss_after(Duration::from_secs(60));
        assert_eq!(msg.dismiss_after, Duration::from_secs(10));
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusMessage::error("boom").to_string(), "✗ boom");
        assert_eq!(StatusMessage::info("hi").to_string(), "hi");
    }
}
