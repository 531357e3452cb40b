//! Trade detector capability.
//!
//! Detectors turn page events into trade drafts. Their heuristics are
//! platform specific and fragile; the rest of the pipeline only depends on
//! this trait.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::TradeDraft;

/// Minimal view of a DOM element involved in an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Stable key for the element (path or generated marker).
    pub key: String,
    pub tag: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl ElementSnapshot {
    pub fn new(key: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// A page event a detector can inspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomEvent {
    Click { element: ElementSnapshot },
    Mutation { container: ElementSnapshot, added: Vec<ElementSnapshot> },
}

/// Platform-specific trade detection.
pub trait TradeDetector: Send {
    /// Platform label reported at registration.
    fn platform(&self) -> &str;

    /// Inspect an event; `None` when it is not a trade action.
    fn detect(&mut self, event: &DomEvent) -> Option<TradeDraft>;
}
