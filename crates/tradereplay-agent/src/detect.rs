//! Generic trade detection helpers.
//!
//! Platform detectors are heuristic. These helpers cover the parts every
//! platform shares: reading a direction out of button text, and not
//! attaching to the same element twice.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use parking_lot::Mutex;
use regex::Regex;

use tradereplay_protocols::{Direction, DomEvent, ElementSnapshot, TradeDetector, TradeDraft, Trigger};

static BUY_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(buy|long)\b").expect("static regex"));
static SELL_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(sell|short)\b").expect("static regex"));
static PRICE_AFTER_AT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\s*(\d+(?:[.,]\d+)?)").expect("static regex"));
/// A number standing on its own, so `ESZ4` or `MNQ24` do not count.
static PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+(?:[.,]\d+)?\b").expect("static regex"));

const SYMBOL_ATTRS: [&str; 3] = ["data-symbol", "data-instrument", "data-ticker"];
const PRICE_ATTRS: [&str; 2] = ["data-price", "data-value"];

/// Best-effort direction from visible text and attribute values.
///
/// Buy/long words mean BUY and sell/short words mean SELL. Anything else,
/// including text that mentions both, is UNKNOWN.
pub fn infer_direction(text: &str, attributes: &HashMap<String, String>) -> Direction {
    let mut haystack = text.to_string();
    for value in attributes.values() {
        haystack.push(' ');
        haystack.push_str(value);
    }

    match (BUY_WORDS.is_match(&haystack), SELL_WORDS.is_match(&haystack)) {
        (true, false) => Direction::Buy,
        (false, true) => Direction::Sell,
        _ => Direction::Unknown,
    }
}

fn element_direction(element: &ElementSnapshot) -> Direction {
    let text = format!("{} {}", element.text, element.classes.join(" "));
    infer_direction(&text, &element.attributes)
}

fn element_symbol(element: &ElementSnapshot) -> Option<String> {
    SYMBOL_ATTRS
        .iter()
        .find_map(|name| element.attributes.get(*name))
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
}

/// Price attribute, else the number after `@`, else the last number in
/// the text (quantities come before prices in position rows).
fn element_price(element: &ElementSnapshot) -> Option<f64> {
    let raw = PRICE_ATTRS
        .iter()
        .find_map(|name| element.attributes.get(*name).cloned())
        .or_else(|| text_price(&element.text))?;
    raw.replace(',', ".").parse().ok()
}

fn text_price(text: &str) -> Option<String> {
    if let Some(caps) = PRICE_AFTER_AT.captures(text) {
        return Some(caps[1].to_string());
    }
    PRICE.find_iter(text).last().map(|m| m.as_str().to_string())
}

/// Set of elements a content agent already listens on.
///
/// Advisory only: it stops the agent attaching twice to the same element,
/// it does not deduplicate trades.
#[derive(Debug, Default)]
pub struct MonitoredElements {
    keys: Mutex<HashSet<String>>,
}

impl MonitoredElements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an element. Returns true the first time only.
    pub fn mark(&self, key: &str) -> bool {
        self.keys.lock().insert(key.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.lock().is_empty()
    }

    /// Forget everything, e.g. after the page re-rendered.
    pub fn clear(&self) {
        self.keys.lock().clear();
    }
}

/// Keyword-based detector usable on any platform.
///
/// Clicks on buy/sell controls become `button_click` trades. Elements
/// added to a positions panel become `position_change` trades with a
/// best-effort direction.
#[derive(Debug, Clone)]
pub struct KeywordDetector {
    platform: String,
}

impl KeywordDetector {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
        }
    }

    fn draft(&self, element: &ElementSnapshot, direction: Direction, trigger: Trigger) -> TradeDraft {
        let price = element_price(element);
        TradeDraft {
            platform: Some(self.platform.clone()),
            instrument: element_symbol(element),
            direction: Some(direction),
            entry_price: price,
            exit_price: price,
            trigger: Some(trigger),
            ..Default::default()
        }
    }

    fn is_positions_panel(container: &ElementSnapshot) -> bool {
        let label = format!("{} {}", container.key, container.classes.join(" ")).to_lowercase();
        label.contains("position")
    }
}

impl TradeDetector for KeywordDetector {
    fn platform(&self) -> &str {
        &self.platform
    }

    fn detect(&mut self, event: &DomEvent) -> Option<TradeDraft> {
        match event {
            DomEvent::Click { element } => match element_direction(element) {
                Direction::Unknown => None,
                direction => Some(self.draft(element, direction, Trigger::ButtonClick)),
            },
            DomEvent::Mutation { container, added } => {
                if !Self::is_positions_panel(container) {
                    return None;
                }
                let row = added.first()?;
                Some(self.draft(row, element_direction(row), Trigger::PositionChange))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_attrs() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_infer_direction_from_text() {
        assert_eq!(infer_direction("Buy Market", &no_attrs()), Direction::Buy);
        assert_eq!(infer_direction("go LONG", &no_attrs()), Direction::Buy);
        assert_eq!(infer_direction("Sell 1 @ MKT", &no_attrs()), Direction::Sell);
        assert_eq!(infer_direction("short", &no_attrs()), Direction::Sell);
    }

    #[test]
    fn test_infer_direction_ambiguous_or_missing() {
        assert_eq!(infer_direction("Buy / Sell", &no_attrs()), Direction::Unknown);
        assert_eq!(infer_direction("Flatten", &no_attrs()), Direction::Unknown);
        assert_eq!(infer_direction("buyer", &no_attrs()), Direction::Unknown);
    }

    #[test]
    fn test_infer_direction_from_attributes() {
        let mut attrs = HashMap::new();
        attrs.insert("aria-label".to_string(), "Sell order".to_string());
        assert_eq!(infer_direction("", &attrs), Direction::Sell);
    }

    #[test]
    fn test_monitored_elements_mark_once() {
        let monitored = MonitoredElements::new();
        assert!(monitored.mark("btn-buy"));
        assert!(!monitored.mark("btn-buy"));
        assert!(monitored.contains("btn-buy"));
        assert_eq!(monitored.len(), 1);
        monitored.clear();
        assert!(monitored.is_empty());
    }

    #[test]
    fn test_click_on_buy_button() {
        let mut detector = KeywordDetector::new("tradingview");
        let button = ElementSnapshot::new("btn1", "button")
            .with_text("Buy 1.0842")
            .with_attr("data-symbol", "eurusd");

        let draft = detector
            .detect(&DomEvent::Click { element: button })
            .unwrap();
        assert_eq!(draft.platform.as_deref(), Some("tradingview"));
        assert_eq!(draft.instrument.as_deref(), Some("EURUSD"));
        assert_eq!(draft.direction, Some(Direction::Buy));
        assert_eq!(draft.entry_price, Some(1.0842));
        assert_eq!(draft.trigger, Some(Trigger::ButtonClick));
    }

    #[test]
    fn test_click_on_other_control_is_ignored() {
        let mut detector = KeywordDetector::new("tradingview");
        let button = ElementSnapshot::new("btn2", "button").with_text("Settings");
        assert!(detector.detect(&DomEvent::Click { element: button }).is_none());
    }

    #[test]
    fn test_direction_from_class() {
        let mut detector = KeywordDetector::new("tradovate");
        let button = ElementSnapshot::new("b", "div").with_class("btn-sell");
        let draft = detector.detect(&DomEvent::Click { element: button });
        // `btn-sell` has a word boundary at the hyphen.
        assert_eq!(draft.unwrap().direction, Some(Direction::Sell));
    }

    #[test]
    fn test_position_row_added() {
        let mut detector = KeywordDetector::new("tradovate");
        let panel = ElementSnapshot::new("positions", "div").with_class("positions-table");
        let row = ElementSnapshot::new("row1", "tr")
            .with_text("ESZ4 2 @ 5012.25")
            .with_attr("data-symbol", "ESZ4");

        let draft = detector
            .detect(&DomEvent::Mutation {
                container: panel,
                added: vec![row],
            })
            .unwrap();
        assert_eq!(draft.trigger, Some(Trigger::PositionChange));
        assert_eq!(draft.direction, Some(Direction::Unknown));
        assert_eq!(draft.instrument.as_deref(), Some("ESZ4"));
        assert_eq!(draft.entry_price, Some(5012.25));
    }

    #[test]
    fn test_text_price_skips_symbol_digits() {
        assert_eq!(text_price("ESZ4 2 @ 5012.25").as_deref(), Some("5012.25"));
        assert_eq!(text_price("MNQ24 long 3 18250,5").as_deref(), Some("18250,5"));
        assert_eq!(text_price("ESZ4 flat"), None);
    }

    #[test]
    fn test_mutation_outside_positions_is_ignored() {
        let mut detector = KeywordDetector::new("tradovate");
        let chat = ElementSnapshot::new("chat", "div");
        let row = ElementSnapshot::new("m", "p").with_text("buy the dip");
        assert!(detector
            .detect(&DomEvent::Mutation {
                container: chat,
                added: vec![row],
            })
            .is_none());
    }
}
