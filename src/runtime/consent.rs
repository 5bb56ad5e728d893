use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::TrackingCategory;

/// A visitor's decision, as stored in the consent cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentState {
    pub essential: bool,
    pub functionality: bool,
    pub analytics: bool,
    pub marketing: bool,
}

impl Default for ConsentState {
    fn default() -> Self {
        Self::reject_all()
    }
}

impl ConsentState {
    pub const fn accept_all() -> Self {
        Self {
            essential: true,
            functionality: true,
            analytics: true,
            marketing: true,
        }
    }

    pub const fn reject_all() -> Self {
        Self {
            essential: true,
            functionality: false,
            analytics: false,
            marketing: false,
        }
    }

    /// Consent derived from the preference toggles; targeting and social both map to marketing.
    pub fn from_toggles(toggles: Toggles) -> Self {
        Self {
            essential: true,
            functionality: toggles.functionality,
            analytics: toggles.analytics,
            marketing: toggles.targeting || toggles.social,
        }
    }

    /// Whether scripts of `category` may run.
    pub fn allows(&self, category: TrackingCategory) -> bool {
        match category {
            TrackingCategory::StrictlyNecessary => true,
            TrackingCategory::Functionality => self.functionality,
            TrackingCategory::TrackingPerformance => self.analytics,
            TrackingCategory::TargetingAdvertising => self.marketing,
        }
    }

    /// Which floating-button icon reflects this decision.
    pub fn icon(&self) -> ConsentIcon {
        match (self.functionality, self.analytics, self.marketing) {
            (true, true, true) => ConsentIcon::Accepted,
            (false, false, false) => ConsentIcon::Rejected,
            _ => ConsentIcon::Default,
        }
    }

    /// URI-encoded JSON, the form written to `document.cookie`.
    pub fn to_cookie_value(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".into());
        urlencoding::encode(&json).into_owned()
    }

    /// Parse a cookie value the way the emitted `readConsent` does.
    ///
    /// Anything but a JSON object reads as undecided. Flags follow JavaScript
    /// truthiness; `essential` is always `true`.
    pub fn from_cookie_value(raw: &str) -> Option<Self> {
        let decoded = urlencoding::decode(raw).ok()?;
        let value: Value = serde_json::from_str(&decoded).ok()?;
        let object = value.as_object()?;
        let flag = |key: &str| object.get(key).is_some_and(is_truthy);
        Some(Self {
            essential: true,
            functionality: flag("functionality"),
            analytics: flag("analytics"),
            marketing: flag("marketing"),
        })
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentIcon {
    Default,
    Accepted,
    Rejected,
}

/// State of the four preference-modal switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Toggles {
    pub functionality: bool,
    pub analytics: bool,
    pub targeting: bool,
    pub social: bool,
}

impl Toggles {
    /// Switch positions shown for a stored decision (or all off without one).
    pub fn from_consent(consent: Option<ConsentState>) -> Self {
        let consent = consent.unwrap_or_default();
        Self {
            functionality: consent.functionality,
            analytics: consent.analytics,
            targeting: consent.marketing,
            social: consent.marketing,
        }
    }

    pub fn set(&mut self, toggle: Toggle, on: bool) {
        match toggle {
            Toggle::Functionality => self.functionality = on,
            Toggle::Analytics => self.analytics = on,
            Toggle::Targeting => self.targeting = on,
            Toggle::Social => self.social = on,
        }
    }
}

/// One switch of the preferences modal, named by its `data-consent` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Functionality,
    Analytics,
    Targeting,
    Social,
}

impl Toggle {
    pub const ALL: [Self; 4] = [
        Self::Functionality,
        Self::Analytics,
        Self::Targeting,
        Self::Social,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::Functionality => "functionality",
            Self::Analytics => "analytics",
            Self::Targeting => "targeting",
            Self::Social => "social",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::markup::toggle_keys;
    use pretty_assertions::assert_eq;

    #[test]
    fn cookie_value_matches_runtime_encoding() {
        let value = ConsentState::accept_all().to_cookie_value();
        assert_eq!(
            value,
            "%7B%22essential%22%3Atrue%2C%22functionality%22%3Atrue%2C%22analytics%22%3Atrue%2C%22marketing%22%3Atrue%7D"
        );
        assert_eq!(
            ConsentState::from_cookie_value(&value),
            Some(ConsentState::accept_all())
        );
    }

    #[test]
    fn cookie_parsing_is_normalizing() {
        let parsed = ConsentState::from_cookie_value("%7B%22analytics%22%3Atrue%7D").unwrap();
        assert!(parsed.essential && parsed.analytics);
        assert!(!parsed.functionality && !parsed.marketing);
        assert_eq!(ConsentState::from_cookie_value("not-json"), None);
    }

    #[test]
    fn non_object_cookies_are_undecided() {
        for raw in ["null", "1", "true", "%22yes%22", "%5Btrue%2Ctrue%5D"] {
            assert_eq!(ConsentState::from_cookie_value(raw), None, "{raw}");
        }
    }

    #[test]
    fn flags_follow_javascript_truthiness() {
        let raw = urlencoding::encode(r#"{"functionality":1,"analytics":"","marketing":"yes"}"#);
        let parsed = ConsentState::from_cookie_value(&raw).unwrap();
        assert!(parsed.functionality && parsed.marketing);
        assert!(!parsed.analytics);
    }

    #[test]
    fn strictly_necessary_is_never_gated() {
        let rejected = ConsentState::reject_all();
        assert!(rejected.allows(TrackingCategory::StrictlyNecessary));
        assert!(!rejected.allows(TrackingCategory::TrackingPerformance));
    }

    #[test]
    fn marketing_is_targeting_or_social() {
        let mut toggles = Toggles::default();
        toggles.set(Toggle::Social, true);
        assert!(ConsentState::from_toggles(toggles).marketing);
        assert_eq!(ConsentState::from_toggles(toggles).icon(), ConsentIcon::Default);
    }

    #[test]
    fn toggle_keys_match_markup() {
        let keys: Vec<_> = Toggle::ALL.iter().map(|t| t.key()).collect();
        assert_eq!(keys, toggle_keys().collect::<Vec<_>>());
    }
}
