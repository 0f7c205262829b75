use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Spam,
    NotSpam,
}

impl Label {
    /// Maps the classifier's integer class id. `1` is spam.
    pub fn from_class(class: u8) -> Option<Self> {
        match class {
            0 => Some(Label::NotSpam),
            1 => Some(Label::Spam),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Spam => "spam",
            Label::NotSpam => "not_spam",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: Label,
    /// Probability of `label`, in `[0, 1]`.
    pub confidence: f64,
}

impl Prediction {
    /// Confidence as a percentage rounded to two decimals.
    pub fn confidence_percent(&self) -> f64 {
        (self.confidence.clamp(0.0, 1.0) * 10_000.0).round() / 100.0
    }

    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label {
            Label::Spam => write!(
                f,
                "This email is classified as SPAM with {:.2}% confidence.",
                self.confidence_percent()
            ),
            Label::NotSpam => write!(
                f,
                "This email is NOT SPAM with {:.2}% confidence.",
                self.confidence_percent()
            ),
        }
    }
}
