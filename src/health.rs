use serde::Serialize;
use serde_json::Value;

/// Credit health badge derived from the explanation's health signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HealthStatus {
    Poor,
    Standard,
    Good,
}

impl HealthStatus {
    /// Maps the raw signal to a badge.
    ///
    /// Only the exact strings `"Poor"` and `"Standard"` are recognised; every
    /// other value, including a missing signal, shows as `Good`.
    pub fn classify(signal: Option<&Value>) -> Self {
        match signal {
            Some(Value::String(s)) => Self::classify_str(s),
            _ => HealthStatus::Good,
        }
    }

    pub fn classify_str(signal: &str) -> Self {
        match signal {
            "Poor" => HealthStatus::Poor,
            "Standard" => HealthStatus::Standard,
            _ => HealthStatus::Good,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Poor => "POOR",
            HealthStatus::Standard => "STANDARD",
            HealthStatus::Good => "GOOD",
        }
    }

    /// Badge colours as `(background, foreground)` hex strings.
    pub fn colors(&self) -> (&'static str, &'static str) {
        match self {
            HealthStatus::Poor => ("#FFCDC7", "#970606"),
            HealthStatus::Standard => ("#C0FAE6", "#00684A"),
            HealthStatus::Good => ("#C0F9AD", "#00684A"),
        }
    }
}
