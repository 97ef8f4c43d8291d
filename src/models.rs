use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::content;
use crate::errors::AppError;

/// Numeric client identifier shared by every backend call.
pub type ClientId = i64;

// ============ Profile ============

/// One client's credit profile as served by the data API.
///
/// The data API stores whatever the ingestion pipeline wrote, so numeric
/// columns are accepted as numbers, numeric strings or null, and columns this
/// client does not know about are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "Customer_ID", default, deserialize_with = "lenient_i64")]
    pub customer_id: Option<i64>,
    #[serde(rename = "Name", default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(rename = "Occupation", default, deserialize_with = "lenient_text")]
    pub occupation: Option<String>,
    #[serde(rename = "Age", default, deserialize_with = "lenient_i64")]
    pub age: Option<i64>,
    #[serde(rename = "Annual_Income", default, deserialize_with = "lenient_f64")]
    pub annual_income: Option<f64>,
    #[serde(rename = "Interest_Rate", default, deserialize_with = "lenient_f64")]
    pub interest_rate: Option<f64>,
    #[serde(rename = "Outstanding_Debt", default, deserialize_with = "lenient_f64")]
    pub outstanding_debt: Option<f64>,
    #[serde(rename = "Num_Credit_Card", default, deserialize_with = "lenient_i64")]
    pub num_credit_card: Option<i64>,
    #[serde(rename = "Num_Bank_Accounts", default, deserialize_with = "lenient_i64")]
    pub num_bank_accounts: Option<i64>,
    #[serde(rename = "Total_EMI_per_month", default, deserialize_with = "lenient_f64")]
    pub total_emi_per_month: Option<f64>,
    #[serde(rename = "Monthly_Inhand_Salary", default, deserialize_with = "lenient_f64")]
    pub monthly_inhand_salary: Option<f64>,
    #[serde(rename = "Monthly_Balance", default, deserialize_with = "lenient_f64")]
    pub monthly_balance: Option<f64>,
    #[serde(rename = "Credit_Utilization_Ratio", default, deserialize_with = "lenient_f64")]
    pub credit_utilization_ratio: Option<f64>,
    #[serde(rename = "Credit_Mix", default, deserialize_with = "lenient_text")]
    pub credit_mix: Option<String>,
    #[serde(rename = "Type_of_Loan", default, deserialize_with = "lenient_text")]
    pub type_of_loan: Option<String>,
    #[serde(rename = "Payment_Behaviour", default, deserialize_with = "lenient_text")]
    pub payment_behaviour: Option<String>,
    /// Columns not modelled above (ID, SSN, Month, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    /// Monthly income as shown in the sidebar (the in-hand salary column).
    pub fn income(&self) -> Option<f64> {
        self.monthly_inhand_salary
    }
}

// ============ Explanation ============

/// Generated explanation of a client's credit health.
///
/// The response is kept exactly as received, because the whole payload
/// (nulls and fields this client never reads included) is forwarded to the
/// product-suggestion endpoint. Typed views are read through accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExplanationPayload {
    fields: Map<String, Value>,
}

impl ExplanationPayload {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Builds a payload from a response body that is either a JSON object or
    /// a string encoding one.
    pub fn from_response(body: Value) -> Result<Self, AppError> {
        match body {
            Value::Object(map) => Ok(Self::from_fields(map)),
            Value::String(encoded) => match content::parse_encoded(&encoded)? {
                Value::Object(map) => Ok(Self::from_fields(map)),
                other => Err(AppError::ParseError(format!(
                    "string-encoded explanation is not a mapping: {}",
                    json_kind(&other)
                ))),
            },
            other => Err(AppError::ParseError(format!(
                "explanation response is not a mapping: {}",
                json_kind(&other)
            ))),
        }
    }

    /// The raw response fields, in the order they were received.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Free-text narrative (`userProfile`); empty when missing or null.
    pub fn narrative(&self) -> String {
        self.fields
            .get("userProfile")
            .and_then(coerce_text)
            .unwrap_or_default()
    }

    /// True when the narrative is present, which is what unlocks recommendations.
    pub fn has_narrative(&self) -> bool {
        !self.narrative().is_empty()
    }

    /// Categorical health signal (`userCreditProfile`), raw so the classifier
    /// sees exactly what was sent.
    pub fn health_signal(&self) -> Option<&Value> {
        self.fields.get("userCreditProfile")
    }

    pub fn allowed_credit_limit(&self) -> Option<f64> {
        self.fields.get("allowedCreditLimit").and_then(coerce_f64)
    }

    pub fn user_id(&self) -> Option<&Value> {
        self.fields.get("userId").filter(|v| !v.is_null())
    }
}

// ============ Backend requests/responses ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerFilter {
    #[serde(rename = "Customer_ID")]
    pub customer_id: ClientId,
}

/// Body of the find-profile lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindProfileRequest {
    pub filter: CustomerFilter,
}

impl FindProfileRequest {
    pub fn new(customer_id: ClientId) -> Self {
        Self {
            filter: CustomerFilter { customer_id },
        }
    }
}

/// Sparse update sent to the data API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub filter: CustomerFilter,
    pub update: UpdateDocument,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateDocument {
    #[serde(rename = "$set")]
    pub set: Map<String, Value>,
}

/// Response of the product-suggestion endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecommendationsResponse {
    #[serde(rename = "productRecommendations", default)]
    pub product_recommendations: Value,
}

// ============ Coercion helpers ============

/// Coerces a JSON number or numeric string to `f64`.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Coerces a JSON number or numeric string to `i64`, truncating fractions.
/// Values outside the `i64` range are rejected.
pub fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate_to_i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate_to_i64))
        }
        _ => None,
    }
}

fn truncate_to_i64(f: f64) -> Option<i64> {
    let t = f.trunc();
    // i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive.
    (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
}

/// Renders a scalar as display text; structured values fall back to compact JSON.
pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_f64))
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_i64))
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_text))
}
