//! Pending profile edits and the sparse update they flush to.
//!
//! Every slider or input in the profile sidebar funnels through one entry
//! point, [`ProfileEditBuffer::set`], keyed by a [`ProfileField`]. Only fields
//! edited since the buffer was seeded are considered for persistence, and of
//! those only the six whitelisted numeric columns are ever sent.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::client::CreditApiClient;
use crate::errors::AppError;
use crate::models::{
    coerce_f64, coerce_i64, ClientId, CustomerFilter, Profile, UpdateDocument,
    UpdateProfileRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Integer,
    Float,
}

/// Editable profile fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProfileField {
    Age,
    Income,
    AnnualIncome,
    CreditMix,
    CreditUtilizationRatio,
    TypeOfLoan,
    MonthlyBalance,
    PaymentBehaviour,
    InterestRate,
    OutstandingDebt,
    NumCreditCard,
    NumBankAccounts,
    TotalEmiPerMonth,
    MonthlyInhandSalary,
}

impl ProfileField {
    pub const ALL: [ProfileField; 14] = [
        ProfileField::Age,
        ProfileField::Income,
        ProfileField::AnnualIncome,
        ProfileField::CreditMix,
        ProfileField::CreditUtilizationRatio,
        ProfileField::TypeOfLoan,
        ProfileField::MonthlyBalance,
        ProfileField::PaymentBehaviour,
        ProfileField::InterestRate,
        ProfileField::OutstandingDebt,
        ProfileField::NumCreditCard,
        ProfileField::NumBankAccounts,
        ProfileField::TotalEmiPerMonth,
        ProfileField::MonthlyInhandSalary,
    ];

    /// Fields written back on save, in payload order.
    pub const PERSISTED: [ProfileField; 6] = [
        ProfileField::InterestRate,
        ProfileField::OutstandingDebt,
        ProfileField::NumCreditCard,
        ProfileField::NumBankAccounts,
        ProfileField::TotalEmiPerMonth,
        ProfileField::MonthlyInhandSalary,
    ];

    /// Event key used by the sidebar controls.
    pub fn key(&self) -> &'static str {
        match self {
            ProfileField::Age => "age",
            ProfileField::Income => "income",
            ProfileField::AnnualIncome => "annualIncome",
            ProfileField::CreditMix => "creditMix",
            ProfileField::CreditUtilizationRatio => "creditUtilizationRatio",
            ProfileField::TypeOfLoan => "typeOfLoan",
            ProfileField::MonthlyBalance => "monthlyBalance",
            ProfileField::PaymentBehaviour => "paymentBehaviour",
            ProfileField::InterestRate => "interestRate",
            ProfileField::OutstandingDebt => "outstandingDebt",
            ProfileField::NumCreditCard => "numCreditCard",
            ProfileField::NumBankAccounts => "numBankAccounts",
            ProfileField::TotalEmiPerMonth => "totalEMIperMonth",
            ProfileField::MonthlyInhandSalary => "monthlyInhandSalary",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Backend column the field is read from (and, if persisted, written to).
    pub fn column(&self) -> &'static str {
        match self {
            ProfileField::Age => "Age",
            // Income is a display copy of the in-hand salary.
            ProfileField::Income => "Monthly_Inhand_Salary",
            ProfileField::AnnualIncome => "Annual_Income",
            ProfileField::CreditMix => "Credit_Mix",
            ProfileField::CreditUtilizationRatio => "Credit_Utilization_Ratio",
            ProfileField::TypeOfLoan => "Type_of_Loan",
            ProfileField::MonthlyBalance => "Monthly_Balance",
            ProfileField::PaymentBehaviour => "Payment_Behaviour",
            ProfileField::InterestRate => "Interest_Rate",
            ProfileField::OutstandingDebt => "Outstanding_Debt",
            ProfileField::NumCreditCard => "Num_Credit_Card",
            ProfileField::NumBankAccounts => "Num_Bank_Accounts",
            ProfileField::TotalEmiPerMonth => "Total_EMI_per_month",
            ProfileField::MonthlyInhandSalary => "Monthly_Inhand_Salary",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProfileField::Age => "Age",
            ProfileField::Income => "Income",
            ProfileField::AnnualIncome => "Annual Income",
            ProfileField::CreditMix => "Credit Mix",
            ProfileField::CreditUtilizationRatio => "Credit Utilization Ratio",
            ProfileField::TypeOfLoan => "Type of Loan",
            ProfileField::MonthlyBalance => "Monthly Balance",
            ProfileField::PaymentBehaviour => "Payment Behaviour",
            ProfileField::InterestRate => "Interest Rate",
            ProfileField::OutstandingDebt => "Outstanding Debt",
            ProfileField::NumCreditCard => "Num Credit Card",
            ProfileField::NumBankAccounts => "Num Bank Accounts",
            ProfileField::TotalEmiPerMonth => "Total EMI per month",
            ProfileField::MonthlyInhandSalary => "Monthly Inhand Salary",
        }
    }

    /// `None` for free-text fields.
    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self {
            ProfileField::Age | ProfileField::NumCreditCard | ProfileField::NumBankAccounts => {
                Some(NumericKind::Integer)
            }
            ProfileField::CreditMix | ProfileField::TypeOfLoan | ProfileField::PaymentBehaviour => {
                None
            }
            _ => Some(NumericKind::Float),
        }
    }

    pub fn is_persisted(&self) -> bool {
        Self::PERSISTED.contains(self)
    }

    /// Upper bound of the sidebar slider, for fields that have one.
    pub fn slider_max(&self) -> Option<f64> {
        match self {
            ProfileField::InterestRate => Some(100.0),
            ProfileField::OutstandingDebt => Some(10_000.0),
            ProfileField::NumCreditCard | ProfileField::NumBankAccounts => Some(20.0),
            ProfileField::TotalEmiPerMonth | ProfileField::MonthlyInhandSalary => {
                Some(100_000.0)
            }
            _ => None,
        }
    }

    /// Current value of the field in a loaded profile.
    pub fn seed_value(&self, profile: &Profile) -> Value {
        match self {
            ProfileField::Age => json!(profile.age),
            ProfileField::Income => json!(profile.income()),
            ProfileField::AnnualIncome => json!(profile.annual_income),
            ProfileField::CreditMix => json!(profile.credit_mix),
            ProfileField::CreditUtilizationRatio => json!(profile.credit_utilization_ratio),
            ProfileField::TypeOfLoan => json!(profile.type_of_loan),
            ProfileField::MonthlyBalance => json!(profile.monthly_balance),
            ProfileField::PaymentBehaviour => json!(profile.payment_behaviour),
            ProfileField::InterestRate => json!(profile.interest_rate),
            ProfileField::OutstandingDebt => json!(profile.outstanding_debt),
            ProfileField::NumCreditCard => json!(profile.num_credit_card),
            ProfileField::NumBankAccounts => json!(profile.num_bank_accounts),
            ProfileField::TotalEmiPerMonth => json!(profile.total_emi_per_month),
            ProfileField::MonthlyInhandSalary => json!(profile.monthly_inhand_salary),
        }
    }

    /// Coerces a pending value to the field's declared type.
    pub fn coerce(&self, value: &Value) -> Result<Value, AppError> {
        let Some(kind) = self.numeric_kind() else {
            return Err(AppError::Validation(format!(
                "{} is not a numeric field",
                self.column()
            )));
        };
        let coerced = match kind {
            NumericKind::Integer => coerce_i64(value).map(Value::from),
            NumericKind::Float => coerce_f64(value).map(Value::from),
        };
        coerced.ok_or_else(|| {
            AppError::Validation(format!(
                "{} is not a valid {:?} for {}",
                value,
                kind,
                self.column()
            ))
        })
    }
}

/// A ready-to-send update plus the edits that failed coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedUpdate {
    pub request: UpdateProfileRequest,
    pub rejected: Vec<ProfileField>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileEditBuffer {
    seeded: BTreeMap<ProfileField, Value>,
    pending: BTreeMap<ProfileField, Value>,
}

impl ProfileEditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer seeded with the profile's current values and no pending edits.
    pub fn seeded(profile: &Profile) -> Self {
        let seeded = ProfileField::ALL
            .into_iter()
            .map(|field| (field, field.seed_value(profile)))
            .filter(|(_, value)| !value.is_null())
            .collect();
        Self {
            seeded,
            pending: BTreeMap::new(),
        }
    }

    /// Records a pending edit.
    pub fn set(&mut self, field: ProfileField, value: impl Into<Value>) {
        self.pending.insert(field, value.into());
    }

    /// Records a pending edit by event key. Unknown keys are ignored.
    pub fn set_by_key(&mut self, key: &str, value: impl Into<Value>) -> bool {
        match ProfileField::from_key(key) {
            Some(field) => {
                self.set(field, value);
                true
            }
            None => {
                tracing::debug!("Ignoring edit for unknown field '{}'", key);
                false
            }
        }
    }

    /// The pending value if edited, otherwise the seeded one.
    pub fn value(&self, field: ProfileField) -> Option<&Value> {
        self.pending.get(&field).or_else(|| self.seeded.get(&field))
    }

    pub fn is_dirty(&self, field: ProfileField) -> bool {
        self.pending.contains_key(&field)
    }

    pub fn dirty_fields(&self) -> Vec<ProfileField> {
        self.pending.keys().copied().collect()
    }

    pub fn has_pending_edits(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drops every pending edit.
    pub fn discard(&mut self) {
        self.pending.clear();
    }

    /// Builds the sparse update for the persisted fields edited so far.
    ///
    /// Null edits are skipped; edits that cannot be coerced are reported in
    /// `rejected` and left out of the payload.
    pub fn prepare_update(&self, client_id: ClientId) -> PreparedUpdate {
        let mut set = Map::new();
        let mut rejected = Vec::new();

        for field in ProfileField::PERSISTED {
            let Some(value) = self.pending.get(&field) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            match field.coerce(value) {
                Ok(coerced) => {
                    set.insert(field.column().to_string(), coerced);
                }
                Err(e) => {
                    tracing::warn!("Dropping {} from update: {}", field.column(), e);
                    rejected.push(field);
                }
            }
        }

        PreparedUpdate {
            request: UpdateProfileRequest {
                filter: CustomerFilter {
                    customer_id: client_id,
                },
                update: UpdateDocument { set },
            },
            rejected,
        }
    }

    /// Sends the sparse update. Pending edits are cleared only on success so a
    /// failed save can be retried.
    pub async fn save(
        &mut self,
        client_id: ClientId,
        client: &CreditApiClient,
    ) -> Result<PreparedUpdate, AppError> {
        let prepared = self.prepare_update(client_id);
        client.update_profile(&prepared.request).await?;
        self.discard();
        Ok(prepared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_keeps_envelope() {
        let prepared = ProfileEditBuffer::new().prepare_update(8625);

        assert!(prepared.rejected.is_empty());
        assert_eq!(
            serde_json::to_value(&prepared.request).unwrap(),
            json!({"filter": {"Customer_ID": 8625}, "update": {"$set": {}}})
        );
    }

    #[test]
    fn test_string_edits_are_coerced() {
        let mut buffer = ProfileEditBuffer::new();
        buffer.set_by_key("interestRate", "4.5");
        buffer.set_by_key("numCreditCard", "3");

        let set = buffer.prepare_update(1).request.update.set;

        let mut expected = Map::new();
        expected.insert("Interest_Rate".to_string(), json!(4.5));
        expected.insert("Num_Credit_Card".to_string(), json!(3));
        assert_eq!(set, expected);
        assert!(set["Num_Credit_Card"].is_i64());
    }

    #[test]
    fn test_seeded_values_are_not_sent() {
        let profile = Profile {
            interest_rate: Some(12.0),
            outstanding_debt: Some(800.0),
            num_bank_accounts: Some(2),
            ..Profile::default()
        };
        let mut buffer = ProfileEditBuffer::seeded(&profile);
        assert_eq!(buffer.value(ProfileField::InterestRate), Some(&json!(12.0)));

        buffer.set(ProfileField::OutstandingDebt, 950);
        let set = buffer.prepare_update(1).request.update.set;

        assert_eq!(set.len(), 1);
        assert_eq!(set["Outstanding_Debt"], json!(950.0));
        assert_eq!(buffer.value(ProfileField::OutstandingDebt), Some(&json!(950)));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut buffer = ProfileEditBuffer::new();
        assert!(!buffer.set_by_key("creditScore", 800));
        assert!(!buffer.has_pending_edits());
    }

    #[test]
    fn test_bad_input_is_rejected_not_fatal() {
        let mut buffer = ProfileEditBuffer::new();
        buffer.set(ProfileField::NumBankAccounts, "many");
        buffer.set(ProfileField::TotalEmiPerMonth, "120.5");
        buffer.set(ProfileField::MonthlyInhandSalary, Value::Null);

        let prepared = buffer.prepare_update(1);

        assert_eq!(prepared.rejected, vec![ProfileField::NumBankAccounts]);
        let set = prepared.request.update.set;
        assert_eq!(set.len(), 1);
        assert_eq!(set["Total_EMI_per_month"], json!(120.5));
    }

    #[test]
    fn test_out_of_range_integer_is_rejected() {
        let mut buffer = ProfileEditBuffer::new();
        buffer.set(ProfileField::NumCreditCard, "1e30");

        let prepared = buffer.prepare_update(1);

        assert_eq!(prepared.rejected, vec![ProfileField::NumCreditCard]);
        assert!(prepared.request.update.set.is_empty());
        assert!(matches!(
            ProfileField::NumCreditCard.coerce(&json!("1e30")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_non_persisted_edits_stay_local() {
        let mut buffer = ProfileEditBuffer::new();
        buffer.set(ProfileField::Age, 40);
        buffer.set(ProfileField::CreditMix, "Bad");

        assert_eq!(
            buffer.dirty_fields(),
            vec![ProfileField::Age, ProfileField::CreditMix]
        );
        assert!(buffer.prepare_update(1).request.update.set.is_empty());
    }

    #[test]
    fn test_field_keys_round_trip() {
        for field in ProfileField::ALL {
            assert_eq!(ProfileField::from_key(field.key()), Some(field));
        }
        assert_eq!(ProfileField::PERSISTED.iter().filter(|f| f.is_persisted()).count(), 6);
        assert!(!ProfileField::Income.is_persisted());
    }
}
