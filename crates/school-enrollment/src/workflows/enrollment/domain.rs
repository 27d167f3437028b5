use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for applicants under review.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

impl std::fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Enrollment record for a prospective student prior to finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: ApplicantId,
    pub student: StudentIdentity,
    pub guardians: Vec<Guardian>,
    pub address: Address,
    pub financials: FinancialTerms,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub data_validated: bool,
    #[serde(default)]
    pub guardian_data_validated: bool,
    #[serde(default)]
    pub payment_confirmed: bool,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub status: EnrollmentStatus,
}

impl Applicant {
    /// First guardian on file; contracts are issued in their name.
    pub fn primary_guardian(&self) -> Option<&Guardian> {
        self.guardians.first()
    }
}

/// Identity fields captured for the student during intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentIdentity {
    pub full_name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub shift: Option<String>,
}

/// Legal guardian responsible for the enrollment contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guardian {
    pub name: String,
    pub tax_id: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub number: String,
    #[serde(default)]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl Address {
    /// Single-line rendering used in contracts and status views.
    pub fn one_line(&self) -> String {
        let mut line = format!("{}, {}", self.street.trim(), self.number.trim());
        if let Some(complement) = self
            .complement
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            line.push_str(" - ");
            line.push_str(complement);
        }
        format!(
            "{line}, {} - {}/{} - {}",
            self.neighborhood.trim(),
            self.city.trim(),
            self.state.trim(),
            self.postal_code.trim()
        )
    }
}

/// Negotiated fees in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialTerms {
    pub fee_one: u32,
    pub fee_recurring: u32,
    #[serde(default)]
    pub discount_program: Option<DiscountProgram>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountProgram {
    pub name: String,
    pub percent: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankSlip,
    CreditCard,
    Pix,
    BankTransfer,
}

impl PaymentMethod {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentMethod::BankSlip => "bank slip",
            PaymentMethod::CreditCard => "credit card",
            PaymentMethod::Pix => "pix",
            PaymentMethod::BankTransfer => "bank transfer",
        }
    }
}

/// Required document tracked on the applicant checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub delivery_method: DeliveryMethod,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub file_reference: Option<String>,
}

impl Document {
    pub fn pending(name: impl Into<String>, delivery_method: DeliveryMethod) -> Self {
        Self {
            name: name.into(),
            delivery_method,
            status: DocumentStatus::Pending,
            rejection_reason: None,
            file_reference: None,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == DocumentStatus::Approved
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    Digital,
    InPerson,
}

/// Review state of a single document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Pending,
    UnderAnalysis,
    Approved,
    Rejected,
}

impl DocumentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::UnderAnalysis => "under_analysis",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Rejected => "rejected",
        }
    }
}

/// Coarse status tracked while the applicant is still owned by the enrollment desk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    #[default]
    PendingAnalysis,
    ReadyToFinalize,
}

impl EnrollmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EnrollmentStatus::PendingAnalysis => "pending_analysis",
            EnrollmentStatus::ReadyToFinalize => "ready_to_finalize",
        }
    }
}

/// Persisted boolean checks a reviewer can toggle on the applicant record.
///
/// Financial validation is session-scoped and is passed into gating calls instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationFlag {
    Data,
    GuardianData,
    Payment,
}

impl ValidationFlag {
    pub fn apply(self, applicant: &mut Applicant, value: bool) {
        match self {
            ValidationFlag::Data => applicant.data_validated = value,
            ValidationFlag::GuardianData => applicant.guardian_data_validated = value,
            ValidationFlag::Payment => applicant.payment_confirmed = value,
        }
    }
}

/// Reviewer decision applied to one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum DocumentDecision {
    Approve,
    Reject { reason: String },
}
