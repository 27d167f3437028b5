use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::workflows::enrollment::domain::{Applicant, ApplicantId};

/// Placeholder written wherever the applicant record has no value.
pub const NOT_INFORMED: &str = "not informed";

/// School details printed on the contract header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolInfo {
    pub name: String,
    pub tax_id: String,
    pub address: String,
    pub phone: String,
}

/// Contract body with `{{field}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractTemplate {
    pub name: String,
    pub body: String,
}

/// Read-only view of an applicant assembled for contract filling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrolledStudentProjection {
    pub applicant_id: ApplicantId,
    pub student_name: String,
    pub student_birth_date: String,
    pub student_tax_id: String,
    pub grade: String,
    pub class_name: String,
    pub shift: String,
    pub guardian_name: String,
    pub guardian_tax_id: String,
    pub guardian_email: String,
    pub guardian_phone: String,
    pub address: String,
    pub fee_one: String,
    pub fee_recurring: String,
    pub discount_program: String,
    pub payment_method: String,
    pub issued_on: String,
}

impl EnrolledStudentProjection {
    pub fn from_applicant(applicant: &Applicant, issued_on: NaiveDate) -> Self {
        let student = &applicant.student;
        let guardian = applicant.primary_guardian();

        Self {
            applicant_id: applicant.id.clone(),
            student_name: informed(Some(student.full_name.as_str())),
            student_birth_date: student
                .birth_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| NOT_INFORMED.to_string()),
            student_tax_id: informed(student.tax_id.as_deref()),
            grade: informed(student.grade.as_deref()),
            class_name: informed(student.class_name.as_deref()),
            shift: informed(student.shift.as_deref()),
            guardian_name: informed(guardian.map(|g| g.name.as_str())),
            guardian_tax_id: informed(guardian.map(|g| g.tax_id.as_str())),
            guardian_email: informed(guardian.map(|g| g.email.as_str())),
            guardian_phone: informed(guardian.map(|g| g.phone.as_str())),
            address: applicant.address.one_line(),
            fee_one: format_cents(applicant.financials.fee_one),
            fee_recurring: format_cents(applicant.financials.fee_recurring),
            discount_program: applicant
                .financials
                .discount_program
                .as_ref()
                .map(|program| format!("{} ({}%)", program.name.trim(), program.percent))
                .unwrap_or_else(|| NOT_INFORMED.to_string()),
            payment_method: applicant
                .payment_method
                .map(|method| method.label().to_string())
                .unwrap_or_else(|| NOT_INFORMED.to_string()),
            issued_on: issued_on.format("%Y-%m-%d").to_string(),
        }
    }

    /// Placeholder name to value, keyed the way templates reference them.
    pub fn fields(&self) -> BTreeMap<&'static str, &str> {
        BTreeMap::from([
            ("applicant_id", self.applicant_id.0.as_str()),
            ("student_name", self.student_name.as_str()),
            ("student_birth_date", self.student_birth_date.as_str()),
            ("student_tax_id", self.student_tax_id.as_str()),
            ("grade", self.grade.as_str()),
            ("class_name", self.class_name.as_str()),
            ("shift", self.shift.as_str()),
            ("guardian_name", self.guardian_name.as_str()),
            ("guardian_tax_id", self.guardian_tax_id.as_str()),
            ("guardian_email", self.guardian_email.as_str()),
            ("guardian_phone", self.guardian_phone.as_str()),
            ("address", self.address.as_str()),
            ("fee_one", self.fee_one.as_str()),
            ("fee_recurring", self.fee_recurring.as_str()),
            ("discount_program", self.discount_program.as_str()),
            ("payment_method", self.payment_method.as_str()),
            ("issued_on", self.issued_on.as_str()),
        ])
    }
}

fn informed(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => NOT_INFORMED.to_string(),
    }
}

fn format_cents(cents: u32) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}
