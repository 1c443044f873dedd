//! Member record, its column allow-list and the vocabularies stored in it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

use super::FieldValue;

/// Deprecated spelling of the top rank still present in older records.
pub const DEPRECATED_MASTER_LABEL: &str = "Δάσκαλος";

/// Declares the member columns once and derives the field allow-list,
/// the row struct and the per-field accessors from that single list.
macro_rules! member_schema {
    ($( $variant:ident => $column:ident, $header:literal; )*) => {
        /// Every updatable column of the `members` table.
        ///
        /// This enum is the only source of column names for dynamically built
        /// statements. Serde names match the column names.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum MemberField {
            $($variant,)*
        }

        impl MemberField {
            /// All fields in export order.
            pub const ALL: &'static [MemberField] = &[$(MemberField::$variant,)*];

            pub fn column(self) -> &'static str {
                match self {
                    $(MemberField::$variant => stringify!($column),)*
                }
            }

            /// Localized spreadsheet header.
            pub fn header(self) -> &'static str {
                match self {
                    $(MemberField::$variant => $header,)*
                }
            }
        }

        /// A row of the `members` table.
        ///
        /// Serialized with the raw column names, unlike the camelCase API
        /// payloads: these keys are also the `MemberField` names accepted
        /// by change sets, so a fetched record can be edited and sent back.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
        pub struct Member {
            pub member_id: i64,
            $(
                #[serde(default)]
                pub $column: Option<String>,
            )*
            #[serde(default)]
            pub updated_at: Option<String>,
        }

        impl Member {
            /// Raw stored value of a field.
            pub fn get(&self, field: MemberField) -> Option<&str> {
                match field {
                    $(MemberField::$variant => self.$column.as_deref(),)*
                }
            }

            pub fn set(&mut self, field: MemberField, value: Option<String>) {
                match field {
                    $(MemberField::$variant => self.$column = value,)*
                }
            }
        }
    };
}

member_schema! {
    LastName => last_name, "Επώνυμο";
    FirstName => first_name, "Όνομα";
    FathersName => fathers_name, "Πατρώνυμο";
    BirthDate => birth_date, "Ημ/νία Γέννησης";
    BirthPlace => birth_place, "Τόπος Γέννησης";
    Profession => profession, "Επάγγελμα";
    TaxId => tax_id, "ΑΦΜ";
    Afm => afm, "ΑΦΜ (παλαιό πεδίο)";
    IdNumber => id_number, "Αρ. Ταυτότητας";
    Address => address, "Διεύθυνση";
    PostalCode => postal_code, "ΤΚ";
    City => city, "Πόλη";
    HomePhone => home_phone, "Τηλ. Οικίας";
    MobilePhone => mobile_phone, "Κινητό";
    Email => email, "Email";
    LodgeRegNo => lodge_reg_no, "Αρ. Μητρώου Στοάς";
    GrandLodgeRegNo => grand_lodge_reg_no, "Αρ. Μητρώου Μεγάλης Στοάς";
    InitiationDate => initiation_date, "Ημ/νία Μύησης";
    InitiationDiploma => initiation_diploma, "Αρ. Διπλώματος";
    SecondDegreeDate => second_degree_date, "Ημ/νία 2ου Βαθμού";
    SecondDegreeDiploma => second_degree_diploma, "Αρ. Διπλ. 2ου";
    ThirdDegreeDate => third_degree_date, "Ημ/νία 3ου Βαθμού";
    ThirdDegreeDiploma => third_degree_diploma, "Αρ. Διπλ. 3ου";
    CurrentDegree => current_degree, "Βαθμός";
    InitiationLodge => initiation_lodge, "Στοά Μύησης";
    InitiationLodgeNumber => initiation_lodge_number, "Αρ. Στοάς";
    Sponsor => sponsor, "Εισηγητής";
    EntryDate => entry_date, "Ημ/νία Εισόδου";
    OfficesHeld => offices_held, "Αξιώματα";
    Honors => honors, "Παράσημα";
    Committees => committees, "Επιτροπές";
    MaritalStatus => marital_status, "Οικογ. Κατάσταση";
    SpouseName => spouse_name, "Όνομα Συζύγου";
    ChildrenNames => children_names, "Ονόματα Τέκνων";
    EmergencyPhone => emergency_phone, "Επείγον Τηλ.";
    EmergencyContact => emergency_contact, "Επαφή Έκτ. Ανάγκης";
    EmergencyContactName => emergency_contact_name, "Επαφή Έκτ. Ανάγκης (παλαιό πεδίο)";
    MemberStatus => member_status, "Κατάσταση";
    StatusChangeDate => status_change_date, "Ημ/νία Αλλαγής";
    StatusChangeReason => status_change_reason, "Λόγος Αλλαγής";
    FinancialStatus => financial_status, "Οικον. Τακτοποίηση";
    LastPaymentDate => last_payment_date, "Τελ. Πληρωμή";
    Notes => notes, "Παρατηρήσεις";
}

impl MemberField {
    /// Column default applied when a member is created without the field.
    pub fn default_value(self) -> Option<&'static str> {
        match self {
            MemberField::CurrentDegree => Some(Rank::Apprentice.as_str()),
            MemberField::MemberStatus => Some(MemberStatus::Active.as_str()),
            MemberField::FinancialStatus => Some(FinancialStatus::Paid.as_str()),
            _ => None,
        }
    }

    /// Check a value against the field's vocabulary. Clearing is always allowed.
    pub fn validate(self, value: &FieldValue) -> Result<(), AppError> {
        let FieldValue::Set(text) = value else {
            return Ok(());
        };

        let valid = match self {
            MemberField::CurrentDegree => Rank::from_label(text).is_some(),
            MemberField::MemberStatus => MemberStatus::from_label(text).is_some(),
            MemberField::FinancialStatus => FinancialStatus::from_label(text).is_some(),
            _ => true,
        };

        if valid {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Invalid value '{}' for {}",
                text,
                self.column()
            )))
        }
    }
}

/// Three-level rank progression stored in `current_degree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Rank {
    Apprentice,
    Fellow,
    Master,
}

impl Rank {
    /// Canonical label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Apprentice => "Μαθητής",
            Rank::Fellow => "Εταίρος",
            Rank::Master => "Διδάσκαλος",
        }
    }

    /// Parse a stored label, accepting the deprecated spelling of `Master`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Μαθητής" => Some(Rank::Apprentice),
            "Εταίρος" => Some(Rank::Fellow),
            "Διδάσκαλος" | DEPRECATED_MASTER_LABEL => Some(Rank::Master),
            _ => None,
        }
    }

    /// Every label under which this rank may be stored.
    pub fn stored_labels(&self) -> &'static [&'static str] {
        match self {
            Rank::Apprentice => &["Μαθητής"],
            Rank::Fellow => &["Εταίρος"],
            Rank::Master => &["Διδάσκαλος", DEPRECATED_MASTER_LABEL],
        }
    }
}

impl TryFrom<String> for Rank {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rank::from_label(&value).ok_or_else(|| format!("unknown rank '{}'", value))
    }
}

impl From<Rank> for String {
    fn from(rank: Rank) -> Self {
        rank.as_str().to_string()
    }
}

/// Replace a known rank label with its canonical spelling; anything else is
/// returned unchanged. Normalizing twice equals normalizing once.
pub fn normalize_rank_label(label: &str) -> String {
    match Rank::from_label(label) {
        Some(rank) => rank.as_str().to_string(),
        None => label.to_string(),
    }
}

/// Membership status stored in `member_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MemberStatus {
    Active,
    Inactive,
    Withdrawn,
    StruckOff,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "Ενεργό",
            MemberStatus::Inactive => "Ανενεργό",
            MemberStatus::Withdrawn => "Αποχωρήσαν",
            MemberStatus::StruckOff => "Διαγραφέν",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Ενεργό" => Some(MemberStatus::Active),
            "Ανενεργό" => Some(MemberStatus::Inactive),
            "Αποχωρήσαν" => Some(MemberStatus::Withdrawn),
            "Διαγραφέν" => Some(MemberStatus::StruckOff),
            _ => None,
        }
    }
}

impl TryFrom<String> for MemberStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MemberStatus::from_label(&value).ok_or_else(|| format!("unknown member status '{}'", value))
    }
}

impl From<MemberStatus> for String {
    fn from(status: MemberStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Financial good standing stored in `financial_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FinancialStatus {
    Paid,
    Unpaid,
}

impl FinancialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinancialStatus::Paid => "Ναι",
            FinancialStatus::Unpaid => "Όχι",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Ναι" => Some(FinancialStatus::Paid),
            "Όχι" => Some(FinancialStatus::Unpaid),
            _ => None,
        }
    }
}

impl TryFrom<String> for FinancialStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FinancialStatus::from_label(&value)
            .ok_or_else(|| format!("unknown financial status '{}'", value))
    }
}

impl From<FinancialStatus> for String {
    fn from(status: FinancialStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Member selection used by listings, exports, card batches and bulk changes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberFilter {
    /// Substring matched against last name, first name and mobile phone.
    #[serde(default, rename = "q")]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<MemberStatus>,
    #[serde(default)]
    pub rank: Option<Rank>,
    #[serde(default)]
    pub financial: Option<FinancialStatus>,
}

impl MemberFilter {
    pub fn by_status(status: MemberStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_rank(mut self, rank: Rank) -> Self {
        self.rank = Some(rank);
        self
    }
}

/// Member counts grouped by status, rank and financial standing.
///
/// Rank keys are canonical labels; members with no value are counted
/// under "—".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStatistics {
    pub total: i64,
    pub active: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_rank: BTreeMap<String, i64>,
    pub by_financial: BTreeMap<String, i64>,
    /// rank -> status -> count
    pub rank_by_status: BTreeMap<String, BTreeMap<String, i64>>,
    /// rank -> financial status -> count
    pub rank_by_financial: BTreeMap<String, BTreeMap<String, i64>>,
}
