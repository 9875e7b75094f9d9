use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Group key and display name used when a field is missing or empty.
pub const UNKNOWN: &str = "Unknown";

/// Known document fields, in the order they are listed and exported.
pub const FIELD_NAMES: [&str; 13] = [
    "fullName",
    "program",
    "gender",
    "programSpecialization",
    "semester",
    "address",
    "feeDeposited",
    "pendingFee",
    "studentContact",
    "parentContact",
    "email",
    "additionalComments",
    "userId",
];

/// Names owned by the store. They never live inside a document body.
pub const STORE_FIELDS: [&str; 2] = ["id", "createdAt"];

pub const PROGRAM_CHOICES: [&str; 6] = ["B.Tech", "M.Tech", "BCA", "MCA", "BSc", "MSc"];
pub const GENDER_CHOICES: [&str; 3] = ["male", "female", "other"];
pub const SEMESTER_CHOICES: [&str; 8] = ["1", "2", "3", "4", "5", "6", "7", "8"];

const DEFAULT_SPECIALIZATION: &str = "Computer Science Engineering";
const DEFAULT_PENDING_FEE: &str = "Nil";

/// Text form of a loosely typed document value.
///
/// `null`, `false` and `0` render empty, matching how the dashboard has always
/// printed falsy values. Arrays and objects render as compact JSON.
pub fn value_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Bool(false) => String::new(),
        Value::Bool(true) => "true".to_string(),
        Value::Number(n) => {
            if n.as_f64() == Some(0.0) {
                String::new()
            } else {
                n.to_string()
            }
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn lenient_text<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    Ok(Some(value_text(&v)))
}

/// Body of a stored student document.
///
/// Each known field is either absent (`None`) or present, possibly empty.
/// Anything else the store hands back is kept in `extra`, in stored order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFields {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub program_specialization: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub fee_deposited: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub pending_fee: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub student_contact: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub parent_contact: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub additional_comments: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StudentFields {
    fn known(&self, name: &str) -> Option<&Option<String>> {
        let slot = match name {
            "fullName" => &self.full_name,
            "program" => &self.program,
            "gender" => &self.gender,
            "programSpecialization" => &self.program_specialization,
            "semester" => &self.semester,
            "address" => &self.address,
            "feeDeposited" => &self.fee_deposited,
            "pendingFee" => &self.pending_fee,
            "studentContact" => &self.student_contact,
            "parentContact" => &self.parent_contact,
            "email" => &self.email,
            "additionalComments" => &self.additional_comments,
            "userId" => &self.user_id,
            _ => return None,
        };
        Some(slot)
    }

    fn known_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        let slot = match name {
            "fullName" => &mut self.full_name,
            "program" => &mut self.program,
            "gender" => &mut self.gender,
            "programSpecialization" => &mut self.program_specialization,
            "semester" => &mut self.semester,
            "address" => &mut self.address,
            "feeDeposited" => &mut self.fee_deposited,
            "pendingFee" => &mut self.pending_fee,
            "studentContact" => &mut self.student_contact,
            "parentContact" => &mut self.parent_contact,
            "email" => &mut self.email,
            "additionalComments" => &mut self.additional_comments,
            "userId" => &mut self.user_id,
            _ => return None,
        };
        Some(slot)
    }

    /// Text of a field, or `None` when the field is absent.
    pub fn text(&self, name: &str) -> Option<Cow<'_, str>> {
        match self.known(name) {
            Some(slot) => slot.as_deref().map(Cow::Borrowed),
            None => self.extra.get(name).map(|v| match v {
                Value::String(s) => Cow::Borrowed(s.as_str()),
                other => Cow::Owned(value_text(other)),
            }),
        }
    }

    /// Names of the fields present on this document: known fields in
    /// canonical order, then extras in stored order.
    pub fn field_names(&self) -> Vec<&str> {
        let mut out: Vec<&str> = FIELD_NAMES
            .iter()
            .copied()
            .filter(|name| self.known(name).map(|s| s.is_some()).unwrap_or(false))
            .collect();
        out.extend(self.extra.keys().map(|k| k.as_str()));
        out
    }

    fn set(&mut self, name: &str, value: String) {
        match self.known_mut(name) {
            Some(slot) => *slot = Some(value),
            None => {
                self.extra.insert(name.to_string(), Value::String(value));
            }
        }
    }

    /// Drops store-owned keys that leaked into the extra bag.
    pub fn strip_store_fields(&mut self) {
        // retain keeps the remaining extras in order
        self.extra.retain(|k, _| !STORE_FIELDS.contains(&k.as_str()));
    }
}

/// A stored student document as handed out by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: StudentFields,
}

/// Draft of the student-facing form.
///
/// Updates never mutate in place; `with_field` hands back a new form.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentForm {
    fields: StudentFields,
}

impl StudentForm {
    pub fn new(email: Option<&str>) -> Self {
        let blank = || Some(String::new());
        Self {
            fields: StudentFields {
                full_name: blank(),
                program: blank(),
                gender: blank(),
                program_specialization: Some(DEFAULT_SPECIALIZATION.to_string()),
                semester: blank(),
                address: blank(),
                fee_deposited: blank(),
                pending_fee: Some(DEFAULT_PENDING_FEE.to_string()),
                student_contact: blank(),
                parent_contact: blank(),
                email: Some(email.unwrap_or_default().to_string()),
                additional_comments: blank(),
                user_id: None,
                extra: Map::new(),
            },
        }
    }

    /// Returns a copy of the form with `name` set to `value`.
    ///
    /// `id`, `createdAt` and `userId` are assigned at submission and are left
    /// untouched here.
    pub fn with_field(&self, name: &str, value: impl Into<String>) -> Self {
        if name == "userId" || STORE_FIELDS.contains(&name) {
            log::debug!("form ignores reserved field {}", name);
            return self.clone();
        }
        let mut fields = self.fields.clone();
        fields.set(name, value.into());
        Self { fields }
    }

    pub fn fields(&self) -> &StudentFields {
        &self.fields
    }

    /// Document body to store for `user_id`.
    pub fn submission(&self, user_id: &str) -> StudentFields {
        let mut fields = self.fields.clone();
        fields.user_id = Some(user_id.to_string());
        fields.strip_store_fields();
        fields
    }
}

impl Default for StudentForm {
    fn default() -> Self {
        Self::new(None)
    }
}
