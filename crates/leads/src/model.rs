use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Form type recorded when the website does not send one.
pub const DEFAULT_FORM_TYPE: &str = "Website Form";

/// Processing state of a lead. New submissions always start as `New`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    InProgress,
    Completed,
    Cancelled,
}

/// A stored application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub country: String,
    pub form_type: String,
    pub status: LeadStatus,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

/// The application form as the website posts it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewLead {
    pub name: String,
    pub phone: String,
    pub country: String,
    pub form_type: String,
}

impl NewLead {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    #[must_use]
    pub fn with_form_type(mut self, form_type: impl Into<String>) -> Self {
        self.form_type = form_type.into();
        self
    }

    /// Trim every field, require name and phone, and fill in the form type.
    pub fn normalized(self) -> Result<Self> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::MissingField { field: "name" });
        }
        let phone = self.phone.trim();
        if phone.is_empty() {
            return Err(Error::MissingField { field: "phone" });
        }
        let form_type = match self.form_type.trim() {
            "" => DEFAULT_FORM_TYPE,
            other => other,
        };
        Ok(Self {
            name: name.to_string(),
            phone: phone.to_string(),
            country: self.country.trim().to_string(),
            form_type: form_type.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn normalizes_and_fills_defaults() {
        let lead = NewLead::new("  Aziz ", " +998901234567").normalized().unwrap();
        assert_eq!(lead.name, "Aziz");
        assert_eq!(lead.phone, "+998901234567");
        assert_eq!(lead.country, "");
        assert_eq!(lead.form_type, DEFAULT_FORM_TYPE);
    }

    #[rstest]
    #[case("", "+998", "name")]
    #[case("   ", "+998", "name")]
    #[case("Aziz", "", "phone")]
    #[case("Aziz", " \t", "phone")]
    fn missing_required_field(#[case] name: &str, #[case] phone: &str, #[case] field: &str) {
        let err = NewLead::new(name, phone).normalized().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), format!("{field} is required"));
    }

    #[test]
    fn deserializes_website_payload() {
        let lead: NewLead = serde_json::from_str(
            r#"{"name":"Aziz","phone":"+998","country":"Germaniya","formType":"Hero"}"#,
        )
        .unwrap();
        assert_eq!(lead.form_type, "Hero");
        assert_eq!(lead.country, "Germaniya");

        let sparse: NewLead = serde_json::from_str(r#"{"name":"Aziz"}"#).unwrap();
        assert!(sparse.phone.is_empty());
    }
}
