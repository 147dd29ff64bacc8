//! Hand-picked fields shown for each record, under readable labels.

use serde::Serialize;
use shared::{ContactRecord, ContactSource};

use crate::fields::{self, crm};

const AIRTABLE_FIELDS: &[(&str, &str)] = &[
    (fields::CONTACT, "Name"),
    (fields::PRIMARY_EMAIL, "Email"),
    (fields::MOBILE_PHONE, "Mobile"),
    (fields::CATEGORY, "Category"),
    (fields::LAST_EMAIL_SENT, "Last email sent"),
    (fields::LAST_EMAIL_RECEIVED, "Last email received"),
    (fields::LAST_WHATSAPP_SENT, "Last WhatsApp sent"),
    (fields::LAST_WHATSAPP_RECEIVED, "Last WhatsApp received"),
    (fields::LAST_CONTACT, "Last contact"),
    (fields::HUBSPOT_ID, "HubSpot ID"),
];

const HUBSPOT_FIELDS: &[(&str, &str)] = &[
    (crm::FIRSTNAME, "First name"),
    (crm::LASTNAME, "Last name"),
    (crm::EMAIL, "Email"),
    (crm::ADDITIONAL_EMAILS, "Other emails"),
    (crm::PHONE, "Phone"),
    (crm::MOBILE_PHONE, "Mobile"),
    (crm::COMPANY, "Company"),
    (crm::JOB_TITLE, "Job title"),
    (crm::AIRTABLE_ID, "Airtable ID"),
    (crm::LAST_MODIFIED, "Last modified"),
];

/// Properties requested from the CRM so every displayed field is populated.
pub fn crm_properties() -> Vec<&'static str> {
    HUBSPOT_FIELDS.iter().map(|(property, _)| *property).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayField {
    pub label: &'static str,
    pub value: String,
}

/// A record reduced to its displayable fields, in display order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRecord {
    pub id: String,
    pub source: ContactSource,
    pub fields: Vec<DisplayField>,
}

impl DisplayRecord {
    pub fn from_record(record: &ContactRecord) -> Self {
        let curated = match record.source {
            ContactSource::Airtable => AIRTABLE_FIELDS,
            ContactSource::HubSpot => HUBSPOT_FIELDS,
        };

        let fields = curated
            .iter()
            .filter_map(|(name, label)| {
                record
                    .field_text(name)
                    .map(|value| DisplayField { label, value })
            })
            .collect();

        Self {
            id: record.id.clone(),
            source: record.source,
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_curated_fields_in_order() {
        let fields = json!({
            "Primary email": "ada@example.com",
            "Contact": "Ada Lovelace",
            "Internal notes": "not shown",
            "Category": ["Founder", "Investor"],
            "Last Contact": null
        });
        let record = ContactRecord::new(
            "rec1",
            ContactSource::Airtable,
            fields.as_object().cloned().unwrap_or_default(),
        );

        let display = DisplayRecord::from_record(&record);
        let labels: Vec<&str> = display.fields.iter().map(|f| f.label).collect();
        assert_eq!(labels, vec!["Name", "Email", "Category"]);
        assert_eq!(display.fields[2].value, "Founder, Investor");
    }

    #[test]
    fn test_crm_properties_cover_display() {
        let props = crm_properties();
        assert!(props.contains(&"hs_additional_emails"));
        assert!(props.contains(&"airtable_id"));
    }
}
