//! Column and property names in the two contact stores.

pub const CONTACT: &str = "Contact";
pub const PRIMARY_EMAIL: &str = "Primary email";
pub const MOBILE_PHONE: &str = "Mobile Phone Number";
pub const CATEGORY: &str = "Category";

pub const LAST_EMAIL_SENT: &str = "Last Email Sent";
pub const LAST_EMAIL_RECEIVED: &str = "Last Email Received";
pub const LAST_WHATSAPP_SENT: &str = "Last Whatsapp Sent";
pub const LAST_WHATSAPP_RECEIVED: &str = "Last Whatsapp Received";
pub const LAST_CONTACT: &str = "Last Contact";

pub const HUBSPOT_ID: &str = "HubSpot ID";
pub const HUBSPOT_URL: &str = "HubSpot URL";

/// CRM properties
pub mod crm {
    pub const FIRSTNAME: &str = "firstname";
    pub const LASTNAME: &str = "lastname";
    pub const EMAIL: &str = "email";
    pub const ADDITIONAL_EMAILS: &str = "hs_additional_emails";
    pub const PHONE: &str = "phone";
    pub const MOBILE_PHONE: &str = "mobilephone";
    pub const COMPANY: &str = "company";
    pub const JOB_TITLE: &str = "jobtitle";
    pub const LAST_MODIFIED: &str = "lastmodifieddate";
    pub const AIRTABLE_ID: &str = "airtable_id";
}

/// Quote a value for use inside an Airtable `filterByFormula` string literal.
pub fn formula_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// `{field} = 'value'`
pub fn equals_formula(field: &str, value: &str) -> String {
    format!("{{{}}} = {}", field, formula_literal(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equals_formula_escapes_quotes() {
        assert_eq!(
            equals_formula(CONTACT, "Ada Lovelace"),
            "{Contact} = 'Ada Lovelace'"
        );
        assert_eq!(
            equals_formula(CONTACT, "D'Arcy \\ Co"),
            "{Contact} = 'D\\'Arcy \\\\ Co'"
        );
    }
}
