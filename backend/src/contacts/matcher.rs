use crate::clients::{Filter, FilterGroup, FilterOperator};
use crate::fields::{self, crm};

/// Turns a free-text contact key into store-specific lookups.
pub trait ContactMatcher: Send + Sync {
    /// Record store `filterByFormula` expression
    fn record_formula(&self, key: &str) -> String;

    /// CRM search filter groups (ORed)
    fn crm_filters(&self, key: &str) -> Vec<FilterGroup>;
}

/// Matches by person name.
///
/// `"Ada King Lovelace"` → firstname `Ada` and lastname `King Lovelace`.
/// A single token is tried against either name part.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameTokenMatcher;

impl ContactMatcher for NameTokenMatcher {
    fn record_formula(&self, key: &str) -> String {
        fields::equals_formula(fields::CONTACT, key.trim())
    }

    fn crm_filters(&self, key: &str) -> Vec<FilterGroup> {
        let tokens: Vec<&str> = key.split_whitespace().collect();
        match tokens.as_slice() {
            [] => Vec::new(),
            [single] => vec![
                FilterGroup::single(Filter::new(
                    crm::FIRSTNAME,
                    FilterOperator::ContainsToken,
                    *single,
                )),
                FilterGroup::single(Filter::new(
                    crm::LASTNAME,
                    FilterOperator::ContainsToken,
                    *single,
                )),
            ],
            [first, rest @ ..] => vec![FilterGroup::all(vec![
                Filter::new(crm::FIRSTNAME, FilterOperator::Eq, *first),
                Filter::new(crm::LASTNAME, FilterOperator::Eq, rest.join(" ")),
            ])],
        }
    }
}

/// Matches by email address, including the CRM's secondary addresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailMatcher;

impl ContactMatcher for EmailMatcher {
    fn record_formula(&self, key: &str) -> String {
        fields::equals_formula(fields::PRIMARY_EMAIL, key.trim())
    }

    fn crm_filters(&self, key: &str) -> Vec<FilterGroup> {
        let email = key.trim();
        vec![
            FilterGroup::single(Filter::new(crm::EMAIL, FilterOperator::Eq, email)),
            FilterGroup::single(Filter::new(
                crm::ADDITIONAL_EMAILS,
                FilterOperator::ContainsToken,
                email,
            )),
        ]
    }
}

/// Email lookup for keys containing `@`, name lookup otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoMatcher;

impl AutoMatcher {
    fn pick(key: &str) -> &'static dyn ContactMatcher {
        if key.contains('@') {
            &EmailMatcher
        } else {
            &NameTokenMatcher
        }
    }
}

impl ContactMatcher for AutoMatcher {
    fn record_formula(&self, key: &str) -> String {
        Self::pick(key).record_formula(key)
    }

    fn crm_filters(&self, key: &str) -> Vec<FilterGroup> {
        Self::pick(key).crm_filters(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_splits_first_and_rest() {
        let groups = NameTokenMatcher.crm_filters("Ada King Lovelace");
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].filters,
            vec![
                Filter::new("firstname", FilterOperator::Eq, "Ada"),
                Filter::new("lastname", FilterOperator::Eq, "King Lovelace"),
            ]
        );
    }

    #[test]
    fn test_single_token_matches_either_name() {
        let groups = NameTokenMatcher.crm_filters("  Lovelace ");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].filters[0].property_name, "firstname");
        assert_eq!(groups[1].filters[0].property_name, "lastname");
        assert!(groups
            .iter()
            .all(|g| g.filters[0].operator == FilterOperator::ContainsToken));
    }

    #[test]
    fn test_name_formula_uses_contact_field() {
        assert_eq!(
            NameTokenMatcher.record_formula(" Ada Lovelace "),
            "{Contact} = 'Ada Lovelace'"
        );
    }

    #[test]
    fn test_auto_matcher_switches_on_at_sign() {
        assert_eq!(
            AutoMatcher.record_formula("ada@example.com"),
            "{Primary email} = 'ada@example.com'"
        );
        let groups = AutoMatcher.crm_filters("ada@example.com");
        assert_eq!(groups[1].filters[0].property_name, "hs_additional_emails");

        assert_eq!(AutoMatcher.record_formula("Ada"), "{Contact} = 'Ada'");
    }
}
