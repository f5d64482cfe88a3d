// Prompt construction for the two completion passes. Pure string building,
// no I/O and no state.

use super::profile_models::{DetailField, DetailSelection};

/// Phrase used when the caller selected no category at all.
const FALLBACK_COVERAGE: &str = "basic company information";

/// Builds the base profile prompt.
///
/// The requested categories appear in the order declared by `fields`, so the
/// prompt is stable for a given selection regardless of how the request body
/// was written.
pub fn build_base_prompt(
    company_name: &str,
    selection: &DetailSelection,
    fields: &[DetailField],
) -> String {
    let selected: Vec<&str> = fields
        .iter()
        .filter(|field| selection.is_selected(field.key))
        .map(|field| field.label.as_str())
        .collect();

    let coverage = if selected.is_empty() {
        FALLBACK_COVERAGE.to_string()
    } else {
        selected.join(", ")
    };

    format!(
        "Provide a comprehensive overview of {} including:\n{}.\nFormat with clear section headers and emojis for readability.",
        company_name, coverage
    )
}

/// Builds the advanced-search prompt: a fabricated social-profile table for
/// the company. The instruction to include a disclaimer that the data is
/// simulated and not verified is part of the contract and must stay.
pub fn build_advanced_prompt(company_name: &str) -> String {
    let search_query = format!(
        "site:instagram.com \"{}\" \"United States\" \"@gmail.com\"",
        company_name
    );

    format!(
        "Analyze simulated Instagram search results for: {}\n\n\
         Create a structured table containing:\n\
         - Profile Name (with Instagram link)\n\
         - Email Addresses (📧)\n\
         - Phone Numbers (📱)\n\
         - Location (📍)\n\
         - Key Keywords\n\n\
         Format as a markdown table with 10 realistic entries.\n\
         Include a disclaimer that the data is simulated and not verified.",
        search_query
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::profile::profile_models::ProfileConfig;

    fn fields() -> Vec<DetailField> {
        ProfileConfig::default().fields
    }

    #[test]
    fn test_empty_selection_falls_back_to_basic_info() {
        let prompt = build_base_prompt("Acme Corp", &DetailSelection::default(), &fields());

        assert!(prompt.contains("Acme Corp"));
        assert!(prompt.contains("basic company information"));
        for field in fields() {
            assert!(!prompt.contains(&field.label));
        }
    }

    #[test]
    fn test_selected_labels_appear_and_others_do_not() {
        let selection = DetailSelection {
            ticker: true,
            headquarters: true,
            ..Default::default()
        };

        let prompt = build_base_prompt("Acme Corp", &selection, &fields());

        assert!(prompt.contains("Ticker Symbol"));
        assert!(prompt.contains("Headquarters Location"));
        assert!(!prompt.contains("Company Overview"));
        assert!(!prompt.contains("Number of Employees"));
        assert!(!prompt.contains("basic company information"));
    }

    #[test]
    fn test_labels_follow_declared_order() {
        let selection = DetailSelection {
            contacts: true,
            overview: true,
            employees: true,
            ..Default::default()
        };

        let prompt = build_base_prompt("Acme Corp", &selection, &fields());

        let overview = prompt.find("Company Overview").unwrap();
        let employees = prompt.find("Number of Employees").unwrap();
        let contacts = prompt.find("Contact Information").unwrap();
        assert!(overview < employees);
        assert!(employees < contacts);
    }

    #[test]
    fn test_advanced_prompt_includes_disclaimer_instruction() {
        let prompt = build_advanced_prompt("Acme Corp");

        assert!(prompt.contains("site:instagram.com \"Acme Corp\""));
        assert!(prompt.contains("simulated and not verified"));
        assert!(prompt.contains("markdown table"));
    }
}
