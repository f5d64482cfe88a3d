use serde::Deserialize;

/// Detail categories a caller can request for the generated profile.
///
/// `advanced_search` is deliberately not a category here: it does not map to
/// a prompt label but switches on the second completion pass, so it lives as
/// a plain flag on [`DetailSelection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailKey {
    Overview,
    Ticker,
    MarketCap,
    Headquarters,
    Employees,
    Support,
    Contacts,
}

/// Which details the caller asked for. Field names match the wire format of
/// the input form; everything defaults to off.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailSelection {
    #[serde(default)]
    pub overview: bool,
    #[serde(default)]
    pub ticker: bool,
    #[serde(default)]
    pub market_cap: bool,
    #[serde(default)]
    pub headquarters: bool,
    #[serde(default)]
    pub employees: bool,
    #[serde(default)]
    pub support: bool,
    #[serde(default)]
    pub contacts: bool,
    #[serde(default)]
    pub advanced_search: bool,
}

impl DetailSelection {
    pub fn is_selected(&self, key: DetailKey) -> bool {
        match key {
            DetailKey::Overview => self.overview,
            DetailKey::Ticker => self.ticker,
            DetailKey::MarketCap => self.market_cap,
            DetailKey::Headquarters => self.headquarters,
            DetailKey::Employees => self.employees,
            DetailKey::Support => self.support,
            DetailKey::Contacts => self.contacts,
        }
    }
}

/// One (flag, human-readable label) pair. The pipeline is configured with an
/// ordered list of these; prompt output follows that order, never the input
/// mapping's iteration order.
#[derive(Debug, Clone)]
pub struct DetailField {
    pub key: DetailKey,
    pub label: String,
}

impl DetailField {
    pub fn new(key: DetailKey, label: &str) -> Self {
        Self {
            key,
            label: label.to_string(),
        }
    }
}

/// Configuration for the generation pipeline: which model to call, the token
/// budget per pass, and the declared category order.
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    pub model: String,
    pub max_tokens: u32,
    pub advanced_max_tokens: u32,
    pub fields: Vec<DetailField>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            max_tokens: 3000,
            advanced_max_tokens: 2000,
            fields: vec![
                DetailField::new(DetailKey::Overview, "Company Overview"),
                DetailField::new(DetailKey::Ticker, "Ticker Symbol"),
                DetailField::new(DetailKey::MarketCap, "Market Cap & Revenue"),
                DetailField::new(DetailKey::Headquarters, "Headquarters Location"),
                DetailField::new(DetailKey::Employees, "Number of Employees"),
                DetailField::new(DetailKey::Support, "Customer Support System Overview"),
                DetailField::new(
                    DetailKey::Contacts,
                    "Contact Information (Phone, Email, Social Media)",
                ),
            ],
        }
    }
}

/// Text produced by the completion passes, ready to publish.
#[derive(Debug, Clone)]
pub struct GeneratedProfile {
    pub text: String,
}
