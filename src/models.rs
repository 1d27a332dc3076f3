use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// A manufacturer style code such as `K420` or `PC61`.
///
/// Codes are trimmed and upper-cased on construction so that `k420 ` and
/// `K420` are the same style.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleCode(String);

impl StyleCode {
    /// Normalizes a raw token, returning `None` for blank input
    pub fn new(raw: &str) -> Option<Self> {
        let code = raw.trim().to_uppercase();
        if code.is_empty() {
            None
        } else {
            Some(Self(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StyleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deduplicated style codes in order of first occurrence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSet {
    codes: Vec<StyleCode>,
    seen: HashSet<StyleCode>,
}

impl StyleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a code, returning `false` if it was already present
    pub fn insert(&mut self, code: StyleCode) -> bool {
        if self.seen.contains(&code) {
            return false;
        }
        self.seen.insert(code.clone());
        self.codes.push(code);
        true
    }

    pub fn contains(&self, code: &str) -> bool {
        StyleCode::new(code).is_some_and(|c| self.seen.contains(&c))
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleCode> {
        self.codes.iter()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Codes as plain strings, in order
    pub fn to_strings(&self) -> Vec<String> {
        self.codes.iter().map(|c| c.to_string()).collect()
    }
}

impl FromIterator<StyleCode> for StyleSet {
    fn from_iter<I: IntoIterator<Item = StyleCode>>(iter: I) -> Self {
        let mut set = StyleSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<StyleCode> for StyleSet {
    fn extend<I: IntoIterator<Item = StyleCode>>(&mut self, iter: I) {
        for code in iter {
            self.insert(code);
        }
    }
}

impl<'a> IntoIterator for &'a StyleSet {
    type Item = &'a StyleCode;
    type IntoIter = std::slice::Iter<'a, StyleCode>;

    fn into_iter(self) -> Self::IntoIter {
        self.codes.iter()
    }
}

/// Which SanMar deployment to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Test,
    #[default]
    Production,
}

/// Account credentials for the inventory web services
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Only required by the SanMar Standard backend
    pub customer_number: Option<String>,
    pub environment: Environment,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field(
                "customer_number",
                &self.customer_number.as_ref().map(|_| "***"),
            )
            .field("environment", &self.environment)
            .finish()
    }
}

/// Inventory web service flavour. Fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Backend {
    /// PromoStandards Inventory 2.0.0
    #[default]
    #[value(name = "promostandards")]
    PromoStandards,
    /// SanMar Standard web service (needs a customer number)
    #[value(name = "standard")]
    Standard,
}

impl Backend {
    /// Identifier used on the command line and in `SANMAR_BACKEND`
    pub fn code(&self) -> &'static str {
        match self {
            Backend::PromoStandards => "promostandards",
            Backend::Standard => "standard",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::PromoStandards => f.write_str("PromoStandards"),
            Backend::Standard => f.write_str("SanMar Standard"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        [Backend::PromoStandards, Backend::Standard]
            .into_iter()
            .find(|backend| backend.code() == code)
            .ok_or(code)
    }
}

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Csv,
    Xlsx,
}

impl OutputFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Xlsx => "xlsx",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "xlsx" => Ok(OutputFormat::Xlsx),
            other => Err(other.to_string()),
        }
    }
}

/// One normalized inventory line: a style/color/size at one warehouse.
///
/// Field names serialize to the export column headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryRow {
    pub style: String,
    #[serde(rename = "partId")]
    pub part_id: Option<String>,
    pub color: String,
    pub size: String,
    pub description: Option<String>,
    #[serde(rename = "warehouseId")]
    pub warehouse_id: String,
    #[serde(rename = "warehouse")]
    pub warehouse_name: String,
    #[serde(rename = "qty")]
    pub quantity: u64,
    #[serde(rename = "totalAvailable")]
    pub total_available: Option<u64>,
}

/// Export column headers, in file order
pub const COLUMNS: [&str; 9] = [
    "style",
    "partId",
    "color",
    "size",
    "description",
    "warehouseId",
    "warehouse",
    "qty",
    "totalAvailable",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_code_normalizes_case_and_whitespace() {
        let code = StyleCode::new("  k420 ").unwrap();
        assert_eq!(code.as_str(), "K420");
        assert!(StyleCode::new("   ").is_none());
    }

    #[test]
    fn style_set_keeps_first_occurrence_order() {
        let set: StyleSet = ["PC61", "k420", "PC61", "K420", "L223"]
            .iter()
            .filter_map(|s| StyleCode::new(s))
            .collect();
        assert_eq!(set.to_strings(), vec!["PC61", "K420", "L223"]);
        assert_eq!(set.len(), 3);
        assert!(set.contains("k420"));
        assert!(!set.contains("J317"));
    }

    #[test]
    fn credentials_debug_hides_secrets() {
        let creds = Credentials {
            username: "shop".to_string(),
            password: "hunter2".to_string(),
            customer_number: Some("12345".to_string()),
            environment: Environment::Test,
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("shop"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("12345"));
    }

    #[test]
    fn backend_and_format_parse_case_insensitively() {
        assert_eq!("PromoStandards".parse::<Backend>(), Ok(Backend::PromoStandards));
        assert_eq!(" standard".parse::<Backend>(), Ok(Backend::Standard));
        assert!("webjson".parse::<Backend>().is_err());
        assert_eq!("XLSX".parse::<OutputFormat>(), Ok(OutputFormat::Xlsx));
        assert_eq!("csv".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert_eq!("pdf".parse::<OutputFormat>(), Err("pdf".to_string()));
    }

    #[test]
    fn backend_code_parses_back() {
        for backend in [Backend::PromoStandards, Backend::Standard] {
            assert_eq!(backend.code().parse::<Backend>(), Ok(backend));
        }
        assert_eq!("WebJSON".parse::<Backend>(), Err("webjson".to_string()));
    }

    #[test]
    fn columns_match_row_serialization_order() {
        let row = InventoryRow {
            style: "K420".to_string(),
            part_id: None,
            color: "Black".to_string(),
            size: "L".to_string(),
            description: None,
            warehouse_id: "1".to_string(),
            warehouse_name: "Seattle, WA".to_string(),
            quantity: 0,
            total_available: None,
        };
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.serialize(&row).unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        let header = out.lines().next().unwrap();
        assert_eq!(header, COLUMNS.join(","));
    }
}
