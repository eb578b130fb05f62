use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Data source configuration
    pub data_source_mode: DataSourceMode,
    pub data_directory: Option<String>,
    pub internet_urls: Option<Vec<String>>,
    pub output_directory: Option<String>,
    /// Source file name -> term label. Files without an entry use their base name.
    #[serde(default)]
    pub term_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub filters: FilterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DataSourceMode {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "internet")]
    Internet,
    #[serde(rename = "both")]
    Both,
}

/// Filter selections. Absent or empty means "all".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub instructor: Option<String>,
    #[serde(default)]
    pub terms: Vec<String>,
    #[serde(default)]
    pub committees: Vec<String>,
    #[serde(default)]
    pub courses: Vec<String>,
    pub branch: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_source_mode: DataSourceMode::Local,
            data_directory: Some("data-source".to_string()),
            internet_urls: Some(vec![
                "https://example.com/donem-1.xlsx".to_string(),
            ]),
            output_directory: Some("output".to_string()),
            term_labels: BTreeMap::new(),
            filters: FilterConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }

    /// Term label for a source file: the configured override, else the file name
    /// without its extension.
    pub fn term_label_for(&self, source_name: &str) -> String {
        self.term_labels
            .get(source_name)
            .cloned()
            .unwrap_or_else(|| default_term_label(source_name))
    }
}

pub fn default_term_label(source_name: &str) -> String {
    std::path::Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source_name)
        .to_string()
}

/// One scheduled teaching slot, one row of a committee ("kurul") sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LectureRow {
    pub time_slot: String,
    pub course_code: String,
    pub course_name: String,
    pub course_title: String,
    pub instructor_raw: String,
    pub term_label: String,
    pub committee_name: String,
}

/// Canonical academic titles, declared from lowest to highest rank so that
/// the derived ordering follows rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Title {
    OgrGor,
    OgrGorDr,
    DrOgrUyesi,
    Doc,
    Prof,
}

impl Title {
    pub fn rank(self) -> u8 {
        match self {
            Title::OgrGor => 0,
            Title::OgrGorDr => 1,
            Title::DrOgrUyesi => 2,
            Title::Doc => 3,
            Title::Prof => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Title::Prof => "Prof. Dr.",
            Title::Doc => "Doç. Dr.",
            Title::DrOgrUyesi => "Dr. Öğr. Üyesi",
            Title::OgrGorDr => "Öğr. Gör. Dr.",
            Title::OgrGor => "Öğr. Gör.",
        }
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIdentity {
    pub title: Option<Title>,
    pub bare_name: String,
    pub name_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalIdentity {
    pub name_key: String,
    pub canonical_bare_name: String,
    pub highest_title: Option<Title>,
    pub display_name: String,
}

impl CanonicalIdentity {
    pub fn compose_display_name(title: Option<Title>, bare_name: &str) -> String {
        match title {
            Some(title) => format!("{} {}", title.label(), bare_name),
            None => bare_name.to_string(),
        }
    }
}

/// A lecture row tagged with its parse and the canonical identity it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledRow {
    pub row: LectureRow,
    pub parsed: ParsedIdentity,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructorTotal {
    pub display_name: String,
    pub total_hours: usize,
    pub distinct_committee_count: usize,
    pub distinct_term_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitteeDetail {
    pub display_name: String,
    pub term_label: String,
    pub committee_name: String,
    pub hour_count: usize,
    pub course_codes: String,
    pub course_titles: String,
    pub course_names: String,
    pub total_hours: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_order_follows_rank() {
        let mut titles = vec![Title::Doc, Title::OgrGor, Title::Prof, Title::OgrGorDr, Title::DrOgrUyesi];
        titles.sort();
        let ranks: Vec<u8> = titles.iter().map(|t| t.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4]);
        assert_eq!(titles.iter().max(), Some(&Title::Prof));
    }

    #[test]
    fn term_label_defaults_to_file_stem() {
        let mut config = Config::default();
        assert_eq!(config.term_label_for("Dönem 1.xlsx"), "Dönem 1");
        config
            .term_labels
            .insert("Dönem 1.xlsx".to_string(), "2024 Güz".to_string());
        assert_eq!(config.term_label_for("Dönem 1.xlsx"), "2024 Güz");
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut config = Config::default();
        config.filters.terms = vec!["Dönem 2".to_string()];
        config.filters.branch = Some("Anatomi".to_string());
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.filters, config.filters);
    }

    #[test]
    fn config_without_filters_table_parses() {
        let text = r#"
data_source_mode = "local"
data_directory = "data"
output_directory = "out"
"#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.filters, FilterConfig::default());
        assert!(config.term_labels.is_empty());
        assert!(config.internet_urls.is_none());
    }

    #[test]
    fn display_name_prefixes_title() {
        assert_eq!(
            CanonicalIdentity::compose_display_name(Some(Title::DrOgrUyesi), "Ali Kaya"),
            "Dr. Öğr. Üyesi Ali Kaya"
        );
        assert_eq!(CanonicalIdentity::compose_display_name(None, "Ali Kaya"), "Ali Kaya");
    }
}
