use serde::Deserialize;

use crate::harvest::xml::XmlElement;

pub const DEFAULT_PURL_URL: &str = "https://purl.stanford.edu";

/// Settings shared by every resource of one harvest run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Base URL of the PURL service, without trailing slash
    pub purl_url: String,

    /// Maximum number of resources processed at once by `Indexer::harvest`
    pub concurrency: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            purl_url: DEFAULT_PURL_URL.to_string(),
            concurrency: 1,
        }
    }
}

impl IndexerConfig {
    pub fn with_purl_url(mut self, url: impl Into<String>) -> Self {
        self.purl_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Concurrency actually used; zero is treated as one.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

/// Structured view over a MODS descriptive-metadata record.
///
/// Only generic field access lives here; schema-specific interpretation of
/// MODS belongs to downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptiveRecord {
    root: XmlElement,
}

impl DescriptiveRecord {
    pub fn from_element(root: XmlElement) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Trimmed text of every top-level field named `field`, skipping blanks.
    pub fn values(&self, field: &str) -> Vec<String> {
        self.root
            .children()
            .filter(|child| child.name() == field)
            .map(|child| child.text().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect()
    }

    /// Title strings from every `titleInfo/title`.
    pub fn titles(&self) -> Vec<String> {
        self.root
            .children()
            .filter(|child| child.name() == "titleInfo")
            .flat_map(|info| info.children().filter(|c| c.name() == "title"))
            .map(|title| title.text().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::xml::XmlDocument;

    #[test]
    fn test_config_defaults_and_partial_deserialization() {
        let config: IndexerConfig = serde_json::from_str(r#"{"concurrency": 4}"#).unwrap();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.purl_url, DEFAULT_PURL_URL);

        let config = IndexerConfig::default().with_concurrency(0);
        assert_eq!(config.effective_concurrency(), 1);
    }

    #[test]
    fn test_with_purl_url_strips_trailing_slash() {
        let config = IndexerConfig::default().with_purl_url("https://purl.example.org/");
        assert_eq!(config.purl_url, "https://purl.example.org");
    }

    #[test]
    fn test_descriptive_record_fields() {
        let doc = XmlDocument::parse(
            "<mods><titleInfo><title> Maps </title></titleInfo><note>hi</note><note> </note></mods>",
        )
        .unwrap();
        let record = DescriptiveRecord::from_element(doc.into_root());

        assert_eq!(record.values("note"), vec!["hi"]);
        assert_eq!(record.titles(), vec!["Maps"]);
        assert_eq!(record.root().name(), "mods");
    }
}
