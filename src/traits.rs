use async_trait::async_trait;
use thiserror::Error;

use crate::harvest::xml::XmlDocument;

/// Errors raised while resolving a resource against the remote store.
#[derive(Error, Debug)]
pub enum HarvestError {
    /// The remote store has no public manifest for this druid
    #[error("No public XML manifest for {druid}")]
    MissingManifest { druid: String },

    /// The manifest exists but lacks the requested top-level section
    #[error("Public XML for {druid} has no <{section}> section")]
    MissingMetadataSection { druid: String, section: String },

    /// The remote store has no descriptive metadata for this druid
    #[error("No descriptive metadata for {druid}")]
    MissingDescriptiveMetadata { druid: String },

    /// Descriptive metadata was returned but carries no content
    #[error("Empty descriptive metadata for {druid}: {xml}")]
    EmptyDescriptiveMetadata { druid: String, xml: String },

    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    /// Any other collaborator failure (transport, server error, ...)
    #[error("Failed to fetch {druid}: {source}")]
    Fetch {
        druid: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl HarvestError {
    pub fn is_missing_manifest(&self) -> bool {
        matches!(self, Self::MissingManifest { .. })
    }
}

pub type Result<T, E = HarvestError> = std::result::Result<T, E>;

/// Client for the remote object store.
///
/// Implementations own transport, retries and timeouts; the resource layer
/// only relies on the missing-object contract: a druid with nothing behind it
/// must fail with the matching `Missing*` variant, never with a parse error.
#[async_trait]
pub trait HarvestClient: Send + Sync {
    /// Fetches the public XML manifest for `druid`.
    async fn public_xml(&self, druid: &str) -> Result<XmlDocument>;

    /// Fetches the descriptive (MODS) metadata document for `druid`.
    async fn mods(&self, druid: &str) -> Result<XmlDocument>;

    /// Lists the member druids of the collection `druid`, in order.
    async fn collection_members(&self, druid: &str) -> Result<Vec<String>>;
}

/// Turns a manifest response body into a document. A blank body means the
/// store has no manifest.
pub fn manifest_from_str(druid: &str, body: &str) -> Result<XmlDocument> {
    if body.trim().is_empty() {
        return Err(HarvestError::MissingManifest {
            druid: druid.to_string(),
        });
    }
    XmlDocument::parse(body)
}

/// Turns a descriptive-metadata response body into a document. A blank body
/// means the store has no descriptive metadata.
pub fn mods_from_str(druid: &str, body: &str) -> Result<XmlDocument> {
    if body.trim().is_empty() {
        return Err(HarvestError::MissingDescriptiveMetadata {
            druid: druid.to_string(),
        });
    }
    XmlDocument::parse(body)
}
