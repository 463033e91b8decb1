//! A single harvestable object, addressed by druid.
//!
//! A [`Resource`] fetches its public manifest lazily, at most once, and
//! derives every metadata view from that one cached document. Collections
//! expose their members through [`Items`], a sequence whose length is known
//! from the member druid list alone; child resources are only built while
//! iterating.

use std::fmt;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::executor::Indexer;
use crate::harvest::xml::XmlDocument;
use crate::model::DescriptiveRecord;
use crate::traits::{HarvestError, Result};

const CONTENT_METADATA: &str = "contentMetadata";
const IDENTITY_METADATA: &str = "identityMetadata";
const RIGHTS_METADATA: &str = "rightsMetadata";
const RDF: &str = "RDF";

/// One object in the remote repository.
///
/// Holds a non-owning reference to the [`Indexer`] that supplies its client
/// and configuration. Memoized state lives in the instance; resources never
/// share or touch each other's caches.
#[derive(Debug)]
pub struct Resource<'a> {
    indexer: &'a Indexer,
    druid: String,
    public_xml: OnceCell<XmlDocument>,
    content_metadata: OnceCell<XmlDocument>,
    identity_metadata: OnceCell<XmlDocument>,
    rights_metadata: OnceCell<XmlDocument>,
    rdf: OnceCell<XmlDocument>,
    smods_rec: OnceCell<DescriptiveRecord>,
    items_druids: OnceCell<Vec<String>>,
}

/// What [`Resource::public_xml_or_druid`] found: the manifest when it is
/// already loaded, the druid otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestOrDruid<'r> {
    Manifest(&'r XmlDocument),
    Druid(&'r str),
}

impl fmt::Display for ManifestOrDruid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manifest(doc) => fmt::Display::fmt(doc, f),
            Self::Druid(druid) => f.write_str(druid),
        }
    }
}

impl<'a> Resource<'a> {
    pub fn new(indexer: &'a Indexer, druid: impl Into<String>) -> Self {
        Self {
            indexer,
            druid: druid.into(),
            public_xml: OnceCell::new(),
            content_metadata: OnceCell::new(),
            identity_metadata: OnceCell::new(),
            rights_metadata: OnceCell::new(),
            rdf: OnceCell::new(),
            smods_rec: OnceCell::new(),
            items_druids: OnceCell::new(),
        }
    }

    pub fn druid(&self) -> &str {
        &self.druid
    }

    pub fn indexer(&self) -> &'a Indexer {
        self.indexer
    }

    /// The druid without its `druid:` namespace prefix. This is the form sent
    /// to the client.
    pub fn bare_druid(&self) -> &str {
        self.druid.strip_prefix("druid:").unwrap_or(&self.druid)
    }

    /// Public landing page URL for this object.
    pub fn purl(&self) -> String {
        format!(
            "{}/{}",
            self.indexer.config().purl_url.trim_end_matches('/'),
            self.bare_druid()
        )
    }

    // ========================================================================
    // Manifest
    // ========================================================================

    /// Whether the remote store has a public manifest for this object.
    ///
    /// # Errors
    ///
    /// Only [`HarvestError::MissingManifest`] is turned into `false`; any other
    /// failure of the fetch is returned as is.
    pub async fn exists(&self) -> Result<bool> {
        match self.public_xml().await {
            Ok(_) => Ok(true),
            Err(err) if err.is_missing_manifest() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// The public manifest, fetched on first access and cached afterwards.
    /// A failed fetch is not cached.
    pub async fn public_xml(&self) -> Result<&XmlDocument> {
        self.public_xml
            .get_or_try_init(|| async {
                debug!(druid = %self.druid, "Fetching public XML");
                self.indexer.client().public_xml(self.bare_druid()).await
            })
            .await
    }

    /// Whether the manifest has been fetched. Never triggers a fetch.
    pub fn is_public_xml_loaded(&self) -> bool {
        self.public_xml.initialized()
    }

    /// The manifest if it is already loaded, else the druid. Handy as a log
    /// label that does not force a network call.
    pub fn public_xml_or_druid(&self) -> ManifestOrDruid<'_> {
        match self.public_xml.get() {
            Some(doc) => ManifestOrDruid::Manifest(doc),
            None => ManifestOrDruid::Druid(&self.druid),
        }
    }

    // ========================================================================
    // Derived views
    // ========================================================================

    pub async fn content_metadata(&self) -> Result<&XmlDocument> {
        self.section(&self.content_metadata, CONTENT_METADATA).await
    }

    pub async fn identity_metadata(&self) -> Result<&XmlDocument> {
        self.section(&self.identity_metadata, IDENTITY_METADATA).await
    }

    pub async fn rights_metadata(&self) -> Result<&XmlDocument> {
        self.section(&self.rights_metadata, RIGHTS_METADATA).await
    }

    /// The RDF relationship graph.
    pub async fn rdf(&self) -> Result<&XmlDocument> {
        self.section(&self.rdf, RDF).await
    }

    /// Copies the manifest's top-level `name` element into its own document.
    async fn section<'s>(
        &'s self,
        cell: &'s OnceCell<XmlDocument>,
        name: &'static str,
    ) -> Result<&'s XmlDocument> {
        cell.get_or_try_init(|| async {
            let manifest = self.public_xml().await?;
            let element = manifest.root().child(name).cloned().ok_or_else(|| {
                HarvestError::MissingMetadataSection {
                    druid: self.druid.clone(),
                    section: name.to_string(),
                }
            })?;
            Ok::<_, HarvestError>(XmlDocument::from_element(element))
        })
        .await
    }

    /// The `objectLabel` from identity metadata, empty when the field is
    /// absent.
    pub async fn identity_md_obj_label(&self) -> Result<String> {
        let identity = self.identity_metadata().await?;
        Ok(identity
            .root()
            .child("objectLabel")
            .map(|label| label.text())
            .unwrap_or_default())
    }

    /// The descriptive (MODS) record, fetched through the client on first
    /// access.
    ///
    /// # Errors
    ///
    /// - [`HarvestError::MissingDescriptiveMetadata`] if the store has none
    /// - [`HarvestError::EmptyDescriptiveMetadata`] if the document holds
    ///   nothing but markup and whitespace
    pub async fn smods_rec(&self) -> Result<&DescriptiveRecord> {
        self.smods_rec
            .get_or_try_init(|| async {
                debug!(druid = %self.druid, "Fetching descriptive metadata");
                let doc = self.indexer.client().mods(self.bare_druid()).await?;
                if !doc.root().has_text() {
                    return Err(HarvestError::EmptyDescriptiveMetadata {
                        druid: self.druid.clone(),
                        xml: doc.to_string(),
                    });
                }
                Ok::<_, HarvestError>(DescriptiveRecord::from_element(doc.into_root()))
            })
            .await
    }

    // ========================================================================
    // Membership
    // ========================================================================

    /// Whether identity metadata declares `objectType` `collection`.
    ///
    /// An object without a manifest is not a collection. A manifest lacking
    /// identity metadata is reported as
    /// [`HarvestError::MissingMetadataSection`].
    pub async fn is_collection(&self) -> Result<bool> {
        match self.identity_metadata().await {
            Ok(identity) => Ok(identity
                .root()
                .children()
                .any(|child| child.name() == "objectType" && child.text().trim() == "collection")),
            Err(err) if err.is_missing_manifest() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Member druids of this collection, looked up once and cached.
    pub async fn items_druids(&self) -> Result<&[String]> {
        let druids = self
            .items_druids
            .get_or_try_init(|| async {
                debug!(druid = %self.druid, "Listing collection members");
                self.indexer
                    .client()
                    .collection_members(self.bare_druid())
                    .await
            })
            .await?;
        Ok(druids.as_slice())
    }

    /// Member resources of this collection; empty for anything else, without
    /// a member lookup.
    pub async fn items(&self) -> Result<Items<'_, 'a>> {
        if !self.is_collection().await? {
            return Ok(Items::new(self.indexer, &[]));
        }
        let druids = self.items_druids().await?;
        Ok(Items::new(self.indexer, druids))
    }

    /// Collections this object declares itself a member of, via
    /// `isMemberOfCollection` in the relationship graph.
    pub async fn collections(&self) -> Result<Vec<Resource<'a>>> {
        let rdf = self.rdf().await?;
        Ok(rdf
            .root()
            .descendants("isMemberOfCollection")
            .into_iter()
            .filter_map(|assertion| assertion.attribute("rdf:resource"))
            .map(|uri| Resource::new(self.indexer, collection_druid(uri)))
            .collect())
    }
}

impl fmt::Display for Resource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.druid)
    }
}

/// `info:fedora/druid:ab123cd4567` → `druid:ab123cd4567`
fn collection_druid(uri: &str) -> &str {
    uri.strip_prefix("info:fedora/").unwrap_or(uri)
}

// ============================================================================
// Items
// ============================================================================

/// Members of a collection, backed by the member druid list.
///
/// `len` reads the list only; resources are constructed on demand by
/// [`Items::get`], [`Items::first`] and iteration.
#[derive(Debug, Clone, Copy)]
pub struct Items<'s, 'a> {
    indexer: &'a Indexer,
    druids: &'s [String],
}

impl<'s, 'a> Items<'s, 'a> {
    fn new(indexer: &'a Indexer, druids: &'s [String]) -> Self {
        Self { indexer, druids }
    }

    pub fn len(&self) -> usize {
        self.druids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.druids.is_empty()
    }

    pub fn druids(&self) -> &'s [String] {
        self.druids
    }

    pub fn get(&self, index: usize) -> Option<Resource<'a>> {
        self.druids
            .get(index)
            .map(|druid| Resource::new(self.indexer, druid.clone()))
    }

    pub fn first(&self) -> Option<Resource<'a>> {
        self.get(0)
    }

    pub fn iter(&self) -> ItemsIter<'s, 'a> {
        ItemsIter {
            indexer: self.indexer,
            druids: self.druids.iter(),
        }
    }
}

impl<'s, 'a> IntoIterator for Items<'s, 'a> {
    type Item = Resource<'a>;
    type IntoIter = ItemsIter<'s, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over [`Items`], building one [`Resource`] per step.
#[derive(Debug, Clone)]
pub struct ItemsIter<'s, 'a> {
    indexer: &'a Indexer,
    druids: std::slice::Iter<'s, String>,
}

impl<'a> Iterator for ItemsIter<'_, 'a> {
    type Item = Resource<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.druids
            .next()
            .map(|druid| Resource::new(self.indexer, druid.clone()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.druids.size_hint()
    }
}

impl ExactSizeIterator for ItemsIter<'_, '_> {}

// ============================================================================
// Tests
// ============================================================================
