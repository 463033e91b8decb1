//! In-memory [`HarvestClient`] used by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::harvest::xml::XmlDocument;
use crate::traits::{manifest_from_str, mods_from_str, HarvestClient, HarvestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    PublicXml,
    Mods,
    CollectionMembers,
}

/// Serves canned bodies and records every call it receives.
#[derive(Default)]
pub struct MockClient {
    manifests: HashMap<String, String>,
    mods: HashMap<String, String>,
    members: HashMap<String, Vec<String>>,
    broken: Vec<String>,
    calls: Mutex<Vec<(Call, String)>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_manifest(mut self, druid: &str, xml: &str) -> Self {
        self.manifests.insert(druid.to_string(), xml.to_string());
        self
    }

    pub fn with_mods(mut self, druid: &str, xml: &str) -> Self {
        self.mods.insert(druid.to_string(), xml.to_string());
        self
    }

    pub fn with_members(mut self, druid: &str, members: &[&str]) -> Self {
        self.members.insert(
            druid.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        );
        self
    }

    /// Every call for `druid` fails with a transport error.
    pub fn with_broken(mut self, druid: &str) -> Self {
        self.broken.push(druid.to_string());
        self
    }

    pub fn calls(&self, kind: Call) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| {
                calls
                    .iter()
                    .filter(|(k, _)| *k == kind)
                    .map(|(_, druid)| druid.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn record(&self, kind: Call, druid: &str) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((kind, druid.to_string()));
        }
        if self.broken.iter().any(|b| b == druid) {
            return Err(HarvestError::Fetch {
                druid: druid.to_string(),
                source: "connection reset".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl HarvestClient for MockClient {
    async fn public_xml(&self, druid: &str) -> Result<XmlDocument> {
        self.record(Call::PublicXml, druid)?;
        let body = self.manifests.get(druid).map(String::as_str).unwrap_or("");
        manifest_from_str(druid, body)
    }

    async fn mods(&self, druid: &str) -> Result<XmlDocument> {
        self.record(Call::Mods, druid)?;
        let body = self.mods.get(druid).map(String::as_str).unwrap_or("");
        mods_from_str(druid, body)
    }

    async fn collection_members(&self, druid: &str) -> Result<Vec<String>> {
        self.record(Call::CollectionMembers, druid)?;
        Ok(self.members.get(druid).cloned().unwrap_or_default())
    }
}
