use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{info, instrument, warn};

use crate::harvest::metrics::{Metrics, MetricsSnapshot};
use crate::harvest::resource::Resource;
use crate::model::IndexerConfig;
use crate::traits::{HarvestClient, Result};

/// Owning context of a harvest run: configuration, the remote-store client
/// and the run's metrics. Resources borrow it; it never tracks them.
pub struct Indexer {
    config: IndexerConfig,
    client: Arc<dyn HarvestClient>,
    metrics: Metrics,
}

impl fmt::Debug for Indexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Indexer")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl Indexer {
    pub fn new(config: IndexerConfig, client: Arc<dyn HarvestClient>) -> Self {
        Self {
            config,
            client,
            metrics: Metrics::new(),
        }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn client(&self) -> &dyn HarvestClient {
        self.client.as_ref()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn resource(&self, druid: impl Into<String>) -> Resource<'_> {
        Resource::new(self, druid)
    }

    /// Runs `work` once per druid, at most `config.concurrency` at a time.
    ///
    /// Every outcome is tallied in [`Indexer::metrics`]; failures are logged
    /// and never stop the batch. Returns the metrics as they stand after the
    /// batch, including earlier runs on this indexer.
    #[instrument(skip(self, druids, work), fields(concurrency = self.config.effective_concurrency()))]
    pub async fn harvest<'a, I, W, Fut>(&'a self, druids: I, work: W) -> MetricsSnapshot
    where
        I: IntoIterator,
        I::Item: Into<String>,
        W: Fn(Resource<'a>) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let work = &work;
        stream::iter(druids.into_iter().map(Into::into))
            .for_each_concurrent(self.config.effective_concurrency(), |druid: String| async move {
                let resource = self.resource(druid.clone());
                self.metrics
                    .tally_async_with(
                        |err| warn!(druid = %druid, error = %err, "Failed to harvest resource"),
                        work(resource),
                    )
                    .await;
            })
            .await;

        let snapshot = self.metrics.snapshot();
        info!(
            success_count = snapshot.success_count,
            error_count = snapshot.error_count,
            total = snapshot.total,
            "Harvest finished"
        );
        snapshot
    }
}
