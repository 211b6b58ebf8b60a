//! Per-region client cache.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::TRACING_TARGET_REGISTRY;
use crate::providers::{Backend, Connector};
use crate::types::Region;

/// Lazily creates and caches one [`Backend`] handle per region.
///
/// The home client is kept apart from the regional cache: it is built once
/// with the registry and serves every write to the home bucket.
///
/// Concurrent first use of a region may construct more than one handle; only
/// the first one inserted is kept and handed out, the others are dropped.
#[derive(Debug)]
pub struct ClientRegistry {
    home: Arc<dyn Backend>,
    connector: Arc<dyn Connector>,
    clients: RwLock<HashMap<Region, Arc<dyn Backend>>>,
}

impl ClientRegistry {
    /// Creates a registry around an existing home client.
    pub fn new(home: Arc<dyn Backend>, connector: Arc<dyn Connector>) -> Self {
        Self {
            home,
            connector,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the home client.
    #[inline]
    pub fn home(&self) -> &Arc<dyn Backend> {
        &self.home
    }

    /// Region the home client is bound to.
    #[inline]
    pub fn home_region(&self) -> &Region {
        self.home.region()
    }

    /// Returns the client for `region`, creating it on first use.
    pub async fn client_for_region(&self, region: &Region) -> Arc<dyn Backend> {
        if let Some(client) = self.clients.read().await.get(region) {
            return client.clone();
        }

        // Constructed outside the lock; a racing caller may do the same.
        let created = self.connector.connect(region);

        let mut clients = self.clients.write().await;
        let client = clients.entry(region.clone()).or_insert_with(|| {
            tracing::debug!(
                target: TRACING_TARGET_REGISTRY,
                region = %region,
                "cached client for region"
            );
            created
        });
        client.clone()
    }

    /// Number of regions with a cached client.
    pub async fn cached_regions(&self) -> usize {
        self.clients.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::join_all;

    use super::*;
    use crate::providers::{MemoryBackend, MemoryCluster, MemoryConnector};

    /// Connector counting how many handles it created.
    #[derive(Debug)]
    struct CountingConnector {
        inner: MemoryConnector,
        created: AtomicUsize,
    }

    impl Connector for CountingConnector {
        fn connect(&self, region: &Region) -> Arc<dyn Backend> {
            self.created.fetch_add(1, Ordering::SeqCst);
            self.inner.connect(region)
        }
    }

    fn registry() -> (ClientRegistry, Arc<CountingConnector>) {
        let cluster = MemoryCluster::new();
        let connector = Arc::new(CountingConnector {
            inner: MemoryConnector::new(cluster.clone()),
            created: AtomicUsize::new(0),
        });
        let home = Arc::new(MemoryBackend::new(cluster, "eu-central-1"));
        (ClientRegistry::new(home, connector.clone()), connector)
    }

    #[tokio::test]
    async fn creates_client_once_per_region() {
        let (registry, connector) = registry();
        let west = Region::new("eu-west-1");

        let first = registry.client_for_region(&west).await;
        let second = registry.client_for_region(&west).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.region(), &west);
        assert_eq!(connector.created.load(Ordering::SeqCst), 1);
        assert_eq!(registry.cached_regions().await, 1);
    }

    #[tokio::test]
    async fn home_client_is_not_cached() {
        let (registry, _) = registry();
        assert_eq!(registry.home_region().as_str(), "eu-central-1");
        assert_eq!(registry.cached_regions().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_use_keeps_one_client() {
        let (registry, _) = registry();
        let registry = Arc::new(registry);
        let region = Region::new("us-east-1");

        let handles = (0..16).map(|_| {
            let registry = registry.clone();
            let region = region.clone();
            tokio::spawn(async move { registry.client_for_region(&region).await })
        });
        let clients: Vec<_> = join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert!(clients.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.cached_regions().await, 1);
    }
}
