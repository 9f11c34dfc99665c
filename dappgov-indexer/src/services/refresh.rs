//! Coalescing of concurrent refreshes

use alloy_primitives::Address;
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::{GovernanceService, GovernanceSnapshot};
use crate::core::{ChainReader, IndexerError};

pub type SharedRefreshResult = Result<Arc<GovernanceSnapshot>, Arc<IndexerError>>;

type RefreshFuture = BoxFuture<'static, SharedRefreshResult>;

/// Identity of a refresh: requests with the same key share one computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshKey {
    pub chain_id: u64,
    pub account: Option<Address>,
}

/// Weak handle to a running refresh. Once every caller has dropped its
/// future the handle no longer upgrades, so an abandoned scan is never resumed.
struct InFlight {
    generation: u64,
    refresh: WeakShared<RefreshFuture>,
}

type InFlightMap = Arc<Mutex<HashMap<RefreshKey, InFlight>>>;

/// Runs refreshes so that overlapping requests for the same chain and account
/// join the scan already in flight instead of starting another one.
pub struct RefreshCoordinator<C: ChainReader + ?Sized + 'static> {
    service: Arc<GovernanceService<C>>,
    in_flight: InFlightMap,
    next_generation: AtomicU64,
}

impl<C: ChainReader + ?Sized + 'static> RefreshCoordinator<C> {
    pub fn new(service: Arc<GovernanceService<C>>) -> Self {
        Self {
            service,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    pub async fn refresh(&self, account: Option<Address>) -> SharedRefreshResult {
        let key = RefreshKey {
            chain_id: self.service.network().chain_id,
            account,
        };

        let refresh: Shared<RefreshFuture> = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(&key).and_then(|entry| entry.refresh.upgrade()) {
                Some(existing) => {
                    debug!(?key, "joining in-flight refresh");
                    existing
                }
                None => {
                    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                    let refresh = self.start(key, generation);
                    if let Some(weak) = refresh.downgrade() {
                        in_flight.insert(key, InFlight { generation, refresh: weak });
                    }
                    refresh
                }
            }
        };

        refresh.await
    }

    /// The shared scan removes its own map entry when it completes
    fn start(&self, key: RefreshKey, generation: u64) -> Shared<RefreshFuture> {
        let service = self.service.clone();
        let in_flight = self.in_flight.clone();
        async move {
            let result = service
                .refresh(key.account)
                .await
                .map(Arc::new)
                .map_err(Arc::new);
            let mut in_flight = in_flight.lock().await;
            if in_flight.get(&key).is_some_and(|entry| entry.generation == generation) {
                in_flight.remove(&key);
            }
            result
        }
        .boxed()
        .shared()
    }
}
