pub mod api;
pub mod cli;
pub mod config;
pub mod guard;
pub mod model;
pub mod query;
pub mod session;
pub mod validation;

use std::sync::Arc;

use api::ApiClient;
use config::Config;
use guard::RouteGuard;
use query::QueryCache;
use session::{storage::SessionStorage, SessionStore};

/// Wired application state: the API client, the query cache on top of it,
/// and the session store holding explicit references to both. Constructed
/// once at startup and passed by reference to consumers.
pub struct AppContext {
    pub config: Config,
    pub api: Arc<ApiClient>,
    pub queries: Arc<QueryCache>,
    pub session: SessionStore,
}

impl AppContext {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let api = Arc::new(ApiClient::new(&config.api)?);
        let queries = Arc::new(QueryCache::new(api.clone(), &config.cache));
        let storage = SessionStorage::new(config.storage.data_dir.clone());
        let session = SessionStore::new(api.clone(), queries.clone(), storage);

        Ok(Self {
            config,
            api,
            queries,
            session,
        })
    }

    /// A fresh guard over the session's auth state.
    pub fn guard(&self) -> RouteGuard {
        RouteGuard::new(self.session.subscribe())
    }

    /// Interface-reactivation hook: mark cached data stale so the next reads
    /// serve-then-refresh, when configured to do so.
    pub fn on_activity(&self) {
        if self.config.cache.refresh_on_activity {
            self.queries.mark_all_stale();
        }
    }
}
