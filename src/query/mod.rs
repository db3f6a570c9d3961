//! Cached access to the Motorista API.
//!
//! All reads of driver and vehicle-type data go through here so identical
//! concurrent requests collapse into one network call and views stay
//! consistent after mutations. Keys are explicit normalized tuples, never
//! structural equality of ad-hoc parameter objects. Mutations are
//! pass-through: they are never cached, and on success they invalidate the
//! affected read keys before returning, so a read issued after a completed
//! write always refetches.

mod cache;

use cache::CacheMap;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiClient, ApiError};
use crate::config::CacheConfig;
use crate::model::{
    CreateDriverRequest, Driver, DriverFilter, Page, SortSpec, TipoVeiculo, UpdateDriverRequest,
    VehicleType,
};

/// Normalized cache key for one page of the driver list.
///
/// Blank filter fields collapse to `None` and the vehicle-type set is sorted
/// and deduplicated, so two filters that mean the same thing always land on
/// the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListKey {
    texto: Option<String>,
    uf: Option<String>,
    cidade: Option<String>,
    tipos: Vec<TipoVeiculo>,
    page: u32,
    size: u32,
    sort: String,
}

fn normalize_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ListKey {
    pub fn new(filter: &DriverFilter, page: u32, size: u32, sort: &SortSpec) -> Self {
        let mut tipos = filter.tipos_veiculo.clone().unwrap_or_default();
        tipos.sort();
        tipos.dedup();

        Self {
            texto: normalize_text(&filter.texto),
            uf: normalize_text(&filter.uf).map(|s| s.to_uppercase()),
            cidade: normalize_text(&filter.cidade),
            tipos,
            page,
            size,
            sort: sort.to_query(),
        }
    }

    /// The filter actually sent over the wire, rebuilt from the normalized
    /// key so the request and the cache key can never disagree.
    fn to_filter(&self) -> DriverFilter {
        DriverFilter {
            texto: self.texto.clone(),
            uf: self.uf.clone(),
            cidade: self.cidade.clone(),
            tipos_veiculo: if self.tipos.is_empty() {
                None
            } else {
                Some(self.tipos.clone())
            },
        }
    }
}

/// Request-deduplicating, invalidating cache over the API client.
pub struct QueryCache {
    api: Arc<ApiClient>,
    lists: Arc<CacheMap<ListKey, Page<Driver>>>,
    drivers: Arc<CacheMap<String, Driver>>,
    vehicle_types: Arc<CacheMap<(), Vec<VehicleType>>>,
}

impl QueryCache {
    pub fn new(api: Arc<ApiClient>, config: &CacheConfig) -> Self {
        let driver_ttl = Duration::from_secs(config.driver_ttl_seconds);
        let catalog_ttl = Duration::from_secs(config.catalog_ttl_seconds);
        Self {
            api,
            lists: Arc::new(CacheMap::new("motoristas", driver_ttl)),
            drivers: Arc::new(CacheMap::new("motorista", driver_ttl)),
            vehicle_types: Arc::new(CacheMap::new("vehicle-types", catalog_ttl)),
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// One page of the driver list for the given criteria.
    pub async fn list_drivers(
        &self,
        filter: &DriverFilter,
        page: u32,
        size: u32,
        sort: &SortSpec,
    ) -> Result<Page<Driver>, ApiError> {
        let key = ListKey::new(filter, page, size, sort);
        let api = self.api.clone();
        let request_filter = key.to_filter();
        let sort = sort.clone();
        self.lists
            .get_or_fetch(key, move || {
                let api = api.clone();
                let filter = request_filter.clone();
                let sort = sort.clone();
                async move { api.search_drivers(&filter, page, size, &sort).await }
            })
            .await
    }

    /// A single driver by id.
    pub async fn get_driver(&self, id: &str) -> Result<Driver, ApiError> {
        let api = self.api.clone();
        let id_owned = id.to_string();
        self.drivers
            .get_or_fetch(id.to_string(), move || {
                let api = api.clone();
                let id = id_owned.clone();
                async move { api.get_driver(&id).await }
            })
            .await
    }

    /// The vehicle-type catalog. Changes rarely, so it lives under the long
    /// staleness window.
    pub async fn vehicle_types(&self) -> Result<Vec<VehicleType>, ApiError> {
        let api = self.api.clone();
        self.vehicle_types
            .get_or_fetch((), move || {
                let api = api.clone();
                async move { api.vehicle_types().await }
            })
            .await
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Create a driver and invalidate every cached list page.
    pub async fn create_driver(&self, payload: &CreateDriverRequest) -> Result<Driver, ApiError> {
        let driver = self.api.create_driver(payload).await?;
        self.lists.invalidate_all();
        tracing::info!(id = %driver.id, "motorista created, list cache invalidated");
        Ok(driver)
    }

    /// Update a driver; invalidates the list pages and that driver's entry.
    pub async fn update_driver(
        &self,
        id: &str,
        payload: &UpdateDriverRequest,
    ) -> Result<Driver, ApiError> {
        let driver = self.api.update_driver(id, payload).await?;
        self.lists.invalidate_all();
        self.drivers.invalidate(&id.to_string());
        tracing::info!(id = %driver.id, "motorista updated, caches invalidated");
        Ok(driver)
    }

    /// Delete a driver and invalidate every cached list page.
    pub async fn delete_driver(&self, id: &str) -> Result<(), ApiError> {
        self.api.delete_driver(id).await?;
        self.lists.invalidate_all();
        tracing::info!(id, "motorista deleted, list cache invalidated");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Purge every cached entry across all keys. Called on logout/teardown
    /// so no data leaks into a differently-authenticated session.
    pub fn clear(&self) {
        self.lists.clear();
        self.drivers.clear();
        self.vehicle_types.clear();
        tracing::debug!("query cache cleared");
    }

    /// Mark everything stale without dropping it: the next read serves the
    /// cached value and refreshes in the background. Hook for interface
    /// reactivation events.
    pub fn mark_all_stale(&self) {
        self.lists.mark_all_stale();
        self.drivers.mark_all_stale();
        self.vehicle_types.mark_all_stale();
    }

    /// Number of cached entries across all maps (for monitoring and tests).
    pub fn cached_entries(&self) -> usize {
        self.lists.len() + self.drivers.len() + self.vehicle_types.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SortDirection;

    fn sort() -> SortSpec {
        SortSpec::default()
    }

    #[test]
    fn test_blank_filter_fields_normalize_to_absent() {
        let noisy = DriverFilter {
            texto: Some("  ".into()),
            uf: Some("".into()),
            cidade: Some(" Santos ".into()),
            tipos_veiculo: None,
        };
        let clean = DriverFilter {
            texto: None,
            uf: None,
            cidade: Some("Santos".into()),
            tipos_veiculo: None,
        };
        assert_eq!(
            ListKey::new(&noisy, 0, 10, &sort()),
            ListKey::new(&clean, 0, 10, &sort())
        );
    }

    #[test]
    fn test_vehicle_type_order_does_not_split_keys() {
        let a = DriverFilter {
            tipos_veiculo: Some(vec![TipoVeiculo::Bau, TipoVeiculo::Van, TipoVeiculo::Bau]),
            ..Default::default()
        };
        let b = DriverFilter {
            tipos_veiculo: Some(vec![TipoVeiculo::Van, TipoVeiculo::Bau]),
            ..Default::default()
        };
        assert_eq!(ListKey::new(&a, 0, 10, &sort()), ListKey::new(&b, 0, 10, &sort()));
    }

    #[test]
    fn test_uf_case_is_normalized() {
        let lower = DriverFilter {
            uf: Some("sp".into()),
            ..Default::default()
        };
        let upper = DriverFilter {
            uf: Some("SP".into()),
            ..Default::default()
        };
        assert_eq!(
            ListKey::new(&lower, 0, 10, &sort()),
            ListKey::new(&upper, 0, 10, &sort())
        );
    }

    #[test]
    fn test_pagination_and_sort_split_keys() {
        let filter = DriverFilter::default();
        let base = ListKey::new(&filter, 0, 10, &sort());
        assert_ne!(base, ListKey::new(&filter, 1, 10, &sort()));
        assert_ne!(base, ListKey::new(&filter, 0, 20, &sort()));
        assert_ne!(
            base,
            ListKey::new(&filter, 0, 10, &SortSpec::new("nome", SortDirection::Desc))
        );
    }

    #[test]
    fn test_key_rebuilds_normalized_filter() {
        let filter = DriverFilter {
            texto: Some(" ana ".into()),
            uf: Some("rj".into()),
            cidade: None,
            tipos_veiculo: Some(vec![]),
        };
        let rebuilt = ListKey::new(&filter, 0, 10, &sort()).to_filter();
        assert_eq!(rebuilt.texto.as_deref(), Some("ana"));
        assert_eq!(rebuilt.uf.as_deref(), Some("RJ"));
        assert!(rebuilt.cidade.is_none());
        assert!(rebuilt.tipos_veiculo.is_none());
    }
}
