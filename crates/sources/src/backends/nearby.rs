//! Nearby-store scan over the store index using the distance calculator.

use crate::backends::run_blocking;
use crate::collaborators::{CollaboratorError, LocationService, NearbyStore};
use crate::types::StoreAttributes;
use async_trait::async_trait;
use rayon::prelude::*;
use std::sync::Arc;
use store_data::geo::distance_meters;
use store_data::{Coordinates, Store, StoreIndex};
use tracing::debug;

/// Location service backed by a shared [`StoreIndex`]
#[derive(Clone)]
pub struct NearbyStores {
    index: Arc<StoreIndex>,
}

impl NearbyStores {
    pub fn new(index: Arc<StoreIndex>) -> Self {
        Self { index }
    }

    /// All stores within `radius_meters` of `at`, closest first.
    pub fn compute(&self, at: Coordinates, radius_meters: f64) -> Vec<NearbyStore> {
        let stores: Vec<&Store> = self.index.stores().collect();
        let mut nearby: Vec<NearbyStore> = stores
            .par_iter()
            .filter_map(|store| {
                let distance = distance_meters(at, store.coordinates);
                (distance <= radius_meters).then(|| NearbyStore {
                    store_id: store.id,
                    distance_meters: distance,
                    attributes: StoreAttributes::from_store(store, self.index.get_store_stats(store.id)),
                })
            })
            .collect();

        nearby.sort_by(|a, b| {
            a.distance_meters
                .total_cmp(&b.distance_meters)
                .then_with(|| a.store_id.cmp(&b.store_id))
        });
        debug!("{} stores within {}m", nearby.len(), radius_meters);
        nearby
    }
}

#[async_trait]
impl LocationService for NearbyStores {
    async fn nearby(
        &self,
        at: Coordinates,
        radius_meters: f64,
    ) -> Result<Vec<NearbyStore>, CollaboratorError> {
        if !at.is_valid() {
            return Err(CollaboratorError::InvalidResponse(format!(
                "invalid coordinate {at:?}"
            )));
        }
        let source = self.clone();
        run_blocking(move || source.compute(at, radius_meters)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_support::store;
    use store_data::FoodCategory;

    #[test]
    fn test_radius_and_order() {
        let mut index = StoreIndex::new();
        // ~111m per 0.001 degree of latitude
        index.insert_store(store(1, FoodCategory::Korean, 37.510, 127.0));
        index.insert_store(store(2, FoodCategory::Cafe, 37.501, 127.0));
        index.insert_store(store(3, FoodCategory::Cafe, 37.600, 127.0));
        let source = NearbyStores::new(Arc::new(index));

        let nearby = source.compute(Coordinates::new(37.5, 127.0), 3_000.0);
        let ids: Vec<_> = nearby.iter().map(|s| s.store_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!((nearby[0].distance_meters - 111.0).abs() < 2.0);
    }

    #[tokio::test]
    async fn test_invalid_coordinate() {
        let source = NearbyStores::new(Arc::new(StoreIndex::new()));
        let result = source.nearby(Coordinates::new(120.0, 0.0), 1_000.0).await;
        assert!(result.is_err());
    }
}
