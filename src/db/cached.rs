use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::RideStore;
use crate::entities::{Proximity, Ride};
use crate::error::Error;

/// Read-through cache in front of another store.
///
/// Only terminal rides are ever cached: they can no longer change, so a cached
/// copy is always identical to the stored row no matter which process wrote
/// it. Live rides, list queries and all writes go straight to the inner store.
pub struct CachedStore<S> {
    inner: S,
    capacity: usize,
    terminal_rides: Mutex<HashMap<Uuid, Ride>>,
}

impl<S: RideStore> CachedStore<S> {
    pub fn new(inner: S, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            terminal_rides: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub async fn cached_len(&self) -> usize {
        self.terminal_rides.lock().await.len()
    }

    async fn remember(&self, ride: &Ride) {
        if !ride.is_terminal() {
            return;
        }

        let mut cache = self.terminal_rides.lock().await;
        if cache.len() < self.capacity {
            cache.insert(ride.id, ride.clone());
        }
    }
}

#[async_trait]
impl<S: RideStore> RideStore for CachedStore<S> {
    async fn insert(&self, ride: &Ride) -> Result<(), Error> {
        self.inner.insert(ride).await
    }

    async fn find(&self, id: Uuid) -> Result<Ride, Error> {
        if let Some(ride) = self.terminal_rides.lock().await.get(&id) {
            tracing::debug!(ride_id = %id, "serving terminal ride from cache");
            return Ok(ride.clone());
        }

        let ride = self.inner.find(id).await?;
        self.remember(&ride).await;

        Ok(ride)
    }

    async fn find_available(&self, proximity: Option<Proximity>) -> Result<Vec<Ride>, Error> {
        self.inner.find_available(proximity).await
    }

    async fn find_by_participant(&self, user_id: Uuid) -> Result<Vec<Ride>, Error> {
        self.inner.find_by_participant(user_id).await
    }

    async fn update<F>(&self, id: Uuid, f: F) -> Result<Ride, Error>
    where
        F: FnOnce(&mut Ride) -> Result<(), Error> + Send,
    {
        let ride = self.inner.update(id, f).await?;
        self.remember(&ride).await;

        Ok(ride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::entities::{Party, PlaceInput, RideRequest};

    fn ride() -> Ride {
        let request = RideRequest {
            pickup: PlaceInput::new("A", 1.0, 1.0),
            dropoff: PlaceInput::new("B", 1.1, 1.1),
            price: Some(5.0),
        };

        Ride::new(Uuid::new_v4(), request).unwrap()
    }

    #[tokio::test]
    async fn caches_only_terminal_rides() {
        let store = CachedStore::new(MemoryStore::new(), 16);
        let ride = ride();
        store.insert(&ride).await.unwrap();

        store.find(ride.id).await.unwrap();
        assert_eq!(store.cached_len().await, 0);

        store
            .update(ride.id, |ride| ride.cancel(Party::Passenger))
            .await
            .unwrap();
        assert_eq!(store.cached_len().await, 1);

        let cached = store.find(ride.id).await.unwrap();
        assert_eq!(cached, store.inner().find(ride.id).await.unwrap());
    }

    #[tokio::test]
    async fn zero_capacity_disables_caching() {
        let store = CachedStore::new(MemoryStore::new(), 0);
        let ride = ride();
        store.insert(&ride).await.unwrap();

        store
            .update(ride.id, |ride| ride.cancel(Party::Admin))
            .await
            .unwrap();
        store.find(ride.id).await.unwrap();

        assert_eq!(store.cached_len().await, 0);
    }

    #[tokio::test]
    async fn failed_updates_are_not_cached() {
        let store = CachedStore::new(MemoryStore::new(), 16);
        let ride = ride();
        store.insert(&ride).await.unwrap();

        let result = store.update(ride.id, |_| Err(Error::Forbidden)).await;

        assert!(matches!(result, Err(Error::Forbidden)));
        assert_eq!(store.cached_len().await, 0);
    }
}
