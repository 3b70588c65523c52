use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{newest_first, RideStore};
use crate::entities::{Proximity, Ride};
use crate::error::Error;

/// In-process ride store. The map lock is held across each read-modify-write,
/// which gives the same first-writer-wins behaviour as row locks in Postgres.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rides: Mutex<HashMap<Uuid, Ride>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<Ride> {
        let mut rides: Vec<Ride> = self.rides.lock().await.values().cloned().collect();
        newest_first(&mut rides);
        rides
    }
}

#[async_trait]
impl RideStore for MemoryStore {
    async fn insert(&self, ride: &Ride) -> Result<(), Error> {
        self.rides.lock().await.insert(ride.id, ride.clone());

        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Ride, Error> {
        self.rides
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    async fn find_available(&self, proximity: Option<Proximity>) -> Result<Vec<Ride>, Error> {
        let mut rides: Vec<Ride> = self
            .rides
            .lock()
            .await
            .values()
            .filter(|ride| ride.is_available())
            .filter(|ride| match &proximity {
                Some(proximity) => proximity.contains(&ride.pickup.coordinates),
                None => true,
            })
            .cloned()
            .collect();

        newest_first(&mut rides);

        Ok(rides)
    }

    async fn find_by_participant(&self, user_id: Uuid) -> Result<Vec<Ride>, Error> {
        let mut rides: Vec<Ride> = self
            .rides
            .lock()
            .await
            .values()
            .filter(|ride| ride.party_of(user_id).is_some())
            .cloned()
            .collect();

        newest_first(&mut rides);

        Ok(rides)
    }

    async fn update<F>(&self, id: Uuid, f: F) -> Result<Ride, Error>
    where
        F: FnOnce(&mut Ride) -> Result<(), Error> + Send,
    {
        let mut rides = self.rides.lock().await;

        let mut ride = rides.get(&id).cloned().ok_or(Error::NotFound)?;
        f(&mut ride)?;

        rides.insert(id, ride.clone());

        Ok(ride)
    }
}
