mod cached;
mod memory;
mod postgres;

pub use cached::CachedStore;
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{Proximity, Ride};
use crate::error::Error;

/// Persistence for rides. Implementations must run `update` as a single
/// atomic read-modify-write: concurrent updates of the same ride are
/// serialized, and nothing is written when the closure fails.
#[async_trait]
pub trait RideStore: Send + Sync {
    async fn insert(&self, ride: &Ride) -> Result<(), Error>;

    async fn find(&self, id: Uuid) -> Result<Ride, Error>;

    /// Pending rides without a driver, newest first.
    async fn find_available(&self, proximity: Option<Proximity>) -> Result<Vec<Ride>, Error>;

    /// Rides where the user is either the passenger or the driver, newest first.
    async fn find_by_participant(&self, user_id: Uuid) -> Result<Vec<Ride>, Error>;

    async fn update<F>(&self, id: Uuid, f: F) -> Result<Ride, Error>
    where
        F: FnOnce(&mut Ride) -> Result<(), Error> + Send;
}

fn newest_first(rides: &mut [Ride]) {
    rides.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
