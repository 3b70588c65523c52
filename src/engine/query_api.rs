use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::RideQueryAPI,
    auth::{Platform, User},
    db::RideStore,
    entities::{Proximity, Ride},
    error::Error,
};

#[async_trait]
impl<S: RideStore> RideQueryAPI for Engine<S> {
    #[tracing::instrument(skip(self))]
    async fn find_ride(&self, user: User, id: Uuid) -> Result<Ride, Error> {
        let ride = self.store.find(id).await?;

        self.authorize(user.clone(), "read", ride.clone())?;

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn available_rides(
        &self,
        user: User,
        proximity: Option<Proximity>,
    ) -> Result<Vec<Ride>, Error> {
        self.authorize(user.clone(), "list_available_rides", Platform::default())?;

        if let Some(proximity) = &proximity {
            proximity.validate()?;
        }

        let rides = self.store.find_available(proximity).await?;

        tracing::debug!(count = rides.len(), "fetched available rides");

        Ok(rides)
    }

    #[tracing::instrument(skip(self))]
    async fn rides_for_user(&self, user: User) -> Result<Vec<Ride>, Error> {
        self.store.find_by_participant(user.id).await
    }
}
