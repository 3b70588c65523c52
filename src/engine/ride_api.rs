use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::RideAPI,
    auth::{Platform, User},
    db::RideStore,
    entities::{Party, Ride, RideRequest, RideStatus},
    error::Error,
};

#[async_trait]
impl<S: RideStore> RideAPI for Engine<S> {
    #[tracing::instrument(skip(self, request))]
    async fn create_ride(&self, user: User, request: RideRequest) -> Result<Ride, Error> {
        self.authorize(user.clone(), "create_ride", Platform::default())?;

        let ride = Ride::new(user.id, request)?;

        self.store.insert(&ride).await?;

        tracing::info!(ride_id = %ride.id, "ride requested");

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn accept_ride(&self, user: User, id: Uuid) -> Result<Ride, Error> {
        let ride = self
            .store
            .update(id, |ride| {
                self.authorize(user.clone(), "accept", ride.clone())?;
                ride.accept(user.id)
            })
            .await?;

        tracing::info!(ride_id = %ride.id, driver_id = %user.id, "ride accepted");

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn advance_ride(
        &self,
        user: User,
        id: Uuid,
        target: RideStatus,
    ) -> Result<Ride, Error> {
        let ride = self
            .store
            .update(id, |ride| {
                self.authorize(user.clone(), "advance", ride.clone())?;
                ride.advance(target)
            })
            .await?;

        tracing::info!(ride_id = %ride.id, status = %ride.status, "ride advanced");

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_ride(&self, user: User, id: Uuid) -> Result<Ride, Error> {
        let ride = self
            .store
            .update(id, |ride| {
                self.authorize(user.clone(), "cancel", ride.clone())?;

                // anyone authorized who is not a participant is an admin
                let party = ride.party_of(user.id).unwrap_or(Party::Admin);
                ride.cancel(party)
            })
            .await?;

        tracing::info!(ride_id = %ride.id, cancelled_by = ?ride.cancelled_by, "ride cancelled");

        Ok(ride)
    }
}
