use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{Proximity, Ride, RideRequest, RideStatus};
use crate::error::Error;

/// Operations that move a ride through its lifecycle.
#[async_trait]
pub trait RideAPI {
    async fn create_ride(&self, user: User, request: RideRequest) -> Result<Ride, Error>;

    /// Claims a pending ride for the calling driver. A ride that has already
    /// been claimed yields `Error::Conflict`; callers should re-query
    /// availability rather than retry.
    async fn accept_ride(&self, user: User, id: Uuid) -> Result<Ride, Error>;

    async fn advance_ride(&self, user: User, id: Uuid, target: RideStatus)
        -> Result<Ride, Error>;

    async fn cancel_ride(&self, user: User, id: Uuid) -> Result<Ride, Error>;
}

#[async_trait]
pub trait RideQueryAPI {
    async fn find_ride(&self, user: User, id: Uuid) -> Result<Ride, Error>;

    async fn available_rides(
        &self,
        user: User,
        proximity: Option<Proximity>,
    ) -> Result<Vec<Ride>, Error>;

    async fn rides_for_user(&self, user: User) -> Result<Vec<Ride>, Error>;
}

pub trait API: RideAPI + RideQueryAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
