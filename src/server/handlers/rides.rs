use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::DynAPI;
use crate::auth::User;
use crate::entities::{Coordinates, Proximity, Ride, RideRequest, RideStatus};
use crate::error::Error;
use crate::server::extractors::{RideId, ValidJson, ValidQuery};

#[derive(Serialize, Deserialize)]
pub struct AdvanceParams {
    status: RideStatus,
}

#[derive(Serialize, Deserialize)]
pub struct AvailableParams {
    lat: Option<f64>,
    lng: Option<f64>,
    radius_m: Option<f64>,
}

impl AvailableParams {
    fn proximity(&self) -> Result<Option<Proximity>, Error> {
        match (self.lat, self.lng, self.radius_m) {
            (None, None, None) => Ok(None),
            (Some(lat), Some(lng), Some(radius_m)) => Ok(Some(Proximity {
                center: Coordinates { lat, lng },
                radius_m,
            })),
            _ => Err(Error::validation(
                "lat, lng and radius_m must be given together",
            )),
        }
    }
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    user: User,
    ValidJson(params): ValidJson<RideRequest>,
) -> Result<Json<Ride>, Error> {
    let ride = api.create_ride(user, params).await?;

    Ok(ride.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    user: User,
    RideId(id): RideId,
) -> Result<Json<Ride>, Error> {
    let ride = api.find_ride(user, id).await?;

    Ok(ride.into())
}

pub async fn list_mine(
    Extension(api): Extension<DynAPI>,
    user: User,
) -> Result<Json<Vec<Ride>>, Error> {
    let rides = api.rides_for_user(user).await?;

    Ok(rides.into())
}

pub async fn available(
    Extension(api): Extension<DynAPI>,
    user: User,
    ValidQuery(params): ValidQuery<AvailableParams>,
) -> Result<Json<Vec<Ride>>, Error> {
    let rides = api.available_rides(user, params.proximity()?).await?;

    Ok(rides.into())
}

pub async fn accept(
    Extension(api): Extension<DynAPI>,
    user: User,
    RideId(id): RideId,
) -> Result<Json<Ride>, Error> {
    let ride = api.accept_ride(user, id).await?;

    Ok(ride.into())
}

pub async fn advance(
    Extension(api): Extension<DynAPI>,
    user: User,
    RideId(id): RideId,
    ValidJson(params): ValidJson<AdvanceParams>,
) -> Result<Json<Ride>, Error> {
    let ride = api.advance_ride(user, id, params.status).await?;

    Ok(ride.into())
}

pub async fn cancel(
    Extension(api): Extension<DynAPI>,
    user: User,
    RideId(id): RideId,
) -> Result<Json<Ride>, Error> {
    let ride = api.cancel_ride(user, id).await?;

    Ok(ride.into())
}
