use std::fmt;

use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Coordinates, Location};
use crate::error::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    pub id: Uuid,
    pub pickup: Location,
    pub dropoff: Location,
    pub price: f64,
    pub status: RideStatus,
    pub passenger_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub cancelled_by: Option<Party>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

/// Who moved a ride to `Cancelled`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Passenger,
    Driver,
    Admin,
}

/// Ride request as submitted by a passenger, before validation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RideRequest {
    pub pickup: PlaceInput,
    pub dropoff: PlaceInput,
    pub price: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaceInput {
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl PlaceInput {
    pub fn new(address: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            address: address.into(),
            lat: Some(lat),
            lng: Some(lng),
        }
    }

    fn into_location(self, field: &str) -> Result<Location, Error> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(Error::validation(format!("{} address is required", field)));
        }

        let (lat, lng) = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => {
                return Err(Error::validation(format!(
                    "{} coordinates are required",
                    field
                )))
            }
        };

        let coordinates = Coordinates { lat, lng };
        coordinates
            .validate()
            .map_err(|err| Error::validation(format!("{} {}", field, err)))?;

        Ok(Location::new(coordinates, address.to_string()))
    }
}

impl RideStatus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// The state `advance` may move to from here. Leaving `Pending` happens
    /// only through `accept`, so it has no successor.
    pub fn successor(&self) -> Option<RideStatus> {
        match self {
            Self::Accepted => Some(Self::InProgress),
            Self::InProgress => Some(Self::Completed),
            Self::Pending | Self::Completed | Self::Cancelled => None,
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Ride {
    pub fn new(passenger_id: Uuid, request: RideRequest) -> Result<Self, Error> {
        let pickup = request.pickup.into_location("pickup")?;
        let dropoff = request.dropoff.into_location("dropoff")?;

        let price = request
            .price
            .ok_or_else(|| Error::validation("price is required"))?;
        if !price.is_finite() || price < 0.0 {
            return Err(Error::validation("price must be a non-negative number"));
        }

        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            pickup,
            dropoff,
            price,
            status: RideStatus::Pending,
            passenger_id,
            driver_id: None,
            cancelled_by: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_available(&self) -> bool {
        self.status == RideStatus::Pending && self.driver_id.is_none()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn party_of(&self, user_id: Uuid) -> Option<Party> {
        if self.passenger_id == user_id {
            return Some(Party::Passenger);
        }

        if self.driver_id == Some(user_id) {
            return Some(Party::Driver);
        }

        None
    }

    #[tracing::instrument(skip(self), fields(ride_id = %self.id, status = %self.status))]
    pub fn accept(&mut self, driver_id: Uuid) -> Result<(), Error> {
        if !self.is_available() {
            tracing::info!("ride is no longer pending, rejecting claim");
            return Err(Error::Conflict);
        }

        self.driver_id = Some(driver_id);
        self.transition(RideStatus::Accepted);

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(ride_id = %self.id, status = %self.status))]
    pub fn advance(&mut self, target: RideStatus) -> Result<(), Error> {
        match self.status.successor() {
            Some(next) if next == target => {
                self.transition(target);
                Ok(())
            }
            _ => Err(Error::InvalidTransition {
                from: self.status,
                to: target,
            }),
        }
    }

    #[tracing::instrument(skip(self), fields(ride_id = %self.id, status = %self.status))]
    pub fn cancel(&mut self, by: Party) -> Result<(), Error> {
        if self.is_terminal() {
            return Err(Error::InvalidTransition {
                from: self.status,
                to: RideStatus::Cancelled,
            });
        }

        self.cancelled_by = Some(by);
        self.transition(RideStatus::Cancelled);

        Ok(())
    }

    fn transition(&mut self, status: RideStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

impl PolarClass for Ride {
    fn get_polar_class_builder() -> oso::ClassBuilder<Ride> {
        oso::Class::builder()
            .name("Ride")
            .add_attribute_getter("id", |recv: &Ride| recv.id)
            .add_attribute_getter("passenger_id", |recv: &Ride| recv.passenger_id)
            .add_attribute_getter("driver_id", |recv: &Ride| recv.driver_id)
            .add_attribute_getter("status", |recv: &Ride| recv.status.name().to_string())
            .add_method("is_available", Ride::is_available)
    }

    fn get_polar_class() -> oso::Class {
        let builder = Ride::get_polar_class_builder();
        builder.build()
    }
}
