mod location;
mod ride;

pub use location::{Coordinates, Location, Proximity};
pub use ride::{Party, PlaceInput, Ride, RideRequest, RideStatus};
