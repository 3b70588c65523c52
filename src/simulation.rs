//! Demo traffic generator.
//!
//! Passengers request rides scattered around a city center and occasionally
//! give up on them; drivers keep polling availability, race each other to
//! claim rides and drive the ones they win to completion. Every outcome is
//! reported over a channel to a collector that tallies the run.

use std::time::Duration;

use async_channel::{Receiver, Sender};
use futures::future::join_all;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Bernoulli, Distribution, Normal, Uniform};
use serde::Serialize;

use crate::api::DynAPI;
use crate::auth::User;
use crate::entities::{Coordinates, PlaceInput, RideRequest, RideStatus};
use crate::error::Error;

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub passengers: usize,
    pub rides_per_passenger: usize,
    pub drivers: usize,
    pub center: Coordinates,
    /// Standard deviation of pickup/dropoff scatter, in degrees.
    pub spread: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Probability that a passenger cancels a ride right after requesting it.
    pub cancel_probability: f64,
    /// How long drivers keep polling after the last ride was requested.
    pub idle_timeout: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            passengers: 10,
            rides_per_passenger: 3,
            drivers: 5,
            center: Coordinates {
                lat: 6.9271,
                lng: 79.8612,
            },
            spread: 0.02,
            min_price: 5.0,
            max_price: 40.0,
            cancel_probability: 0.1,
            idle_timeout: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub created: usize,
    pub accepted: usize,
    pub conflicts: usize,
    pub completed: usize,
    pub cancelled: usize,
}

#[derive(Debug)]
enum Event {
    Created,
    Accepted,
    Conflict,
    Completed,
    Cancelled,
}

#[tracing::instrument(skip(api))]
pub async fn run(api: DynAPI, config: SimulationConfig) -> Result<Report, Error> {
    if !config.min_price.is_finite()
        || !config.max_price.is_finite()
        || config.min_price < 0.0
        || config.min_price > config.max_price
    {
        return Err(Error::validation("price range is invalid"));
    }
    let scatter = Normal::new(0.0, config.spread)
        .map_err(|_| Error::validation("spread must be a finite, non-negative number"))?;
    let cancel = Bernoulli::new(config.cancel_probability)
        .map_err(|_| Error::validation("cancel probability must be between 0 and 1"))?;

    let (events, received) = async_channel::unbounded();
    let collector = tokio::spawn(collect(received));

    let passengers = (0..config.passengers).map(|_| {
        let api = api.clone();
        let events = events.clone();
        let config = config.clone();

        tokio::spawn(async move { passenger(api, events, config, scatter, cancel).await })
    });
    let passengers = join_all(passengers);

    // drivers stop once passengers are done and nothing has been claimable
    // for a while
    let (done_tx, done_rx) = async_channel::bounded::<()>(1);
    let drivers = join_all((0..config.drivers).map(|_| {
        let api = api.clone();
        let events = events.clone();
        let done = done_rx.clone();
        let idle_timeout = config.idle_timeout;

        tokio::spawn(async move { driver(api, events, done, idle_timeout).await })
    }));

    let (passenger_results, driver_results) = futures::join!(
        async {
            let results = passengers.await;
            done_tx.close();
            results
        },
        drivers
    );

    drop(events);

    for result in passenger_results.into_iter().chain(driver_results) {
        match result {
            Ok(outcome) => outcome?,
            Err(err) => return Err(Error::Server(format!("simulation task failed: {}", err))),
        }
    }

    collector
        .await
        .map_err(|err| Error::Server(format!("simulation collector failed: {}", err)))
}

async fn collect(events: Receiver<Event>) -> Report {
    let mut report = Report::default();

    while let Ok(event) = events.recv().await {
        match event {
            Event::Created => report.created += 1,
            Event::Accepted => report.accepted += 1,
            Event::Conflict => report.conflicts += 1,
            Event::Completed => report.completed += 1,
            Event::Cancelled => report.cancelled += 1,
        }
    }

    tracing::info!(?report, "simulation finished");

    report
}

fn place(center: &Coordinates, scatter: &Normal<f64>, label: String) -> PlaceInput {
    let mut rng = rand::thread_rng();
    let lat = (center.lat + scatter.sample(&mut rng)).clamp(-90.0, 90.0);
    let lng = (center.lng + scatter.sample(&mut rng)).clamp(-180.0, 180.0);

    PlaceInput::new(label, lat, lng)
}

async fn passenger(
    api: DynAPI,
    events: Sender<Event>,
    config: SimulationConfig,
    scatter: Normal<f64>,
    cancel: Bernoulli,
) -> Result<(), Error> {
    let user = User::passenger();
    let prices = Uniform::new_inclusive(config.min_price, config.max_price);

    for n in 0..config.rides_per_passenger {
        let (request, should_cancel) = {
            let mut rng = rand::thread_rng();
            let price = (rng.sample(prices) * 100.0).round() / 100.0;

            let request = RideRequest {
                pickup: place(&config.center, &scatter, format!("pickup #{}", n)),
                dropoff: place(&config.center, &scatter, format!("dropoff #{}", n)),
                price: Some(price),
            };

            (request, cancel.sample(&mut rng))
        };

        let ride = api.create_ride(user.clone(), request).await?;
        events.send(Event::Created).await.ok();

        if should_cancel {
            match api.cancel_ride(user.clone(), ride.id).await {
                Ok(_) => {
                    events.send(Event::Cancelled).await.ok();
                }
                // a driver got there first and may already have finished
                Err(Error::InvalidTransition { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        tokio::task::yield_now().await;
    }

    Ok(())
}

async fn driver(
    api: DynAPI,
    events: Sender<Event>,
    done: Receiver<()>,
    idle_timeout: Duration,
) -> Result<(), Error> {
    let user = User::driver();

    loop {
        let available = api.available_rides(user.clone(), None).await?;

        let choice = available.choose(&mut rand::thread_rng()).map(|ride| ride.id);

        let id = match choice {
            Some(id) => id,
            None => {
                if done.is_closed() {
                    tokio::time::sleep(idle_timeout).await;
                    if api.available_rides(user.clone(), None).await?.is_empty() {
                        return Ok(());
                    }
                } else {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                continue;
            }
        };

        match api.accept_ride(user.clone(), id).await {
            Ok(_) => {
                events.send(Event::Accepted).await.ok();
            }
            Err(Error::Conflict) => {
                events.send(Event::Conflict).await.ok();
                continue;
            }
            Err(err) => return Err(err),
        }

        for target in [RideStatus::InProgress, RideStatus::Completed] {
            match api.advance_ride(user.clone(), id, target).await {
                Ok(_) => {}
                // cancelled by the passenger mid-trip
                Err(Error::InvalidTransition { .. }) => break,
                Err(err) => return Err(err),
            }

            if target == RideStatus::Completed {
                events.send(Event::Completed).await.ok();
            }
        }
    }
}
