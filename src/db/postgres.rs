use async_trait::async_trait;
use geo_types::Geometry;
use geozero::wkb;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    types::Json,
    Executor, Pool, Postgres, Row, Transaction,
};
use uuid::Uuid;

use super::RideStore;
use crate::entities::{Proximity, Ride};
use crate::error::Error;

type Database = Postgres;

pub struct PgStore {
    pool: Pool<Database>,
}

impl PgStore {
    #[tracing::instrument(name = "PgStore::new", skip(db_uri))]
    pub async fn new(db_uri: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_uri)
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: Pool<Database>) -> Result<Self, Error> {
        // TODO: move this to sqlx migrations once the schema needs a second revision
        pool.execute("CREATE EXTENSION IF NOT EXISTS postgis").await?;

        // a ride cancelled while pending never received a driver
        pool.execute(
            "CREATE TABLE IF NOT EXISTS rides (
                id UUID PRIMARY KEY,
                status VARCHAR NOT NULL,
                passenger_id UUID NOT NULL,
                driver_id UUID,
                pickup geometry(Point, 4326) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                data JSONB NOT NULL,
                CONSTRAINT rides_driver_assignment CHECK (
                    status = 'CANCELLED' OR (driver_id IS NULL) = (status = 'PENDING')
                )
            )",
        )
        .await?;

        pool.execute(
            "CREATE INDEX IF NOT EXISTS rides_available_idx ON rides (created_at DESC)
            WHERE status = 'PENDING' AND driver_id IS NULL",
        )
        .await?;
        pool.execute("CREATE INDEX IF NOT EXISTS rides_passenger_idx ON rides (passenger_id)")
            .await?;
        pool.execute("CREATE INDEX IF NOT EXISTS rides_driver_idx ON rides (driver_id)")
            .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl RideStore for PgStore {
    #[tracing::instrument(skip(self, ride), fields(ride_id = %ride.id))]
    async fn insert(&self, ride: &Ride) -> Result<(), Error> {
        let pickup: Geometry<f64> = ride.pickup.coordinates.into();

        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query(
                "INSERT INTO rides (id, status, passenger_id, driver_id, pickup, created_at, updated_at, data)
                VALUES ($1, $2, $3, $4, ST_SetSRID($5, 4326), $6, $7, $8)",
            )
            .bind(&ride.id)
            .bind(ride.status.name())
            .bind(&ride.passenger_id)
            .bind(&ride.driver_id)
            .bind(wkb::Encode(pickup))
            .bind(&ride.created_at)
            .bind(&ride.updated_at)
            .bind(Json(ride)),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find(&self, id: Uuid) -> Result<Ride, Error> {
        let mut conn = self.pool.acquire().await?;

        let Json(ride): Json<Ride> = conn
            .fetch_optional(sqlx::query("SELECT data FROM rides WHERE id = $1").bind(&id))
            .await?
            .ok_or(Error::NotFound)?
            .try_get("data")?;

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn find_available(&self, proximity: Option<Proximity>) -> Result<Vec<Ride>, Error> {
        let mut conn = self.pool.acquire().await?;

        let results = match proximity {
            Some(proximity) => {
                let center: Geometry<f64> = proximity.center.into();

                conn.fetch_all(
                    sqlx::query(
                        "SELECT data FROM rides
                        WHERE status = 'PENDING'
                            AND driver_id IS NULL
                            AND ST_DWithin(pickup::geography, ST_SetSRID($1, 4326)::geography, $2)
                        ORDER BY created_at DESC, id ASC",
                    )
                    .bind(wkb::Encode(center))
                    .bind(proximity.radius_m),
                )
                .await?
            }
            None => {
                conn.fetch_all(sqlx::query(
                    "SELECT data FROM rides
                    WHERE status = 'PENDING' AND driver_id IS NULL
                    ORDER BY created_at DESC, id ASC",
                ))
                .await?
            }
        };

        decode_rides(results)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_participant(&self, user_id: Uuid) -> Result<Vec<Ride>, Error> {
        let mut conn = self.pool.acquire().await?;

        let results = conn
            .fetch_all(
                sqlx::query(
                    "SELECT data FROM rides
                    WHERE passenger_id = $1 OR driver_id = $1
                    ORDER BY created_at DESC, id ASC",
                )
                .bind(&user_id),
            )
            .await?;

        decode_rides(results)
    }

    #[tracing::instrument(skip(self, f))]
    async fn update<F>(&self, id: Uuid, f: F) -> Result<Ride, Error>
    where
        F: FnOnce(&mut Ride) -> Result<(), Error> + Send,
    {
        let mut tx = self.pool.begin().await?;

        let mut ride = fetch_ride_for_update(&mut tx, &id).await?;

        // dropping the transaction on error rolls it back
        f(&mut ride)?;

        update_ride(&mut tx, &ride).await?;

        tx.commit().await?;

        Ok(ride)
    }
}

fn decode_rides(results: Vec<PgRow>) -> Result<Vec<Ride>, Error> {
    let mut rides = Vec::with_capacity(results.len());

    for result in results.iter() {
        let Json(ride): Json<Ride> = result.try_get("data")?;
        rides.push(ride);
    }

    Ok(rides)
}

#[tracing::instrument(skip(tx))]
async fn fetch_ride_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Ride, Error> {
    let Json(ride): Json<Ride> = tx
        .fetch_optional(sqlx::query("SELECT data FROM rides WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or(Error::NotFound)?
        .try_get("data")?;

    Ok(ride)
}

#[tracing::instrument(skip(tx, ride), fields(ride_id = %ride.id, status = %ride.status))]
async fn update_ride(tx: &mut Transaction<'_, Database>, ride: &Ride) -> Result<(), Error> {
    tx.execute(
        sqlx::query(
            "UPDATE rides SET status = $2, driver_id = $3, updated_at = $4, data = $5 WHERE id = $1",
        )
        .bind(&ride.id)
        .bind(ride.status.name())
        .bind(&ride.driver_id)
        .bind(&ride.updated_at)
        .bind(Json(ride)),
    )
    .await?;

    Ok(())
}
