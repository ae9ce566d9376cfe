use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, Executor, Pool, Postgres, Row};
use uuid::Uuid;

use crate::entities::{Booking, Ride};
use crate::error::{not_found_error, Error};
use crate::store::{RideFilter, RideStore, Versioned};

/// Postgres-backed store. Rides live in a JSONB document column with a
/// version counter guarding every update; the status and departure columns
/// exist for filtering and ordering without unpacking the document.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    #[tracing::instrument(name = "PostgresStore::connect", skip(db_uri))]
    pub async fn connect(db_uri: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_uri)
            .await?;

        // TODO: move this to migrations
        pool.execute(
            "CREATE TABLE IF NOT EXISTS rides (
                id UUID PRIMARY KEY,
                status VARCHAR NOT NULL,
                departure TIMESTAMPTZ NOT NULL,
                version BIGINT NOT NULL,
                data JSONB NOT NULL
            )",
        )
        .await?;

        pool.execute(
            "CREATE TABLE IF NOT EXISTS bookings (
                id UUID PRIMARY KEY,
                ride_id UUID NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                data JSONB NOT NULL
            )",
        )
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl RideStore for PostgresStore {
    #[tracing::instrument(skip(self, ride), fields(ride_id = %ride.id))]
    async fn insert_ride(&self, ride: &Ride) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query(
                "INSERT INTO rides (id, status, departure, version, data) VALUES ($1, $2, $3, 1, $4)",
            )
            .bind(ride.id)
            .bind(ride.status.name())
            .bind(ride.departure_time)
            .bind(Json(ride)),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_ride(&self, id: Uuid) -> Result<Versioned<Ride>, Error> {
        let mut conn = self.pool.acquire().await?;

        let row = conn
            .fetch_optional(sqlx::query("SELECT version, data FROM rides WHERE id = $1").bind(id))
            .await?
            .ok_or_else(|| not_found_error(id))?;

        let version: i64 = row.try_get("version")?;
        let Json(ride): Json<Ride> = row.try_get("data")?;

        Ok(Versioned {
            version: version as u64,
            data: ride,
        })
    }

    #[tracing::instrument(skip(self, ride), fields(ride_id = %ride.id))]
    async fn update_ride(&self, ride: &Ride, expected: u64) -> Result<bool, Error> {
        let mut conn = self.pool.acquire().await?;

        let result = conn
            .execute(
                sqlx::query(
                    "UPDATE rides SET status = $2, version = version + 1, data = $3
                     WHERE id = $1 AND version = $4",
                )
                .bind(ride.id)
                .bind(ride.status.name())
                .bind(Json(ride))
                .bind(expected as i64),
            )
            .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip(self, booking), fields(booking_id = %booking.id))]
    async fn insert_booking(&self, booking: &Booking) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query("INSERT INTO bookings (id, ride_id, created_at, data) VALUES ($1, $2, $3, $4)")
                .bind(booking.id)
                .bind(booking.ride_id)
                .bind(booking.created_at)
                .bind(Json(booking)),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_booking(&self, id: Uuid) -> Result<Booking, Error> {
        let mut conn = self.pool.acquire().await?;

        let row = conn
            .fetch_optional(sqlx::query("SELECT data FROM bookings WHERE id = $1").bind(id))
            .await?
            .ok_or_else(|| not_found_error(id))?;

        let Json(booking): Json<Booking> = row.try_get("data")?;

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn ride_bookings(&self, ride_id: Uuid) -> Result<Vec<Booking>, Error> {
        let mut conn = self.pool.acquire().await?;

        let rows = conn
            .fetch_all(
                sqlx::query(
                    "SELECT data FROM bookings WHERE ride_id = $1 ORDER BY created_at ASC",
                )
                .bind(ride_id),
            )
            .await?;

        let mut bookings = Vec::with_capacity(rows.len());

        for row in rows.iter() {
            let Json(booking): Json<Booking> = row.try_get("data")?;
            bookings.push(booking);
        }

        Ok(bookings)
    }

    #[tracing::instrument(skip(self))]
    async fn search_rides(&self, filter: &RideFilter) -> Result<Vec<Ride>, Error> {
        let mut conn = self.pool.acquire().await?;

        // status narrows in SQL, label substrings match on the document
        let rows = conn
            .fetch_all(
                sqlx::query(
                    "SELECT data FROM rides
                     WHERE $1::varchar IS NULL OR status = $1
                     ORDER BY departure ASC",
                )
                .bind(filter.status.as_deref()),
            )
            .await?;

        let mut rides = Vec::new();

        for row in rows.iter() {
            let Json(ride): Json<Ride> = row.try_get("data")?;

            if filter.matches(&ride) {
                rides.push(ride);
            }
        }

        Ok(rides)
    }
}
