use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::entities::{Booking, Ride};
use crate::error::{not_found_error, storage_unavailable_error, Error};
use crate::store::{RideFilter, RideStore, Versioned};

/// In-process store backing tests and the default simulation run. The map
/// locks are held only for the copy or the version compare-and-swap, so
/// bookings against distinct rides do not serialize each other's
/// read-verify-write cycles.
pub struct MemoryStore {
    rides: RwLock<HashMap<Uuid, Versioned<Ride>>>,
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            rides: RwLock::new(HashMap::new()),
            bookings: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RideStore for MemoryStore {
    async fn insert_ride(&self, ride: &Ride) -> Result<(), Error> {
        let mut rides = self.rides.write().await;

        if rides.contains_key(&ride.id) {
            return Err(storage_unavailable_error("duplicate ride id"));
        }

        rides.insert(
            ride.id,
            Versioned {
                version: 1,
                data: ride.clone(),
            },
        );

        Ok(())
    }

    async fn fetch_ride(&self, id: Uuid) -> Result<Versioned<Ride>, Error> {
        self.rides
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found_error(id))
    }

    async fn update_ride(&self, ride: &Ride, expected: u64) -> Result<bool, Error> {
        let mut rides = self.rides.write().await;

        let stored = rides.get_mut(&ride.id).ok_or_else(|| not_found_error(ride.id))?;

        if stored.version != expected {
            return Ok(false);
        }

        stored.version += 1;
        stored.data = ride.clone();

        Ok(true)
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), Error> {
        self.bookings
            .write()
            .await
            .insert(booking.id, booking.clone());

        Ok(())
    }

    async fn fetch_booking(&self, id: Uuid) -> Result<Booking, Error> {
        self.bookings
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found_error(id))
    }

    async fn ride_bookings(&self, ride_id: Uuid) -> Result<Vec<Booking>, Error> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .read()
            .await
            .values()
            .filter(|booking| booking.ride_id == ride_id)
            .cloned()
            .collect();

        bookings.sort_by_key(|booking| booking.created_at);

        Ok(bookings)
    }

    async fn search_rides(&self, filter: &RideFilter) -> Result<Vec<Ride>, Error> {
        let mut rides: Vec<Ride> = self
            .rides
            .read()
            .await
            .values()
            .filter(|stored| filter.matches(&stored.data))
            .map(|stored| stored.data.clone())
            .collect();

        rides.sort_by_key(|ride| ride.departure_time);

        Ok(rides)
    }
}
