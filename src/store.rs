pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{Booking, Ride};
use crate::error::Error;

/// A ride together with the version token it was read at. The token must
/// be handed back to `update_ride` for the write to be accepted.
#[derive(Clone, Debug)]
pub struct Versioned<T> {
    pub version: u64,
    pub data: T,
}

#[derive(Clone, Debug, Default)]
pub struct RideFilter {
    pub pickup: Option<String>,
    pub dropoff: Option<String>,
    pub status: Option<String>,
}

impl RideFilter {
    pub fn matches(&self, ride: &Ride) -> bool {
        let label_matches = |needle: &Option<String>, label: &str| match needle {
            Some(needle) => label.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        };

        label_matches(&self.pickup, &ride.pickup.label)
            && label_matches(&self.dropoff, &ride.dropoff.label)
            && match &self.status {
                Some(status) => ride.status.name() == *status,
                None => true,
            }
    }
}

/// Document-store boundary of the ledger. Writes to a ride go through an
/// optimistic version check; bookings are append-only. Implementations
/// must keep the version compare-and-swap atomic per ride, and must not
/// serialize writes across distinct rides.
#[async_trait]
pub trait RideStore: Send + Sync {
    async fn insert_ride(&self, ride: &Ride) -> Result<(), Error>;

    async fn fetch_ride(&self, id: Uuid) -> Result<Versioned<Ride>, Error>;

    /// Commits `ride` only if the stored version still equals `expected`.
    /// Returns false when a concurrent writer got there first.
    async fn update_ride(&self, ride: &Ride, expected: u64) -> Result<bool, Error>;

    async fn insert_booking(&self, booking: &Booking) -> Result<(), Error>;

    async fn fetch_booking(&self, id: Uuid) -> Result<Booking, Error>;

    async fn ride_bookings(&self, ride_id: Uuid) -> Result<Vec<Booking>, Error>;

    /// Matching rides ordered by departure time ascending.
    async fn search_rides(&self, filter: &RideFilter) -> Result<Vec<Ride>, Error>;
}
