use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{Booking, CreateRide, Ride};
use crate::error::Error;
use crate::store::RideFilter;

#[async_trait]
pub trait RideAPI {
    async fn create_ride(&self, params: CreateRide) -> Result<Ride, Error>;

    async fn find_ride(&self, id: Uuid) -> Result<Ride, Error>;

    async fn book_seats(&self, id: Uuid, passenger_id: Uuid, seats: u32)
        -> Result<Booking, Error>;

    async fn accept_ride(&self, id: Uuid, driver_id: Uuid) -> Result<Ride, Error>;

    async fn start_ride(&self, id: Uuid) -> Result<Ride, Error>;

    async fn complete_ride(&self, id: Uuid, actual_price: f64) -> Result<Ride, Error>;

    async fn cancel_ride(&self, id: Uuid, actor: Uuid) -> Result<Ride, Error>;

    async fn search_rides(&self, filter: RideFilter) -> Result<Vec<Ride>, Error>;
}

#[async_trait]
pub trait BookingAPI {
    async fn find_booking(&self, id: Uuid) -> Result<Booking, Error>;

    async fn ride_bookings(&self, ride_id: Uuid) -> Result<Vec<Booking>, Error>;
}

pub trait API: RideAPI + BookingAPI {}
