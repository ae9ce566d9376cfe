use async_trait::async_trait;
use uuid::Uuid;

use super::Engine;
use crate::api::BookingAPI;
use crate::entities::Booking;
use crate::error::Error;

#[async_trait]
impl BookingAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_booking(&self, id: Uuid) -> Result<Booking, Error> {
        self.store().fetch_booking(id).await
    }

    #[tracing::instrument(skip(self))]
    async fn ride_bookings(&self, ride_id: Uuid) -> Result<Vec<Booking>, Error> {
        self.store().ride_bookings(ride_id).await
    }
}
