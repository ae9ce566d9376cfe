use async_trait::async_trait;
use uuid::Uuid;

use super::Engine;
use crate::api::RideAPI;
use crate::entities::{Booking, CreateRide, Ride};
use crate::error::Error;
use crate::store::RideFilter;

#[async_trait]
impl RideAPI for Engine {
    #[tracing::instrument(skip(self, params))]
    async fn create_ride(&self, params: CreateRide) -> Result<Ride, Error> {
        let ride = Ride::new(params)?;

        self.store().insert_ride(&ride).await?;

        tracing::info!(ride_id = %ride.id, seats = ride.total_seats, "ride posted");

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn find_ride(&self, id: Uuid) -> Result<Ride, Error> {
        Ok(self.store().fetch_ride(id).await?.data)
    }

    #[tracing::instrument(skip(self))]
    async fn book_seats(
        &self,
        id: Uuid,
        passenger_id: Uuid,
        seats: u32,
    ) -> Result<Booking, Error> {
        let ride = self.mutate_ride(id, |ride| ride.book(seats)).await?;

        // recorded only after the seat count committed, so a lost race
        // never leaves a booking without seats behind it
        let booking = Booking::new(ride.id, passenger_id, seats);

        self.store().insert_booking(&booking).await?;

        tracing::info!(
            ride_id = %id,
            %passenger_id,
            seats,
            remaining = ride.remaining_seats(),
            "seats booked"
        );

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn accept_ride(&self, id: Uuid, driver_id: Uuid) -> Result<Ride, Error> {
        self.mutate_ride(id, move |ride| ride.claim(driver_id)).await
    }

    #[tracing::instrument(skip(self))]
    async fn start_ride(&self, id: Uuid) -> Result<Ride, Error> {
        self.mutate_ride(id, |ride| ride.start()).await
    }

    #[tracing::instrument(skip(self))]
    async fn complete_ride(&self, id: Uuid, actual_price: f64) -> Result<Ride, Error> {
        self.mutate_ride(id, move |ride| ride.complete(actual_price))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_ride(&self, id: Uuid, actor: Uuid) -> Result<Ride, Error> {
        self.mutate_ride(id, move |ride| ride.cancel(actor)).await
    }

    #[tracing::instrument(skip(self, filter))]
    async fn search_rides(&self, filter: RideFilter) -> Result<Vec<Ride>, Error> {
        self.store().search_rides(&filter).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use tokio_test::assert_ok;

    use crate::api::{BookingAPI, RideAPI};
    use crate::engine::Engine;
    use crate::entities::{CreateRide, Place, Status};
    use crate::error::Kind;
    use crate::store::memory::MemoryStore;
    use crate::store::RideFilter;

    use super::*;

    fn engine() -> Engine {
        Engine::new(Arc::new(MemoryStore::new()))
    }

    fn params(driver_id: Option<Uuid>, total_seats: u32) -> CreateRide {
        CreateRide {
            driver_id,
            pickup: Place::new("Student Union", 43.0008, -78.7890),
            dropoff: Place::new("Elmwood Village", 42.9210, -78.8770),
            departure_time: Utc::now() + Duration::hours(4),
            total_seats,
            price_per_seat: 4.5,
            description: "two stops max".into(),
        }
    }

    #[tokio::test]
    async fn booking_runs_a_ride_to_full_then_rejects() {
        let e = engine();
        let ride = e.create_ride(params(Some(Uuid::new_v4()), 2)).await.unwrap();

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        assert_ok!(e.book_seats(ride.id, a, 1).await);
        let after_a = e.find_ride(ride.id).await.unwrap();
        assert_eq!(after_a.booked_seats, 1);
        assert_eq!(after_a.status.name(), "open");

        assert_ok!(e.book_seats(ride.id, b, 1).await);
        let after_b = e.find_ride(ride.id).await.unwrap();
        assert_eq!(after_b.booked_seats, 2);
        assert_eq!(after_b.status.name(), "full");

        let err = e.book_seats(ride.id, c, 1).await.unwrap_err();
        assert_eq!(err.kind, Kind::CapacityExceeded);
    }

    #[tokio::test]
    async fn full_lifecycle_records_the_fare() {
        let e = engine();
        let ride = e.create_ride(params(Some(Uuid::new_v4()), 3)).await.unwrap();

        assert_ok!(e.start_ride(ride.id).await);

        let done = e.complete_ride(ride.id, 12.50).await.unwrap();
        match done.status {
            Status::Completed { actual_price } => assert_eq!(actual_price, 12.50),
            _ => panic!("expected completed status"),
        }

        let err = e.cancel_ride(ride.id, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind, Kind::InvalidState);
    }

    #[tokio::test]
    async fn cancelled_ride_keeps_bookings_for_audit() {
        let e = engine();
        let ride = e.create_ride(params(Some(Uuid::new_v4()), 3)).await.unwrap();

        let passenger = Uuid::new_v4();
        let booking = e.book_seats(ride.id, passenger, 2).await.unwrap();

        let cancelled = e.cancel_ride(ride.id, passenger).await.unwrap();
        assert_eq!(cancelled.status.name(), "cancelled");

        let audit = e.ride_bookings(ride.id).await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].id, booking.id);
        assert_eq!(audit[0].seats_reserved, 2);

        let kept = e.find_booking(booking.id).await.unwrap();
        assert_eq!(kept.passenger_id, passenger);
    }

    #[tokio::test]
    async fn unclaimed_ride_is_bound_by_first_driver() {
        let e = engine();
        let ride = e.create_ride(params(None, 2)).await.unwrap();

        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        let claimed = e.accept_ride(ride.id, first).await.unwrap();
        assert_eq!(claimed.driver_id, Some(first));

        let err = e.accept_ride(ride.id, second).await.unwrap_err();
        assert_eq!(err.kind, Kind::AlreadyClaimed);

        // losing the claim does not block the bound driver from starting
        assert_ok!(e.start_ride(ride.id).await);
    }

    #[tokio::test]
    async fn start_before_claim_is_invalid() {
        let e = engine();
        let ride = e.create_ride(params(None, 2)).await.unwrap();

        let err = e.start_ride(ride.id).await.unwrap_err();
        assert_eq!(err.kind, Kind::InvalidState);
    }

    #[tokio::test]
    async fn unknown_ride_is_not_found() {
        let e = engine();

        let err = e.book_seats(Uuid::new_v4(), Uuid::new_v4(), 1).await.unwrap_err();
        assert_eq!(err.kind, Kind::NotFound);
    }

    #[tokio::test]
    async fn search_sees_newly_posted_rides() {
        let e = engine();
        e.create_ride(params(Some(Uuid::new_v4()), 2)).await.unwrap();

        let found = e
            .search_rides(RideFilter {
                dropoff: Some("elmwood".into()),
                ..RideFilter::default()
            })
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn status_transitions_reach_the_event_feed() {
        let (tx, rx) = async_channel::unbounded();

        let e = Engine::new(Arc::new(MemoryStore::new())).with_events(tx);
        let ride = e.create_ride(params(Some(Uuid::new_v4()), 1)).await.unwrap();

        // fills the ride: open -> full
        e.book_seats(ride.id, Uuid::new_v4(), 1).await.unwrap();
        assert_eq!(rx.try_recv().unwrap().status.name(), "full");

        e.start_ride(ride.id).await.unwrap();
        assert_eq!(rx.try_recv().unwrap().status.name(), "in_progress");

        // re-cancel after cancel is a no-op and emits nothing
        e.cancel_ride(ride.id, Uuid::new_v4()).await.unwrap();
        e.cancel_ride(ride.id, Uuid::new_v4()).await.unwrap();
        assert_eq!(rx.try_recv().unwrap().status.name(), "cancelled");
        assert!(rx.try_recv().is_err());
    }
}
