use std::sync::Arc;

use futures::future::join_all;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::RideAPI;
use crate::engine::Engine;
use crate::entities::{CreateRide, Place};
use crate::error::{Error, Kind};
use crate::store::RideFilter;

const CAMPUS_STOPS: &[(&str, f64, f64)] = &[
    ("North Campus", 43.0008, -78.7890),
    ("South Campus", 42.9542, -78.8184),
    ("Student Union", 43.0016, -78.7866),
    ("Downtown", 42.8864, -78.8784),
    ("Airport", 42.9405, -78.7322),
    ("Galleria Mall", 42.9126, -78.7640),
    ("Amtrak Station", 42.8790, -78.8734),
    ("Elmwood Village", 42.9210, -78.8770),
];

enum Outcome {
    Booked,
    SoldOut,
    Refused,
}

pub struct Simulation {
    e: Arc<Engine>,
    ride_ids: Mutex<Vec<Uuid>>,
}

impl Simulation {
    pub fn new(e: Arc<Engine>) -> Self {
        Self {
            e,
            ride_ids: Mutex::new(Vec::new()),
        }
    }

    fn sample_stop_pair() -> (Place, Place) {
        let mut rng = rand::thread_rng();
        let mut picks = CAMPUS_STOPS.choose_multiple(&mut rng, 2);

        let (label, lat, lng) = picks.next().unwrap();
        let pickup = Place::new(*label, *lat, *lng);

        let (label, lat, lng) = picks.next().unwrap();
        let dropoff = Place::new(*label, *lat, *lng);

        (pickup, dropoff)
    }

    fn sample_price() -> f64 {
        let dist = Normal::new(4.0, 1.5).unwrap();
        let price: f64 = dist.sample(&mut rand::thread_rng());

        price.max(0.0)
    }

    #[tracing::instrument(skip(self))]
    async fn post_rides(&self, count: usize) -> Result<(), Error> {
        for _ in 0..count {
            let (pickup, dropoff) = Self::sample_stop_pair();
            let (total_seats, hours_out) = {
                let mut rng = rand::thread_rng();
                (rng.gen_range(1..=4), rng.gen_range(1..=24))
            };

            let ride = self
                .e
                .create_ride(CreateRide {
                    driver_id: Some(Uuid::new_v4()),
                    pickup,
                    dropoff,
                    departure_time: chrono::Utc::now() + chrono::Duration::hours(hours_out),
                    total_seats,
                    price_per_seat: Self::sample_price(),
                    description: String::new(),
                })
                .await?;

            self.ride_ids.lock().await.push(ride.id);
        }

        Ok(())
    }

    /// Concurrent passengers hammer the posted rides. Conflict errors are
    /// retried at this level, the way the HTTP layer in front of the
    /// ledger would; capacity errors are definitive.
    #[tracing::instrument(skip(self))]
    async fn booking_storm(&self, passengers: usize) {
        let ride_ids = self.ride_ids.lock().await.clone();
        let mut tasks = Vec::with_capacity(passengers);

        for _ in 0..passengers {
            let e = self.e.clone();
            let (ride_id, seats) = {
                let mut rng = rand::thread_rng();
                (*ride_ids.choose(&mut rng).unwrap(), rng.gen_range(1..=2))
            };

            tasks.push(tokio::spawn(async move {
                let passenger_id = Uuid::new_v4();

                loop {
                    match e.book_seats(ride_id, passenger_id, seats).await {
                        Ok(_) => return Outcome::Booked,
                        Err(err) if err.kind == Kind::Concurrency => continue,
                        Err(err) if err.kind == Kind::CapacityExceeded => return Outcome::SoldOut,
                        Err(_) => return Outcome::Refused,
                    }
                }
            }));
        }

        let mut booked = 0;
        let mut sold_out = 0;
        let mut refused = 0;

        for result in join_all(tasks).await {
            match result.expect("booking task panicked") {
                Outcome::Booked => booked += 1,
                Outcome::SoldOut => sold_out += 1,
                Outcome::Refused => refused += 1,
            }
        }

        tracing::info!(booked, sold_out, refused, "booking storm settled");
    }

    /// Drives every ride forward: a sampled slice gets cancelled, the rest
    /// run through start and completion. Transitions refused because an
    /// earlier step already moved the ride are expected and tolerated.
    #[tracing::instrument(skip(self))]
    async fn sweep_lifecycle(&self) {
        let ride_ids = self.ride_ids.lock().await.clone();

        for ride_id in ride_ids {
            let cancels = rand::thread_rng().gen_bool(0.2);

            if cancels {
                tolerate(self.e.cancel_ride(ride_id, Uuid::new_v4()).await);
                continue;
            }

            tolerate(self.e.start_ride(ride_id).await);
            tolerate(self.e.complete_ride(ride_id, Self::sample_price()).await);
        }
    }

    #[tracing::instrument(skip(self))]
    async fn report(&self) -> Result<(), Error> {
        let rides = self.e.search_rides(RideFilter::default()).await?;

        for ride in rides.iter() {
            assert!(
                ride.booked_seats <= ride.total_seats,
                "ride {} overbooked: {}/{}",
                ride.id,
                ride.booked_seats,
                ride.total_seats
            );

            tracing::info!(
                ride_id = %ride.id,
                status = %ride.status.name(),
                seats = format!("{}/{}", ride.booked_seats, ride.total_seats),
                "final ride state"
            );
        }

        tracing::info!(rides = rides.len(), "no ride exceeded its seat pool");

        Ok(())
    }
}

pub async fn run(e: Arc<Engine>, rides: usize, passengers: usize) -> Result<(), Error> {
    let sim = Simulation::new(e);

    sim.post_rides(rides).await?;
    sim.booking_storm(passengers).await;
    sim.sweep_lifecycle().await;
    sim.report().await
}

fn tolerate<T>(result: Result<T, Error>) {
    match result {
        Ok(_) => {}
        Err(err) if err.kind == Kind::InvalidState => {
            tracing::debug!(message = %err.message, "transition refused");
        }
        Err(err) => panic!("unexpected simulation error: {err:?}"),
    }
}
