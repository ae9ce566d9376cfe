use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Place;
use crate::error::{
    already_claimed_error, capacity_exceeded_error, invalid_state_error, validation_error, Error,
};

/// A posted trip with a fixed seat pool. The ledger is the only writer of
/// `booked_seats` and `status`; everything else is immutable after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ride {
    pub id: Uuid,
    pub driver_id: Option<Uuid>,
    pub pickup: Place,
    pub dropoff: Place,
    pub departure_time: DateTime<Utc>,
    pub total_seats: u32,
    pub booked_seats: u32,
    pub price_per_seat: f64,
    pub description: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Status {
    Open,
    Full,
    InProgress,
    Completed { actual_price: f64 },
    Cancelled { cancelled_by: Uuid },
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Open => "open".into(),
            Self::Full => "full".into(),
            Self::InProgress => "in_progress".into(),
            Self::Completed { actual_price: _ } => "completed".into(),
            Self::Cancelled { cancelled_by: _ } => "cancelled".into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { actual_price: _ } | Self::Cancelled { cancelled_by: _ }
        )
    }
}

/// Creation parameters. `driver_id` is set for driver-posted offers and
/// left empty for passenger requests a driver claims later.
#[derive(Clone, Debug)]
pub struct CreateRide {
    pub driver_id: Option<Uuid>,
    pub pickup: Place,
    pub dropoff: Place,
    pub departure_time: DateTime<Utc>,
    pub total_seats: u32,
    pub price_per_seat: f64,
    pub description: String,
}

impl Ride {
    pub fn new(params: CreateRide) -> Result<Self, Error> {
        if params.departure_time <= Utc::now() {
            return Err(validation_error("departure_time", "must be in the future"));
        }

        if params.total_seats < 1 {
            return Err(validation_error("total_seats", "must be at least 1"));
        }

        if !params.price_per_seat.is_finite() || params.price_per_seat < 0.0 {
            return Err(validation_error("price_per_seat", "must be non-negative"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            driver_id: params.driver_id,
            pickup: params.pickup,
            dropoff: params.dropoff,
            departure_time: params.departure_time,
            total_seats: params.total_seats,
            booked_seats: 0,
            price_per_seat: params.price_per_seat,
            description: params.description,
            status: Status::Open,
            created_at: Utc::now(),
        })
    }

    pub fn remaining_seats(&self) -> u32 {
        self.total_seats - self.booked_seats
    }

    /// Reserves `seats` out of the pool, flipping to `Full` when the last
    /// seat goes. A `Full` ride stays in the bookable branch so the caller
    /// gets a capacity error rather than a generic state error.
    #[tracing::instrument]
    pub fn book(&mut self, seats: u32) -> Result<(), Error> {
        if seats < 1 {
            return Err(validation_error("seats_requested", "must be at least 1"));
        }

        match self.status {
            Status::Open | Status::Full => {
                let remaining = self.remaining_seats();

                if seats > remaining {
                    return Err(capacity_exceeded_error(seats, remaining));
                }

                self.booked_seats += seats;

                if self.booked_seats == self.total_seats {
                    self.status = Status::Full;
                }

                Ok(())
            }
            _ => Err(invalid_state_error(&self.status.name())),
        }
    }

    /// Binds a driver to an unclaimed ride. Re-claiming by the bound
    /// driver is a no-op; a different driver loses the race.
    #[tracing::instrument]
    pub fn claim(&mut self, driver_id: Uuid) -> Result<(), Error> {
        match self.status {
            Status::Open | Status::Full => match self.driver_id {
                None => {
                    self.driver_id = Some(driver_id);
                    Ok(())
                }
                Some(bound) if bound == driver_id => Ok(()),
                Some(bound) => Err(already_claimed_error(bound)),
            },
            _ => Err(invalid_state_error(&self.status.name())),
        }
    }

    #[tracing::instrument]
    pub fn start(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Open | Status::Full => {
                if self.driver_id.is_none() {
                    return Err(invalid_state_error("awaiting a driver"));
                }

                self.status = Status::InProgress;
                Ok(())
            }
            _ => Err(invalid_state_error(&self.status.name())),
        }
    }

    #[tracing::instrument]
    pub fn complete(&mut self, actual_price: f64) -> Result<(), Error> {
        match self.status {
            Status::InProgress => {
                if !actual_price.is_finite() || actual_price < 0.0 {
                    return Err(validation_error("actual_price", "must be non-negative"));
                }

                self.status = Status::Completed { actual_price };
                Ok(())
            }
            _ => Err(invalid_state_error(&self.status.name())),
        }
    }

    /// Cancels from any non-terminal status. Re-cancelling an already
    /// cancelled ride is a no-op success that keeps the original actor;
    /// a completed trip cannot be retroactively cancelled.
    #[tracing::instrument]
    pub fn cancel(&mut self, actor: Uuid) -> Result<(), Error> {
        match self.status {
            Status::Open | Status::Full | Status::InProgress => {
                self.status = Status::Cancelled { cancelled_by: actor };
                Ok(())
            }
            Status::Cancelled { cancelled_by: _ } => Ok(()),
            Status::Completed { actual_price: _ } => {
                Err(invalid_state_error(&self.status.name()))
            }
        }
    }
}
