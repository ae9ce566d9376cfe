use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One passenger's reservation against a ride. Bookings are audit records:
/// they are never updated or deleted, and a booking on a cancelled ride
/// conveys no entitlement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub passenger_id: Uuid,
    pub seats_reserved: u32,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(ride_id: Uuid, passenger_id: Uuid, seats_reserved: u32) -> Self {
        Booking {
            id: Uuid::new_v4(),
            ride_id,
            passenger_id,
            seats_reserved,
            created_at: Utc::now(),
        }
    }
}
