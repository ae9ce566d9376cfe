mod booking;
mod place;
mod ride;

pub use booking::Booking;
pub use place::Place;
pub use ride::{CreateRide, Ride, Status};
