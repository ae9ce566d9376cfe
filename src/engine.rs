mod booking_api;
mod ride_api;

use std::sync::Arc;

use async_channel::Sender;
use uuid::Uuid;

use crate::api::API;
use crate::entities::Ride;
use crate::error::{concurrency_error, Error};
use crate::store::RideStore;

/// Transparent retry budget for optimistic write conflicts. Once spent,
/// the call fails and any further retrying belongs to the caller.
const CAS_ATTEMPTS: u32 = 3;

pub struct Engine {
    store: Arc<dyn RideStore>,
    events: Option<Sender<Ride>>,
}

impl Engine {
    pub fn new(store: Arc<dyn RideStore>) -> Self {
        Self {
            store,
            events: None,
        }
    }

    /// Installs a status-change feed. Every successful status transition
    /// pushes the updated ride; the send is fire-and-forget and never
    /// affects the outcome of the transition itself.
    pub fn with_events(mut self, events: Sender<Ride>) -> Self {
        self.events = Some(events);
        self
    }

    pub(crate) fn store(&self) -> &dyn RideStore {
        self.store.as_ref()
    }

    /// One read-verify-write cycle per attempt: fetch the ride with its
    /// version token, run `apply` on a private copy, and commit only if no
    /// concurrent writer moved the version since the read. An application
    /// error aborts immediately; only version conflicts are retried.
    pub(crate) async fn mutate_ride<F>(&self, id: Uuid, mut apply: F) -> Result<Ride, Error>
    where
        F: FnMut(&mut Ride) -> Result<(), Error> + Send,
    {
        for attempt in 0..CAS_ATTEMPTS {
            let stored = self.store.fetch_ride(id).await?;
            let status_before = stored.data.status.name();

            let mut ride = stored.data;
            apply(&mut ride)?;

            if self.store.update_ride(&ride, stored.version).await? {
                if ride.status.name() != status_before {
                    self.emit(&ride);
                }

                return Ok(ride);
            }

            tracing::debug!(%id, attempt, "version conflict, retrying");
        }

        Err(concurrency_error(id))
    }

    pub(crate) fn emit(&self, ride: &Ride) {
        if let Some(events) = &self.events {
            // a full or closed channel drops the event, never the transition
            let _ = events.try_send(ride.clone());
        }
    }
}

impl API for Engine {}
