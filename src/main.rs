use std::env;
use std::sync::Arc;

use vectura::engine::Engine;
use vectura::simulation;
use vectura::store::memory::MemoryStore;
use vectura::store::postgres::PostgresStore;
use vectura::store::RideStore;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let store: Arc<dyn RideStore> = match env::var("DATABASE_URL") {
        Ok(db_uri) => Arc::new(PostgresStore::connect(&db_uri, 5).await.unwrap()),
        Err(_) => Arc::new(MemoryStore::new()),
    };

    let (events, feed) = async_channel::unbounded::<vectura::entities::Ride>();

    tokio::spawn(async move {
        while let Ok(ride) = feed.recv().await {
            let doc = serde_json::to_string(&ride).unwrap_or_default();
            tracing::info!(ride_id = %ride.id, status = %ride.status.name(), ride = %doc, "status changed");
        }
    });

    let engine = Arc::new(Engine::new(store).with_events(events));

    simulation::run(engine, 12, 48).await.unwrap();
}
