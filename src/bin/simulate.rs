use std::sync::Arc;

use ridehail::db::MemoryStore;
use ridehail::engine::Engine;
use ridehail::error::Error;
use ridehail::simulation::{self, SimulationConfig};

#[tokio::main]
async fn main() -> Result<(), Error> {
    ridehail::init_tracing();

    let engine = Engine::new(MemoryStore::new())?;

    let report = simulation::run(Arc::new(engine), SimulationConfig::default()).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&report)
            .map_err(|err| Error::Server(format!("failed to render report: {}", err)))?
    );

    Ok(())
}
