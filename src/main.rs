use ridehail::config::Config;
use ridehail::db::{CachedStore, PgStore};
use ridehail::engine::Engine;
use ridehail::error::Error;
use ridehail::server::serve;

#[tokio::main]
async fn main() -> Result<(), Error> {
    ridehail::init_tracing();

    let config = Config::from_env()?;

    let store = PgStore::new(&config.database.url, config.database.max_connections).await?;
    let store = CachedStore::new(store, config.ride_cache_capacity);

    let engine = Engine::new(store)?;

    serve(engine, config.server.addr()?).await
}
