//! Walks a user through create → get → get → update → get and prints each response.
//!
//! ```text
//! RUST_LOG=rmediator=debug cargo run --example users
//! ```

use std::sync::Arc;
use std::time::Duration;

use rmediator::database::InMemoryUserRepository;
use rmediator::users::{CreateUser, GetUserById, ListUsers, UpdateUser, UsersModule};
use rmediator::{CancellationToken, Mediator, MediatorConfig, MemoryCache, Registry};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = MediatorConfig::default().with_default_timeout(Duration::from_secs(5));
    let mut builder = Registry::builder(Arc::new(MemoryCache::new()), config);
    builder.install(UsersModule::new(Arc::new(InMemoryUserRepository::new())))?;
    let mediator = Mediator::new(builder.build());

    let created = mediator
        .send(
            CreateUser {
                name: "Ada".to_owned(),
                age: 36,
            },
            CancellationToken::never(),
        )
        .await?;
    println!("created: {}", serde_json::to_string(&created)?);

    // The second read is served from the cache.
    for _ in 0..2 {
        let user = mediator
            .send(GetUserById { id: created.id }, CancellationToken::never())
            .await?;
        println!("fetched: {}", serde_json::to_string(&user)?);
    }

    let updated = mediator
        .send(
            UpdateUser {
                id: created.id,
                name: "Ada Lovelace".to_owned(),
                age: 37,
            },
            CancellationToken::never(),
        )
        .await?;
    println!("updated: {updated}");

    let user = mediator
        .send(GetUserById { id: created.id }, CancellationToken::never())
        .await?;
    println!("fetched: {}", serde_json::to_string(&user)?);

    let all = mediator.send(ListUsers, CancellationToken::never()).await?;
    println!("all users: {}", serde_json::to_string_pretty(&all)?);

    Ok(())
}
