//! Example: persists a `Note` entity in PostgreSQL through the mapper.
//!
//! Reads `DATABASE_URL`, `TABLE_PREFIX` and `DB_MAX_CONNECTIONS` (a `.env` file is honored).

use architect_orm::{entity, DbConfig, Entity, ExecutionPort, Mapper, PgExecutionPort};
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

entity! {
    /// A short text note.
    pub struct Note {
        "title",
        "body",
        "pinned": Boolean,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("architect_orm=debug")),
        )
        .init();

    let config = DbConfig::from_env()?;
    let port = Arc::new(PgExecutionPort::connect(&config).await?);
    port.execute(
        "CREATE TABLE IF NOT EXISTS *PREFIX*notes (id BIGSERIAL PRIMARY KEY, title TEXT, body TEXT, pinned BOOLEAN NOT NULL DEFAULT FALSE)",
        &[],
    )
    .await?;

    let notes: Mapper<Note> = Mapper::new(port.clone(), "notes");

    let draft = Note::from_params([("title", json!("Hello, World!!")), ("body", json!("first note"))])?;
    let mut note = notes.insert(draft).await?;
    note.reset_updated_fields();
    tracing::info!(id = ?note.id(), slug = %note.slugify("title")?, "inserted note");

    let select = format!("SELECT * FROM {} WHERE id = ?", notes.table_name());
    let mut loaded = notes.find_entity(&select, &[json!(note.id())]).await?;
    loaded.set("pinned", true)?;
    notes.update(&loaded).await?;
    loaded.reset_updated_fields();

    let all = notes
        .find_entities(&format!("SELECT * FROM {} ORDER BY id", notes.table_name()), &[])
        .await?;
    tracing::info!(count = all.len(), "notes stored");

    notes.delete(&loaded).await?;
    tracing::info!(id = ?loaded.id(), "deleted note");
    Ok(())
}
