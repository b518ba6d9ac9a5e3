use std::{str::FromStr, time::Duration};

use demos::quotes::{Quote, QuoteSummary, SYMBOL_HEADER};
use futures::StreamExt;
use msgstore::{
    sqlite::SqliteMessageStore, MessageGroupStore, MessageStore, DEFAULT_REGION,
    DEFAULT_TABLE_PREFIX,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous},
    SqlitePool,
};
use tokio::time::sleep;
use tracing::{info, warn};

const SYMBOLS: [&str; 4] = ["ABC", "DEF", "GHI", "JKL"];
/// A symbol's group is released once it holds this many quotes.
const BATCH_SIZE: usize = 5;
const N_QUOTES: usize = 50;
const GROUP_TIMEOUT: Duration = Duration::from_millis(200);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let region = std::env::var("MSGSTORE_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());
    let table_prefix = std::env::var("MSGSTORE_TABLE_PREFIX")
        .unwrap_or_else(|_| DEFAULT_TABLE_PREFIX.to_string());

    let pool = SqlitePool::connect_with(
        SqliteConnectOptions::from_str(database_url.as_str())
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal),
    )
    .await
    .unwrap();

    let store = SqliteMessageStore::builder()
        .pool(pool.clone())
        .region(region)
        .table_prefix(table_prefix)
        .build()
        .unwrap();

    if store.table_prefix() == DEFAULT_TABLE_PREFIX {
        sqlx::migrate!("../msgstore/migrations")
            .run(&pool)
            .await
            .unwrap();
    } else {
        store.initialize_schema().await.unwrap();
    }

    for _ in 0..N_QUOTES {
        let quote = Quote::random(&SYMBOLS);
        // the quote log keeps every message, groups only hold them until
        // they are released
        let message = store.add_message(quote.to_message().unwrap()).await.unwrap();
        let group = store
            .add_message_to_group(quote.symbol.as_str(), &message)
            .await
            .unwrap();

        if group.unmarked().len() >= BATCH_SIZE {
            let quotes = group
                .unmarked()
                .iter()
                .map(Quote::from_message)
                .collect::<Result<Vec<_>, _>>()
                .unwrap();
            let summary = quotes.iter().collect::<QuoteSummary>();
            info!("Released {}: {}", quote.symbol, summary);

            let group = store.mark_message_group(&group).await.unwrap();
            for member in group.marked() {
                store
                    .remove_message_from_group(quote.symbol.as_str(), member)
                    .await
                    .unwrap();
            }
        }
    }

    info!(
        "Stored {} quotes, {} partial groups in region {}",
        store.message_count().await.unwrap(),
        store.message_group_count().await.unwrap(),
        store.region()
    );

    let mut groups = store.iterate_groups().await.unwrap();
    while let Some(group) = groups.next().await {
        let group = group.unwrap();
        let symbol = group
            .unmarked()
            .first()
            .and_then(|m| m.header(SYMBOL_HEADER))
            .unwrap_or("?");
        let oldest = group
            .unmarked()
            .iter()
            .filter_map(|m| m.created_at())
            .min();
        info!(
            "Pending {}: {} quotes, oldest saved at {:?}",
            symbol,
            group.size(),
            oldest
        );
    }

    // nothing else arrives, so every partial group times out
    sleep(GROUP_TIMEOUT).await;
    let expired = store.expire_message_groups(GROUP_TIMEOUT).await.unwrap();
    for group in expired {
        let group_id = group.group_id();
        let (unmarked, _) = group.into_parts();
        let quotes = unmarked
            .iter()
            .filter_map(|m| match Quote::from_message(m) {
                Ok(quote) => Some(quote),
                Err(e) => {
                    warn!("Dropping unreadable quote {}: {}", m.id(), e);
                    None
                }
            })
            .collect::<Vec<_>>();
        info!(
            "Expired group {}: {}",
            group_id,
            quotes.iter().collect::<QuoteSummary>()
        );
    }
    assert_eq!(store.message_group_count().await.unwrap(), 0);
}
