//! Behaviour every store must share, run against each implementation.

use std::{collections::BTreeSet, time::Duration};

use futures_util::stream::StreamExt;
use msgstore::{
    mock::MockMessageStore, sqlite::SqliteMessageStore, Message, MessageGroup, MessageGroupStore,
    MessageStore, StoreKey,
};
use sqlx::SqlitePool;
use uuid::Uuid;

async fn test_db_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("../msgstore/migrations")
        .run(&pool)
        .await
        .unwrap();
    pool
}

fn message(body: &str) -> Message {
    Message::new(body.as_bytes().to_vec())
}

fn ids(messages: &[Message]) -> BTreeSet<Uuid> {
    messages.iter().map(Message::id).collect()
}

async fn add_message_stamps<S: MessageStore>(store: S) {
    let original = message("a");
    let saved = store.add_message(original.clone()).await.unwrap();
    assert!(saved.is_saved());
    assert!(saved.created_date().is_some());
    assert_eq!(saved.id(), original.id());
    assert_eq!(saved.timestamp(), original.timestamp());
    assert_eq!(saved.payload(), original.payload());
    assert_eq!(store.get_message(saved.id()).await.unwrap(), Some(saved));
}

async fn add_saved_message_is_idempotent<S: MessageStore>(store: S) {
    let saved = store.add_message(message("a")).await.unwrap();
    let first = store.add_message(saved.clone()).await.unwrap();
    let second = store.add_message(saved.clone()).await.unwrap();
    assert_eq!(first, saved);
    assert_eq!(second, saved);
    assert_eq!(store.get_message(saved.id()).await.unwrap(), Some(saved));
    assert_eq!(store.message_count().await.unwrap(), 1);
}

async fn add_unsaved_duplicate_fails<S: MessageStore>(store: S) {
    let original = message("a");
    store.add_message(original.clone()).await.unwrap();
    assert!(store.add_message(original).await.is_err());
    assert_eq!(store.message_count().await.unwrap(), 1);
}

async fn get_unknown_message<S: MessageStore>(store: S) {
    assert_eq!(store.get_message(Uuid::new_v4()).await.unwrap(), None);
}

async fn remove_returns_pre_image<S: MessageStore>(store: S) {
    let saved = store.add_message(message("a")).await.unwrap();
    let kept = store.add_message(message("b")).await.unwrap();
    assert_eq!(
        store.remove_message(saved.id()).await.unwrap(),
        Some(saved.clone())
    );
    assert_eq!(store.get_message(saved.id()).await.unwrap(), None);
    assert_eq!(store.remove_message(saved.id()).await.unwrap(), None);
    assert_eq!(store.get_message(kept.id()).await.unwrap(), Some(kept));
    assert_eq!(store.message_count().await.unwrap(), 1);
}

async fn unknown_group_is_empty<S: MessageGroupStore>(store: S) {
    let group = store.get_message_group("never-used").await.unwrap();
    assert!(group.is_empty());
    assert_eq!(group.timestamp(), None);
    assert_eq!(group, MessageGroup::empty("never-used".to_store_uuid()));
}

async fn group_keeps_insertion_order<S: MessageGroupStore>(store: S) {
    let (m1, m2, m3) = (message("1"), message("2"), message("3"));
    let before = chrono::Utc::now().timestamp_millis();
    store.add_message_to_group("g", &m1).await.unwrap();
    store.add_message_to_group("g", &m2).await.unwrap();
    let group = store.add_message_to_group("g", &m3).await.unwrap();
    assert_eq!(group.unmarked(), &[m1.clone(), m2.clone(), m3.clone()]);
    assert!(group.marked().is_empty());
    assert!(group.timestamp().unwrap() >= before);

    let reloaded = store.get_message_group("g").await.unwrap();
    assert_eq!(reloaded, group);
}

async fn group_timestamp_is_oldest_member<S: MessageGroupStore>(store: S) {
    let m1 = message("1");
    let first = store.add_message_to_group("g", &m1).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = store.add_message_to_group("g", &message("2")).await.unwrap();
    assert_eq!(second.timestamp(), first.timestamp());

    // dropping the oldest member moves the timestamp forward
    let third = store.remove_message_from_group("g", &m1).await.unwrap();
    assert!(third.timestamp().unwrap() > first.timestamp().unwrap());
}

async fn equal_keys_share_a_group<S: MessageGroupStore>(store: S) {
    let m1 = message("1");
    store.add_message_to_group("orders", &m1).await.unwrap();
    let group = store
        .get_message_group(&"orders".to_string())
        .await
        .unwrap();
    assert_eq!(group.unmarked(), &[m1]);
    assert!(store.get_message_group("trades").await.unwrap().is_empty());
}

async fn key_kinds_are_separate_groups<S: MessageGroupStore>(store: S) {
    store.add_message_to_group(&42_i64, &message("int")).await.unwrap();
    store.add_message_to_group("42", &message("str")).await.unwrap();
    store
        .add_message_to_group(b"42".as_slice(), &message("bytes"))
        .await
        .unwrap();
    assert_eq!(store.get_message_group("42").await.unwrap().size(), 1);
    assert_eq!(store.get_message_group(&42_u8).await.unwrap().size(), 1);
    assert_eq!(store.message_group_count().await.unwrap(), 3);
}

async fn mark_group_is_monotonic<S: MessageGroupStore>(store: S) {
    for body in ["1", "2", "3"] {
        store.add_message_to_group(&7_i64, &message(body)).await.unwrap();
    }
    let before = store.get_message_group(&7_i64).await.unwrap();

    let marked = store.mark_message_group(&before).await.unwrap();
    assert!(marked.unmarked().is_empty());
    assert_eq!(ids(marked.marked()), ids(before.unmarked()));
    assert_eq!(marked.timestamp(), before.timestamp());

    let again = store.mark_message_group(&marked).await.unwrap();
    assert!(again.unmarked().is_empty());
    assert_eq!(ids(again.marked()), ids(marked.marked()));
    assert_eq!(again.timestamp(), marked.timestamp());
}

async fn mark_single_member<S: MessageGroupStore>(store: S) {
    let (m1, m2) = (message("1"), message("2"));
    store.add_message_to_group("g", &m1).await.unwrap();
    store.add_message_to_group("g", &m2).await.unwrap();

    let group = store.mark_message_from_group("g", &m1).await.unwrap();
    assert_eq!(group.unmarked(), &[m2.clone()]);
    assert_eq!(group.marked(), &[m1.clone()]);

    // marking twice is a no-op rather than an error
    let again = store.mark_message_from_group("g", &m1).await.unwrap();
    assert_eq!(again, group);

    // marking a message which isn't a member changes nothing
    let unrelated = store
        .mark_message_from_group("g", &message("3"))
        .await
        .unwrap();
    assert_eq!(unrelated, group);
}

async fn remove_members<S: MessageGroupStore>(store: S) {
    let (m1, m2) = (message("1"), message("2"));
    store.add_message_to_group("g", &m1).await.unwrap();
    store.add_message_to_group("g", &m2).await.unwrap();
    store.mark_message_from_group("g", &m1).await.unwrap();

    // marked members are removed too
    let group = store.remove_message_from_group("g", &m1).await.unwrap();
    assert_eq!(group.unmarked(), &[m2.clone()]);
    assert!(group.marked().is_empty());

    let group = store.remove_message_from_group("g", &m2).await.unwrap();
    assert_eq!(group, MessageGroup::empty("g".to_store_uuid()));
    assert!(store.get_message_group("g").await.unwrap().is_empty());
}

async fn remove_group<S: MessageGroupStore>(store: S) {
    store.add_message_to_group("g", &message("1")).await.unwrap();
    store.add_message_to_group("g", &message("2")).await.unwrap();
    store.add_message_to_group("h", &message("3")).await.unwrap();
    let group = store.get_message_group("g").await.unwrap();
    store.mark_message_group(&group).await.unwrap();

    store.remove_message_group("g").await.unwrap();
    assert!(store.get_message_group("g").await.unwrap().is_empty());
    assert_eq!(store.get_message_group("h").await.unwrap().size(), 1);
    assert_eq!(store.message_group_count().await.unwrap(), 1);

    // removing an unknown group is harmless
    store.remove_message_group("g").await.unwrap();
}

async fn iterate_snapshots_keys<S: MessageGroupStore>(store: S) {
    for key in ["a", "b", "c"] {
        store.add_message_to_group(key, &message(key)).await.unwrap();
    }
    // a second member must not yield the group twice
    store.add_message_to_group("a", &message("a2")).await.unwrap();

    let mut groups = store.iterate_groups().await.unwrap();
    // changes after the snapshot
    store.remove_message_group("b").await.unwrap();
    store.add_message_to_group("d", &message("d")).await.unwrap();

    let mut seen = BTreeSet::new();
    while let Some(group) = groups.next().await {
        let group = group.unwrap();
        assert!(seen.insert(group.group_id()));
        if group.group_id() == "b".to_store_uuid() {
            assert!(group.is_empty());
        } else {
            assert!(!group.is_empty());
        }
    }
    let expected = ["a", "b", "c"]
        .iter()
        .map(|key| key.to_store_uuid())
        .collect::<BTreeSet<_>>();
    assert_eq!(seen, expected);
}

async fn iterate_empty_store<S: MessageGroupStore>(store: S) {
    let mut groups = store.iterate_groups().await.unwrap();
    assert!(groups.next().await.is_none());
}

async fn expire_old_groups<S: MessageGroupStore>(store: S) {
    store.add_message_to_group("old", &message("1")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    store.add_message_to_group("new", &message("2")).await.unwrap();

    let expired = store
        .expire_message_groups(Duration::from_millis(50))
        .await
        .unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].group_id(), "old".to_store_uuid());
    assert_eq!(expired[0].size(), 1);
    assert!(store.get_message_group("old").await.unwrap().is_empty());
    assert_eq!(store.get_message_group("new").await.unwrap().size(), 1);
}

macro_rules! contract_tests {
    ($($name:ident),* $(,)?) => {
        mod sqlite {
            use super::*;

            async fn store() -> SqliteMessageStore {
                SqliteMessageStore::new(test_db_pool().await)
            }

            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(store().await).await;
                }
            )*
        }

        mod mock {
            use super::*;

            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(MockMessageStore::new()).await;
                }
            )*
        }
    };
}

contract_tests!(
    add_message_stamps,
    add_saved_message_is_idempotent,
    add_unsaved_duplicate_fails,
    get_unknown_message,
    remove_returns_pre_image,
    unknown_group_is_empty,
    group_keeps_insertion_order,
    group_timestamp_is_oldest_member,
    equal_keys_share_a_group,
    key_kinds_are_separate_groups,
    mark_group_is_monotonic,
    mark_single_member,
    remove_members,
    remove_group,
    iterate_snapshots_keys,
    iterate_empty_store,
    expire_old_groups,
);
