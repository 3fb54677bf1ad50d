use news_core::{
    LocalStore, NewsDraft, NewsStatus, NewsStore, Snapshot, StatusFilter, UiState, VoteDir,
};

fn snapshot_with_votes(votes: &str) -> Snapshot {
    let raw = format!(
        r#"{{
            "news": [
                {{ "id": "a", "topic": "Alpha", "reportedAt": "2025-05-05T00:00:00Z" }},
                {{ "id": "b", "topic": "Beta", "reportedAt": "2025-05-04T00:00:00Z" }},
                {{ "id": "c", "topic": "Gamma", "reportedAt": "2025-05-03T00:00:00Z" }},
                {{ "id": "d", "topic": "Delta", "reportedAt": "2025-05-02T00:00:00Z" }},
                {{ "id": "e", "topic": "Epsilon", "reportedAt": "2025-05-01T00:00:00Z" }},
                {{ "id": "f", "topic": "Zeta", "reportedAt": "2025-04-30T00:00:00Z" }},
                {{ "id": "g", "topic": "Eta", "reportedAt": "2025-04-29T00:00:00Z" }}
            ],
            "votes": {votes}
        }}"#
    );
    Snapshot::from_json(&raw).expect("valid snapshot")
}

async fn degraded_store(snapshot: Snapshot) -> NewsStore {
    let store = NewsStore::new(None, LocalStore::in_memory(), snapshot, "tester-1".into());
    store.fetch_news().await;
    store
}

#[tokio::test]
async fn status_is_a_pure_function_of_votes() {
    let store = degraded_store(snapshot_with_votes(
        r#"[
            { "id": "v1", "newsId": "a", "dir": 1, "userId": "u1" },
            { "id": "v2", "newsId": "a", "dir": 1, "userId": "u2" },
            { "id": "v3", "newsId": "a", "dir": -1, "userId": "u3" },
            { "id": "v4", "newsId": "b", "dir": 1, "userId": "u1" },
            { "id": "v5", "newsId": "b", "dir": -1, "userId": "u2" }
        ]"#,
    ))
    .await;

    assert_eq!(store.status_for("a").await, NewsStatus::NonFake);
    assert_eq!(store.status_for("b").await, NewsStatus::Neutral);
    assert_eq!(store.status_for("c").await, NewsStatus::Neutral);

    // A single vote already tips the classification.
    store.vote("c", VoteDir::Fake).await.expect("vote");
    assert_eq!(store.status_for("c").await, NewsStatus::Fake);
}

#[tokio::test]
async fn paged_news_partitions_filtered_news_exactly() {
    let store = degraded_store(snapshot_with_votes("[]")).await;
    let mut ui = UiState::default();
    ui.set_page_size(3);

    let filtered = store.filtered_news(&ui).await;
    assert_eq!(filtered.len(), 7);
    let total = store.total_pages(&ui).await;
    assert_eq!(total, 3);

    let mut rebuilt = Vec::new();
    for page in 1..=total {
        ui.set_page(page, total);
        let chunk = store.paged_news(&ui).await;
        assert!(chunk.len() <= ui.page_size());
        rebuilt.extend(chunk);
    }
    assert_eq!(rebuilt, filtered, "no gaps, no duplicates");
}

#[tokio::test]
async fn filter_and_search_reset_page() {
    let store = degraded_store(snapshot_with_votes(
        r#"[{ "id": "v1", "newsId": "a", "dir": -1, "userId": "u1" }]"#,
    ))
    .await;
    let mut ui = UiState::default();
    ui.set_page_size(2);
    let total = store.total_pages(&ui).await;
    ui.set_page(3, total);
    assert_eq!(ui.page(), 3);

    ui.set_filter(StatusFilter::Fake);
    assert_eq!(ui.page(), 1);
    let fake_only = store.filtered_news(&ui).await;
    assert_eq!(fake_only.len(), 1);
    assert_eq!(fake_only[0].id, "a");

    ui.set_page(5, 1);
    assert_eq!(ui.page(), 1, "page clamps to the filtered page count");

    ui.set_filter(StatusFilter::All);
    ui.set_search("  zeta ");
    assert_eq!(ui.page(), 1);
    assert_eq!(ui.search(), "zeta");
    let found = store.filtered_news(&ui).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "f");
}

#[tokio::test]
async fn degraded_add_news_lands_on_top_with_fresh_id() {
    let local = LocalStore::in_memory();
    let store = NewsStore::new(None, local.clone(), Snapshot::bundled(), "tester-1".into());
    store.fetch_news().await;

    let ui = UiState::default();
    let before = store.filtered_news(&ui).await;
    let created = store
        .add_news(NewsDraft {
            topic: "Breaking: local creation".into(),
            short_detail: "Created while offline.".into(),
            ..Default::default()
        })
        .await
        .expect("degraded add_news cannot fail");

    assert!(
        before.iter().all(|n| n.id != created.id),
        "generated id must be distinct from all existing ids"
    );

    let news = store.filtered_news(&ui).await;
    assert_eq!(news[0].id, created.id, "new item appears first on page 1");
    assert_eq!(news.len(), before.len() + 1);

    // The item survives a reload of a fresh store over the same persistence.
    let store2 = NewsStore::new(None, local, Snapshot::bundled(), "tester-1".into());
    store2.fetch_news().await;
    let news2 = store2.filtered_news(&ui).await;
    assert_eq!(news2[0].id, created.id);
}

#[tokio::test]
async fn degraded_vote_overwrites_and_persists() {
    let local = LocalStore::in_memory();
    let store = NewsStore::new(
        None,
        local.clone(),
        snapshot_with_votes("[]"),
        "tester-1".into(),
    );
    store.fetch_news().await;

    store.vote("a", VoteDir::NotFake).await.expect("vote up");
    store.vote("a", VoteDir::Fake).await.expect("vote down");

    let tally = store.votes_for("a").await;
    assert_eq!((tally.up, tally.down), (0, 1));
    assert_eq!(tally.my_vote, Some(VoteDir::Fake));

    let persisted: Vec<news_core::VoteItem> = local
        .get(news_core::persist::keys::VOTES, Vec::new())
        .await;
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].dir, VoteDir::Fake);
}

#[tokio::test]
async fn comments_merge_seed_and_user_newest_first() {
    let store = degraded_store(snapshot_with_votes("[]")).await;

    store
        .add_comment("a", "most recent", None)
        .await
        .expect("add comment");
    store
        .add_comment("b", "other item", None)
        .await
        .expect("add comment");

    let comments = store.comments_for("a").await;
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "most recent");
    assert_eq!(comments[0].author, "You");
}

#[tokio::test]
async fn bundled_snapshot_is_valid_and_populated() {
    let snapshot = Snapshot::bundled();
    assert_eq!(snapshot.news.len(), 5);
    assert!(!snapshot.comments.is_empty());
    assert!(!snapshot.votes.is_empty());
    assert!(
        snapshot.news.iter().all(|n| !n.id.is_empty()),
        "every seed record carries an id"
    );
}
