use tempfile::TempDir;

use konsilium_knowledge::errors::KnowledgeError;
use konsilium_knowledge::models::Segment;
use konsilium_knowledge::storage::SegmentStore;

fn segment(id: &str, domain: &str, ordinal: i64, content: &str) -> Segment {
    Segment {
        id: id.to_string(),
        domain: domain.to_string(),
        source: "files/guideline.txt".to_string(),
        page: 1,
        ordinal,
        content: content.to_string(),
    }
}

async fn open_store(temp: &TempDir) -> SegmentStore {
    SegmentStore::open(&temp.path().join("guidelines.sqlite3"), Some(4))
        .await
        .expect("open store")
}

#[tokio::test]
async fn empty_store_returns_no_hits() {
    let temp = TempDir::new().expect("tempdir");
    let store = open_store(&temp).await;

    let hits = store.search(&[1.0, 0.0, 0.0, 0.0], 3, None).await.unwrap();
    assert!(hits.is_empty());

    // A store that never saw a vector (no dimension yet) behaves the same.
    let bare = SegmentStore::open(&temp.path().join("bare.sqlite3"), None)
        .await
        .unwrap();
    let hits = bare.search(&[1.0, 0.0, 0.0, 0.0], 3, None).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn domain_filter_never_leaks_other_domains() {
    let temp = TempDir::new().expect("tempdir");
    let store = open_store(&temp).await;

    store
        .upsert(
            &[
                segment("bladder_0_aaaa", "bladder", 0, "BCG induction"),
                segment("bladder_1_bbbb", "bladder", 1, "cystoscopy follow-up"),
                segment("prostate_0_cccc", "prostate", 0, "PSA screening"),
            ],
            &[
                vec![1.0, 0.0, 0.0, 0.0],
                vec![0.9, 0.1, 0.0, 0.0],
                vec![0.0, 1.0, 0.0, 0.0],
            ],
        )
        .await
        .unwrap();

    let hits = store
        .search(&[1.0, 0.0, 0.0, 0.0], 3, Some("bladder"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.segment.domain == "bladder"));
    assert_eq!(hits[0].segment.id, "bladder_0_aaaa");

    let hits = store
        .search(&[1.0, 0.0, 0.0, 0.0], 3, Some("prostate"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].segment.domain, "prostate");
}

#[tokio::test]
async fn unknown_domain_is_empty_not_an_error() {
    let temp = TempDir::new().expect("tempdir");
    let store = open_store(&temp).await;
    store
        .upsert(
            &[segment("bladder_0_aaaa", "bladder", 0, "BCG induction")],
            &[vec![1.0, 0.0, 0.0, 0.0]],
        )
        .await
        .unwrap();

    let hits = store
        .search(&[1.0, 0.0, 0.0, 0.0], 3, Some("kidney"))
        .await
        .unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn equal_distances_are_ordered_by_ordinal_then_id() {
    let temp = TempDir::new().expect("tempdir");
    let store = open_store(&temp).await;

    // Identical vectors: every distance ties, ordering must still be stable.
    store
        .upsert(
            &[
                segment("bladder_5_eeee", "bladder", 5, "late section"),
                segment("bladder_2_dddd", "bladder", 2, "early section"),
                segment("bladder_2_aaaa", "bladder", 2, "early twin"),
            ],
            &[
                vec![0.0, 0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0, 0.0],
            ],
        )
        .await
        .unwrap();

    let first = store
        .search(&[0.0, 0.0, 1.0, 0.0], 3, Some("bladder"))
        .await
        .unwrap();
    let ids: Vec<&str> = first.iter().map(|h| h.segment.id.as_str()).collect();
    assert_eq!(ids, vec!["bladder_2_aaaa", "bladder_2_dddd", "bladder_5_eeee"]);

    let second = store
        .search(&[0.0, 0.0, 1.0, 0.0], 3, Some("bladder"))
        .await
        .unwrap();
    let again: Vec<&str> = second.iter().map(|h| h.segment.id.as_str()).collect();
    assert_eq!(ids, again, "repeated searches must return identical results");
}

#[tokio::test]
async fn upsert_replaces_an_existing_id() {
    let temp = TempDir::new().expect("tempdir");
    let store = open_store(&temp).await;

    store
        .upsert(
            &[segment("bladder_0_aaaa", "bladder", 0, "old content")],
            &[vec![1.0, 0.0, 0.0, 0.0]],
        )
        .await
        .unwrap();
    store
        .upsert(
            &[segment("bladder_0_aaaa", "bladder", 0, "new content")],
            &[vec![0.0, 0.0, 0.0, 1.0]],
        )
        .await
        .unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_segments, 1);

    let hits = store
        .search(&[0.0, 0.0, 0.0, 1.0], 1, Some("bladder"))
        .await
        .unwrap();
    assert_eq!(hits[0].segment.content, "new content");
}

#[tokio::test]
async fn upsert_rejects_mismatched_lengths_and_dimensions() {
    let temp = TempDir::new().expect("tempdir");
    let store = open_store(&temp).await;

    let err = store
        .upsert(
            &[
                segment("bladder_0_aaaa", "bladder", 0, "a"),
                segment("bladder_1_bbbb", "bladder", 1, "b"),
            ],
            &[vec![1.0, 0.0, 0.0, 0.0]],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, KnowledgeError::LengthMismatch { .. }));

    let err = store
        .upsert(
            &[segment("bladder_0_aaaa", "bladder", 0, "a")],
            &[vec![1.0, 0.0]],
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        KnowledgeError::DimensionMismatch {
            expected: 4,
            actual: 2
        }
    ));

    let err = store
        .search(&[1.0, 0.0], 1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, KnowledgeError::DimensionMismatch { .. }));
}

#[tokio::test]
async fn delete_and_stats_track_domains() {
    let temp = TempDir::new().expect("tempdir");
    let store = open_store(&temp).await;

    store
        .upsert(
            &[
                segment("bladder_0_aaaa", "bladder", 0, "a"),
                segment("bladder_1_bbbb", "bladder", 1, "b"),
                segment("prostate_0_cccc", "prostate", 0, "c"),
            ],
            &[
                vec![1.0, 0.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0, 0.0],
                vec![0.0, 0.0, 1.0, 0.0],
            ],
        )
        .await
        .unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_segments, 3);
    assert_eq!(stats.per_domain.get("bladder"), Some(&2));
    assert_eq!(stats.per_domain.get("prostate"), Some(&1));

    let removed = store.delete_domain("bladder").await.unwrap();
    assert_eq!(removed, 2);
    let hits = store
        .search(&[1.0, 0.0, 0.0, 0.0], 3, Some("bladder"))
        .await
        .unwrap();
    assert!(hits.is_empty());

    let removed = store.clear_all().await.unwrap();
    assert_eq!(removed, 1);
    assert_eq!(store.stats().await.unwrap().total_segments, 0);
}

#[tokio::test]
async fn delete_by_id_removes_only_named_segments() {
    let temp = TempDir::new().expect("tempdir");
    let store = open_store(&temp).await;

    store
        .upsert(
            &[
                segment("bladder_0_aaaa", "bladder", 0, "a"),
                segment("bladder_1_bbbb", "bladder", 1, "b"),
            ],
            &[vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0, 0.0]],
        )
        .await
        .unwrap();

    let removed = store
        .delete_ids(&["bladder_0_aaaa".to_string()])
        .await
        .unwrap();
    assert_eq!(removed, 1);

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_segments, 1);
}
