mod common;

use common::*;
use odbc_mirror::testing::InMemoryConnector;
use odbc_mirror::MirrorRequest;
use std::sync::Arc;
use std::time::Duration;

/// Two overwriting jobs into the same destination must not interleave: each
/// drop-and-recreate happens only after the other job's batches are done.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_destination_jobs_are_serialized() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let db = dir.path().join("mirror.db");

    let connector = Arc::new(
        InMemoryConnector::new()
            .with_table("items", numbered_table(500))
            .with_batch_delay(Duration::from_millis(10)),
    );
    let mirror = mirror_for(single_registry(), connector.clone(), &db, 50);

    let a = tokio::spawn({
        let mirror = mirror.clone();
        async move {
            mirror
                .mirror_table(MirrorRequest::new("items").overwrite(true))
                .await
        }
    });
    let b = tokio::spawn({
        let mirror = mirror.clone();
        async move {
            mirror
                .mirror_table(MirrorRequest::new("items").dest_table("ITEMS").overwrite(true))
                .await
        }
    });

    let (a, b) = (a.await?, b.await?);
    assert!(a.is_success(), "{a:?}");
    assert!(b.is_success(), "{b:?}");
    assert_eq!(a.rows_copied, 500);
    assert_eq!(b.rows_copied, 500);
    assert_eq!(row_count(&db, "items"), 500);

    // The guard covers the whole job, so both source connections were never open together
    assert_eq!(connector.peak_open_connections(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_destinations_run_independently() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let db = dir.path().join("mirror.db");

    let connector = Arc::new(
        InMemoryConnector::new()
            .with_table("left", numbered_table(300))
            .with_table("right", numbered_table(300))
            .with_batch_delay(Duration::from_millis(20)),
    );
    let mirror = mirror_for(single_registry(), connector.clone(), &db, 50);

    let (left, right) = tokio::join!(
        mirror.mirror_table(MirrorRequest::new("left")),
        mirror.mirror_table(MirrorRequest::new("right")),
    );

    assert!(left.is_success(), "{left:?}");
    assert!(right.is_success(), "{right:?}");
    assert_eq!(row_count(&db, "left"), 300);
    assert_eq!(row_count(&db, "right"), 300);
    assert_eq!(connector.peak_open_connections(), 2);
    assert_eq!(connector.open_connections(), 0);
    Ok(())
}
