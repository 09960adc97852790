use futures::future::join_all;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stratus::cache::{CacheError, CacheKey, InvalidationRouter, ResultCache};
use stratus::error::Error;

const TTL: Duration = Duration::from_secs(60);

fn key() -> CacheKey {
    CacheKey::new("list_servers", &[("zone", "az1")])
}

#[tokio::test(start_paused = true)]
async fn test_herd_prevention_single_flight() {
    let cache = Arc::new(ResultCache::<u32>::new());
    let computes = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let cache = cache.clone();
        let computes = computes.clone();
        handles.push(tokio::spawn(async move {
            cache
                .get_or_compute(&key(), TTL, || async {
                    let nth = computes.fetch_add(1, Ordering::SeqCst);
                    // a slow backend: every other caller attaches while
                    // this flight is pending
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok(nth)
                })
                .await
        }));
    }

    let values: Vec<u32> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    // exactly one compute ran, and every caller saw its result
    assert_eq!(computes.load(Ordering::SeqCst), 1);
    assert!(values.iter().all(|v| *v == 0));

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.joined_flights, 9);
}

#[tokio::test(start_paused = true)]
async fn test_waiters_share_the_compute_failure() {
    let cache = Arc::new(ResultCache::<u32>::new());
    let computes = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();
    for _ in 0..5 {
        let cache = cache.clone();
        let computes = computes.clone();
        handles.push(tokio::spawn(async move {
            cache
                .get_or_compute(&key(), TTL, || async {
                    computes.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Err::<u32, _>(Error::Custom("backend down".to_string()))
                })
                .await
        }));
    }

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(CacheError::ComputeFailed(_))));
    }
    assert_eq!(computes.load(Ordering::SeqCst), 1);

    // the failure was not cached; a later caller computes fresh
    let value = cache.get_or_compute(&key(), TTL, || async { Ok(9) }).await.unwrap();
    assert_eq!(value, 9);
}

#[tokio::test]
async fn test_expired_entry_triggers_one_fresh_compute() {
    let cache = ResultCache::<u32>::new();
    let ttl = Duration::from_millis(40);

    cache.get_or_compute(&key(), ttl, || async { Ok(1) }).await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;

    // entry is older than its TTL and must not be served
    let value = cache.get_or_compute(&key(), ttl, || async { Ok(2) }).await.unwrap();
    assert_eq!(value, 2);
}

#[tokio::test]
async fn test_invalidate_beats_remaining_ttl() {
    let cache = ResultCache::<u32>::new();

    cache.get_or_compute(&key(), TTL, || async { Ok(1) }).await.unwrap();
    assert!(cache.invalidate_key(&key()));

    let value = cache.get_or_compute(&key(), TTL, || async { Ok(2) }).await.unwrap();
    assert_eq!(value, 2);
}

#[tokio::test(start_paused = true)]
async fn test_invalidation_mid_flight_delivers_but_does_not_store() {
    let cache = Arc::new(ResultCache::<u32>::new());

    let reader = {
        let cache = cache.clone();
        tokio::spawn(async move {
            cache
                .get_or_compute(&key(), TTL, || async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok(5)
                })
                .await
        })
    };

    // let the flight start, then drop its slot while it is pending
    tokio::time::sleep(Duration::from_millis(20)).await;
    cache.invalidate_prefix("list_servers:");

    // the in-flight caller still gets its value
    assert_eq!(reader.await.unwrap().unwrap(), 5);

    // but the result was not stored: the next read computes fresh
    let value = cache.get_or_compute(&key(), TTL, || async { Ok(6) }).await.unwrap();
    assert_eq!(value, 6);
}

#[tokio::test(start_paused = true)]
async fn test_distinct_keys_do_not_share_flights() {
    let cache = Arc::new(ResultCache::<u32>::new());
    let computes = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();
    for zone in ["az1", "az2", "az3"] {
        let cache = cache.clone();
        let computes = computes.clone();
        handles.push(tokio::spawn(async move {
            let key = CacheKey::new("list_servers", &[("zone", zone)]);
            cache
                .get_or_compute(&key, TTL, || async {
                    computes.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(0)
                })
                .await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(computes.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_router_drives_invalidation_end_to_end() -> anyhow::Result<()> {
    let cache = ResultCache::<u32>::new();
    let router = InvalidationRouter::builder()
        .route("create_server", &["list_servers:"])
        .route("delete_server", &["list_servers:", "get_server:"])
        .build()?;

    cache.get_or_compute(&key(), TTL, || async { Ok(1) }).await?;
    cache
        .get_or_compute(&CacheKey::new("get_server", &[("id", "s1")]), TTL, || async {
            Ok(2)
        })
        .await?;

    // a create drops only the listing family
    assert_eq!(router.on_mutation(&cache, "create_server")?, 1);
    assert_eq!(cache.stats().settled_entries, 1);

    // a delete sweeps both families
    cache.get_or_compute(&key(), TTL, || async { Ok(3) }).await?;
    assert_eq!(router.on_mutation(&cache, "delete_server")?, 2);
    assert_eq!(cache.stats().settled_entries, 0);
    Ok(())
}
