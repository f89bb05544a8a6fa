//! Busy-retry scenarios

use crate::prelude::*;

fn busy_policy(interval: u64, timeout: u64) -> CoordinatorConfig {
    CoordinatorConfig {
        busy: RetryPolicy::new(Duration::from_secs(interval), Duration::from_secs(timeout)),
        ..CoordinatorConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn busy_twice_then_accepted_retries_twice() {
    let site = Site::new().standalone("gw-1");
    site.plane.push_submit_error(RemoteError::busy("task-x running"));
    site.plane.push_submit_error(RemoteError::busy("task-x running"));

    let start = Instant::now();
    let done = site
        .coordinator
        .execute(&nat_update("gw-1", "snat-1"))
        .await
        .unwrap();

    assert_eq!(done.attempts, 3);
    assert_eq!(site.plane.submit_count(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn retries_until_an_outside_writer_finishes() {
    let site = Site::new().standalone("gw-1");
    site.plane.set_polls_to_complete(2);

    // Another client's task holds gw-1 until it is polled twice at t=4s
    let outside = site.plane.submit(&nat_update("gw-1", "other")).await.unwrap();
    let plane = site.plane.clone();
    let observer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(4)).await;
        plane.poll_status(&outside).await.unwrap();
        plane.poll_status(&outside).await.unwrap()
    });

    let done = site
        .coordinator
        .execute(&nat_update("gw-1", "snat-1"))
        .await
        .unwrap();

    assert_eq!(observer.await.unwrap(), TaskStatus::Success);
    // Rejected at 0s and 3s, accepted at 6s
    assert_eq!(done.attempts, 3);
    assert_eq!(site.plane.busy_rejections(), 2);
}

#[tokio::test(start_paused = true)]
async fn always_busy_gives_up_at_the_timeout() {
    let site = Site::with_config(busy_policy(3, 10)).standalone("gw-1");
    site.plane.set_polls_to_complete(u32::MAX);
    site.plane.submit(&nat_update("gw-1", "stuck")).await.unwrap();

    let start = Instant::now();
    let err = site
        .coordinator
        .execute(&nat_update("gw-1", "snat-1"))
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    assert_eq!(err.kind(), "retry_timeout");
    assert!(err.never_submitted());
    assert_eq!(elapsed, Duration::from_secs(10));
    assert!(!site.is_locked("gw-1"));
}

#[tokio::test(start_paused = true)]
async fn terminal_rejection_returns_without_sleeping() {
    let site = Site::new().standalone("gw-1");
    site.plane
        .push_submit_error(RemoteError::terminal("permission denied"));

    let start = Instant::now();
    let err = site
        .coordinator
        .execute(&nat_update("gw-1", "snat-1"))
        .await
        .unwrap_err();

    assert_eq!(err, CoordinationError::Terminal("permission denied".into()));
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(site.plane.submit_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn unknown_gateway_fails_before_submission() {
    let site = Site::new();

    let err = site
        .coordinator
        .execute(&nat_update("gw-404", "snat-1"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CoordinationError::UnresolvedOwner { ref reason, .. } if reason.contains("gw-404")
    ));
    assert_eq!(site.plane.submit_count(), 0);
}
