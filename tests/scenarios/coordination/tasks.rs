//! Task-waiting scenarios

use crate::prelude::*;

fn task_policy(interval: u64, timeout: u64) -> CoordinatorConfig {
    CoordinatorConfig {
        task: RetryPolicy::new(Duration::from_secs(interval), Duration::from_secs(timeout)),
        ..CoordinatorConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn already_finished_task_is_never_polled() {
    let plane = FakeControlPlane::new();
    let waiter = TaskWaiter::new(RetryPolicy::default());
    let handle = TaskHandle::new("task-9", "update nat_rule snat-1").with_status(TaskStatus::Success);

    let report = waiter.wait(&plane, &handle).await.unwrap();

    assert_eq!(report.polls, 0);
    assert_eq!(plane.poll_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn lock_is_held_until_the_task_finishes() {
    let site = Site::with_config(task_policy(2, 60)).standalone("gw-1");
    site.plane.set_polls_to_complete(4);

    let running = site.spawn(nat_update("gw-1", "snat-1"));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(site.is_locked("gw-1"));
    assert!(site.plane.is_parent_busy("gw-1"));

    let done = running.await.unwrap().unwrap();
    assert_eq!(done.task.polls, 4);
    assert_eq!(done.task.waited, Duration::from_secs(6));
    assert!(!site.is_locked("gw-1"));
}

#[tokio::test(start_paused = true)]
async fn failed_task_surfaces_its_detail() {
    let site = Site::new().standalone("gw-1");
    site.plane.push_task_outcome(TaskStatus::Failed {
        detail: "subnet overlaps 10.0.0.0/24".to_string(),
    });

    let err = site
        .coordinator
        .execute(&nat_update("gw-1", "snat-1"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("subnet overlaps 10.0.0.0/24"));
    assert!(!err.leaves_state_unknown());
    assert!(!site.is_locked("gw-1"));
}

#[tokio::test(start_paused = true)]
async fn canceled_task_is_an_error() {
    let site = Site::new().standalone("gw-1");
    site.plane.push_task_outcome(TaskStatus::Canceled { detail: None });

    let err = site
        .coordinator
        .execute(&firewall_delete("gw-1", "allow-ssh"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        CoordinationError::TaskCanceled {
            task_id: "task-1".to_string(),
            detail: None,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn timed_out_task_leaves_parent_busy_for_the_next_writer() {
    let config = CoordinatorConfig {
        busy: RetryPolicy::new(Duration::from_secs(3), Duration::from_secs(9)),
        ..task_policy(2, 10)
    };
    let site = Site::with_config(config).standalone("gw-1");
    site.plane.set_polls_to_complete(1000);

    let err = site
        .coordinator
        .execute(&nat_update("gw-1", "snat-1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "task_timeout");
    assert!(err.leaves_state_unknown());

    // The lock is released but the remote parent is still mid-mutation
    assert!(!site.is_locked("gw-1"));
    let next = site
        .coordinator
        .execute(&nat_update("gw-1", "snat-2"))
        .await
        .unwrap_err();
    assert_eq!(next.kind(), "retry_timeout");
}

#[tokio::test(start_paused = true)]
async fn poll_failure_is_not_swallowed() {
    let site = Site::new().standalone("gw-1");
    site.plane.set_polls_to_complete(3);

    let running = site.spawn(nat_update("gw-1", "snat-1"));
    tokio::time::sleep(Duration::from_secs(1)).await;
    site.plane
        .push_poll_error(RemoteError::terminal("session expired"));

    let err = running.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), "poll");
    assert!(err.to_string().contains("session expired"));
    assert!(!site.is_locked("gw-1"));
}
