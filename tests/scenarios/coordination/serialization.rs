//! Serialization scenarios
//!
//! Mutations against one parent never overlap; mutations against unrelated
//! parents do.

use crate::prelude::*;

#[tokio::test(start_paused = true)]
async fn second_mutation_on_a_gateway_waits_for_the_first_task() {
    let site = Site::new().standalone("gw-1");
    site.plane.set_polls_to_complete(3);

    let first = site.spawn(nat_update("gw-1", "snat-1"));
    let second = site.spawn(nat_update("gw-1", "snat-2"));

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    assert_eq!(
        site.timeline(),
        vec![
            "accepted task-1",
            "finished task-1",
            "accepted task-2",
            "finished task-2"
        ]
    );
    assert_eq!(site.plane.busy_rejections(), 0);
    assert_eq!(first.attempts + second.attempts, 2);
    assert!(!site.is_locked("gw-1"));
}

#[tokio::test(start_paused = true)]
async fn gateways_in_one_group_share_a_lock() {
    let site = Site::new()
        .grouped("gw-1", "grp-A")
        .grouped("gw-2", "grp-A");
    site.plane.set_polls_to_complete(2);

    let objects = [
        ManagedObject::on_gateway(ObjectKind::NatRule, "snat-1", "gw-1"),
        ManagedObject::on_gateway(ObjectKind::NatRule, "snat-2", "gw-2"),
    ];
    assert_eq!(
        site.coordinator.resolve(&objects[..1]).await.unwrap(),
        site.coordinator.resolve(&objects[1..]).await.unwrap(),
    );

    let first = site.spawn(nat_update("gw-1", "snat-1"));
    let second = site.spawn(nat_update("gw-2", "snat-2"));
    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    assert_eq!(first.keys, vec![LockKey::from("grp-A")]);
    assert_eq!(second.keys, vec![LockKey::from("grp-A")]);
    assert_eq!(site.plane.busy_rejections(), 0);
    assert_eq!(
        site.timeline(),
        vec![
            "accepted task-1",
            "finished task-1",
            "accepted task-2",
            "finished task-2"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn separate_groups_proceed_independently() {
    let site = Site::new()
        .grouped("gw-1", "grp-A")
        .grouped("gw-2", "grp-B")
        .standalone("gw-3");
    site.plane.set_polls_to_complete(3);

    let handles = [
        site.spawn(nat_update("gw-1", "snat-1")),
        site.spawn(nat_update("gw-2", "snat-2")),
        site.spawn(nat_update("gw-3", "snat-3")),
    ];
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let timeline = site.timeline();
    assert_eq!(
        &timeline[..3],
        &["accepted task-1", "accepted task-2", "accepted task-3"]
    );
    assert_eq!(site.plane.busy_rejections(), 0);
}

#[tokio::test(start_paused = true)]
async fn create_update_and_delete_share_one_discipline() {
    let site = Site::new().standalone("gw-1");
    site.plane.set_polls_to_complete(2);

    let handles = [
        site.spawn(firewall_create("gw-1", "allow-web")),
        site.spawn(nat_update("gw-1", "snat-1")),
        site.spawn(firewall_delete("gw-1", "allow-ssh")),
    ];
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(site.plane.busy_rejections(), 0);
    assert_eq!(
        site.timeline(),
        vec![
            "accepted task-1",
            "finished task-1",
            "accepted task-2",
            "finished task-2",
            "accepted task-3",
            "finished task-3"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn many_writers_on_one_gateway_all_complete() {
    let site = Site::new().standalone("gw-1");
    site.plane.set_polls_to_complete(2);

    let handles: Vec<_> = (0..10)
        .map(|i| site.spawn(nat_update("gw-1", &format!("snat-{i}"))))
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let timeline = site.timeline();
    assert_eq!(timeline.len(), 20);
    // Strict accept/finish alternation: never two tasks in flight
    for pair in timeline.chunks(2) {
        let accepted = pair[0].strip_prefix("accepted ").unwrap();
        let finished = pair[1].strip_prefix("finished ").unwrap();
        assert_eq!(accepted, finished);
    }
    assert_eq!(site.plane.busy_rejections(), 0);
}

#[tokio::test(start_paused = true)]
async fn uncoordinated_writers_collide() {
    let site = Site::new().standalone("gw-1");

    site.plane.submit(&nat_update("gw-1", "snat-1")).await.unwrap();
    let second = site.plane.submit(&nat_update("gw-1", "snat-2")).await;

    assert!(second.unwrap_err().is_busy());
    assert_eq!(site.plane.busy_rejections(), 1);
}
