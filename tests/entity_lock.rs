//! Concurrent saves through planners sharing one lock registry

mod common;

use amocrm_sdk::api::models::{Contact, Entity, Lead};
use amocrm_sdk::api::{BatchPlanner, EntityLocks, Resource};
use common::{RecordingTransport, account};
use std::sync::Arc;
use std::time::Duration;

fn transport() -> Arc<RecordingTransport> {
    Arc::new(RecordingTransport::new().with_delay(Duration::from_millis(50)))
}

#[tokio::test]
async fn test_updates_of_same_entity_do_not_overlap() {
    let transport = transport();
    let planner = BatchPlanner::new(transport.clone()).with_locks(EntityLocks::new());
    let other = planner.clone();
    let account = account();

    let mut first = Lead::with_id(42);
    let mut second = Lead::with_id(42);
    first.common.name = Some("First".to_string());
    second.common.name = Some("Second".to_string());
    let mut first_batch: [&mut dyn Entity; 1] = [&mut first];
    let mut second_batch: [&mut dyn Entity; 1] = [&mut second];

    let (a, b) = tokio::join!(
        planner.save_many(&account, &mut first_batch),
        other.save_many(&account, &mut second_batch),
    );

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(transport.calls().len(), 2);
    assert_eq!(transport.max_in_flight(), 1);
    assert!(!planner.locks().is_locked(Resource::Leads, 42));
}

#[tokio::test]
async fn test_independent_planners_share_locks() {
    let transport = transport();
    let planner = BatchPlanner::new(transport.clone());
    let other = BatchPlanner::new(transport.clone());
    let account = account();
    assert!(planner.locks().same_registry(other.locks()));

    // Id used by no other test in this binary
    let mut first = Lead::with_id(4201);
    let mut second = Lead::with_id(4201);
    let mut first_batch: [&mut dyn Entity; 1] = [&mut first];
    let mut second_batch: [&mut dyn Entity; 1] = [&mut second];

    let (a, b) = tokio::join!(
        planner.save_many(&account, &mut first_batch),
        other.save_many(&account, &mut second_batch),
    );

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(transport.calls().len(), 2);
    assert_eq!(transport.max_in_flight(), 1);
    assert!(!EntityLocks::shared().is_locked(Resource::Leads, 4201));
}

#[tokio::test]
async fn test_different_entities_run_concurrently() {
    let transport = transport();
    let locks = EntityLocks::new();
    let planner = BatchPlanner::new(transport.clone()).with_locks(locks.clone());
    let other = BatchPlanner::new(transport.clone()).with_locks(locks.clone());
    let account = account();

    let mut lead = Lead::with_id(42);
    let mut contact = Contact::with_id(42);
    let mut leads: [&mut dyn Entity; 1] = [&mut lead];
    let mut contacts: [&mut dyn Entity; 1] = [&mut contact];

    let (a, b) = tokio::join!(
        planner.save_many(&account, &mut leads),
        other.save_many(&account, &mut contacts),
    );

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(transport.max_in_flight(), 2);
    assert_eq!(locks.tracked(), 0);
}

#[tokio::test]
async fn test_creates_take_no_lock() {
    let transport = transport();
    let planner = BatchPlanner::new(transport.clone());
    let other = planner.clone();
    let account = account();

    let mut first = Lead::new("First");
    let mut second = Lead::new("Second");
    let mut first_batch: [&mut dyn Entity; 1] = [&mut first];
    let mut second_batch: [&mut dyn Entity; 1] = [&mut second];

    let (a, b) = tokio::join!(
        planner.save_many(&account, &mut first_batch),
        other.save_many(&account, &mut second_batch),
    );

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(transport.max_in_flight(), 2);
}

#[tokio::test]
async fn test_lock_released_after_failed_save() {
    let transport = Arc::new(RecordingTransport::new().respond(None));
    let planner = BatchPlanner::new(transport.clone()).with_locks(EntityLocks::new());
    let mut lead = Lead::with_id(5);

    let result = planner.save_many(&account(), &mut [&mut lead]).await;

    assert!(result.is_err());
    assert!(!planner.locks().is_locked(Resource::Leads, 5));
    assert_eq!(planner.locks().tracked(), 0);
}

#[tokio::test]
async fn test_waiting_saver_proceeds_after_release() {
    let locks = EntityLocks::new();
    let transport = Arc::new(RecordingTransport::new());
    let planner = BatchPlanner::new(transport.clone()).with_locks(locks.clone());

    let held = locks.acquire(Resource::Leads, Some(9)).await;
    assert!(locks.is_locked(Resource::Leads, 9));

    let account = account();
    let mut lead = Lead::with_id(9);
    let mut batch: [&mut dyn Entity; 1] = [&mut lead];
    let save = planner.save_many(&account, &mut batch);
    let release = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(transport.calls().is_empty());
        EntityLocks::release(held);
    };

    let (result, ()) = tokio::join!(save, release);
    assert!(result.is_ok());
    assert_eq!(transport.calls().len(), 1);
}
