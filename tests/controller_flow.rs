//! Batch lifecycle tests for the invitation controller
//!
//! These tests verify that:
//! 1. A run over N identities attempts each exactly once, in order
//! 2. Progress is broadcast every 10th item and a report at the end
//! 3. Stop is honoured at the next iteration boundary
//! 4. Start rejects empty lists and concurrent runs
//! 5. Single adds share the counters and ignore the stop flag
//!
//! Delays run on tokio's paused clock, so the tests finish instantly.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;

use group_invite_bot::messages;
use group_invite_bot::{
    ControllerError, ControllerSettings, InvitationController, JobOutcome, JobState,
    MembershipClient, MembershipError, Notifier,
};
use helpers::{controller, identities, RecordingSink, ScriptedMembership, ADMINS, GROUP_ID};

#[tokio::test]
async fn test_ten_successes_give_one_progress_and_a_report() {
    let membership = Arc::new(ScriptedMembership::default());
    let sink = Arc::new(RecordingSink::default());
    let ctrl = controller(membership.clone(), sink.clone(), Duration::ZERO);

    let ack = ctrl.start(identities(10)).unwrap();
    assert_eq!(ack.total, 10);

    let outcome = ctrl.wait().await.expect("job was started");
    let stats = *outcome.stats();
    assert!(matches!(outcome, JobOutcome::Completed { .. }));
    assert_eq!((stats.total, stats.success, stats.failed), (10, 10, 0));
    assert_eq!(stats.processed, 10);
    assert_eq!(stats.state, JobState::Completed);

    for admin in ADMINS {
        let texts = sink.texts_to(admin);
        assert_eq!(texts.len(), 2, "admin {admin} got {texts:?}");
        assert!(texts[0].starts_with("Progress: 10/10"));
        assert!(texts[0].contains("Success: 10"));
        assert!(texts[1].contains("Total: 10"));
        assert!(texts[1].contains("Success: 10"));
        assert!(texts[1].contains("Failed: 0"));
    }
}

#[tokio::test(start_paused = true)]
async fn test_failures_are_counted_and_run_continues() {
    let membership = Arc::new(ScriptedMembership::failing(&[
        "@user4", "@user15", "@user16",
    ]));
    let sink = Arc::new(RecordingSink::default());
    let ctrl = controller(membership.clone(), sink.clone(), Duration::from_secs(5));

    ctrl.start(identities(25)).unwrap();
    let stats = *ctrl.wait().await.unwrap().stats();

    assert_eq!(stats.success + stats.failed, 25);
    assert_eq!((stats.success, stats.failed), (22, 3));
    assert_eq!(stats.processed, 25);

    let expected: Vec<String> = (1..=25).map(|i| format!("@user{i}")).collect();
    assert_eq!(membership.calls(), expected);
    assert!(membership.groups().iter().all(|g| *g == GROUP_ID));

    let texts = sink.texts_to(ADMINS[0]);
    assert_eq!(texts.len(), 3);
    assert_eq!(texts[0], "Progress: 10/25\n✅ Success: 9\n❌ Failed: 1");
    assert_eq!(texts[1], "Progress: 20/25\n✅ Success: 17\n❌ Failed: 3");
    assert!(texts[2].starts_with("🎉"));
}

#[tokio::test(start_paused = true)]
async fn test_items_are_paced_by_the_delay() {
    let membership = Arc::new(ScriptedMembership::default());
    let sink = Arc::new(RecordingSink::default());
    let ctrl = controller(membership, sink, Duration::from_secs(5));

    let begun = Instant::now();
    ctrl.start(identities(10)).unwrap();
    ctrl.wait().await.unwrap();

    // Nine pauses between ten items, none after the last.
    let elapsed = begun.elapsed();
    assert!(elapsed >= Duration::from_secs(45), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(50), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_stop_after_third_add_halts_before_fourth() {
    let third_done = Arc::new(Notify::new());
    let membership = Arc::new(ScriptedMembership::default().signal_after(3, third_done.clone()));
    let sink = Arc::new(RecordingSink::default());
    let ctrl = controller(membership.clone(), sink.clone(), Duration::from_secs(5));

    ctrl.start(identities(10)).unwrap();
    third_done.notified().await;

    assert!(ctrl.stop());
    assert_eq!(ctrl.stats().state, JobState::StopRequested);

    let outcome = ctrl.wait().await.unwrap();
    let stats = *outcome.stats();
    assert!(matches!(outcome, JobOutcome::StoppedEarly { .. }));
    assert!(stats.success + stats.failed <= 4);
    assert_eq!(stats.success, 3);
    assert_eq!(stats.total, 10);
    assert_eq!(stats.state, JobState::StoppedEarly);
    assert_eq!(membership.calls(), vec!["@user1", "@user2", "@user3"]);

    let texts = sink.texts_to(ADMINS[0]);
    assert_eq!(texts, vec![messages::STOPPED_EARLY.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_delay_halts_within_one_interval() {
    let third_done = Arc::new(Notify::new());
    let membership = Arc::new(ScriptedMembership::default().signal_after(3, third_done.clone()));
    let sink = Arc::new(RecordingSink::default());
    let ctrl = controller(membership.clone(), sink.clone(), Duration::from_secs(5));

    ctrl.start(identities(10)).unwrap();
    third_done.notified().await;

    // Two seconds into the pause before the 4th attempt.
    tokio::time::advance(Duration::from_secs(2)).await;
    let stopped_at = Instant::now();
    assert!(ctrl.stop());

    let outcome = ctrl.wait().await.unwrap();
    let halted_after = stopped_at.elapsed();
    assert!(halted_after < Duration::from_secs(5), "halted after {halted_after:?}");
    assert!(matches!(outcome, JobOutcome::StoppedEarly { .. }));
    assert_eq!(outcome.stats().processed, 3);
    assert_eq!(membership.calls(), vec!["@user1", "@user2", "@user3"]);
    assert_eq!(sink.texts_to(ADMINS[1]), vec![messages::STOPPED_EARLY]);
}

#[tokio::test(start_paused = true)]
async fn test_counters_stay_consistent_mid_run() {
    let second_done = Arc::new(Notify::new());
    let membership =
        Arc::new(ScriptedMembership::default().signal_after(2, second_done.clone()));
    let sink = Arc::new(RecordingSink::default());
    let ctrl = controller(membership, sink, Duration::from_secs(5));

    ctrl.start(identities(10)).unwrap();
    second_done.notified().await;

    let stats = ctrl.stats();
    assert_eq!(stats.state, JobState::Running);
    assert_eq!(stats.total, 10);
    assert!(stats.success + stats.failed <= stats.processed);
    assert!(stats.processed <= stats.total);

    ctrl.stop();
    ctrl.wait().await;
}

#[tokio::test]
async fn test_empty_list_is_rejected_without_side_effects() {
    let membership = Arc::new(ScriptedMembership::default());
    let sink = Arc::new(RecordingSink::default());
    let ctrl = controller(membership.clone(), sink.clone(), Duration::ZERO);

    assert!(matches!(
        ctrl.start(Vec::new()),
        Err(ControllerError::EmptySource)
    ));
    assert!(matches!(
        ctrl.start(vec!["  ".to_string(), String::new()]),
        Err(ControllerError::EmptySource)
    ));

    let stats = ctrl.stats();
    assert_eq!((stats.total, stats.success, stats.failed), (0, 0, 0));
    assert_eq!(stats.state, JobState::NotStarted);
    assert!(ctrl.wait().await.is_none());
    assert!(sink.sent().is_empty());
    assert!(membership.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_second_start_is_rejected_while_running() {
    let membership = Arc::new(ScriptedMembership::default());
    let sink = Arc::new(RecordingSink::default());
    let ctrl = controller(membership, sink, Duration::from_secs(5));

    ctrl.start(identities(3)).unwrap();
    assert!(matches!(
        ctrl.start(identities(7)),
        Err(ControllerError::JobAlreadyRunning)
    ));
    assert_eq!(ctrl.stats().total, 3);

    ctrl.stop();
    assert!(matches!(
        ctrl.wait().await,
        Some(JobOutcome::StoppedEarly { .. })
    ));

    // A finished run frees the slot and a new start clears the stop flag.
    ctrl.start(identities(2)).unwrap();
    assert!(!ctrl.cancellation_requested());
    let stats = *ctrl.wait().await.unwrap().stats();
    assert_eq!((stats.total, stats.success), (2, 2));
}

#[tokio::test]
async fn test_stop_without_job_is_a_noop() {
    let membership = Arc::new(ScriptedMembership::default());
    let sink = Arc::new(RecordingSink::default());
    let ctrl = controller(membership, sink.clone(), Duration::ZERO);

    assert!(!ctrl.stop());
    assert!(!ctrl.stop());
    assert!(ctrl.cancellation_requested());
    assert_eq!(ctrl.stats().state, JobState::NotStarted);
    assert!(sink.sent().is_empty());

    ctrl.start(identities(2)).unwrap();
    assert!(!ctrl.cancellation_requested());
    assert!(matches!(
        ctrl.wait().await,
        Some(JobOutcome::Completed { .. })
    ));
}

#[tokio::test]
async fn test_add_one_normalizes_and_shares_counters() {
    let membership = Arc::new(ScriptedMembership::failing(&["@mallory"]));
    let sink = Arc::new(RecordingSink::default());
    let ctrl = controller(membership.clone(), sink.clone(), Duration::ZERO);

    assert_eq!(ctrl.add_one("bob").await.unwrap(), "@bob");
    assert!(matches!(
        ctrl.add_one("@mallory").await,
        Err(ControllerError::Membership(_))
    ));
    assert!(matches!(
        ctrl.add_one("   ").await,
        Err(ControllerError::EmptyIdentity)
    ));

    assert_eq!(membership.calls(), vec!["@bob", "@mallory"]);
    let stats = ctrl.stats();
    assert_eq!((stats.success, stats.failed, stats.total), (1, 1, 0));
    assert_eq!(stats.remaining(), -2);
    assert_eq!(stats.state, JobState::NotStarted);
    // Single adds are answered directly, never broadcast.
    assert!(sink.sent().is_empty());
}

#[tokio::test]
async fn test_add_one_ignores_stop_flag() {
    let membership = Arc::new(ScriptedMembership::default());
    let sink = Arc::new(RecordingSink::default());
    let ctrl = controller(membership.clone(), sink, Duration::ZERO);

    ctrl.stop();
    assert_eq!(ctrl.add_one("@zed").await.unwrap(), "@zed");
    assert_eq!(membership.calls(), vec!["@zed"]);
}

#[tokio::test]
async fn test_failed_notification_does_not_abort_run() {
    let membership = Arc::new(ScriptedMembership::default());
    let sink = Arc::new(RecordingSink::refusing([ADMINS[1]]));
    let ctrl = controller(membership, sink.clone(), Duration::ZERO);

    ctrl.start(identities(10)).unwrap();
    let outcome = ctrl.wait().await.unwrap();

    assert!(matches!(outcome, JobOutcome::Completed { .. }));
    assert_eq!(sink.texts_to(ADMINS[0]).len(), 2);
    assert!(sink.texts_to(ADMINS[1]).is_empty());
}

struct PanickingMembership;

#[async_trait]
impl MembershipClient for PanickingMembership {
    async fn add(&self, _group_id: i64, identity: &str) -> Result<(), MembershipError> {
        panic!("transport blew up on {identity}");
    }
}

#[tokio::test]
async fn test_panicked_run_is_not_reported_as_active() {
    let sink = Arc::new(RecordingSink::default());
    let ctrl = InvitationController::new(
        Arc::new(PanickingMembership),
        Notifier::new(sink, ADMINS.to_vec()),
        ControllerSettings::new(GROUP_ID, Duration::ZERO),
    );

    ctrl.start(identities(3)).unwrap();
    for _ in 0..100 {
        if ctrl.stats().state != JobState::Running {
            break;
        }
        tokio::task::yield_now().await;
    }

    // Nobody waited on the task, yet the dead run is no longer active.
    assert_eq!(ctrl.stats().state, JobState::StoppedEarly);
    assert!(!ctrl.is_running());
    assert!(!ctrl.stop());
    assert!(ctrl.start(identities(1)).is_ok());
}
