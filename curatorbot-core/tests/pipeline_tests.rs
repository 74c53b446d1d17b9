// File: curatorbot-core/tests/pipeline_tests.rs
//
// End-to-end runs through the wired pipeline: connector events in on the
// bus, tracking/scoring state and escalation notices out.

use std::sync::Arc;
use chrono::Utc;
use tokio::time::{sleep, timeout, Duration};

use curatorbot_common::models::events::{
    CuratorActionEvent, CuratorActionKind, HelpCandidateEvent,
};
use curatorbot_common::models::{Curator, FactionContext, TrackingState};
use curatorbot_common::traits::repository_traits::{
    BotConfigRepository, CuratorRepository, FactionRepository, TaskReportRepository,
    TrackingRepository,
};
use curatorbot_core::config::KEY_TIMEOUT_SECS;
use curatorbot_core::context::{ServiceContext, StorageHandles};
use curatorbot_core::eventbus::{BotEvent, EventBus};
use curatorbot_core::test_utils::{
    MemoryActivityRepository, MemoryBotConfigRepository, MemoryCuratorRepository,
    MemoryFactionRepository, MemoryTaskReportRepository, MemoryTrackingRepository,
};

async fn setup() -> (
    ServiceContext,
    Arc<EventBus>,
    tokio::sync::mpsc::Receiver<BotEvent>,
    FactionContext,
    Curator,
) {
    curatorbot_core::test_utils::init_test_tracing();

    let curators = Arc::new(MemoryCuratorRepository::default());
    let factions = Arc::new(MemoryFactionRepository::default());
    let bot_config = Arc::new(MemoryBotConfigRepository::default());

    let mut faction = FactionContext::new("guild-1", "Government");
    faction.attention_role_id = Some("role-1".to_string());
    faction.completed_tasks_channel_id = Some("tasks-chan".to_string());
    factions.create(&faction).await.unwrap();

    let curator = Curator::new("cur-1", "Anna");
    curators.create(&curator).await.unwrap();

    // Short escalation timeout so the timer path runs inside the test.
    bot_config.set_value(KEY_TIMEOUT_SECS, "1").await.unwrap();

    let storage = StorageHandles {
        curators,
        factions,
        trackings: Arc::new(MemoryTrackingRepository::default()),
        activities: Arc::new(MemoryActivityRepository::default()),
        task_reports: Arc::new(MemoryTaskReportRepository::default()),
        bot_config,
    };

    let bus = Arc::new(EventBus::new());
    let notices = bus.subscribe(Some(16)).await;
    let ctx = ServiceContext::build(storage, bus.clone()).await.unwrap();
    ctx.spawn_pipeline().await.unwrap();

    (ctx, bus, notices, faction, curator)
}

fn help_event(f: &FactionContext, message_id: &str, text: &str) -> HelpCandidateEvent {
    HelpCandidateEvent {
        guild_id: f.guild_id.clone(),
        channel_id: "chan-1".to_string(),
        message_id: message_id.to_string(),
        author_id: "member-1".to_string(),
        author_name: Some("member".to_string()),
        text: text.to_string(),
        timestamp: Utc::now(),
        mentioned_role_ids: vec![],
    }
}

fn curator_reply(f: &FactionContext, referenced: &str) -> CuratorActionEvent {
    CuratorActionEvent {
        guild_id: f.guild_id.clone(),
        channel_id: "chan-1".to_string(),
        platform_user_id: "cur-1".to_string(),
        kind: CuratorActionKind::Reply,
        message_id: format!("reply-to-{referenced}"),
        referenced_message_id: Some(referenced.to_string()),
        text: Some("уже здесь".to_string()),
        timestamp: Utc::now(),
    }
}

async fn next_escalation(
    notices: &mut tokio::sync::mpsc::Receiver<BotEvent>,
    wait_ms: u64,
) -> Option<curatorbot_common::models::events::EscalationNotice> {
    loop {
        match timeout(Duration::from_millis(wait_ms), notices.recv()).await {
            Ok(Some(BotEvent::Escalation(notice))) => return Some(notice),
            Ok(Some(_)) => continue,
            Ok(None) | Err(_) => return None,
        }
    }
}

#[tokio::test]
async fn test_help_request_resolution_end_to_end() {
    let (ctx, bus, mut notices, faction, curator) = setup().await;

    bus.publish(BotEvent::HelpCandidate(help_event(
        &faction,
        "msg-1",
        "нужен куратор в отдел",
    )))
    .await;
    sleep(Duration::from_millis(200)).await;
    assert_eq!(ctx.tracker.open_count(), 1);

    bus.publish(BotEvent::CuratorAction(curator_reply(&faction, "msg-1")))
    .await;
    sleep(Duration::from_millis(200)).await;
    assert_eq!(ctx.tracker.open_count(), 0);

    let stored = ctx
        .storage
        .trackings
        .get_by_mention_message_id("msg-1")
        .await
        .unwrap()
        .expect("tracked record persisted");
    assert_eq!(stored.state, TrackingState::Resolved);

    // Fast response: activity points (reply = 2) plus the +2 bonus.
    let snapshot = ctx
        .rating_service
        .curator_score(curator.curator_id, 30)
        .await
        .unwrap();
    assert_eq!(snapshot.base_score, 2);
    assert_eq!(snapshot.response_bonus, 2);

    // Nothing escalated.
    assert!(next_escalation(&mut notices, 1500).await.is_none());
    bus.shutdown();
}

#[tokio::test]
async fn test_unanswered_request_escalates_end_to_end() {
    let (ctx, bus, mut notices, faction, _curator) = setup().await;

    bus.publish(BotEvent::HelpCandidate(help_event(
        &faction,
        "msg-1",
        "есть вопрос по заданию",
    )))
    .await;

    let notice = next_escalation(&mut notices, 5000)
        .await
        .expect("unanswered request escalates");
    assert_eq!(notice.faction_name, "Government");
    assert_eq!(notice.attention_role_id.as_deref(), Some("role-1"));
    assert_eq!(notice.author_id, "member-1");

    // Exactly one notice, and the record is terminal.
    assert!(next_escalation(&mut notices, 500).await.is_none());
    assert_eq!(ctx.tracker.open_count(), 0);
    let pending = ctx.tracker.list_pending();
    assert!(pending.is_empty());
    bus.shutdown();
}

#[tokio::test]
async fn test_unmonitored_guild_and_plain_chat_are_dropped() {
    let (ctx, bus, _notices, faction, _curator) = setup().await;

    let mut foreign = help_event(&faction, "msg-1", "нужен куратор");
    foreign.guild_id = "guild-unknown".to_string();
    bus.publish(BotEvent::HelpCandidate(foreign)).await;

    bus.publish(BotEvent::HelpCandidate(help_event(
        &faction,
        "msg-2",
        "просто общаемся",
    )))
    .await;

    sleep(Duration::from_millis(200)).await;
    assert_eq!(ctx.tracker.open_count(), 0);
    bus.shutdown();
}

#[tokio::test]
async fn test_task_report_flow_end_to_end() {
    let (ctx, bus, _notices, faction, curator) = setup().await;

    // A member posts a report in the completion channel.
    let mut report = help_event(&faction, "report-1", "выполнено 4 задач");
    report.channel_id = "tasks-chan".to_string();
    bus.publish(BotEvent::HelpCandidate(report)).await;
    sleep(Duration::from_millis(200)).await;

    // A curator confirms it there.
    let confirm = CuratorActionEvent {
        guild_id: faction.guild_id.clone(),
        channel_id: "tasks-chan".to_string(),
        platform_user_id: "cur-1".to_string(),
        kind: CuratorActionKind::Message,
        message_id: "confirm-1".to_string(),
        referenced_message_id: None,
        text: Some("принял 4".to_string()),
        timestamp: Utc::now(),
    };
    bus.publish(BotEvent::CuratorAction(confirm)).await;
    sleep(Duration::from_millis(200)).await;

    let stored = ctx
        .storage
        .task_reports
        .get_by_message_id("report-1")
        .await
        .unwrap()
        .expect("report recorded");
    assert_eq!(stored.approved_tasks, Some(4));

    // Verification is worth task-verification points on top of the message.
    let snapshot = ctx
        .rating_service
        .curator_score(curator.curator_id, 30)
        .await
        .unwrap();
    assert_eq!(snapshot.activity_counts.task_verifications, 1);
    assert!(snapshot.base_score >= 5);
    bus.shutdown();
}
