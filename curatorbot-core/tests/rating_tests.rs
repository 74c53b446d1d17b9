// File: curatorbot-core/tests/rating_tests.rs
//
// Score engine tests: band thresholds, response-time bonuses, flooring,
// leaderboard ordering, and the daily breakdown.

use std::sync::Arc;
use chrono::{Duration, Utc};
use uuid::Uuid;

use curatorbot_common::models::rating::default_rating_bands;
use curatorbot_common::models::{
    ActivityKind, Curator, FactionContext, ResolutionOutcome, ResponseKind, TrackingRecord,
    TrackingState,
};
use curatorbot_common::traits::repository_traits::{CuratorRepository, TrackingRepository};
use curatorbot_core::config::{ActivityPoints, MonitorConfig};
use curatorbot_core::services::activity_service::ActivityRecorder;
use curatorbot_core::services::rating_service::RatingService;
use curatorbot_core::test_utils::{
    MemoryActivityRepository, MemoryCuratorRepository, MemoryTrackingRepository,
};

struct Fixture {
    activity_repo: Arc<MemoryActivityRepository>,
    tracking_repo: Arc<MemoryTrackingRepository>,
    curator_repo: Arc<MemoryCuratorRepository>,
    recorder: ActivityRecorder,
    rating: RatingService,
    faction: FactionContext,
}

fn fixture_with_config(config: MonitorConfig) -> Fixture {
    let activity_repo = Arc::new(MemoryActivityRepository::default());
    let tracking_repo = Arc::new(MemoryTrackingRepository::default());
    let curator_repo = Arc::new(MemoryCuratorRepository::default());
    let config = Arc::new(config);
    let recorder = ActivityRecorder::new(activity_repo.clone(), config.points);
    let rating = RatingService::new(
        activity_repo.clone(),
        tracking_repo.clone(),
        curator_repo.clone(),
        config,
    );
    Fixture {
        activity_repo,
        tracking_repo,
        curator_repo,
        recorder,
        rating,
        faction: FactionContext::new("guild-1", "Government"),
    }
}

fn fixture() -> Fixture {
    fixture_with_config(MonitorConfig::default())
}

async fn log_activities(fx: &Fixture, curator: &Curator, kind: ActivityKind, count: usize) {
    for i in 0..count {
        fx.recorder
            .record(
                curator,
                &fx.faction,
                kind,
                "chan-1",
                &format!("{}-{}", kind.as_str(), i),
                None,
                Utc::now() - Duration::minutes(5),
            )
            .await
            .unwrap();
    }
}

/// Insert a resolved tracking record with the given latency, credited now.
async fn log_resolution(fx: &Fixture, curator: &Curator, latency_secs: i64) {
    let response_timestamp = Utc::now();
    let mention_timestamp = response_timestamp - Duration::seconds(latency_secs);
    let mut record = TrackingRecord::open(
        fx.faction.faction_id,
        Some("chan-1"),
        &Uuid::new_v4().to_string(),
        "author-1",
        None,
        "нужна помощь",
        mention_timestamp,
    );
    record.state = TrackingState::Resolved;
    record.resolution = Some(ResolutionOutcome {
        curator_id: curator.curator_id,
        response_message_id: Uuid::new_v4().to_string(),
        response_timestamp,
        response_kind: ResponseKind::Message,
        response_time_seconds: latency_secs,
    });
    fx.tracking_repo.create(&record).await.unwrap();
}

#[tokio::test]
async fn test_base_score_from_activity_points() {
    let fx = fixture();
    let curator = Curator::new("cur-1", "Anna");

    // 10 messages (3 pts) and 2 reactions (1 pt) and nothing tracked.
    log_activities(&fx, &curator, ActivityKind::Message, 10).await;
    log_activities(&fx, &curator, ActivityKind::Reaction, 2).await;

    let snapshot = fx.rating.curator_score(curator.curator_id, 30).await.unwrap();
    assert_eq!(snapshot.base_score, 32);
    assert_eq!(snapshot.response_bonus, 0);
    assert_eq!(snapshot.total_score, 32);
    assert_eq!(snapshot.activity_counts.messages, 10);
    assert_eq!(snapshot.activity_counts.reactions, 2);
    assert_eq!(snapshot.band.name, "normal");
}

#[tokio::test]
async fn test_band_boundaries() {
    let fx = fixture();
    assert_eq!(fx.rating.resolve_band(50).name, "excellent");
    assert_eq!(fx.rating.resolve_band(49).name, "good");
    assert_eq!(fx.rating.resolve_band(35).name, "good");
    assert_eq!(fx.rating.resolve_band(20).name, "normal");
    assert_eq!(fx.rating.resolve_band(10).name, "poor");
    assert_eq!(fx.rating.resolve_band(0).name, "terrible");
}

#[tokio::test]
async fn test_band_selection_is_monotonic() {
    let fx = fixture();
    let scores = [0i64, 5, 9, 10, 19, 20, 34, 35, 49, 50, 120];
    for window in scores.windows(2) {
        let lo = fx.rating.resolve_band(window[0]);
        let hi = fx.rating.resolve_band(window[1]);
        assert!(
            hi.min_score >= lo.min_score,
            "band order broke between {} and {}",
            window[0],
            window[1]
        );
    }
}

#[tokio::test]
async fn test_response_bonus_tiers() {
    let fx = fixture();
    let curator = Curator::new("cur-1", "Anna");

    log_resolution(&fx, &curator, 45).await; // fast: +2
    log_resolution(&fx, &curator, 250).await; // neutral: +0
    log_resolution(&fx, &curator, 400).await; // slow: -1

    let snapshot = fx.rating.curator_score(curator.curator_id, 30).await.unwrap();
    assert_eq!(snapshot.response_bonus, 1);
    assert_eq!(snapshot.total_score, 1);
}

#[tokio::test]
async fn test_latency_at_poor_threshold_is_penalized() {
    let fx = fixture();
    let curator = Curator::new("cur-1", "Anna");

    log_resolution(&fx, &curator, 300).await;

    let snapshot = fx.rating.curator_score(curator.curator_id, 30).await.unwrap();
    assert_eq!(snapshot.response_bonus, -1);
}

#[tokio::test]
async fn test_total_score_floored_at_zero() {
    let fx = fixture();
    let curator = Curator::new("cur-1", "Anna");

    log_resolution(&fx, &curator, 1000).await;
    log_resolution(&fx, &curator, 2000).await;

    let snapshot = fx.rating.curator_score(curator.curator_id, 30).await.unwrap();
    assert_eq!(snapshot.base_score, 0);
    assert_eq!(snapshot.response_bonus, -2);
    assert_eq!(snapshot.total_score, 0, "total never goes negative");
    assert_eq!(snapshot.band.name, "terrible");
}

#[tokio::test]
async fn test_leaderboard_orders_and_breaks_ties_deterministically() {
    let fx = fixture();
    let mut strong = Curator::new("cur-1", "Anna");
    let mut tied_a = Curator::new("cur-2", "Boris");
    let mut tied_b = Curator::new("cur-3", "Vera");
    // Force a known id order for the tie pair.
    tied_a.curator_id = Uuid::from_u128(2);
    tied_b.curator_id = Uuid::from_u128(3);
    strong.curator_id = Uuid::from_u128(9);
    for c in [&strong, &tied_a, &tied_b] {
        fx.curator_repo.create(c).await.unwrap();
    }

    log_activities(&fx, &strong, ActivityKind::Message, 5).await; // 15 pts
    log_activities(&fx, &tied_a, ActivityKind::Reaction, 2).await; // 2 pts
    log_activities(&fx, &tied_b, ActivityKind::Reaction, 2).await; // 2 pts

    let board = fx.rating.leaderboard(10, 30).await.unwrap();
    assert_eq!(board.len(), 3);
    assert_eq!(board[0].curator.curator_id, strong.curator_id);
    assert_eq!(board[1].curator.curator_id, tied_a.curator_id);
    assert_eq!(board[2].curator.curator_id, tied_b.curator_id);

    let top = fx.rating.leaderboard(1, 30).await.unwrap();
    assert_eq!(top.len(), 1);
}

#[tokio::test]
async fn test_average_response_time() {
    let fx = fixture();
    let curator = Curator::new("cur-1", "Anna");

    assert!(fx
        .rating
        .average_response_time(curator.curator_id, 30)
        .await
        .unwrap()
        .is_none());

    log_resolution(&fx, &curator, 30).await;
    log_resolution(&fx, &curator, 90).await;

    let stats = fx
        .rating
        .average_response_time(curator.curator_id, 30)
        .await
        .unwrap()
        .expect("stats after responses");
    assert_eq!(stats.average_seconds, 60);
    assert_eq!(stats.response_count, 2);
    assert_eq!(stats.formatted_time, "1 минута");
}

#[tokio::test]
async fn test_daily_breakdown_buckets_by_day() {
    let fx = fixture();
    let curator = Curator::new("cur-1", "Anna");

    // Two messages today, one yesterday.
    for (offset_days, msg) in [(0i64, "m-1"), (0, "m-2"), (1, "m-3")] {
        fx.recorder
            .record(
                &curator,
                &fx.faction,
                ActivityKind::Message,
                "chan-1",
                msg,
                None,
                Utc::now() - Duration::days(offset_days),
            )
            .await
            .unwrap();
    }
    log_resolution(&fx, &curator, 45).await;

    let days = fx.rating.daily_breakdown(curator.curator_id, 2).await.unwrap();
    assert_eq!(days.len(), 2);
    assert!(days[0].date < days[1].date, "oldest day first");
    assert_eq!(days[0].score, 3);
    assert_eq!(days[1].score, 6);
    assert_eq!(days[1].response_count, 1);
    assert_eq!(days[1].average_response_seconds, Some(45));
}

#[tokio::test]
async fn test_band_fallback_without_catchall() {
    // Misconfigured band set with no 0-minimum entry: every score below the
    // lowest explicit minimum gets the lowest-defined band.
    let mut config = MonitorConfig::default();
    config.rating_bands = vec![
        curatorbot_common::models::RatingBand::new("elite", "Elite", 100, "#fff"),
        curatorbot_common::models::RatingBand::new("solid", "Solid", 40, "#eee"),
    ];
    let fx = fixture_with_config(config);

    assert_eq!(fx.rating.resolve_band(150).name, "elite");
    assert_eq!(fx.rating.resolve_band(40).name, "solid");
    assert_eq!(fx.rating.resolve_band(5).name, "solid");
}

#[tokio::test]
async fn test_points_snapshot_survives_config_change() {
    let fx = fixture();
    let curator = Curator::new("cur-1", "Anna");
    log_activities(&fx, &curator, ActivityKind::Message, 2).await;

    // A recorder running under a new points table only affects new rows.
    let expensive = ActivityPoints {
        message: 10,
        reaction: 1,
        reply: 2,
        task_verification: 5,
    };
    let recorder = ActivityRecorder::new(fx.activity_repo.clone(), expensive);
    recorder
        .record(
            &curator,
            &fx.faction,
            ActivityKind::Message,
            "chan-1",
            "m-new",
            None,
            Utc::now(),
        )
        .await
        .unwrap();

    let snapshot = fx.rating.curator_score(curator.curator_id, 30).await.unwrap();
    assert_eq!(snapshot.base_score, 3 + 3 + 10);
}
