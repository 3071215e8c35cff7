//! Integration tests for the engine entry points over the in-memory store.
//!
//! - Redemption credits account, cohort, and key usage exactly once
//! - Each rejection reason, with balances unchanged
//! - Concurrent redemptions by the same account
//! - Progression, ranking, leaderboards, and the mission board

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use spirit_core::clock::FixedClock;
use spirit_core::eligibility::{MissionStatus, MissionWindow};
use spirit_core::error::CoreError;
use spirit_core::redemption::{RedemptionError, MAX_MISSION_REWARD};
use spirit_core::types::{DbId, Timestamp};
use spirit_engine::memory::NewMission;
use spirit_engine::{Engine, EngineError, MemoryStore};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 10, 7, 10, 0, 0).unwrap()
}

fn mission(title: &str, start_offset: Duration, end_offset: Duration) -> NewMission {
    NewMission {
        title: title.to_string(),
        description: String::new(),
        location: "Auditorium".to_string(),
        value: 50,
        xp_points: 12,
        window: MissionWindow::new(now() + start_offset, now() + end_offset),
    }
}

fn active(title: &str) -> NewMission {
    mission(title, Duration::days(-1), Duration::days(1))
}

struct Fixture {
    store: Arc<MemoryStore>,
    engine: Engine,
    cohort_id: DbId,
    account_id: DbId,
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let cohort_id = store.add_cohort("Grade 9").await;
    let account_id = store.add_account("ada", Some(cohort_id)).await.unwrap();
    let engine = Engine::new(store.clone(), Arc::new(FixedClock(now())));
    Fixture {
        store,
        engine,
        cohort_id,
        account_id,
    }
}

impl Fixture {
    async fn balances(&self) -> (i64, i64, i64) {
        let (points, xp) = self.store.account_balance(self.account_id).await.unwrap();
        let cohort = self.store.cohort_points(self.cohort_id).await.unwrap();
        (points, xp, cohort)
    }
}

// ---------------------------------------------------------------------------
// Redemption
// ---------------------------------------------------------------------------

#[tokio::test]
async fn valid_key_credits_account_and_cohort() {
    let f = fixture().await;
    let mission_id = f.store.add_mission(active("Spirit day")).await.unwrap();
    let key = "SpiritDay1";
    let key_id = f.store.add_key(mission_id, key, false).await.unwrap();

    let view = f.engine.redeem(key, f.account_id).await.unwrap();

    assert_eq!(view.mission_id, mission_id);
    assert_eq!(view.key_id, key_id);
    assert_eq!(view.title, "Spirit day");
    assert_eq!(view.points_awarded, 50);
    assert_eq!(view.xp_awarded, 12);
    assert_eq!(view.account_points, 50);
    assert_eq!(view.account_total_xp, 12);
    assert_eq!(view.cohort_id, Some(f.cohort_id));
    assert_eq!(view.completed_at, now());
    assert_eq!(f.balances().await, (50, 12, 50));
    assert_eq!(f.store.key_times_used(key).await, Some(1));
}

#[tokio::test]
async fn redeeming_twice_credits_once() {
    let f = fixture().await;
    let mission_id = f.store.add_mission(active("Spirit day")).await.unwrap();
    let key = f.store.mint_key(mission_id, false).await.unwrap();

    f.engine.redeem(&key, f.account_id).await.unwrap();
    let second = f.engine.redeem(&key, f.account_id).await;

    assert_matches!(
        second,
        Err(EngineError::Rejected(RedemptionError::AlreadyCompleted))
    );
    assert_eq!(f.balances().await, (50, 12, 50));
    assert_eq!(f.store.completion_count(mission_id).await, 1);
}

#[tokio::test]
async fn another_key_for_completed_mission_is_rejected() {
    let f = fixture().await;
    let mission_id = f.store.add_mission(active("Spirit day")).await.unwrap();
    let first = f.store.mint_key(mission_id, false).await.unwrap();
    let second = f.store.mint_key(mission_id, false).await.unwrap();

    f.engine.redeem(&first, f.account_id).await.unwrap();
    let result = f.engine.redeem(&second, f.account_id).await;

    assert_matches!(
        result,
        Err(EngineError::Rejected(RedemptionError::AlreadyCompleted))
    );
    assert_eq!(f.store.key_times_used(&second).await, Some(0));
}

#[tokio::test]
async fn malformed_key_is_invalid() {
    let f = fixture().await;
    for raw in ["", "short", "way-too-long-key", "abc!efghij"] {
        let result = f.engine.redeem(raw, f.account_id).await;
        assert_matches!(result, Err(EngineError::Rejected(RedemptionError::InvalidKey)));
    }
}

#[tokio::test]
async fn unknown_key_is_invalid() {
    let f = fixture().await;
    f.store.add_mission(active("Spirit day")).await.unwrap();

    let result = f.engine.redeem("AAAAAAAAAA", f.account_id).await;

    assert_matches!(result, Err(EngineError::Rejected(RedemptionError::InvalidKey)));
    assert_eq!(f.balances().await, (0, 0, 0));
}

#[tokio::test]
async fn future_mission_is_not_active() {
    let f = fixture().await;
    let mission_id = f
        .store
        .add_mission(mission("Later", Duration::days(1), Duration::days(2)))
        .await
        .unwrap();
    let key = f.store.mint_key(mission_id, false).await.unwrap();

    let result = f.engine.redeem(&key, f.account_id).await;

    assert_matches!(
        result,
        Err(EngineError::Rejected(RedemptionError::MissionNotActive))
    );
    assert_eq!(f.balances().await, (0, 0, 0));
    assert_eq!(f.store.completion_count(mission_id).await, 0);
}

#[tokio::test]
async fn expired_mission_is_not_active() {
    let f = fixture().await;
    let mission_id = f
        .store
        .add_mission(mission("Earlier", Duration::days(-2), Duration::days(-1)))
        .await
        .unwrap();
    let key = f.store.mint_key(mission_id, false).await.unwrap();

    let result = f.engine.redeem(&key, f.account_id).await;

    assert_matches!(
        result,
        Err(EngineError::Rejected(RedemptionError::MissionNotActive))
    );
    assert_eq!(f.balances().await, (0, 0, 0));
    assert_eq!(f.store.key_times_used(&key).await, Some(0));
}

#[tokio::test]
async fn one_use_key_is_exhausted_after_first_use() {
    let f = fixture().await;
    let other = f.store.add_account("grace", Some(f.cohort_id)).await.unwrap();
    let mission_id = f.store.add_mission(active("Raffle")).await.unwrap();
    let key = f.store.mint_key(mission_id, true).await.unwrap();

    f.engine.redeem(&key, f.account_id).await.unwrap();
    let result = f.engine.redeem(&key, other).await;

    assert_matches!(result, Err(EngineError::Rejected(RedemptionError::KeyExhausted)));
    assert_eq!(f.store.account_balance(other).await, Some((0, 0)));
    assert_eq!(f.store.cohort_points(f.cohort_id).await, Some(50));
    assert_eq!(f.store.key_times_used(&key).await, Some(1));
}

#[tokio::test]
async fn reusable_key_serves_many_accounts() {
    let f = fixture().await;
    let mission_id = f.store.add_mission(active("Assembly")).await.unwrap();
    let key = f.store.mint_key(mission_id, false).await.unwrap();

    for name in ["b", "c", "d"] {
        let id = f.store.add_account(name, Some(f.cohort_id)).await.unwrap();
        f.engine.redeem(&key, id).await.unwrap();
    }

    assert_eq!(f.store.key_times_used(&key).await, Some(3));
    assert_eq!(f.store.cohort_points(f.cohort_id).await, Some(150));
}

#[tokio::test]
async fn account_without_cohort_is_credited_alone() {
    let f = fixture().await;
    let loner = f.store.add_account("loner", None).await.unwrap();
    let mission_id = f.store.add_mission(active("Spirit day")).await.unwrap();
    let key = f.store.mint_key(mission_id, false).await.unwrap();

    let view = f.engine.redeem(&key, loner).await.unwrap();

    assert_eq!(view.cohort_id, None);
    assert_eq!(f.store.account_balance(loner).await, Some((50, 12)));
    assert_eq!(f.store.cohort_points(f.cohort_id).await, Some(0));
}

#[tokio::test]
async fn unknown_account_is_not_found() {
    let f = fixture().await;
    let mission_id = f.store.add_mission(active("Spirit day")).await.unwrap();
    let key = f.store.mint_key(mission_id, true).await.unwrap();

    let result = f.engine.redeem(&key, 9_999).await;

    assert_matches!(
        result,
        Err(EngineError::Core(CoreError::NotFound { entity: "account", .. }))
    );
    assert_eq!(f.store.key_times_used(&key).await, Some(0));
}

#[tokio::test]
async fn concurrent_redemptions_credit_once() {
    let f = fixture().await;
    let mission_id = f.store.add_mission(active("Spirit day")).await.unwrap();
    let mut keys = Vec::new();
    for _ in 0..8 {
        keys.push(f.store.mint_key(mission_id, false).await.unwrap());
    }

    let attempts = keys.iter().map(|key| {
        let engine = f.engine.clone();
        let key = key.clone();
        let account_id = f.account_id;
        tokio::spawn(async move { engine.redeem(&key, account_id).await })
    });
    let results = futures::future::join_all(attempts).await;

    let mut completed = 0;
    for result in results {
        match result.unwrap() {
            Ok(_) => completed += 1,
            Err(err) => assert!(err.rejection().unwrap().is_already_completed()),
        }
    }
    assert_eq!(completed, 1);
    assert_eq!(f.balances().await, (50, 12, 50));
    assert_eq!(f.store.completion_count(mission_id).await, 1);
}

#[tokio::test]
async fn deleting_cohort_detaches_members() {
    let f = fixture().await;
    assert!(f.store.delete_cohort(f.cohort_id).await);
    assert_eq!(f.store.account_cohort(f.account_id).await, None);

    let mission_id = f.store.add_mission(active("Spirit day")).await.unwrap();
    let key = f.store.mint_key(mission_id, false).await.unwrap();
    let view = f.engine.redeem(&key, f.account_id).await.unwrap();
    assert_eq!(view.cohort_id, None);
}

#[tokio::test]
async fn oversized_reward_is_refused() {
    let f = fixture().await;
    let mut m = active("Jackpot");
    m.xp_points = MAX_MISSION_REWARD + 1;
    let result = f.store.add_mission(m).await;
    assert_matches!(result, Err(EngineError::Core(CoreError::Validation(_))));
}

#[tokio::test]
async fn progression_at_reward_cap_is_computed() {
    let f = fixture().await;
    redeem_value(&f, f.account_id, MAX_MISSION_REWARD, MAX_MISSION_REWARD).await;

    let view = f.engine.compute_progression(f.account_id).await.unwrap();
    assert_eq!(view.total_xp, MAX_MISSION_REWARD);
    assert!(view.level > 1);
    assert!(view.xp_percent < 100);
}

#[tokio::test]
async fn reversed_mission_window_is_refused() {
    let f = fixture().await;
    let result = f
        .store
        .add_mission(mission("Backwards", Duration::days(1), Duration::days(-1)))
        .await;
    assert_matches!(result, Err(EngineError::Core(CoreError::Validation(_))));
}

// ---------------------------------------------------------------------------
// Progression and ranking
// ---------------------------------------------------------------------------

async fn redeem_value(f: &Fixture, account_id: DbId, value: i64, xp: i64) {
    let mut m = active("Reward");
    m.value = value;
    m.xp_points = xp;
    let mission_id = f.store.add_mission(m).await.unwrap();
    let key = f.store.mint_key(mission_id, true).await.unwrap();
    f.engine.redeem(&key, account_id).await.unwrap();
}

#[tokio::test]
async fn progression_of_new_account() {
    let f = fixture().await;
    let view = f.engine.compute_progression(f.account_id).await.unwrap();

    assert_eq!(view.level, 1);
    assert_eq!(view.xp_percent, 0);
    assert_eq!(view.rank, 1);
    assert_eq!(view.health_percent, 100);
    let cohort = view.cohort.unwrap();
    assert_eq!(cohort.cohort_id, f.cohort_id);
    assert_eq!(cohort.rank, 1);
}

#[tokio::test]
async fn progression_at_33_xp_is_level_four() {
    let f = fixture().await;
    redeem_value(&f, f.account_id, 10, 33).await;

    let view = f.engine.compute_progression(f.account_id).await.unwrap();

    assert_eq!(view.total_xp, 33);
    assert_eq!(view.level, 4);
    assert_eq!(view.xp_toward_next_level, 0);
    assert_eq!(view.xp_percent, 0);
    assert_eq!(view.xp_for_next_level, 13);
}

#[tokio::test]
async fn progression_reflects_health() {
    let f = fixture().await;
    assert!(f.store.set_health(f.account_id, 42).await);

    let view = f.engine.compute_progression(f.account_id).await.unwrap();
    assert_eq!(view.health_percent, 42);
}

#[tokio::test]
async fn progression_of_unknown_account_is_not_found() {
    let f = fixture().await;
    let result = f.engine.compute_progression(404).await;
    assert_matches!(result, Err(EngineError::Core(CoreError::NotFound { .. })));
}

#[tokio::test]
async fn ranks_follow_points() {
    let f = fixture().await;
    let mut ids = vec![f.account_id];
    for name in ["u2", "u3", "u4"] {
        ids.push(f.store.add_account(name, None).await.unwrap());
    }
    for (id, points) in ids.iter().zip([100, 75, 50, 25]) {
        redeem_value(&f, *id, points, 0).await;
    }

    let mut ranks = Vec::new();
    for id in &ids {
        ranks.push(f.engine.compute_progression(*id).await.unwrap().rank);
    }
    assert_eq!(ranks, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn tied_accounts_share_rank() {
    let f = fixture().await;
    let b = f.store.add_account("b", None).await.unwrap();
    let c = f.store.add_account("c", None).await.unwrap();
    redeem_value(&f, f.account_id, 100, 0).await;
    redeem_value(&f, b, 100, 0).await;
    redeem_value(&f, c, 50, 0).await;

    let board = f.engine.account_leaderboard(None).await.unwrap();
    let ranks: Vec<u32> = board.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 1, 3]);
    assert_eq!(board[0].entry.username, "ada");
    assert_eq!(board[0].entry.cohort_name.as_deref(), Some("Grade 9"));

    assert_eq!(f.engine.compute_progression(c).await.unwrap().rank, 3);
}

#[tokio::test]
async fn leaderboard_respects_limit() {
    let f = fixture().await;
    for name in ["b", "c", "d", "e"] {
        f.store.add_account(name, None).await.unwrap();
    }
    let limited = f.engine.clone().with_leaderboard_limit(2);

    assert_eq!(limited.account_leaderboard(None).await.unwrap().len(), 2);
    assert_eq!(f.engine.account_leaderboard(Some(3)).await.unwrap().len(), 3);
}

#[tokio::test]
async fn cohort_leaderboard_orders_by_points() {
    let f = fixture().await;
    let other = f.store.add_cohort("Grade 10").await;
    let member = f.store.add_account("zed", Some(other)).await.unwrap();
    redeem_value(&f, member, 80, 0).await;
    redeem_value(&f, f.account_id, 30, 0).await;

    let board = f.engine.cohort_leaderboard(None).await.unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].entry.name, "Grade 10");
    assert_eq!(board[0].entry.points, 80);
    assert_eq!(board[0].entry.member_count, 1);
    assert_eq!(board[1].rank, 2);

    let view = f.engine.compute_progression(f.account_id).await.unwrap();
    assert_eq!(view.cohort.unwrap().rank, 2);
}

// ---------------------------------------------------------------------------
// Mission board
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mission_board_shows_status_and_completion() {
    let f = fixture().await;
    let done = f
        .store
        .add_mission(mission("Done", Duration::days(-3), Duration::days(1)))
        .await
        .unwrap();
    let upcoming = f
        .store
        .add_mission(mission("Upcoming", Duration::days(1), Duration::days(2)))
        .await
        .unwrap();
    let expired = f
        .store
        .add_mission(mission("Expired", Duration::days(-5), Duration::days(-4)))
        .await
        .unwrap();
    let open = f
        .store
        .add_mission(mission("Open", Duration::days(-2), Duration::days(2)))
        .await
        .unwrap();
    let key = f.store.mint_key(done, false).await.unwrap();
    f.engine.redeem(&key, f.account_id).await.unwrap();

    let board = f.engine.mission_board(f.account_id).await.unwrap();

    let ids: Vec<DbId> = board.iter().map(|e| e.mission.mission_id).collect();
    assert_eq!(ids, vec![expired, done, open, upcoming]);
    assert_eq!(board[0].status, MissionStatus::Expired);
    assert!(!board[0].claimable);
    assert_eq!(board[1].status, MissionStatus::Active);
    assert!(board[1].mission.completed);
    assert!(!board[1].claimable);
    assert_eq!(board[2].status, MissionStatus::Active);
    assert!(board[2].claimable);
    assert_eq!(board[3].status, MissionStatus::Upcoming);
    assert!(!board[3].mission.completed);
    assert!(!board[3].claimable);
}
