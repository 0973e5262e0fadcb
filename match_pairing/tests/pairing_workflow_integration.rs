//! Integration tests for the pairing workflow
//!
//! These tests drive `PairingManager` end to end against the in-memory
//! adapters: generation, versioning, approval transitions and the
//! publish hand-off.

use chrono::{Duration, Utc};
use match_pairing::db::PairingRepository;
use match_pairing::memory::{InMemoryPairingStore, RecordingMatchUpdater, StaticDirectory};
use match_pairing::pairing::{
    EligiblePlayer, MatchFormat, MatchInfo, Pair, PairingAction, PairingError, PairingManager,
    PairingRequest, PairingSettings, PairingStatus, PairingType, PaymentStatus, PlayerSeeding,
    SeededShuffle, SeedingMethod, SeedingResolver,
};
use std::sync::Arc;

const TOURNAMENT: i64 = 3;

struct Harness {
    manager: PairingManager,
    store: Arc<InMemoryPairingStore>,
    directory: Arc<StaticDirectory>,
    updater: Arc<RecordingMatchUpdater>,
}

impl Harness {
    async fn new() -> Self {
        let store = Arc::new(InMemoryPairingStore::new());
        let directory = Arc::new(StaticDirectory::new());
        let updater = Arc::new(RecordingMatchUpdater::new());
        let manager = PairingManager::new(
            store.clone(),
            directory.clone(),
            updater.clone(),
            SeedingResolver::new(Arc::new(SeededShuffle::new(7))),
            PairingSettings::default(),
        );
        Self {
            manager,
            store,
            directory,
            updater,
        }
    }

    async fn add_match(&self, id: i64, format: MatchFormat) {
        self.store
            .add_match(MatchInfo {
                id,
                tournament_id: TOURNAMENT,
                batch_id: Some(1),
                format,
                current_pairing_id: None,
            })
            .await;
    }

    async fn add_players(&self, ids: &[&str]) {
        let start = Utc::now();
        let players = ids
            .iter()
            .enumerate()
            .map(|(i, id)| EligiblePlayer {
                external_id: id.to_string(),
                name: id.to_uppercase(),
                joined_at: start + Duration::seconds(i as i64),
                payment_status: PaymentStatus::Paid,
            })
            .collect();
        self.directory.set_players(TOURNAMENT, players).await;
    }
}

fn ids(pair: &Pair) -> (&str, &str) {
    (pair.player1_id.as_str(), pair.player2_id.as_str())
}

fn pair(p1: &str, p2: &str, number: u32) -> Pair {
    Pair {
        player1_id: p1.to_string(),
        player1_name: p1.to_uppercase(),
        player2_id: p2.to_string(),
        player2_name: p2.to_uppercase(),
        match_number: number,
        table_number: None,
        round_number: None,
    }
}

#[tokio::test]
async fn test_versions_increase_across_generate_and_edit() {
    let h = Harness::new().await;
    h.add_match(1, MatchFormat::Simple).await;
    h.add_players(&["a", "b", "c", "d"]).await;

    let v1 = h
        .manager
        .generate(PairingRequest::auto(1, SeedingMethod::Custom), 1)
        .await
        .unwrap();
    let v2 = h
        .manager
        .edit_pairs(1, vec![pair("a", "c", 1), pair("b", "d", 2)], 1)
        .await
        .unwrap();
    h.manager.reject(1, 2, "wrong table").await.unwrap();
    let v3 = h
        .manager
        .generate(PairingRequest::auto(1, SeedingMethod::Custom).forced(), 1)
        .await
        .unwrap();
    h.manager.approve(1, 2, false).await.unwrap();
    let v4 = h
        .manager
        .generate(PairingRequest::auto(1, SeedingMethod::Custom).forced(), 1)
        .await
        .unwrap();

    assert_eq!(
        [v1.version, v2.version, v3.version, v4.version],
        [1, 2, 3, 4]
    );

    let history = h.manager.history(1).await.unwrap();
    let versions: Vec<_> = history.iter().filter_map(|r| r.version).collect();
    assert_eq!(versions, vec![4, 3, 2, 1]);

    // Superseded records keep the status they had
    assert_eq!(history[1].status, Some(PairingStatus::Approved));
    assert_eq!(history[2].status, Some(PairingStatus::Rejected));
    assert_eq!(history[3].status, Some(PairingStatus::Proposed));
}

#[tokio::test]
async fn test_transition_legality() {
    let h = Harness::new().await;
    h.add_match(1, MatchFormat::Simple).await;
    h.add_players(&["a", "b", "c", "d"]).await;
    h.manager
        .generate(PairingRequest::auto(1, SeedingMethod::Custom), 1)
        .await
        .unwrap();

    // Publish before approve
    let err = h.manager.publish(1, 2).await.unwrap_err();
    assert!(matches!(
        err,
        PairingError::InvalidState {
            action: PairingAction::Publish,
            status: PairingStatus::Proposed
        }
    ));

    h.manager.approve(1, 2, false).await.unwrap();

    for err in [
        h.manager.approve(1, 2, false).await.unwrap_err(),
        h.manager.reject(1, 2, "too late").await.unwrap_err(),
        h.manager.edit_pairs(1, vec![pair("a", "b", 1)], 2).await.unwrap_err(),
    ] {
        assert!(matches!(
            err,
            PairingError::InvalidState {
                status: PairingStatus::Approved,
                ..
            }
        ));
    }
    assert_eq!(
        h.manager.status(1).await.unwrap().status,
        Some(PairingStatus::Approved)
    );

    h.manager.publish(1, 2).await.unwrap();
    let err = h.manager.publish(1, 2).await.unwrap_err();
    assert!(matches!(
        err,
        PairingError::InvalidState {
            status: PairingStatus::Published,
            ..
        }
    ));
}

#[tokio::test]
async fn test_reject_then_approve_then_regenerate() {
    let h = Harness::new().await;
    h.add_match(1, MatchFormat::SingleElimination).await;
    h.add_players(&["a", "b", "c", "d"]).await;

    let v1 = h
        .manager
        .generate(PairingRequest::auto(1, SeedingMethod::Custom), 1)
        .await
        .unwrap();
    let rejected = h.manager.reject(1, 2, "duplicate entry").await.unwrap();
    assert_eq!(rejected.status, PairingStatus::Rejected);

    let err = h.manager.approve(1, 2, false).await.unwrap_err();
    assert!(matches!(
        err,
        PairingError::InvalidState {
            action: PairingAction::Approve,
            status: PairingStatus::Rejected
        }
    ));

    let v2 = h
        .manager
        .generate(PairingRequest::auto(1, SeedingMethod::Custom).forced(), 1)
        .await
        .unwrap();
    assert_eq!(v2.version, 2);
    assert_ne!(v2.pairing_id, v1.pairing_id);
    assert_eq!(v2.status, PairingStatus::Proposed);

    let status = h.manager.status(1).await.unwrap();
    assert_eq!(status.pairing_id, Some(v2.pairing_id));

    let old = h.store.find_record(v1.pairing_id).await.unwrap().unwrap();
    assert_eq!(old.status, PairingStatus::Rejected);
    assert_eq!(old.rejection_reason.as_deref(), Some("duplicate entry"));
}

#[tokio::test]
async fn test_round_robin_four_ranked_players() {
    let h = Harness::new().await;
    h.add_match(1, MatchFormat::RoundRobin).await;
    h.add_players(&["d", "c", "b", "a"]).await;
    h.directory
        .set_seedings(
            TOURNAMENT,
            ["a", "b", "c", "d"]
                .iter()
                .enumerate()
                .map(|(i, id)| PlayerSeeding {
                    external_id: id.to_string(),
                    seed_number: Some(i as i32 + 1),
                    skill_rating: None,
                })
                .collect(),
        )
        .await;

    let response = h
        .manager
        .generate(PairingRequest::auto(1, SeedingMethod::RankBased), 1)
        .await
        .unwrap();

    assert_eq!(response.total_pairs, 6);
    let numbers: Vec<_> = response.pairs.iter().map(|p| p.match_number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    let pairs: Vec<_> = response.pairs.iter().map(ids).collect();
    assert_eq!(
        pairs,
        vec![
            ("a", "b"),
            ("a", "c"),
            ("a", "d"),
            ("b", "c"),
            ("b", "d"),
            ("c", "d")
        ]
    );
    assert_eq!(response.metadata.rounds_needed, Some(3));
}

#[tokio::test]
async fn test_elimination_five_seeded_players() {
    let h = Harness::new().await;
    h.add_match(1, MatchFormat::SingleElimination).await;
    h.add_players(&["seed1", "seed2", "seed3", "seed4", "seed5"])
        .await;

    let response = h
        .manager
        .generate(PairingRequest::auto(1, SeedingMethod::Custom), 1)
        .await
        .unwrap();

    let pairs: Vec<_> = response.pairs.iter().map(ids).collect();
    assert_eq!(pairs, vec![("seed1", "seed5"), ("seed2", "seed4")]);
    assert_eq!(response.pairs[0].match_number, 1);
    assert_eq!(response.pairs[1].match_number, 2);
    assert_eq!(response.metadata.has_bye, Some(true));
    assert_eq!(response.metadata.bye_player.as_deref(), Some("seed3"));
}

#[tokio::test]
async fn test_hybrid_overrides_and_appends() {
    let h = Harness::new().await;
    h.add_match(1, MatchFormat::Simple).await;
    h.add_players(&["a", "b", "c", "d", "e"]).await;

    let request = PairingRequest::auto(1, SeedingMethod::Custom)
        .with_pairs(PairingType::Hybrid, vec![pair("a", "e", 1), pair("x", "y", 5)]);
    let response = h.manager.generate(request, 1).await.unwrap();

    let pairs: Vec<_> = response
        .pairs
        .iter()
        .map(|p| (p.player1_id.as_str(), p.player2_id.as_str(), p.match_number))
        .collect();
    assert_eq!(pairs, vec![("a", "e", 1), ("c", "d", 2), ("x", "y", 5)]);
    assert_eq!(response.metadata.hybrid, Some(true));
    assert_eq!(response.metadata.overrides_applied, Some(2));
    assert_eq!(response.metadata.pair_count, Some(3));
}

#[tokio::test]
async fn test_manual_requires_pairs() {
    let h = Harness::new().await;
    h.add_match(1, MatchFormat::Simple).await;
    h.add_players(&["a", "b"]).await;

    let request =
        PairingRequest::auto(1, SeedingMethod::Custom).with_pairs(PairingType::Manual, Vec::new());
    let err = h.manager.generate(request, 1).await.unwrap_err();
    assert!(matches!(err, PairingError::Input(_)));
    assert_eq!(h.store.record_count().await, 0);
}

#[tokio::test]
async fn test_publish_hands_pairs_to_match_updater() {
    let h = Harness::new().await;
    h.add_match(1, MatchFormat::SingleElimination).await;
    h.add_players(&["a", "b", "c", "d"]).await;

    let generated = h
        .manager
        .generate(PairingRequest::auto(1, SeedingMethod::Custom), 1)
        .await
        .unwrap();
    h.manager.approve(1, 2, false).await.unwrap();
    assert!(h.updater.assignments().await.is_empty());

    let published = h.manager.publish(1, 3).await.unwrap();
    assert_eq!(published.status, PairingStatus::Published);
    assert!(!published.can_edit && !published.can_approve && !published.can_publish);

    let assignments = h.updater.assignments().await;
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].0, 1);
    assert_eq!(assignments[0].1, generated.pairs);

    let status = h.manager.status(1).await.unwrap();
    assert_eq!(status.approved_by, Some(2));
    assert_eq!(status.published_by, Some(3));
    assert!(status.published_at.is_some());
}

#[tokio::test]
async fn test_stale_transition_conflicts() {
    let h = Harness::new().await;
    h.add_match(1, MatchFormat::Simple).await;
    h.add_players(&["a", "b"]).await;
    h.manager
        .generate(PairingRequest::auto(1, SeedingMethod::Custom), 1)
        .await
        .unwrap();

    // A second writer read the record while it was still proposed
    let stale = h.store.current_record(1).await.unwrap().unwrap();
    h.manager.approve(1, 2, false).await.unwrap();

    let rejected = stale.rejected(3, Utc::now(), "late").unwrap();
    let err = h
        .store
        .apply_transition(&rejected, PairingStatus::Proposed)
        .await
        .unwrap_err();
    assert!(matches!(err, PairingError::Conflict { match_id: 1 }));
    assert!(err.is_retryable());

    assert_eq!(
        h.manager.status(1).await.unwrap().status,
        Some(PairingStatus::Approved)
    );
}

#[tokio::test]
async fn test_stale_edit_cannot_supersede_published_record() {
    let h = Harness::new().await;
    h.add_match(1, MatchFormat::Simple).await;
    h.add_players(&["a", "b"]).await;
    h.manager
        .generate(PairingRequest::auto(1, SeedingMethod::Custom), 1)
        .await
        .unwrap();

    // An editor read the record while it was still proposed
    let stale = h.store.current_record(1).await.unwrap().unwrap();
    let revised = stale
        .revised(vec![pair("b", "a", 1)], 3, Utc::now())
        .unwrap();
    h.manager.approve(1, 2, true).await.unwrap();

    let err = h
        .store
        .supersede(&revised, stale.id, PairingStatus::Proposed)
        .await
        .unwrap_err();
    assert!(matches!(err, PairingError::Conflict { match_id: 1 }));

    let status = h.manager.status(1).await.unwrap();
    assert_eq!(status.version, Some(1));
    assert_eq!(status.status, Some(PairingStatus::Published));
    assert_eq!(h.manager.history(1).await.unwrap().len(), 1);
    assert_eq!(h.updater.assignments().await.len(), 1);
}

#[tokio::test]
async fn test_concurrent_edit_and_approve_leave_one_outcome() {
    let h = Harness::new().await;
    h.add_match(1, MatchFormat::Simple).await;
    h.add_players(&["a", "b", "c", "d"]).await;
    h.manager
        .generate(PairingRequest::auto(1, SeedingMethod::Custom), 1)
        .await
        .unwrap();

    let editor = h.manager.clone();
    let edit = tokio::spawn(async move {
        editor
            .edit_pairs(1, vec![pair("a", "c", 1), pair("b", "d", 2)], 3)
            .await
    });
    let approver = h.manager.clone();
    let approve = tokio::spawn(async move { approver.approve(1, 2, true).await });

    let edit = edit.await.unwrap();
    let approve = approve.await.unwrap();

    let status = h.manager.status(1).await.unwrap();
    match (&edit, &approve) {
        // Edit landed first; approve then worked on v2 or lost the race
        (Ok(_), _) => {
            assert_eq!(status.version, Some(2));
            if approve.is_ok() {
                assert_eq!(status.status, Some(PairingStatus::Published));
            } else {
                assert_eq!(status.status, Some(PairingStatus::Proposed));
            }
        }
        // Approve landed first; the edit must not replace the published record
        (Err(_), Ok(_)) => {
            assert_eq!(status.version, Some(1));
            assert_eq!(status.status, Some(PairingStatus::Published));
        }
        (Err(_), Err(_)) => panic!("one of edit or approve must succeed"),
    }
}

#[tokio::test]
async fn test_concurrent_approvals_have_one_winner() {
    let h = Harness::new().await;
    h.add_match(1, MatchFormat::Simple).await;
    h.add_players(&["a", "b", "c", "d"]).await;
    h.manager
        .generate(PairingRequest::auto(1, SeedingMethod::Custom), 1)
        .await
        .unwrap();

    let attempts = (0..8).map(|actor| {
        let manager = h.manager.clone();
        tokio::spawn(async move { manager.approve(1, actor, false).await })
    });

    let mut approved = 0;
    for attempt in attempts.collect::<Vec<_>>() {
        match attempt.await.unwrap() {
            Ok(response) => {
                assert_eq!(response.status, PairingStatus::Approved);
                approved += 1;
            }
            Err(PairingError::Conflict { .. } | PairingError::InvalidState { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(approved, 1);
}

#[tokio::test]
async fn test_history_of_unknown_match() {
    let h = Harness::new().await;
    let err = h.manager.history(99).await.unwrap_err();
    assert!(matches!(err, PairingError::MatchNotFound(99)));
}
