//! Replan strategy and jury voting over a scripted gateway.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{answers, ballot, group, plan_json, test_config, universe, ScriptedGateway};
use coordination::ensemble::{majority_threshold, Jury};
use coordination::gateway::{CallPolicy, CallStage};
use coordination::{
    AnswerKeyJudge, GameEngine, GameOutcome, NegativeExampleSet, Plan, PlanAttempt, Replanner,
    StrategyKind,
};

fn replan_config() -> coordination::SolverConfig {
    let mut config = test_config();
    config.strategy = StrategyKind::Replan;
    config
}

/// Groups 0 and 2 right; 1 and 3 trade MODERATE for MUMMY.
fn half_right() -> String {
    let a = answers();
    plan_json(&[
        a[0].clone(),
        group("EMCEE", ["GIFT", "PRESENT", "HOST", "MUMMY"]),
        a[2].clone(),
        group("WRAPPED", ["MODERATE", "ANCHOR", "BURRITO", "SPRAIN"]),
    ])
}

// ── Jury majority ──────────────────────────────────────────────────

#[tokio::test]
async fn test_jury_majority_boundaries_with_three_judges() {
    assert_eq!(majority_threshold(3), 2);

    // per group: 3 yes, 2 yes, 1 yes, 0 yes
    let ballots = [
        ballot(&[true, true, true, false]),
        ballot(&[true, true, false, false]),
        ballot(&[true, false, false, false]),
    ];
    let next = Arc::new(AtomicUsize::new(0));
    let gateway = ScriptedGateway::new(move |request| {
        assert_eq!(request.stage, CallStage::Jury);
        Ok(ballots[next.fetch_add(1, Ordering::SeqCst) % 3].clone())
    });
    let jury = Jury::new(gateway.clone(), 3, CallPolicy::default()).unwrap();
    let verdict = jury
        .verdict(&Plan { groups: answers() })
        .await
        .unwrap();

    assert_eq!(verdict.accepted(), vec![true, true, false, false]);
    let yes: Vec<usize> = verdict.tallies.iter().map(|t| t.yes).collect();
    assert_eq!(yes, vec![3, 2, 1, 0]);
    assert_eq!(gateway.count(CallStage::Jury), 3);
}

// ── Regeneration containment ───────────────────────────────────────

#[tokio::test]
async fn test_passing_groups_kept_and_leftover_regenerated() {
    let gateway = ScriptedGateway::new(|request| {
        let user = request.last_user().unwrap_or_default();
        match request.stage {
            CallStage::PlanGeneration => Ok(half_right()),
            CallStage::Regeneration => {
                let a = answers();
                Ok(plan_json(&[a[1].clone(), a[3].clone()]))
            }
            CallStage::Jury if user.contains("WAX") => {
                Ok(ballot(&[true, false, true, false]))
            }
            CallStage::Jury => Ok(ballot(&[true, true])),
            other => panic!("unexpected stage {other}"),
        }
    });
    let replanner = Replanner::new(gateway.clone(), &replan_config()).unwrap();
    let attempt = replanner
        .generate_plan(&universe(), &NegativeExampleSet::new())
        .await
        .unwrap();

    // exactly the eight words of the two rejected groups are regenerated
    let regen = gateway.calls_for(CallStage::Regeneration);
    assert_eq!(regen.len(), 1);
    let request = regen[0].last_user().unwrap();
    let listed = request.matches('"').count() / 2;
    assert_eq!(listed, 8);
    for kept in ["WAX", "CLAY", "PAPYRUS", "PARCHMENT", "FLAIR", "TALENT", "INSTINCT", "FACULTY"] {
        assert!(!request.contains(kept));
    }

    let PlanAttempt::Accepted(plan) = attempt else {
        panic!("expected the combined plan to be accepted");
    };
    let mut words: Vec<String> = plan
        .groups
        .iter()
        .flat_map(|g| g.words().iter().map(|w| w.as_str().to_string()))
        .collect();
    words.sort();
    words.dedup();
    assert_eq!(words.len(), 16);
}

#[tokio::test]
async fn test_replan_game_wins_after_regeneration() {
    let gateway = ScriptedGateway::new(|request| {
        let user = request.last_user().unwrap_or_default();
        match request.stage {
            CallStage::PlanGeneration => Ok(half_right()),
            CallStage::Regeneration => {
                let a = answers();
                Ok(plan_json(&[a[3].clone(), a[1].clone()]))
            }
            CallStage::Jury if user.contains("WAX") => {
                Ok(ballot(&[true, false, true, false]))
            }
            CallStage::Jury => Ok(ballot(&[true, true])),
            other => panic!("unexpected stage {other}"),
        }
    });
    let mut engine = GameEngine::from_config(&replan_config(), gateway.clone()).unwrap();
    let mut judge = AnswerKeyJudge::new(answers());
    let report = engine.play(universe(), &mut judge).await.unwrap();

    assert_eq!(report.outcome, GameOutcome::Win);
    assert_eq!(report.strategy, "replan");
    assert_eq!(report.final_state.mistakes_made, 0);
    assert_eq!(gateway.count(CallStage::PlanGeneration), 1);
    assert_eq!(gateway.count(CallStage::Regeneration), 1);
    // three judges on the full plan, three on the regenerated part
    assert_eq!(gateway.count(CallStage::Jury), 6);
}

#[tokio::test]
async fn test_unanimous_rejection_discards_and_retries_with_memory() {
    let generations = Arc::new(AtomicUsize::new(0));
    let gateway = ScriptedGateway::new(move |request| match request.stage {
        CallStage::PlanGeneration => {
            if generations.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(half_right())
            } else {
                Ok(plan_json(&answers()))
            }
        }
        CallStage::Jury if request.last_user().unwrap_or_default().contains(r#"{"WRAPPED""#) => {
            Ok(ballot(&[false, false, false, false]))
        }
        CallStage::Jury => Ok(ballot(&[true, true, true, true])),
        other => panic!("unexpected stage {other}"),
    });
    let replanner = Replanner::new(gateway.clone(), &replan_config()).unwrap();
    let outcome = replanner
        .plan(&universe(), &NegativeExampleSet::new())
        .await
        .unwrap();

    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.learned.failed_plans().len(), 1);
    assert_eq!(outcome.learned.failed_groups().len(), 4);
    let second = &gateway.calls_for(CallStage::PlanGeneration)[1];
    assert!(second.messages[1].content.contains("Failed plans"));
}
