//! Runner pieces wired together: puzzle file → engine → terminal judge →
//! telemetry, with a canned gateway instead of a model.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use connections_solver::puzzle_file::PuzzleFile;
use connections_solver::telemetry::{append_report, read_reports};
use connections_solver::terminal::TerminalJudge;
use coordination::gateway::{CompletionGateway, CompletionRequest, GatewayError};
use coordination::{GameEngine, GameOutcome, Plan, SolverConfig, StrategyKind};

const PUZZLE: &str = r#"{
    "groups": [
        {"label": "WRITING SURFACES", "words": ["WAX", "CLAY", "PAPYRUS", "PARCHMENT"]},
        {"label": "EMCEE", "words": ["GIFT", "PRESENT", "HOST", "MODERATE"]},
        {"label": "KNACK", "words": ["FLAIR", "TALENT", "INSTINCT", "FACULTY"]},
        {"label": "THINGS THAT ARE WRAPPED", "words": ["MUMMY", "ANCHOR", "BURRITO", "SPRAIN"]}
    ]
}"#;

/// Always answers with the same plan.
struct CannedGateway(String);

#[async_trait]
impl CompletionGateway for CannedGateway {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, GatewayError> {
        Ok(self.0.clone())
    }
}

fn load_puzzle(dir: &std::path::Path) -> PuzzleFile {
    let path = dir.join("puzzle.json");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(PUZZLE.as_bytes())
        .unwrap();
    PuzzleFile::load(&path).unwrap()
}

#[tokio::test]
async fn test_terminal_judged_game_is_logged() {
    let dir = tempfile::tempdir().unwrap();
    let puzzle = load_puzzle(dir.path());
    let answers = puzzle.answers().unwrap();
    let gateway = Arc::new(CannedGateway(
        Plan { groups: answers }.to_json().to_string(),
    ));

    let config = SolverConfig {
        strategy: StrategyKind::Direct,
        ..SolverConfig::default()
    };
    let mut engine = GameEngine::from_config(&config, gateway).unwrap();

    let input: &[u8] = b"y\ny\ny\ny\n";
    let mut output = Vec::new();
    let mut judge = TerminalJudge::new(input, &mut output);
    let report = engine
        .play(puzzle.board().unwrap(), &mut judge)
        .await
        .unwrap();
    drop(judge);

    assert_eq!(report.outcome, GameOutcome::Win);
    assert_eq!(String::from_utf8(output).unwrap().matches("Submit").count(), 4);

    let log = dir.path().join("games.jsonl");
    append_report(&report, &log);
    let logged = read_reports(&log).unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].final_state.groups_correct, 4);
}

#[tokio::test]
async fn test_closed_terminal_aborts_the_game() {
    let dir = tempfile::tempdir().unwrap();
    let puzzle = load_puzzle(dir.path());
    let gateway = Arc::new(CannedGateway(
        Plan {
            groups: puzzle.answers().unwrap(),
        }
        .to_json()
        .to_string(),
    ));
    let config = SolverConfig {
        strategy: StrategyKind::Direct,
        ..SolverConfig::default()
    };
    let mut engine = GameEngine::from_config(&config, gateway).unwrap();

    let input: &[u8] = b"";
    let mut judge = TerminalJudge::new(input, Vec::new());
    let err = engine
        .play(puzzle.board().unwrap(), &mut judge)
        .await
        .unwrap_err();
    assert!(matches!(err, coordination::SolverError::Judge(_)));
}
