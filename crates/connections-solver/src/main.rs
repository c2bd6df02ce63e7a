use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use coordination::{
    AnswerKeyJudge, GameEngine, GameOutcome, GroundTruthJudge, OpenAiGateway, SolverConfig,
};
use tracing::info;

use connections_solver::cli::Args;
use connections_solver::puzzle_file::{board_from_args, PuzzleFile};
use connections_solver::telemetry::append_report;
use connections_solver::terminal::TerminalJudge;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = SolverConfig::load(args.config.as_deref()).context("loading config")?;
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let puzzle = args.puzzle.as_deref().map(PuzzleFile::load).transpose()?;
    let board = match &puzzle {
        Some(puzzle) => puzzle.board()?,
        None => board_from_args(&args.words)?,
    };
    let mut judge: Box<dyn GroundTruthJudge> = match (&puzzle, args.auto_judge) {
        (Some(puzzle), true) => Box::new(AnswerKeyJudge::new(puzzle.answers()?)),
        _ => Box::new(TerminalJudge::stdio()),
    };

    info!(
        strategy = %config.strategy,
        words = board.len(),
        base_url = %config.gateway.base_url,
        solver_model = %config.gateway.solver_model,
        "Connections solver starting"
    );

    let gateway = Arc::new(OpenAiGateway::from_config(&config.gateway).context("building gateway")?);
    let mut engine = GameEngine::from_config(&config, gateway)?;
    let report = engine.play(board, judge.as_mut()).await?;

    if let Some(path) = &args.telemetry {
        append_report(&report, path);
    }

    let state = &report.final_state;
    println!(
        "{}: {} of {} groups, {} mistakes, {} rounds, {}s",
        report.outcome,
        state.groups_correct,
        state.total_groups,
        state.mistakes_made,
        report.rounds.len(),
        (report.finished_at - report.started_at).num_seconds()
    );
    for group in &state.solved {
        println!("  {}", group);
    }

    if report.outcome == GameOutcome::Loss {
        std::process::exit(1);
    }
    Ok(())
}
