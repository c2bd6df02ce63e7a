use std::path::PathBuf;

use clap::Parser;
use coordination::{SolverConfig, StrategyKind};

/// Solving strategy, as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyArg {
    /// Multi-agent debate, repair, ranking and merge
    Debate,
    /// Single plan judged by a jury, with leftover regeneration
    Replan,
    /// One conversation told which group was wrong
    Direct,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Debate => StrategyKind::Debate,
            StrategyArg::Replan => StrategyKind::Replan,
            StrategyArg::Direct => StrategyKind::Direct,
        }
    }
}

/// Solve a Connections puzzle with a team of language models.
#[derive(Parser, Debug)]
#[command(name = "connections-solver", author, version, about, long_about = None)]
pub struct Args {
    /// TOML config file (environment and flags override it)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Solving strategy
    #[arg(short, long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Number of debate agents
    #[arg(long)]
    pub agents: Option<usize>,

    /// Number of debate rounds
    #[arg(long)]
    pub rounds: Option<usize>,

    /// Number of jury judges
    #[arg(long)]
    pub judges: Option<usize>,

    /// Puzzle JSON file: {"words": [...], "groups": [{"label": ..., "words": [...]}]}
    #[arg(short, long)]
    pub puzzle: Option<PathBuf>,

    /// Judge with the answer groups from --puzzle instead of asking at the terminal
    #[arg(long, default_value_t = false, requires = "puzzle")]
    pub auto_judge: bool,

    /// Append the game report as one JSON line to this file
    #[arg(long)]
    pub telemetry: Option<PathBuf>,

    /// Board words, when no puzzle file is given
    #[arg(value_name = "WORDS")]
    pub words: Vec<String>,
}

impl Args {
    /// Apply flag overrides on top of file and environment settings.
    pub fn apply(&self, config: &mut SolverConfig) {
        if let Some(strategy) = self.strategy {
            config.strategy = strategy.into();
        }
        if let Some(agents) = self.agents {
            config.debate.agents = agents;
        }
        if let Some(rounds) = self.rounds {
            config.debate.rounds = rounds;
        }
        if let Some(judges) = self.judges {
            config.jury.judges = judges;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "connections-solver",
            "--strategy",
            "replan",
            "--agents",
            "5",
            "--judges",
            "7",
            "WAX",
            "CLAY",
        ]);
        let mut config = SolverConfig::default();
        args.apply(&mut config);
        assert_eq!(config.strategy, StrategyKind::Replan);
        assert_eq!(config.debate.agents, 5);
        assert_eq!(config.debate.rounds, SolverConfig::default().debate.rounds);
        assert_eq!(config.jury.judges, 7);
        assert_eq!(args.words, vec!["WAX", "CLAY"]);
    }

    #[test]
    fn test_auto_judge_needs_puzzle_file() {
        assert!(Args::try_parse_from(["connections-solver", "--auto-judge"]).is_err());
        let args =
            Args::try_parse_from(["connections-solver", "--auto-judge", "--puzzle", "p.json"])
                .unwrap();
        assert!(args.auto_judge);
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        assert!(Args::try_parse_from(["connections-solver", "--strategy", "vote"]).is_err());
    }
}
