//! Append-only JSONL log of finished games.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use coordination::GameReport;
use tracing::{info, warn};

/// Append `report` as one JSON line to `path`. Failures are logged, never
/// fatal: the game result is already on screen.
pub fn append_report(report: &GameReport, path: &Path) {
    match serde_json::to_string(report) {
        Ok(json) => {
            match std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
            {
                Ok(mut file) => {
                    if let Err(e) = writeln!(file, "{json}") {
                        warn!("Failed to append telemetry: {e}");
                    } else {
                        info!(path = %path.display(), game_id = %report.game_id, "Appended game telemetry");
                    }
                }
                Err(e) => warn!("Failed to open telemetry file: {e}"),
            }
        }
        Err(e) => warn!("Failed to serialize game report: {e}"),
    }
}

/// Read every report back, skipping lines that do not parse.
pub fn read_reports(path: &Path) -> Result<Vec<GameReport>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening telemetry file {}", path.display()))?;
    let mut reports = Vec::new();
    for (index, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line.context("reading telemetry line")?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(report) => reports.push(report),
            Err(e) => warn!(line = index + 1, "Skipping malformed telemetry line: {e}"),
        }
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coordination::{GameOutcome, GameState, WordUniverse};

    fn report(outcome: GameOutcome) -> GameReport {
        let board = WordUniverse::new(["WAX", "CLAY", "PAPYRUS", "PARCHMENT"]).unwrap();
        let now = chrono::Utc::now();
        GameReport {
            game_id: uuid::Uuid::new_v4(),
            strategy: "debate".into(),
            started_at: now,
            finished_at: now,
            outcome,
            rounds: Vec::new(),
            final_state: GameState::new(board, 4),
        }
    }

    #[test]
    fn test_append_and_read_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.jsonl");

        let first = report(GameOutcome::Win);
        let second = report(GameOutcome::Loss);
        append_report(&first, &path);
        append_report(&second, &path);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);

        let loaded = read_reports(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].game_id, first.game_id);
        assert_eq!(loaded[1].outcome, GameOutcome::Loss);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.jsonl");
        append_report(&report(GameOutcome::Win), &path);
        std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"{not json}\n\n")
            .unwrap();

        assert_eq!(read_reports(&path).unwrap().len(), 1);
    }
}
