//! Puzzle input: a JSON file or bare words from the command line.

use std::path::Path;

use anyhow::{bail, Context, Result};
use coordination::{Group, WordUniverse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerGroup {
    pub label: String,
    pub words: Vec<String>,
}

/// `{"words": [...], "groups": [{"label": ..., "words": [...]}]}`
///
/// `words` may be omitted when `groups` is given; the board is then the
/// union of the answer groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleFile {
    #[serde(default)]
    pub words: Vec<String>,
    #[serde(default)]
    pub groups: Vec<AnswerGroup>,
}

impl PuzzleFile {
    /// Read and parse a puzzle file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading puzzle file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing puzzle file {}", path.display()))
    }

    pub fn board(&self) -> Result<WordUniverse> {
        if self.words.is_empty() {
            if self.groups.is_empty() {
                bail!("puzzle file has neither words nor groups");
            }
            let words = self.groups.iter().flat_map(|g| g.words.iter());
            return WordUniverse::new(words).context("building board from answer groups");
        }
        WordUniverse::new(&self.words).context("building board")
    }

    /// Answer groups, checked to be four distinct words on the board each.
    pub fn answers(&self) -> Result<Vec<Group>> {
        if self.groups.is_empty() {
            bail!("puzzle file has no answer groups");
        }
        let board = self.board()?;
        self.groups
            .iter()
            .map(|g| {
                let group = Group::new(g.label.as_str(), g.words.iter().map(|w| w.as_str()))
                    .with_context(|| format!("group {} does not have four distinct words", g.label))?;
                if let Some(missing) = group.words().iter().find(|w| !board.contains(w)) {
                    bail!("group {} uses {} which is not on the board", g.label, missing);
                }
                Ok(group)
            })
            .collect()
    }
}

/// Board from positional words, accepting comma separated lists too.
pub fn board_from_args(words: &[String]) -> Result<WordUniverse> {
    let tokens: Vec<&str> = words
        .iter()
        .flat_map(|w| w.split(','))
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .collect();
    if tokens.is_empty() {
        bail!("no puzzle given: pass --puzzle FILE or the board words");
    }
    WordUniverse::new(tokens).context("building board from arguments")
}
