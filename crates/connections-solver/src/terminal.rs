//! Judge backed by a human at the terminal.

use async_trait::async_trait;
use coordination::{GroundTruthJudge, Group, JudgeError};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Prints each group and asks whether the game accepted it.
pub struct TerminalJudge<R, W> {
    input: R,
    output: W,
}

impl TerminalJudge<BufReader<io::Stdin>, io::Stdout> {
    /// Judge reading answers from stdin and asking on stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R, W> TerminalJudge<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    async fn say(&mut self, text: &str) -> Result<(), JudgeError> {
        self.output
            .write_all(text.as_bytes())
            .await
            .map_err(|e| JudgeError::Io(e.to_string()))?;
        self.output
            .flush()
            .await
            .map_err(|e| JudgeError::Io(e.to_string()))
    }
}

#[async_trait]
impl<R, W> GroundTruthJudge for TerminalJudge<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn submit(&mut self, group: &Group) -> Result<bool, JudgeError> {
        self.say(&format!("\nSubmit {}\n", group)).await?;
        loop {
            self.say("Was it correct? [y/n] ").await?;
            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .await
                .map_err(|e| JudgeError::Io(e.to_string()))?;
            if read == 0 {
                return Err(JudgeError::Closed);
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> Group {
        Group::new("EMCEE", ["GIFT", "PRESENT", "HOST", "MODERATE"]).unwrap()
    }

    #[tokio::test]
    async fn test_reads_answers_until_valid() {
        let input: &[u8] = b"maybe\nYes\nn\n";
        let mut output = Vec::new();
        {
            let mut judge = TerminalJudge::new(input, &mut output);
            assert!(judge.submit(&group()).await.unwrap());
            assert!(!judge.submit(&group()).await.unwrap());
        }
        let shown = String::from_utf8(output).unwrap();
        assert_eq!(shown.matches("Submit EMCEE").count(), 2);
        assert_eq!(shown.matches("[y/n]").count(), 3);
    }

    #[tokio::test]
    async fn test_closed_input() {
        let input: &[u8] = b"";
        let mut judge = TerminalJudge::new(input, Vec::new());
        let err = judge.submit(&group()).await.unwrap_err();
        assert_eq!(err, JudgeError::Closed);
    }
}
