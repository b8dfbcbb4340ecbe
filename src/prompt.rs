//! Range prompts for the terminal.

use async_trait::async_trait;
use digivat_library::{RangeInput, RangePrompt, RangeRequest};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Page range given on the command line; never asks.
#[derive(Debug, Clone, Copy)]
pub struct FixedRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

#[async_trait]
impl RangePrompt for FixedRange {
    async fn ask(&self, request: &RangeRequest) -> Option<RangeInput> {
        Some(RangeInput {
            start: self.start.unwrap_or(0),
            end: self.end.unwrap_or_else(|| total(request)),
        })
    }
}

/// Asks for the start and end page on stdin.
///
/// Only one dialog is shown at a time; concurrent requests wait for the
/// terminal. An empty answer keeps the default, end of input (or `q`)
/// dismisses the dialog.
pub struct TerminalPrompt {
    stdin: Mutex<Lines<BufReader<Stdin>>>,
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self { stdin: Mutex::new(BufReader::new(tokio::io::stdin()).lines()) }
    }
}

#[async_trait]
impl RangePrompt for TerminalPrompt {
    async fn ask(&self, request: &RangeRequest) -> Option<RangeInput> {
        let mut stdin = self.stdin.lock().await;
        let mut stderr = tokio::io::stderr();
        let total = total(request);
        eprintln!("{} has {} pages (0 to {}).", request.title, request.total, total);
        let start = ask_number(&mut *stdin, &mut stderr, "Start page", 0).await?;
        let end = ask_number(&mut *stdin, &mut stderr, "End page (exclusive)", total).await?;
        Some(RangeInput { start, end })
    }
}

fn total(request: &RangeRequest) -> i64 {
    i64::try_from(request.total).unwrap_or(i64::MAX)
}

/// Keep asking until `input` yields a number, or `None` once it is
/// dismissed or exhausted. Errors writing to `output` are ignored.
async fn ask_number<R, W>(input: &mut Lines<R>, output: &mut W, label: &str, default: i64) -> Option<i64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        _ = output.write_all(format!("{label} [{default}]: ").as_bytes()).await;
        _ = output.flush().await;
        let line = match input.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(error = %err, "Could not read from the terminal; dismissing");
                return None;
            },
        };
        match parse_answer(&line, default) {
            Answer::Number(n) => return Some(n),
            Answer::Dismiss => return None,
            Answer::Invalid => {
                _ = output.write_all(format!("Not a page number: {}\n", line.trim()).as_bytes()).await;
            },
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Answer {
    Number(i64),
    Dismiss,
    Invalid,
}

fn parse_answer(line: &str, default: i64) -> Answer {
    match line.trim() {
        "" => Answer::Number(default),
        "q" | "Q" => Answer::Dismiss,
        other => other.parse().map_or(Answer::Invalid, Answer::Number),
    }
}
