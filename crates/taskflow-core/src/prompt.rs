use std::io::{BufRead, Write};

use anyhow::Context;

use crate::app::Confirm;

/// Asks on `output` and reads the answer from `input`. Only `y`/`yes`
/// (any case) counts as yes; end of input counts as no.
pub struct LineConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for LineConfirm<R, W> {
    fn confirm(&mut self, message: &str) -> anyhow::Result<bool> {
        write!(self.output, "{message} [y/N] ")?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input
            .read_line(&mut answer)
            .context("failed to read confirmation")?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

/// Answers yes without asking, for `--yes` and `confirm.delete = off`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _message: &str) -> anyhow::Result<bool> {
        Ok(true)
    }
}
