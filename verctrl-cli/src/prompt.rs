//! Blocking operator prompts

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

/// Ask a yes/no question; only `y`/`Y` counts as yes.
/// With `assume_yes` the question is skipped.
pub fn confirm(question: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }

    let answer = ask(&format!("{} (y/N): ", question))?;
    Ok(answer.eq_ignore_ascii_case("y"))
}

/// Print `question` and read one trimmed line from stdin
pub fn ask(question: &str) -> Result<String> {
    print!("{}", question);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read answer from stdin")?;

    Ok(line.trim().to_string())
}
