//! Interactive id prompt used when no ids are given on the command line.

use anyhow::{bail, Result};
use std::io::{BufRead, Write};

pub const HINT: &str = "input album id split by \",\", ex: 100000,1100200";
pub const PROMPT: &str = "IDs: ";

/// Prints the hint and prompt to `output`, then reads one line from `input`.
pub fn read_ids<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String> {
    writeln!(output, "{}", HINT)?;
    write!(output, "{}", PROMPT)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("no album ids given");
    }
    Ok(line.trim().to_string())
}
