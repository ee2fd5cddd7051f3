use std::io::{self, BufRead, Stdout, StdinLock, Write};

use crate::error::Result;

/// Line based prompt over any reader/writer pair.
/// The kata use it on stdin/stdout, tests feed it a `Cursor` and a `Vec<u8>`.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl Prompt<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Prompt::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompt { input, output }
    }

    /// Prints `question` and blocks for one line of input.
    /// Returns `None` once the input is closed.
    pub fn ask(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }

    /// Like `ask`, an empty answer becomes `default`.
    pub fn ask_or(&mut self, question: &str, default: &str) -> Result<Option<String>> {
        Ok(self.ask(question)?.map(|answer| {
            if answer.is_empty() {
                default.to_owned()
            } else {
                answer
            }
        }))
    }

    /// y/n question: an empty answer picks `default`, only "n"/"no" say no,
    /// a closed input always stops.
    pub fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let answer = match self.ask(question)? {
            Some(answer) => answer.to_ascii_lowercase(),
            None => return Ok(false),
        };
        Ok(match answer.as_str() {
            "" => default,
            "n" | "no" => false,
            _ => true,
        })
    }

    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}")?;
        self.output.flush()?;
        Ok(())
    }

    /// Prints a report, or the diagnostic of an error that only ends the current query.
    /// Fatal errors are handed back to the caller.
    pub fn show_outcome(&mut self, outcome: Result<String>) -> Result<()> {
        match outcome {
            Ok(report) => self.say(&report),
            Err(err) if !err.is_fatal() => {
                warn!("{err}");
                self.say(&err.to_string())
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(test)]
    pub(crate) fn into_output(self) -> W {
        self.output
    }
}
