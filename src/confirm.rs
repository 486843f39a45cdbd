//! Yes/no confirmation
//!
//! The similarity guard and the schema migrator ask before doing anything
//! the user might not want. They only see this trait, so tests can script
//! the answers with a closure.

use console::Term;
use std::io::BufRead;

pub trait Confirm {
    /// Ask `prompt` and block until the user answers
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Prompts the user and reads a `y`/`n` line.
///
/// The prompt goes to whichever of stderr or stdout is still a terminal, so
/// redirecting one of them does not silence the question. With neither
/// attached the answer is read from plain stdin. Anything other than an
/// answer starting with `y` or `Y` (including a read error or end of input)
/// counts as "no".
pub struct TerminalConfirm {
    term: Option<Term>,
}

impl TerminalConfirm {
    pub fn new() -> Self {
        let term = [Term::stderr(), Term::stdout()]
            .into_iter()
            .find(|t| t.is_term());
        Self { term }
    }
}

impl Default for TerminalConfirm {
    fn default() -> Self {
        Self::new()
    }
}

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        let question = format!("{prompt} (y/n): ");
        let Some(term) = &self.term else {
            eprint!("{question}");
            return read_answer(&mut std::io::stdin().lock());
        };

        if term.write_str(&question).is_err() {
            return false;
        }
        match term.read_line() {
            Ok(answer) => is_yes(&answer),
            Err(e) => {
                tracing::debug!("confirmation read failed: {}", e);
                false
            }
        }
    }
}

fn read_answer(input: &mut impl BufRead) -> bool {
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => is_yes(&answer),
        Err(e) => {
            tracing::debug!("confirmation read failed: {}", e);
            false
        }
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim_start().starts_with(['y', 'Y'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers() {
        assert!(is_yes("y"));
        assert!(is_yes("  Yes please"));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
        assert!(!is_yes("maybe"));
    }

    #[test]
    fn test_answer_from_piped_input() {
        assert!(read_answer(&mut std::io::Cursor::new("y\n")));
        assert!(!read_answer(&mut std::io::Cursor::new("no\n")));
        assert!(!read_answer(&mut std::io::Cursor::new("")));
    }

    #[test]
    fn test_closure_is_a_confirm() {
        let mut asked = Vec::new();
        let mut answers = [false, true].into_iter();
        let mut scripted = |prompt: &str| {
            asked.push(prompt.to_string());
            answers.next().unwrap_or(false)
        };
        let confirm: &mut dyn Confirm = &mut scripted;
        assert!(!confirm.confirm("first?"));
        assert!(confirm.confirm("second?"));
        assert_eq!(asked, vec!["first?", "second?"]);
    }
}
