//! Operator confirmation

use std::io::{self, BufRead, Write};

/// Asks the operator a yes/no question
pub trait Confirm {
    /// True only on an explicit yes
    fn confirm(&mut self, message: &str) -> bool;
}

/// Reads the answer from stdin. Anything but `y` is a no, including EOF
/// and read errors.
#[derive(Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, message: &str) -> bool {
        print!("\n⚠️  {} (y/n): ", message);
        let _ = io::stdout().flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_yes(&line),
        }
    }
}

/// Answers yes to everything (`--yes`)
#[derive(Debug, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, message: &str) -> bool {
        println!("\n⚠️  {} (y/n): y [--yes]", message);
        true
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}
