//! Subcommand handlers
pub mod search;
pub mod watch;

use pase_search::Outcome;
use std::process::ExitCode;

/// Exit status for a rendered outcome
pub fn exit_code(outcome: &Outcome) -> ExitCode {
    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
