//! logseq-md - Export outliner pages as Markdown

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = logseq_md::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
