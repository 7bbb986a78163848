//! `lanes check`: report invariant violations for the current project.

use lanes_core::board::integrity::IntegrityReport;

use super::{Globals, Session};
use crate::output::{CliError, render};
use lanes_core::ErrorCode;

pub fn run_check(globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let ctx = session.context()?;
    let report = session.board().check_integrity(&ctx)?;

    render(session.output(), &report, |r: &IntegrityReport, w| {
        writeln!(
            w,
            "{} columns, {} tasks, {} relations",
            r.columns, r.tasks, r.relations
        )?;
        if r.is_clean() {
            return writeln!(w, "✓ no problems found");
        }
        for issue in &r.issues {
            writeln!(w, "  {:?}: {}", issue.kind, issue.detail)?;
        }
        Ok(())
    })?;

    if report.is_clean() {
        Ok(())
    } else {
        Err(CliError::from_code(
            ErrorCode::CorruptChain,
            format!("{} integrity problem(s) found", report.issues.len()),
        )
        .into())
    }
}
