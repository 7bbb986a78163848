//! `lanes link` / `lanes unlink`: edit the relation graph.
//!
//! `lanes link A B --kind blocking` means A waits on B; `--kind parent`
//! makes A the parent of B.

use clap::Args;
use lanes_core::{RelationKind, TaskId};
use serde::Serialize;

use super::{Globals, Session};
use crate::output::render;

#[derive(Args, Debug)]
pub struct LinkArgs {
    pub from: TaskId,
    pub to: TaskId,

    /// parent, blocking or related.
    #[arg(long, short, default_value = "related")]
    pub kind: RelationKind,
}

#[derive(Args, Debug)]
pub struct UnlinkArgs {
    pub from: TaskId,
    pub to: TaskId,
}

#[derive(Serialize)]
struct LinkReport {
    from: TaskId,
    to: TaskId,
    kind: Option<RelationKind>,
    previous: Option<RelationKind>,
    changed: bool,
}

pub fn run_link(args: &LinkArgs, globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let ctx = session.context()?;
    let previous = session.board().link(&ctx, args.from, args.to, args.kind)?;

    let report = LinkReport {
        from: args.from,
        to: args.to,
        kind: Some(args.kind),
        previous,
        changed: previous != Some(args.kind),
    };
    render(session.output(), &report, |r, w| match r.previous {
        Some(old) if r.changed => {
            writeln!(w, "#{} → #{}: {old} replaced by {}", r.from, r.to, args.kind)
        }
        Some(_) => writeln!(w, "#{} → #{} already {}", r.from, r.to, args.kind),
        None => writeln!(w, "linked #{} → #{} ({})", r.from, r.to, args.kind),
    })
}

pub fn run_unlink(args: &UnlinkArgs, globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let ctx = session.context()?;
    let removed = session.board().unlink(&ctx, args.from, args.to)?;

    let report = LinkReport {
        from: args.from,
        to: args.to,
        kind: None,
        previous: None,
        changed: removed,
    };
    render(session.output(), &report, |r, w| {
        if r.changed {
            writeln!(w, "unlinked #{} → #{}", r.from, r.to)
        } else {
            writeln!(w, "no relation #{} → #{}", r.from, r.to)
        }
    })
}
