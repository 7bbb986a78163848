//! `lanes move`, `lanes up`, `lanes down`: relocate and reorder tasks.

use clap::{ArgGroup, Args};
use lanes_core::board::positions::MoveOutcome;
use lanes_core::{Board, ColumnRole, LanesError, OpContext, TaskId};
use serde::Serialize;
use std::io::Write;

use super::{Globals, Session, resolve_column};
use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["to", "next", "prev", "ready", "start", "done", "column"])
))]
pub struct MoveArgs {
    pub id: TaskId,

    /// Column name (case-insensitive).
    #[arg(long)]
    pub to: Option<String>,

    /// The column after the current one.
    #[arg(long)]
    pub next: bool,

    /// The column before the current one.
    #[arg(long)]
    pub prev: bool,

    /// The column holding the ready role.
    #[arg(long)]
    pub ready: bool,

    /// The column holding the in-progress role.
    #[arg(long)]
    pub start: bool,

    /// The column holding the completed role.
    #[arg(long)]
    pub done: bool,

    /// Column id or name.
    #[arg(long)]
    pub column: Option<String>,
}

#[derive(Args, Debug)]
pub struct SwapArgs {
    pub id: TaskId,
}

#[derive(Serialize)]
struct MoveReport {
    task: TaskId,
    moved: bool,
    column: String,
    position: i64,
}

fn report(board: &Board<'_>, ctx: &OpContext, outcome: MoveOutcome) -> anyhow::Result<MoveReport> {
    let task = match outcome {
        MoveOutcome::Moved { task, .. } | MoveOutcome::AlreadyIn { task, .. } => task,
    };
    let task = board.get_task(ctx, task)?;
    let column = resolve_column(board, ctx, &outcome.column().to_string())?;
    Ok(MoveReport {
        task: task.id,
        moved: outcome.moved(),
        column: column.name,
        position: task.position,
    })
}

fn print_report(output: OutputMode, report: &MoveReport) -> anyhow::Result<()> {
    render(output, report, |r, w| {
        if r.moved {
            writeln!(w, "moved #{} to '{}' (position {})", r.task, r.column, r.position)
        } else {
            writeln!(w, "#{} already in '{}'", r.task, r.column)
        }
    })
}

fn to_role(board: &Board<'_>, ctx: &OpContext, id: TaskId, role: ColumnRole) -> anyhow::Result<MoveReport> {
    match board.move_to_role(ctx, id, role) {
        Ok(outcome) => report(board, ctx, outcome),
        Err(LanesError::AlreadyInTargetColumn { column }) => {
            let task = board.get_task(ctx, id)?;
            Ok(MoveReport {
                task: id,
                moved: false,
                column,
                position: task.position,
            })
        }
        Err(err) => Err(err.into()),
    }
}

pub fn run_move(args: &MoveArgs, globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let board = session.board();
    let ctx = session.context()?;
    let id = args.id;

    let result = if let Some(name) = &args.to {
        report(&board, &ctx, board.move_to_column_named(&ctx, id, name)?)?
    } else if let Some(key) = &args.column {
        let column = resolve_column(&board, &ctx, key)?;
        report(&board, &ctx, board.move_to_column(&ctx, id, column.id)?)?
    } else if args.next {
        report(&board, &ctx, board.move_next(&ctx, id)?)?
    } else if args.prev {
        report(&board, &ctx, board.move_prev(&ctx, id)?)?
    } else if args.ready {
        to_role(&board, &ctx, id, ColumnRole::Ready)?
    } else if args.start {
        to_role(&board, &ctx, id, ColumnRole::InProgress)?
    } else {
        to_role(&board, &ctx, id, ColumnRole::Completed)?
    };
    print_report(session.output(), &result)
}

pub fn run_swap(args: &SwapArgs, up: bool, globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let board = session.board();
    let ctx = session.context()?;

    let task = if up {
        board.swap_up(&ctx, args.id)?
    } else {
        board.swap_down(&ctx, args.id)?
    };
    let column = resolve_column(&board, &ctx, &task.column_id.to_string())?;
    let moved = MoveReport {
        task: task.id,
        moved: true,
        column: column.name,
        position: task.position,
    };
    render(session.output(), &moved, |r, w| {
        writeln!(w, "#{} is now at position {} in '{}'", r.task, r.position, r.column)
    })
}
