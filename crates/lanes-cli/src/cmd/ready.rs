//! `lanes ready` / `lanes blocked`: the derived task sets.

use lanes_core::service::BlockedTask;
use serde::Serialize;
use std::io::{self, Write};

use super::{Globals, Session, TaskView};
use crate::output::{Renderable, render_list};

pub fn run_ready(globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let board = session.board();
    let ctx = session.context()?;
    let tasks = board.ready_tasks(&ctx)?;
    render_list(&TaskView::collect(&board, &ctx, tasks)?, session.output())
}

#[derive(Serialize)]
struct BlockedView(BlockedTask);

impl Renderable for BlockedView {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let blockers: Vec<String> = self.0.blockers.iter().map(|b| format!("#{b}")).collect();
        writeln!(
            w,
            "{:<6} {}  (waits on {})",
            format!("#{}", self.0.task.id),
            self.0.task.title,
            blockers.join(", ")
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let blockers: Vec<String> = self.0.blockers.iter().map(ToString::to_string).collect();
        writeln!(w, "{}  {}  {}", self.0.task.id, blockers.join(","), self.0.task.title)
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "BLOCKERS", "TITLE"]
    }
}

pub fn run_blocked(globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let ctx = session.context()?;
    let blocked: Vec<BlockedView> = session
        .board()
        .blocked_tasks(&ctx)?
        .into_iter()
        .map(BlockedView)
        .collect();
    render_list(&blocked, session.output())
}
