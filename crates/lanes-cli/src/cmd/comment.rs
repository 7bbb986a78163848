//! `lanes comment`: add a comment, or list them when no text is given.

use clap::Args;
use lanes_core::TaskId;

use super::{Globals, Session, format_us};
use crate::output::render;

#[derive(Args, Debug)]
pub struct CommentArgs {
    pub id: TaskId,

    /// Comment text. Omit to list existing comments.
    pub text: Option<String>,

    #[arg(long, short = 'n')]
    pub limit: Option<u32>,

    #[arg(long)]
    pub offset: Option<u32>,
}

pub fn run_comment(args: &CommentArgs, globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let board = session.board();
    let ctx = session.context()?;

    if let Some(text) = &args.text {
        let comment = board.add_comment(&ctx, args.id, text)?;
        return render(session.output(), &comment, |c, w| {
            writeln!(w, "commented on #{}", c.task_id)
        });
    }

    let comments = board.comments_for(&ctx, args.id, args.limit, args.offset)?;
    render(session.output(), &comments, |comments, w| {
        for comment in comments {
            writeln!(w, "[{}] {}", format_us(comment.created_at_us), comment.body)?;
        }
        Ok(())
    })
}
