//! `lanes show`: one task with its relations, labels and comments.

use clap::Args;
use lanes_core::TaskId;
use lanes_core::service::TaskDetails;
use std::io::{self, Write};

use super::{Globals, Session, format_us};
use crate::output::{pretty_kv, pretty_section, render};

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub id: TaskId,

    /// Number of comments to show, newest first.
    #[arg(long, default_value_t = 10)]
    pub comments: usize,
}

fn id_list(ids: &[TaskId]) -> String {
    ids.iter().map(|id| format!("#{id}")).collect::<Vec<_>>().join(", ")
}

fn render_details(details: &TaskDetails, comments: usize, w: &mut dyn Write) -> io::Result<()> {
    let task = &details.task;
    pretty_section(w, &format!("#{} {}", task.id, task.title))?;
    pretty_kv(w, "column", format!("{} (position {})", details.column.name, task.position))?;
    pretty_kv(w, "priority", task.priority.to_string())?;
    pretty_kv(w, "type", task.task_type.to_string())?;
    pretty_kv(w, "blocked", if details.blocked { "yes" } else { "no" })?;
    pretty_kv(w, "created", format_us(task.created_at_us))?;
    pretty_kv(w, "updated", format_us(task.updated_at_us))?;
    if !details.labels.is_empty() {
        let names: Vec<&str> = details.labels.iter().map(|l| l.name.as_str()).collect();
        pretty_kv(w, "labels", names.join(", "))?;
    }
    if !task.description.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", task.description)?;
    }

    let n = &details.neighbours;
    let groups = [
        ("waits on", &n.blockers),
        ("blocks", &n.dependents),
        ("parents", &n.parents),
        ("children", &n.children),
        ("related", &n.related),
    ];
    if groups.iter().any(|(_, ids)| !ids.is_empty()) {
        writeln!(w)?;
        pretty_section(w, "Relations")?;
        for (heading, ids) in groups {
            if !ids.is_empty() {
                pretty_kv(w, heading, id_list(ids))?;
            }
        }
    }

    if !details.comments.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Comments")?;
        for comment in details.comments.iter().take(comments) {
            writeln!(w, "  [{}] {}", format_us(comment.created_at_us), comment.body)?;
        }
    }
    Ok(())
}

pub fn run_show(args: &ShowArgs, globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let ctx = session.context()?;
    let details = session.board().task_details(&ctx, args.id)?;
    render(session.output(), &details, |d, w| {
        render_details(d, args.comments, w)
    })
}
