use lanes_core::db::{open_in_memory, relations};
use lanes_core::{
    Board, ColumnRoles, DEFAULT_OP_TIMEOUT, LanesError, NewTask, OpContext, RelationKind, TaskId,
};
use proptest::prelude::*;
use rusqlite::Connection;

fn arb_kind() -> impl Strategy<Value = RelationKind> {
    prop_oneof![
        Just(RelationKind::ParentChild),
        Just(RelationKind::Blocking),
        Just(RelationKind::Related),
    ]
}

/// One engine call with indices resolved modulo the live task/column count.
#[derive(Debug, Clone)]
enum Op {
    Create { column: usize },
    Link { from: usize, to: usize, kind: RelationKind },
    Unlink { from: usize, to: usize },
    Next(usize),
    Prev(usize),
    Up(usize),
    Down(usize),
    Delete(usize),
    AddColumn { after: Option<usize> },
    RemoveColumn(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<usize>().prop_map(|column| Op::Create { column }),
        3 => (any::<usize>(), any::<usize>(), arb_kind())
            .prop_map(|(from, to, kind)| Op::Link { from, to, kind }),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(from, to)| Op::Unlink { from, to }),
        2 => any::<usize>().prop_map(Op::Next),
        2 => any::<usize>().prop_map(Op::Prev),
        1 => any::<usize>().prop_map(Op::Up),
        1 => any::<usize>().prop_map(Op::Down),
        1 => any::<usize>().prop_map(Op::Delete),
        1 => proptest::option::of(any::<usize>()).prop_map(|after| Op::AddColumn { after }),
        1 => any::<usize>().prop_map(Op::RemoveColumn),
    ]
}

fn board_with_defaults() -> (Connection, OpContext) {
    let conn = open_in_memory().expect("db");
    let project = Board::new(&conn)
        .create_project_with_defaults("p", "", DEFAULT_OP_TIMEOUT)
        .expect("project");
    (conn, OpContext::new(project.id))
}

fn tasks(board: &Board<'_>, ctx: &OpContext, n: i64) -> Vec<TaskId> {
    (0..n)
        .map(|i| {
            board
                .create_task(ctx, &NewTask::titled(format!("t{i}")))
                .expect("task")
                .id
        })
        .collect()
}

fn pick<T: Copy>(items: &[T], index: usize) -> Option<T> {
    if items.is_empty() {
        None
    } else {
        Some(items[index % items.len()])
    }
}

/// Apply `op`, ignoring rejections: the invariants must hold either way.
fn apply(board: &Board<'_>, ctx: &OpContext, op: &Op, next_column: &mut usize) {
    let task_ids: Vec<TaskId> = board
        .list_tasks(ctx, None, None, None)
        .expect("tasks")
        .iter()
        .map(|t| t.id)
        .collect();
    let column_ids: Vec<_> = board
        .list_columns(ctx)
        .expect("columns")
        .iter()
        .map(|c| c.id)
        .collect();

    let _ = match *op {
        Op::Create { column } => {
            let new = NewTask {
                column: pick(&column_ids, column),
                ..NewTask::titled("task")
            };
            board.create_task(ctx, &new).map(drop)
        }
        Op::Link { from, to, kind } => match (pick(&task_ids, from), pick(&task_ids, to)) {
            (Some(from), Some(to)) => board.link(ctx, from, to, kind).map(drop),
            _ => Ok(()),
        },
        Op::Unlink { from, to } => match (pick(&task_ids, from), pick(&task_ids, to)) {
            (Some(from), Some(to)) => board.unlink(ctx, from, to).map(drop),
            _ => Ok(()),
        },
        Op::Next(i) => pick(&task_ids, i).map_or(Ok(()), |t| board.move_next(ctx, t).map(drop)),
        Op::Prev(i) => pick(&task_ids, i).map_or(Ok(()), |t| board.move_prev(ctx, t).map(drop)),
        Op::Up(i) => pick(&task_ids, i).map_or(Ok(()), |t| board.swap_up(ctx, t).map(drop)),
        Op::Down(i) => pick(&task_ids, i).map_or(Ok(()), |t| board.swap_down(ctx, t).map(drop)),
        Op::Delete(i) => pick(&task_ids, i).map_or(Ok(()), |t| board.delete_task(ctx, t).map(drop)),
        Op::AddColumn { after } => {
            *next_column += 1;
            let after = after.and_then(|i| pick(&column_ids, i));
            board
                .create_column(ctx, &format!("c{next_column}"), after, ColumnRoles::none())
                .map(drop)
        }
        Op::RemoveColumn(i) => {
            pick(&column_ids, i).map_or(Ok(()), |c| board.delete_column(ctx, c).map(drop))
        }
    };
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn closing_a_triangle_is_always_a_cycle(k1 in arb_kind(), k2 in arb_kind(), k3 in arb_kind()) {
        let (conn, ctx) = board_with_defaults();
        let board = Board::new(&conn);
        let ids = tasks(&board, &ctx, 3);

        board.link(&ctx, ids[0], ids[1], k1).expect("a -> b");
        board.link(&ctx, ids[1], ids[2], k2).expect("b -> c");
        let err = board.link(&ctx, ids[2], ids[0], k3).expect_err("c -> a");
        let is_cycle = matches!(err, LanesError::CircularDependency { .. });
        prop_assert!(is_cycle);
        prop_assert_eq!(relations::list_all_edges(&conn).expect("edges").len(), 2);
    }

    #[test]
    fn self_edges_always_fail(kind in arb_kind()) {
        let (conn, ctx) = board_with_defaults();
        let board = Board::new(&conn);
        let ids = tasks(&board, &ctx, 1);
        let is_self = matches!(
            board.link(&ctx, ids[0], ids[0], kind),
            Err(LanesError::SelfReference(_))
        );
        prop_assert!(is_self);
    }

    #[test]
    fn re_adding_an_edge_keeps_one_with_the_latest_kind(k1 in arb_kind(), k2 in arb_kind()) {
        let (conn, ctx) = board_with_defaults();
        let board = Board::new(&conn);
        let ids = tasks(&board, &ctx, 2);

        board.link(&ctx, ids[0], ids[1], k1).expect("first");
        board.link(&ctx, ids[0], ids[1], k2).expect("second");
        let edges = board.relations_for(&ctx, ids[0]).expect("edges");
        prop_assert_eq!(edges.len(), 1);
        prop_assert_eq!(edges[0].kind, k2);
    }

    #[test]
    fn appends_produce_dense_positions(n in 1_i64..24) {
        let (conn, ctx) = board_with_defaults();
        let board = Board::new(&conn);
        tasks(&board, &ctx, n);
        let positions: Vec<i64> = board
            .list_tasks(&ctx, None, None, None)
            .expect("tasks")
            .iter()
            .map(|t| t.position)
            .collect();
        prop_assert_eq!(positions, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn engine_operations_keep_the_board_consistent(ops in proptest::collection::vec(arb_op(), 1..40)) {
        let (conn, ctx) = board_with_defaults();
        let board = Board::new(&conn);
        let mut next_column = 0;

        for op in &ops {
            apply(&board, &ctx, op, &mut next_column);
            let report = board.check_integrity(&ctx).expect("check");
            prop_assert!(report.is_clean(), "after {:?}: {:?}", op, report.issues);
        }

        let blocked: Vec<TaskId> = board
            .blocked_tasks(&ctx)
            .expect("blocked")
            .iter()
            .map(|b| b.task.id)
            .collect();
        for task in board.ready_tasks(&ctx).expect("ready") {
            prop_assert!(!blocked.contains(&task.id));
        }
    }
}
