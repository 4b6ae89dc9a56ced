//! Task ordering for display
//!
//! Tasks are ordered by deadline, earliest first, with every task that has a deadline
//! ahead of every task that has none. Ties on the deadline (including two tasks without
//! one) fall back to priority rank, urgent first, with an unset priority counting as
//! medium. The sort is stable, so tasks equal on both keys keep their input order.
//!
//! A deadline that cannot be parsed counts as no deadline.

use std::cmp::Ordering;

use crate::models::task::Task;

/// Comparator used by [`rank_tasks`]
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    match (a.deadline_at(), b.deadline_at()) {
        (Some(left), Some(right)) if left != right => return left.cmp(&right),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        _ => {}
    }

    a.effective_priority()
        .rank()
        .cmp(&b.effective_priority().rank())
}

/// Returns the tasks in display order; the input is left untouched
pub fn rank_tasks(tasks: &[Task]) -> Vec<Task> {
    let mut ranked = tasks.to_vec();
    ranked.sort_by(compare_tasks);
    ranked
}

/// In-place variant for callers that own the list
pub fn rank_tasks_in_place(tasks: &mut [Task]) {
    tasks.sort_by(compare_tasks);
}
