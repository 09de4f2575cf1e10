//! Task status derivation from test detail statuses.

use crate::review::domain::{TaskStatus, TestStatus};
use std::collections::HashSet;

/// Derives the task status from the merged test detail statuses.
///
/// The merged set covers every submitted test detail with its derived status
/// and every untouched test detail with its stored status. Rules apply in
/// priority order:
///
/// 1. any `co_authorize` gives [`TaskStatus::CoAuthorize`]
/// 2. any `withheld` gives [`TaskStatus::WithheldApproval`]
/// 3. any `rerun_requested` gives [`TaskStatus::Pending`]
/// 4. exactly `result_saved` and `rerun_result_saved` give [`TaskStatus::Pending`]
/// 5. only `approve` gives [`TaskStatus::Completed`]
/// 6. anything else gives [`TaskStatus::Pending`]
///
/// # Examples
///
/// ```
/// use labtask::review::domain::{TaskStatus, TestStatus};
/// use labtask::review::validation::resolve_task_status;
///
/// let status = resolve_task_status([TestStatus::Approve, TestStatus::Approve]);
/// assert_eq!(status, TaskStatus::Completed);
///
/// let held = resolve_task_status([TestStatus::Approve, TestStatus::Withheld]);
/// assert_eq!(held, TaskStatus::WithheldApproval);
/// ```
#[must_use]
pub fn resolve_task_status(statuses: impl IntoIterator<Item = TestStatus>) -> TaskStatus {
    let distinct: HashSet<TestStatus> = statuses.into_iter().collect();

    if distinct.contains(&TestStatus::CoAuthorize) {
        return TaskStatus::CoAuthorize;
    }
    if distinct.contains(&TestStatus::Withheld) {
        return TaskStatus::WithheldApproval;
    }
    if distinct.contains(&TestStatus::RerunRequested) {
        return TaskStatus::Pending;
    }
    if distinct.len() == 1 && distinct.contains(&TestStatus::Approve) {
        return TaskStatus::Completed;
    }
    // Rule 4 and the fallback both land on pending.
    TaskStatus::Pending
}
