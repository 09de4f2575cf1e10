//! Then steps for task review BDD scenarios.

use super::world::{TaskReviewWorld, helpers::TASK};
use labtask::review::{domain::TaskStatus, services::SyncPhase};
use rstest_bdd_macros::then;

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &TaskReviewWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let stored = world
        .repository
        .task(TASK)
        .ok_or_else(|| eyre::eyre!("task is missing from the repository"))?;
    eyre::ensure!(
        stored.status == expected,
        "expected task status {expected}, found {}",
        stored.status
    );
    Ok(())
}

#[then("the update is rejected with status code {code:u16}")]
fn update_rejected(world: &TaskReviewWorld, code: u16) -> Result<(), eyre::Report> {
    match world.last_result.as_ref() {
        Some(Err(err)) if err.status_code() == code => Ok(()),
        Some(Err(err)) => Err(eyre::eyre!(
            "expected status code {code}, got {} ({err})",
            err.status_code()
        )),
        Some(Ok(_)) => Err(eyre::eyre!("expected the update to be rejected")),
        None => Err(eyre::eyre!("no update was submitted")),
    }
}

#[then("the LIS received {count:usize} patched orders")]
fn lis_received(world: &TaskReviewWorld, count: usize) -> Result<(), eyre::Report> {
    world.outcome()?;
    let pushed = world.lis.pushed_orders().len();
    eyre::ensure!(pushed == count, "expected {count} pushed orders, found {pushed}");
    Ok(())
}

#[then("the rerun snapshot count is {count:usize}")]
fn rerun_snapshots(world: &TaskReviewWorld, count: usize) -> Result<(), eyre::Report> {
    let stored = world.repository.rerun_results().len();
    eyre::ensure!(stored == count, "expected {count} rerun snapshots, found {stored}");
    Ok(())
}

#[then("the LIS sync has failed")]
fn lis_sync_failed(world: &TaskReviewWorld) -> Result<(), eyre::Report> {
    let outcome = world.outcome()?;
    eyre::ensure!(
        matches!(outcome.sync, SyncPhase::SyncFailed(ref failures) if !failures.is_empty()),
        "expected a failed LIS sync, got {:?}",
        outcome.sync
    );
    Ok(())
}
