//! When steps for task review BDD scenarios.

use super::world::{TaskReviewWorld, helpers::{TASK, service}, run_async};
use labtask::review::{
    config::TaskUpdateConfig,
    domain::{UpdateTaskRequest, UserId},
};
use rstest_bdd_macros::when;

#[when("pathologist {user:u64} submits the review")]
fn submit_review(world: &mut TaskReviewWorld, user: u64) {
    let request = world.pending_test_details.drain(..).fold(
        UpdateTaskRequest::new(TASK, UserId::from_raw(user)),
        UpdateTaskRequest::with_test_detail,
    );
    let service = service(
        &world.repository,
        world.lis.clone(),
        &world.notifier,
        TaskUpdateConfig::default(),
    );
    world.last_result = Some(run_async(service.update_task(request)));
}
