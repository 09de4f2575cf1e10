//! Given steps for task review BDD scenarios.

use super::world::{
    TaskReviewWorld,
    helpers::{CHOL, GLU, LIS_ORDER_ID, TRIG, glucose, lipid, set},
};
use rstest_bdd_macros::given;

#[given("a task with a lipid panel and a glucose test")]
fn seeded_task(world: &mut TaskReviewWorld) {
    world.pending_test_details.clear();
    world.last_result = None;
}

#[given("the LIS rejects pushed orders")]
fn lis_rejects_pushes(world: &mut TaskReviewWorld) {
    world.lis.reject_push(LIS_ORDER_ID);
}

#[given(r#"the lipid panel has cholesterol "{chol}" and triglycerides "{trig}""#)]
fn lipid_statuses(world: &mut TaskReviewWorld, chol: String, trig: String) {
    world
        .pending_test_details
        .push(lipid(set(CHOL, &chol, "190"), set(TRIG, &trig, "150")));
}

#[given(r#"glucose is marked "{status}""#)]
fn glucose_status(world: &mut TaskReviewWorld, status: String) {
    world
        .pending_test_details
        .push(glucose(set(GLU, &status, "5.2")));
}
