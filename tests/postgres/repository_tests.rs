//! Task review repository tests against a real `PostgreSQL` database.

use std::sync::Arc;

use super::helpers::{setup_repository, test_runtime};
use labtask::review::{
    adapters::{
        memory::{InMemoryLisClient, RecordingRerunNotifier},
        postgres::PostgresTaskReviewRepository,
    },
    domain::{
        InvestigationId, InvestigationStatus, InvestigationUpdate, LabId, LisLineFields, LisOrder,
        LisOrderLine, MedicalRemarkUpdate, RemarkUpdates, TaskId, TaskStatus, TestDetailId,
        TestDetailUpdate, UpdateTaskRequest, UserId, VisitId, VisitLab,
    },
    ports::{TaskReviewRepository, TaskReviewRepositoryError},
    services::TaskUpdateService,
};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;

const TASK: TaskId = TaskId::from_raw(7);
const REVIEWER: UserId = UserId::from_raw(21);
const SECOND_OPINION: UserId = UserId::from_raw(22);
const GLUCOSE: TestDetailId = TestDetailId::from_raw(400);
const GLU: InvestigationId = InvestigationId::from_raw(4001);
const LAB: LabId = LabId::from_raw(3);
const VISIT: &str = "VIS-9100";

fn lis() -> InMemoryLisClient {
    let lis = InMemoryLisClient::new();
    lis.insert_order(
        VisitId::new(VISIT),
        LAB,
        LisOrder {
            order_id: "ORD-9100".to_owned(),
            lines: vec![LisOrderLine {
                fields: LisLineFields {
                    test_code: "GLU".to_owned(),
                    test_type: "INV".to_owned(),
                    test_value: "4.8".to_owned(),
                    test_status: "Entered".to_owned(),
                    ..LisLineFields::default()
                },
                ..LisOrderLine::default()
            }],
            ..LisOrder::default()
        },
    );
    lis
}

fn service(
    repo: &PostgresTaskReviewRepository,
    lis: &InMemoryLisClient,
) -> TaskUpdateService<
    PostgresTaskReviewRepository,
    InMemoryLisClient,
    RecordingRerunNotifier,
    DefaultClock,
> {
    TaskUpdateService::new(
        Arc::new(repo.clone()),
        Arc::new(lis.clone()),
        Arc::new(RecordingRerunNotifier::new()),
        Arc::new(DefaultClock),
    )
}

fn glucose(update: InvestigationUpdate) -> UpdateTaskRequest {
    UpdateTaskRequest::new(TASK, REVIEWER)
        .with_test_detail(TestDetailUpdate::new(GLUCOSE, [update]))
}

#[rstest]
fn seeded_task_and_assignment_are_read(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let prepared = setup_repository(shared_test_cluster)?;
    let repo = &prepared.repo;
    let rt = test_runtime()?;

    let task = rt
        .block_on(repo.find_task(TASK))?
        .ok_or_else(|| eyre::eyre!("task should exist"))?;
    eyre::ensure!(task.status == TaskStatus::Pending, "unexpected status {}", task.status);
    eyre::ensure!(task.order_ref == "OMS-ORDER-88", "unexpected order ref");

    let assignment = rt
        .block_on(repo.find_active_assignment(TASK))?
        .ok_or_else(|| eyre::eyre!("assignment should exist"))?;
    eyre::ensure!(assignment.pathologist_id == REVIEWER, "wrong pathologist assigned");

    let details = rt.block_on(repo.find_test_details_by_task(TASK))?;
    eyre::ensure!(details.len() == 2, "expected two test details, got {details:?}");
    let reviewer = rt
        .block_on(repo.find_user(REVIEWER))?
        .ok_or_else(|| eyre::eyre!("user should exist"))?;
    eyre::ensure!(reviewer.lis_user_id.as_deref() == Some("7001"), "LIS id not read");
    eyre::ensure!(
        rt.block_on(repo.find_task(TaskId::from_raw(99)))?.is_none(),
        "unknown task should be absent"
    );
    Ok(())
}

#[rstest]
fn visit_lookup_skips_rejected_samples(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let prepared = setup_repository(shared_test_cluster)?;
    let repo = &prepared.repo;
    let rt = test_runtime()?;

    let visits = rt.block_on(
        repo.find_visits_by_external_test_ids(&["OMS-300".to_owned(), "OMS-400".to_owned()]),
    )?;

    let expected = vec![VisitLab {
        visit_id: VisitId::new(VISIT),
        lab_id: LAB,
    }];
    eyre::ensure!(visits == expected, "unexpected visits {visits:?}");
    Ok(())
}

#[rstest]
fn rerun_with_remark_is_committed(shared_test_cluster: &'static TestCluster) -> eyre::Result<()> {
    let prepared = setup_repository(shared_test_cluster)?;
    let rt = test_runtime()?;
    let lis = lis();

    let outcome = rt.block_on(
        service(&prepared.repo, &lis).update_task(glucose(
            InvestigationUpdate::new(GLU, "rerun", "5.6")
                .with_rerun_reason(Some("haemolysed".to_owned()))
                .with_remarks(RemarkUpdates {
                    medical: Some(MedicalRemarkUpdate {
                        id: None,
                        description: "redraw requested".to_owned(),
                        delete: false,
                    }),
                    withheld_reason: None,
                }),
        )),
    )?;

    eyre::ensure!(outcome.sync.is_consistent(), "unexpected sync {:?}", outcome.sync);
    eyre::ensure!(outcome.created_remark_ids.len() == 1, "expected one remark id");
    eyre::ensure!(
        prepared.count("rerun_investigation_results")? == 1,
        "expected one rerun snapshot"
    );
    eyre::ensure!(
        prepared.count("remarks WHERE deleted_at IS NULL")? == 1,
        "expected one live remark"
    );

    let stored = rt.block_on(prepared.repo.find_investigations(&[GLU]))?;
    let glu = stored
        .first()
        .ok_or_else(|| eyre::eyre!("investigation should be stored"))?;
    eyre::ensure!(glu.status == InvestigationStatus::Rerun, "investigation not in rerun");
    eyre::ensure!(glu.value == "5.6", "unexpected value {}", glu.value);
    eyre::ensure!(lis.pushed_orders().len() == 1, "expected one pushed order");
    Ok(())
}

#[rstest]
fn data_payload_is_replaced_in_place(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let prepared = setup_repository(shared_test_cluster)?;
    let rt = test_runtime()?;
    let lis = lis();

    for payload in ["lipaemic", "lipaemic, cleared"] {
        let update = InvestigationUpdate::new(GLU, "approve", "4.9").with_data(payload);
        rt.block_on(service(&prepared.repo, &lis).update_task(glucose(update)))?;
    }

    eyre::ensure!(
        prepared.count("investigation_data")? == 1,
        "payload should keep one row per investigation"
    );
    let data = rt.block_on(prepared.repo.find_investigation_data(&[GLU]))?;
    let row = data
        .first()
        .ok_or_else(|| eyre::eyre!("data row should exist"))?;
    eyre::ensure!(row.data == "lipaemic, cleared", "payload not replaced: {}", row.data);
    Ok(())
}

#[rstest]
fn co_authorization_keeps_one_active_routing(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let prepared = setup_repository(shared_test_cluster)?;
    let rt = test_runtime()?;
    let lis = lis();

    for _ in 0..2 {
        let outcome = rt.block_on(service(&prepared.repo, &lis).update_task(glucose(
            InvestigationUpdate::new(GLU, "co_authorize", "4.8")
                .with_co_authorize_to(SECOND_OPINION),
        )))?;
        eyre::ensure!(outcome.task.status == TaskStatus::CoAuthorize, "task not routed");
    }

    eyre::ensure!(
        prepared.count("co_authorized_pathologists")? == 2,
        "expected the replaced routing to be kept"
    );
    eyre::ensure!(
        prepared.count("co_authorized_pathologists WHERE deleted_at IS NULL")? == 1,
        "expected one active routing"
    );
    Ok(())
}

#[rstest]
fn failing_write_rolls_back_the_transaction(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let prepared = setup_repository(shared_test_cluster)?;
    let repo = &prepared.repo;
    let rt = test_runtime()?;
    let mut completed = rt
        .block_on(repo.find_task(TASK))?
        .ok_or_else(|| eyre::eyre!("task should exist"))?;
    completed.status = TaskStatus::Completed;
    let mut missing = completed.clone();
    missing.id = TaskId::from_raw(99);

    let result = rt.block_on(repo.in_transaction(move |tx| {
        tx.update_task(&completed)?;
        tx.update_task(&missing)
    }));

    eyre::ensure!(
        matches!(
            result,
            Err(TaskReviewRepositoryError::TaskNotFound(id)) if id.value() == 99
        ),
        "unexpected result {result:?}"
    );
    let task = rt
        .block_on(repo.find_task(TASK))?
        .ok_or_else(|| eyre::eyre!("task should exist"))?;
    eyre::ensure!(task.status == TaskStatus::Pending, "first write was not rolled back");
    Ok(())
}
