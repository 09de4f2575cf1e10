//! End-to-end task review flows over the in-memory adapters.

use super::helpers::{
    CHOL, GLU, GLUCOSE, LIPID, REVIEWER, SECOND_OPINION, TASK, TRIG, glucose, lipid, lis,
    repository, review, service, set,
};
use labtask::review::{
    adapters::memory::{InMemoryLisClient, InMemoryTaskReviewRepository, RecordingRerunNotifier},
    config::TaskUpdateConfig,
    domain::{
        InvestigationStatus, MedicalRemarkUpdate, RemarkId, RemarkType, RemarkUpdates, TaskStatus,
        TestStatus, UpdateTaskRequest, WithheldReasonUpdate,
    },
    services::{ConflictReason, TaskUpdateError, TaskUpdateOutcome},
};
use rstest::rstest;

async fn submit(
    repository: &InMemoryTaskReviewRepository,
    lis: &InMemoryLisClient,
    request: UpdateTaskRequest,
) -> Result<TaskUpdateOutcome, TaskUpdateError> {
    service(
        repository,
        lis.clone(),
        &RecordingRerunNotifier::new(),
        TaskUpdateConfig::default(),
    )
    .update_task(request)
    .await
}

fn medical(id: Option<RemarkId>, description: &str, delete: bool) -> RemarkUpdates {
    RemarkUpdates {
        medical: Some(MedicalRemarkUpdate {
            id,
            description: description.to_owned(),
            delete,
        }),
        withheld_reason: None,
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn medical_remark_is_created_edited_and_soft_deleted(
    repository: InMemoryTaskReviewRepository,
    lis: InMemoryLisClient,
) -> Result<(), eyre::Report> {
    let created = submit(
        &repository,
        &lis,
        review().with_test_detail(glucose(
            set(GLU, "approve", "5.1").with_remarks(medical(None, "fasting sample", false)),
        )),
    )
    .await?;
    let remark_id = *created
        .created_remark_ids
        .first()
        .ok_or_else(|| eyre::eyre!("expected a created remark"))?;

    submit(
        &repository,
        &lis,
        review().with_test_detail(glucose(
            set(GLU, "approve", "5.1")
                .with_remarks(medical(Some(remark_id), "fasting sample, 12h", false)),
        )),
    )
    .await?;
    let edited = repository
        .remark(remark_id)
        .ok_or_else(|| eyre::eyre!("remark should be stored"))?;
    eyre::ensure!(edited.description == "fasting sample, 12h", "remark was not edited");

    submit(
        &repository,
        &lis,
        review().with_test_detail(glucose(
            set(GLU, "approve", "5.1").with_remarks(medical(Some(remark_id), "", true)),
        )),
    )
    .await?;
    let deleted = repository
        .remark(remark_id)
        .ok_or_else(|| eyre::eyre!("soft-deleted remark should be kept"))?;
    let tombstone = deleted
        .tombstone
        .ok_or_else(|| eyre::eyre!("remark should be soft-deleted"))?;
    eyre::ensure!(tombstone.deleted_by == REVIEWER, "wrong deleting user");

    let edit_after_delete = submit(
        &repository,
        &lis,
        review().with_test_detail(glucose(
            set(GLU, "approve", "5.1").with_remarks(medical(Some(remark_id), "again", false)),
        )),
    )
    .await;
    eyre::ensure!(
        matches!(edit_after_delete, Err(TaskUpdateError::NotFound(_))),
        "deleted remark should no longer be editable, got {edit_after_delete:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn data_payload_is_created_then_replaced(
    repository: InMemoryTaskReviewRepository,
    lis: InMemoryLisClient,
) -> Result<(), eyre::Report> {
    for payload in ["lipaemic", "lipaemic, repeated after clearing"] {
        submit(
            &repository,
            &lis,
            review().with_test_detail(lipid(
                set(CHOL, "approve", "190").with_data(payload),
                set(TRIG, "approve", "150"),
            )),
        )
        .await?;
    }

    let data = repository
        .investigation_data(CHOL)
        .ok_or_else(|| eyre::eyre!("data row should exist"))?;
    eyre::ensure!(data.data == "lipaemic, repeated after clearing", "payload not replaced");
    eyre::ensure!(data.data_type == "text", "unexpected data type {}", data.data_type);
    eyre::ensure!(
        repository.investigation_data(TRIG).is_none(),
        "no payload was sent for TRIG"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn withheld_task_completes_once_everything_is_approved(
    repository: InMemoryTaskReviewRepository,
    lis: InMemoryLisClient,
) -> Result<(), eyre::Report> {
    let withheld = submit(
        &repository,
        &lis,
        review().with_test_detail(glucose(set(GLU, "withheld", "4.8").with_remarks(
            RemarkUpdates {
                medical: None,
                withheld_reason: Some(WithheldReasonUpdate {
                    description: "awaiting repeat sample".to_owned(),
                }),
            },
        ))),
    )
    .await?;
    eyre::ensure!(
        withheld.task.status == TaskStatus::WithheldApproval,
        "unexpected status {}",
        withheld.task.status
    );
    let reasons = repository.remarks_of(GLU);
    eyre::ensure!(
        reasons.len() == 1
            && reasons
                .iter()
                .all(|remark| remark.remark_type == RemarkType::WithheldReason),
        "expected one withheld reason, got {reasons:?}"
    );

    let completed = submit(
        &repository,
        &lis,
        review()
            .with_test_detail(lipid(
                set(CHOL, "approve", "182"),
                set(TRIG, "approve", "140"),
            ))
            .with_test_detail(glucose(set(GLU, "approve", "4.9"))),
    )
    .await?;
    eyre::ensure!(completed.task.status == TaskStatus::Completed, "task not completed");
    let stored = repository
        .test_detail(GLUCOSE)
        .ok_or_else(|| eyre::eyre!("test detail should be stored"))?;
    eyre::ensure!(stored.status == TestStatus::Approve, "glucose not approved");
    eyre::ensure!(
        stored.approval_source.as_deref() == Some("OH"),
        "approval source not recorded"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn each_rerun_snapshots_the_value_it_replaces(
    repository: InMemoryTaskReviewRepository,
    lis: InMemoryLisClient,
) -> Result<(), eyre::Report> {
    for value in ["5.0", "5.3"] {
        submit(
            &repository,
            &lis,
            review().with_test_detail(glucose(set(GLU, "rerun", value))),
        )
        .await?;
    }

    let snapshots: Vec<String> = repository
        .rerun_results()
        .into_iter()
        .map(|snapshot| snapshot.value)
        .collect();
    eyre::ensure!(
        snapshots == ["4.8", "5.0"],
        "unexpected snapshots {snapshots:?}"
    );
    let glu = repository
        .investigation(GLU)
        .ok_or_else(|| eyre::eyre!("investigation should be stored"))?;
    eyre::ensure!(glu.status == InvestigationStatus::Rerun, "not in rerun");
    eyre::ensure!(lis.pushed_orders().len() == 2, "each rerun should push the order");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn co_authorization_does_not_reassign_the_task(
    repository: InMemoryTaskReviewRepository,
    lis: InMemoryLisClient,
) -> Result<(), eyre::Report> {
    let routed = submit(
        &repository,
        &lis,
        review().with_test_detail(glucose(
            set(GLU, "co_authorize", "4.8").with_co_authorize_to(SECOND_OPINION),
        )),
    )
    .await?;
    eyre::ensure!(routed.task.status == TaskStatus::CoAuthorize, "task not routed");

    let by_second_opinion = submit(
        &repository,
        &lis,
        UpdateTaskRequest::new(TASK, SECOND_OPINION)
            .with_test_detail(glucose(set(GLU, "approve", "4.8"))),
    )
    .await;
    eyre::ensure!(
        matches!(
            by_second_opinion,
            Err(TaskUpdateError::Conflict(ConflictReason::NotAssignedPathologist { .. }))
        ),
        "unexpected result {by_second_opinion:?}"
    );

    let lipid_status = repository
        .test_detail(LIPID)
        .ok_or_else(|| eyre::eyre!("test detail should be stored"))?
        .status;
    eyre::ensure!(
        lipid_status == TestStatus::ResultSaved,
        "untouched test detail changed to {lipid_status}"
    );
    Ok(())
}
