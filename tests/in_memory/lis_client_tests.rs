//! LIS interaction tests using a mocked client.

use super::helpers::{
    GLU, LAB, LIS_ORDER_ID, VISIT, glucose, lis_order, repository, review, service, set,
};
use async_trait::async_trait;
use labtask::review::{
    adapters::memory::{InMemoryTaskReviewRepository, RecordingRerunNotifier},
    config::{LisSyncMode, TaskUpdateConfig},
    domain::{InvestigationStatus, LabId, LisOrder, UpdateTaskRequest, VisitId},
    ports::{LisClient, LisError, LisResult},
    services::{SyncPhase, TaskUpdateError},
};
use mockall::{mock, predicate::eq};
use rstest::rstest;

mock! {
    pub Lis {}

    #[async_trait]
    impl LisClient for Lis {
        async fn fetch_order_by_visit(&self, visit_id: &VisitId, lab_id: LabId)
        -> LisResult<LisOrder>;
        async fn push_order(&self, order: &LisOrder) -> LisResult<()>;
    }
}

fn rerun_glucose() -> UpdateTaskRequest {
    review().with_test_detail(glucose(
        set(GLU, "rerun", "5.6").with_rerun_reason(Some("haemolysed".to_owned())),
    ))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rerun_fetches_once_and_pushes_the_patched_order(
    repository: InMemoryTaskReviewRepository,
) -> Result<(), eyre::Report> {
    let mut lis = MockLis::new();
    lis.expect_fetch_order_by_visit()
        .with(eq(VisitId::new(VISIT)), eq(LAB))
        .times(1)
        .returning(|_, _| Ok(lis_order()));
    lis.expect_push_order()
        .withf(|order: &LisOrder| {
            order.order_id == LIS_ORDER_ID
                && order.lines.iter().any(|line| {
                    line.fields.test_code == "GLU"
                        && line.fields.test_status == "Recheck"
                        && line.fields.test_value == "5.6"
                        && line.fields.rerun_reason == "haemolysed"
                        && line.fields.user_id == 7001
                })
        })
        .times(1)
        .returning(|_| Ok(()));

    let outcome = service(
        &repository,
        lis,
        &RecordingRerunNotifier::new(),
        TaskUpdateConfig::default(),
    )
    .update_task(rerun_glucose())
    .await?;

    eyre::ensure!(outcome.sync.is_consistent(), "sync should be consistent");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transport_failure_on_fetch_aborts_before_commit(
    repository: InMemoryTaskReviewRepository,
) -> Result<(), eyre::Report> {
    let mut lis = MockLis::new();
    lis.expect_fetch_order_by_visit()
        .returning(|_, _| Err(LisError::transport(std::io::Error::other("connection reset"))));
    lis.expect_push_order().never();

    let result = service(
        &repository,
        lis,
        &RecordingRerunNotifier::new(),
        TaskUpdateConfig::default(),
    )
    .update_task(rerun_glucose())
    .await;

    eyre::ensure!(
        matches!(result, Err(TaskUpdateError::LisFetch(LisError::Transport(_)))),
        "unexpected result {result:?}"
    );
    let glu = repository
        .investigation(GLU)
        .ok_or_else(|| eyre::eyre!("investigation should be stored"))?;
    eyre::ensure!(glu.status == InvestigationStatus::Pending, "commit was not skipped");
    eyre::ensure!(repository.rerun_results().is_empty(), "snapshot was written");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deferred_sync_never_pushes(
    repository: InMemoryTaskReviewRepository,
) -> Result<(), eyre::Report> {
    let mut lis = MockLis::new();
    lis.expect_fetch_order_by_visit()
        .times(1)
        .returning(|_, _| Ok(lis_order()));
    lis.expect_push_order().never();

    let outcome = service(
        &repository,
        lis,
        &RecordingRerunNotifier::new(),
        TaskUpdateConfig::default().with_lis_sync_mode(LisSyncMode::Deferred),
    )
    .update_task(rerun_glucose())
    .await?;

    let SyncPhase::SyncPending(orders) = &outcome.sync else {
        eyre::bail!("expected pending sync, got {:?}", outcome.sync);
    };
    eyre::ensure!(orders.len() == 1, "expected one pending order");
    Ok(())
}

/// LIS client that fails every call, used to prove approvals skip the LIS.
struct UnreachableLis;

#[async_trait]
impl LisClient for UnreachableLis {
    async fn fetch_order_by_visit(
        &self,
        visit_id: &VisitId,
        _lab_id: LabId,
    ) -> LisResult<LisOrder> {
        Err(LisError::OrderNotFound(visit_id.clone()))
    }

    async fn push_order(&self, order: &LisOrder) -> LisResult<()> {
        Err(LisError::rejected(order.order_id.clone(), "unreachable"))
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approvals_do_not_touch_the_lis_unless_mirrored(
    repository: InMemoryTaskReviewRepository,
) -> Result<(), eyre::Report> {
    let outcome = service(
        &repository,
        UnreachableLis,
        &RecordingRerunNotifier::new(),
        TaskUpdateConfig::default(),
    )
    .update_task(review().with_test_detail(glucose(set(GLU, "approve", "4.8"))))
    .await?;

    eyre::ensure!(outcome.sync.is_consistent(), "sync should be consistent");
    Ok(())
}
