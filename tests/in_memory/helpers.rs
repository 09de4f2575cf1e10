//! Shared seeding helpers for in-memory task review integration tests.
//!
//! The seeded task has a two-parameter lipid panel and a standalone glucose
//! test, both with results saved and awaiting review.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use labtask::review::{
    adapters::memory::{InMemoryLisClient, InMemoryTaskReviewRepository, RecordingRerunNotifier},
    config::TaskUpdateConfig,
    domain::{
        AuditStamp, InvestigationId, InvestigationResult, InvestigationStatus, InvestigationUpdate,
        LabId, LisContentLine, LisLineFields, LisOrder, LisOrderLine, PathologistAssignment, Task,
        TaskId, TaskStatus, TestDetail, TestDetailId, TestDetailUpdate, TestStatus,
        UpdateTaskRequest, User, UserId, VisitId, VisitLab,
    },
    ports::LisClient,
    services::TaskUpdateService,
};
use mockable::DefaultClock;
use rstest::fixture;

pub const TASK: TaskId = TaskId::from_raw(7);
pub const REVIEWER: UserId = UserId::from_raw(21);
pub const SECOND_OPINION: UserId = UserId::from_raw(22);
pub const LIPID: TestDetailId = TestDetailId::from_raw(300);
pub const CHOL: InvestigationId = InvestigationId::from_raw(3001);
pub const TRIG: InvestigationId = InvestigationId::from_raw(3002);
pub const GLUCOSE: TestDetailId = TestDetailId::from_raw(400);
pub const GLU: InvestigationId = InvestigationId::from_raw(4001);
pub const LAB: LabId = LabId::from_raw(3);
pub const VISIT: &str = "VIS-5512";
pub const LIS_ORDER_ID: &str = "ORD-5512";

/// Service over the in-memory repository and notifier with any LIS client.
pub type ReviewService<L> =
    TaskUpdateService<InMemoryTaskReviewRepository, L, RecordingRerunNotifier, DefaultClock>;

fn seeded_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 15, 0)
        .single()
        .unwrap_or_default()
}

fn audit() -> AuditStamp {
    AuditStamp::created(UserId::from_raw(1), seeded_at())
}

fn test_detail(id: TestDetailId, lis_code: &str) -> TestDetail {
    TestDetail {
        id,
        task_id: TASK,
        status: TestStatus::ResultSaved,
        lab_id: LAB,
        processing_lab_id: LAB,
        external_test_id: external_test_id(id),
        lis_code: lis_code.to_owned(),
        approval_source: None,
        audit: audit(),
    }
}

fn investigation(
    id: InvestigationId,
    test_detail_id: TestDetailId,
    lis_code: &str,
    value: &str,
) -> InvestigationResult {
    InvestigationResult {
        id,
        test_detail_id,
        master_investigation_id: id.value(),
        name: lis_code.to_owned(),
        value: value.to_owned(),
        device_value: value.to_owned(),
        result_representation_type: "numeric".to_owned(),
        lis_code: lis_code.to_owned(),
        abnormality: "normal".to_owned(),
        is_abnormal: false,
        status: InvestigationStatus::Pending,
        approved_by: None,
        approved_at: None,
        entered_by: Some(UserId::from_raw(1)),
        entered_at: Some(seeded_at()),
        audit: audit(),
    }
}

fn user(id: UserId, lis_user_id: &str) -> User {
    User {
        id,
        name: format!("Reviewer {id}"),
        user_type: "pathologist".to_owned(),
        lis_user_id: Some(lis_user_id.to_owned()),
        system_user_id: Some(format!("sys-{id}")),
    }
}

/// Returns the order-system test id of a seeded test detail.
#[must_use]
pub fn external_test_id(id: TestDetailId) -> String {
    format!("OMS-{id}")
}

/// Provides a repository seeded with the task, both reviewers, the active
/// assignment of [`REVIEWER`], and the visit carrying both tests.
#[fixture]
pub fn repository() -> InMemoryTaskReviewRepository {
    let repository = InMemoryTaskReviewRepository::new();
    repository.insert_task(Task {
        id: TASK,
        order_ref: "OMS-ORDER-88".to_owned(),
        city_code: "PUN".to_owned(),
        status: TaskStatus::Pending,
        completed_at: None,
        audit: audit(),
    });
    repository.insert_test_detail(test_detail(LIPID, "LIPID"));
    repository.insert_test_detail(test_detail(GLUCOSE, "GLU"));
    repository.insert_investigation(investigation(CHOL, LIPID, "CHOL", "182"));
    repository.insert_investigation(investigation(TRIG, LIPID, "TRIG", "140"));
    repository.insert_investigation(investigation(GLU, GLUCOSE, "GLU", "4.8"));
    repository.insert_user(user(REVIEWER, "7001"));
    repository.insert_user(user(SECOND_OPINION, "7002"));
    repository.insert_assignment(PathologistAssignment {
        task_id: TASK,
        pathologist_id: REVIEWER,
        is_active: true,
    });
    for id in [LIPID, GLUCOSE] {
        repository.insert_visit(
            external_test_id(id),
            VisitLab {
                visit_id: VisitId::new(VISIT),
                lab_id: LAB,
            },
        );
    }
    repository
}

fn fields(code: &str, test_type: &str, value: &str) -> LisLineFields {
    LisLineFields {
        test_code: code.to_owned(),
        test_type: test_type.to_owned(),
        test_value: value.to_owned(),
        test_status: "Entered".to_owned(),
        ..LisLineFields::default()
    }
}

/// Returns the LIS order held for [`VISIT`].
#[must_use]
pub fn lis_order() -> LisOrder {
    LisOrder {
        order_id: LIS_ORDER_ID.to_owned(),
        org_code: "PUN01".to_owned(),
        lines: vec![
            LisOrderLine {
                fields: fields("LIPID", "PRO", ""),
                contents: vec![
                    LisContentLine {
                        fields: fields("CHOL", "INV", "182"),
                        ..LisContentLine::default()
                    },
                    LisContentLine {
                        fields: fields("TRIG", "INV", "140"),
                        ..LisContentLine::default()
                    },
                ],
                ..LisOrderLine::default()
            },
            LisOrderLine {
                fields: fields("GLU", "INV", "4.8"),
                ..LisOrderLine::default()
            },
        ],
        ..LisOrder::default()
    }
}

/// Provides an LIS client serving [`lis_order`] for the seeded visit.
#[fixture]
pub fn lis() -> InMemoryLisClient {
    let lis = InMemoryLisClient::new();
    lis.insert_order(VisitId::new(VISIT), LAB, lis_order());
    lis
}

/// Builds a service sharing the given adapters.
pub fn service<L: LisClient>(
    repository: &InMemoryTaskReviewRepository,
    lis: L,
    notifier: &RecordingRerunNotifier,
    config: TaskUpdateConfig,
) -> ReviewService<L> {
    TaskUpdateService::with_config(
        Arc::new(repository.clone()),
        Arc::new(lis),
        Arc::new(notifier.clone()),
        Arc::new(DefaultClock),
        config,
    )
}

/// Returns an update of one investigation with a status and value.
#[must_use]
pub fn set(id: InvestigationId, status: &str, value: &str) -> InvestigationUpdate {
    InvestigationUpdate::new(id, status, value)
}

/// Returns a request from [`REVIEWER`] for the seeded task.
#[must_use]
pub fn review() -> UpdateTaskRequest {
    UpdateTaskRequest::new(TASK, REVIEWER)
}

/// Returns the lipid panel update with both parameters.
#[must_use]
pub fn lipid(chol: InvestigationUpdate, trig: InvestigationUpdate) -> TestDetailUpdate {
    TestDetailUpdate::new(LIPID, [chol, trig])
}

/// Returns the glucose test update.
#[must_use]
pub fn glucose(glu: InvestigationUpdate) -> TestDetailUpdate {
    TestDetailUpdate::new(GLUCOSE, [glu])
}
