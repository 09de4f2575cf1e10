//! `PostgreSQL` repository implementation for task review storage.

use super::{
    models::{
        AssignmentRow, InvestigationChangeset, InvestigationDataChangeset, InvestigationDataRow,
        InvestigationRow, NewCoAuthorizationRow, NewRemarkRow, NewRerunResultRow, RemarkChangeset,
        RemarkRow, TaskChangeset, TaskRow, TestDetailChangeset, TestDetailRow, UserRow,
    },
    schema::{
        co_authorized_pathologists, investigation_data, investigation_results, remarks,
        rerun_investigation_results, samples, task_pathologist_mapping, tasks, test_details,
        test_sample_mapping, users,
    },
};
use crate::review::{
    domain::{
        AuditStamp, CoAuthorizedPathologist, InvestigationData, InvestigationId,
        InvestigationResult, InvestigationStatus, LabId, NewRemark, PathologistAssignment, Remark,
        RemarkId, RemarkType, RerunInvestigationResult, Task, TaskId, TaskStatus, TestDetail,
        TestDetailId, TestStatus, Tombstone, User, UserId, VisitId, VisitLab,
    },
    ports::{
        TaskReviewRepository, TaskReviewRepositoryError, TaskReviewRepositoryResult,
        TaskReviewTransaction,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use std::collections::HashMap;

/// `PostgreSQL` connection pool type used by review adapters.
pub type ReviewPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task review repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskReviewRepository {
    pool: ReviewPgPool,
}

impl PostgresTaskReviewRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ReviewPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskReviewRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskReviewRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskReviewRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskReviewRepositoryError::persistence)?
    }
}

#[async_trait]
impl TaskReviewRepository for PostgresTaskReviewRepository {
    async fn find_task(&self, id: TaskId) -> TaskReviewRepositoryResult<Option<Task>> {
        let key = db_key(id.value())?;
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(key))
                .filter(tasks::deleted_at.is_null())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_test_details(
        &self,
        ids: &[TestDetailId],
    ) -> TaskReviewRepositoryResult<Vec<TestDetail>> {
        let keys = db_keys(ids.iter().map(|id| id.value()))?;
        self.run_blocking(move |connection| {
            test_details::table
                .filter(test_details::id.eq_any(keys))
                .filter(test_details::deleted_at.is_null())
                .order(test_details::id.asc())
                .select(TestDetailRow::as_select())
                .load::<TestDetailRow>(connection)?
                .into_iter()
                .map(row_to_test_detail)
                .collect()
        })
        .await
    }

    async fn find_test_details_by_task(
        &self,
        task_id: TaskId,
    ) -> TaskReviewRepositoryResult<Vec<TestDetail>> {
        let key = db_key(task_id.value())?;
        self.run_blocking(move |connection| {
            test_details::table
                .filter(test_details::task_id.eq(key))
                .filter(test_details::deleted_at.is_null())
                .order(test_details::id.asc())
                .select(TestDetailRow::as_select())
                .load::<TestDetailRow>(connection)?
                .into_iter()
                .map(row_to_test_detail)
                .collect()
        })
        .await
    }

    async fn find_investigations(
        &self,
        ids: &[InvestigationId],
    ) -> TaskReviewRepositoryResult<Vec<InvestigationResult>> {
        let keys = db_keys(ids.iter().map(|id| id.value()))?;
        self.run_blocking(move |connection| {
            investigation_results::table
                .filter(investigation_results::id.eq_any(keys))
                .filter(investigation_results::deleted_at.is_null())
                .order(investigation_results::id.asc())
                .select(InvestigationRow::as_select())
                .load::<InvestigationRow>(connection)?
                .into_iter()
                .map(row_to_investigation)
                .collect()
        })
        .await
    }

    async fn find_investigations_by_test_details(
        &self,
        test_detail_ids: &[TestDetailId],
    ) -> TaskReviewRepositoryResult<Vec<InvestigationResult>> {
        let keys = db_keys(test_detail_ids.iter().map(|id| id.value()))?;
        self.run_blocking(move |connection| {
            investigation_results::table
                .filter(investigation_results::test_detail_id.eq_any(keys))
                .filter(investigation_results::deleted_at.is_null())
                .order(investigation_results::id.asc())
                .select(InvestigationRow::as_select())
                .load::<InvestigationRow>(connection)?
                .into_iter()
                .map(row_to_investigation)
                .collect()
        })
        .await
    }

    async fn find_investigation_data(
        &self,
        investigation_ids: &[InvestigationId],
    ) -> TaskReviewRepositoryResult<Vec<InvestigationData>> {
        let keys = db_keys(investigation_ids.iter().map(|id| id.value()))?;
        self.run_blocking(move |connection| {
            investigation_data::table
                .filter(investigation_data::investigation_id.eq_any(keys))
                .select(InvestigationDataRow::as_select())
                .load::<InvestigationDataRow>(connection)?
                .into_iter()
                .map(row_to_investigation_data)
                .collect()
        })
        .await
    }

    async fn find_remarks(&self, ids: &[RemarkId]) -> TaskReviewRepositoryResult<Vec<Remark>> {
        let keys = db_keys(ids.iter().map(|id| id.value()))?;
        self.run_blocking(move |connection| {
            remarks::table
                .filter(remarks::id.eq_any(keys))
                .filter(remarks::deleted_at.is_null())
                .order(remarks::id.asc())
                .select(RemarkRow::as_select())
                .load::<RemarkRow>(connection)?
                .into_iter()
                .map(row_to_remark)
                .collect()
        })
        .await
    }

    async fn find_user(&self, id: UserId) -> TaskReviewRepositoryResult<Option<User>> {
        let key = db_key(id.value())?;
        self.run_blocking(move |connection| {
            let row = users::table
                .filter(users::id.eq(key))
                .filter(users::deleted_at.is_null())
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()?;
            row.map(row_to_user).transpose()
        })
        .await
    }

    async fn find_active_assignment(
        &self,
        task_id: TaskId,
    ) -> TaskReviewRepositoryResult<Option<PathologistAssignment>> {
        let key = db_key(task_id.value())?;
        self.run_blocking(move |connection| {
            let row = task_pathologist_mapping::table
                .filter(task_pathologist_mapping::task_id.eq(key))
                .filter(task_pathologist_mapping::is_active.eq(true))
                .filter(task_pathologist_mapping::deleted_at.is_null())
                .order(task_pathologist_mapping::id.desc())
                .select(AssignmentRow::as_select())
                .first::<AssignmentRow>(connection)
                .optional()?;
            row.map(row_to_assignment).transpose()
        })
        .await
    }

    async fn find_visits_by_external_test_ids(
        &self,
        external_test_ids: &[String],
    ) -> TaskReviewRepositoryResult<Vec<VisitLab>> {
        let lookup_ids = external_test_ids.to_vec();
        self.run_blocking(move |connection| {
            let rows = samples::table
                .inner_join(test_sample_mapping::table)
                .filter(test_sample_mapping::external_test_id.eq_any(lookup_ids))
                .filter(test_sample_mapping::is_rejected.eq(false))
                .filter(test_sample_mapping::deleted_at.is_null())
                .filter(samples::deleted_at.is_null())
                .select((samples::visit_id, samples::lab_id))
                .distinct()
                .load::<(String, i64)>(connection)?;

            let mut labs_by_visit = HashMap::with_capacity(rows.len());
            for (visit_id, lab_id) in rows {
                labs_by_visit.insert(visit_id, domain_key(lab_id)?);
            }
            let mut visits: Vec<VisitLab> = labs_by_visit
                .into_iter()
                .map(|(visit_id, lab_id)| VisitLab {
                    visit_id: VisitId::new(visit_id),
                    lab_id: LabId::from_raw(lab_id),
                })
                .collect();
            visits.sort_by(|left, right| left.visit_id.cmp(&right.visit_id));
            Ok(visits)
        })
        .await
    }

    async fn in_transaction<F, T>(&self, work: F) -> TaskReviewRepositoryResult<T>
    where
        F: FnOnce(&mut dyn TaskReviewTransaction) -> TaskReviewRepositoryResult<T>
            + Send
            + 'static,
        T: Send + 'static,
    {
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskReviewRepositoryError, _>(|tx| {
                work(&mut PgReviewTransaction { connection: tx })
            })
        })
        .await
    }
}

struct PgReviewTransaction<'a> {
    connection: &'a mut PgConnection,
}

impl TaskReviewTransaction for PgReviewTransaction<'_> {
    fn update_task(&mut self, task: &Task) -> TaskReviewRepositoryResult<()> {
        let changeset = TaskChangeset {
            status: task.status.as_str().to_owned(),
            completed_at: task.completed_at,
            updated_by: db_key(task.audit.updated_by.value())?,
            updated_at: task.audit.updated_at,
        };
        let updated = diesel::update(
            tasks::table
                .filter(tasks::id.eq(db_key(task.id.value())?))
                .filter(tasks::deleted_at.is_null()),
        )
        .set(&changeset)
        .execute(&mut *self.connection)?;
        if updated == 0 {
            return Err(TaskReviewRepositoryError::TaskNotFound(task.id));
        }
        Ok(())
    }

    fn update_test_details(
        &mut self,
        test_details: &[TestDetail],
    ) -> TaskReviewRepositoryResult<()> {
        for detail in test_details {
            let changeset = TestDetailChangeset {
                status: detail.status.as_str().to_owned(),
                approval_source: detail.approval_source.clone(),
                updated_by: db_key(detail.audit.updated_by.value())?,
                updated_at: detail.audit.updated_at,
            };
            let updated = diesel::update(
                test_details::table
                    .filter(test_details::id.eq(db_key(detail.id.value())?))
                    .filter(test_details::deleted_at.is_null()),
            )
            .set(&changeset)
            .execute(&mut *self.connection)?;
            ensure_updated(updated, "test_details", detail.id.value())?;
        }
        Ok(())
    }

    fn update_investigations(
        &mut self,
        investigations: &[InvestigationResult],
    ) -> TaskReviewRepositoryResult<()> {
        for investigation in investigations {
            let changeset = InvestigationChangeset {
                value: investigation.value.clone(),
                abnormality: investigation.abnormality.clone(),
                is_abnormal: investigation.is_abnormal,
                status: investigation.status.as_str().to_owned(),
                approved_by: investigation
                    .approved_by
                    .map(|id| db_key(id.value()))
                    .transpose()?,
                approved_at: investigation.approved_at,
                updated_by: db_key(investigation.audit.updated_by.value())?,
                updated_at: investigation.audit.updated_at,
            };
            let updated = diesel::update(
                investigation_results::table
                    .filter(investigation_results::id.eq(db_key(investigation.id.value())?))
                    .filter(investigation_results::deleted_at.is_null()),
            )
            .set(&changeset)
            .execute(&mut *self.connection)?;
            ensure_updated(updated, "investigation_results", investigation.id.value())?;
        }
        Ok(())
    }

    fn create_investigation_data(
        &mut self,
        rows: &[InvestigationData],
    ) -> TaskReviewRepositoryResult<()> {
        let new_rows = rows
            .iter()
            .map(|row| {
                Ok(InvestigationDataRow {
                    investigation_id: db_key(row.investigation_id.value())?,
                    data: row.data.clone(),
                    data_type: row.data_type.clone(),
                    created_by: db_key(row.audit.created_by.value())?,
                    created_at: row.audit.created_at,
                    updated_by: db_key(row.audit.updated_by.value())?,
                    updated_at: row.audit.updated_at,
                })
            })
            .collect::<TaskReviewRepositoryResult<Vec<_>>>()?;
        diesel::insert_into(investigation_data::table)
            .values(&new_rows)
            .execute(&mut *self.connection)?;
        Ok(())
    }

    fn update_investigation_data(
        &mut self,
        rows: &[InvestigationData],
    ) -> TaskReviewRepositoryResult<()> {
        for row in rows {
            let changeset = InvestigationDataChangeset {
                data: row.data.clone(),
                updated_by: db_key(row.audit.updated_by.value())?,
                updated_at: row.audit.updated_at,
            };
            let updated = diesel::update(investigation_data::table.filter(
                investigation_data::investigation_id.eq(db_key(row.investigation_id.value())?),
            ))
            .set(&changeset)
            .execute(&mut *self.connection)?;
            ensure_updated(updated, "investigation_data", row.investigation_id.value())?;
        }
        Ok(())
    }

    fn insert_rerun_results(
        &mut self,
        rows: &[RerunInvestigationResult],
    ) -> TaskReviewRepositoryResult<()> {
        let new_rows = rows
            .iter()
            .map(to_new_rerun_row)
            .collect::<TaskReviewRepositoryResult<Vec<_>>>()?;
        diesel::insert_into(rerun_investigation_results::table)
            .values(&new_rows)
            .execute(&mut *self.connection)?;
        Ok(())
    }

    fn delete_active_co_authorization(
        &mut self,
        task_id: TaskId,
        tombstone: Tombstone,
    ) -> TaskReviewRepositoryResult<()> {
        diesel::update(
            co_authorized_pathologists::table
                .filter(co_authorized_pathologists::task_id.eq(db_key(task_id.value())?))
                .filter(co_authorized_pathologists::deleted_at.is_null()),
        )
        .set((
            co_authorized_pathologists::deleted_by.eq(db_key(tombstone.deleted_by.value())?),
            co_authorized_pathologists::deleted_at.eq(tombstone.deleted_at),
        ))
        .execute(&mut *self.connection)?;
        Ok(())
    }

    fn insert_co_authorization(
        &mut self,
        row: &CoAuthorizedPathologist,
    ) -> TaskReviewRepositoryResult<()> {
        let new_row = NewCoAuthorizationRow {
            task_id: db_key(row.task_id.value())?,
            co_authorized_by: db_key(row.co_authorized_by.value())?,
            co_authorized_to: db_key(row.co_authorized_to.value())?,
            co_authorized_at: row.co_authorized_at,
            created_by: db_key(row.audit.created_by.value())?,
            created_at: row.audit.created_at,
            updated_by: db_key(row.audit.updated_by.value())?,
            updated_at: row.audit.updated_at,
        };
        diesel::insert_into(co_authorized_pathologists::table)
            .values(&new_row)
            .execute(&mut *self.connection)?;
        Ok(())
    }

    fn create_remarks(
        &mut self,
        new_remarks: &[NewRemark],
    ) -> TaskReviewRepositoryResult<Vec<RemarkId>> {
        let new_rows = new_remarks
            .iter()
            .map(|remark| {
                Ok(NewRemarkRow {
                    investigation_id: db_key(remark.investigation_id.value())?,
                    description: remark.description.clone(),
                    remark_type: remark.remark_type.as_str().to_owned(),
                    remark_by: db_key(remark.remark_by.value())?,
                    created_by: db_key(remark.audit.created_by.value())?,
                    created_at: remark.audit.created_at,
                    updated_by: db_key(remark.audit.updated_by.value())?,
                    updated_at: remark.audit.updated_at,
                })
            })
            .collect::<TaskReviewRepositoryResult<Vec<_>>>()?;
        diesel::insert_into(remarks::table)
            .values(&new_rows)
            .returning(remarks::id)
            .get_results::<i64>(&mut *self.connection)?
            .into_iter()
            .map(|id| domain_key(id).map(RemarkId::from_raw))
            .collect()
    }

    fn update_remarks(&mut self, updated_remarks: &[Remark]) -> TaskReviewRepositoryResult<()> {
        for remark in updated_remarks {
            let changeset = RemarkChangeset {
                description: remark.description.clone(),
                remark_type: remark.remark_type.as_str().to_owned(),
                remark_by: db_key(remark.remark_by.value())?,
                updated_by: db_key(remark.audit.updated_by.value())?,
                updated_at: remark.audit.updated_at,
            };
            let updated = diesel::update(
                remarks::table
                    .filter(remarks::id.eq(db_key(remark.id.value())?))
                    .filter(remarks::deleted_at.is_null()),
            )
            .set(&changeset)
            .execute(&mut *self.connection)?;
            ensure_updated(updated, "remarks", remark.id.value())?;
        }
        Ok(())
    }

    fn delete_remarks(
        &mut self,
        ids: &[RemarkId],
        tombstone: Tombstone,
    ) -> TaskReviewRepositoryResult<()> {
        let keys = db_keys(ids.iter().map(|id| id.value()))?;
        diesel::update(
            remarks::table
                .filter(remarks::id.eq_any(keys))
                .filter(remarks::deleted_at.is_null()),
        )
        .set((
            remarks::deleted_by.eq(db_key(tombstone.deleted_by.value())?),
            remarks::deleted_at.eq(tombstone.deleted_at),
        ))
        .execute(&mut *self.connection)?;
        Ok(())
    }
}

fn ensure_updated(
    updated: usize,
    entity: &'static str,
    id: u64,
) -> TaskReviewRepositoryResult<()> {
    if updated == 0 {
        return Err(TaskReviewRepositoryError::row_not_found(entity, id));
    }
    Ok(())
}

fn db_key(value: u64) -> TaskReviewRepositoryResult<i64> {
    i64::try_from(value).map_err(TaskReviewRepositoryError::persistence)
}

fn db_keys(values: impl IntoIterator<Item = u64>) -> TaskReviewRepositoryResult<Vec<i64>> {
    values.into_iter().map(db_key).collect()
}

fn domain_key(value: i64) -> TaskReviewRepositoryResult<u64> {
    u64::try_from(value).map_err(TaskReviewRepositoryError::persistence)
}

fn domain_user(value: i64) -> TaskReviewRepositoryResult<UserId> {
    domain_key(value).map(UserId::from_raw)
}

fn optional_user(value: Option<i64>) -> TaskReviewRepositoryResult<Option<UserId>> {
    value.map(domain_user).transpose()
}

fn audit_stamp(
    created_by: i64,
    created_at: DateTime<Utc>,
    updated_by: i64,
    updated_at: DateTime<Utc>,
) -> TaskReviewRepositoryResult<AuditStamp> {
    Ok(AuditStamp {
        created_by: domain_user(created_by)?,
        created_at,
        updated_by: domain_user(updated_by)?,
        updated_at,
    })
}

fn row_to_task(row: TaskRow) -> TaskReviewRepositoryResult<Task> {
    let TaskRow {
        id,
        order_ref,
        city_code,
        status,
        completed_at,
        created_by,
        created_at,
        updated_by,
        updated_at,
    } = row;
    Ok(Task {
        id: TaskId::from_raw(domain_key(id)?),
        order_ref,
        city_code,
        status: TaskStatus::try_from(status.as_str())
            .map_err(TaskReviewRepositoryError::persistence)?,
        completed_at,
        audit: audit_stamp(created_by, created_at, updated_by, updated_at)?,
    })
}

fn row_to_test_detail(row: TestDetailRow) -> TaskReviewRepositoryResult<TestDetail> {
    let TestDetailRow {
        id,
        task_id,
        status,
        lab_id,
        processing_lab_id,
        external_test_id,
        lis_code,
        approval_source,
        created_by,
        created_at,
        updated_by,
        updated_at,
    } = row;
    Ok(TestDetail {
        id: TestDetailId::from_raw(domain_key(id)?),
        task_id: TaskId::from_raw(domain_key(task_id)?),
        status: TestStatus::try_from(status.as_str())
            .map_err(TaskReviewRepositoryError::persistence)?,
        lab_id: LabId::from_raw(domain_key(lab_id)?),
        processing_lab_id: LabId::from_raw(domain_key(processing_lab_id)?),
        external_test_id,
        lis_code,
        approval_source,
        audit: audit_stamp(created_by, created_at, updated_by, updated_at)?,
    })
}

fn row_to_investigation(
    row: InvestigationRow,
) -> TaskReviewRepositoryResult<InvestigationResult> {
    Ok(InvestigationResult {
        id: InvestigationId::from_raw(domain_key(row.id)?),
        test_detail_id: TestDetailId::from_raw(domain_key(row.test_detail_id)?),
        master_investigation_id: domain_key(row.master_investigation_id)?,
        status: InvestigationStatus::try_from(row.status.as_str())
            .map_err(TaskReviewRepositoryError::persistence)?,
        approved_by: optional_user(row.approved_by)?,
        entered_by: optional_user(row.entered_by)?,
        audit: audit_stamp(row.created_by, row.created_at, row.updated_by, row.updated_at)?,
        name: row.name,
        value: row.value,
        device_value: row.device_value,
        result_representation_type: row.result_representation_type,
        lis_code: row.lis_code,
        abnormality: row.abnormality,
        is_abnormal: row.is_abnormal,
        approved_at: row.approved_at,
        entered_at: row.entered_at,
    })
}

fn row_to_investigation_data(
    row: InvestigationDataRow,
) -> TaskReviewRepositoryResult<InvestigationData> {
    Ok(InvestigationData {
        investigation_id: InvestigationId::from_raw(domain_key(row.investigation_id)?),
        audit: audit_stamp(row.created_by, row.created_at, row.updated_by, row.updated_at)?,
        data: row.data,
        data_type: row.data_type,
    })
}

fn row_to_remark(row: RemarkRow) -> TaskReviewRepositoryResult<Remark> {
    Ok(Remark {
        id: RemarkId::from_raw(domain_key(row.id)?),
        investigation_id: InvestigationId::from_raw(domain_key(row.investigation_id)?),
        remark_type: RemarkType::try_from(row.remark_type.as_str())
            .map_err(TaskReviewRepositoryError::persistence)?,
        remark_by: domain_user(row.remark_by)?,
        audit: audit_stamp(row.created_by, row.created_at, row.updated_by, row.updated_at)?,
        description: row.description,
        tombstone: None,
    })
}

fn row_to_user(row: UserRow) -> TaskReviewRepositoryResult<User> {
    Ok(User {
        id: domain_user(row.id)?,
        name: row.name,
        user_type: row.user_type,
        lis_user_id: row.lis_user_id,
        system_user_id: row.system_user_id,
    })
}

fn row_to_assignment(row: AssignmentRow) -> TaskReviewRepositoryResult<PathologistAssignment> {
    Ok(PathologistAssignment {
        task_id: TaskId::from_raw(domain_key(row.task_id)?),
        pathologist_id: domain_user(row.pathologist_id)?,
        is_active: row.is_active,
    })
}

fn to_new_rerun_row(
    row: &RerunInvestigationResult,
) -> TaskReviewRepositoryResult<NewRerunResultRow> {
    Ok(NewRerunResultRow {
        test_detail_id: db_key(row.test_detail_id.value())?,
        investigation_id: db_key(row.investigation_id.value())?,
        master_investigation_id: db_key(row.master_investigation_id)?,
        name: row.name.clone(),
        value: row.value.clone(),
        device_value: row.device_value.clone(),
        result_representation_type: row.result_representation_type.clone(),
        lis_code: row.lis_code.clone(),
        triggered_by: db_key(row.triggered_by.value())?,
        triggered_at: row.triggered_at,
        reason: row.reason.clone(),
        remarks: row.remarks.clone(),
        entered_by: row.entered_by.map(|id| db_key(id.value())).transpose()?,
        entered_at: row.entered_at,
        created_by: db_key(row.audit.created_by.value())?,
        created_at: row.audit.created_at,
        updated_by: db_key(row.audit.updated_by.value())?,
        updated_at: row.audit.updated_at,
    })
}
