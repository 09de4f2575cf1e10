//! Diesel row models for task review persistence.

use super::schema::{
    co_authorized_pathologists, investigation_data, investigation_results, remarks,
    rerun_investigation_results, task_pathologist_mapping, tasks, test_details, users,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for tasks.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    pub id: i64,
    pub order_ref: String,
    pub city_code: String,
    pub status: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
}

/// Changeset persisted when a task is reviewed.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
pub struct TaskChangeset {
    pub status: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
}

/// Query result row for test details.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = test_details)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TestDetailRow {
    pub id: i64,
    pub task_id: i64,
    pub status: String,
    pub lab_id: i64,
    pub processing_lab_id: i64,
    pub external_test_id: String,
    pub lis_code: String,
    pub approval_source: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
}

/// Changeset persisted when a test detail is reviewed.
///
/// `approval_source` is only written when set.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = test_details)]
pub struct TestDetailChangeset {
    pub status: String,
    pub approval_source: Option<String>,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
}

/// Query result row for investigation results.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = investigation_results)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InvestigationRow {
    pub id: i64,
    pub test_detail_id: i64,
    pub master_investigation_id: i64,
    pub name: String,
    pub value: String,
    pub device_value: String,
    pub result_representation_type: String,
    pub lis_code: String,
    pub abnormality: String,
    pub is_abnormal: bool,
    pub status: String,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    pub entered_by: Option<i64>,
    pub entered_at: Option<DateTime<Utc>>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
}

/// Changeset persisted when an investigation is reviewed.
///
/// Approval columns are always written so that a rerun clears them.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = investigation_results)]
#[diesel(treat_none_as_null = true)]
pub struct InvestigationChangeset {
    pub value: String,
    pub abnormality: String,
    pub is_abnormal: bool,
    pub status: String,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
}

/// Row of `investigation_data`, used for reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = investigation_data)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InvestigationDataRow {
    pub investigation_id: i64,
    pub data: String,
    pub data_type: String,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
}

/// Changeset persisted when a data payload is replaced.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = investigation_data)]
pub struct InvestigationDataChangeset {
    pub data: String,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
}

/// Query result row for remarks.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = remarks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RemarkRow {
    pub id: i64,
    pub investigation_id: i64,
    pub description: String,
    pub remark_type: String,
    pub remark_by: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
}

/// Insert model for remarks.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = remarks)]
pub struct NewRemarkRow {
    pub investigation_id: i64,
    pub description: String,
    pub remark_type: String,
    pub remark_by: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
}

/// Changeset persisted when a remark is edited.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = remarks)]
pub struct RemarkChangeset {
    pub description: String,
    pub remark_type: String,
    pub remark_by: i64,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
}

/// Insert model for rerun snapshots.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = rerun_investigation_results)]
pub struct NewRerunResultRow {
    pub test_detail_id: i64,
    pub investigation_id: i64,
    pub master_investigation_id: i64,
    pub name: String,
    pub value: String,
    pub device_value: String,
    pub result_representation_type: String,
    pub lis_code: String,
    pub triggered_by: i64,
    pub triggered_at: DateTime<Utc>,
    pub reason: String,
    pub remarks: String,
    pub entered_by: Option<i64>,
    pub entered_at: Option<DateTime<Utc>>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
}

/// Insert model for co-authorization rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = co_authorized_pathologists)]
pub struct NewCoAuthorizationRow {
    pub task_id: i64,
    pub co_authorized_by: i64,
    pub co_authorized_to: i64,
    pub co_authorized_at: DateTime<Utc>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
}

/// Query result row for users.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub user_type: String,
    pub lis_user_id: Option<String>,
    pub system_user_id: Option<String>,
}

/// Query result row for pathologist assignments.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_pathologist_mapping)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AssignmentRow {
    pub task_id: i64,
    pub pathologist_id: i64,
    pub is_active: bool,
}
