//! In-memory repository for task review tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::review::{
    domain::{
        CoAuthorizedPathologist, InvestigationData, InvestigationId, InvestigationResult,
        NewRemark, PathologistAssignment, Remark, RemarkId, RerunInvestigationResult, Task, TaskId,
        TestDetail, TestDetailId, Tombstone, User, UserId, VisitLab,
    },
    ports::{
        TaskReviewRepository, TaskReviewRepositoryError, TaskReviewRepositoryResult,
        TaskReviewTransaction,
    },
};

/// Thread-safe in-memory task review repository.
///
/// Transactions run against a copy of the state that replaces the stored
/// state only when the work closure succeeds.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskReviewRepository {
    state: Arc<RwLock<InMemoryReviewState>>,
}

#[derive(Debug, Clone, Default)]
struct InMemoryReviewState {
    tasks: HashMap<TaskId, Task>,
    test_details: BTreeMap<TestDetailId, TestDetail>,
    investigations: BTreeMap<InvestigationId, InvestigationResult>,
    investigation_data: HashMap<InvestigationId, InvestigationData>,
    remarks: BTreeMap<RemarkId, Remark>,
    rerun_results: Vec<RerunInvestigationResult>,
    co_authorizations: Vec<CoAuthorizedPathologist>,
    users: HashMap<UserId, User>,
    assignments: Vec<PathologistAssignment>,
    visits: HashMap<String, Vec<VisitLab>>,
    last_remark_id: u64,
}

impl InMemoryTaskReviewRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> TaskReviewRepositoryResult<RwLockReadGuard<'_, InMemoryReviewState>> {
        self.state.read().map_err(|err| {
            TaskReviewRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write_state(
        &self,
    ) -> TaskReviewRepositoryResult<RwLockWriteGuard<'_, InMemoryReviewState>> {
        self.state.write().map_err(|err| {
            TaskReviewRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn seed(&self, apply: impl FnOnce(&mut InMemoryReviewState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state);
    }

    fn inspect<T>(&self, read: impl FnOnce(&InMemoryReviewState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        read(&state)
    }

    /// Stores a task.
    pub fn insert_task(&self, task: Task) {
        self.seed(|state| {
            state.tasks.insert(task.id, task);
        });
    }

    /// Stores a test detail.
    pub fn insert_test_detail(&self, test_detail: TestDetail) {
        self.seed(|state| {
            state.test_details.insert(test_detail.id, test_detail);
        });
    }

    /// Stores an investigation result.
    pub fn insert_investigation(&self, investigation: InvestigationResult) {
        self.seed(|state| {
            state.investigations.insert(investigation.id, investigation);
        });
    }

    /// Stores an investigation data row.
    pub fn insert_investigation_data(&self, row: InvestigationData) {
        self.seed(|state| {
            state.investigation_data.insert(row.investigation_id, row);
        });
    }

    /// Stores a remark and advances the identifier sequence past it.
    pub fn insert_remark(&self, remark: Remark) {
        self.seed(|state| {
            state.last_remark_id = state.last_remark_id.max(remark.id.value());
            state.remarks.insert(remark.id, remark);
        });
    }

    /// Stores a co-authorization row.
    pub fn insert_co_authorization(&self, row: CoAuthorizedPathologist) {
        self.seed(|state| state.co_authorizations.push(row));
    }

    /// Stores a user.
    pub fn insert_user(&self, user: User) {
        self.seed(|state| {
            state.users.insert(user.id, user);
        });
    }

    /// Stores a pathologist assignment.
    pub fn insert_assignment(&self, assignment: PathologistAssignment) {
        self.seed(|state| state.assignments.push(assignment));
    }

    /// Records that `visit` carries a sample for `external_test_id`.
    pub fn insert_visit(&self, external_test_id: impl Into<String>, visit: VisitLab) {
        self.seed(|state| {
            state
                .visits
                .entry(external_test_id.into())
                .or_default()
                .push(visit);
        });
    }

    /// Returns the stored task.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<Task> {
        self.inspect(|state| state.tasks.get(&id).cloned())
    }

    /// Returns the stored test detail.
    #[must_use]
    pub fn test_detail(&self, id: TestDetailId) -> Option<TestDetail> {
        self.inspect(|state| state.test_details.get(&id).cloned())
    }

    /// Returns the stored investigation.
    #[must_use]
    pub fn investigation(&self, id: InvestigationId) -> Option<InvestigationResult> {
        self.inspect(|state| state.investigations.get(&id).cloned())
    }

    /// Returns the stored data row of an investigation.
    #[must_use]
    pub fn investigation_data(&self, id: InvestigationId) -> Option<InvestigationData> {
        self.inspect(|state| state.investigation_data.get(&id).cloned())
    }

    /// Returns every remark of an investigation, soft-deleted ones included.
    #[must_use]
    pub fn remarks_of(&self, investigation_id: InvestigationId) -> Vec<Remark> {
        self.inspect(|state| {
            state
                .remarks
                .values()
                .filter(|remark| remark.investigation_id == investigation_id)
                .cloned()
                .collect()
        })
    }

    /// Returns the stored remark, soft-deleted or not.
    #[must_use]
    pub fn remark(&self, id: RemarkId) -> Option<Remark> {
        self.inspect(|state| state.remarks.get(&id).cloned())
    }

    /// Returns every rerun snapshot in insertion order.
    #[must_use]
    pub fn rerun_results(&self) -> Vec<RerunInvestigationResult> {
        self.inspect(|state| state.rerun_results.clone())
    }

    /// Returns every co-authorization row of a task in insertion order.
    #[must_use]
    pub fn co_authorizations(&self, task_id: TaskId) -> Vec<CoAuthorizedPathologist> {
        self.inspect(|state| {
            state
                .co_authorizations
                .iter()
                .filter(|row| row.task_id == task_id)
                .cloned()
                .collect()
        })
    }
}

fn live_remark(remark: &Remark) -> bool {
    remark.tombstone.is_none()
}

#[async_trait]
impl TaskReviewRepository for InMemoryTaskReviewRepository {
    async fn find_task(&self, id: TaskId) -> TaskReviewRepositoryResult<Option<Task>> {
        let state = self.read_state()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn find_test_details(
        &self,
        ids: &[TestDetailId],
    ) -> TaskReviewRepositoryResult<Vec<TestDetail>> {
        let state = self.read_state()?;
        let wanted: HashSet<_> = ids.iter().collect();
        Ok(state
            .test_details
            .values()
            .filter(|detail| wanted.contains(&detail.id))
            .cloned()
            .collect())
    }

    async fn find_test_details_by_task(
        &self,
        task_id: TaskId,
    ) -> TaskReviewRepositoryResult<Vec<TestDetail>> {
        let state = self.read_state()?;
        Ok(state
            .test_details
            .values()
            .filter(|detail| detail.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn find_investigations(
        &self,
        ids: &[InvestigationId],
    ) -> TaskReviewRepositoryResult<Vec<InvestigationResult>> {
        let state = self.read_state()?;
        let wanted: HashSet<_> = ids.iter().collect();
        Ok(state
            .investigations
            .values()
            .filter(|investigation| wanted.contains(&investigation.id))
            .cloned()
            .collect())
    }

    async fn find_investigations_by_test_details(
        &self,
        test_detail_ids: &[TestDetailId],
    ) -> TaskReviewRepositoryResult<Vec<InvestigationResult>> {
        let state = self.read_state()?;
        let wanted: HashSet<_> = test_detail_ids.iter().collect();
        Ok(state
            .investigations
            .values()
            .filter(|investigation| wanted.contains(&investigation.test_detail_id))
            .cloned()
            .collect())
    }

    async fn find_investigation_data(
        &self,
        investigation_ids: &[InvestigationId],
    ) -> TaskReviewRepositoryResult<Vec<InvestigationData>> {
        let state = self.read_state()?;
        Ok(investigation_ids
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .filter_map(|id| state.investigation_data.get(id).cloned())
            .collect())
    }

    async fn find_remarks(&self, ids: &[RemarkId]) -> TaskReviewRepositoryResult<Vec<Remark>> {
        let state = self.read_state()?;
        let wanted: HashSet<_> = ids.iter().collect();
        Ok(state
            .remarks
            .values()
            .filter(|remark| wanted.contains(&remark.id) && live_remark(remark))
            .cloned()
            .collect())
    }

    async fn find_user(&self, id: UserId) -> TaskReviewRepositoryResult<Option<User>> {
        let state = self.read_state()?;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_active_assignment(
        &self,
        task_id: TaskId,
    ) -> TaskReviewRepositoryResult<Option<PathologistAssignment>> {
        let state = self.read_state()?;
        Ok(state
            .assignments
            .iter()
            .find(|assignment| assignment.task_id == task_id && assignment.is_active)
            .copied())
    }

    async fn find_visits_by_external_test_ids(
        &self,
        external_test_ids: &[String],
    ) -> TaskReviewRepositoryResult<Vec<VisitLab>> {
        let state = self.read_state()?;
        let mut seen = HashSet::new();
        Ok(external_test_ids
            .iter()
            .filter_map(|id| state.visits.get(id))
            .flatten()
            .filter(|visit| seen.insert(visit.visit_id.clone()))
            .cloned()
            .collect())
    }

    async fn in_transaction<F, T>(&self, work: F) -> TaskReviewRepositoryResult<T>
    where
        F: FnOnce(&mut dyn TaskReviewTransaction) -> TaskReviewRepositoryResult<T>
            + Send
            + 'static,
        T: Send + 'static,
    {
        let mut state = self.write_state()?;
        let mut staged = state.clone();
        let result = work(&mut InMemoryTransaction {
            state: &mut staged,
        })?;
        *state = staged;
        Ok(result)
    }
}

struct InMemoryTransaction<'a> {
    state: &'a mut InMemoryReviewState,
}

impl TaskReviewTransaction for InMemoryTransaction<'_> {
    fn update_task(&mut self, task: &Task) -> TaskReviewRepositoryResult<()> {
        let stored = self
            .state
            .tasks
            .get_mut(&task.id)
            .ok_or(TaskReviewRepositoryError::TaskNotFound(task.id))?;
        stored.status = task.status;
        stored.completed_at = task.completed_at;
        stored.audit = task.audit;
        Ok(())
    }

    fn update_test_details(
        &mut self,
        test_details: &[TestDetail],
    ) -> TaskReviewRepositoryResult<()> {
        for detail in test_details {
            let stored = self.state.test_details.get_mut(&detail.id).ok_or_else(|| {
                TaskReviewRepositoryError::row_not_found("test_details", detail.id.value())
            })?;
            stored.status = detail.status;
            stored.approval_source.clone_from(&detail.approval_source);
            stored.audit = detail.audit;
        }
        Ok(())
    }

    fn update_investigations(
        &mut self,
        investigations: &[InvestigationResult],
    ) -> TaskReviewRepositoryResult<()> {
        for investigation in investigations {
            let stored = self
                .state
                .investigations
                .get_mut(&investigation.id)
                .ok_or_else(|| {
                    TaskReviewRepositoryError::row_not_found(
                        "investigation_results",
                        investigation.id.value(),
                    )
                })?;
            stored.clone_from(investigation);
        }
        Ok(())
    }

    fn create_investigation_data(
        &mut self,
        rows: &[InvestigationData],
    ) -> TaskReviewRepositoryResult<()> {
        for row in rows {
            if self.state.investigation_data.contains_key(&row.investigation_id) {
                return Err(TaskReviewRepositoryError::persistence(std::io::Error::other(
                    format!("investigation data already exists for {}", row.investigation_id),
                )));
            }
            self.state
                .investigation_data
                .insert(row.investigation_id, row.clone());
        }
        Ok(())
    }

    fn update_investigation_data(
        &mut self,
        rows: &[InvestigationData],
    ) -> TaskReviewRepositoryResult<()> {
        for row in rows {
            let stored = self
                .state
                .investigation_data
                .get_mut(&row.investigation_id)
                .ok_or_else(|| {
                    TaskReviewRepositoryError::row_not_found(
                        "investigation_data",
                        row.investigation_id.value(),
                    )
                })?;
            stored.data.clone_from(&row.data);
            stored.audit = row.audit;
        }
        Ok(())
    }

    fn insert_rerun_results(
        &mut self,
        rows: &[RerunInvestigationResult],
    ) -> TaskReviewRepositoryResult<()> {
        self.state.rerun_results.extend_from_slice(rows);
        Ok(())
    }

    fn delete_active_co_authorization(
        &mut self,
        task_id: TaskId,
        tombstone: Tombstone,
    ) -> TaskReviewRepositoryResult<()> {
        self.state
            .co_authorizations
            .iter_mut()
            .filter(|row| row.task_id == task_id && row.tombstone.is_none())
            .for_each(|row| row.tombstone = Some(tombstone));
        Ok(())
    }

    fn insert_co_authorization(
        &mut self,
        row: &CoAuthorizedPathologist,
    ) -> TaskReviewRepositoryResult<()> {
        self.state.co_authorizations.push(row.clone());
        Ok(())
    }

    fn create_remarks(
        &mut self,
        remarks: &[NewRemark],
    ) -> TaskReviewRepositoryResult<Vec<RemarkId>> {
        let mut ids = Vec::with_capacity(remarks.len());
        for remark in remarks {
            self.state.last_remark_id += 1;
            let id = RemarkId::from_raw(self.state.last_remark_id);
            self.state.remarks.insert(
                id,
                Remark {
                    id,
                    investigation_id: remark.investigation_id,
                    description: remark.description.clone(),
                    remark_type: remark.remark_type,
                    remark_by: remark.remark_by,
                    audit: remark.audit,
                    tombstone: None,
                },
            );
            ids.push(id);
        }
        Ok(ids)
    }

    fn update_remarks(&mut self, remarks: &[Remark]) -> TaskReviewRepositoryResult<()> {
        for remark in remarks {
            let stored = self
                .state
                .remarks
                .get_mut(&remark.id)
                .filter(|stored| live_remark(stored))
                .ok_or_else(|| {
                    TaskReviewRepositoryError::row_not_found("remarks", remark.id.value())
                })?;
            stored.description.clone_from(&remark.description);
            stored.remark_type = remark.remark_type;
            stored.remark_by = remark.remark_by;
            stored.audit = remark.audit;
        }
        Ok(())
    }

    fn delete_remarks(
        &mut self,
        ids: &[RemarkId],
        tombstone: Tombstone,
    ) -> TaskReviewRepositoryResult<()> {
        for id in ids {
            if let Some(remark) = self.state.remarks.get_mut(id) {
                remark.tombstone.get_or_insert(tombstone);
            }
        }
        Ok(())
    }
}
