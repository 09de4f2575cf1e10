//! Configuration for the task update engine.

use serde::{Deserialize, Serialize};

/// When rerun and approval changes are pushed to the LIS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LisSyncMode {
    /// Push patched orders right after the commit.
    Immediate,
    /// Fetch and patch orders but leave pushing to an out-of-band job.
    Deferred,
}

/// Tunable vocabulary and behaviour of the task update engine.
///
/// # Examples
///
/// ```
/// use labtask::review::config::{LisSyncMode, TaskUpdateConfig};
///
/// let config = TaskUpdateConfig::default();
/// assert_eq!(config.default_rerun_reason, "Rerun Reason");
/// assert_eq!(config.lis_sync_mode, LisSyncMode::Immediate);
///
/// let deferred = TaskUpdateConfig::default().with_lis_sync_mode(LisSyncMode::Deferred);
/// assert_eq!(deferred.lis_sync_mode, LisSyncMode::Deferred);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskUpdateConfig {
    /// User types allowed to submit review updates.
    pub allowed_user_types: Vec<String>,
    /// Reason recorded when a rerun is requested without one.
    pub default_rerun_reason: String,
    /// Remark sent to the LIS for rerun lines without specific details.
    pub default_rerun_remark: String,
    /// Approval source stamped on approved test details.
    pub approval_source: String,
    /// Abnormality labels that mark a value as abnormal.
    pub abnormal_labels: Vec<String>,
    /// LIS status label for a rerun line.
    pub lis_rerun_status: String,
    /// LIS status label for an approved line.
    pub lis_approved_status: String,
    /// LIS line type of a standalone investigation.
    pub lis_investigation_type: String,
    /// Data type recorded on newly created investigation data rows.
    pub investigation_data_type: String,
    /// When patched orders are pushed to the LIS.
    pub lis_sync_mode: LisSyncMode,
    /// Whether approved tests are mirrored to the LIS alongside reruns.
    pub mirror_approvals: bool,
}

impl Default for TaskUpdateConfig {
    fn default() -> Self {
        Self {
            allowed_user_types: vec!["pathologist".to_owned(), "super-admin".to_owned()],
            default_rerun_reason: "Rerun Reason".to_owned(),
            default_rerun_remark: "Rerun Remark".to_owned(),
            approval_source: "OH".to_owned(),
            abnormal_labels: vec![
                "lower_abnormal".to_owned(),
                "upper_abnormal".to_owned(),
                "critical".to_owned(),
                "improbable".to_owned(),
            ],
            lis_rerun_status: "Recheck".to_owned(),
            lis_approved_status: "Approve".to_owned(),
            lis_investigation_type: "INV".to_owned(),
            investigation_data_type: "text".to_owned(),
            lis_sync_mode: LisSyncMode::Immediate,
            mirror_approvals: false,
        }
    }
}

impl TaskUpdateConfig {
    /// Sets the LIS sync mode.
    #[must_use]
    pub fn with_lis_sync_mode(mut self, mode: LisSyncMode) -> Self {
        self.lis_sync_mode = mode;
        self
    }

    /// Enables or disables mirroring approvals to the LIS.
    #[must_use]
    pub fn with_mirror_approvals(mut self, enabled: bool) -> Self {
        self.mirror_approvals = enabled;
        self
    }

    /// Sets the default rerun reason.
    #[must_use]
    pub fn with_default_rerun_reason(mut self, reason: impl Into<String>) -> Self {
        self.default_rerun_reason = reason.into();
        self
    }

    /// Returns `true` when `user_type` may submit review updates.
    #[must_use]
    pub fn allows_user_type(&self, user_type: &str) -> bool {
        self.allowed_user_types
            .iter()
            .any(|allowed| allowed == user_type)
    }

    /// Returns `true` when `abnormality` marks a value as abnormal.
    #[must_use]
    pub fn is_abnormal(&self, abnormality: &str) -> bool {
        self.abnormal_labels
            .iter()
            .any(|label| label == abnormality)
    }
}
