//! LIS order representation consumed and re-emitted during synchronization.
//!
//! Only the fields the engine patches are modelled explicitly; everything
//! else the LIS returns is carried through `extra` so the order can be pushed
//! back whole.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Order held by the LIS for one visit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LisOrder {
    /// LIS order identifier.
    pub order_id: String,
    /// Organisation code of the lab.
    pub org_code: String,
    /// Ordered tests.
    #[serde(rename = "OrderInfo", default)]
    pub lines: Vec<LisOrderLine>,
    /// Fields not interpreted by the engine.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result columns shared by every level of an LIS order line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LisLineFields {
    /// LIS code of the test, group, or parameter.
    #[serde(default)]
    pub test_code: String,
    /// Line type (`INV` for a standalone investigation).
    #[serde(default)]
    pub test_type: String,
    /// Reported value.
    #[serde(default)]
    pub test_value: String,
    /// LIS status label.
    #[serde(default)]
    pub test_status: String,
    /// Operator identifier in the LIS.
    #[serde(rename = "UserID", default)]
    pub user_id: u64,
    /// Approval timestamp.
    #[serde(default)]
    pub result_approved_at: Option<String>,
    /// Medical remarks printed with the result.
    #[serde(default)]
    pub medical_remarks: String,
    /// Rerun reason.
    #[serde(default)]
    pub rerun_reason: String,
    /// Rerun remarks.
    #[serde(default)]
    pub rerun_remarks: String,
    /// Rerun timestamp.
    #[serde(default)]
    pub rerun_time: String,
}

/// Top-level ordered test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LisOrderLine {
    /// Result columns.
    #[serde(flatten)]
    pub fields: LisLineFields,
    /// Grouped contents of a profile or panel.
    #[serde(rename = "OrderContentListInfo", default)]
    pub contents: Vec<LisContentLine>,
    /// Fields not interpreted by the engine.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Content of a panel line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LisContentLine {
    /// Result columns.
    #[serde(flatten)]
    pub fields: LisLineFields,
    /// Parameters of a grouped investigation.
    #[serde(rename = "ParameterListInfo", default)]
    pub parameters: Vec<LisParameterLine>,
    /// Fields not interpreted by the engine.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Innermost parameter line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LisParameterLine {
    /// Result columns.
    #[serde(flatten)]
    pub fields: LisLineFields,
    /// Fields not interpreted by the engine.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
