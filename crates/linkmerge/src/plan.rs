use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::menu::ReferenceMenu;
use crate::selection::Category;
use crate::types::{NodeRef, Origin};

/// One user edit, in serialized form.
///
/// # JSON shape
///
/// ```json
/// { "op": "move", "from": { "tree": "loaded", "path": ["base", "arm"] },
///   "to": { "tree": "existing", "path": ["base"] }, "index": 0 }
/// { "op": "select", "category": "mass_inertia", "origin": "loaded" }
/// { "op": "check_reference", "menu": "axis", "label": "Axis_z" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MergeOp {
    Move {
        from: NodeRef,
        to: NodeRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    Select {
        category: Category,
        origin: Origin,
    },
    CheckReference {
        menu: ReferenceMenu,
        label: String,
    },
}

/// An ordered list of edits to replay against a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePlan {
    pub ops: Vec<MergeOp>,
}

impl MergePlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_op(mut self, op: MergeOp) -> Self {
        self.ops.push(op);
        self
    }

    /// Parse a plan from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
