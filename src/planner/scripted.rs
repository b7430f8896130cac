/*!
 * Planner that replays a captured plan.
 *
 * The CLI's normal mode: the operator supplies a plan JSON file (captured
 * from a model or written by hand) and the pipeline treats it exactly
 * like live planner output, untrusted included.
 */

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use crate::errors::PlannerError;
use crate::planner::Planner;
use crate::snapshot::StructureSnapshot;

/// Replays one fixed plan value
pub struct ScriptedPlanner {
    label: String,
    plan: Value,
}

impl ScriptedPlanner {
    pub fn from_value(plan: Value) -> Self {
        Self {
            label: "scripted".to_string(),
            plan,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, PlannerError> {
        let body = fs::read_to_string(path)
            .map_err(|e| PlannerError::GenerationFailed(format!("{}: {}", path.display(), e)))?;
        let plan: Value = serde_json::from_str(&body).map_err(|e| {
            PlannerError::GenerationFailed(format!("{} is not valid JSON: {}", path.display(), e))
        })?;
        Ok(Self {
            label: format!("scripted:{}", path.display()),
            plan,
        })
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    fn name(&self) -> &str {
        &self.label
    }

    async fn plan(&self, structure: &StructureSnapshot) -> Result<Value, PlannerError> {
        if self.plan.is_null() {
            return Err(PlannerError::Empty("plan source held no plan".to_string()));
        }
        debug!(
            "Replaying plan for document with {} paragraph(s)",
            structure.paragraphs.len()
        );
        Ok(self.plan.clone())
    }
}
