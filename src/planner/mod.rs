/*!
 * Plan acquisition seam.
 *
 * A planner turns a structure snapshot into an edit plan. Whatever sits
 * behind the trait, its output is untrusted by contract: raw JSON that
 * must survive schema validation and constraint enforcement before a
 * single operation executes. The pipeline never decodes a plan the
 * validators have not seen.
 */

pub mod scripted;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::PlannerError;
use crate::snapshot::StructureSnapshot;

pub use scripted::ScriptedPlanner;

/// Produces an edit plan for a document
#[async_trait]
pub trait Planner: Send + Sync {
    /// Planner name for logs and audit artifacts
    fn name(&self) -> &str;

    /// Produce a raw plan for the given structure snapshot
    async fn plan(&self, structure: &StructureSnapshot) -> Result<Value, PlannerError>;
}
