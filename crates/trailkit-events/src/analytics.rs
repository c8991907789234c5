//! # Analytics Events

use crate::publish_typed;
use serde::{Deserialize, Serialize};
use trailkit_bus::{EventBus, PublishOptions};

/// `metadata.source` for this domain.
pub const SOURCE: &str = "analytics";

/// A usage report finished generating.
pub const REPORT_GENERATED: &str = "analytics.report_generated";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportGenerated {
    pub report_id: String,
    pub organization_id: String,
    pub report_kind: String,
    /// Number of rows in the generated report.
    pub row_count: u64,
}

pub async fn publish_report_generated(
    bus: &EventBus,
    payload: &ReportGenerated,
    options: PublishOptions,
) -> bool {
    publish_typed(bus, REPORT_GENERATED, SOURCE, payload, options).await
}
