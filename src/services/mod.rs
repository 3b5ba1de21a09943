pub mod derived_metrics;
pub mod report_writer;

pub use derived_metrics::{compute_derived, CostModel, DerivedMetrics, MetricValue};
pub use report_writer::ReportWriter;
