pub mod loaders;
pub mod metrics;
pub mod question;
pub mod upload;

pub use loaders::{load_upload_batch, load_upload_file};
pub use metrics::{HistoryComparison, MethodAverages, MetricsHistory, RawMetrics, Strategy};
pub use question::{Comparison, GenerateRequest, GenerateResponse, QuestionRecord, StrategyResult};
pub use upload::{UploadBatch, UploadFile, UploadResult};
