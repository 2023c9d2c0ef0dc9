pub mod alerts;
pub mod ingest;
pub mod samples;
pub mod thresholds;
