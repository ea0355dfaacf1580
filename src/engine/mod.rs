// Mon Oct 19 2026 - Alex

pub mod pipeline;

pub use pipeline::AuditPipeline;
