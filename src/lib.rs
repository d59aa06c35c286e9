//! lead-pulse — lead reconciliation and per-manager analytics over KeyCRM.

pub mod config;
pub mod crm;
pub mod error;
pub mod pipeline;
pub mod report;
