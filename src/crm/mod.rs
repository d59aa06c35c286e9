//! CRM collaborators — HTTP client, webhook feed, and wire types.

pub mod client;
pub mod types;
pub mod webhook;

pub use client::CrmClient;
pub use types::{Call, CallsPage, Card, CustomField, Manager, NewLead, PipelineStatus};
pub use webhook::WebhookClient;
