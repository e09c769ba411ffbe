//! Business logic services.

pub mod aggregation;
pub mod grade_stats;
pub mod notifier;
pub mod report_format;
pub mod scope;

pub use notifier::{AddressedEvent, BroadcastEmitter, NotificationEmitter, UserSubscription};
pub use scope::Scope;
