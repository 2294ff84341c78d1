pub mod notifications;
pub mod payments;
pub mod pricing;
pub mod receipt;
pub mod reconciler;
pub mod reminders;
