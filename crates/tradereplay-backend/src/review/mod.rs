//! Review views: dashboard statistics, the auto-refreshing timeline and
//! manual trade entry.

mod dashboard;
mod form;
mod timeline;

pub use dashboard::DashboardStats;
pub use form::{Attachment, ManualTradeForm};
pub use timeline::TimelinePoller;
