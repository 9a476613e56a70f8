pub mod bid_service;
pub mod donation_service;
pub mod donor_cache_service;
pub mod drawing_service;
pub mod reconciliation_service;

pub use bid_service::*;
pub use donation_service::*;
pub use donor_cache_service::*;
pub use drawing_service::*;
pub use reconciliation_service::*;
