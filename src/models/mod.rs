pub mod allocation;
pub mod draw;
pub mod enums;
pub mod notification;
pub mod stats;

pub use allocation::*;
pub use draw::*;
pub use enums::*;
pub use notification::*;
pub use stats::*;
