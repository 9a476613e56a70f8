pub mod currency;
pub mod external_id;
pub mod language;
pub mod weighted;

pub use currency::*;
pub use external_id::*;
pub use language::*;
pub use weighted::*;
