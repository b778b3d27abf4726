mod set;
mod types;

pub use set::SessionIdentitySet;
pub use types::{IdentityRecord, IdentityUrl, SregFields};
