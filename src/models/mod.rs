pub mod listing;
pub mod search;
pub mod site;

pub use listing::{Listing, NewListing};
pub use search::SearchSpec;
pub use site::Site;
