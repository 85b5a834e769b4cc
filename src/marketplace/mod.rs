pub mod config;
pub mod inventory;
pub mod listing;
pub mod offers;
pub mod taxonomy;

pub use listing::ListingPayload;
pub use taxonomy::{AspectRequirement, CategorySuggestion};
