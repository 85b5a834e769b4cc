pub mod client;
pub mod record;
pub mod transform;

pub use client::CatalogClient;
pub use transform::{ProductDraft, build_draft, truncate_title};
