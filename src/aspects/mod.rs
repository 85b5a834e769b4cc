pub mod misses;
pub mod patterns;
pub mod resolver;

pub use misses::MissStore;
pub use patterns::{PatternStore, compile_patterns};
pub use resolver::resolve_aspects;
