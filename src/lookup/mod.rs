pub mod cache;
pub mod maintenance;
pub mod resolver;

pub use cache::{cache_ttl, WordCache, CACHE_TTL_MS};
pub use maintenance::{eviction_loop, EVICTION_INTERVAL};
pub use resolver::{Resolution, ResolutionSource, ResolutionState, ResolverConfig, WordResolver};
