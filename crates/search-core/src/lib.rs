// search-core/src/lib.rs
//! Search orchestration over a remote vulnerability service.
//!
//! - raw filters are normalized into a canonical payload (`normalize`, `filters`)
//! - keystroke bursts are debounced and superseded requests dropped (`coordinator`)
//! - every outbound call shares one minimum-interval clock (`rate_limit`)
//! - results, paging and keyword history are kept for the caller (`state`, `history`)

pub mod config;
pub mod coordinator;
pub mod filters;
pub mod history;
pub mod normalize;
pub mod pagination;
pub mod rate_limit;
pub mod state;

pub use config::EngineConfig;
pub use coordinator::{SearchCoordinator, SearchHandle, SearchOutcome};
pub use filters::{DEFAULT_RESULTS_PER_PAGE, SearchFilters};
pub use history::{HISTORY_CAPACITY, SearchHistory};
pub use normalize::{ANY_SENTINEL, normalize_params};
pub use pagination::PaginationError;
pub use rate_limit::RateLimiter;
pub use state::{Phase, SearchState};
