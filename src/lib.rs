pub mod blockchain;
pub mod config;
pub mod consensus;
pub mod coordinator;
pub mod errors;
pub mod utils;

// Re-export commonly used items
pub use blockchain::{Address, EventBus, FlightId, FlightStatus, LedgerEvent, SharedLedger, SuretyLedger};
pub use config::SuretyConfig;
pub use consensus::{EntropySource, RequestKey, ResponseOutcome};
pub use coordinator::{CoordinatorHandle, OracleCoordinator, OraclePool};
pub use errors::{SuretyError, SuretyResult};
