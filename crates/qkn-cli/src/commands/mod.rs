//! Command implementations.

pub mod health;
pub mod history;
pub mod profile;
pub mod search;
pub mod solve;
pub mod watch;

pub use self::health::execute_health;
pub use self::history::execute_history;
pub use self::profile::execute_profile;
pub use self::search::execute_search;
pub use self::solve::execute_solve;
pub use self::watch::execute_watch;
