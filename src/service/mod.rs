pub mod account_sync;
pub mod account_tree;
pub mod reports;
pub mod sync_scheduler;
pub mod token_manager;

pub use account_sync::AccountSync;
pub use account_tree::{AccountNode, build_account_tree};
pub use reports::balance_summary;
pub use sync_scheduler::SyncSchedulerHandle;
pub use token_manager::TokenManager;
