/// Domain models
///
/// # Models
///
/// - `user`: Accounts, plan tiers, and the public profile projection
/// - `task`: Tasks, statuses, identifiers, partial updates, and list ordering
///
/// Persistence lives in [`crate::store`]; these types carry no database
/// handles so both storage backends share them.

pub mod task;
pub mod user;
