mod stats;
mod users;

pub use stats::stats;
pub use users::list_users;
