mod downloads;
mod health_check;
mod subscriptions;

pub use downloads::*;
pub use health_check::*;
pub use subscriptions::*;
