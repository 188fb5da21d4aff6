pub mod health;
pub mod routes;
pub mod users;

pub use health::AppStartTime;
pub use routes::{API_PREFIX, configure};
