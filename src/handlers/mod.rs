mod count;
mod health;
mod metrics;
mod waitlist;

pub use count::count_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use waitlist::signup_handler;
