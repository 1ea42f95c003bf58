use chrono::{DateTime, Local};

/// Represents an entity responsible for providing dates across the
/// application. This can allow it to be used for testing.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Sync + Send {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}
