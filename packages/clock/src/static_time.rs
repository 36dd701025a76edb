//! The time the process started, captured once and reused by the stopped
//! clock as its default fixed time.
use std::time::SystemTime;

lazy_static! {
    /// The time this process started, used as the stopped clock's default.
    pub static ref TIME_AT_APP_START: SystemTime = SystemTime::now();
}
