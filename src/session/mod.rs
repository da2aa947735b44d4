pub(crate) mod config;
pub(crate) mod scheduler;
pub(crate) mod worker;
