pub(crate) mod controller;
pub(crate) mod progress;
pub(crate) mod state;
