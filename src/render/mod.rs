pub(crate) mod mailbox;
pub(crate) mod surface;
pub(crate) mod synchronizer;
