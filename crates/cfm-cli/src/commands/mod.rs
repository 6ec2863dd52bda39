//! Command implementations

pub(crate) mod new;
pub(crate) mod rollback;
pub(crate) mod status;
pub(crate) mod up;
pub(crate) mod version;
