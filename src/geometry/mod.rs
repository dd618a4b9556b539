//! Vector path geometry used by path-following actions.

pub(crate) mod path;
