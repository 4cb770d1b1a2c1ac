pub(crate) mod check;
pub(crate) mod diff;
pub(crate) mod explain;
pub(crate) mod helpers;
pub(crate) mod normalize;
