//! Scene composition: background image, Ken-Burns zoom and caption overlay.

pub(crate) mod caption;
pub(crate) mod composer;
pub(crate) mod transform;
