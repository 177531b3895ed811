pub(crate) mod decode;
pub(crate) mod font;
pub(crate) mod media;
pub(crate) mod pool;
