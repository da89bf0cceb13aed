pub mod primitive;
pub mod video;
