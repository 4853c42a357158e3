pub mod editor;
pub mod geometry;
pub mod logo;
pub mod overlay;
pub mod pdf;
pub mod session;
