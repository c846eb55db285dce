pub mod common;
pub mod farmers;
