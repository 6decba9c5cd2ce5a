pub mod boxes;
pub mod common;
pub mod items;
