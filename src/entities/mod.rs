pub mod item;
pub mod storage_box;

pub use storage_box::{BoxStatus, PackingMode};
