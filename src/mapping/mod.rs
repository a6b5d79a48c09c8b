pub mod bijective_map;
pub mod error;
