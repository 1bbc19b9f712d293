pub mod bucket;
pub mod projection;
