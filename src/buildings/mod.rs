pub mod extraction;
pub mod footprint;
pub mod height;
