pub mod colormap;
pub mod scatter;
