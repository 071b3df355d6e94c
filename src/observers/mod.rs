pub mod colormap;
pub mod imgstream;
