mod collection;
mod io;
mod value;

pub use collection::FeatureCollection;
pub(crate) use collection::idx_chunked;
pub use io::load;
pub use value::Value;
