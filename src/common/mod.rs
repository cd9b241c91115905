mod data;
mod polygon;

pub(crate) use data::*;
pub(crate) use polygon::*;
