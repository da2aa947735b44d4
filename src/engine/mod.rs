pub(crate) mod adapter;
pub(crate) mod genome;
pub(crate) mod polygon;
pub(crate) mod raster;
pub(crate) mod scoring;
