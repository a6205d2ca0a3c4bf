pub(crate) mod composite;
pub(crate) mod encode;
pub(crate) mod raster;
