pub(crate) mod presets;
pub(crate) mod table;
