pub(crate) mod config;
pub(crate) mod errors;
pub(crate) mod imports;
pub(crate) mod settings;
pub(crate) mod solc;
