pub mod acquisition;
pub mod settings;
