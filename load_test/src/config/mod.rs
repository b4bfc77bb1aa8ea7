// Configuration module
// Fixed algorithm catalogue and load profile presets

pub mod algorithms;
pub mod load_profiles;

pub use algorithms::*;
pub use load_profiles::get_load_profile;
