pub mod interactive;
pub mod status;
