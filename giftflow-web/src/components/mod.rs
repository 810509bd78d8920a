pub mod music;
pub mod step_header;
