//! Study document adapters

mod json_source;

pub use json_source::JsonStudyConfigSource;
