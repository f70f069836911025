pub mod annotate;
pub mod artifact_store;
mod glyphs;
