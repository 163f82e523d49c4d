pub mod applier;
pub mod params;

pub use applier::{render, substitute, validate, AppliedTemplate, RenderedChunk, TemplateApplier};
pub use params::{
    extract, extract_from, ParameterSchema, ParameterValues, PlaceholderSource,
};
