pub mod document_composer;

pub use document_composer::DocumentComposer;
