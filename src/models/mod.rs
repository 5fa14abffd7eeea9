pub mod document;
pub mod entry;
pub mod loaders;
pub mod manifest;
pub mod request;
pub mod wire;

pub use document::{DocumentHandle, Rotation};
pub use entry::{BrokenKind, BrokenReason, DocumentEntry};
pub use loaders::{load_documents, load_manifest, load_pdf_folder};
pub use manifest::{ManifestDocument, SessionManifest};
pub use request::TransformRequest;
pub use wire::{
    parse_locked_names, PasswordCheckResponse, ServiceErrorBody, TransformOutput,
    ValidationReport, ValidationVerdict,
};
