pub mod toml_loader;

pub use toml_loader::{load_documents, load_manifest, load_pdf_folder};
