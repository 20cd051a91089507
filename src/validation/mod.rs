pub mod manifest_reader;
pub mod version_validator;

pub use manifest_reader::{ManifestMetadata, ManifestReader, ManifestType};
pub use version_validator::{VersionValidationResult, VersionValidator, normalize_tag};
