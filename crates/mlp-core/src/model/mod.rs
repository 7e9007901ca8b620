//! Modelos neutrales (Artifact, Fingerprint, ExecutionContext,...)

pub mod artifact;
pub mod context;
pub mod fingerprint;
pub mod typed_artifact;

pub use artifact::{Artifact, ArtifactDecl, ArtifactFormat};
pub use context::ExecutionContext;
pub use fingerprint::StageFingerprintInput;
pub use typed_artifact::{decode_json, encode_json, ArtifactDecodeError, ArtifactSpec};
