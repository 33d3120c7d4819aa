//! Manifest document model, parser, writer, and dependency view for zonpin.
//!
//! This crate defines the schema layer: the arena-backed `Document` tree, the
//! state-machine `parse` function, the canonical `write` renderer, the typed
//! `Manifest` view over the `dependencies` object, and the `PackageHash`
//! identifier newtype.

pub mod document;
pub mod manifest;
pub mod parse;
pub mod types;
pub mod write;

pub use document::{Document, DocumentError, Field, NewNode, Node, NodeId, DEFAULT_INDENT};
pub use manifest::{
    parse_manifest_file, parse_manifest_str, write_manifest_file, Dependency, Manifest,
    ManifestError, DEPENDENCIES_FIELD, HASH_FIELD, URL_FIELD,
};
pub use parse::{parse, Expected, ParseError, SyntaxError};
pub use types::{
    DependencyName, InvalidPackageHash, PackageHash, MULTIHASH_SHA256, PACKAGE_HASH_LEN,
    PACKAGE_HASH_PREFIX, SHA256_DIGEST_LEN,
};
pub use write::write;
