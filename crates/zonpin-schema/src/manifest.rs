use crate::document::{Document, DocumentError, NewNode, NodeId};
use crate::parse::{parse, ParseError};
use crate::types::{DependencyName, PackageHash};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

pub const DEPENDENCIES_FIELD: &str = "dependencies";
pub const URL_FIELD: &str = "url";
pub const HASH_FIELD: &str = "hash";

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    Parse(#[from] ParseError),
    #[error("manifest edit failed: {0}")]
    Document(#[from] DocumentError),
    #[error("'{0}' must be an object")]
    NotAnObject(String),
    #[error("'{0}' must be a string")]
    NotAString(String),
    #[error("dependency '{0}' not found")]
    UnknownDependency(String),
    #[error("dependency '{dependency}' has no '{field}' field")]
    MissingField { dependency: String, field: String },
}

/// One entry of the `dependencies` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub name: DependencyName,
    pub url: Option<String>,
    /// Stored as written; it may predate the current hash format.
    pub hash: Option<String>,
}

impl Dependency {
    pub fn require_url(&self) -> Result<&str, ManifestError> {
        self.url
            .as_deref()
            .ok_or_else(|| ManifestError::MissingField {
                dependency: self.name.to_string(),
                field: URL_FIELD.to_owned(),
            })
    }
}

/// A parsed manifest with typed access to its `dependencies`.
///
/// Everything else in the document is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    document: Document,
}

impl Manifest {
    pub fn from_document(document: Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    fn dependencies_node(&self) -> Result<Option<NodeId>, ManifestError> {
        let root = self.document.root();
        match self.document.field(root, DEPENDENCIES_FIELD) {
            None => Ok(None),
            Some(id) if self.document.is_object(id) => Ok(Some(id)),
            Some(_) => Err(ManifestError::NotAnObject(DEPENDENCIES_FIELD.to_owned())),
        }
    }

    fn dependency_node(&self, name: &str) -> Result<NodeId, ManifestError> {
        let deps = self
            .dependencies_node()?
            .ok_or_else(|| ManifestError::UnknownDependency(name.to_owned()))?;
        let id = self
            .document
            .field(deps, name)
            .ok_or_else(|| ManifestError::UnknownDependency(name.to_owned()))?;
        if !self.document.is_object(id) {
            return Err(ManifestError::NotAnObject(format!(
                "{DEPENDENCIES_FIELD}.{name}"
            )));
        }
        Ok(id)
    }

    fn leaf_field(
        &self,
        dep: NodeId,
        dep_name: &str,
        field: &str,
    ) -> Result<Option<String>, ManifestError> {
        match self.document.field(dep, field) {
            None => Ok(None),
            Some(id) => self
                .document
                .leaf(id)
                .map(|v| Some(v.to_owned()))
                .ok_or_else(|| {
                    ManifestError::NotAString(format!("{DEPENDENCIES_FIELD}.{dep_name}.{field}"))
                }),
        }
    }

    fn read_dependency(&self, id: NodeId, name: &str) -> Result<Dependency, ManifestError> {
        Ok(Dependency {
            name: DependencyName::new(name),
            url: self.leaf_field(id, name, URL_FIELD)?,
            hash: self.leaf_field(id, name, HASH_FIELD)?,
        })
    }

    /// All dependencies in document order. A manifest without a
    /// `dependencies` field has none.
    pub fn dependencies(&self) -> Result<Vec<Dependency>, ManifestError> {
        let Some(deps) = self.dependencies_node()? else {
            return Ok(Vec::new());
        };
        self.document
            .fields(deps)
            .iter()
            .map(|field| {
                if !self.document.is_object(field.value) {
                    return Err(ManifestError::NotAnObject(format!(
                        "{DEPENDENCIES_FIELD}.{}",
                        field.name
                    )));
                }
                self.read_dependency(field.value, &field.name)
            })
            .collect()
    }

    pub fn dependency(&self, name: &str) -> Result<Dependency, ManifestError> {
        let id = self.dependency_node(name)?;
        self.read_dependency(id, name)
    }

    /// Store `hash` under the dependency, returning the value it replaced.
    ///
    /// A missing `hash` field is inserted right after `url`, or appended when
    /// there is no `url` either.
    pub fn set_dependency_hash(
        &mut self,
        name: &str,
        hash: &PackageHash,
    ) -> Result<Option<String>, ManifestError> {
        let dep = self.dependency_node(name)?;
        let previous = self.leaf_field(dep, name, HASH_FIELD)?;

        if let Some(id) = self.document.field(dep, HASH_FIELD) {
            self.document.set_leaf(id, hash.as_str())?;
        } else {
            let position = self
                .document
                .fields(dep)
                .iter()
                .position(|f| f.name == URL_FIELD)
                .map_or(self.document.fields(dep).len(), |i| i + 1);
            self.document
                .insert_field(dep, position, HASH_FIELD, NewNode::Leaf(hash.as_str()))?;
        }
        debug!("set {DEPENDENCIES_FIELD}.{name}.{HASH_FIELD} = {hash}");
        Ok(previous)
    }

    /// Canonical file contents.
    pub fn render(&self) -> String {
        self.document.render()
    }

    pub fn render_with_indent(&self, indent_unit: &str) -> String {
        self.document.render_with_indent(indent_unit)
    }
}

pub fn parse_manifest_str(input: &str) -> Result<Manifest, ManifestError> {
    Ok(Manifest::from_document(parse(input)?))
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<Manifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_manifest_str(&content)
}

/// Replace the contents of `dest` with `content`.
///
/// The text goes to a temporary file in the same directory which is then
/// renamed over `dest`, so readers see either the old or the new manifest.
/// No backup of the old contents is kept.
pub fn write_manifest_file(dest: &Path, content: &str) -> Result<(), ManifestError> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    if let Ok(meta) = fs::metadata(dest) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.persist(dest).map_err(|e| ManifestError::Io(e.error))?;
    debug!("wrote manifest {}", dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#".{
    .name = "mach",
    .version = "0.2.0",
    .dependencies = .{
        .mach_ecs = .{
            .url = "https://example.org/mach-ecs/archive/abc123.tar.gz",
            .hash = "1220aaaa...",
        },
        .mach_sysaudio = .{
            .url = "https://example.org/mach-sysaudio/archive/def456.tar.gz",
        },
    },
}
"#;

    fn new_hash() -> PackageHash {
        PackageHash::from_hex_digest(&"ab".repeat(32)).unwrap()
    }

    #[test]
    fn lists_dependencies_in_order() {
        let m = parse_manifest_str(MANIFEST).unwrap();
        let deps = m.dependencies().unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].name, "mach_ecs");
        assert_eq!(deps[0].hash.as_deref(), Some("1220aaaa..."));
        assert_eq!(deps[1].name, "mach_sysaudio");
        assert_eq!(deps[1].hash, None);
        assert!(deps[1].url.as_deref().unwrap().ends_with("def456.tar.gz"));
    }

    #[test]
    fn no_dependencies_field_means_none() {
        let m = parse_manifest_str(".{ .name = \"x\" }").unwrap();
        assert!(m.dependencies().unwrap().is_empty());
        assert!(matches!(
            m.dependency("a"),
            Err(ManifestError::UnknownDependency(_))
        ));
    }

    #[test]
    fn dependencies_must_be_object() {
        let m = parse_manifest_str(".{ .dependencies = \"x\" }").unwrap();
        assert!(matches!(
            m.dependencies(),
            Err(ManifestError::NotAnObject(_))
        ));
        let m = parse_manifest_str(".{ .dependencies = .{ .a = \"x\" } }").unwrap();
        assert!(matches!(
            m.dependencies(),
            Err(ManifestError::NotAnObject(p)) if p == "dependencies.a"
        ));
    }

    #[test]
    fn url_must_be_string() {
        let m = parse_manifest_str(".{ .dependencies = .{ .a = .{ .url = .{} } } }").unwrap();
        assert!(matches!(m.dependency("a"), Err(ManifestError::NotAString(_))));
    }

    #[test]
    fn require_url_reports_missing_field() {
        let m = parse_manifest_str(".{ .dependencies = .{ .a = .{ .hash = \"h\" } } }").unwrap();
        let dep = m.dependency("a").unwrap();
        let err = dep.require_url().unwrap_err();
        assert!(err.to_string().contains("'url'"));
    }

    #[test]
    fn set_hash_replaces_existing_value() {
        let mut m = parse_manifest_str(MANIFEST).unwrap();
        let previous = m.set_dependency_hash("mach_ecs", &new_hash()).unwrap();
        assert_eq!(previous.as_deref(), Some("1220aaaa..."));
        assert_eq!(
            m.dependency("mach_ecs").unwrap().hash.as_deref(),
            Some(new_hash().as_str())
        );
        let rendered = m.render();
        assert!(rendered.contains(&format!(".hash = \"{}\",", new_hash())));
        assert!(!rendered.contains("1220aaaa..."));
    }

    #[test]
    fn set_hash_inserts_after_url() {
        let mut m = parse_manifest_str(
            ".{ .dependencies = .{ .a = .{ .url = \"u\", .lazy = \"true\" } } }",
        )
        .unwrap();
        assert_eq!(m.set_dependency_hash("a", &new_hash()).unwrap(), None);
        let dep = m.document().lookup(&["dependencies", "a"]).unwrap();
        let names: Vec<_> = m
            .document()
            .fields(dep)
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, ["url", "hash", "lazy"]);
    }

    #[test]
    fn set_hash_appends_without_url() {
        let mut m = parse_manifest_str(".{ .dependencies = .{ .a = .{ .path = \"p\" } } }").unwrap();
        m.set_dependency_hash("a", &new_hash()).unwrap();
        let dep = m.document().lookup(&["dependencies", "a"]).unwrap();
        assert_eq!(m.document().fields(dep)[1].name, "hash");
    }

    #[test]
    fn set_hash_on_unknown_dependency_leaves_document_alone() {
        let mut m = parse_manifest_str(MANIFEST).unwrap();
        let before = m.clone();
        assert!(m.set_dependency_hash("nope", &new_hash()).is_err());
        assert_eq!(m, before);
    }

    #[test]
    fn set_hash_rejects_object_hash_field() {
        let mut m = parse_manifest_str(".{ .dependencies = .{ .a = .{ .hash = .{} } } }").unwrap();
        let before = m.clone();
        assert!(matches!(
            m.set_dependency_hash("a", &new_hash()),
            Err(ManifestError::NotAString(_))
        ));
        assert_eq!(m, before);
    }

    #[test]
    fn other_fields_survive_edit() {
        let mut m = parse_manifest_str(MANIFEST).unwrap();
        m.set_dependency_hash("mach_sysaudio", &new_hash()).unwrap();
        let again = parse_manifest_str(&m.render()).unwrap();
        let name = again.document().lookup(&["name"]).unwrap();
        assert_eq!(again.document().leaf(name), Some("mach"));
        assert_eq!(again.dependencies().unwrap().len(), 2);
    }

    #[test]
    fn dependency_serializes_to_json() {
        let m = parse_manifest_str(MANIFEST).unwrap();
        let json = serde_json::to_value(m.dependency("mach_ecs").unwrap()).unwrap();
        assert_eq!(json["name"], "mach_ecs");
        assert_eq!(json["hash"], "1220aaaa...");
    }

    #[test]
    fn write_manifest_file_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.zig.zon");
        fs::write(&path, "old").unwrap();
        write_manifest_file(&path, ".{\n}\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), ".{\n}\n");
        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn parse_manifest_file_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_manifest_file(dir.path().join("missing.zon")).unwrap_err();
        assert!(matches!(err, ManifestError::Io(_)));
    }
}
