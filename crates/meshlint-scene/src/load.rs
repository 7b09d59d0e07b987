use std::path::{Path, PathBuf};

use meshlint_types::SceneBackend;

use crate::enumerator::SceneEnumerator;
use crate::error::SceneError;
use crate::model::SceneDocument;
use crate::native::build_native;
use crate::staged::build_staged;

/// Something a runner can open a scene representation from.
pub trait SceneSource {
    /// Human-readable origin, used in receipts and logs.
    fn label(&self) -> String;

    /// Enumerate one representation. Failing here is fatal to the whole run.
    fn open(&self, backend: SceneBackend) -> Result<Box<dyn SceneEnumerator + '_>, SceneError>;
}

impl SceneDocument {
    pub fn from_json_str(text: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, SceneError> {
        Ok(toml::from_str(text)?)
    }

    /// Representations present in this document, native first.
    pub fn backends(&self) -> Vec<SceneBackend> {
        let mut out = Vec::new();
        if self.native.is_some() {
            out.push(SceneBackend::Native);
        }
        if self.stage.is_some() {
            out.push(SceneBackend::Staged);
        }
        out
    }
}

impl SceneSource for SceneDocument {
    fn label(&self) -> String {
        "<memory>".to_string()
    }

    fn open(&self, backend: SceneBackend) -> Result<Box<dyn SceneEnumerator + '_>, SceneError> {
        match backend {
            SceneBackend::Native => {
                let desc = self
                    .native
                    .as_ref()
                    .ok_or(SceneError::MissingBackend { backend })?;
                Ok(Box::new(build_native(desc)?))
            }
            SceneBackend::Staged => {
                let desc = self
                    .stage
                    .as_ref()
                    .ok_or(SceneError::MissingBackend { backend })?;
                Ok(Box::new(build_staged(desc)?))
            }
        }
    }
}

/// A scene document read from disk, with its raw bytes kept for digesting.
#[derive(Debug, Clone)]
pub struct SceneFile {
    path: PathBuf,
    bytes: Vec<u8>,
    document: SceneDocument,
}

impl SceneFile {
    /// Read a `.toml` scene as TOML and anything else as JSON.
    pub fn read(path: &Path) -> Result<Self, SceneError> {
        let bytes = std::fs::read(path).map_err(|source| SceneError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let text = std::str::from_utf8(&bytes).map_err(|source| SceneError::Encoding {
            path: path.to_path_buf(),
            source,
        })?;
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        let document = if is_toml {
            SceneDocument::from_toml_str(text)?
        } else {
            SceneDocument::from_json_str(text)?
        };
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn document(&self) -> &SceneDocument {
        &self.document
    }
}

impl SceneSource for SceneFile {
    fn label(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self, backend: SceneBackend) -> Result<Box<dyn SceneEnumerator + '_>, SceneError> {
        self.document.open(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "native": { "nodes": [ { "name": "geo" } ] }
    }"#;

    #[test]
    fn missing_section_is_a_scene_error() {
        let doc = SceneDocument::from_json_str(JSON).expect("parse");
        assert_eq!(doc.backends(), vec![SceneBackend::Native]);
        assert!(doc.open(SceneBackend::Native).is_ok());
        assert!(matches!(
            doc.open(SceneBackend::Staged),
            Err(SceneError::MissingBackend {
                backend: SceneBackend::Staged
            })
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = SceneDocument::from_json_str(r#"{ "nativ": {} }"#).unwrap_err();
        assert!(matches!(err, SceneError::Json(_)));
    }

    #[test]
    fn reads_toml_by_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scene.toml");
        std::fs::write(
            &path,
            r#"
[[stage.prims]]
name = "root"
type_name = "Xform"
"#,
        )
        .expect("write");

        let file = SceneFile::read(&path).expect("read");
        assert_eq!(file.document().backends(), vec![SceneBackend::Staged]);
        assert!(file.label().ends_with("scene.toml"));
        assert!(!file.bytes().is_empty());
        let scene = file.open(SceneBackend::Staged).expect("open");
        assert_eq!(scene.entities(true)[0].key, "/root");
    }

    #[test]
    fn invalid_utf8_is_rejected_before_parsing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scene.json");
        let mut bytes = br#"{ "native": { "nodes": [ { "name": "geo"#.to_vec();
        bytes.push(0xFF);
        bytes.extend_from_slice(br#"" } ] } }"#);
        std::fs::write(&path, bytes).expect("write");

        let err = SceneFile::read(&path).unwrap_err();
        assert!(matches!(err, SceneError::Encoding { .. }), "{err:?}");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = SceneFile::read(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, SceneError::Read { .. }));
    }
}
