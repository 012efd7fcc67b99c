use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{CoreError, Result};

/// Serialization format of a repository's persisted file index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Codec {
    #[default]
    Json,
    Messagepack,
}

impl Codec {
    pub fn toggled(self) -> Self {
        match self {
            Codec::Json => Codec::Messagepack,
            Codec::Messagepack => Codec::Json,
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Codec::Json => write!(f, "JSON"),
            Codec::Messagepack => write!(f, "MESSAGEPACK"),
        }
    }
}

/// A registered directory tree tracked for indexing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoDescriptor {
    pub name: String,
    pub absolute_path: String,
    #[serde(default)]
    pub indices: u32,
    #[serde(default)]
    pub codec: Codec,
    #[serde(default)]
    pub compressed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<RepoStats>,
}

impl RepoDescriptor {
    /// Compression only means something for the packed codec
    pub fn is_compressed(&self) -> bool {
        self.codec == Codec::Messagepack && self.compressed
    }
}

impl std::fmt::Display for RepoDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.absolute_path)
    }
}

/// Index statistics reported by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoStats {
    #[serde(default)]
    pub file_count: u64,
    #[serde(default)]
    pub total_size: u64,
    #[serde(default)]
    pub mime_types: BTreeMap<String, u64>,
}

/// Request body for creating a repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRepo {
    pub name: String,
    pub absolute_path: String,
    pub indices: u32,
    pub codec: Codec,
    pub compressed: bool,
}

impl NewRepo {
    /// Validate raw form input. Failures here never reach the error queue.
    pub fn from_form(
        name: &str,
        path: &str,
        indices: &str,
        codec: Codec,
        compressed: bool,
    ) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::EmptyRepoName);
        }
        let path = path.trim();
        if path.is_empty() {
            return Err(CoreError::EmptyRepoPath);
        }
        let indices = match indices.trim() {
            "" => 1,
            raw => raw.parse::<u32>().map_err(|_| CoreError::InvalidIndices {
                value: raw.to_string(),
            })?,
        };

        Ok(Self {
            name: name.to_string(),
            absolute_path: path.to_string(),
            indices,
            codec,
            compressed: codec == Codec::Messagepack && compressed,
        })
    }
}

/// A file inside a repository's index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    #[serde(alias = "p")]
    pub relative_path: String,
    #[serde(default, alias = "s")]
    pub size: u64,
    #[serde(alias = "h", alias = "hash")]
    pub content_hash: String,
}

/// One member of a duplicate group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateEntry {
    #[serde(alias = "repository")]
    pub repo: RepoDescriptor,
    pub file: FileDescriptor,
}

/// Files sharing identical content, possibly across repositories
pub type DuplicateGroup = Vec<DuplicateEntry>;

/// Subdirectories of one filesystem location, offered for picking a repo path
#[derive(Debug, Clone, PartialEq)]
pub struct DirListing {
    pub path: PathBuf,
    pub parent: Option<PathBuf>,
    pub entries: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults_codec_to_json() {
        let repo: RepoDescriptor =
            serde_json::from_str(r#"{"name":"music","absolutePath":"/data/music","indices":2}"#)
                .unwrap();
        assert_eq!(repo.codec, Codec::Json);
        assert!(!repo.compressed);
        assert!(repo.stats.is_none());
    }

    #[test]
    fn test_descriptor_with_stats() {
        let repo: RepoDescriptor = serde_json::from_str(
            r#"{"name":"photos","absolutePath":"/p","indices":1,"codec":"MESSAGEPACK","compressed":true,
               "stats":{"fileCount":3,"totalSize":4096,"mimeTypes":{"image/jpeg":3}}}"#,
        )
        .unwrap();
        assert!(repo.is_compressed());
        let stats = repo.stats.unwrap();
        assert_eq!(stats.file_count, 3);
        assert_eq!(stats.mime_types["image/jpeg"], 3);
    }

    #[test]
    fn test_compressed_ignored_for_json_codec() {
        let repo = RepoDescriptor {
            name: "a".into(),
            absolute_path: "/a".into(),
            indices: 1,
            codec: Codec::Json,
            compressed: true,
            stats: None,
        };
        assert!(!repo.is_compressed());
    }

    #[test]
    fn test_new_repo_validation() {
        assert!(matches!(
            NewRepo::from_form("  ", "/x", "1", Codec::Json, false),
            Err(CoreError::EmptyRepoName)
        ));
        assert!(matches!(
            NewRepo::from_form("x", "", "1", Codec::Json, false),
            Err(CoreError::EmptyRepoPath)
        ));
        assert!(matches!(
            NewRepo::from_form("x", "/x", "two", Codec::Json, false),
            Err(CoreError::InvalidIndices { .. })
        ));

        let repo = NewRepo::from_form(" music ", "/data/music", "", Codec::Json, true).unwrap();
        assert_eq!(repo.name, "music");
        assert_eq!(repo.indices, 1);
        assert!(!repo.compressed, "compression is dropped for JSON");
    }

    #[test]
    fn test_new_repo_serializes_camel_case() {
        let repo =
            NewRepo::from_form("music", "/data/music", "3", Codec::Messagepack, true).unwrap();
        let json = serde_json::to_value(&repo).unwrap();
        assert_eq!(json["absolutePath"], "/data/music");
        assert_eq!(json["codec"], "MESSAGEPACK");
        assert_eq!(json["compressed"], true);
    }

    #[test]
    fn test_file_descriptor_accepts_compact_keys() {
        let file: FileDescriptor =
            serde_json::from_str(r#"{"p":"a/b.jpg","s":12,"h":"abc"}"#).unwrap();
        assert_eq!(file.relative_path, "a/b.jpg");
        assert_eq!(file.size, 12);
        assert_eq!(file.content_hash, "abc");
    }
}
