//! Input loading
//!
//! Merger trees, snapshot metadata and halo catalogues are read from JSON
//! documents that mirror the nested-mapping layout produced by the tree
//! builder. Raw documents are deserialized first, then validated into the
//! typed stores.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::catalogue::HaloCatalogue;
use crate::mergertree::{HaloId, HaloRecord, MergerTree, TreeError};
use crate::snapshot::{SnapshotError, SnapshotId, SnapshotIndex};

/// Errors raised while loading input documents.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be opened.
    #[error("failed to open {}: {source}", .path.display())]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The document is not valid JSON of the expected shape.
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),

    /// A snapshot key or the time sequence is invalid.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// A halo record is inconsistent or out of range.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// A halo key is not an unsigned integer.
    #[error("invalid halo id '{key}' at snapshot {snapshot}")]
    InvalidHaloId {
        /// Snapshot holding the key.
        snapshot: SnapshotId,
        /// Key as written.
        key: String,
    },
}

/// One halo as laid out by the merger-graph builder.
#[derive(Debug, Deserialize)]
struct RawHalo {
    #[serde(rename = "current_halo_nPart")]
    particles: u64,
    #[serde(rename = "nProg")]
    n_prog: usize,
    #[serde(rename = "nDesc")]
    n_desc: usize,
    #[serde(rename = "Prog_haloIDs", default)]
    prog_ids: Vec<HaloId>,
    #[serde(rename = "Prog_nPart", default)]
    prog_particles: Vec<u64>,
    #[serde(rename = "Desc_haloIDs", default)]
    desc_ids: Vec<HaloId>,
    #[serde(rename = "Desc_nPart", default)]
    desc_particles: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct RawSnapshotMeta {
    time: f64,
}

fn open(path: &Path) -> Result<BufReader<File>, LoadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Read a merger tree document.
pub fn read_merger_tree<R: Read>(reader: R) -> Result<MergerTree, LoadError> {
    let raw: BTreeMap<String, BTreeMap<String, RawHalo>> = serde_json::from_reader(reader)?;

    let mut tree = MergerTree::new();
    for (snapshot_key, halos) in raw {
        let snapshot: SnapshotId = snapshot_key.parse()?;
        for (halo_key, halo) in halos {
            let halo_id: HaloId = halo_key.trim().parse().map_err(|_| LoadError::InvalidHaloId {
                snapshot,
                key: halo_key.clone(),
            })?;
            let record = HaloRecord::from_columns(
                halo.particles,
                halo.n_prog,
                &halo.prog_ids,
                &halo.prog_particles,
                halo.n_desc,
                &halo.desc_ids,
                &halo.desc_particles,
            )
            .map_err(|source| TreeError::Inconsistent {
                snapshot,
                halo_id,
                source,
            })?;
            tree.insert(snapshot, halo_id, record);
        }
    }
    Ok(tree)
}

/// Read snapshot metadata (`{"000": {"time": ...}, ...}`) into an index.
pub fn read_snapshot_index<R: Read>(reader: R) -> Result<SnapshotIndex, LoadError> {
    let raw: BTreeMap<String, RawSnapshotMeta> = serde_json::from_reader(reader)?;
    let mut times = BTreeMap::new();
    for (key, meta) in raw {
        times.insert(key.parse::<SnapshotId>()?, meta.time);
    }
    Ok(SnapshotIndex::from_times(&times)?)
}

/// Read a halo catalogue document.
pub fn read_catalogue<R: Read>(reader: R) -> Result<HaloCatalogue, LoadError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Load a merger tree from a file.
pub fn load_merger_tree(path: impl AsRef<Path>) -> Result<MergerTree, LoadError> {
    read_merger_tree(open(path.as_ref())?)
}

/// Load snapshot metadata from a file.
pub fn load_snapshot_index(path: impl AsRef<Path>) -> Result<SnapshotIndex, LoadError> {
    read_snapshot_index(open(path.as_ref())?)
}

/// Load a halo catalogue from a file.
pub fn load_catalogue(path: impl AsRef<Path>) -> Result<HaloCatalogue, LoadError> {
    read_catalogue(open(path.as_ref())?)
}

/// Load a merger tree and check it against the snapshot index.
pub fn load_dataset(
    tree_path: impl AsRef<Path>,
    index: &SnapshotIndex,
) -> Result<MergerTree, LoadError> {
    let tree = load_merger_tree(tree_path)?;
    tree.check_range(index)?;
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mergertree::{LinkSide, RecordError};

    const TREE: &str = r#"{
        "001": {
            "7": {"current_halo_nPart": 120, "nProg": 1, "nDesc": 0,
                  "Prog_haloIDs": [3], "Prog_nPart": [100],
                  "Desc_haloIDs": [], "Desc_nPart": []}
        },
        "000": {
            "3": {"current_halo_nPart": 100, "nProg": 0, "nDesc": 1,
                  "Prog_haloIDs": [], "Prog_nPart": [],
                  "Desc_haloIDs": [7], "Desc_nPart": [120]}
        }
    }"#;

    #[test]
    fn reads_nested_tree_layout() {
        let tree = read_merger_tree(TREE.as_bytes()).unwrap();
        assert_eq!(tree.len(), 2);
        let root = tree.get("001".parse().unwrap(), 7).unwrap();
        assert_eq!(root.particles, 120);
        assert_eq!(root.main_progenitor().unwrap().id, 3);
    }

    #[test]
    fn rejects_declared_count_mismatch() {
        let doc = r#"{"000": {"1": {"current_halo_nPart": 5, "nProg": 2, "nDesc": 0,
            "Prog_haloIDs": [4], "Prog_nPart": [3]}}}"#;
        let err = read_merger_tree(doc.as_bytes()).unwrap_err();
        match err {
            LoadError::Tree(TreeError::Inconsistent { halo_id, source, .. }) => {
                assert_eq!(halo_id, 1);
                assert_eq!(
                    source,
                    RecordError::CountMismatch {
                        side: LinkSide::Progenitor,
                        declared: 2,
                        listed: 1
                    }
                );
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_keys() {
        let doc = r#"{"61": {}}"#;
        assert!(matches!(
            read_merger_tree(doc.as_bytes()),
            Err(LoadError::Snapshot(SnapshotError::InvalidId(_)))
        ));

        let doc = r#"{"000": {"x": {"current_halo_nPart": 5, "nProg": 0, "nDesc": 0}}}"#;
        assert!(matches!(
            read_merger_tree(doc.as_bytes()),
            Err(LoadError::InvalidHaloId { .. })
        ));
    }

    #[test]
    fn reads_snapshot_times_ignoring_extra_fields() {
        let doc = r#"{"000": {"time": 0.1, "redshift": 9.0}, "001": {"time": 0.2}}"#;
        let index = read_snapshot_index(doc.as_bytes()).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.time_of(index.latest()), 0.2);
    }

    #[test]
    fn reads_catalogue() {
        let doc = r#"{"hosts": [{"halo_nPart": 50, "mean_vel": [0, 0, 0],
            "Halo_Pos": [[1, 0, 0]], "Halo_Vel": [[0, 1, 0]],
            "subhalos": [{"subhalo_nPart": 20, "subhalo_mean_pos": [0.5, 0, 0],
                          "subhalo_mean_vel": [0, 0, 1]}]}]}"#;
        let catalogue = read_catalogue(doc.as_bytes()).unwrap();
        assert_eq!(catalogue.hosts.len(), 1);
        assert_eq!(catalogue.hosts[0].occupancy(), 1);
        assert_eq!(catalogue.hosts[0].subhalos[0].particles, 20);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_merger_tree("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
