//! Model loading boundary.
//!
//! A loaded model is a mapping from node name to mesh geometry. The scene
//! consumes one named entry to build its terrain; everything else in the
//! file is ignored. Parsing is delegated to the `gltf` crate.
//!
//! # Invariants
//! - Every returned mesh has positions and a triangle index list whose
//!   indices are in range.

use glam::Mat4;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Triangle geometry of one named node, in the node's local space.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    /// Triangle list.
    pub indices: Vec<u32>,
    /// The node's local transform.
    pub transform: Mat4,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Mesh geometry keyed by node name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelNodes {
    nodes: BTreeMap<String, MeshData>,
}

impl ModelNodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, mesh: MeshData) {
        self.nodes.insert(name.into(), mesh);
    }

    pub fn get(&self, name: &str) -> Option<&MeshData> {
        self.nodes.get(name)
    }

    /// Node names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("node {node:?} primitive {primitive} has no POSITION attribute")]
    MissingPositions { node: String, primitive: usize },
    #[error("node {node:?} uses unsupported primitive mode {mode}")]
    UnsupportedTopology { node: String, mode: String },
    #[error("node {node:?} index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        node: String,
        index: u32,
        vertex_count: usize,
    },
}

/// Resolves an asset identifier to its named meshes.
pub trait ModelLoader {
    fn load(&self, id: &str) -> Result<ModelNodes, AssetError>;
}

/// Loads `.gltf`/`.glb` files relative to a root directory.
#[derive(Debug, Clone)]
pub struct GltfLoader {
    root: PathBuf,
}

impl GltfLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Parse a model held in memory. External buffer URIs are not resolved.
    pub fn load_slice(bytes: &[u8]) -> Result<ModelNodes, AssetError> {
        let (document, buffers, _images) = gltf::import_slice(bytes)?;
        collect_nodes(&document, &buffers)
    }

    pub fn load_path(path: impl AsRef<Path>) -> Result<ModelNodes, AssetError> {
        let path = path.as_ref();
        let (document, buffers, _images) = gltf::import(path)?;
        let nodes = collect_nodes(&document, &buffers)?;
        tracing::info!("loaded {} mesh nodes from {}", nodes.len(), path.display());
        Ok(nodes)
    }
}

impl ModelLoader for GltfLoader {
    fn load(&self, id: &str) -> Result<ModelNodes, AssetError> {
        Self::load_path(self.root.join(id))
    }
}

fn collect_nodes(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<ModelNodes, AssetError> {
    let mut nodes = ModelNodes::new();
    for node in document.nodes() {
        let Some(mesh) = node.mesh() else {
            continue;
        };
        let name = match node.name().or_else(|| mesh.name()) {
            Some(name) => name.to_string(),
            None => format!("node_{}", node.index()),
        };

        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();
        for (i, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                return Err(AssetError::UnsupportedTopology {
                    node: name,
                    mode: format!("{:?}", primitive.mode()),
                });
            }
            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
            let base = positions.len();
            let prim_positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or_else(|| AssetError::MissingPositions {
                    node: name.clone(),
                    primitive: i,
                })?
                .collect();
            let count = prim_positions.len();
            positions.extend(prim_positions);

            match reader.read_indices() {
                Some(read) => {
                    for index in read.into_u32() {
                        if index as usize >= count {
                            return Err(AssetError::IndexOutOfRange {
                                node: name,
                                index,
                                vertex_count: count,
                            });
                        }
                        indices.push((base + index as usize) as u32);
                    }
                }
                None => indices.extend((base..base + count).map(|i| i as u32)),
            }
        }

        tracing::debug!(
            "node {name}: {} vertices, {} triangles",
            positions.len(),
            indices.len() / 3
        );
        nodes.insert(
            name,
            MeshData {
                positions,
                indices,
                transform: Mat4::from_cols_array_2d(&node.transform().matrix()),
            },
        );
    }
    Ok(nodes)
}

pub fn crate_info() -> &'static str {
    "neoleon-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    /// One triangle with u16 indices, embedded as a data URI.
    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 1] }],
        "nodes": [
            { "name": "EXPORT_GOOGLE_SAT_WM", "mesh": 0, "translation": [1.0, 2.0, 3.0] },
            { "name": "Camera" }
        ],
        "meshes": [{
            "name": "terrain",
            "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }]
        }],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 0.0, 1.0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
        ],
        "buffers": [{
            "byteLength": 44,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAAAAAAIA/AAABAAIAAAA="
        }]
    }"#;

    #[test]
    fn loads_named_mesh_node() {
        let nodes = GltfLoader::load_slice(TRIANGLE_GLTF.as_bytes()).unwrap();
        assert_eq!(nodes.len(), 1);
        let mesh = nodes.get("EXPORT_GOOGLE_SAT_WM").unwrap();
        assert_eq!(mesh.positions.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.positions[1], [1.0, 0.0, 0.0]);
        assert_eq!(
            mesh.transform.transform_point3(Vec3::ZERO),
            Vec3::new(1.0, 2.0, 3.0)
        );
    }

    #[test]
    fn nodes_without_mesh_are_skipped() {
        let nodes = GltfLoader::load_slice(TRIANGLE_GLTF.as_bytes()).unwrap();
        assert!(nodes.get("Camera").is_none());
        assert_eq!(nodes.names().collect::<Vec<_>>(), vec!["EXPORT_GOOGLE_SAT_WM"]);
    }

    #[test]
    fn loader_resolves_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cerro.gltf"), TRIANGLE_GLTF).unwrap();
        let loader = GltfLoader::new(dir.path());
        let nodes = loader.load("cerro.gltf").unwrap();
        assert!(nodes.get("EXPORT_GOOGLE_SAT_WM").is_some());
    }

    #[test]
    fn missing_file_is_an_error() {
        let loader = GltfLoader::new("/nonexistent");
        assert!(loader.load("nothing.glb").is_err());
    }

    #[test]
    fn garbage_is_a_gltf_error() {
        let err = GltfLoader::load_slice(b"not a model").unwrap_err();
        assert!(matches!(err, AssetError::Gltf(_)));
    }
}
