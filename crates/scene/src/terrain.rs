use crate::SceneError;
use crate::geometry::wireframe_edges;
use glam::{EulerRot, Mat4, Quat, Vec3};
use neoleon_assets::ModelNodes;
use neoleon_common::TerrainConfig;

/// Wireframe terrain extracted from one named node of a loaded model.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMesh {
    pub positions: Vec<[f32; 3]>,
    /// Line list of unique triangle edges.
    pub edges: Vec<u32>,
    /// Placement transform composed with the node's own transform.
    pub model: Mat4,
    /// Linear rgb.
    pub color: [f32; 3],
}

impl TerrainMesh {
    /// Look up `config.node` in `nodes` and wrap it in the configured placement.
    ///
    /// Fails with [`SceneError::AssetShapeMismatch`] when the node is absent.
    pub fn from_model(nodes: &ModelNodes, config: &TerrainConfig) -> Result<Self, SceneError> {
        let mesh = nodes
            .get(&config.node)
            .ok_or_else(|| SceneError::AssetShapeMismatch {
                node: config.node.clone(),
                available: nodes.names().map(str::to_owned).collect(),
            })?;

        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            config.rotation_degrees.x.to_radians(),
            config.rotation_degrees.y.to_radians(),
            config.rotation_degrees.z.to_radians(),
        );
        let placement =
            Mat4::from_scale_rotation_translation(Vec3::splat(config.scale), rotation, config.position);
        let edges = wireframe_edges(&mesh.indices);
        tracing::debug!(
            "terrain {}: {} vertices, {} edges",
            config.node,
            mesh.positions.len(),
            edges.len() / 2
        );

        Ok(Self {
            positions: mesh.positions.clone(),
            edges,
            model: placement * mesh.transform,
            color: config.color.to_linear(),
        })
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neoleon_assets::MeshData;

    fn nodes() -> ModelNodes {
        let mut nodes = ModelNodes::new();
        nodes.insert(
            "EXPORT_GOOGLE_SAT_WM",
            MeshData {
                positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 1.0]],
                indices: vec![0, 1, 2, 2, 1, 3],
                transform: Mat4::IDENTITY,
            },
        );
        nodes
    }

    #[test]
    fn extracts_named_node() {
        let terrain = TerrainMesh::from_model(&nodes(), &TerrainConfig::default()).unwrap();
        assert_eq!(terrain.positions.len(), 4);
        assert_eq!(terrain.edge_count(), 5);
        let origin = terrain.model.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(40.0, -74.0, -300.0)).length() < 1e-3);
    }

    #[test]
    fn placement_scales_the_node() {
        let config = TerrainConfig {
            rotation_degrees: Vec3::ZERO,
            position: Vec3::ZERO,
            ..TerrainConfig::default()
        };
        let terrain = TerrainMesh::from_model(&nodes(), &config).unwrap();
        let corner = terrain.model.transform_point3(Vec3::new(1.0, 0.0, 1.0));
        assert!((corner - Vec3::new(50.0, 0.0, 50.0)).length() < 1e-3);
    }

    #[test]
    fn missing_node_lists_what_exists() {
        let config = TerrainConfig {
            node: "Mountains".into(),
            ..TerrainConfig::default()
        };
        match TerrainMesh::from_model(&nodes(), &config) {
            Err(SceneError::AssetShapeMismatch { node, available }) => {
                assert_eq!(node, "Mountains");
                assert_eq!(available, vec!["EXPORT_GOOGLE_SAT_WM".to_string()]);
            }
            other => panic!("expected shape mismatch, got {other:?}"),
        }
    }
}
