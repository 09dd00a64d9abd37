use anyhow::{bail, Context, Result};
use glam::{Mat4, Quat, Vec3};
use std::path::Path;

use crate::mesh::Mesh;
use crate::types::Vertex;

/// Node tree of a decoded glTF scene. Meshes stay in node-local space.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub roots: Vec<ModelNode>,
}

#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: Option<String>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub mesh: Option<Mesh>,
    pub children: Vec<ModelNode>,
}

impl ModelNode {
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Model {
    /// First top-level node of the scene
    pub fn first_root(&self) -> Option<&ModelNode> {
        self.roots.first()
    }

    pub fn mesh_count(&self) -> usize {
        fn count(node: &ModelNode) -> usize {
            node.mesh.is_some() as usize + node.children.iter().map(count).sum::<usize>()
        }
        self.roots.iter().map(count).sum()
    }

    /// Every mesh in the tree merged into one, node transforms baked in
    pub fn flatten(&self) -> Mesh {
        fn visit(node: &ModelNode, parent: Mat4, out: &mut Mesh) {
            let world = parent * node.local_matrix();
            if let Some(mesh) = &node.mesh {
                let mut placed = mesh.clone();
                placed.apply_matrix(world);
                out.merge(&placed);
            }
            for child in &node.children {
                visit(child, world, out);
            }
        }

        let mut out = Mesh::default();
        for root in &self.roots {
            visit(root, Mat4::IDENTITY, &mut out);
        }
        out
    }
}

/// Decode a .glb or .gltf (with embedded buffers) held in memory
pub fn load_model_slice(bytes: &[u8]) -> Result<Model> {
    let (gltf, buffers, _images) = gltf::import_slice(bytes).context("Failed to decode glTF data")?;

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .context("glTF data contains no scene")?;

    log::debug!(
        "glTF decoded: {} scene(s), {} node(s), {} mesh(es)",
        gltf.scenes().count(),
        gltf.nodes().count(),
        gltf.meshes().count()
    );

    let roots = scene
        .nodes()
        .map(|node| convert_node(&node, &buffers))
        .collect::<Result<Vec<_>>>()?;

    let model = Model { roots };
    if model.mesh_count() == 0 {
        bail!("glTF scene has no triangle meshes");
    }
    Ok(model)
}

pub fn load_model_file(path: impl AsRef<Path>) -> Result<Model> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read glTF file: {:?}", path))?;
    load_model_slice(&bytes).with_context(|| format!("Failed to load glTF file: {:?}", path))
}

fn convert_node(node: &gltf::Node, buffers: &[gltf::buffer::Data]) -> Result<ModelNode> {
    let (translation, rotation, scale) = node.transform().decomposed();

    let mesh = match node.mesh() {
        Some(mesh) => convert_mesh(&mesh, buffers)?,
        None => None,
    };

    let children = node
        .children()
        .map(|child| convert_node(&child, buffers))
        .collect::<Result<Vec<_>>>()?;

    Ok(ModelNode {
        name: node.name().map(str::to_string),
        translation: Vec3::from_array(translation),
        rotation: Quat::from_array(rotation),
        scale: Vec3::from_array(scale),
        mesh,
        children,
    })
}

/// All triangle primitives of a glTF mesh merged, or `None` if it has none
fn convert_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> Result<Option<Mesh>> {
    let mut out = Mesh::default();

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::warn!("skipping {:?} primitive in mesh {:?}", primitive.mode(), mesh.name());
            continue;
        }

        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .with_context(|| format!("Mesh {:?} primitive has no positions", mesh.name()))?
            .collect();

        let factor = primitive.material().pbr_metallic_roughness().base_color_factor();
        let color = [factor[0], factor[1], factor[2]];

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            bail!("Mesh {:?} index {} out of range ({} vertices)", mesh.name(), bad, positions.len());
        }

        let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|n| n.collect());
        let has_normals = normals.as_ref().is_some_and(|n| n.len() == positions.len());

        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let normal = match &normals {
                    Some(n) if has_normals => n[i],
                    _ => [0.0; 3],
                };
                Vertex::new(*p, normal, color)
            })
            .collect();

        let mut part = Mesh::new(vertices, indices);
        if !has_normals {
            part.compute_vertex_normals();
        }
        out.merge(&part);
    }

    if out.is_empty() {
        return Ok(None);
    }
    if let Some(name) = mesh.name() {
        out = out.with_name(name);
    }
    Ok(Some(out))
}
