use glam::{Mat4, Quat, Vec3};

use crate::camera::PerspectiveCamera;
use crate::config::SceneSettings;
use crate::flow::FlowView;
use crate::math::hex_to_linear;
use crate::mesh::Mesh;
use crate::types::GlobalsUniform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// Light source, colours in linear RGB
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Ambient { color: [f32; 3], intensity: f32 },
    /// Shines from `position` towards the origin
    Directional { color: [f32; 3], intensity: f32, position: Vec3 },
}

/// Exponential-squared fog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: [f32; 3],
    pub density: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation_scale(translation: Vec3, scale: f32) -> Self {
        Self {
            translation,
            scale: Vec3::splat(scale),
            ..Default::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[derive(Debug, Clone)]
pub enum ObjectKind {
    Static,
    /// Geometry bent along a curve every frame
    Flow(FlowView),
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    pub mesh: Mesh,
    pub transform: Transform,
    pub kind: ObjectKind,
}

impl SceneObject {
    pub fn is_flow(&self) -> bool {
        matches!(self.kind, ObjectKind::Flow(_))
    }
}

/// Everything that gets drawn: background, fog, lights and objects
#[derive(Debug, Clone)]
pub struct Scene {
    pub background: [f32; 3],
    pub fog: Option<Fog>,
    lights: Vec<Light>,
    objects: Vec<SceneObject>,
    next_id: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            background: [0.0; 3],
            fog: None,
            lights: Vec::new(),
            objects: Vec::new(),
            next_id: 0,
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Background, fog, an ambient and a directional light
    pub fn from_settings(settings: &SceneSettings) -> Self {
        let mut scene = Self::new();
        scene.background = hex_to_linear(settings.background);
        scene.fog = Some(Fog {
            color: hex_to_linear(settings.fog_color),
            density: settings.fog_density,
        });
        scene.add_light(Light::Ambient {
            color: hex_to_linear(settings.ambient_color),
            intensity: settings.ambient_intensity,
        });
        scene.add_light(Light::Directional {
            color: hex_to_linear(settings.directional_color),
            intensity: settings.directional_intensity,
            position: Vec3::from_array(settings.directional_position),
        });
        scene
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn add(&mut self, name: impl Into<String>, mesh: Mesh, transform: Transform) -> ObjectId {
        self.push(name.into(), mesh, transform, ObjectKind::Static)
    }

    /// Add a mesh that follows `flow`; its transform stays identity
    pub fn add_flow(&mut self, name: impl Into<String>, mesh: Mesh, flow: FlowView) -> ObjectId {
        self.push(name.into(), mesh, Transform::default(), ObjectKind::Flow(flow))
    }

    fn push(&mut self, name: String, mesh: Mesh, transform: Transform, kind: ObjectKind) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        log::info!(
            "scene: added {} '{}' ({} vertices, {} triangles)",
            if matches!(kind, ObjectKind::Flow(_)) { "flow mesh" } else { "mesh" },
            name,
            mesh.vertices.len(),
            mesh.triangle_count()
        );
        self.objects.push(SceneObject {
            id,
            name,
            mesh,
            transform,
            kind,
        });
        id
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn find(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Summed ambient light, premultiplied by intensity
    pub fn ambient(&self) -> Vec3 {
        self.lights
            .iter()
            .filter_map(|light| match light {
                Light::Ambient { color, intensity } => Some(Vec3::from_array(*color) * *intensity),
                _ => None,
            })
            .sum()
    }

    /// The first directional light as (direction towards the light, premultiplied colour)
    pub fn key_light(&self) -> Option<(Vec3, Vec3)> {
        self.lights.iter().find_map(|light| match light {
            Light::Directional {
                color,
                intensity,
                position,
            } => Some((position.normalize_or_zero(), Vec3::from_array(*color) * *intensity)),
            _ => None,
        })
    }

    /// Per-frame uniform block for this scene seen through `camera`
    pub fn globals(&self, camera: &PerspectiveCamera) -> GlobalsUniform {
        let (direction, light_color) = self.key_light().unwrap_or((Vec3::Y, Vec3::ZERO));
        let fog = self
            .fog
            .map(|f| [f.color[0], f.color[1], f.color[2], f.density])
            .unwrap_or([0.0; 4]);

        GlobalsUniform {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_position: camera.position.extend(1.0).to_array(),
            ambient: self.ambient().extend(0.0).to_array(),
            light_direction: direction.extend(0.0).to_array(),
            light_color: light_color.extend(0.0).to_array(),
            fog,
        }
    }
}
