use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use glam::Vec3;

use crate::math::CatmullRomCurve;
use crate::mesh::Mesh;
use crate::types::Vertex;

/// Entries in the sampled frame table
pub const FRAME_SAMPLES: usize = 1024;
/// Shift along the spine applied to every vertex's x before mapping to the path
pub const SPINE_OFFSET: f32 = 161.0;

// accumulated per-tick increments land a hair short of whole laps
const WRAP_EPSILON: f64 = 1e-9;

/// Position and orientation of the path at one parameter value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPose {
    pub position: Vec3,
    pub tangent: Vec3,
    pub normal: Vec3,
    pub binormal: Vec3,
}

/// Curve sampled at arc-length-uniform steps, first entry equal to the last
#[derive(Debug, Clone)]
struct FrameTable {
    positions: Vec<Vec3>,
    tangents: Vec<Vec3>,
    normals: Vec<Vec3>,
    binormals: Vec<Vec3>,
}

impl FrameTable {
    fn sample(curve: &CatmullRomCurve, samples: usize) -> Self {
        let segments = samples.max(2) - 1;
        let frames = curve.frenet_frames(segments);
        Self {
            positions: curve.spaced_points(segments),
            tangents: frames.tangents,
            normals: frames.normals,
            binormals: frames.binormals,
        }
    }

    fn pose(&self, mt: f32) -> PathPose {
        let last = self.positions.len() - 1;
        let x = mt.clamp(0.0, 1.0) * last as f32;
        let i = (x.floor() as usize).min(last);
        let j = (i + 1).min(last);
        let f = x - i as f32;

        PathPose {
            position: self.positions[i].lerp(self.positions[j], f),
            tangent: self.tangents[i].lerp(self.tangents[j], f).normalize_or_zero(),
            normal: self.normals[i].lerp(self.normals[j], f).normalize_or_zero(),
            binormal: self.binormals[i].lerp(self.binormals[j], f).normalize_or_zero(),
        }
    }
}

struct FlowState {
    table: FrameTable,
    spine_length: f32,
    path_segment: f32,
    offset: Cell<f64>,
    laps: Cell<u64>,
}

/// Bends a mesh along a closed curve and moves it by a 1-D path offset.
///
/// There is exactly one `CurveFlow` per animated object; it is the only
/// thing that can advance the offset. Readers (the scene, the renderer) hold
/// [`FlowView`]s onto the same state.
pub struct CurveFlow {
    state: Rc<FlowState>,
}

/// Read-only handle onto a [`CurveFlow`]'s current pose
#[derive(Clone)]
pub struct FlowView {
    state: Rc<FlowState>,
}

impl CurveFlow {
    pub fn new(curve: &CatmullRomCurve) -> Self {
        Self::with_samples(curve, FRAME_SAMPLES)
    }

    pub fn with_samples(curve: &CatmullRomCurve, samples: usize) -> Self {
        let spine_length = curve.length();
        log::debug!("curve flow over {:.3} units, {} samples", spine_length, samples);

        Self {
            state: Rc::new(FlowState {
                table: FrameTable::sample(curve, samples),
                spine_length,
                path_segment: 1.0,
                offset: Cell::new(0.0),
                laps: Cell::new(0),
            }),
        }
    }

    /// Advance along the path; the offset wraps into [0, 1) and every
    /// forward crossing of 1 counts a lap
    pub fn move_along_curve(&mut self, amount: f64) {
        let next = self.state.offset.get() + amount;
        let wraps = (next + WRAP_EPSILON).floor();
        let wrapped = (next - wraps).max(0.0);

        if wraps >= 1.0 {
            self.state.laps.set(self.state.laps.get() + wraps as u64);
        }
        self.state.offset.set(wrapped);
    }

    pub fn view(&self) -> FlowView {
        FlowView {
            state: Rc::clone(&self.state),
        }
    }

    pub fn offset(&self) -> f64 {
        self.state.offset.get()
    }

    pub fn laps(&self) -> u64 {
        self.state.laps.get()
    }
}

impl FlowView {
    pub fn offset(&self) -> f64 {
        self.state.offset.get()
    }

    pub fn laps(&self) -> u64 {
        self.state.laps.get()
    }

    pub fn spine_length(&self) -> f32 {
        self.state.spine_length
    }

    /// Path parameter a vertex at spine coordinate `x` maps to
    pub fn path_parameter(&self, x: f32) -> f32 {
        let state = &self.state;
        let spine_portion = if state.spine_length > 0.0 {
            (x + SPINE_OFFSET) / state.spine_length
        } else {
            0.0
        };
        let mt = spine_portion as f64 * state.path_segment as f64 + state.offset.get();
        mt.rem_euclid(1.0) as f32
    }

    pub fn pose_at(&self, mt: f32) -> PathPose {
        self.state.table.pose(mt)
    }

    /// Map one vertex onto the path: x picks the place along the spine,
    /// y and z become offsets along the path's normal and binormal
    pub fn deform_vertex(&self, vertex: &Vertex) -> Vertex {
        let [x, y, z] = vertex.position;
        let pose = self.pose_at(self.path_parameter(x));

        let position = pose.normal * y + pose.binormal * z + pose.position;
        let n = Vec3::from_array(vertex.normal);
        let normal = (pose.tangent * n.x + pose.normal * n.y + pose.binormal * n.z).normalize_or_zero();

        Vertex::new(position.to_array(), normal.to_array(), vertex.color)
    }

    /// Deform a whole mesh into `out`, reusing its allocation
    pub fn deform_into(&self, mesh: &Mesh, out: &mut Vec<Vertex>) {
        out.clear();
        out.extend(mesh.vertices.iter().map(|v| self.deform_vertex(v)));
    }
}

impl fmt::Debug for CurveFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurveFlow")
            .field("offset", &self.offset())
            .field("laps", &self.laps())
            .finish()
    }
}

impl fmt::Debug for FlowView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowView")
            .field("offset", &self.offset())
            .field("spine_length", &self.spine_length())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn ring() -> CatmullRomCurve {
        let points = (0..32)
            .map(|i| {
                let a = 0.3 + i as f32 / 32.0 * TAU;
                Vec3::new(a.sin(), 0.0, a.cos())
            })
            .collect();
        CatmullRomCurve::closed(points).unwrap()
    }

    #[test]
    fn view_sees_moves() {
        let mut flow = CurveFlow::with_samples(&ring(), 128);
        let view = flow.view();
        flow.move_along_curve(0.25);
        assert!((view.offset() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn wraps_and_counts_laps() {
        let mut flow = CurveFlow::with_samples(&ring(), 64);
        flow.move_along_curve(0.75);
        flow.move_along_curve(0.5);
        assert!((flow.offset() - 0.25).abs() < 1e-12);
        assert_eq!(flow.laps(), 1);

        flow.move_along_curve(2.0);
        assert_eq!(flow.laps(), 3);
    }

    #[test]
    fn backwards_wraps_without_laps() {
        let mut flow = CurveFlow::with_samples(&ring(), 64);
        flow.move_along_curve(-0.25);
        assert!((flow.offset() - 0.75).abs() < 1e-12);
        assert_eq!(flow.laps(), 0);
    }

    #[test]
    fn spine_length_is_curve_length() {
        let curve = ring();
        let flow = CurveFlow::with_samples(&curve, 64);
        assert_eq!(flow.view().spine_length(), curve.length());
    }

    #[test]
    fn pose_stays_on_curve() {
        let curve = ring();
        let view = CurveFlow::with_samples(&curve, 256).view();
        for k in 0..10 {
            let u = k as f32 / 10.0;
            let pose = view.pose_at(u);
            assert!(pose.position.distance(curve.point_at(u)) < 1e-2);
            assert!((pose.position.length() - 1.0).abs() < 2e-2);
        }
    }

    #[test]
    fn spine_vertex_lands_on_path() {
        let view = CurveFlow::with_samples(&ring(), 256).view();
        let vertex = Vertex::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0; 3]);
        let deformed = view.deform_vertex(&vertex);
        let pose = view.pose_at(view.path_parameter(0.0));
        assert!(Vec3::from_array(deformed.position).distance(pose.position) < 1e-6);
        // y follows the path normal, vertical on a flat ring
        assert!(deformed.normal[1].abs() > 0.99);
    }

    #[test]
    fn offset_moves_the_mesh() {
        let mut flow = CurveFlow::with_samples(&ring(), 256);
        let view = flow.view();
        let mesh = Mesh::new(vec![Vertex::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0; 3])], vec![]);

        let mut before = Vec::new();
        view.deform_into(&mesh, &mut before);
        flow.move_along_curve(0.25);
        let mut after = Vec::new();
        view.deform_into(&mesh, &mut after);

        let a = Vec3::from_array(before[0].position);
        let b = Vec3::from_array(after[0].position);
        // a quarter of the way round a unit ring
        assert!((a.distance(b) - 2f32.sqrt()).abs() < 0.05);
    }
}
