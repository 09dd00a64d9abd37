use anyhow::{ensure, Result};
use glam::{Quat, Vec3};

/// Samples used for the cumulative arc-length table
pub const ARC_LENGTH_DIVISIONS: usize = 200;
const TANGENT_DELTA: f32 = 1e-4;

/// Closed centripetal Catmull-Rom spline through a loop of control points.
///
/// `t` parameters are uniform in control-point index; `u` parameters are
/// uniform in arc length. Both live in [0, 1] and wrap.
#[derive(Debug, Clone)]
pub struct CatmullRomCurve {
    points: Vec<Vec3>,
    lengths: Vec<f32>,
}

/// Per-sample orientation along a curve, parallel-transported and closed
#[derive(Debug, Clone)]
pub struct FrenetFrames {
    pub tangents: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub binormals: Vec<Vec3>,
}

impl CatmullRomCurve {
    pub fn closed(points: Vec<Vec3>) -> Result<Self> {
        Self::with_divisions(points, ARC_LENGTH_DIVISIONS)
    }

    pub fn with_divisions(points: Vec<Vec3>, divisions: usize) -> Result<Self> {
        ensure!(points.len() >= 2, "a closed curve needs at least 2 points, got {}", points.len());
        ensure!(divisions > 0, "arc length divisions must be positive");

        let mut curve = Self {
            points,
            lengths: Vec::new(),
        };
        curve.lengths = curve.compute_lengths(divisions);
        Ok(curve)
    }

    pub fn control_points(&self) -> &[Vec3] {
        &self.points
    }

    /// Total arc length of the loop
    pub fn length(&self) -> f32 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Point at index-uniform parameter `t`
    pub fn point(&self, t: f32) -> Vec3 {
        let l = self.points.len() as i64;
        let p = l as f32 * t;
        let int_point = p.floor();
        let weight = p - int_point;
        let i = int_point as i64;

        let p0 = self.points[(i - 1).rem_euclid(l) as usize];
        let p1 = self.points[i.rem_euclid(l) as usize];
        let p2 = self.points[(i + 1).rem_euclid(l) as usize];
        let p3 = self.points[(i + 2).rem_euclid(l) as usize];

        centripetal_segment(p0, p1, p2, p3, weight)
    }

    /// Point at arc-length-uniform parameter `u`
    pub fn point_at(&self, u: f32) -> Vec3 {
        self.point(self.u_to_t(u))
    }

    pub fn tangent(&self, t: f32) -> Vec3 {
        let a = self.point(t - TANGENT_DELTA);
        let b = self.point(t + TANGENT_DELTA);
        (b - a).normalize_or_zero()
    }

    pub fn tangent_at(&self, u: f32) -> Vec3 {
        self.tangent(self.u_to_t(u))
    }

    /// `divisions + 1` points evenly spaced by arc length; first and last coincide
    pub fn spaced_points(&self, divisions: usize) -> Vec<Vec3> {
        (0..=divisions)
            .map(|d| self.point_at(d as f32 / divisions as f32))
            .collect()
    }

    /// Map arc-length fraction `u` to the index parameter `t`
    pub fn u_to_t(&self, u: f32) -> f32 {
        let u = wrap_unit(u);
        let total = self.length();
        if total <= f32::EPSILON {
            return u;
        }

        let target = u * total;
        let last = self.lengths.len() - 1;

        // last index whose cumulative length is <= target
        let i = self.lengths.partition_point(|&len| len <= target).saturating_sub(1).min(last);
        if self.lengths[i] == target || i == last {
            return i as f32 / last as f32;
        }

        let before = self.lengths[i];
        let segment = self.lengths[i + 1] - before;
        let fraction = if segment > 0.0 { (target - before) / segment } else { 0.0 };

        (i as f32 + fraction) / last as f32
    }

    /// Frames at `segments + 1` arc-length-uniform samples, twist-corrected for a loop
    pub fn frenet_frames(&self, segments: usize) -> FrenetFrames {
        let segments = segments.max(1);
        let tangents: Vec<Vec3> = (0..=segments)
            .map(|i| self.tangent_at(i as f32 / segments as f32))
            .collect();

        let mut normals = vec![Vec3::ZERO; segments + 1];
        let mut binormals = vec![Vec3::ZERO; segments + 1];

        normals[0] = initial_normal(tangents[0]);
        binormals[0] = tangents[0].cross(normals[0]);

        for i in 1..=segments {
            let mut normal = normals[i - 1];
            let axis = tangents[i - 1].cross(tangents[i]);
            if axis.length() > f32::EPSILON {
                let theta = tangents[i - 1].dot(tangents[i]).clamp(-1.0, 1.0).acos();
                normal = Quat::from_axis_angle(axis.normalize(), theta) * normal;
            }
            normals[i] = normal;
            binormals[i] = tangents[i].cross(normal);
        }

        // spread the leftover twist so the last frame meets the first
        let mut theta = normals[0].dot(normals[segments]).clamp(-1.0, 1.0).acos() / segments as f32;
        if tangents[0].dot(normals[0].cross(normals[segments])) > 0.0 {
            theta = -theta;
        }
        for i in 1..=segments {
            normals[i] = Quat::from_axis_angle(tangents[i], theta * i as f32) * normals[i];
            binormals[i] = tangents[i].cross(normals[i]);
        }

        FrenetFrames {
            tangents,
            normals,
            binormals,
        }
    }

    fn compute_lengths(&self, divisions: usize) -> Vec<f32> {
        let mut lengths = Vec::with_capacity(divisions + 1);
        let mut last = self.point(0.0);
        let mut sum = 0.0;
        lengths.push(0.0);

        for p in 1..=divisions {
            let current = self.point(p as f32 / divisions as f32);
            sum += current.distance(last);
            lengths.push(sum);
            last = current;
        }

        lengths
    }
}

/// Wrap any parameter into [0, 1); exactly 1.0 stays 1.0 so the end point is reachable
fn wrap_unit(u: f32) -> f32 {
    if (0.0..=1.0).contains(&u) {
        u
    } else {
        u.rem_euclid(1.0)
    }
}

fn initial_normal(tangent: Vec3) -> Vec3 {
    let abs = tangent.abs();
    let mut min = f32::MAX;
    let mut axis = Vec3::X;
    if abs.x <= min {
        min = abs.x;
        axis = Vec3::X;
    }
    if abs.y <= min {
        min = abs.y;
        axis = Vec3::Y;
    }
    if abs.z <= min {
        axis = Vec3::Z;
    }

    let side = tangent.cross(axis).normalize_or_zero();
    tangent.cross(side)
}

/// Non-uniform Catmull-Rom segment between p1 and p2 with centripetal knots
fn centripetal_segment(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let mut dt0 = p0.distance_squared(p1).powf(0.25);
    let mut dt1 = p1.distance_squared(p2).powf(0.25);
    let mut dt2 = p2.distance_squared(p3).powf(0.25);

    // coincident points
    if dt1 < 1e-4 {
        dt1 = 1.0;
    }
    if dt0 < 1e-4 {
        dt0 = dt1;
    }
    if dt2 < 1e-4 {
        dt2 = dt1;
    }

    let t1 = ((p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1) * dt1;
    let t2 = ((p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2) * dt1;

    let c0 = p1;
    let c1 = t1;
    let c2 = -3.0 * p1 + 3.0 * p2 - 2.0 * t1 - t2;
    let c3 = 2.0 * p1 - 2.0 * p2 + t1 + t2;

    c0 + c1 * t + c2 * (t * t) + c3 * (t * t * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn circle(count: usize, radius: f32) -> Vec<Vec3> {
        (0..count)
            .map(|i| {
                // start off-axis so the first tangent has no exactly-zero component
                let a = 0.3 + i as f32 / count as f32 * TAU;
                Vec3::new(a.sin() * radius, 0.0, a.cos() * radius)
            })
            .collect()
    }

    #[test]
    fn rejects_degenerate_input() {
        assert!(CatmullRomCurve::closed(vec![Vec3::ZERO]).is_err());
        assert!(CatmullRomCurve::with_divisions(circle(8, 1.0), 0).is_err());
    }

    #[test]
    fn passes_through_control_points() {
        let points = circle(8, 2.0);
        let curve = CatmullRomCurve::closed(points.clone()).unwrap();

        for (i, p) in points.iter().enumerate() {
            let on_curve = curve.point(i as f32 / points.len() as f32);
            assert!(on_curve.distance(*p) < 1e-4, "point {} off curve", i);
        }
    }

    #[test]
    fn closed_curve_is_periodic() {
        let curve = CatmullRomCurve::closed(circle(12, 1.0)).unwrap();
        assert!(curve.point(0.0).distance(curve.point(1.0)) < 1e-4);
        assert!(curve.point(0.25).distance(curve.point(1.25)) < 1e-4);
        assert!(curve.point_at(0.0).distance(curve.point_at(1.0)) < 1e-4);
    }

    #[test]
    fn length_of_circle() {
        let curve = CatmullRomCurve::closed(circle(64, 1.0)).unwrap();
        assert!((curve.length() - TAU).abs() < 0.01);
    }

    #[test]
    fn u_to_t_is_monotonic() {
        let points = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let curve = CatmullRomCurve::closed(points).unwrap();

        let mut last = -1.0;
        for i in 0..=50 {
            let t = curve.u_to_t(i as f32 / 50.0);
            assert!(t >= last);
            last = t;
        }
        assert!((curve.u_to_t(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn spaced_points_are_evenly_spaced() {
        let curve = CatmullRomCurve::closed(circle(32, 1.0)).unwrap();
        let points = curve.spaced_points(16);
        assert_eq!(points.len(), 17);

        let gaps: Vec<f32> = points.windows(2).map(|w| w[0].distance(w[1])).collect();
        let mean = gaps.iter().sum::<f32>() / gaps.len() as f32;
        for gap in gaps {
            assert!((gap - mean).abs() < mean * 0.05);
        }
    }

    #[test]
    fn frames_are_orthonormal() {
        let curve = CatmullRomCurve::closed(circle(24, 1.0)).unwrap();
        let frames = curve.frenet_frames(64);
        assert_eq!(frames.tangents.len(), 65);

        for i in 0..=64 {
            let (t, n, b) = (frames.tangents[i], frames.normals[i], frames.binormals[i]);
            assert!((t.length() - 1.0).abs() < 1e-3);
            assert!((n.length() - 1.0).abs() < 1e-3);
            assert!(t.dot(n).abs() < 1e-3);
            assert!(t.dot(b).abs() < 1e-3);
            assert!(n.dot(b).abs() < 1e-3);
        }
    }

    #[test]
    fn closed_frames_meet() {
        let curve = CatmullRomCurve::closed(circle(24, 1.0)).unwrap();
        let frames = curve.frenet_frames(128);
        assert!(frames.normals[0].distance(frames.normals[128]) < 1e-2);
    }

    #[test]
    fn planar_loop_normal_is_vertical() {
        let curve = CatmullRomCurve::closed(circle(24, 1.0)).unwrap();
        let frames = curve.frenet_frames(32);
        for n in &frames.normals {
            assert!(n.y.abs() > 0.99);
        }
    }
}
