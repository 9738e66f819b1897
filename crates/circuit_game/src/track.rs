//! Closed race track
//!
//! The track is a closed centripetal Catmull-Rom spline through a fixed set of
//! control points. Everything else is derived from it once, at construction:
//!
//! ```text
//!   control points ──► TrackCurve ──┬──► RoadMesh (ribbon, 2 verts / sample)
//!                                   ├──► center line samples
//!                                   ├──► BarrierSegment x 2 x segments ──► static colliders
//!                                   └──► Checkpoint x N at t = i / N
//! ```
//!
//! Spline parameter `t` runs over `[0, 1]`, one span per control point, and is
//! not arc-length normalised.

use crate::error::{GameError, Result};
use crate::transform::heading_of;
use circuit_physics::{ColliderDesc, ColliderHandle, ColliderShape, PhysicsMaterial, PhysicsWorld};
use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Collider user data for barrier boxes
pub const BARRIER_TAG: u128 = 0x2;

/// Height of the road ribbon above the ground plane
const ROAD_LIFT: f32 = 0.01;
/// Height of the painted center line
const CENTER_LINE_LIFT: f32 = 0.02;

/// Oval with curves, clockwise seen from above
pub const DEFAULT_CONTROL_POINTS: [Vec3; 14] = [
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(30.0, 0.0, 0.0),
    Vec3::new(50.0, 0.0, 10.0),
    Vec3::new(60.0, 0.0, 30.0),
    Vec3::new(60.0, 0.0, 50.0),
    Vec3::new(50.0, 0.0, 70.0),
    Vec3::new(30.0, 0.0, 80.0),
    Vec3::new(0.0, 0.0, 80.0),
    Vec3::new(-30.0, 0.0, 80.0),
    Vec3::new(-50.0, 0.0, 70.0),
    Vec3::new(-60.0, 0.0, 50.0),
    Vec3::new(-60.0, 0.0, 30.0),
    Vec3::new(-50.0, 0.0, 10.0),
    Vec3::new(-30.0, 0.0, 0.0),
];

/// Track generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// Road width
    pub width: f32,
    /// Samples along the loop for road and barriers
    pub segments: usize,
    pub barrier_height: f32,
    pub barrier_thickness: f32,
    /// Gap between road edge and barrier center line
    pub barrier_margin: f32,
    pub checkpoints: usize,
    pub barrier_friction: f32,
    pub barrier_restitution: f32,
    /// Spawn height above the start point
    pub start_height: f32,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            width: 8.0,
            segments: 100,
            barrier_height: 2.0,
            barrier_thickness: 0.5,
            barrier_margin: 0.5,
            checkpoints: 5,
            barrier_friction: 0.3,
            barrier_restitution: 0.5,
            start_height: 2.0,
        }
    }
}

impl TrackConfig {
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = segments;
        self
    }

    pub fn with_checkpoints(mut self, checkpoints: usize) -> Self {
        self.checkpoints = checkpoints;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0) {
            return Err(GameError::InvalidConfig(format!(
                "track width must be positive, got {}",
                self.width
            )));
        }
        if self.segments < 3 {
            return Err(GameError::InvalidConfig(format!(
                "track needs at least 3 segments, got {}",
                self.segments
            )));
        }
        if !(self.barrier_height > 0.0 && self.barrier_thickness > 0.0) {
            return Err(GameError::InvalidConfig("barrier dimensions must be positive".into()));
        }
        Ok(())
    }
}

/// Closed centripetal Catmull-Rom spline
#[derive(Debug, Clone, PartialEq)]
pub struct TrackCurve {
    points: Vec<Vec3>,
}

/// Cubic for one span: `c0 + c1 w + c2 w² + c3 w³`
struct Span {
    c0: Vec3,
    c1: Vec3,
    c2: Vec3,
    c3: Vec3,
}

impl Span {
    fn position(&self, w: f32) -> Vec3 {
        self.c0 + w * (self.c1 + w * (self.c2 + w * self.c3))
    }

    fn derivative(&self, w: f32) -> Vec3 {
        self.c1 + w * (2.0 * self.c2 + w * 3.0 * self.c3)
    }
}

/// Hermite coefficients for a non-uniform Catmull-Rom span from x1 to x2
fn nonuniform_coefficients(x0: f32, x1: f32, x2: f32, x3: f32, dt0: f32, dt1: f32, dt2: f32) -> [f32; 4] {
    let t1 = ((x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1) * dt1;
    let t2 = ((x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2) * dt1;
    [
        x1,
        t1,
        -3.0 * x1 + 3.0 * x2 - 2.0 * t1 - t2,
        2.0 * x1 - 2.0 * x2 + t1 + t2,
    ]
}

impl TrackCurve {
    /// Build a closed curve. Needs at least two points.
    pub fn new(points: Vec<Vec3>) -> Result<Self> {
        if points.len() < 2 {
            return Err(GameError::InvalidConfig(format!(
                "closed curve needs at least 2 control points, got {}",
                points.len()
            )));
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(GameError::InvalidConfig("control points must be finite".into()));
        }
        Ok(Self { points })
    }

    /// The default circuit layout
    pub fn default_circuit() -> Self {
        Self {
            points: DEFAULT_CONTROL_POINTS.to_vec(),
        }
    }

    pub fn control_points(&self) -> &[Vec3] {
        &self.points
    }

    fn span(&self, t: f32) -> (Span, f32) {
        let l = self.points.len();
        let p = l as f32 * t;
        let base = p.floor();
        let weight = p - base;
        let i = (base as i64).rem_euclid(l as i64) as usize;

        let p0 = self.points[(i + l - 1) % l];
        let p1 = self.points[i];
        let p2 = self.points[(i + 1) % l];
        let p3 = self.points[(i + 2) % l];

        let mut dt0 = p0.distance_squared(p1).powf(0.25);
        let mut dt1 = p1.distance_squared(p2).powf(0.25);
        let mut dt2 = p2.distance_squared(p3).powf(0.25);
        if dt1 < 1e-4 {
            dt1 = 1.0;
        }
        if dt0 < 1e-4 {
            dt0 = dt1;
        }
        if dt2 < 1e-4 {
            dt2 = dt1;
        }

        let axis = |f: fn(Vec3) -> f32| {
            nonuniform_coefficients(f(p0), f(p1), f(p2), f(p3), dt0, dt1, dt2)
        };
        let x = axis(|v: Vec3| v.x);
        let y = axis(|v: Vec3| v.y);
        let z = axis(|v: Vec3| v.z);
        let span = Span {
            c0: Vec3::new(x[0], y[0], z[0]),
            c1: Vec3::new(x[1], y[1], z[1]),
            c2: Vec3::new(x[2], y[2], z[2]),
            c3: Vec3::new(x[3], y[3], z[3]),
        };
        (span, weight)
    }

    /// Point at parameter `t`. `t = 0` and `t = 1` coincide.
    pub fn point_at(&self, t: f32) -> Vec3 {
        let (span, weight) = self.span(t);
        span.position(weight)
    }

    /// Unit tangent at parameter `t`
    pub fn tangent_at(&self, t: f32) -> Vec3 {
        let (span, weight) = self.span(t);
        span.derivative(weight).normalize_or_zero()
    }

    /// `divisions + 1` evenly spaced samples, first and last coinciding
    pub fn points(&self, divisions: usize) -> Vec<Vec3> {
        let divisions = divisions.max(1);
        (0..=divisions)
            .map(|d| self.point_at(d as f32 / divisions as f32))
            .collect()
    }
}

/// Ground-plane normal to a tangent, on the opposite side from
/// [`Transform::right`](crate::transform::Transform::right) of a body facing along it
fn ground_perpendicular(tangent: Vec3) -> Vec3 {
    Vec3::new(-tangent.z, 0.0, tangent.x).normalize_or_zero()
}

/// Road ribbon geometry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadMesh {
    pub vertices: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl RoadMesh {
    fn build(curve: &TrackCurve, segments: usize, width: f32) -> Self {
        let mut mesh = RoadMesh {
            vertices: Vec::with_capacity((segments + 1) * 2),
            uvs: Vec::with_capacity((segments + 1) * 2),
            indices: Vec::with_capacity(segments * 6),
        };
        let lift = Vec3::new(0.0, ROAD_LIFT, 0.0);

        for i in 0..=segments {
            let t = i as f32 / segments as f32;
            let point = curve.point_at(t) + lift;
            let offset = ground_perpendicular(curve.tangent_at(t)) * (width / 2.0);

            mesh.vertices.push(point + offset);
            mesh.vertices.push(point - offset);
            mesh.uvs.push(Vec2::new(0.0, t));
            mesh.uvs.push(Vec2::new(1.0, t));

            if i < segments {
                let idx = (i * 2) as u32;
                mesh.indices.extend_from_slice(&[idx, idx + 1, idx + 2]);
                mesh.indices.extend_from_slice(&[idx + 1, idx + 3, idx + 2]);
            }
        }
        mesh
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Which road edge a barrier runs along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Same side as a body's local +X when it faces along the track
    Right,
    Left,
}

impl Side {
    fn sign(self) -> f32 {
        match self {
            Side::Right => -1.0,
            Side::Left => 1.0,
        }
    }
}

/// One straight barrier box between two consecutive samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarrierSegment {
    pub side: Side,
    pub center: Vec3,
    /// Full box size: thickness, height, length
    pub size: Vec3,
    /// Rotation about +Y aligning local +Z with the segment
    pub yaw: f32,
}

impl BarrierSegment {
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }
}

/// Progress marker on the curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkpoint {
    pub index: usize,
    /// Spline parameter `index / count`
    pub t: f32,
    pub position: Vec3,
    /// Travel direction as a yaw angle
    pub heading: f32,
}

/// A generated track with its static colliders
#[derive(Debug)]
pub struct Track {
    config: TrackConfig,
    curve: TrackCurve,
    road: RoadMesh,
    center_line: Vec<Vec3>,
    barriers: Vec<BarrierSegment>,
    barrier_colliders: Vec<ColliderHandle>,
    checkpoints: Vec<Checkpoint>,
}

impl Track {
    /// Build the default circuit and register its barriers with `physics`
    pub fn new(physics: &mut PhysicsWorld, config: TrackConfig) -> Result<Self> {
        Self::with_curve(physics, TrackCurve::default_circuit(), config)
    }

    /// Build a track around a custom curve
    pub fn with_curve(physics: &mut PhysicsWorld, curve: TrackCurve, config: TrackConfig) -> Result<Self> {
        config.validate()?;
        if !physics.is_initialized() {
            return Err(GameError::PhysicsNotReady("track barriers"));
        }

        let road = RoadMesh::build(&curve, config.segments, config.width);
        let center_line = curve
            .points(config.segments * 2)
            .into_iter()
            .map(|p| p + Vec3::new(0.0, CENTER_LINE_LIFT, 0.0))
            .collect();
        let barriers = Self::build_barriers(&curve, &config);
        let checkpoints = Self::build_checkpoints(&curve, config.checkpoints);

        let material = PhysicsMaterial::new(config.barrier_friction, config.barrier_restitution);
        let mut barrier_colliders = Vec::with_capacity(barriers.len());
        for barrier in &barriers {
            let desc = ColliderDesc::new(ColliderShape::from_size(barrier.size))
                .with_pose(barrier.center, barrier.rotation())
                .with_material(material)
                .with_user_data(BARRIER_TAG);
            let handle = physics
                .create_collider(desc, None)
                .ok_or(GameError::PhysicsNotReady("track barriers"))?;
            barrier_colliders.push(handle);
        }

        log::info!(
            "Track built: {} control points, {} barrier segments, {} checkpoints",
            curve.control_points().len(),
            barriers.len(),
            checkpoints.len()
        );

        Ok(Self {
            config,
            curve,
            road,
            center_line,
            barriers,
            barrier_colliders,
            checkpoints,
        })
    }

    fn build_barriers(curve: &TrackCurve, config: &TrackConfig) -> Vec<BarrierSegment> {
        let segments = config.segments;
        let reach = config.width / 2.0 + config.barrier_margin;
        let mut barriers = Vec::with_capacity(segments * 2);

        for side in [Side::Right, Side::Left] {
            for i in 0..segments {
                let t1 = i as f32 / segments as f32;
                let t2 = (i + 1) as f32 / segments as f32;

                let offset = ground_perpendicular(curve.tangent_at(t1)) * reach * side.sign();
                let a = curve.point_at(t1) + offset;
                let b = curve.point_at(t2) + offset;

                let mut center = (a + b) * 0.5;
                center.y = config.barrier_height / 2.0;

                barriers.push(BarrierSegment {
                    side,
                    center,
                    size: Vec3::new(config.barrier_thickness, config.barrier_height, a.distance(b)),
                    yaw: heading_of(b - a),
                });
            }
        }
        barriers
    }

    fn build_checkpoints(curve: &TrackCurve, count: usize) -> Vec<Checkpoint> {
        (0..count)
            .map(|index| {
                let t = index as f32 / count as f32;
                Checkpoint {
                    index,
                    t,
                    position: curve.point_at(t),
                    heading: heading_of(curve.tangent_at(t)),
                }
            })
            .collect()
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    pub fn curve(&self) -> &TrackCurve {
        &self.curve
    }

    pub fn road_mesh(&self) -> &RoadMesh {
        &self.road
    }

    pub fn center_line(&self) -> &[Vec3] {
        &self.center_line
    }

    pub fn barriers(&self) -> &[BarrierSegment] {
        &self.barriers
    }

    pub fn barrier_colliders(&self) -> &[ColliderHandle] {
        &self.barrier_colliders
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Start point raised to spawn height
    pub fn start_position(&self) -> Vec3 {
        let start = self.curve.point_at(0.0);
        Vec3::new(start.x, self.config.start_height, start.z)
    }

    /// Travel direction at the start as a yaw angle
    pub fn start_heading(&self) -> f32 {
        heading_of(self.curve.tangent_at(0.0))
    }

    /// Closest checkpoint on the ground plane
    pub fn nearest_checkpoint(&self, position: Vec3) -> Option<&Checkpoint> {
        let flat = |v: Vec3| Vec2::new(v.x, v.z);
        self.checkpoints.iter().min_by(|a, b| {
            let da = flat(a.position).distance_squared(flat(position));
            let db = flat(b.position).distance_squared(flat(position));
            da.total_cmp(&db)
        })
    }
}
