//! glam <-> nalgebra conversions at the Rapier boundary

use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude as rapier;

pub(crate) fn to_vector(v: Vec3) -> rapier::Vector<f32> {
    rapier::Vector::new(v.x, v.y, v.z)
}

pub(crate) fn from_vector(v: &rapier::Vector<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub(crate) fn to_rotation(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

pub(crate) fn from_rotation(r: &UnitQuaternion<f32>) -> Quat {
    Quat::from_xyzw(r.i, r.j, r.k, r.w)
}

pub(crate) fn to_isometry(position: Vec3, rotation: Quat) -> rapier::Isometry<f32> {
    rapier::Isometry::from_parts(
        rapier::Translation::new(position.x, position.y, position.z),
        to_rotation(rotation),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rotation_survives_boundary() {
        let q = Quat::from_rotation_y(1.2);
        let back = from_rotation(&to_rotation(q));
        assert_relative_eq!(back.x, q.x, epsilon = 1e-6);
        assert_relative_eq!(back.y, q.y, epsilon = 1e-6);
        assert_relative_eq!(back.z, q.z, epsilon = 1e-6);
        assert_relative_eq!(back.w, q.w, epsilon = 1e-6);
    }

    #[test]
    fn isometry_carries_translation() {
        let iso = to_isometry(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY);
        assert_eq!(from_vector(&iso.translation.vector), Vec3::new(1.0, 2.0, 3.0));
    }
}
