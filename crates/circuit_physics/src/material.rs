//! Surface response of a collider

use rapier3d::prelude as rapier;
use serde::{Deserialize, Serialize};

/// Friction, bounce and mass of a collider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsMaterial {
    pub friction: f32,
    /// 0 absorbs every impact, 1 bounces back at full speed
    pub restitution: f32,
    /// kg/m³, used when no explicit mass is given
    pub density: f32,
    /// Collider mass in kg; replaces the density-derived mass
    pub mass: Option<f32>,
    pub friction_combine: CombineRule,
    pub restitution_combine: CombineRule,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.0,
            density: 1.0,
            mass: None,
            friction_combine: CombineRule::Average,
            restitution_combine: CombineRule::Average,
        }
    }
}

impl PhysicsMaterial {
    pub fn new(friction: f32, restitution: f32) -> Self {
        Self::default().with_friction(friction).with_restitution(restitution)
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction.max(0.0);
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution.clamp(0.0, 1.0);
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass.max(0.001));
        self
    }

    pub fn with_friction_combine(mut self, rule: CombineRule) -> Self {
        self.friction_combine = rule;
        self
    }
}

/// How two colliders' coefficients merge at a contact.
///
/// When the two sides ask for different rules the solver takes the later
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CombineRule {
    #[default]
    Average,
    Min,
    Multiply,
    Max,
}

impl From<CombineRule> for rapier::CoefficientCombineRule {
    fn from(rule: CombineRule) -> Self {
        match rule {
            CombineRule::Average => Self::Average,
            CombineRule::Min => Self::Min,
            CombineRule::Multiply => Self::Multiply,
            CombineRule::Max => Self::Max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_average_both_coefficients() {
        let m = PhysicsMaterial::default();
        assert_eq!(m.friction_combine, CombineRule::Average);
        assert_eq!(m.restitution_combine, CombineRule::Average);
        assert_eq!(m.mass, None);
    }

    #[test]
    fn test_combine_rule_maps_to_solver() {
        let rule: rapier::CoefficientCombineRule = CombineRule::Min.into();
        assert_eq!(rule, rapier::CoefficientCombineRule::Min);
        let rule: rapier::CoefficientCombineRule = CombineRule::Max.into();
        assert_eq!(rule, rapier::CoefficientCombineRule::Max);
    }

    #[test]
    fn test_inputs_are_clamped() {
        let m = PhysicsMaterial::new(-1.0, 3.0).with_mass(-5.0);
        assert_eq!(m.friction, 0.0);
        assert_eq!(m.restitution, 1.0);
        assert_eq!(m.mass, Some(0.001));
    }
}
