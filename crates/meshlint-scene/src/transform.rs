use glam::{DMat4, DQuat, DVec3, EulerRot};

use crate::model::TransformDesc;

/// Tolerance for treating a decomposed transform component as identity.
pub const IDENTITY_EPSILON: f64 = 1e-9;

/// Local matrix `T * Tp * R * S * Tp⁻¹`.
///
/// Rotation order XYZ applies X first, so the composed rotation is `Rz * Ry * Rx`.
pub fn local_matrix(t: &TransformDesc) -> DMat4 {
    let translate = DVec3::from_array(t.translate);
    let pivot = DVec3::from_array(t.pivot);
    DMat4::from_translation(translate + pivot)
        * DMat4::from_quat(rotation(t))
        * DMat4::from_scale(DVec3::from_array(t.scale))
        * DMat4::from_translation(-pivot)
}

pub fn rotation(t: &TransformDesc) -> DQuat {
    let [rx, ry, rz] = t.rotate;
    DQuat::from_euler(
        EulerRot::ZYX,
        rz.to_radians(),
        ry.to_radians(),
        rx.to_radians(),
    )
}

/// World-space translation, rotation and scale of a world matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldComponents {
    pub translation: DVec3,
    pub rotation: DQuat,
    pub scale: DVec3,
}

impl WorldComponents {
    pub fn from_matrix(world: &DMat4) -> Self {
        let (scale, rotation, translation) = world.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.translation.abs_diff_eq(DVec3::ZERO, IDENTITY_EPSILON)
            && self.scale.abs_diff_eq(DVec3::ONE, IDENTITY_EPSILON)
            && (self.rotation.abs_diff_eq(DQuat::IDENTITY, IDENTITY_EPSILON)
                || self.rotation.abs_diff_eq(-DQuat::IDENTITY, IDENTITY_EPSILON))
    }
}
