use glam::{IVec3, Vec3, Vec4};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub range: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub range: f32,
    pub inner_cone: f32,
    pub outer_cone: f32,
}

// Light component as seen by the generator: only its type drives code
// generation, the remaining fields feed per-draw parameter updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Point(PointLight),
    Directional,
    Spot(SpotLight),
}

/// Light type slot used for light-count specialization.
///
/// The discriminant is the component index inside a light-count vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightType {
    Point = 0,
    Directional = 1,
    Spotlight = 2,
}

impl LightType {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
    pub direction: Vec3,
    pub kind: LightKind,
}

impl Light {
    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32, direction: Vec3) -> Self {
        Self {
            color,
            intensity,
            position: Vec3::ZERO,
            direction: direction.normalize_or_zero(),
            kind: LightKind::Directional,
        }
    }

    #[must_use]
    pub fn new_point(color: Vec3, intensity: f32, position: Vec3, range: f32) -> Self {
        Self {
            color,
            intensity,
            position,
            direction: Vec3::NEG_Z,
            kind: LightKind::Point(PointLight { range }),
        }
    }

    #[must_use]
    pub fn new_spot(
        color: Vec3,
        intensity: f32,
        position: Vec3,
        direction: Vec3,
        range: f32,
        inner_cone: f32,
        outer_cone: f32,
    ) -> Self {
        Self {
            color,
            intensity,
            position,
            direction: direction.normalize_or_zero(),
            kind: LightKind::Spot(SpotLight {
                range,
                inner_cone,
                outer_cone,
            }),
        }
    }

    #[must_use]
    pub fn light_type(&self) -> LightType {
        match self.kind {
            LightKind::Point(_) => LightType::Point,
            LightKind::Directional => LightType::Directional,
            LightKind::Spot(_) => LightType::Spotlight,
        }
    }

    /// Premultiplied diffuse colour, alpha unused.
    #[must_use]
    pub fn diffuse(&self) -> Vec4 {
        (self.color * self.intensity).extend(1.0)
    }

    /// Attenuation parameters as `(range, constant, linear, quadratic)`.
    #[must_use]
    pub fn attenuation(&self) -> Vec4 {
        match self.kind {
            LightKind::Directional => Vec4::new(f32::MAX, 1.0, 0.0, 0.0),
            LightKind::Point(PointLight { range }) | LightKind::Spot(SpotLight { range, .. }) => {
                let range = range.max(f32::EPSILON);
                Vec4::new(range, 1.0, 4.5 / range, 75.0 / (range * range))
            }
        }
    }
}

/// Scene fog equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FogMode {
    #[default]
    None,
    Exp,
    Exp2,
    Linear,
}

impl FogMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FogMode::None => "none",
            FogMode::Exp => "exp",
            FogMode::Exp2 => "exp2",
            FogMode::Linear => "linear",
        }
    }
}

/// Counts lights by type into a `(point, directional, spot)` vector.
#[must_use]
pub fn count_lights<I>(lights: I) -> IVec3
where
    I: IntoIterator<Item = LightType>,
{
    let mut count = IVec3::ZERO;
    for light in lights {
        count[light.index()] += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_lights_by_type() {
        let count = count_lights([
            LightType::Point,
            LightType::Directional,
            LightType::Point,
            LightType::Spotlight,
        ]);
        assert_eq!(count, IVec3::new(2, 1, 1));
    }

    #[test]
    fn directional_light_is_unattenuated() {
        let light = Light::new_directional(Vec3::ONE, 1.0, Vec3::NEG_Y);
        assert_eq!(light.light_type(), LightType::Directional);
        assert_eq!(light.attenuation().y, 1.0);
        assert_eq!(light.attenuation().z, 0.0);
    }
}
