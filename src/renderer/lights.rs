// renderer/lights.rs
// Per-frame light accumulation into the flat arrays the built-in shaders
// read. The version only moves when the arrays actually change, which is
// what lets programs skip re-uploading light uniforms.

use std::fmt;

use glam::Vec3;

use crate::renderer::uniforms::UniformValue;
use crate::scene::{Light, ShadowCaster};

/// A light as the collector found it, with world-space placement.
#[derive(Clone, Copy, Debug)]
pub struct CollectedLight {
    pub entity: hecs::Entity,
    pub light: Light,
    pub position: Vec3,
    pub shadow: Option<ShadowCaster>,
}

impl CollectedLight {
    pub fn casts_shadow(&self) -> bool {
        self.shadow.is_some()
            && matches!(self.light, Light::Directional { .. } | Light::Spot { .. })
    }

    pub fn only_shadow(&self) -> bool {
        self.shadow.map_or(false, |s| s.only_shadow)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLightData {
    pub direction: Vec3,
    pub color: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLightData {
    pub position: Vec3,
    pub color: Vec3,
    pub distance: f32,
    pub decay: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLightData {
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub distance: f32,
    pub angle_cos: f32,
    pub exponent: f32,
    pub decay: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HemisphereLightData {
    pub direction: Vec3,
    pub sky_color: Vec3,
    pub ground_color: Vec3,
}

/// Light counts per type plus shadow casters. Programs are compiled for a
/// given hash, so a change here means recompiling light-sensitive
/// materials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct LightsHash {
    pub directional: usize,
    pub point: usize,
    pub spot: usize,
    pub hemisphere: usize,
    pub shadows: usize,
}

impl fmt::Display for LightsHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.directional, self.point, self.spot, self.hemisphere, self.shadows
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
struct LightArrays {
    ambient: Vec3,
    directional: Vec<DirectionalLightData>,
    point: Vec<PointLightData>,
    spot: Vec<SpotLightData>,
    hemisphere: Vec<HemisphereLightData>,
    shadows: usize,
}

#[derive(Clone, Debug, Default)]
pub struct LightAccumulator {
    arrays: LightArrays,
    version: u64,
}

impl LightAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the arrays from this frame's lights. Bumps the version only
    /// if anything differs from the previous frame.
    pub fn setup(&mut self, lights: &[CollectedLight], gamma_input: bool) {
        let mut arrays = LightArrays::default();

        let linear = |color: Vec3, intensity: f32| {
            if gamma_input {
                color * color * (intensity * intensity)
            } else {
                color * intensity
            }
        };

        for collected in lights {
            if collected.casts_shadow() {
                arrays.shadows += 1;
            }
            if collected.only_shadow() {
                continue;
            }

            let position = collected.position;
            match collected.light {
                Light::Ambient { color } => {
                    arrays.ambient += linear(color, 1.0);
                }
                Light::Directional {
                    color,
                    intensity,
                    target,
                } => {
                    arrays.directional.push(DirectionalLightData {
                        direction: (position - target).normalize_or_zero(),
                        color: linear(color, intensity),
                    });
                }
                Light::Point {
                    color,
                    intensity,
                    distance,
                    decay,
                } => {
                    arrays.point.push(PointLightData {
                        position,
                        color: linear(color, intensity),
                        distance,
                        decay,
                    });
                }
                Light::Spot {
                    color,
                    intensity,
                    target,
                    distance,
                    angle,
                    exponent,
                    decay,
                } => {
                    arrays.spot.push(SpotLightData {
                        position,
                        direction: (position - target).normalize_or_zero(),
                        color: linear(color, intensity),
                        distance,
                        angle_cos: angle.cos(),
                        exponent,
                        decay,
                    });
                }
                Light::Hemisphere {
                    sky_color,
                    ground_color,
                    intensity,
                } => {
                    arrays.hemisphere.push(HemisphereLightData {
                        direction: position.normalize_or_zero(),
                        sky_color: linear(sky_color, intensity),
                        ground_color: linear(ground_color, intensity),
                    });
                }
            }
        }

        if arrays != self.arrays {
            log::trace!("Light set changed: {}", LightsHash::from(&arrays));
            self.arrays = arrays;
            self.version = self.version.wrapping_add(1);
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn hash(&self) -> LightsHash {
        LightsHash::from(&self.arrays)
    }

    pub fn ambient(&self) -> Vec3 {
        self.arrays.ambient
    }

    pub fn directional_lights(&self) -> &[DirectionalLightData] {
        &self.arrays.directional
    }

    pub fn point_lights(&self) -> &[PointLightData] {
        &self.arrays.point
    }

    pub fn spot_lights(&self) -> &[SpotLightData] {
        &self.arrays.spot
    }

    pub fn hemisphere_lights(&self) -> &[HemisphereLightData] {
        &self.arrays.hemisphere
    }

    /// Uniform name and value for every light array the shaders declare.
    pub fn uniforms(&self) -> Vec<(&'static str, UniformValue)> {
        let a = &self.arrays;
        let vec3s = |f: &dyn Fn(usize) -> Vec3, n: usize| {
            UniformValue::Vec3Array((0..n).map(f).collect())
        };
        let floats = |f: &dyn Fn(usize) -> f32, n: usize| {
            UniformValue::FloatArray((0..n).map(f).collect())
        };

        let (d, p, s, h) = (
            a.directional.len(),
            a.point.len(),
            a.spot.len(),
            a.hemisphere.len(),
        );

        vec![
            ("ambientLightColor", UniformValue::Vec3(a.ambient)),
            ("directionalLightColor", vec3s(&|i| a.directional[i].color, d)),
            (
                "directionalLightDirection",
                vec3s(&|i| a.directional[i].direction, d),
            ),
            ("pointLightColor", vec3s(&|i| a.point[i].color, p)),
            ("pointLightPosition", vec3s(&|i| a.point[i].position, p)),
            ("pointLightDistance", floats(&|i| a.point[i].distance, p)),
            ("pointLightDecay", floats(&|i| a.point[i].decay, p)),
            ("spotLightColor", vec3s(&|i| a.spot[i].color, s)),
            ("spotLightPosition", vec3s(&|i| a.spot[i].position, s)),
            ("spotLightDirection", vec3s(&|i| a.spot[i].direction, s)),
            ("spotLightDistance", floats(&|i| a.spot[i].distance, s)),
            ("spotLightAngleCos", floats(&|i| a.spot[i].angle_cos, s)),
            ("spotLightExponent", floats(&|i| a.spot[i].exponent, s)),
            ("spotLightDecay", floats(&|i| a.spot[i].decay, s)),
            ("hemisphereLightSkyColor", vec3s(&|i| a.hemisphere[i].sky_color, h)),
            (
                "hemisphereLightGroundColor",
                vec3s(&|i| a.hemisphere[i].ground_color, h),
            ),
            (
                "hemisphereLightDirection",
                vec3s(&|i| a.hemisphere[i].direction, h),
            ),
        ]
    }
}

impl From<&LightArrays> for LightsHash {
    fn from(arrays: &LightArrays) -> Self {
        Self {
            directional: arrays.directional.len(),
            point: arrays.point.len(),
            spot: arrays.spot.len(),
            hemisphere: arrays.hemisphere.len(),
            shadows: arrays.shadows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light(light: Light, position: Vec3) -> CollectedLight {
        let mut world = hecs::World::new();
        CollectedLight {
            entity: world.spawn(()),
            light,
            position,
            shadow: None,
        }
    }

    #[test]
    fn unchanged_lights_keep_version() {
        let lights = vec![light(Light::directional(Vec3::ONE, 1.0), Vec3::Y)];
        let mut acc = LightAccumulator::new();
        acc.setup(&lights, false);
        let version = acc.version();
        acc.setup(&lights, false);
        assert_eq!(acc.version(), version);

        let mut more = lights.clone();
        more.push(light(Light::point(Vec3::ONE, 2.0, 10.0), Vec3::X));
        acc.setup(&more, false);
        assert_ne!(acc.version(), version);
        assert_eq!(acc.hash().point, 1);
    }

    #[test]
    fn directional_points_from_target_to_light() {
        let mut acc = LightAccumulator::new();
        acc.setup(
            &[light(Light::directional(Vec3::ONE, 0.5), Vec3::new(0.0, 2.0, 0.0))],
            false,
        );
        let dir = acc.directional_lights()[0];
        assert!(dir.direction.abs_diff_eq(Vec3::Y, 1e-6));
        assert!(dir.color.abs_diff_eq(Vec3::splat(0.5), 1e-6));
    }

    #[test]
    fn gamma_input_squares_colour_and_intensity() {
        let mut acc = LightAccumulator::new();
        acc.setup(
            &[
                light(Light::Ambient { color: Vec3::splat(0.5) }, Vec3::ZERO),
                light(Light::directional(Vec3::splat(0.5), 2.0), Vec3::Y),
            ],
            true,
        );
        assert!(acc.ambient().abs_diff_eq(Vec3::splat(0.25), 1e-6));
        assert!(acc.directional_lights()[0]
            .color
            .abs_diff_eq(Vec3::splat(1.0), 1e-6));
    }

    #[test]
    fn shadow_only_lights_count_shadows_but_add_no_light() {
        let mut caster = light(Light::directional(Vec3::ONE, 1.0), Vec3::Y);
        caster.shadow = Some(ShadowCaster {
            only_shadow: true,
            ..ShadowCaster::default()
        });
        let mut acc = LightAccumulator::new();
        acc.setup(&[caster], false);
        let hash = acc.hash();
        assert_eq!(hash.directional, 0);
        assert_eq!(hash.shadows, 1);
        assert_eq!(hash.to_string(), "0,0,0,0,1");
    }
}
