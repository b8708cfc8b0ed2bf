use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use neoleon_common::StarsConfig;
use rand::Rng;
use std::f32::consts::PI;

/// One star as uploaded per instance.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Star {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub size: f32,
}

/// Background stars scattered through a spherical shell.
///
/// Radii start at `radius + depth` and walk inward by a random fraction of
/// `depth / count` per star, so early stars sit on the outside of the shell.
/// Hue sweeps once around the colour wheel across the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StarField {
    stars: Vec<Star>,
}

impl StarField {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, config: &StarsConfig) -> Self {
        let count = config.count as usize;
        let step = config.depth / config.count.max(1) as f32;
        let mut radius = config.radius + config.depth;
        let mut stars = Vec::with_capacity(count);
        for i in 0..count {
            radius -= step * rng.random::<f32>();
            let position = shell_point(rng, radius);
            let color = hsl_to_rgb(i as f32 / count as f32, config.saturation, 0.9);
            let size = (0.5 + 0.5 * rng.random::<f32>()) * config.factor;
            stars.push(Star {
                position: position.to_array(),
                color,
                size,
            });
        }
        Self { stars }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }
}

/// Uniform direction on the sphere at distance `radius`, y up.
fn shell_point<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec3 {
    let polar = (1.0 - 2.0 * rng.random::<f32>()).clamp(-1.0, 1.0).acos();
    let azimuth = 2.0 * PI * rng.random::<f32>();
    let ring = radius * polar.sin();
    Vec3::new(ring * azimuth.sin(), radius * polar.cos(), ring * azimuth.cos())
}

fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [f32; 3] {
    if saturation <= 0.0 {
        return [lightness; 3];
    }
    let q = if lightness <= 0.5 {
        lightness * (1.0 + saturation)
    } else {
        lightness + saturation - lightness * saturation
    };
    let p = 2.0 * lightness - q;
    [
        hue_channel(p, q, hue + 1.0 / 3.0),
        hue_channel(p, q, hue),
        hue_channel(p, q, hue - 1.0 / 3.0),
    ]
}

fn hue_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn field(config: &StarsConfig) -> StarField {
        StarField::generate(&mut StdRng::seed_from_u64(1), config)
    }

    #[test]
    fn stars_fill_the_shell() {
        let config = StarsConfig::default();
        let stars = field(&config);
        assert_eq!(stars.len(), config.count as usize);
        let outer = config.radius + config.depth;
        for star in stars.stars() {
            let r = Vec3::from_array(star.position).length();
            assert!(r <= outer + 1e-3, "{r}");
            assert!(r >= config.radius - 1e-3, "{r}");
            assert!(star.size >= 0.5 * config.factor && star.size <= config.factor);
        }
    }

    #[test]
    fn zero_saturation_is_grey() {
        let config = StarsConfig {
            saturation: 0.0,
            count: 16,
            ..StarsConfig::default()
        };
        for star in field(&config).stars() {
            assert_eq!(star.color, [0.9; 3]);
        }
    }

    #[test]
    fn hsl_primaries() {
        let red = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((red[0] - 1.0).abs() < 1e-6 && red[1].abs() < 1e-6 && red[2].abs() < 1e-6);
        let green = hsl_to_rgb(1.0 / 3.0, 1.0, 0.5);
        assert!((green[1] - 1.0).abs() < 1e-5 && green[0].abs() < 1e-5);
    }

    #[test]
    fn empty_field() {
        let config = StarsConfig {
            count: 0,
            ..StarsConfig::default()
        };
        assert!(field(&config).is_empty());
    }
}
