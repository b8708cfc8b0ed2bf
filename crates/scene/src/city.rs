//! Procedural city placement.
//!
//! Two rows of blocks flank the road: `BUILDINGS_PER_SIDE` on the left
//! (negative x), the same number on the right. Each block is an instanced
//! unit cube; [`InstanceBuffer`] holds one transform per slot, left side in
//! `0..150`, right side in `150..300`.

use crate::SceneError;
use glam::{Mat4, Quat, Vec3};
use rand::Rng;
use serde::Serialize;

pub const BUILDINGS_PER_SIDE: usize = 150;
pub const INSTANCE_CAPACITY: usize = 2 * BUILDINGS_PER_SIDE;

/// Uniform scale applied to every placement when baking transforms.
const BLOCK_SCALE: f32 = 5.0;

/// Distance kept clear between the outermost blocks and the boundary.
const EDGE_MARGIN: f32 = 20.0;

/// Half-width of the road left open around x = 0.
const ROAD_HALF_WIDTH: f32 = 10.0;

/// Which row a block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Left,
    Right,
}

/// Unscaled position and scale of one block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacementRecord {
    pub position: Vec3,
    pub scale: Vec3,
}

impl PlacementRecord {
    /// Model matrix for this block: scale by 5 and sit the cube on y = 0.
    pub fn transform(&self) -> Mat4 {
        let scale = self.scale * BLOCK_SCALE;
        let translation = Vec3::new(self.position.x, scale.y / 2.0, self.position.z);
        Mat4::from_scale_rotation_translation(scale, Quat::IDENTITY, translation)
    }
}

/// Difference of two independent draws from `U(0, n)`: symmetric around 0,
/// triangular on `(-n, n)`.
pub fn symmetric_jitter<R: Rng + ?Sized>(rng: &mut R, n: f32) -> f32 {
    -rng.random::<f32>() * n + rng.random::<f32>() * n
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    lo + (hi - lo) * rng.random::<f32>()
}

fn placement<R: Rng + ?Sized>(rng: &mut R, x_lo: f32, x_hi: f32, z_half: f32) -> PlacementRecord {
    let x = uniform(rng, x_lo, x_hi);
    let z = uniform(rng, -z_half, z_half);
    let sx = 0.9 + symmetric_jitter(rng, 0.1);
    let sy = 0.1 + symmetric_jitter(rng, 8.0).abs();
    let sz = 0.9 + symmetric_jitter(rng, 0.1);
    PlacementRecord {
        position: Vec3::new(x, 0.0, z),
        scale: Vec3::new(sx, sy, sz),
    }
}

/// The generated block layout, fixed for the lifetime of a scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityLayout {
    boundary: f32,
    left: Vec<PlacementRecord>,
    right: Vec<PlacementRecord>,
}

impl CityLayout {
    /// Draw 150 placements per side inside `[-boundary, boundary]`.
    ///
    /// Left x is drawn from `U(-boundary + 20, -10)`, right x from
    /// `U(10, boundary - 20)`, z from `U(-(boundary - 10), boundary - 10)`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, boundary: f32) -> Result<Self, SceneError> {
        if !boundary.is_finite() || boundary <= EDGE_MARGIN + ROAD_HALF_WIDTH {
            return Err(SceneError::InvalidBoundary(boundary));
        }
        let outer = boundary - EDGE_MARGIN;
        let z_half = (2.0 * boundary - EDGE_MARGIN) / 2.0;

        let mut left = Vec::with_capacity(BUILDINGS_PER_SIDE);
        let mut right = Vec::with_capacity(BUILDINGS_PER_SIDE);
        for _ in 0..BUILDINGS_PER_SIDE {
            left.push(placement(rng, -outer, -ROAD_HALF_WIDTH, z_half));
            right.push(placement(rng, ROAD_HALF_WIDTH, outer, z_half));
        }
        tracing::debug!("generated {} city blocks", left.len() + right.len());
        Ok(Self {
            boundary,
            left,
            right,
        })
    }

    pub fn boundary(&self) -> f32 {
        self.boundary
    }

    pub fn left(&self) -> &[PlacementRecord] {
        &self.left
    }

    pub fn right(&self) -> &[PlacementRecord] {
        &self.right
    }

    /// Every record paired with its instance slot.
    pub fn iter_slots(&self) -> impl Iterator<Item = (usize, Side, &PlacementRecord)> {
        let left = self.left.iter().enumerate().map(|(i, r)| (i, Side::Left, r));
        let right = self
            .right
            .iter()
            .enumerate()
            .map(|(i, r)| (i + BUILDINGS_PER_SIDE, Side::Right, r));
        left.chain(right)
    }
}

/// Fixed-capacity instance transforms for the city mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceBuffer {
    transforms: Vec<Mat4>,
}

impl Default for InstanceBuffer {
    fn default() -> Self {
        Self {
            transforms: vec![Mat4::IDENTITY; INSTANCE_CAPACITY],
        }
    }
}

impl InstanceBuffer {
    pub fn from_layout(layout: &CityLayout) -> Self {
        let mut buffer = Self::default();
        buffer.bake(layout);
        buffer
    }

    /// Write every record's transform to its slot: left `i` to `i`, right
    /// `i` to `i + 150`.
    pub fn bake(&mut self, layout: &CityLayout) {
        for (slot, _, record) in layout.iter_slots() {
            self.transforms[slot] = record.transform();
        }
    }

    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    pub fn get(&self, slot: usize) -> Option<&Mat4> {
        self.transforms.get(slot)
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Column-major matrices ready for upload as per-instance vertex data.
    pub fn to_columns(&self) -> Vec<[[f32; 4]; 4]> {
        self.transforms.iter().map(Mat4::to_cols_array_2d).collect()
    }

    pub fn side_of(slot: usize) -> Option<Side> {
        match slot {
            s if s < BUILDINGS_PER_SIDE => Some(Side::Left),
            s if s < INSTANCE_CAPACITY => Some(Side::Right),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn layout(seed: u64) -> CityLayout {
        let mut rng = StdRng::seed_from_u64(seed);
        CityLayout::generate(&mut rng, 100.0).unwrap()
    }

    #[test]
    fn one_hundred_fifty_per_side() {
        let city = layout(1);
        assert_eq!(city.left().len(), BUILDINGS_PER_SIDE);
        assert_eq!(city.right().len(), BUILDINGS_PER_SIDE);
        assert_eq!(city.iter_slots().count(), INSTANCE_CAPACITY);
    }

    #[test]
    fn placements_stay_in_their_bands() {
        for seed in 0..8 {
            let city = layout(seed);
            for r in city.left() {
                assert!((-80.0..=-10.0).contains(&r.position.x), "{r:?}");
                assert!((-90.0..=90.0).contains(&r.position.z), "{r:?}");
            }
            for r in city.right() {
                assert!((10.0..=80.0).contains(&r.position.x), "{r:?}");
                assert!((-90.0..=90.0).contains(&r.position.z), "{r:?}");
            }
        }
    }

    #[test]
    fn scales_stay_in_their_ranges() {
        let city = layout(42);
        for (_, _, r) in city.iter_slots() {
            assert!((0.8..=1.0).contains(&r.scale.x), "{r:?}");
            assert!((0.8..=1.0).contains(&r.scale.z), "{r:?}");
            assert!((0.1..=8.1).contains(&r.scale.y), "{r:?}");
        }
    }

    #[test]
    fn jitter_is_roughly_centred() {
        let mut rng = StdRng::seed_from_u64(9);
        let n = 10_000;
        let mean: f32 = (0..n).map(|_| symmetric_jitter(&mut rng, 1.0)).sum::<f32>() / n as f32;
        assert!(mean.abs() < 0.05, "mean {mean}");
    }

    #[test]
    fn same_seed_same_layout() {
        assert_eq!(layout(7), layout(7));
        assert_ne!(layout(7), layout(8));
    }

    #[test]
    fn rejects_boundary_without_room() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            CityLayout::generate(&mut rng, 30.0),
            Err(SceneError::InvalidBoundary(_))
        ));
    }

    #[test]
    fn baked_transforms_sit_on_the_ground() {
        let city = layout(3);
        let buffer = InstanceBuffer::from_layout(&city);
        assert_eq!(buffer.len(), INSTANCE_CAPACITY);
        for (slot, _, r) in city.iter_slots() {
            let (scale, _, translation) = buffer.get(slot).unwrap().to_scale_rotation_translation();
            assert!((scale - r.scale * 5.0).length() < 1e-4);
            assert!((translation.y - scale.y / 2.0).abs() < 1e-4);
            assert_eq!(translation.x, r.position.x);
            assert_eq!(translation.z, r.position.z);
            // Bottom face of the unit cube lands on y = 0.
            let bottom = buffer.get(slot).unwrap().transform_point3(Vec3::new(0.0, -0.5, 0.0));
            assert!(bottom.y.abs() < 1e-4);
        }
    }

    #[test]
    fn every_slot_written_once() {
        let city = layout(11);
        let buffer = InstanceBuffer::from_layout(&city);
        let slots: HashSet<usize> = city.iter_slots().map(|(s, _, _)| s).collect();
        assert_eq!(slots.len(), INSTANCE_CAPACITY);
        assert!(buffer.transforms().iter().all(|m| *m != Mat4::IDENTITY));
        for (slot, side, _) in city.iter_slots() {
            assert_eq!(InstanceBuffer::side_of(slot), Some(side));
        }
        assert_eq!(InstanceBuffer::side_of(INSTANCE_CAPACITY), None);
    }

    #[test]
    fn left_and_right_keep_their_order() {
        let city = layout(5);
        let buffer = InstanceBuffer::from_layout(&city);
        let left_x = buffer.get(12).unwrap().w_axis.x;
        let right_x = buffer.get(12 + BUILDINGS_PER_SIDE).unwrap().w_axis.x;
        assert_eq!(left_x, city.left()[12].position.x);
        assert_eq!(right_x, city.right()[12].position.x);
        assert!(left_x < 0.0 && right_x > 0.0);
    }
}
