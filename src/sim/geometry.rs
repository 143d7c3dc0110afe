//! Axis-aligned boxes and circles
//!
//! Cells are boxes in grid-local pixel space (y grows downward). The blast
//! booster selects cells with a circle, using a strict box-circle test.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Box from a top-left position and a size
    pub fn from_position_size(position: Vec2, size: Vec2) -> Self {
        Self {
            min: position,
            max: position + size,
        }
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        (self.max - self.min).abs()
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size() / 2.0
    }

    /// Half width and half height
    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        self.size() / 2.0
    }

    /// Inclusive point containment
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Strict overlap (touching edges do not intersect)
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// A circle in grid-local space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Closest point of the box to the circle center
    pub fn closest_point(&self, aabb: &Aabb) -> Vec2 {
        let box_center = aabb.center();
        let half = aabb.half_extents();
        let offset = (self.center - box_center).clamp(-half, half);
        box_center + offset
    }

    /// Box-circle intersection: the clamped point must lie strictly inside the radius
    pub fn intersects_box(&self, aabb: &Aabb) -> bool {
        self.closest_point(aabb).distance(self.center) < self.radius
    }
}
