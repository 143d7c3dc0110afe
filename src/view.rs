//! Renderer boundary
//!
//! The simulation never looks inside a view. It asks the binding to create one
//! per tile, tells it where the tile is every frame, and releases it when the
//! tile is disposed.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::{Aabb, TileDescriptor};

/// Opaque renderer-side view id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ViewHandle(pub u32);

/// Where and how a view should be drawn this frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Vec2,
    pub size: Vec2,
    pub scale: f32,
    pub alpha: f32,
}

/// How a view is fitted into the rect it is given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Fit {
    /// Fill the rect exactly
    #[default]
    Stretch,
    /// Keep the natural aspect ratio, centered in the rect
    Contain,
    /// Move to the rect origin, keep the natural size (text)
    PositionOnly,
}

impl Fit {
    /// Position and size for a view of `natural` size placed into `rect`
    pub fn apply(self, rect: Aabb, natural: Vec2) -> (Vec2, Vec2) {
        let size = rect.size();
        match self {
            Fit::Stretch => (rect.min, size),
            Fit::PositionOnly => (rect.min, natural),
            Fit::Contain => {
                if natural.x <= 0.0 || natural.y <= 0.0 {
                    return (rect.min, size);
                }
                let factor = (size.x / natural.x).min(size.y / natural.y);
                let fitted = natural * factor;
                (rect.min + (size - fitted) / 2.0, fitted)
            }
        }
    }
}

/// Renderer-side view factory and placement sink
pub trait ViewBinding {
    /// Create a view for a tile of the given family
    fn create_view(&mut self, descriptor: &TileDescriptor) -> ViewHandle;

    /// Fit strategy for tile views
    fn fit(&self) -> Fit {
        Fit::Stretch
    }

    fn place_view(&mut self, handle: ViewHandle, placement: Placement);

    fn release_view(&mut self, handle: ViewHandle);
}

/// A view tracked by [`HeadlessViews`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlessView {
    pub family: String,
    pub placement: Option<Placement>,
}

/// In-memory binding that only records what a renderer would be told
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeadlessViews {
    views: BTreeMap<ViewHandle, HeadlessView>,
    next_handle: u32,
}

impl HeadlessViews {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_live(&self, handle: ViewHandle) -> bool {
        self.views.contains_key(&handle)
    }

    pub fn get(&self, handle: ViewHandle) -> Option<&HeadlessView> {
        self.views.get(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.views.len()
    }

    /// Live views in handle order
    pub fn iter(&self) -> impl Iterator<Item = (ViewHandle, &HeadlessView)> {
        self.views.iter().map(|(&handle, view)| (handle, view))
    }
}

impl ViewBinding for HeadlessViews {
    fn create_view(&mut self, descriptor: &TileDescriptor) -> ViewHandle {
        let handle = ViewHandle(self.next_handle);
        self.next_handle += 1;
        self.views.insert(
            handle,
            HeadlessView {
                family: descriptor.family.clone(),
                placement: None,
            },
        );
        handle
    }

    fn place_view(&mut self, handle: ViewHandle, placement: Placement) {
        if let Some(view) = self.views.get_mut(&handle) {
            view.placement = Some(placement);
        }
    }

    fn release_view(&mut self, handle: ViewHandle) {
        self.views.remove(&handle);
    }
}
