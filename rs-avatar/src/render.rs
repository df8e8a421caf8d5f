//! Per-frame walk over the model tree that feeds face batches to a backend
//! until the avatar's complexity budget runs out.

use std::ops::ControlFlow;

use tracing::trace;

use crate::customization::RenderType;
use crate::geometry::Vertex;
use crate::math::{self, Mat3, Mat4, Vec3};
use crate::part::PartId;
use crate::texture::TextureSet;
use crate::tree::ModelTree;
use crate::trust::ComplexityBudget;

/// Resolved appearance of a part for one frame, after inheritance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartRenderState {
    pub world: Mat4,
    pub normal: Mat3,
    pub uv: Mat3,
    pub color: Vec3,
    pub alpha: f32,
    pub light: Option<u32>,
    pub primary: RenderType,
    pub secondary: RenderType,
}

impl Default for PartRenderState {
    fn default() -> Self {
        Self {
            world: Mat4::IDENTITY,
            normal: Mat3::IDENTITY,
            uv: Mat3::IDENTITY,
            color: Vec3::ONE,
            alpha: 1.0,
            light: None,
            primary: RenderType::DEFAULT_PRIMARY,
            secondary: RenderType::DEFAULT_SECONDARY,
        }
    }
}

impl PartRenderState {
    /// Moves a model-space vertex into world space.
    pub fn transform(&self, vertex: &Vertex) -> Vertex {
        let uv = self.uv * vertex.uv.extend(1.0);
        Vertex {
            pos: self.world.transform_point3(vertex.pos),
            uv: uv.truncate(),
            normal: (self.normal * vertex.normal).normalize_or_zero(),
        }
    }
}

/// Faces of one texture slot of one part, possibly truncated by the budget.
#[derive(Debug, Clone, Copy)]
pub struct FaceBatch<'a> {
    pub part: &'a str,
    pub part_index: i32,
    pub slot: usize,
    pub texture: Option<&'a TextureSet>,
    pub faces: usize,
    /// Model-space vertices, `faces * 4` of them.
    pub vertices: &'a [Vertex],
    pub state: PartRenderState,
}

pub trait RenderBackend {
    fn push_faces(&mut self, batch: FaceBatch<'_>);
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBatch {
    pub part: String,
    pub part_index: i32,
    pub slot: usize,
    pub faces: usize,
    pub state: PartRenderState,
}

/// Backend that keeps a summary of everything pushed to it.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub batches: Vec<RecordedBatch>,
}

impl RecordingBackend {
    pub fn total_faces(&self) -> usize {
        self.batches.iter().map(|b| b.faces).sum()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
    }
}

impl RenderBackend for RecordingBackend {
    fn push_faces(&mut self, batch: FaceBatch<'_>) {
        self.batches.push(RecordedBatch {
            part: batch.part.to_string(),
            part_index: batch.part_index,
            slot: batch.slot,
            faces: batch.faces,
            state: batch.state,
        });
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub faces_emitted: usize,
    pub parts_visited: usize,
    /// The budget ran out before the walk finished.
    pub exhausted: bool,
}

struct Walker<'a> {
    textures: &'a [TextureSet],
    backend: &'a mut dyn RenderBackend,
    remaining: i64,
    stats: RenderStats,
}

/// Walks `tree` depth-first in decode order and emits its faces.
///
/// Each slot consumes its full face count from the budget; the slot that
/// crosses zero is emitted truncated and the walk stops there. Hidden
/// subtrees cost nothing.
pub fn render_tree(
    tree: &mut ModelTree,
    textures: &[TextureSet],
    budget: ComplexityBudget,
    backend: &mut dyn RenderBackend,
) -> RenderStats {
    let mut walker = Walker {
        textures,
        backend,
        remaining: budget.initial(),
        stats: RenderStats::default(),
    };
    if !tree.is_empty() {
        let root = tree.root();
        walker.stats.exhausted = walker
            .visit(tree, root, &PartRenderState::default(), true)
            .is_break();
    }
    trace!(
        faces = walker.stats.faces_emitted,
        parts = walker.stats.parts_visited,
        exhausted = walker.stats.exhausted,
        "render pass done"
    );
    walker.stats
}

impl Walker<'_> {
    fn visit(
        &mut self,
        tree: &mut ModelTree,
        id: PartId,
        parent: &PartRenderState,
        parent_visible: bool,
    ) -> ControlFlow<()> {
        let visible = tree[id].customization.visible().unwrap_or(parent_visible);
        if !visible {
            return ControlFlow::Continue(());
        }
        self.stats.parts_visited += 1;

        let state = {
            let part = &mut tree[id];
            let world = parent.world * part.customization.position_matrix();
            if world != part.saved_part_to_world {
                part.saved_part_to_world = world;
                part.saved_normal_to_world = math::normal_matrix(&world);
            }
            let c = &part.customization;
            PartRenderState {
                world,
                normal: part.saved_normal_to_world,
                uv: parent.uv * c.uv_matrix(),
                color: parent.color * c.color(),
                alpha: parent.alpha * c.opacity(),
                light: c.packed_light().or(parent.light),
                primary: c.primary_render_type().unwrap_or(parent.primary),
                secondary: c.secondary_render_type().unwrap_or(parent.secondary),
            }
        };

        let part = &tree[id];
        for (slot, batch) in part.geometry.batches().iter().enumerate() {
            if self.remaining <= 0 {
                return ControlFlow::Break(());
            }
            let faces = batch.faces() as i64;
            self.remaining -= faces;
            let emit = (faces + self.remaining.min(0)) as usize;
            if emit == 0 {
                continue;
            }
            self.backend.push_faces(FaceBatch {
                part: &part.name,
                part_index: part.index(),
                slot,
                texture: self.textures.get(slot),
                faces: emit,
                vertices: batch.leading_faces(emit),
                state,
            });
            self.stats.faces_emitted += emit;
        }

        for i in 0..tree[id].children.len() {
            let child = tree[id].children[i];
            self.visit(tree, child, &state, visible)?;
        }
        ControlFlow::Continue(())
    }
}
