use std::ops::{Index, IndexMut};

use tracing::trace;

use crate::customization::RenderType;
use crate::error::ScriptError;
use crate::math::{self, Mat3, Mat4, Vec2};
use crate::part::{ModelPart, PartId};
use crate::vanilla::{BonusTransform, ParentType, PoseSource};

/// Arena of parts in decode pre-order. Parent links are plain ids, children
/// are owned through the arena. Parts are never added or removed after
/// decode.
#[derive(Debug)]
pub struct ModelTree {
    pub(crate) parts: Vec<ModelPart>,
}

impl Index<PartId> for ModelTree {
    type Output = ModelPart;

    fn index(&self, id: PartId) -> &ModelPart {
        &self.parts[id.0]
    }
}

impl IndexMut<PartId> for ModelTree {
    fn index_mut(&mut self, id: PartId) -> &mut ModelPart {
        &mut self.parts[id.0]
    }
}

impl ModelTree {
    pub(crate) fn new() -> Self {
        Self { parts: Vec::new() }
    }

    pub(crate) fn push(&mut self, part: ModelPart) -> PartId {
        self.parts.push(part);
        PartId(self.parts.len() - 1)
    }

    pub fn root(&self) -> PartId {
        PartId::ROOT
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn get(&self, id: PartId) -> Option<&ModelPart> {
        self.parts.get(id.0)
    }

    /// All part ids in pre-order.
    pub fn ids(&self) -> impl Iterator<Item = PartId> + '_ {
        (0..self.parts.len()).map(PartId)
    }

    pub fn total_faces(&self) -> usize {
        self.parts.iter().map(|p| p.geometry.total_faces()).sum()
    }

    pub fn parent(&self, id: PartId) -> Option<PartId> {
        self[id].parent
    }

    pub fn children(&self, id: PartId) -> &[PartId] {
        &self[id].children
    }

    /// Case-sensitive child lookup; the first matching child wins. Results,
    /// misses included, are remembered for the lifetime of the tree.
    pub fn child(&mut self, id: PartId, name: &str) -> Option<PartId> {
        if let Some(cached) = self[id].child_cache.get(name) {
            return *cached;
        }
        let found = self[id]
            .children
            .iter()
            .copied()
            .find(|&child| self[child].name == name);
        self[id].child_cache.insert(name.to_string(), found);
        found
    }

    /// Looks a part up by a slash separated path of names below the root.
    pub fn find_path(&mut self, path: &str) -> Option<PartId> {
        let mut current = self.root();
        for name in path.split('/').filter(|s| !s.is_empty()) {
            current = self.child(current, name)?;
        }
        Some(current)
    }

    /// Effective visibility: the nearest explicit setting up the parent chain,
    /// visible when nothing in the chain sets one.
    pub fn is_visible(&self, id: PartId) -> bool {
        let mut current = Some(id);
        while let Some(part_id) = current {
            let part = &self[part_id];
            if let Some(visible) = part.customization.visible() {
                return visible;
            }
            current = part.parent;
        }
        true
    }

    pub fn set_parent_type_str(&mut self, id: PartId, value: &str) -> Result<(), ScriptError> {
        let parent_type: ParentType = value.parse()?;
        self[id].set_parent_type(parent_type);
        Ok(())
    }

    pub fn parent_type_name(&self, id: PartId) -> &'static str {
        self[id].parent_type.as_str()
    }

    pub fn set_primary_render_type_str(
        &mut self,
        id: PartId,
        value: &str,
    ) -> Result<(), ScriptError> {
        let render_type: RenderType = value.parse()?;
        self[id]
            .customization
            .set_primary_render_type(Some(render_type));
        Ok(())
    }

    pub fn set_secondary_render_type_str(
        &mut self,
        id: PartId,
        value: &str,
    ) -> Result<(), ScriptError> {
        let render_type: RenderType = value.parse()?;
        self[id]
            .customization
            .set_secondary_render_type(Some(render_type));
        Ok(())
    }

    pub fn primary_render_type_name(&self, id: PartId) -> Option<&'static str> {
        self[id]
            .customization
            .primary_render_type()
            .map(RenderType::as_str)
    }

    pub fn secondary_render_type_name(&self, id: PartId) -> Option<&'static str> {
        self[id]
            .customization
            .secondary_render_type()
            .map(RenderType::as_str)
    }

    pub fn part_type_name(&self, id: PartId) -> &'static str {
        self[id].customization.part_type.as_str()
    }

    pub fn texture_size(&self, id: PartId) -> Result<(u32, u32), ScriptError> {
        let part = &self[id];
        part.texture_size
            .get()
            .ok_or_else(|| ScriptError::MixedTextureSize(part.name.clone()))
    }

    /// UV offset given in texture pixels of the part's single texture size.
    pub fn set_uv_pixels(&mut self, id: PartId, pixels: Vec2) -> Result<(), ScriptError> {
        let part = &mut self[id];
        let Some((w, h)) = part.texture_size.get() else {
            return Err(ScriptError::UvPixelsMixedSize(part.name.clone()));
        };
        part.customization
            .set_uv(pixels / Vec2::new(w as f32, h as f32));
        Ok(())
    }

    /// Local matrix, recomputed first when stale.
    pub fn position_matrix(&mut self, id: PartId) -> Mat4 {
        self[id].customization.position_matrix()
    }

    pub fn position_matrix_raw(&self, id: PartId) -> Mat4 {
        self[id].customization.position_matrix_raw()
    }

    pub fn normal_matrix(&mut self, id: PartId) -> Mat3 {
        self[id].customization.normal_matrix()
    }

    pub fn normal_matrix_raw(&self, id: PartId) -> Mat3 {
        self[id].customization.normal_matrix_raw()
    }

    /// Copy of the part-to-world matrix saved by the last render pass.
    pub fn part_to_world(&self, id: PartId) -> Mat4 {
        self[id].saved_part_to_world
    }

    /// World matrix composed right now from the root down to `id`.
    pub fn world_matrix(&mut self, id: PartId) -> Mat4 {
        let mut chain = vec![id];
        let mut current = self[id].parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self[parent].parent;
        }
        chain
            .into_iter()
            .rev()
            .fold(Mat4::IDENTITY, |world, part| {
                world * self[part].customization.position_matrix()
            })
    }

    pub fn world_normal_matrix(&mut self, id: PartId) -> Mat3 {
        math::normal_matrix(&self.world_matrix(id))
    }

    /// Refreshes the bonus layer of every bone-bound part. Without a pose
    /// source (avatar not attached to a live entity) the bonus layer is
    /// cleared instead.
    pub fn apply_vanilla_pose(&mut self, pose: Option<&dyn PoseSource>) {
        for part in &mut self.parts {
            let Some(bone) = part.bone else {
                continue;
            };
            let bonus = pose.and_then(|source| {
                let offset = source.bind_offset(bone)?;
                let current = source.current_pose(bone)?;
                Some(BonusTransform::from_pose(offset, current))
            });
            match bonus {
                Some(bonus) => {
                    part.customization.set_bonus_pivot(bonus.pivot);
                    part.customization.set_bonus_pos(bonus.pos);
                    part.customization.set_bonus_rot(bonus.rot);
                }
                None => part.customization.reset_bonus(),
            }
            trace!(part = %part.name, ?bone, "vanilla bonus refreshed");
        }
    }
}
