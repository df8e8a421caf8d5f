use std::fmt;
use std::str::FromStr;

use crate::error::ScriptError;
use crate::math::{self, Mat3, Mat4, Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum RenderType {
    NONE,
    CUTOUT,
    CUTOUT_CULL,
    TRANSLUCENT,
    TRANSLUCENT_CULL,
    EMISSIVE,
    EMISSIVE_SOLID,
    END_PORTAL,
    GLINT,
    GLINT2,
}

impl RenderType {
    pub const ALL: [RenderType; 10] = [
        RenderType::NONE,
        RenderType::CUTOUT,
        RenderType::CUTOUT_CULL,
        RenderType::TRANSLUCENT,
        RenderType::TRANSLUCENT_CULL,
        RenderType::EMISSIVE,
        RenderType::EMISSIVE_SOLID,
        RenderType::END_PORTAL,
        RenderType::GLINT,
        RenderType::GLINT2,
    ];

    pub const DEFAULT_PRIMARY: RenderType = RenderType::TRANSLUCENT;
    pub const DEFAULT_SECONDARY: RenderType = RenderType::EMISSIVE;

    pub fn as_str(self) -> &'static str {
        match self {
            RenderType::NONE => "NONE",
            RenderType::CUTOUT => "CUTOUT",
            RenderType::CUTOUT_CULL => "CUTOUT_CULL",
            RenderType::TRANSLUCENT => "TRANSLUCENT",
            RenderType::TRANSLUCENT_CULL => "TRANSLUCENT_CULL",
            RenderType::EMISSIVE => "EMISSIVE",
            RenderType::EMISSIVE_SOLID => "EMISSIVE_SOLID",
            RenderType::END_PORTAL => "END_PORTAL",
            RenderType::GLINT => "GLINT",
            RenderType::GLINT2 => "GLINT2",
        }
    }
}

impl FromStr for RenderType {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RenderType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ScriptError::IllegalRenderType(s.to_string()))
    }
}

impl fmt::Display for RenderType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PartType {
    #[default]
    Group,
    Cube,
    Mesh,
}

impl PartType {
    pub fn as_str(self) -> &'static str {
        match self {
            PartType::Group => "GROUP",
            PartType::Cube => "CUBE",
            PartType::Mesh => "MESH",
        }
    }
}

/// Light override packed the vanilla way: block light in bits 4..,
/// sky light in bits 20...
pub fn pack_light(block: u32, sky: u32) -> u32 {
    block << 4 | sky << 20
}

pub fn unpack_light(packed: u32) -> (u32, u32) {
    ((packed >> 4) & 0xFFFF, (packed >> 20) & 0xFFFF)
}

/// Per-part transform and appearance state.
///
/// Two layers feed the local matrix: the explicit layer authored by the
/// model or script, and the bonus layer written each frame by the vanilla
/// binding. Every setter raises the recalculation flag; matrix reads through
/// [`Customization::position_matrix`] recompute first when it is raised.
///
/// [`Customization::set_matrix`] replaces the composed local matrix outright.
/// The override survives bonus and appearance changes and is dropped by the
/// next explicit transform setter or by [`Customization::clear_matrix`].
#[derive(Debug, Clone)]
pub struct Customization {
    pos: Vec3,
    rot: Vec3,
    scale: Vec3,
    pivot: Vec3,

    bonus_pos: Vec3,
    bonus_pivot: Vec3,
    bonus_rot: Vec3,

    uv_matrix: Mat3,
    visible: Option<bool>,
    primary_render_type: Option<RenderType>,
    secondary_render_type: Option<RenderType>,
    color: Vec3,
    alpha: f32,
    light: Option<u32>,
    pub part_type: PartType,

    matrix_override: Option<Mat4>,
    position_matrix: Mat4,
    normal_matrix: Mat3,
    needs_matrix_recalculation: bool,
}

impl Default for Customization {
    fn default() -> Self {
        Self {
            pos: Vec3::ZERO,
            rot: Vec3::ZERO,
            scale: Vec3::ONE,
            pivot: Vec3::ZERO,
            bonus_pos: Vec3::ZERO,
            bonus_pivot: Vec3::ZERO,
            bonus_rot: Vec3::ZERO,
            uv_matrix: Mat3::IDENTITY,
            visible: None,
            primary_render_type: None,
            secondary_render_type: None,
            color: Vec3::ONE,
            alpha: 1.0,
            light: None,
            part_type: PartType::Group,
            matrix_override: None,
            position_matrix: Mat4::IDENTITY,
            normal_matrix: Mat3::IDENTITY,
            needs_matrix_recalculation: true,
        }
    }
}

macro_rules! vec3_field {
    ($($get:ident / $set:ident => $field:ident, explicit: $explicit:literal;)*) => {
        $(
            pub fn $get(&self) -> Vec3 {
                self.$field
            }

            pub fn $set(&mut self, value: Vec3) {
                self.$field = value;
                if $explicit {
                    self.matrix_override = None;
                }
                self.needs_matrix_recalculation = true;
            }
        )*
    };
}

impl Customization {
    vec3_field! {
        pos / set_pos => pos, explicit: true;
        rot / set_rot => rot, explicit: true;
        scale / set_scale => scale, explicit: true;
        pivot / set_pivot => pivot, explicit: true;
        bonus_pos / set_bonus_pos => bonus_pos, explicit: false;
        bonus_pivot / set_bonus_pivot => bonus_pivot, explicit: false;
        bonus_rot / set_bonus_rot => bonus_rot, explicit: false;
    }

    /// Uses `matrix` as the local matrix instead of composing both layers.
    pub fn set_matrix(&mut self, matrix: Mat4) {
        self.matrix_override = Some(matrix);
        self.needs_matrix_recalculation = true;
    }

    /// Goes back to the composed local matrix.
    pub fn clear_matrix(&mut self) {
        self.matrix_override = None;
        self.needs_matrix_recalculation = true;
    }

    pub fn matrix_override(&self) -> Option<Mat4> {
        self.matrix_override
    }

    pub fn reset_bonus(&mut self) {
        self.set_bonus_pos(Vec3::ZERO);
        self.set_bonus_pivot(Vec3::ZERO);
        self.set_bonus_rot(Vec3::ZERO);
    }

    pub fn visible(&self) -> Option<bool> {
        self.visible
    }

    /// `None` inherits visibility from the parent.
    pub fn set_visible(&mut self, visible: Option<bool>) {
        self.visible = visible;
        self.needs_matrix_recalculation = true;
    }

    pub fn reset_visible(&mut self) {
        self.set_visible(None);
    }

    pub fn primary_render_type(&self) -> Option<RenderType> {
        self.primary_render_type
    }

    pub fn set_primary_render_type(&mut self, render_type: Option<RenderType>) {
        self.primary_render_type = render_type;
        self.needs_matrix_recalculation = true;
    }

    pub fn secondary_render_type(&self) -> Option<RenderType> {
        self.secondary_render_type
    }

    pub fn set_secondary_render_type(&mut self, render_type: Option<RenderType>) {
        self.secondary_render_type = render_type;
        self.needs_matrix_recalculation = true;
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
        self.needs_matrix_recalculation = true;
    }

    pub fn opacity(&self) -> f32 {
        self.alpha
    }

    pub fn set_opacity(&mut self, alpha: f32) {
        self.alpha = alpha;
        self.needs_matrix_recalculation = true;
    }

    pub fn packed_light(&self) -> Option<u32> {
        self.light
    }

    pub fn light(&self) -> Option<(u32, u32)> {
        self.light.map(unpack_light)
    }

    pub fn set_light(&mut self, light: Option<(u32, u32)>) {
        self.light = light.map(|(block, sky)| pack_light(block, sky));
        self.needs_matrix_recalculation = true;
    }

    pub fn uv_matrix(&self) -> Mat3 {
        self.uv_matrix
    }

    pub fn set_uv_matrix(&mut self, matrix: Mat3) {
        self.uv_matrix = matrix;
        self.needs_matrix_recalculation = true;
    }

    /// Resets the UV transform to a plain offset.
    pub fn set_uv(&mut self, offset: Vec2) {
        self.set_uv_matrix(math::translation3(offset));
    }

    pub fn needs_recalculation(&self) -> bool {
        self.needs_matrix_recalculation
    }

    /// Rebuilds the local matrices if anything changed since the last call.
    pub fn recalculate(&mut self) {
        if !self.needs_matrix_recalculation {
            return;
        }
        let m = self.matrix_override.unwrap_or_else(|| self.composed());
        self.position_matrix = m;
        self.normal_matrix = math::normal_matrix(&m);
        self.needs_matrix_recalculation = false;
    }

    /// `T(pivot) T(pos) T(bonus_pivot) R(bonus_rot) T(-bonus_pivot) T(bonus_pos)
    /// R(rot) S(scale) T(-pivot)`; the parent's world matrix is applied on top
    /// of this by the tree.
    fn composed(&self) -> Mat4 {
        math::translation4(self.pivot)
            * math::translation4(self.pos)
            * math::translation4(self.bonus_pivot)
            * math::zyx_rotation4(self.bonus_rot)
            * math::translation4(-self.bonus_pivot)
            * math::translation4(self.bonus_pos)
            * math::zyx_rotation4(self.rot)
            * math::scale4(self.scale)
            * math::translation4(-self.pivot)
    }

    pub fn position_matrix(&mut self) -> Mat4 {
        self.recalculate();
        self.position_matrix
    }

    /// Cached local matrix without recomputation.
    pub fn position_matrix_raw(&self) -> Mat4 {
        self.position_matrix
    }

    pub fn normal_matrix(&mut self) -> Mat3 {
        self.recalculate();
        self.normal_matrix
    }

    pub fn normal_matrix_raw(&self) -> Mat3 {
        self.normal_matrix
    }
}
