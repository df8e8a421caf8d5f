//! Binding of custom parts to the host's vanilla skeleton.

use std::fmt;
use std::str::FromStr;

use crate::error::ScriptError;
use crate::math::Vec3;

/// Bones of the host skeleton a part can follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VanillaBone {
    Head,
    Body,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
    LeftElytraWing,
    RightElytraWing,
}

impl VanillaBone {
    pub const ALL: [VanillaBone; 8] = [
        VanillaBone::Head,
        VanillaBone::Body,
        VanillaBone::LeftArm,
        VanillaBone::RightArm,
        VanillaBone::LeftLeg,
        VanillaBone::RightLeg,
        VanillaBone::LeftElytraWing,
        VanillaBone::RightElytraWing,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Rest pivot of the bone in model pixels (biped and elytra models).
    pub fn default_bind_offset(self) -> Vec3 {
        match self {
            VanillaBone::Head | VanillaBone::Body => Vec3::ZERO,
            VanillaBone::LeftArm => Vec3::new(5.0, 2.0, 0.0),
            VanillaBone::RightArm => Vec3::new(-5.0, 2.0, 0.0),
            VanillaBone::LeftLeg => Vec3::new(1.9, 12.0, 0.0),
            VanillaBone::RightLeg => Vec3::new(-1.9, 12.0, 0.0),
            VanillaBone::LeftElytraWing => Vec3::new(5.0, 0.0, 0.0),
            VanillaBone::RightElytraWing => Vec3::new(-5.0, 0.0, 0.0),
        }
    }
}

/// What a part is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParentType {
    #[default]
    None,
    Head,
    Body,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
    LeftElytra,
    RightElytra,
    World,
}

impl ParentType {
    pub const ALL: [ParentType; 10] = [
        ParentType::None,
        ParentType::Head,
        ParentType::Body,
        ParentType::LeftArm,
        ParentType::RightArm,
        ParentType::LeftLeg,
        ParentType::RightLeg,
        ParentType::LeftElytra,
        ParentType::RightElytra,
        ParentType::World,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParentType::None => "None",
            ParentType::Head => "Head",
            ParentType::Body => "Body",
            ParentType::LeftArm => "LeftArm",
            ParentType::RightArm => "RightArm",
            ParentType::LeftLeg => "LeftLeg",
            ParentType::RightLeg => "RightLeg",
            ParentType::LeftElytra => "LeftElytra",
            ParentType::RightElytra => "RightElytra",
            ParentType::World => "World",
        }
    }

    /// Name prefixes recognised when a model names its groups after bones.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            ParentType::None => &["None", "NONE"],
            ParentType::Head => &["Head", "HEAD"],
            ParentType::Body => &["Body", "BODY"],
            ParentType::LeftArm => &["LeftArm", "LEFT_ARM"],
            ParentType::RightArm => &["RightArm", "RIGHT_ARM"],
            ParentType::LeftLeg => &["LeftLeg", "LEFT_LEG"],
            ParentType::RightLeg => &["RightLeg", "RIGHT_LEG"],
            ParentType::LeftElytra => &["LeftElytra", "LeftElytron", "LEFT_ELYTRON", "LEFT_ELYTRA"],
            ParentType::RightElytra => {
                &["RightElytra", "RightElytron", "RIGHT_ELYTRON", "RIGHT_ELYTRA"]
            }
            ParentType::World => &["World", "WORLD"],
        }
    }

    /// First type, in declaration order, with an alias prefixing `name`.
    pub fn from_name_prefix(name: &str) -> ParentType {
        ParentType::ALL
            .into_iter()
            .find(|t| t.aliases().iter().any(|alias| name.starts_with(alias)))
            .unwrap_or(ParentType::None)
    }

    pub fn bone(self) -> Option<VanillaBone> {
        match self {
            ParentType::Head => Some(VanillaBone::Head),
            ParentType::Body => Some(VanillaBone::Body),
            ParentType::LeftArm => Some(VanillaBone::LeftArm),
            ParentType::RightArm => Some(VanillaBone::RightArm),
            ParentType::LeftLeg => Some(VanillaBone::LeftLeg),
            ParentType::RightLeg => Some(VanillaBone::RightLeg),
            ParentType::LeftElytra => Some(VanillaBone::LeftElytraWing),
            ParentType::RightElytra => Some(VanillaBone::RightElytraWing),
            ParentType::None | ParentType::World => None,
        }
    }

    pub fn is_vanilla(self) -> bool {
        self.bone().is_some()
    }
}

impl FromStr for ParentType {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ScriptError::IllegalParentType(s.to_string()))
    }
}

impl fmt::Display for ParentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current local pose of a bone; rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BonePose {
    pub pos: Vec3,
    pub rot: Vec3,
}

/// Host skeleton queried once per bound part per frame.
pub trait PoseSource {
    fn bind_offset(&self, bone: VanillaBone) -> Option<Vec3>;
    fn current_pose(&self, bone: VanillaBone) -> Option<BonePose>;
}

/// Delta written into a part's bonus layer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BonusTransform {
    pub pivot: Vec3,
    pub pos: Vec3,
    pub rot: Vec3,
}

impl BonusTransform {
    /// Host models use +Z toward the viewer and flip X/Y rotation signs.
    pub fn from_pose(bind_offset: Vec3, pose: BonePose) -> Self {
        let offset = (bind_offset - pose.pos) * Vec3::new(1.0, 1.0, -1.0);
        Self {
            pivot: offset,
            pos: offset,
            rot: Vec3::new(-pose.rot.x, -pose.rot.y, pose.rot.z),
        }
    }
}

/// Humanoid skeleton a host fills in every frame. Starts in the bind pose.
#[derive(Debug, Clone)]
pub struct HumanoidPose {
    poses: [BonePose; 8],
}

impl Default for HumanoidPose {
    fn default() -> Self {
        Self {
            poses: VanillaBone::ALL.map(|bone| BonePose {
                pos: bone.default_bind_offset(),
                rot: Vec3::ZERO,
            }),
        }
    }
}

impl HumanoidPose {
    pub fn set(&mut self, bone: VanillaBone, pose: BonePose) {
        self.poses[bone.index()] = pose;
    }

    pub fn get(&self, bone: VanillaBone) -> BonePose {
        self.poses[bone.index()]
    }
}

impl PoseSource for HumanoidPose {
    fn bind_offset(&self, bone: VanillaBone) -> Option<Vec3> {
        Some(bone.default_bind_offset())
    }

    fn current_pose(&self, bone: VanillaBone) -> Option<BonePose> {
        Some(self.get(bone))
    }
}
