//! # Rig References
//!
//! Read-only joint data the pose generators consume, plus the ground query
//! used for foot placement.
//!
//! ## Features
//!
//! - **Humanoid hierarchy**: standard bone names with parent links
//! - **Skeleton**: rest-pose joints in model space, chain validation
//! - **LimbRig**: root/mid/tip joints and mesh extents for one limb
//! - **GroundQuery**: `(origin, direction, max_distance) -> hit?`

use serde::{Deserialize, Serialize};

use crate::error::{LimbicError, Result};
use crate::math::{Pose, Quat, Vec3, EPSILON};

// ============================================================================
// Humanoid Rig Definition
// ============================================================================

/// Standard humanoid bone names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HumanoidBone {
    // Spine
    Hips,
    Spine,
    Chest,
    Neck,
    Head,

    // Left Arm
    LeftShoulder,
    LeftUpperArm,
    LeftLowerArm,
    LeftHand,

    // Right Arm
    RightShoulder,
    RightUpperArm,
    RightLowerArm,
    RightHand,

    // Left Leg
    LeftUpperLeg,
    LeftLowerLeg,
    LeftFoot,
    LeftToe,

    // Right Leg
    RightUpperLeg,
    RightLowerLeg,
    RightFoot,
    RightToe,
}

impl HumanoidBone {
    /// Parents listed before children
    pub const ALL: [HumanoidBone; 21] = {
        use HumanoidBone::*;
        [
            Hips,
            Spine,
            Chest,
            Neck,
            Head,
            LeftShoulder,
            LeftUpperArm,
            LeftLowerArm,
            LeftHand,
            RightShoulder,
            RightUpperArm,
            RightLowerArm,
            RightHand,
            LeftUpperLeg,
            LeftLowerLeg,
            LeftFoot,
            LeftToe,
            RightUpperLeg,
            RightLowerLeg,
            RightFoot,
            RightToe,
        ]
    };

    /// Get parent bone in hierarchy
    pub fn parent(&self) -> Option<HumanoidBone> {
        use HumanoidBone::*;
        match self {
            Hips => None,
            Spine => Some(Hips),
            Chest => Some(Spine),
            Neck => Some(Chest),
            Head => Some(Neck),

            LeftShoulder => Some(Chest),
            LeftUpperArm => Some(LeftShoulder),
            LeftLowerArm => Some(LeftUpperArm),
            LeftHand => Some(LeftLowerArm),

            RightShoulder => Some(Chest),
            RightUpperArm => Some(RightShoulder),
            RightLowerArm => Some(RightUpperArm),
            RightHand => Some(RightLowerArm),

            LeftUpperLeg => Some(Hips),
            LeftLowerLeg => Some(LeftUpperLeg),
            LeftFoot => Some(LeftLowerLeg),
            LeftToe => Some(LeftFoot),

            RightUpperLeg => Some(Hips),
            RightLowerLeg => Some(RightUpperLeg),
            RightFoot => Some(RightLowerLeg),
            RightToe => Some(RightFoot),
        }
    }

    /// Joint name used inside a [`Skeleton`]
    pub fn name(&self) -> &'static str {
        use HumanoidBone::*;
        match self {
            Hips => "Hips",
            Spine => "Spine",
            Chest => "Chest",
            Neck => "Neck",
            Head => "Head",
            LeftShoulder => "LeftShoulder",
            LeftUpperArm => "LeftUpperArm",
            LeftLowerArm => "LeftLowerArm",
            LeftHand => "LeftHand",
            RightShoulder => "RightShoulder",
            RightUpperArm => "RightUpperArm",
            RightLowerArm => "RightLowerArm",
            RightHand => "RightHand",
            LeftUpperLeg => "LeftUpperLeg",
            LeftLowerLeg => "LeftLowerLeg",
            LeftFoot => "LeftFoot",
            LeftToe => "LeftToe",
            RightUpperLeg => "RightUpperLeg",
            RightLowerLeg => "RightLowerLeg",
            RightFoot => "RightFoot",
            RightToe => "RightToe",
        }
    }

    /// Is this a leg bone?
    pub fn is_leg(&self) -> bool {
        use HumanoidBone::*;
        matches!(
            self,
            LeftUpperLeg | LeftLowerLeg | LeftFoot | LeftToe | RightUpperLeg | RightLowerLeg | RightFoot | RightToe
        )
    }

    /// Is this an arm bone?
    pub fn is_arm(&self) -> bool {
        use HumanoidBone::*;
        matches!(
            self,
            LeftShoulder | LeftUpperArm | LeftLowerArm | LeftHand | RightShoulder | RightUpperArm | RightLowerArm | RightHand
        )
    }
}

/// Proportions used to build a reference humanoid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyDimensions {
    /// Hip joint height above the floor
    #[serde(default = "default_leg_length")]
    pub leg_length: f32,
    /// Distance between the two hip joints
    #[serde(default = "default_hip_width")]
    pub hip_width: f32,
    /// Hips to neck
    #[serde(default = "default_torso_length")]
    pub torso_length: f32,
    /// Torso mesh width
    #[serde(default = "default_torso_width")]
    pub torso_width: f32,
    /// Torso mesh depth
    #[serde(default = "default_torso_depth")]
    pub torso_depth: f32,
    /// Neck to top of head
    #[serde(default = "default_head_length")]
    pub head_length: f32,
    /// Upper arm joint to hand
    #[serde(default = "default_arm_length")]
    pub arm_length: f32,
    /// Limb mesh thickness
    #[serde(default = "default_limb_thickness")]
    pub limb_thickness: f32,
}

fn default_leg_length() -> f32 { 0.9 }
fn default_hip_width() -> f32 { 0.2 }
fn default_torso_length() -> f32 { 0.6 }
fn default_torso_width() -> f32 { 0.36 }
fn default_torso_depth() -> f32 { 0.22 }
fn default_head_length() -> f32 { 0.25 }
fn default_arm_length() -> f32 { 0.62 }
fn default_limb_thickness() -> f32 { 0.1 }

impl Default for BodyDimensions {
    fn default() -> Self {
        Self {
            leg_length: default_leg_length(),
            hip_width: default_hip_width(),
            torso_length: default_torso_length(),
            torso_width: default_torso_width(),
            torso_depth: default_torso_depth(),
            head_length: default_head_length(),
            arm_length: default_arm_length(),
            limb_thickness: default_limb_thickness(),
        }
    }
}

impl BodyDimensions {
    /// Height of the shoulder line above the floor
    pub fn shoulder_height(&self) -> f32 {
        self.leg_length + self.torso_length * 0.92
    }

    /// Total standing height
    pub fn height(&self) -> f32 {
        self.leg_length + self.torso_length + self.head_length
    }
}

// ============================================================================
// Skeleton
// ============================================================================

/// A rest-pose joint in model space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub name: String,
    /// Index of the parent joint (always lower than this joint's index)
    pub parent: Option<usize>,
    pub position: Vec3,
    pub rotation: Quat,
}

impl Joint {
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.rotation)
    }
}

/// Ordered joint hierarchy in the character's rest pose
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    joints: Vec<Joint>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a joint; the parent must already exist
    pub fn add_joint(
        &mut self,
        name: impl Into<String>,
        parent: Option<&str>,
        position: Vec3,
        rotation: Quat,
    ) -> Result<usize> {
        let parent = parent.map(|p| self.index_of(p)).transpose()?;
        self.joints.push(Joint {
            name: name.into(),
            parent,
            position,
            rotation,
        });
        Ok(self.joints.len() - 1)
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.joints
            .iter()
            .position(|j| j.name == name)
            .ok_or_else(|| LimbicError::UnknownJoint(name.to_string()))
    }

    pub fn joint(&self, name: &str) -> Result<&Joint> {
        self.index_of(name).map(|i| &self.joints[i])
    }

    /// Check that every parent precedes its child.
    ///
    /// `add_joint` keeps this by construction; deserialized skeletons need
    /// the check before any chain is walked.
    pub fn validate(&self) -> Result<()> {
        for (index, joint) in self.joints.iter().enumerate() {
            match joint.parent {
                Some(parent) if parent >= index => {
                    return Err(LimbicError::BadParent {
                        joint: joint.name.clone(),
                        parent,
                    })
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Joints from `root` down to `tip`, inclusive.
    ///
    /// Fails unless `root` is `tip` or one of its ancestors.
    pub fn chain(&self, root: &str, tip: &str) -> Result<Vec<usize>> {
        let root_index = self.index_of(root)?;
        let mut current = Some(self.index_of(tip)?);
        let mut chain = Vec::new();
        while let Some(index) = current {
            // A walk longer than the skeleton means a parent cycle
            if chain.len() >= self.joints.len() {
                break;
            }
            chain.push(index);
            if index == root_index {
                chain.reverse();
                return Ok(chain);
            }
            current = self.joints.get(index).and_then(|j| j.parent);
        }
        Err(LimbicError::MalformedChain {
            root: root.to_string(),
            tip: tip.to_string(),
        })
    }

    /// Summed bone lengths along a validated chain
    pub fn chain_length(&self, root: &str, tip: &str) -> Result<f32> {
        let chain = self.chain(root, tip)?;
        Ok(chain
            .windows(2)
            .map(|w| self.joints[w[0]].position.distance(self.joints[w[1]].position))
            .sum())
    }

    /// Extract the joints one limb reads.
    ///
    /// `mid` must sit on the `root..tip` chain.
    pub fn limb_rig(&self, root: &str, mid: &str, tip: &str, extents: Vec3) -> Result<LimbRig> {
        let chain = self.chain(root, tip)?;
        let mid_index = self.index_of(mid)?;
        if !chain.contains(&mid_index) {
            return Err(LimbicError::MalformedChain {
                root: mid.to_string(),
                tip: tip.to_string(),
            });
        }
        Ok(LimbRig {
            root: self.joint(root)?.pose(),
            mid: self.joints[mid_index].pose(),
            tip: self.joint(tip)?.pose(),
            extents,
        })
    }

    /// Reference T-pose humanoid with its origin on the floor under the hips
    pub fn humanoid(dims: &BodyDimensions) -> Self {
        use HumanoidBone::*;

        let hip_y = dims.leg_length;
        let shoulder_y = dims.shoulder_height();
        let hip_x = dims.hip_width * 0.5;
        let shoulder_x = dims.torso_width * 0.5;
        let ankle_y = dims.leg_length * 0.08;

        let position = |bone: HumanoidBone| -> Vec3 {
            match bone {
                Hips => Vec3::new(0.0, hip_y, 0.0),
                Spine => Vec3::new(0.0, hip_y + dims.torso_length * 0.35, 0.0),
                Chest => Vec3::new(0.0, hip_y + dims.torso_length * 0.7, 0.0),
                Neck => Vec3::new(0.0, hip_y + dims.torso_length, 0.0),
                Head => Vec3::new(0.0, hip_y + dims.torso_length + dims.head_length * 0.5, 0.0),

                LeftShoulder => Vec3::new(-shoulder_x * 0.4, shoulder_y, 0.0),
                LeftUpperArm => Vec3::new(-shoulder_x, shoulder_y, 0.0),
                LeftLowerArm => Vec3::new(-shoulder_x - dims.arm_length * 0.5, shoulder_y, 0.0),
                LeftHand => Vec3::new(-shoulder_x - dims.arm_length, shoulder_y, 0.0),
                RightShoulder => Vec3::new(shoulder_x * 0.4, shoulder_y, 0.0),
                RightUpperArm => Vec3::new(shoulder_x, shoulder_y, 0.0),
                RightLowerArm => Vec3::new(shoulder_x + dims.arm_length * 0.5, shoulder_y, 0.0),
                RightHand => Vec3::new(shoulder_x + dims.arm_length, shoulder_y, 0.0),

                LeftUpperLeg => Vec3::new(-hip_x, hip_y, 0.0),
                LeftLowerLeg => Vec3::new(-hip_x, hip_y * 0.5, 0.0),
                LeftFoot => Vec3::new(-hip_x, ankle_y, 0.0),
                LeftToe => Vec3::new(-hip_x, ankle_y * 0.25, -dims.leg_length * 0.14),
                RightUpperLeg => Vec3::new(hip_x, hip_y, 0.0),
                RightLowerLeg => Vec3::new(hip_x, hip_y * 0.5, 0.0),
                RightFoot => Vec3::new(hip_x, ankle_y, 0.0),
                RightToe => Vec3::new(hip_x, ankle_y * 0.25, -dims.leg_length * 0.14),
            }
        };

        let mut joints: Vec<Joint> = Vec::with_capacity(HumanoidBone::ALL.len());
        for bone in HumanoidBone::ALL {
            // ALL lists parents first, so the parent index is already known
            let parent = bone
                .parent()
                .and_then(|p| joints.iter().position(|j| j.name == p.name()));
            joints.push(Joint {
                name: bone.name().to_string(),
                parent,
                position: position(bone),
                rotation: Quat::IDENTITY,
            });
        }
        Self { joints }
    }
}

// ============================================================================
// Limb Rig
// ============================================================================

/// The joints and mesh bounds one limb reads
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimbRig {
    pub root: Pose,
    pub mid: Pose,
    pub tip: Pose,
    /// Bounding size of the limb mesh (x = width, y = height, z = depth)
    pub extents: Vec3,
}

impl LimbRig {
    /// Rest root-to-tip distance
    pub fn length(&self) -> f32 {
        self.root.position.distance(self.tip.position)
    }
}

// ============================================================================
// Ground Query
// ============================================================================

/// Ground contact returned by a [`GroundQuery`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    pub point: Vec3,
    pub normal: Vec3,
}

/// World-space ray cast restricted to walkable ground
pub trait GroundQuery {
    fn cast_ground(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<GroundHit>;
}

/// Infinite horizontal plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FlatGround {
    pub height: f32,
}

impl FlatGround {
    pub fn new(height: f32) -> Self {
        Self { height }
    }
}

impl GroundQuery for FlatGround {
    fn cast_ground(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<GroundHit> {
        let dir = direction.normalize_or_zero();
        // Only downward rays starting above the plane can land on it
        if dir.y > -EPSILON || origin.y < self.height {
            return None;
        }
        let distance = (self.height - origin.y) / dir.y;
        if !(0.0..=max_distance).contains(&distance) {
            return None;
        }
        Some(GroundHit {
            point: origin + dir * distance,
            normal: Vec3::Y,
        })
    }
}

/// Nothing to stand on
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGround;

impl GroundQuery for NoGround {
    fn cast_ground(&self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> Option<GroundHit> {
        None
    }
}

impl<G: GroundQuery + ?Sized> GroundQuery for &G {
    fn cast_ground(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<GroundHit> {
        (**self).cast_ground(origin, direction, max_distance)
    }
}

/// Avian spatial query restricted to a ground layer mask
#[cfg(feature = "physics")]
pub struct SpatialGround<'a, 'w, 's> {
    pub query: &'a avian3d::prelude::SpatialQuery<'w, 's>,
    pub filter: avian3d::prelude::SpatialQueryFilter,
}

#[cfg(feature = "physics")]
impl<'a, 'w, 's> SpatialGround<'a, 'w, 's> {
    pub fn new(query: &'a avian3d::prelude::SpatialQuery<'w, 's>, ground_layers: avian3d::prelude::LayerMask) -> Self {
        Self {
            query,
            filter: avian3d::prelude::SpatialQueryFilter::from_mask(ground_layers),
        }
    }
}

#[cfg(feature = "physics")]
impl GroundQuery for SpatialGround<'_, '_, '_> {
    fn cast_ground(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<GroundHit> {
        let dir = bevy::math::Dir3::new(direction).ok()?;
        self.query
            .cast_ray(origin, dir, max_distance, true, &self.filter)
            .map(|hit| GroundHit {
                point: origin + *dir * hit.distance,
                normal: hit.normal,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanoid_parents_resolve() {
        let skeleton = Skeleton::humanoid(&BodyDimensions::default());
        assert_eq!(skeleton.len(), HumanoidBone::ALL.len());
        for bone in HumanoidBone::ALL {
            let joint = skeleton.joint(bone.name()).unwrap();
            let parent = joint.parent.map(|i| skeleton.joints()[i].name.clone());
            assert_eq!(parent.as_deref(), bone.parent().map(|p| p.name()));
        }
    }

    #[test]
    fn test_chain_order_and_length() {
        let dims = BodyDimensions::default();
        let skeleton = Skeleton::humanoid(&dims);
        let chain = skeleton.chain("RightUpperArm", "RightHand").unwrap();
        let names: Vec<_> = chain.iter().map(|&i| skeleton.joints()[i].name.as_str()).collect();
        assert_eq!(names, ["RightUpperArm", "RightLowerArm", "RightHand"]);
        let length = skeleton.chain_length("RightUpperArm", "RightHand").unwrap();
        assert!((length - dims.arm_length).abs() < 1e-5);
    }

    #[test]
    fn test_malformed_chain_rejected() {
        let skeleton = Skeleton::humanoid(&BodyDimensions::default());
        let err = skeleton.chain("LeftHand", "LeftUpperArm").unwrap_err();
        assert!(matches!(err, LimbicError::MalformedChain { .. }));
        let err = skeleton.chain("LeftUpperArm", "RightHand").unwrap_err();
        assert!(matches!(err, LimbicError::MalformedChain { .. }));
        assert_eq!(
            skeleton.chain("Tail", "Hips").unwrap_err(),
            LimbicError::UnknownJoint("Tail".into())
        );
    }

    #[test]
    fn test_loaded_skeleton_with_bad_parents_rejected() {
        let dangling: Skeleton = ron::from_str(
            "(joints: [
                (name: \"a\", parent: None, position: (0.0, 0.0, 0.0), rotation: (0.0, 0.0, 0.0, 1.0)),
                (name: \"b\", parent: Some(9), position: (0.0, 1.0, 0.0), rotation: (0.0, 0.0, 0.0, 1.0)),
            ])",
        )
        .unwrap();
        assert_eq!(
            dangling.validate(),
            Err(LimbicError::BadParent {
                joint: "b".into(),
                parent: 9
            })
        );
        assert!(matches!(dangling.chain("a", "b"), Err(LimbicError::MalformedChain { .. })));

        let looped: Skeleton = ron::from_str(
            "(joints: [
                (name: \"a\", parent: None, position: (0.0, 0.0, 0.0), rotation: (0.0, 0.0, 0.0, 1.0)),
                (name: \"b\", parent: Some(1), position: (0.0, 1.0, 0.0), rotation: (0.0, 0.0, 0.0, 1.0)),
            ])",
        )
        .unwrap();
        assert!(matches!(looped.validate(), Err(LimbicError::BadParent { parent: 1, .. })));
        assert!(matches!(looped.chain("a", "b"), Err(LimbicError::MalformedChain { .. })));

        assert!(Skeleton::humanoid(&BodyDimensions::default()).validate().is_ok());
    }

    #[test]
    fn test_limb_rig_requires_mid_on_chain() {
        let skeleton = Skeleton::humanoid(&BodyDimensions::default());
        assert!(skeleton
            .limb_rig("LeftUpperLeg", "RightLowerLeg", "LeftFoot", Vec3::ONE)
            .is_err());
        let rig = skeleton
            .limb_rig("LeftUpperLeg", "LeftLowerLeg", "LeftFoot", Vec3::ONE)
            .unwrap();
        assert!(rig.length() > 0.7);
    }

    #[test]
    fn test_flat_ground_cast() {
        let ground = FlatGround::new(0.0);
        let hit = ground.cast_ground(Vec3::new(1.0, 2.0, 0.0), Vec3::NEG_Y, 3.0).unwrap();
        assert!((hit.point - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
        assert!(ground.cast_ground(Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Y, 1.0).is_none());
        assert!(ground.cast_ground(Vec3::new(0.0, 2.0, 0.0), Vec3::X, 10.0).is_none());
        assert!(NoGround.cast_ground(Vec3::Y, Vec3::NEG_Y, 10.0).is_none());
    }
}
