//! Left/right landmark mirroring on the reference humanoid.

use limbic::landmarks::LandmarkKind;
use limbic::{Character, CharacterConfig, Side, Vec3};

fn mirror(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.y, v.z)
}

#[test]
fn test_mirrored_landmarks_reflect_across_sagittal_plane() {
    let character = Character::humanoid(CharacterConfig::default()).unwrap();
    for side in [Side::Left, Side::Right] {
        let landmarks = character.arm(side).unwrap().controller.landmarks();
        for kind in LandmarkKind::ALL.into_iter().filter(|k| k.is_mirrored()) {
            let left = landmarks.get(kind, Some(Side::Left));
            let right = landmarks.get(kind, Some(Side::Right));
            assert!(
                (mirror(right) - left).length() < 1e-5,
                "{kind:?} from the {side:?} arm: {left} vs {right}"
            );
        }
    }
}

#[test]
fn test_mirrored_limbs_agree() {
    let character = Character::humanoid(CharacterConfig::default()).unwrap();
    let left_arm = character.arm(Side::Left).unwrap().controller.landmarks();
    let right_arm = character.arm(Side::Right).unwrap().controller.landmarks();
    // Every landmark, including the limb-relative ones, mirrors between arms
    for kind in LandmarkKind::ALL {
        let left = left_arm.get(kind, None);
        let right = right_arm.get(kind, None);
        let expected = if kind.is_mirrored() || kind == LandmarkKind::Lowered {
            mirror(right)
        } else {
            right
        };
        assert!((expected - left).length() < 1e-5, "{kind:?}: {left} vs {right}");
    }
}

#[test]
fn test_named_lookup() {
    let character = Character::humanoid(CharacterConfig::default()).unwrap();
    let landmarks = character.arm(Side::Right).unwrap().controller.landmarks();
    assert_eq!(
        landmarks.get_named("face", None).unwrap(),
        landmarks.get(LandmarkKind::Face, None)
    );
    assert!(matches!(
        landmarks.get_named("Elbow", None),
        Err(limbic::LimbicError::UnknownLandmark(_))
    ));
}
