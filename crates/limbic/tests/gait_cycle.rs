//! Gait periodicity and partner-leg phase locking.

use limbic::curves::CurveLibrary;
use limbic::limb::Frame;
use limbic::math::wrap_unit;
use limbic::{Character, CharacterConfig, FlatGround, NoGround, Pose, SimContext, Side, Vec3};
use limbic::Locomotion;

const DT: f32 = 1.0 / 60.0;

fn running() -> Locomotion {
    let mut loco = Locomotion::default();
    loco.running = true;
    loco.update(Vec3::new(0.0, 0.0, -5.0), Pose::IDENTITY, true, DT);
    loco
}

#[test]
fn test_partner_legs_stay_half_a_cycle_apart() {
    let mut character = Character::humanoid(CharacterConfig::default()).unwrap();
    let mut ctx = SimContext::new();
    let loco = running();
    for _ in 0..300 {
        ctx.advance(DT);
        let report = character.tick(&ctx, &loco, &FlatGround::new(0.0), DT);
        let phase = |side: Side| {
            report
                .gait
                .iter()
                .find(|(id, _)| id.side == Some(side))
                .map(|(_, s)| s.phase)
                .unwrap()
        };
        let diff = wrap_unit(phase(Side::Left) - phase(Side::Right));
        assert!((diff - 0.5).abs() < 1e-4, "phase difference {diff}");
    }
}

#[test]
fn test_step_path_repeats_every_cycle() {
    let character = Character::humanoid(CharacterConfig::default()).unwrap();
    let leg = character.legs().next().unwrap();
    let ctx = SimContext::new();
    let loco = running();
    let curves = CurveLibrary::builtin();
    let frame = Frame {
        ctx: &ctx,
        locomotion: &loco,
        ground: &NoGround,
        curves: &curves,
        dt: DT,
        gait_clock: 0.0,
        gait: &[],
        attacking: false,
    };
    let length = leg.controller.length();
    for i in 0..50 {
        let p = i as f32 / 50.0;
        let a = leg.strategy.step_offset(p, length, &loco, &frame);
        let b = leg.strategy.step_offset(p + 1.0, length, &loco, &frame);
        assert!((a - b).length() < 1e-4, "phase {p}: {a} vs {b}");
        let ra = leg.strategy.foot_rotation(p, &loco, &frame);
        let rb = leg.strategy.foot_rotation(p + 1.0, &loco, &frame);
        assert!(ra.angle_between(rb) < 1e-3, "phase {p}");
    }
}

#[test]
fn test_clock_advances_at_stride_rate() {
    let mut character = Character::humanoid(CharacterConfig::default()).unwrap();
    let mut ctx = SimContext::new();
    let loco = running();
    for _ in 0..20 {
        ctx.advance(DT);
        character.tick(&ctx, &loco, &NoGround, DT);
    }
    // 1.5 Hz for a third of a second
    assert!((character.gait_clock() - 0.5).abs() < 1e-3);
}
