//! Buffered combos played end to end on a character.

use limbic::combat::{CombatEvent, CombatPhase, InputBuffer};
use limbic::{AttackLevel, Character, CharacterConfig, FlatGround, Locomotion, SimContext, Side};

const DT: f32 = 1.0 / 60.0;

struct Session {
    character: Character,
    ctx: SimContext,
    loco: Locomotion,
    ground: FlatGround,
}

impl Session {
    fn new() -> Self {
        Self {
            character: Character::humanoid(CharacterConfig::default()).unwrap(),
            ctx: SimContext::new(),
            loco: Locomotion::default(),
            ground: FlatGround::new(0.0),
        }
    }

    fn press(&mut self, level: AttackLevel) {
        assert!(self.character.request_attack(level, self.ctx.time));
    }

    fn step(&mut self) -> Option<CombatEvent> {
        self.ctx.advance(DT);
        self.character
            .tick(&self.ctx, &self.loco, &self.ground, DT)
            .combat
    }

    /// Run up to `max_ticks`, pressing Light on the given tick numbers
    fn run(&mut self, max_ticks: usize, presses: &[usize]) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        for i in 0..max_ticks {
            if presses.contains(&i) {
                self.press(AttackLevel::Light);
            }
            events.extend(self.step());
        }
        events
    }
}

#[test]
fn test_three_presses_play_one_combo() {
    let mut session = Session::new();
    // t = 0, 0.2 and 0.45
    let events = session.run(150, &[0, 12, 27]);
    let light = AttackLevel::Light;
    assert_eq!(
        events,
        vec![
            CombatEvent::AttackStarted { level: light },
            CombatEvent::StrikeStarted { level: light, index: 0 },
            CombatEvent::StrikeLanded { level: light, index: 0 },
            CombatEvent::ComboContinued { level: light, index: 1 },
            CombatEvent::StrikeStarted { level: light, index: 1 },
            CombatEvent::StrikeLanded { level: light, index: 1 },
            CombatEvent::ComboContinued { level: light, index: 2 },
            CombatEvent::StrikeStarted { level: light, index: 2 },
            CombatEvent::StrikeLanded { level: light, index: 2 },
            CombatEvent::ComboEnded { level: light },
            CombatEvent::Ready,
        ]
    );
    assert!(session.character.combat_phase().is_idle());
}

#[test]
fn test_single_press_ends_after_one_strike() {
    let mut session = Session::new();
    let events = session.run(120, &[0]);
    let landed = events
        .iter()
        .filter(|e| matches!(e, CombatEvent::StrikeLanded { .. }))
        .count();
    assert_eq!(landed, 1);
    assert_eq!(events.last(), Some(&CombatEvent::Ready));
}

#[test]
fn test_weapon_hand_lands_on_strike_end() {
    let mut session = Session::new();
    session.press(AttackLevel::Light);
    for _ in 0..60 {
        if let Some(CombatEvent::StrikeLanded { index, .. }) = session.step() {
            let end = session.character.weapon().light.strikes[index].major.end;
            let hand = session.character.arm(Side::Right).unwrap().controller.target();
            assert_eq!(hand, end);
            return;
        }
    }
    panic!("strike never landed");
}

#[test]
fn test_arms_resume_during_cooldown() {
    let mut session = Session::new();
    session.press(AttackLevel::Light);
    for _ in 0..60 {
        session.step();
        if matches!(session.character.combat_phase(), CombatPhase::ComboCooldown { .. }) {
            assert!(!session.character.is_attacking());
            return;
        }
    }
    panic!("combo never reached cooldown");
}

#[test]
fn test_interrupt_from_every_phase() {
    let reached: [fn(&CombatPhase) -> bool; 4] = [
        |p| matches!(p, CombatPhase::Prepping { .. }),
        |p| matches!(p, CombatPhase::Striking { .. }),
        |p| matches!(p, CombatPhase::Settling { .. }),
        |p| matches!(p, CombatPhase::ComboCooldown { .. }),
    ];
    for phase_reached in reached {
        let mut session = Session::new();
        session.press(AttackLevel::Heavy);
        while !phase_reached(&session.character.combat_phase()) {
            session.step();
            assert!(session.ctx.time < 5.0, "phase never reached");
        }
        let hand = session.character.arm(Side::Right).unwrap().controller.target();

        assert_eq!(session.character.interrupt(), Some(CombatEvent::Interrupted));
        assert!(session.character.combat_phase().is_idle());
        assert!(session.character.combat().buffer().is_empty());
        // Limbs stay put; they ease back on their own from here
        assert_eq!(session.character.arm(Side::Right).unwrap().controller.target(), hand);

        assert_eq!(session.character.interrupt(), None);
        assert_eq!(session.step(), None);
    }
}

#[test]
fn test_buffer_capacity_and_expiry() {
    let mut buffer = InputBuffer::new(5, 0.5);
    for i in 0..5 {
        assert!(buffer.add(i, i as f32 * 0.1));
    }
    assert!(!buffer.add(99, 0.45));
    assert_eq!(buffer.len(), 5);

    // At t=0.65 the first two presses (t=0, 0.1) are older than 0.5s
    assert_eq!(buffer.pop(0.65), Some(2));
    assert_eq!(buffer.pop(0.65), Some(3));
    assert_eq!(buffer.pop(2.0), None);
    assert!(buffer.is_empty());
}

#[test]
fn test_stale_press_never_starts_an_attack() {
    let mut session = Session::new();
    session.character.request_attack(AttackLevel::Special, -1.0);
    assert_eq!(session.step(), None);
    assert!(session.character.combat_phase().is_idle());
}
