//! # Limbic Treadmill
//!
//! Headless harness that runs one procedurally animated character on a
//! flat floor (or over nothing) and logs what the IK solver would receive.
//!
//! ## Usage
//!
//! ```bash
//! # Walk forward for three seconds
//! treadmill --speed 2
//!
//! # Run, throwing a three-hit light combo
//! treadmill --run --speed 5 --attack light@0 --attack light@0.2 --attack light@0.45
//!
//! # Start a heavy attack and cut it short
//! treadmill --attack heavy@0.5 --interrupt-at 0.7
//!
//! # Print the effective tuning as RON
//! treadmill --config tuning.ron --dump-config
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use limbic::{
    AttackLevel, Character, CharacterConfig, CombatEvent, FlatGround, GroundQuery, Locomotion, NoGround, Pose,
    SimContext, TickReport, Vec3,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "treadmill")]
#[command(about = "Run a procedurally animated character headless and log its IK targets")]
#[command(version)]
struct Args {
    /// Character tuning (RON); defaults are used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds to simulate
    #[arg(short, long, default_value = "3.0")]
    duration: f32,

    /// Ticks per second
    #[arg(short, long, default_value = "60")]
    tick_rate: u32,

    /// Forward speed (m/s)
    #[arg(short, long, default_value = "0.0", allow_negative_numbers = true)]
    speed: f32,

    /// Sideways speed (m/s, positive is right)
    #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
    strafe: f32,

    /// Run instead of walk
    #[arg(long)]
    run: bool,

    #[arg(long)]
    crouch: bool,

    /// Hold the guard pose with both hands
    #[arg(long)]
    guard: bool,

    /// Attack press as LEVEL@SECONDS, e.g. light@0.2 (repeatable)
    #[arg(short, long = "attack", value_parser = parse_press)]
    attacks: Vec<Press>,

    /// Interrupt the combo at this time
    #[arg(long)]
    interrupt_at: Option<f32>,

    /// Floor height
    #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
    floor: f32,

    /// No floor at all: the character falls the whole time
    #[arg(long)]
    void: bool,

    /// Freeze the generators; only springs move
    #[arg(long)]
    dev: bool,

    /// Log limb targets every N ticks (0 disables)
    #[arg(long, default_value = "15")]
    report_every: u64,

    /// Print the effective config as RON and exit
    #[arg(long)]
    dump_config: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// One scripted attack press
#[derive(Debug, Clone, Copy)]
struct Press {
    level: AttackLevel,
    at: f32,
}

fn parse_press(s: &str) -> std::result::Result<Press, String> {
    let (level, at) = s
        .split_once('@')
        .ok_or_else(|| format!("expected LEVEL@SECONDS, got '{s}'"))?;
    let level = level.parse::<AttackLevel>().map_err(|e| e.to_string())?;
    let at = at
        .parse::<f32>()
        .map_err(|e| format!("bad press time '{at}': {e}"))?;
    if !at.is_finite() || at < 0.0 {
        return Err(format!("press time must be a non-negative number, got {at}"));
    }
    Ok(Press { level, at })
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &args.config {
        Some(path) => CharacterConfig::load(path)
            .with_context(|| format!("loading character config {}", path.display()))?,
        None => CharacterConfig::default(),
    };

    if args.dump_config {
        println!("{}", config.to_ron_string()?);
        return Ok(());
    }

    if args.tick_rate == 0 {
        bail!("tick rate must be at least 1");
    }
    if !args.duration.is_finite() || args.duration < 0.0 {
        bail!("duration must be a non-negative number");
    }

    let mut character = Character::humanoid(config).context("building character")?;

    let ground: Box<dyn GroundQuery> = if args.void {
        Box::new(NoGround)
    } else {
        Box::new(FlatGround::new(args.floor))
    };

    let summary = run(&args, &mut character, ground.as_ref());
    info!(
        "Done: {} ticks, {} strikes landed, {} combos, {} interrupts",
        summary.ticks, summary.landed, summary.combos, summary.interrupts
    );
    Ok(())
}

// ============================================================================
// Simulation
// ============================================================================

#[derive(Debug, Default)]
struct Summary {
    ticks: u64,
    landed: u32,
    combos: u32,
    interrupts: u32,
}

impl Summary {
    fn record(&mut self, event: CombatEvent) {
        match event {
            CombatEvent::StrikeLanded { .. } => self.landed += 1,
            CombatEvent::ComboEnded { .. } => self.combos += 1,
            CombatEvent::Interrupted => self.interrupts += 1,
            _ => {}
        }
    }
}

fn run(args: &Args, character: &mut Character, ground: &dyn GroundQuery) -> Summary {
    let dt = 1.0 / args.tick_rate as f32;
    let ticks = (args.duration * args.tick_rate as f32).round() as u64;

    let mut ctx = SimContext::new();
    ctx.dev_mode = args.dev;

    let mut loco = Locomotion::new(&character.config().locomotion);
    loco.running = args.run;
    loco.crouching = args.crouch;
    loco.guarding = args.guard;
    let velocity = Vec3::new(args.strafe, 0.0, -args.speed);

    let mut presses = args.attacks.clone();
    presses.sort_by(|a, b| a.at.total_cmp(&b.at));
    let mut presses = presses.into_iter().peekable();
    let mut interrupt_at = args.interrupt_at;

    info!(
        "Treadmill: {:.2}s at {} Hz, velocity {}, {} presses",
        args.duration,
        args.tick_rate,
        velocity,
        args.attacks.len()
    );

    let mut summary = Summary::default();
    for _ in 0..ticks {
        while let Some(press) = presses.next_if(|p| p.at <= ctx.time) {
            if !character.request_attack(press.level, ctx.time) {
                warn!("Dropped {:?} press at {:.2}s", press.level, press.at);
            }
        }
        if let Some(at) = interrupt_at.filter(|at| *at <= ctx.time) {
            interrupt_at = None;
            match character.interrupt() {
                Some(event) => {
                    info!("[{:>6.3}s] {:?}", ctx.time, event);
                    summary.record(event);
                }
                None => debug!("Interrupt at {:.2}s found nothing to cancel", at),
            }
        }

        ctx.advance(dt);
        loco.update(velocity, Pose::IDENTITY, !args.void, dt);
        let report = character.tick(&ctx, &loco, ground, dt);
        summary.ticks += 1;

        if let Some(event) = report.combat {
            info!("[{:>6.3}s] {:?}", ctx.time, event);
            summary.record(event);
        }
        if args.report_every > 0 && ctx.frame % args.report_every == 0 {
            log_frame(&ctx, character, &report);
        }
    }
    summary
}

fn log_frame(ctx: &SimContext, character: &Character, report: &TickReport) {
    info!("[{:>6.3}s] frame {} clock {:.3}", ctx.time, ctx.frame, character.gait_clock());
    for (id, sample) in &report.gait {
        info!(
            "  {:<10} {:?} phase {:.2} foot {:.3}",
            id.to_string(),
            sample.state,
            sample.phase,
            sample.foot
        );
    }
    for (id, behavior) in &report.arms {
        debug!("  {:<10} {:?}", id.to_string(), behavior);
    }
    if let Some(torso) = &report.torso {
        debug!("  torso      bounce {:.3} lean {:.3}", torso.bounce, torso.lean);
    }
    let targets = character.ik_targets();
    for target in &targets.limbs {
        let offset = character.limb(target.id).map(|limb| limb.target_offset()).unwrap_or_default();
        debug!(
            "  ik {:<7} target {:.3} off rest {:.3} hint {:?}",
            target.id.to_string(),
            target.target.position,
            offset,
            target.hint
        );
    }
    debug!("  head {:.3} hips {:.3}", targets.head.position, targets.hips);
}
