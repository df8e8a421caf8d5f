use std::path::PathBuf;

use clap::Parser;
use rs_avatar::{
    AvatarLoader, AvatarSlot, AvatarSource, BonePose, ComplexityBudget, HumanoidPose, OwnerId,
    PoseSource, RecordingBackend, VanillaBone,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser, Debug)]
#[command(name = "rs-client", about = "Loads an avatar and renders it against a recording backend")]
struct Args {
    /// Avatar file (`.moon` is gzip-compressed NBT, anything else raw NBT)
    avatar: PathBuf,

    /// Settings file, defaults to $RS_AVATAR_CONFIG
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the trust complexity
    #[arg(long)]
    complexity: Option<i32>,

    /// Number of frames to render
    #[arg(long)]
    frames: Option<u32>,

    /// Render without a live pose (bonus layer reset)
    #[arg(long)]
    detached: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let settings = config::load(args.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));
    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_env_filter(filter)
        .init();

    info!("Starting rs-client");

    let owner = OwnerId(0);
    let mut loader = AvatarLoader::new(settings.decode.clone())?;
    loader.request(owner, AvatarSource::File(args.avatar.clone()))?;
    let loaded = loader.recv_blocking().ok_or("avatar loader stopped")?;
    let mut slot = AvatarSlot::default();
    slot.publish(loaded.result?);

    let budget =
        ComplexityBudget::from_trust(args.complexity.unwrap_or(settings.render.complexity));
    let frames = args.frames.unwrap_or(settings.render.frames);
    let mut pose = HumanoidPose::default();
    let mut backend = RecordingBackend::default();

    for frame in 0..frames {
        let Some(avatar) = slot.get_mut() else {
            break;
        };
        swing_limbs(&mut pose, frame);
        backend.clear();
        let source: Option<&dyn PoseSource> = if args.detached { None } else { Some(&pose) };
        let stats = avatar.render_frame(source, budget, &mut backend);
        info!(
            frame,
            faces = stats.faces_emitted,
            parts = stats.parts_visited,
            exhausted = stats.exhausted,
            "frame rendered"
        );
        for batch in &backend.batches {
            debug!(
                part = %batch.part,
                index = batch.part_index,
                slot = batch.slot,
                faces = batch.faces,
                primary = %batch.state.primary,
                "batch"
            );
        }
    }

    if let Some(avatar) = slot.get() {
        if !avatar.report().is_clean() {
            warn!(
                warnings = avatar.report().warnings.len(),
                "avatar loaded with warnings"
            );
        }
        info!(
            avatar = avatar.name(),
            parts = avatar.part_count(),
            faces = avatar.total_faces(),
            "done"
        );
    }
    Ok(())
}

/// Simple walk cycle so bound parts move between frames.
fn swing_limbs(pose: &mut HumanoidPose, frame: u32) {
    let swing = (frame as f32 * 0.6662).sin() * 40.0;
    for (bone, sign) in [
        (VanillaBone::LeftArm, -1.0),
        (VanillaBone::RightArm, 1.0),
        (VanillaBone::LeftLeg, 1.0),
        (VanillaBone::RightLeg, -1.0),
    ] {
        let rest = pose.get(bone);
        pose.set(bone, BonePose {
            pos: rest.pos,
            rot: rest.rot.with_x(swing * sign),
        });
    }
}
