//! Demo binary: an authority and an observer synchronised over an in-memory wire.

use std::collections::VecDeque;
use std::f32::consts::TAU;
use std::path::PathBuf;

use anchor_sync::{
    init_logging, EntityId, Pose, PoseTransport, PoseUpdate, ReferenceFrameHandle, SyncConfig,
    SyncError, TransformSyncEngine,
};
use anyhow::{Context, Result};
use clap::Parser;
use glam::{Quat, Vec3};
use log::{info, warn};

/// Runs an authority and an observer against each other in memory.
///
/// The two participants see the shared anchor at different places in their
/// own tracking spaces; the observer should still place the entity at the
/// same spot relative to the anchor.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 240)]
    ticks: u32,
    /// JSON file with a sync configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Ticks to wait before the observer locates the anchor
    #[arg(long, default_value_t = 0)]
    anchor_delay: u32,
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

const AVATAR: EntityId = EntityId(1);

/// Carries encoded updates from one engine to the other.
#[derive(Default)]
struct Loopback {
    wire: VecDeque<Vec<u8>>,
}

impl PoseTransport for Loopback {
    fn broadcast(&mut self, update: &PoseUpdate) -> Result<(), SyncError> {
        self.wire.push_back(update.encode()?);
        Ok(())
    }
}

fn avatar_pose(tick: u32) -> Pose {
    let angle = TAU * tick as f32 / 120.0;
    Pose::new(
        Vec3::new(angle.cos() * 2.0, 1.6, angle.sin() * 2.0),
        Quat::from_rotation_y(-angle),
    )
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => SyncConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SyncConfig::default(),
    };
    info!("using {config:?}");

    let host_anchor = Pose::from_position(Vec3::new(0.5, 0.0, -1.0));
    let guest_anchor = Pose::new(Vec3::new(-3.0, 0.0, 2.0), Quat::from_rotation_y(1.2));

    let host_frame = ReferenceFrameHandle::with_pose(host_anchor);
    let guest_frame = ReferenceFrameHandle::new_unset();

    let mut host = TransformSyncEngine::new(config.clone(), host_frame)
        .context("building authority engine")?;
    let mut guest =
        TransformSyncEngine::new(config, guest_frame.clone()).context("building observer engine")?;

    host.register_authority(AVATAR, avatar_pose(0))?;
    guest.register_observer(AVATAR, Pose::IDENTITY)?;

    let mut wire = Loopback::default();
    for tick in 0..args.ticks {
        if tick == args.anchor_delay {
            info!("observer located the anchor at tick {tick}");
            guest_frame.establish(guest_anchor);
        }

        host.set_local_pose(AVATAR, avatar_pose(tick))?;
        host.tick();
        host.flush(&mut wire);

        while let Some(bytes) = wire.wire.pop_front() {
            match PoseUpdate::decode(&bytes).and_then(|update| guest.receive(&update)) {
                Ok(_) => {}
                Err(error) => warn!("observer rejected update: {error}"),
            }
        }
        guest.tick();

        if tick % 30 == 0 {
            report(&host, &guest, host_anchor, guest_anchor, tick);
        }
    }

    info!(
        "done after {} ticks, {} stale samples discarded",
        args.ticks,
        guest.stale_discards()
    );
    Ok(())
}

fn report(
    host: &TransformSyncEngine,
    guest: &TransformSyncEngine,
    host_anchor: Pose,
    guest_anchor: Pose,
    tick: u32,
) {
    let (Some(owned), Some(shown)) = (host.displayed_pose(AVATAR), guest.displayed_pose(AVATAR))
    else {
        return;
    };
    let owned_local = anchor_sync::compute_relative_pose(&host_anchor, &owned);
    let shown_local = anchor_sync::compute_relative_pose(&guest_anchor, &shown);
    info!(
        "tick {tick}: anchor-relative error {:.4} m, {:.4} rad",
        owned_local.distance_to(&shown_local),
        owned_local.angle_to(&shown_local)
    );
}
