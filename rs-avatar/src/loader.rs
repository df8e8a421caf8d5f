//! Avatar decoding off the render thread.
//!
//! Jobs run on a tokio blocking pool; finished avatars come back over a
//! channel and are swapped into an [`AvatarSlot`] whole, so the render side
//! never sees a half-built tree.

use std::collections::HashMap;
use std::path::PathBuf;

use rs_nbt::Compound;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, warn};

use crate::avatar::Avatar;
use crate::decode::DecodeOptions;
use crate::error::AvatarError;

/// Whoever the avatar belongs to (usually an entity UUID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(pub u128);

#[derive(Debug, Clone)]
pub enum AvatarSource {
    File(PathBuf),
    Nbt { name: String, root: Compound },
}

struct LoadJob {
    owner: OwnerId,
    generation: u64,
    source: AvatarSource,
    options: DecodeOptions,
}

impl LoadJob {
    fn run(self) -> LoadResult {
        let result = match self.source {
            AvatarSource::File(path) => Avatar::read_file(&path, &self.options),
            AvatarSource::Nbt { name, root } => Ok(Avatar::from_nbt(name, &root, &self.options)),
        };
        LoadResult {
            owner: self.owner,
            generation: self.generation,
            result,
        }
    }
}

struct LoadResult {
    owner: OwnerId,
    generation: u64,
    result: Result<Avatar, AvatarError>,
}

/// A load that finished and was not superseded by a newer request.
#[derive(Debug)]
pub struct LoadedAvatar {
    pub owner: OwnerId,
    pub result: Result<Avatar, AvatarError>,
}

pub struct AvatarLoader {
    job_tx: UnboundedSender<LoadJob>,
    result_rx: UnboundedReceiver<LoadResult>,
    in_flight: HashMap<OwnerId, u64>,
    next_generation: u64,
    options: DecodeOptions,
    // Declared last so the job channel closes before the runtime shuts down.
    _runtime: Runtime,
}

impl AvatarLoader {
    pub fn new(options: DecodeOptions) -> Result<Self, AvatarError> {
        let runtime = Runtime::new()?;
        let (job_tx, mut job_rx) = unbounded_channel::<LoadJob>();
        let (result_tx, result_rx) = unbounded_channel::<LoadResult>();

        runtime.spawn(async move {
            while let Some(job) = job_rx.recv().await {
                let result_tx = result_tx.clone();
                tokio::task::spawn_blocking(move || {
                    let _ = result_tx.send(job.run());
                });
            }
        });

        Ok(Self {
            job_tx,
            result_rx,
            in_flight: HashMap::new(),
            next_generation: 0,
            options,
            _runtime: runtime,
        })
    }

    /// Queues a load for `owner`. Any load still running for the same owner
    /// is superseded and its result will be discarded.
    pub fn request(&mut self, owner: OwnerId, source: AvatarSource) -> Result<(), AvatarError> {
        self.next_generation += 1;
        let generation = self.next_generation;
        if self.in_flight.insert(owner, generation).is_some() {
            debug!(?owner, "superseding pending avatar load");
        }
        let job = LoadJob {
            owner,
            generation,
            source,
            options: self.options.clone(),
        };
        self.job_tx.send(job).map_err(|_| {
            self.in_flight.remove(&owner);
            AvatarError::LoaderClosed
        })
    }

    pub fn is_loading(&self, owner: OwnerId) -> bool {
        self.in_flight.contains_key(&owner)
    }

    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Drains finished loads without blocking.
    pub fn poll(&mut self) -> Vec<LoadedAvatar> {
        let mut done = Vec::new();
        while let Ok(result) = self.result_rx.try_recv() {
            if let Some(loaded) = self.accept(result) {
                done.push(loaded);
            }
        }
        done
    }

    /// Waits for the next current load. `None` once nothing is pending.
    /// Must not be called from inside an async context.
    pub fn recv_blocking(&mut self) -> Option<LoadedAvatar> {
        while !self.in_flight.is_empty() {
            let result = self.result_rx.blocking_recv()?;
            if let Some(loaded) = self.accept(result) {
                return Some(loaded);
            }
        }
        None
    }

    fn accept(&mut self, result: LoadResult) -> Option<LoadedAvatar> {
        if self.in_flight.get(&result.owner) != Some(&result.generation) {
            debug!(owner = ?result.owner, generation = result.generation, "dropping stale avatar load");
            return None;
        }
        self.in_flight.remove(&result.owner);
        if let Err(err) = &result.result {
            warn!(owner = ?result.owner, "avatar load failed: {err}");
        }
        Some(LoadedAvatar {
            owner: result.owner,
            result: result.result,
        })
    }
}

/// Holds the avatar the render side currently draws.
#[derive(Debug, Default)]
pub struct AvatarSlot {
    avatar: Option<Avatar>,
}

impl AvatarSlot {
    /// Swaps in a finished avatar and hands back the previous one.
    pub fn publish(&mut self, avatar: Avatar) -> Option<Avatar> {
        self.avatar.replace(avatar)
    }

    pub fn get(&self) -> Option<&Avatar> {
        self.avatar.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut Avatar> {
        self.avatar.as_mut()
    }

    /// Unloads the current avatar.
    pub fn clear(&mut self) -> Option<Avatar> {
        self.avatar.take()
    }
}
