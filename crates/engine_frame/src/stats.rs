//! Frame statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use engine_render::SyncReport;
use engine_scene::GarbageReport;
use serde::Serialize;

/// A snapshot of the scheduler's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    /// Update phases completed.
    pub frames_updated: u64,
    /// Render phases completed.
    pub frames_rendered: u64,
    /// Proxies created by sync.
    pub proxies_created: u64,
    /// Proxy overwrites by sync.
    pub proxies_updated: u64,
    /// Orphan marks delivered by sync.
    pub proxies_orphaned: u64,
    /// Orphaned proxies removed by the render phase.
    pub proxies_swept: u64,
    /// Proxy writes rejected by the sink.
    pub sync_failures: u64,
    /// Actors, components and materials removed by garbage collection.
    pub objects_destroyed: u64,
}

/// Counters shared between the update thread, the render thread and
/// handles.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    frames_updated: AtomicU64,
    frames_rendered: AtomicU64,
    proxies_created: AtomicU64,
    proxies_updated: AtomicU64,
    proxies_orphaned: AtomicU64,
    proxies_swept: AtomicU64,
    sync_failures: AtomicU64,
    objects_destroyed: AtomicU64,
}

fn add(counter: &AtomicU64, n: usize) {
    counter.fetch_add(n as u64, Ordering::Relaxed);
}

impl StatsRecorder {
    pub(crate) fn record_update(&self, sync: &SyncReport, garbage: &GarbageReport) {
        add(&self.frames_updated, 1);
        add(&self.proxies_created, sync.created);
        add(&self.proxies_updated, sync.updated);
        add(&self.proxies_orphaned, sync.orphaned);
        add(&self.sync_failures, sync.failed);
        add(&self.objects_destroyed, garbage.total());
    }

    pub(crate) fn record_render(&self, swept: usize) {
        add(&self.frames_rendered, 1);
        add(&self.proxies_swept, swept);
    }

    pub(crate) fn snapshot(&self) -> FrameStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        FrameStats {
            frames_updated: load(&self.frames_updated),
            frames_rendered: load(&self.frames_rendered),
            proxies_created: load(&self.proxies_created),
            proxies_updated: load(&self.proxies_updated),
            proxies_orphaned: load(&self.proxies_orphaned),
            proxies_swept: load(&self.proxies_swept),
            sync_failures: load(&self.sync_failures),
            objects_destroyed: load(&self.objects_destroyed),
        }
    }
}
