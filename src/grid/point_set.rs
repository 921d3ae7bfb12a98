use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use log::{info, warn};

use crate::geo::GeoPoint;
use crate::grid::point::GridPoint;
use crate::grid::river::RiverSequenceIndex;
use crate::grid::spatial::SpatialIndex;

/// Owns all grid points for one source.
///
/// Lifecycle: **open** (add-only, not queryable) -> **close()** -> **frozen**
/// (read-only, index built, safe for concurrent readers). `close()` is
/// idempotent and race-safe: the write lock serializes racing first callers
/// and only the first performs the build. `free_memory()` drops the frozen
/// arrays and indices and is safe on a never-built or already-freed set.
#[derive(Debug)]
pub struct GridPointSet {
    state: RwLock<SetState>,
}

#[derive(Debug)]
enum SetState {
    Open {
        points: Vec<GridPoint>,
        distinct_locations: HashSet<GeoPoint>,
    },
    Frozen(Arc<FrozenSet>),
    Freed,
}

/// The immutable, queryable form of a point set.
#[derive(Debug)]
pub struct FrozenSet {
    points: Vec<GridPoint>,
    spatial: SpatialIndex,
    river: Option<RiverSequenceIndex>,
}

impl FrozenSet {
    pub fn points(&self) -> &[GridPoint] {
        &self.points
    }

    pub fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    pub fn river(&self) -> Option<&RiverSequenceIndex> {
        self.river.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

impl Default for GridPointSet {
    fn default() -> Self {
        Self::new()
    }
}

impl GridPointSet {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SetState::Open {
                points: Vec::new(),
                distinct_locations: HashSet::new(),
            }),
        }
    }

    /// Adds a point during the open phase. A second point at the same rounded
    /// location is a logged, non-fatal error: the duplicate is dropped.
    /// Adding after freeze is likewise logged and ignored.
    pub fn add(&self, point: GridPoint) {
        let mut state = self.state.write().expect("grid point set lock poisoned");
        match &mut *state {
            SetState::Open { points, distinct_locations } => {
                if !distinct_locations.insert(*point.location()) {
                    warn!(
                        "duplicate grid point at {} dropped during ingestion",
                        point.location()
                    );
                    return;
                }
                points.push(point);
            }
            SetState::Frozen(_) | SetState::Freed => {
                warn!(
                    "grid point at {} ignored: set already frozen",
                    point.location()
                );
            }
        }
    }

    /// Freezes the set: sorts points into a deterministic order and builds
    /// the spatial index, plus the river index when every point carries
    /// sequence metadata. Only the first caller does the work.
    pub fn close(&self) {
        let mut state = self.state.write().expect("grid point set lock poisoned");
        if let SetState::Open { points, .. } = &mut *state {
            let mut points = std::mem::take(points);
            points.sort_by(|a, b| {
                let ka = (a.location().lat(), a.location().lng());
                let kb = (b.location().lat(), b.location().lng());
                ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
            });

            let spatial = SpatialIndex::build(&points);
            let river = if points.is_empty() {
                None
            } else {
                match RiverSequenceIndex::build(&points) {
                    Ok(idx) => Some(idx),
                    Err(_) => {
                        // Plain gridded source; one notice at freeze time,
                        // not per query.
                        info!("no river sequence metadata; riverine interpolation unavailable");
                        None
                    }
                }
            };

            *state = SetState::Frozen(Arc::new(FrozenSet { points, spatial, river }));
        }
    }

    /// The frozen view, freezing first if this is the first query.
    /// `None` after `free_memory()`.
    pub fn frozen(&self) -> Option<Arc<FrozenSet>> {
        {
            let state = self.state.read().expect("grid point set lock poisoned");
            match &*state {
                SetState::Frozen(f) => return Some(Arc::clone(f)),
                SetState::Freed => return None,
                SetState::Open { .. } => {}
            }
        }
        self.close();
        let state = self.state.read().expect("grid point set lock poisoned");
        match &*state {
            SetState::Frozen(f) => Some(Arc::clone(f)),
            _ => None,
        }
    }

    /// Number of points currently held (open or frozen).
    pub fn len(&self) -> usize {
        let state = self.state.read().expect("grid point set lock poisoned");
        match &*state {
            SetState::Open { points, .. } => points.len(),
            SetState::Frozen(f) => f.len(),
            SetState::Freed => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops retained arrays and indices. Idempotent; a freed set answers
    /// queries as empty.
    pub fn free_memory(&self) {
        let mut state = self.state.write().expect("grid point set lock poisoned");
        *state = SetState::Freed;
    }
}
