//! Breadth-first crawl frontier
//!
//! Every URL the crawl learns about gets one slot in an arena, keyed by its
//! normalized form. The slot carries the URL's depth, the page that first
//! linked to it and its [`PageState`]. Index sets over the arena track which
//! slots are queued, visited or failed; the three sets never overlap.
//!
//! The frontier does no I/O. Pacing and persistence belong to the
//! orchestrator.

use crate::state::{PageState, QueuedEntry};
use crate::HarvestError;
use std::collections::{HashMap, HashSet, VecDeque};
use url::Url;

/// One URL known to the crawl
#[derive(Debug, Clone)]
pub struct FrontierSlot {
    pub url: Url,

    /// Link distance from the seed
    pub depth: u32,

    /// Page whose structural links first enqueued this URL; `None` for the seed
    /// and for entries restored from a previous run
    pub parent_url: Option<Url>,

    pub state: PageState,
}

/// A URL taken off the queue, ready to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    pub url: Url,
    pub depth: u32,
    pub parent_url: Option<Url>,
}

/// Outcome of [`Frontier::enqueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Added to the back of the queue
    Queued,

    /// Already queued, visited, failed or skipped
    Known,

    /// Beyond the maximum depth; not recorded
    TooDeep,
}

/// FIFO frontier over an arena of URL slots
#[derive(Debug)]
pub struct Frontier {
    /// Arena of every URL seen this run
    slots: Vec<FrontierSlot>,

    /// Normalized URL -> slot index
    index: HashMap<String, usize>,

    /// Dequeue order
    queue: VecDeque<usize>,

    queued: HashSet<usize>,
    visited: HashSet<usize>,
    failed: HashSet<usize>,

    max_depth: u32,
}

impl Frontier {
    /// Creates an empty frontier admitting URLs up to `max_depth`
    pub fn new(max_depth: u32) -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            failed: HashSet::new(),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Adds `url` to the back of the queue unless it is known or too deep
    ///
    /// `url` must already be normalized.
    pub fn enqueue(&mut self, url: Url, depth: u32, parent_url: Option<&Url>) -> Admission {
        if self.index.contains_key(url.as_str()) {
            return Admission::Known;
        }
        if depth > self.max_depth {
            tracing::debug!("Not queueing {} at depth {} (max {})", url, depth, self.max_depth);
            return Admission::TooDeep;
        }

        let slot = self.slots.len();
        self.index.insert(url.to_string(), slot);
        self.slots.push(FrontierSlot {
            url,
            depth,
            parent_url: parent_url.cloned(),
            state: PageState::Pending,
        });
        self.queue.push_back(slot);
        self.queued.insert(slot);

        Admission::Queued
    }

    /// Takes the oldest queued URL
    ///
    /// The slot stays `Pending` until the caller moves it on with
    /// [`Frontier::transition`]. A URL is dequeued at most once.
    pub fn pop(&mut self) -> Option<QueuedUrl> {
        let slot = self.queue.pop_front()?;
        self.queued.remove(&slot);

        let entry = &self.slots[slot];
        Some(QueuedUrl {
            url: entry.url.clone(),
            depth: entry.depth,
            parent_url: entry.parent_url.clone(),
        })
    }

    /// Moves `url` to `next`, enforcing the page lifecycle
    ///
    /// # Errors
    ///
    /// `HarvestError::InvalidTransition` when the lifecycle forbids the move,
    /// or when `url` is not in the frontier (reported as a move from `Pending`).
    pub fn transition(&mut self, url: &Url, next: PageState) -> Result<(), HarvestError> {
        let Some(&slot) = self.index.get(url.as_str()) else {
            return Err(HarvestError::InvalidTransition {
                url: url.to_string(),
                from: PageState::Pending,
                to: next,
            });
        };

        let current = self.slots[slot].state;
        if !current.can_transition_to(next) || self.queued.contains(&slot) {
            return Err(HarvestError::InvalidTransition {
                url: url.to_string(),
                from: current,
                to: next,
            });
        }

        match next {
            PageState::Rendering => {
                self.visited.insert(slot);
            }
            PageState::Failed => {
                self.visited.remove(&slot);
                self.failed.insert(slot);
            }
            _ => {}
        }

        tracing::trace!("{}: {} -> {}", url, current, next);
        self.slots[slot].state = next;
        Ok(())
    }

    /// True when `url` has a slot in any state
    pub fn is_known(&self, url: &Url) -> bool {
        self.index.contains_key(url.as_str())
    }

    pub fn state_of(&self, url: &Url) -> Option<PageState> {
        self.index.get(url.as_str()).map(|&slot| self.slots[slot].state)
    }

    pub fn slot(&self, url: &Url) -> Option<&FrontierSlot> {
        self.index.get(url.as_str()).map(|&slot| &self.slots[slot])
    }

    /// Number of URLs waiting to be rendered
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// URLs that were rendered or are being rendered, failures excluded
    pub fn visited_urls(&self) -> Vec<Url> {
        self.urls_in(&self.visited)
    }

    pub fn failed_urls(&self) -> Vec<Url> {
        self.urls_in(&self.failed)
    }

    /// URLs of the slots in `set`, in discovery order
    fn urls_in(&self, set: &HashSet<usize>) -> Vec<Url> {
        let mut slots: Vec<usize> = set.iter().copied().collect();
        slots.sort_unstable();
        slots.into_iter().map(|i| self.slots[i].url.clone()).collect()
    }

    /// URLs in `state`, in discovery order
    pub fn urls_with_state(&self, state: PageState) -> Vec<Url> {
        self.slots
            .iter()
            .filter(|slot| slot.state == state)
            .map(|slot| slot.url.clone())
            .collect()
    }

    /// The queue in dequeue order, for persistence
    pub fn queued_entries(&self) -> Vec<QueuedEntry> {
        self.queue
            .iter()
            .map(|&slot| QueuedEntry {
                url: self.slots[slot].url.to_string(),
                depth: self.slots[slot].depth,
            })
            .collect()
    }

    /// Checks the arena's structural invariants
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Queued, visited and failed are disjoint, every slot's state
    ///   agrees with its set membership, and no queued URL is too deep
    /// * `Err(String)` - Description of the first violation found
    pub fn check_invariants(&self) -> Result<(), String> {
        if let Some(slot) = self.queued.intersection(&self.visited).next() {
            return Err(format!("{} is both queued and visited", self.slots[*slot].url));
        }
        if let Some(slot) = self.queued.intersection(&self.failed).next() {
            return Err(format!("{} is both queued and failed", self.slots[*slot].url));
        }
        if let Some(slot) = self.visited.intersection(&self.failed).next() {
            return Err(format!("{} is both visited and failed", self.slots[*slot].url));
        }
        if self.queue.len() != self.queued.len() {
            return Err(format!(
                "queue holds {} entries but {} slots are marked queued",
                self.queue.len(),
                self.queued.len()
            ));
        }

        for (i, slot) in self.slots.iter().enumerate() {
            let expected = match slot.state {
                PageState::Pending => self.queued.contains(&i),
                PageState::Rendering | PageState::Extracting | PageState::Recorded => {
                    self.visited.contains(&i)
                }
                PageState::Failed => self.failed.contains(&i),
                PageState::Skipped => {
                    !self.queued.contains(&i) && !self.visited.contains(&i) && !self.failed.contains(&i)
                }
            };
            if !expected {
                return Err(format!("{} is {} but its index sets disagree", slot.url, slot.state));
            }
            if slot.depth > self.max_depth {
                return Err(format!(
                    "{} has depth {} beyond the maximum {}",
                    slot.url, slot.depth, self.max_depth
                ));
            }
            if let Some(parent) = &slot.parent_url {
                if let Some(parent_slot) = self.slot(parent) {
                    if slot.depth != parent_slot.depth + 1 {
                        return Err(format!(
                            "{} has depth {} but its parent {} has depth {}",
                            slot.url, slot.depth, parent, parent_slot.depth
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}
