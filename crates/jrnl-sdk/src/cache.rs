use std::collections::{HashMap, HashSet};

use futures::future::{BoxFuture, Shared};
use jrnl_types::{Address, Entry};
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::RepoResult;

/// A snapshot of every entry the program holds.
pub type Listing = Vec<(Address, Entry)>;

/// Cached materialization of one value.
///
/// Transitions: `Absent -> Loading -> {Present | Errored}`, `Present ->
/// Loading` on invalidation, `Present | Errored -> Absent` on delete or
/// eviction. Nothing moves from `Absent` to `Present` without passing
/// through `Loading`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheEntry<T> {
    Absent,
    Loading,
    Present(T),
    Errored(String),
}

impl<T> CacheEntry<T> {
    pub fn status(&self) -> CacheStatus {
        match self {
            Self::Absent => CacheStatus::Absent,
            Self::Loading => CacheStatus::Loading,
            Self::Present(_) => CacheStatus::Present,
            Self::Errored(_) => CacheStatus::Errored,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Value-free view of a [`CacheEntry`], carried by [`CacheEvent`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheStatus {
    Absent,
    Loading,
    Present,
    Errored,
}

/// What a cache transition applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Entry(Address),
    /// The shared "list all" bucket.
    List,
}

/// One observable cache transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheEvent {
    pub key: CacheKey,
    pub status: CacheStatus,
}

pub(crate) type EntryFetch = Shared<BoxFuture<'static, RepoResult<Option<Entry>>>>;
pub(crate) type ListFetch = Shared<BoxFuture<'static, RepoResult<Listing>>>;

struct Slot {
    state: CacheEntry<Entry>,
    /// Generation of the fetch or write that owns this slot. A completing
    /// fetch only lands if its generation is still current.
    generation: u64,
    in_flight: Option<EntryFetch>,
    /// Referenced by `get` or `create`, not only by a listing.
    pinned: bool,
}

impl Slot {
    fn absent() -> Self {
        Self {
            state: CacheEntry::Absent,
            generation: 0,
            in_flight: None,
            pinned: false,
        }
    }
}

struct ListBucket {
    state: CacheEntry<Listing>,
    generation: u64,
    in_flight: Option<ListFetch>,
}

/// Per-address slots plus the list bucket. Synchronous; the repository
/// holds it behind a mutex and never across an await.
pub(crate) struct EntryCache {
    slots: HashMap<Address, Slot>,
    list: ListBucket,
    generation: u64,
    events: broadcast::Sender<CacheEvent>,
}

impl EntryCache {
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            slots: HashMap::new(),
            list: ListBucket {
                state: CacheEntry::Absent,
                generation: 0,
                in_flight: None,
            },
            generation: 0,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn emit(&self, key: CacheKey, status: CacheStatus) {
        debug!(?key, ?status, "cache transition");
        // no subscribers is fine
        let _ = self.events.send(CacheEvent { key, status });
    }

    fn set_state(&mut self, address: Address, state: CacheEntry<Entry>) {
        let status = state.status();
        if let Some(slot) = self.slots.get_mut(&address) {
            slot.state = state;
        }
        self.emit(CacheKey::Entry(address), status);
    }

    // ---- per-address slots ----

    pub fn state(&self, address: &Address) -> CacheEntry<Entry> {
        self.slots
            .get(address)
            .map(|slot| slot.state.clone())
            .unwrap_or(CacheEntry::Absent)
    }

    pub fn is_present(&self, address: &Address) -> bool {
        self.slots
            .get(address)
            .is_some_and(|slot| slot.state.is_present())
    }

    /// The cached value, if present. Pins the slot.
    pub fn hit(&mut self, address: &Address) -> Option<Entry> {
        let slot = self.slots.get_mut(address)?;
        let entry = slot.state.value()?.clone();
        slot.pinned = true;
        Some(entry)
    }

    /// The fetch currently loading `address`, if any. Pins the slot.
    pub fn in_flight(&mut self, address: &Address) -> Option<EntryFetch> {
        let slot = self.slots.get_mut(address)?;
        let fetch = slot.in_flight.clone()?;
        slot.pinned = true;
        Some(fetch)
    }

    /// Move `address` to `Loading` under a new generation. The caller must
    /// [`attach`](Self::attach) the fetch it starts for that generation.
    pub fn begin_fetch(&mut self, address: Address, pin: bool) -> u64 {
        let generation = self.next_generation();
        let slot = self.slots.entry(address).or_insert_with(Slot::absent);
        slot.generation = generation;
        slot.in_flight = None;
        slot.pinned |= pin;
        self.set_state(address, CacheEntry::Loading);
        generation
    }

    pub fn attach(&mut self, address: Address, generation: u64, fetch: EntryFetch) {
        if let Some(slot) = self.slots.get_mut(&address) {
            if slot.generation == generation {
                slot.in_flight = Some(fetch);
            }
        }
    }

    /// Land a fetch result. Returns `false` when the fetch was superseded by
    /// an invalidation, a write or a removal and the result was dropped.
    pub fn finish_fetch(
        &mut self,
        address: Address,
        generation: u64,
        result: &RepoResult<Option<Entry>>,
    ) -> bool {
        let Some(slot) = self.slots.get_mut(&address) else {
            return false;
        };
        if slot.generation != generation {
            debug!(address = %address.short_hex(), "dropping superseded fetch result");
            return false;
        }
        slot.in_flight = None;
        match result {
            Ok(Some(entry)) => self.set_state(address, CacheEntry::Present(entry.clone())),
            Ok(None) => {
                self.remove(address);
            }
            Err(err) => self.set_state(address, CacheEntry::Errored(err.to_string())),
        }
        true
    }

    /// Record a value the ledger just confirmed, superseding any in-flight
    /// fetch. Passes through `Loading` when the slot was not already loading.
    pub fn store(&mut self, address: Address, entry: Entry) {
        let generation = self.next_generation();
        let slot = self.slots.entry(address).or_insert_with(Slot::absent);
        slot.generation = generation;
        slot.in_flight = None;
        slot.pinned = true;
        if !slot.state.is_loading() {
            self.set_state(address, CacheEntry::Loading);
        }
        self.set_state(address, CacheEntry::Present(entry));
    }

    /// Force a cached address back to `Loading`. Returns the generation the
    /// refetch must use, or `None` when nothing was cached.
    pub fn invalidate(&mut self, address: Address) -> Option<u64> {
        if !self.slots.contains_key(&address) {
            return None;
        }
        Some(self.begin_fetch(address, false))
    }

    /// Forget a `Present` or `Errored` slot. A slot still loading keeps its
    /// in-flight fetch so later readers attach to it; returns `false` then.
    pub fn evict(&mut self, address: Address) -> bool {
        match self.slots.get(&address) {
            Some(slot) if slot.in_flight.is_some() || slot.state.is_loading() => {
                debug!(address = %address.short_hex(), "not evicting a loading slot");
                false
            }
            Some(_) => self.remove(address),
            None => false,
        }
    }

    /// Drop the slot entirely. Returns whether anything was cached.
    pub fn remove(&mut self, address: Address) -> bool {
        let existed = self.slots.remove(&address).is_some();
        if existed {
            self.emit(CacheKey::Entry(address), CacheStatus::Absent);
        }
        existed
    }

    // ---- list bucket ----

    pub fn list_state(&self) -> CacheEntry<Listing> {
        self.list.state.clone()
    }

    pub fn list_hit(&self) -> Option<Listing> {
        self.list.state.value().cloned()
    }

    pub fn list_in_flight(&self) -> Option<ListFetch> {
        self.list.in_flight.clone()
    }

    pub fn begin_list(&mut self) -> u64 {
        let generation = self.next_generation();
        self.list.generation = generation;
        self.list.in_flight = None;
        self.list.state = CacheEntry::Loading;
        self.emit(CacheKey::List, CacheStatus::Loading);
        generation
    }

    pub fn attach_list(&mut self, generation: u64, fetch: ListFetch) {
        if self.list.generation == generation {
            self.list.in_flight = Some(fetch);
        }
    }

    /// Force a fetched list back to `Loading`; `None` if it was never
    /// fetched.
    pub fn invalidate_list(&mut self) -> Option<u64> {
        if matches!(self.list.state, CacheEntry::Absent) {
            return None;
        }
        Some(self.begin_list())
    }

    /// Replace the bucket wholesale and refresh the per-address slots it
    /// covers.
    pub fn finish_list(&mut self, generation: u64, result: &RepoResult<Listing>) -> bool {
        if self.list.generation != generation {
            debug!("dropping superseded listing");
            return false;
        }
        self.list.in_flight = None;
        match result {
            Ok(listing) => {
                self.populate(listing);
                self.list.state = CacheEntry::Present(listing.clone());
                self.emit(CacheKey::List, CacheStatus::Present);
            }
            Err(err) => {
                self.list.state = CacheEntry::Errored(err.to_string());
                self.emit(CacheKey::List, CacheStatus::Errored);
            }
        }
        true
    }

    fn populate(&mut self, listing: &Listing) {
        let fresh: HashSet<Address> = listing.iter().map(|(address, _)| *address).collect();

        // A pinned slot the ledger no longer lists loses its pin and goes
        // with the next listing unless a read pins it again.
        let mut stale = Vec::new();
        for (address, slot) in self.slots.iter_mut() {
            if fresh.contains(address) || slot.in_flight.is_some() {
                continue;
            }
            if slot.pinned {
                slot.pinned = false;
            } else {
                stale.push(*address);
            }
        }
        for address in stale {
            self.remove(address);
        }

        for (address, entry) in listing {
            if let Some(slot) = self.slots.get(address) {
                if slot.in_flight.is_some() || slot.state.value() == Some(entry) {
                    continue;
                }
            }
            let generation = self.next_generation();
            let slot = self.slots.entry(*address).or_insert_with(Slot::absent);
            slot.generation = generation;
            if !slot.state.is_loading() {
                self.set_state(*address, CacheEntry::Loading);
            }
            self.set_state(*address, CacheEntry::Present(entry.clone()));
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.len()
    }
}
