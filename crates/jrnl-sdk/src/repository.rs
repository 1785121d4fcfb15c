use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use jrnl_crypto::AddressDeriver;
use jrnl_ledger::{Instruction, LedgerClient, OperationKind};
use jrnl_types::{validate_message, validate_title, Address, ConfirmationToken, Entry, Identity};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheEvent, EntryCache, EntryFetch, ListFetch, Listing};
use crate::error::{RepoError, RepoResult};
use crate::operation::{OperationLog, OperationRecord, OperationStatus};

const EVENT_CAPACITY: usize = 256;

/// Journal entry data access: mutations through a [`LedgerClient`], reads
/// through a typed cache.
///
/// Cheap to clone; clones share one cache.
#[derive(Clone)]
pub struct EntryRepository {
    inner: Arc<Inner>,
}

struct Inner {
    ledger: Arc<dyn LedgerClient>,
    program: Identity,
    cache: Mutex<EntryCache>,
    operations: OperationLog,
}

impl EntryRepository {
    pub fn new(ledger: Arc<dyn LedgerClient>, program: Identity) -> Self {
        debug!(backend = ledger.backend(), program = %program.short_id(), "entry repository ready");
        Self {
            inner: Arc::new(Inner {
                ledger,
                program,
                cache: Mutex::new(EntryCache::new(EVENT_CAPACITY)),
                operations: OperationLog::default(),
            }),
        }
    }

    pub fn program(&self) -> Identity {
        self.inner.program
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerClient> {
        &self.inner.ledger
    }

    /// Address of the entry `owner` would hold under `title`.
    pub fn address_of(&self, title: &str, owner: &Identity) -> RepoResult<Address> {
        let (address, _) = AddressDeriver::ENTRY.derive(title, owner, &self.inner.program)?;
        Ok(address)
    }

    // ---- Mutations ----

    /// Create a new entry. Fails [`RepoError::DuplicateEntry`] when the
    /// address is already cached or the ledger already holds it.
    pub async fn create(
        &self,
        title: &str,
        message: &str,
        owner: Option<&Identity>,
    ) -> RepoResult<ConfirmationToken> {
        let owner = owner.ok_or(RepoError::WalletNotConnected)?;
        validate_title(title)?;
        validate_message(message)?;
        let address = self.address_of(title, owner)?;
        if self.inner.cache().is_present(&address) {
            return Err(RepoError::DuplicateEntry(address));
        }
        self.mutate(*owner, address, Instruction::create(title, message))
            .await
    }

    /// Replace the message of an existing entry.
    ///
    /// The title selects the address, so a title the owner never created
    /// fails [`RepoError::EntryNotFound`] without submitting anything.
    pub async fn update(
        &self,
        title: &str,
        message: &str,
        owner: Option<&Identity>,
    ) -> RepoResult<ConfirmationToken> {
        let owner = owner.ok_or(RepoError::WalletNotConnected)?;
        validate_title(title)?;
        validate_message(message)?;
        let address = self.address_of(title, owner)?;
        self.get(&address).await?;
        self.mutate(*owner, address, Instruction::update(title, message))
            .await
    }

    pub async fn delete(&self, title: &str, owner: Option<&Identity>) -> RepoResult<ConfirmationToken> {
        let owner = owner.ok_or(RepoError::WalletNotConnected)?;
        validate_title(title)?;
        let address = self.address_of(title, owner)?;
        self.get(&address).await?;
        self.mutate(*owner, address, Instruction::delete(title)).await
    }

    /// Submit on a spawned task so that a dropped caller cannot abandon a
    /// submission halfway through its cache update.
    async fn mutate(
        &self,
        owner: Identity,
        address: Address,
        instruction: Instruction,
    ) -> RepoResult<ConfirmationToken> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(inner.apply(owner, address, instruction))
            .await
            .map_err(|e| RepoError::SubmissionFailed(format!("submission task failed: {e}")))?
    }

    // ---- Reads ----

    /// One entry, from cache when present. Concurrent callers for the same
    /// address share a single ledger fetch.
    pub async fn get(&self, address: &Address) -> RepoResult<Entry> {
        let fetch = {
            let mut cache = self.inner.cache();
            if let Some(entry) = cache.hit(address) {
                return Ok(entry);
            }
            match cache.in_flight(address) {
                Some(fetch) => {
                    debug!(address = %address.short_hex(), "joining in-flight fetch");
                    fetch
                }
                None => {
                    let generation = cache.begin_fetch(*address, true);
                    self.inner.spawn_fetch(&mut cache, *address, generation)
                }
            }
        };
        fetch.await?.ok_or(RepoError::EntryNotFound(*address))
    }

    /// Every entry of the program. Single-flight like [`get`](Self::get).
    pub async fn list(&self) -> RepoResult<Listing> {
        let fetch = {
            let mut cache = self.inner.cache();
            if let Some(listing) = cache.list_hit() {
                return Ok(listing);
            }
            match cache.list_in_flight() {
                Some(fetch) => fetch,
                None => {
                    let generation = cache.begin_list();
                    self.inner.spawn_list(&mut cache, generation)
                }
            }
        };
        fetch.await
    }

    /// Whether the journal program is deployed on the ledger's cluster.
    pub async fn program_deployed(&self) -> RepoResult<bool> {
        self.inner
            .ledger
            .program_deployed(&self.inner.program)
            .await
            .map_err(RepoError::from_fetch)
    }

    // ---- Cache inspection ----

    pub fn state(&self, address: &Address) -> CacheEntry<Entry> {
        self.inner.cache().state(address)
    }

    pub fn list_state(&self) -> CacheEntry<Listing> {
        self.inner.cache().list_state()
    }

    /// Forget one cached entry so the next `get` refetches it. An entry
    /// still loading is left alone and `false` returned.
    pub fn evict(&self, address: &Address) -> bool {
        self.inner.cache().evict(*address)
    }

    /// Stream of cache transitions, for a presentation layer.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.cache().subscribe()
    }

    /// The latest `kind` mutation submitted against `address`.
    pub fn operation(&self, kind: OperationKind, address: &Address) -> Option<OperationRecord> {
        self.inner.operations.get(kind, address)
    }
}

impl Inner {
    fn cache(&self) -> MutexGuard<'_, EntryCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn apply(
        self: Arc<Self>,
        owner: Identity,
        address: Address,
        instruction: Instruction,
    ) -> RepoResult<ConfirmationToken> {
        let kind = instruction.kind();
        self.operations.begin(kind, address, owner);
        match self.ledger.submit(&owner, &address, &instruction).await {
            Ok(token) => {
                info!(
                    op = %kind,
                    address = %address.short_hex(),
                    token = %token.short(),
                    "entry mutation confirmed"
                );
                self.operations
                    .complete(kind, address, OperationStatus::Succeeded(token.clone()));
                if kind == OperationKind::Delete {
                    self.operations.forget_entry(&address);
                }
                self.settle(owner, address, instruction);
                Ok(token)
            }
            Err(err) => {
                warn!(op = %kind, address = %address.short_hex(), error = %err, "entry mutation failed");
                self.operations
                    .complete(kind, address, OperationStatus::Failed(err.to_string()));
                Err(RepoError::from_submit(err, address))
            }
        }
    }

    /// Bring the cache in line with a confirmed mutation.
    fn settle(self: &Arc<Self>, owner: Identity, address: Address, instruction: Instruction) {
        let mut cache = self.cache();
        match instruction {
            Instruction::Create { title, message } => {
                cache.store(address, Entry::new(owner, title, message));
            }
            Instruction::Update { .. } => {
                if let Some(generation) = cache.invalidate(address) {
                    // lands through the spawned task; nobody awaits it here
                    let _refetch = self.spawn_fetch(&mut cache, address, generation);
                }
            }
            Instruction::Delete { .. } => {
                cache.remove(address);
            }
        }
        if let Some(generation) = cache.invalidate_list() {
            let _relist = self.spawn_list(&mut cache, generation);
        }
    }

    /// Start loading `address` for `generation` and register the shared
    /// handle. The fetch lands in the cache even if every caller goes away.
    fn spawn_fetch(
        self: &Arc<Self>,
        cache: &mut EntryCache,
        address: Address,
        generation: u64,
    ) -> EntryFetch {
        let inner = Arc::clone(self);
        let task = tokio::spawn(async move {
            let result = inner
                .ledger
                .fetch_one(&address)
                .await
                .map_err(RepoError::from_fetch);
            inner.cache().finish_fetch(address, generation, &result);
            result
        });

        let inner = Arc::clone(self);
        let fetch = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    let result: RepoResult<Option<Entry>> =
                        Err(RepoError::FetchFailed(format!("fetch task failed: {e}")));
                    inner.cache().finish_fetch(address, generation, &result);
                    result
                }
            }
        }
        .boxed()
        .shared();

        cache.attach(address, generation, fetch.clone());
        fetch
    }

    fn spawn_list(self: &Arc<Self>, cache: &mut EntryCache, generation: u64) -> ListFetch {
        let inner = Arc::clone(self);
        let task = tokio::spawn(async move {
            let result = inner
                .ledger
                .fetch_all(&inner.program)
                .await
                .map_err(RepoError::from_fetch);
            inner.cache().finish_list(generation, &result);
            result
        });

        let inner = Arc::clone(self);
        let fetch = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    let result: RepoResult<Listing> =
                        Err(RepoError::FetchFailed(format!("list task failed: {e}")));
                    inner.cache().finish_list(generation, &result);
                    result
                }
            }
        }
        .boxed()
        .shared();

        cache.attach_list(generation, fetch.clone());
        fetch
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use futures::future::join_all;
    use jrnl_ledger::{LedgerError, LedgerResult, SimulatedConfig, SimulatedLedgerClient};
    use jrnl_types::TypeError;

    use super::*;
    use crate::cache::CacheStatus;

    const PROGRAM: Identity = Identity::from_bytes([0x4f; 32]);

    fn simulated(config: SimulatedConfig) -> (Arc<SimulatedLedgerClient>, EntryRepository) {
        let ledger = Arc::new(SimulatedLedgerClient::new(PROGRAM, config));
        let repo = EntryRepository::new(ledger.clone(), PROGRAM);
        (ledger, repo)
    }

    fn instant() -> (Arc<SimulatedLedgerClient>, EntryRepository) {
        simulated(SimulatedConfig::instant())
    }

    /// Ledger whose reads always fail.
    struct BrokenLedger {
        error: LedgerError,
    }

    #[async_trait]
    impl LedgerClient for BrokenLedger {
        fn program(&self) -> Identity {
            PROGRAM
        }

        fn backend(&self) -> &'static str {
            "broken"
        }

        async fn submit(
            &self,
            _owner: &Identity,
            _address: &Address,
            _instruction: &Instruction,
        ) -> LedgerResult<ConfirmationToken> {
            Err(self.error.clone())
        }

        async fn fetch_one(&self, _address: &Address) -> LedgerResult<Option<Entry>> {
            Err(self.error.clone())
        }

        async fn fetch_all(&self, _program: &Identity) -> LedgerResult<Vec<(Address, Entry)>> {
            Err(self.error.clone())
        }

        async fn program_deployed(&self, _program: &Identity) -> LedgerResult<bool> {
            Err(self.error.clone())
        }
    }

    #[test]
    fn address_of_is_deterministic() {
        let (_, repo) = instant();
        let owner = Identity::from_bytes([1; 32]);
        assert_eq!(
            repo.address_of("Day 1", &owner).unwrap(),
            repo.address_of("Day 1", &owner).unwrap()
        );
        assert_ne!(
            repo.address_of("Day 1", &owner).unwrap(),
            repo.address_of("Day 2", &owner).unwrap()
        );
    }

    #[tokio::test]
    async fn day_one_end_to_end() {
        let (_, repo) = instant();
        let owner = Identity::ephemeral();
        let address = repo.address_of("Day 1", &owner).unwrap();

        repo.create("Day 1", "Hello", Some(&owner)).await.unwrap();
        assert_eq!(
            repo.get(&address).await.unwrap(),
            Entry::new(owner, "Day 1", "Hello")
        );

        repo.update("Day 1", "Hello world", Some(&owner)).await.unwrap();
        assert_eq!(repo.get(&address).await.unwrap().message, "Hello world");

        repo.delete("Day 1", Some(&owner)).await.unwrap();
        assert_eq!(
            repo.get(&address).await.unwrap_err(),
            RepoError::EntryNotFound(address)
        );
        assert!(repo.list().await.unwrap().iter().all(|(a, _)| *a != address));
        assert_eq!(repo.state(&address), CacheEntry::Absent);
    }

    #[tokio::test]
    async fn validation_failures_never_reach_the_ledger() {
        let (ledger, repo) = instant();
        let owner = Identity::ephemeral();

        assert_eq!(
            repo.create("", "m", Some(&owner)).await.unwrap_err(),
            RepoError::Validation(TypeError::EmptyTitle)
        );
        assert!(matches!(
            repo.create(&"t".repeat(281), "m", Some(&owner)).await,
            Err(RepoError::Validation(TypeError::TitleTooLong { .. }))
        ));
        assert!(matches!(
            repo.create("t", &"m".repeat(281), Some(&owner)).await,
            Err(RepoError::Validation(TypeError::MessageTooLong { .. }))
        ));
        assert!(matches!(
            repo.update("t", &"m".repeat(281), Some(&owner)).await,
            Err(RepoError::Validation(_))
        ));
        assert_eq!(ledger.submit_count(), 0);
        assert_eq!(ledger.fetch_one_count(), 0);
    }

    #[tokio::test]
    async fn limits_are_inclusive() {
        let (_, repo) = instant();
        let owner = Identity::ephemeral();
        let title = "t".repeat(280);
        repo.create(&title, &"m".repeat(280), Some(&owner))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn mutations_require_a_wallet() {
        let (ledger, repo) = instant();
        assert_eq!(
            repo.create("Day 1", "Hello", None).await.unwrap_err(),
            RepoError::WalletNotConnected
        );
        assert_eq!(
            repo.update("Day 1", "Hello", None).await.unwrap_err(),
            RepoError::WalletNotConnected
        );
        assert_eq!(
            repo.delete("Day 1", None).await.unwrap_err(),
            RepoError::WalletNotConnected
        );
        assert_eq!(ledger.submit_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_gets_share_one_fetch() {
        let (ledger, repo) = simulated(SimulatedConfig {
            fetch_latency: Duration::from_millis(50),
            ..SimulatedConfig::instant()
        });
        let owner = Identity::ephemeral();
        repo.create("Day 1", "Hello", Some(&owner)).await.unwrap();
        let address = repo.address_of("Day 1", &owner).unwrap();
        repo.evict(&address);

        let results = join_all((0..16).map(|_| repo.get(&address))).await;

        assert_eq!(ledger.fetch_one_count(), 1);
        for result in results {
            assert_eq!(result.unwrap().message, "Hello");
        }
    }

    #[tokio::test]
    async fn concurrent_lists_share_one_fetch() {
        let (ledger, repo) = simulated(SimulatedConfig {
            fetch_latency: Duration::from_millis(50),
            ..SimulatedConfig::default()
        });
        let results = join_all((0..8).map(|_| repo.list())).await;
        assert_eq!(ledger.fetch_all_count(), 1);
        for result in results {
            assert_eq!(result.unwrap().len(), 2);
        }
    }

    #[tokio::test]
    async fn abandoned_get_still_populates_cache() {
        let (_, repo) = simulated(SimulatedConfig {
            fetch_latency: Duration::from_millis(20),
            ..SimulatedConfig::instant()
        });
        let owner = Identity::ephemeral();
        repo.create("Day 1", "Hello", Some(&owner)).await.unwrap();
        let address = repo.address_of("Day 1", &owner).unwrap();
        repo.evict(&address);

        let timed_out = tokio::time::timeout(Duration::from_millis(1), repo.get(&address)).await;
        assert!(timed_out.is_err());
        assert_eq!(repo.state(&address), CacheEntry::Loading);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(repo.state(&address).status(), CacheStatus::Present);
    }

    #[tokio::test]
    async fn successful_update_invalidates() {
        let (_, repo) = instant();
        let owner = Identity::ephemeral();
        let address = repo.address_of("Day 1", &owner).unwrap();
        repo.create("Day 1", "Hello", Some(&owner)).await.unwrap();
        repo.list().await.unwrap();

        repo.update("Day 1", "Hello again", Some(&owner)).await.unwrap();
        assert_ne!(
            repo.state(&address),
            CacheEntry::Present(Entry::new(owner, "Day 1", "Hello"))
        );
        assert_eq!(repo.get(&address).await.unwrap().message, "Hello again");

        let listing = repo.list().await.unwrap();
        let (_, listed) = listing.iter().find(|(a, _)| *a == address).unwrap();
        assert_eq!(listed.message, "Hello again");
    }

    #[tokio::test]
    async fn failed_update_leaves_cache_untouched() {
        let (ledger, repo) = instant();
        let owner = Identity::ephemeral();
        let address = repo.address_of("Day 1", &owner).unwrap();
        repo.create("Day 1", "Hello", Some(&owner)).await.unwrap();
        let before = repo.list().await.unwrap();

        ledger.fail_submissions("blockhash expired");
        assert_eq!(
            repo.update("Day 1", "Hello again", Some(&owner))
                .await
                .unwrap_err(),
            RepoError::SubmissionFailed("blockhash expired".into())
        );

        assert_eq!(
            repo.state(&address),
            CacheEntry::Present(Entry::new(owner, "Day 1", "Hello"))
        );
        assert_eq!(repo.list_state(), CacheEntry::Present(before));

        let record = repo.operation(OperationKind::Update, &address).unwrap();
        assert_eq!(record.status, OperationStatus::Failed("submission failed: blockhash expired".into()));
    }

    #[tokio::test]
    async fn failed_delete_leaves_cache_untouched() {
        let (ledger, repo) = instant();
        let owner = Identity::ephemeral();
        let address = repo.address_of("Day 1", &owner).unwrap();
        repo.create("Day 1", "Hello", Some(&owner)).await.unwrap();
        let before = repo.list().await.unwrap();

        ledger.fail_submissions("node restarting");
        assert_eq!(
            repo.delete("Day 1", Some(&owner)).await.unwrap_err(),
            RepoError::SubmissionFailed("node restarting".into())
        );

        assert_eq!(
            repo.state(&address),
            CacheEntry::Present(Entry::new(owner, "Day 1", "Hello"))
        );
        assert_eq!(repo.list_state(), CacheEntry::Present(before));
        assert_eq!(ledger.entry_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_create_leaves_cache_untouched() {
        let (ledger, repo) = instant();
        let owner = Identity::ephemeral();
        let address = repo.address_of("Day 1", &owner).unwrap();
        let before = repo.list().await.unwrap();

        ledger.fail_submissions("node restarting");
        assert_eq!(
            repo.create("Day 1", "Hello", Some(&owner)).await.unwrap_err(),
            RepoError::SubmissionFailed("node restarting".into())
        );

        assert_eq!(repo.state(&address), CacheEntry::Absent);
        assert_eq!(repo.list_state(), CacheEntry::Present(before));
        assert_eq!(ledger.entry_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn evicting_a_loading_entry_keeps_one_fetch() {
        let (ledger, repo) = simulated(SimulatedConfig {
            fetch_latency: Duration::from_millis(100),
            ..SimulatedConfig::instant()
        });
        let owner = Identity::ephemeral();
        repo.create("Day 1", "Hello", Some(&owner)).await.unwrap();
        let address = repo.address_of("Day 1", &owner).unwrap();
        assert!(repo.evict(&address));

        let first = tokio::spawn({
            let repo = repo.clone();
            async move { repo.get(&address).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(repo.state(&address), CacheEntry::Loading);
        assert!(!repo.evict(&address));

        let second = repo.get(&address).await.unwrap();
        assert_eq!(second.message, "Hello");
        assert_eq!(first.await.unwrap().unwrap(), second);
        assert_eq!(ledger.fetch_one_count(), 1);
    }

    #[tokio::test]
    async fn delete_drops_the_entry_history() {
        let (_, repo) = instant();
        let owner = Identity::ephemeral();
        let address = repo.address_of("Day 1", &owner).unwrap();
        repo.create("Day 1", "Hello", Some(&owner)).await.unwrap();
        repo.update("Day 1", "Hello world", Some(&owner)).await.unwrap();
        repo.delete("Day 1", Some(&owner)).await.unwrap();

        assert!(repo.operation(OperationKind::Create, &address).is_none());
        assert!(repo.operation(OperationKind::Update, &address).is_none());
        let record = repo.operation(OperationKind::Delete, &address).unwrap();
        assert!(matches!(record.status, OperationStatus::Succeeded(_)));
    }

    #[tokio::test]
    async fn program_deployment_is_checked() {
        let (_, repo) = instant();
        assert!(repo.program_deployed().await.unwrap());

        let ledger = Arc::new(SimulatedLedgerClient::new(PROGRAM, SimulatedConfig::instant()));
        let other = Identity::from_bytes([0x11; 32]);
        let stray = EntryRepository::new(ledger, other);
        assert!(!stray.program_deployed().await.unwrap());
        assert_eq!(
            stray.list().await.unwrap_err(),
            RepoError::ProgramNotDeployed(other)
        );
        assert_eq!(stray.list_state().status(), CacheStatus::Errored);
    }

    #[tokio::test]
    async fn create_moves_slot_through_loading() {
        let (_, repo) = instant();
        let owner = Identity::ephemeral();
        let address = repo.address_of("Day 1", &owner).unwrap();
        let mut events = repo.subscribe();

        repo.create("Day 1", "Hello", Some(&owner)).await.unwrap();

        let mut statuses = Vec::new();
        while let Ok(event) = events.try_recv() {
            if event.key == crate::cache::CacheKey::Entry(address) {
                statuses.push(event.status);
            }
        }
        assert_eq!(statuses, vec![CacheStatus::Loading, CacheStatus::Present]);
        let record = repo.operation(OperationKind::Create, &address).unwrap();
        assert!(matches!(record.status, OperationStatus::Succeeded(_)));
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let (ledger, repo) = instant();
        let owner = Identity::ephemeral();
        let address = repo.address_of("Day 1", &owner).unwrap();
        repo.create("Day 1", "Hello", Some(&owner)).await.unwrap();

        // cached: rejected locally
        assert_eq!(
            repo.create("Day 1", "again", Some(&owner)).await.unwrap_err(),
            RepoError::DuplicateEntry(address)
        );
        assert_eq!(ledger.submit_count(), 1);

        // not cached: the ledger rejects it
        repo.evict(&address);
        assert_eq!(
            repo.create("Day 1", "again", Some(&owner)).await.unwrap_err(),
            RepoError::DuplicateEntry(address)
        );
        assert_eq!(ledger.submit_count(), 2);
    }

    #[tokio::test]
    async fn update_of_unknown_title_is_not_found() {
        let (ledger, repo) = instant();
        let owner = Identity::ephemeral();
        repo.create("Day 1", "Hello", Some(&owner)).await.unwrap();

        let renamed = repo.address_of("Day 2", &owner).unwrap();
        assert_eq!(
            repo.update("Day 2", "Hello", Some(&owner)).await.unwrap_err(),
            RepoError::EntryNotFound(renamed)
        );
        assert_eq!(
            repo.delete("Day 2", Some(&owner)).await.unwrap_err(),
            RepoError::EntryNotFound(renamed)
        );
        assert_eq!(ledger.submit_count(), 1);
    }

    #[tokio::test]
    async fn entries_are_scoped_to_their_owner() {
        let (_, repo) = instant();
        let alice = Identity::ephemeral();
        let bob = Identity::ephemeral();
        repo.create("Day 1", "alice", Some(&alice)).await.unwrap();
        repo.create("Day 1", "bob", Some(&bob)).await.unwrap();

        let listing = repo.list().await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(
            repo.get(&repo.address_of("Day 1", &bob).unwrap())
                .await
                .unwrap()
                .message,
            "bob"
        );
    }

    #[tokio::test]
    async fn delete_removes_from_list() {
        let (_, repo) = instant();
        let owner = Identity::ephemeral();
        let address = repo.address_of("Day 1", &owner).unwrap();
        repo.create("Day 1", "Hello", Some(&owner)).await.unwrap();
        repo.create("Day 2", "Again", Some(&owner)).await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 2);

        repo.delete("Day 1", Some(&owner)).await.unwrap();
        let listing = repo.list().await.unwrap();
        assert_eq!(listing.len(), 1);
        assert!(listing.iter().all(|(a, _)| *a != address));
        assert_eq!(repo.state(&address), CacheEntry::Absent);
    }

    #[tokio::test]
    async fn list_includes_sample_entries() {
        let (_, repo) = simulated(SimulatedConfig {
            submit_latency: Duration::ZERO,
            ..SimulatedConfig::default()
        });
        let listing = repo.list().await.unwrap();
        let titles: Vec<_> = listing.iter().map(|(_, e)| e.title.as_str()).collect();
        assert!(titles.contains(&"Mock Entry 1"));
        assert!(titles.contains(&"Mock Entry 2"));
        for (address, entry) in &listing {
            assert_eq!(repo.state(address), CacheEntry::Present(entry.clone()));
        }
    }

    #[tokio::test]
    async fn failed_fetch_marks_slot_errored_and_retries() {
        let repo = EntryRepository::new(
            Arc::new(BrokenLedger {
                error: LedgerError::Remote {
                    status: 500,
                    message: "node overloaded".into(),
                },
            }),
            PROGRAM,
        );
        let address = Address::from_bytes([7; 32]);
        assert!(matches!(
            repo.get(&address).await,
            Err(RepoError::FetchFailed(_))
        ));
        assert_eq!(repo.state(&address).status(), CacheStatus::Errored);

        assert!(repo.get(&address).await.is_err());
        assert!(matches!(repo.list().await, Err(RepoError::FetchFailed(_))));
        assert_eq!(repo.list_state().status(), CacheStatus::Errored);
    }

    #[tokio::test]
    async fn unreachable_ledger_recommends_fallback() {
        let repo = EntryRepository::new(
            Arc::new(BrokenLedger {
                error: LedgerError::TransportUnavailable("connection refused".into()),
            }),
            PROGRAM,
        );
        let err = repo.list().await.unwrap_err();
        assert!(err.recommends_fallback());

        // the existence check fails before anything is submitted
        let owner = Identity::ephemeral();
        let err = repo.update("Day 1", "x", Some(&owner)).await.unwrap_err();
        assert!(matches!(err, RepoError::TransportUnavailable(_)));
    }

    #[tokio::test]
    async fn clones_share_cache() {
        let (ledger, repo) = instant();
        let other = repo.clone();
        let owner = Identity::ephemeral();
        repo.create("Day 1", "Hello", Some(&owner)).await.unwrap();
        let address = repo.address_of("Day 1", &owner).unwrap();
        other.get(&address).await.unwrap();
        assert_eq!(ledger.fetch_one_count(), 0);
    }
}
