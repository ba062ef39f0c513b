//! Bounded key→value stores consulted by [`CachingResolver`] before
//! delegating to a base resolver, plus the wrapper itself.
//!
//! Concurrency contract:
//!
//! - [`Lru`] takes an exclusive lock on every operation, hits mutate
//!   the recency order.
//! - [`Sieve`] and [`S3Fifo`] take a read lock on hits, the only hit
//!   metadata is an atomic bit (visited) or counter (frequency).
//!   Inserts and evictions take the write lock.
//! - [`Local`] shares nothing across threads.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering::Relaxed};
use std::sync::{Arc, Mutex, RwLock};

use thread_local::ThreadLocal;

use crate::parser::Resolver;
use crate::types::{Domain, PartialResult};

/// Bounded store keyed by user-agent string. Implementations own
/// their replacement policy and their synchronisation, callers only
/// hold `&self`.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<PartialResult>;

    /// Insert or update. May evict. A re-`put` of a live key replaces
    /// the stored value in place.
    fn put(&self, key: &str, value: PartialResult);
}

impl<C: Cache + ?Sized> Cache for Arc<C> {
    fn get(&self, key: &str) -> Option<PartialResult> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: PartialResult) {
        (**self).put(key, value)
    }
}

// ---------------------------------------------------------------------------
// CachingResolver
// ---------------------------------------------------------------------------

/// Resolver wrapper consulting a [`Cache`] before delegating.
///
/// Cached facets are authoritative: on a partial hit only the missing
/// facets are delegated, and the merge prefers what was already
/// cached. The stored entry accumulates facets across calls while the
/// returned result is narrowed to exactly what was requested, so the
/// wrapper is observationally identical to its base resolver.
pub struct CachingResolver<R, C> {
    resolver: R,
    cache: C,
}

impl<R: Resolver, C: Cache> CachingResolver<R, C> {
    pub fn new(resolver: R, cache: C) -> Self {
        Self { resolver, cache }
    }
}

fn narrow(result: PartialResult, domains: Domain) -> PartialResult {
    PartialResult {
        domains,
        user_agent: domains
            .contains(Domain::USER_AGENT)
            .then_some(result.user_agent)
            .flatten(),
        os: domains.contains(Domain::OS).then_some(result.os).flatten(),
        device: domains
            .contains(Domain::DEVICE)
            .then_some(result.device)
            .flatten(),
        string: result.string,
    }
}

impl<R: Resolver, C: Cache> Resolver for CachingResolver<R, C> {
    fn resolve(&self, ua: &str, domains: Domain) -> PartialResult {
        let entry = self.cache.get(ua);
        if let Some(entry) = &entry {
            if entry.domains.contains(domains) {
                return narrow(entry.clone(), domains);
            }
        }

        let missing = entry.as_ref().map_or(domains, |e| domains - e.domains);
        let resolved = self.resolver.resolve(ua, missing);
        let merged = match entry {
            Some(entry) => PartialResult {
                domains: entry.domains | resolved.domains,
                user_agent: entry.user_agent.or(resolved.user_agent),
                os: entry.os.or(resolved.os),
                device: entry.device.or(resolved.device),
                string: resolved.string,
            },
            None => resolved,
        };
        self.cache.put(ua, merged.clone());
        narrow(merged, domains)
    }
}

// ---------------------------------------------------------------------------
// Lru
// ---------------------------------------------------------------------------

struct LruNode {
    key: Arc<str>,
    value: PartialResult,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Default)]
struct LruList {
    map: HashMap<Arc<str>, usize>,
    slab: Vec<Option<LruNode>>,
    free: Vec<usize>,
    /// Most recently used.
    head: Option<usize>,
    /// Least recently used, evicted first.
    tail: Option<usize>,
}

impl LruList {
    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.slab[idx].as_ref().unwrap();
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.slab[p].as_mut().unwrap().next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slab[n].as_mut().unwrap().prev = prev,
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, idx: usize) {
        {
            let node = self.slab[idx].as_mut().unwrap();
            node.prev = None;
            node.next = self.head;
        }
        if let Some(h) = self.head {
            self.slab[h].as_mut().unwrap().prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn alloc(&mut self, node: LruNode) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slab[idx] = Some(node);
                idx
            }
            None => {
                self.slab.push(Some(node));
                self.slab.len() - 1
            }
        }
    }
}

/// Least-recently-used replacement: hits move the entry to the front,
/// inserts at capacity evict from the back. Every operation takes the
/// one lock since hits reorder the list.
pub struct Lru {
    capacity: usize,
    inner: Mutex<LruList>,
}

impl Lru {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be positive");
        Self {
            capacity,
            inner: Mutex::new(LruList::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for Lru {
    fn get(&self, key: &str) -> Option<PartialResult> {
        let mut inner = self.inner.lock().unwrap();
        let idx = *inner.map.get(key)?;
        inner.detach(idx);
        inner.push_front(idx);
        Some(inner.slab[idx].as_ref().unwrap().value.clone())
    }

    fn put(&self, key: &str, value: PartialResult) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(&idx) = inner.map.get(key) {
            inner.slab[idx].as_mut().unwrap().value = value;
            inner.detach(idx);
            inner.push_front(idx);
            return;
        }

        if inner.map.len() >= self.capacity {
            let lru = inner.tail.expect("a full cache has a tail");
            inner.detach(lru);
            let node = inner.slab[lru].take().unwrap();
            inner.map.remove(&node.key);
            inner.free.push(lru);
        }

        let key: Arc<str> = Arc::from(key);
        let idx = inner.alloc(LruNode {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        inner.push_front(idx);
        inner.map.insert(key, idx);
    }
}

// ---------------------------------------------------------------------------
// Sieve
// ---------------------------------------------------------------------------

struct SieveNode {
    key: Arc<str>,
    value: PartialResult,
    visited: AtomicBool,
    /// Toward the newer end of the list.
    next: Option<usize>,
}

#[derive(Default)]
struct SieveList {
    map: HashMap<Arc<str>, usize>,
    slab: Vec<Option<SieveNode>>,
    free: Vec<usize>,
    /// Newest entry.
    head: Option<usize>,
    /// Oldest entry, where eviction scans start.
    tail: Option<usize>,
    hand: Option<usize>,
    /// Node preceding the hand (toward the tail), for unlinking.
    prev: Option<usize>,
}

impl SieveList {
    /// Walk from the hand (or the tail) toward the head, clearing
    /// visited bits, and evict the first unvisited entry.
    fn evict(&mut self) {
        let (mut obj, mut pobj) = match self.hand {
            Some(hand) => (Some(hand), self.prev),
            None => (self.tail, None),
        };

        while let Some(idx) = obj {
            let node = self.slab[idx].as_ref().unwrap();
            if !node.visited.load(Relaxed) {
                break;
            }
            node.visited.store(false, Relaxed);
            match node.next {
                Some(next) => {
                    pobj = Some(idx);
                    obj = Some(next);
                }
                None => {
                    obj = self.tail;
                    pobj = None;
                }
            }
        }

        let Some(idx) = obj else { return };
        let node = self.slab[idx].take().unwrap();
        self.hand = node.next;
        self.prev = pobj;

        self.map.remove(&node.key);
        if node.next.is_none() {
            self.head = pobj;
        }
        match pobj {
            Some(p) => self.slab[p].as_mut().unwrap().next = node.next,
            None => self.tail = node.next,
        }
        self.free.push(idx);
    }

    fn alloc(&mut self, node: SieveNode) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slab[idx] = Some(node);
                idx
            }
            None => {
                self.slab.push(Some(node));
                self.slab.len() - 1
            }
        }
    }
}

/// SIEVE replacement: a hit only flips the entry's visited bit, the
/// eviction hand does all the ordering work at insert time. Hits take
/// the read lock and can proceed concurrently.
pub struct Sieve {
    capacity: usize,
    inner: RwLock<SieveList>,
}

impl Sieve {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be positive");
        Self {
            capacity,
            inner: RwLock::new(SieveList::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for Sieve {
    fn get(&self, key: &str) -> Option<PartialResult> {
        let inner = self.inner.read().unwrap();
        let idx = *inner.map.get(key)?;
        let node = inner.slab[idx].as_ref().unwrap();
        node.visited.store(true, Relaxed);
        Some(node.value.clone())
    }

    fn put(&self, key: &str, value: PartialResult) {
        let mut inner = self.inner.write().unwrap();
        if let Some(&idx) = inner.map.get(key) {
            inner.slab[idx].as_mut().unwrap().value = value;
            return;
        }

        if inner.map.len() >= self.capacity {
            inner.evict();
        }

        let key: Arc<str> = Arc::from(key);
        let idx = inner.alloc(SieveNode {
            key: key.clone(),
            value,
            visited: AtomicBool::new(false),
            next: None,
        });
        if let Some(head) = inner.head {
            inner.slab[head].as_mut().unwrap().next = Some(idx);
        }
        inner.head = Some(idx);
        if inner.tail.is_none() {
            inner.tail = Some(idx);
        }
        inner.map.insert(key, idx);
    }
}

// ---------------------------------------------------------------------------
// S3Fifo
// ---------------------------------------------------------------------------

const FREQ_CAP: u8 = 3;

struct S3Entry {
    key: Arc<str>,
    value: PartialResult,
    freq: AtomicU8,
}

enum Slot {
    Live(usize),
    /// Key retained without its value; the generation ties the slot to
    /// one specific record in the ghost queue so a stale record cannot
    /// delete a newer one.
    Ghost(u64),
}

#[derive(Default)]
struct S3Queues {
    map: HashMap<Arc<str>, Slot>,
    slab: Vec<Option<S3Entry>>,
    free: Vec<usize>,
    /// Probationary queue for first-seen keys, front is oldest.
    small: VecDeque<usize>,
    /// Protected queue for re-admitted and promoted keys.
    main: VecDeque<usize>,
    ghost: VecDeque<(Arc<str>, u64)>,
    ghost_gen: u64,
}

impl S3Queues {
    fn alloc(&mut self, entry: S3Entry) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slab[idx] = Some(entry);
                idx
            }
            None => {
                self.slab.push(Some(entry));
                self.slab.len() - 1
            }
        }
    }

    /// Pop small's oldest entries: promoted to main at `freq - 1` when
    /// touched since insertion, demoted to a value-less ghost record
    /// otherwise. Stops after one demotion.
    fn evict_small(&mut self, ghost_capacity: usize) {
        while let Some(idx) = self.small.pop_front() {
            let freq = self.slab[idx].as_ref().unwrap().freq.load(Relaxed);
            if freq >= 1 {
                self.slab[idx].as_ref().unwrap().freq.store(freq - 1, Relaxed);
                self.main.push_back(idx);
                continue;
            }

            let entry = self.slab[idx].take().unwrap();
            self.free.push(idx);
            self.ghost_gen += 1;
            let generation = self.ghost_gen;
            self.map.insert(entry.key.clone(), Slot::Ghost(generation));
            self.ghost.push_back((entry.key, generation));
            while self.ghost.len() > ghost_capacity {
                let (key, generation) = self.ghost.pop_front().unwrap();
                if matches!(self.map.get(&key), Some(Slot::Ghost(g)) if *g == generation) {
                    self.map.remove(&key);
                }
            }
            return;
        }
    }

    /// Pop main's oldest: reinserted at the fresh end at `freq - 1`
    /// when touched, dropped outright otherwise.
    fn evict_main(&mut self) {
        while let Some(idx) = self.main.pop_front() {
            let freq = self.slab[idx].as_ref().unwrap().freq.load(Relaxed);
            if freq >= 1 {
                self.slab[idx].as_ref().unwrap().freq.store(freq - 1, Relaxed);
                self.main.push_back(idx);
                continue;
            }

            let entry = self.slab[idx].take().unwrap();
            self.free.push(idx);
            self.map.remove(&entry.key);
            return;
        }
    }
}

/// S3-FIFO replacement: three FIFO queues (small probationary, main
/// protected, ghost keys-only) with a saturating per-entry frequency
/// counter. A hit only bumps the counter, so hits take the read lock
/// and can proceed concurrently. Keys returning while ghosted are
/// admitted straight to main.
pub struct S3Fifo {
    capacity: usize,
    main_target: usize,
    inner: RwLock<S3Queues>,
}

impl S3Fifo {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be positive");
        let small_target = (capacity / 10).max(1);
        Self {
            capacity,
            main_target: capacity - small_target,
            inner: RwLock::new(S3Queues::default()),
        }
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap();
        inner.small.len() + inner.main.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for S3Fifo {
    fn get(&self, key: &str) -> Option<PartialResult> {
        let inner = self.inner.read().unwrap();
        match inner.map.get(key)? {
            Slot::Live(idx) => {
                let entry = inner.slab[*idx].as_ref().unwrap();
                // Concurrent hits may race the bump; the counter
                // saturates either way.
                let freq = entry.freq.load(Relaxed);
                if freq < FREQ_CAP {
                    entry.freq.store(freq + 1, Relaxed);
                }
                Some(entry.value.clone())
            }
            Slot::Ghost(_) => None,
        }
    }

    fn put(&self, key: &str, value: PartialResult) {
        let mut inner = self.inner.write().unwrap();
        if let Some(Slot::Live(idx)) = inner.map.get(key) {
            let idx = *idx;
            inner.slab[idx].as_mut().unwrap().value = value;
            return;
        }

        if inner.small.len() + inner.main.len() >= self.capacity {
            if inner.main.len() < self.main_target || inner.main.is_empty() {
                inner.evict_small(self.main_target);
            }
            // Promotions may have filled main past its share, in which
            // case the room has to come out of main.
            if inner.small.len() + inner.main.len() >= self.capacity {
                inner.evict_main();
            }
        }

        let ghosted = matches!(inner.map.get(key), Some(Slot::Ghost(_)));
        let key: Arc<str> = Arc::from(key);
        let idx = inner.alloc(S3Entry {
            key: key.clone(),
            value,
            freq: AtomicU8::new(0),
        });
        if ghosted {
            inner.main.push_back(idx);
        } else {
            inner.small.push_back(idx);
        }
        inner.map.insert(key, Slot::Live(idx));
    }
}

// ---------------------------------------------------------------------------
// Local
// ---------------------------------------------------------------------------

/// Thread-local cache wrapper: lazily builds one underlying cache per
/// accessing thread. Memory cost is multiplied by the thread count,
/// cross-thread contention is nil, and threads never see each other's
/// entries.
pub struct Local<C: Send> {
    caches: ThreadLocal<C>,
    factory: Box<dyn Fn() -> C + Send + Sync>,
}

impl<C: Cache + Send> Local<C> {
    pub fn new(factory: impl Fn() -> C + Send + Sync + 'static) -> Self {
        Self {
            caches: ThreadLocal::new(),
            factory: Box::new(factory),
        }
    }

    fn cache(&self) -> &C {
        self.caches.get_or(|| (self.factory)())
    }
}

impl<C: Cache + Send> Cache for Local<C> {
    fn get(&self, key: &str) -> Option<PartialResult> {
        self.cache().get(key)
    }

    fn put(&self, key: &str, value: PartialResult) {
        self.cache().put(key, value)
    }
}
