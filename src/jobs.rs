use super::*;

const MAX_TRACKED_JOBS: usize = 8;

#[derive(Debug)]
pub enum JobEntry {
    Current(Arc<Job>),
    /// Retired by a clean broadcast less than the grace period ago.
    Stale,
    Unknown,
}

/// The jobs one session may still submit against. A clean broadcast retires
/// everything that came before it; retired ids answer `Stale` during the
/// grace period so a share already in flight gets the softer rejection.
pub(crate) struct Jobs {
    valid: HashMap<JobId, Arc<Job>>,
    order: Vec<JobId>,
    retired: Vec<JobId>,
    cleaned_at: Option<Instant>,
    seen: LruCache<BlockHash, ()>,
}

impl Jobs {
    pub(crate) fn new() -> Self {
        Self {
            valid: HashMap::new(),
            order: Vec::new(),
            retired: Vec::new(),
            cleaned_at: None,
            seen: LruCache::new(NonZeroUsize::new(DUPLICATE_CACHE_SIZE).expect("non-zero")),
        }
    }

    pub(crate) fn insert(&mut self, job: Arc<Job>) {
        if job.clean_jobs {
            self.retired = self.order.drain(..).collect();
            self.valid.clear();
            self.seen.clear();
            self.cleaned_at = Some(Instant::now());
        } else if self.order.len() >= MAX_TRACKED_JOBS {
            let oldest = self.order.remove(0);
            self.valid.remove(&oldest);
        }

        self.order.push(job.job_id);
        self.valid.insert(job.job_id, job);
    }

    pub(crate) fn lookup(&self, job_id: JobId) -> JobEntry {
        if let Some(job) = self.valid.get(&job_id) {
            return JobEntry::Current(job.clone());
        }

        let in_grace = self
            .cleaned_at
            .map(|cleaned_at| cleaned_at.elapsed() <= JOB_GRACE_PERIOD)
            .unwrap_or_default();

        if in_grace && self.retired.contains(&job_id) {
            JobEntry::Stale
        } else {
            JobEntry::Unknown
        }
    }

    /// Records the header hash; a hash already recorded means the exact
    /// (job, extranonce2, ntime, version, nonce) tuple was submitted before.
    pub(crate) fn is_duplicate(&mut self, block_hash: BlockHash) -> bool {
        self.seen.put(block_hash, ()).is_some()
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.valid.len()
    }
}
