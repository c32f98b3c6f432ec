use super::*;

/// Hands out the per-session extranonce1. Live sessions must hold pairwise
/// distinct values or two miners would grind the same search space.
#[derive(Debug, Default)]
pub(crate) struct Extranonces {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next: u32,
    free: Vec<u32>,
}

impl Extranonces {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn allocate(&self) -> Extranonce {
        let mut inner = self.inner.lock().expect("extranonce allocator poisoned");

        let n = inner.free.pop().unwrap_or_else(|| {
            let n = inner.next;
            inner.next = inner.next.wrapping_add(1);
            n
        });

        Extranonce::from_bytes(&n.to_be_bytes())
    }

    pub(crate) fn release(&self, extranonce: &Extranonce) {
        let Ok(bytes) = <[u8; 4]>::try_from(extranonce.as_bytes()) else {
            return;
        };

        self.inner
            .lock()
            .expect("extranonce allocator poisoned")
            .free
            .push(u32::from_be_bytes(bytes));
    }
}
