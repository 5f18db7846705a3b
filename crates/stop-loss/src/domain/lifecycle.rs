//! The status store. Every order hash maps to its own mutex so that the
//! check-then-finalize sequence of one order never interleaves with another
//! attempt on the same order, while unrelated orders proceed in parallel.

use {
    crate::domain::{
        Class,
        eth::Address,
        order::{self, Authorizer},
    },
    dashmap::DashMap,
    model::order::{Order, OrderHash, OrderStatus},
    std::{collections::HashMap, sync::Arc},
    tokio::sync::{Mutex, OwnedMutexGuard},
};

type Cell = Arc<Mutex<OrderStatus>>;

#[derive(Debug, Default)]
pub struct Lifecycle {
    /// Only orders with an attempt in flight have a cell.
    locks: DashMap<OrderHash, Cell>,
    /// Finalized orders. Only written while holding the order's lock, so it
    /// can be read without waiting for in-flight attempts.
    finalized: DashMap<OrderHash, OrderStatus>,
}

impl Lifecycle {
    /// The committed status of an order. Hashes never seen before are open.
    pub fn status_of(&self, hash: &OrderHash) -> OrderStatus {
        self.finalized
            .get(hash)
            .map(|status| *status)
            .unwrap_or_default()
    }

    /// Waits for exclusive access to the order's status.
    pub async fn lock(&self, hash: OrderHash) -> OrderLock<'_> {
        let cell = self
            .locks
            .entry(hash)
            .or_insert_with(|| Arc::new(Mutex::new(self.status_of(&hash))))
            .clone();
        OrderLock {
            hash,
            guard: cell.lock_owned().await,
            locks: &self.locks,
            finalized: &self.finalized,
        }
    }

    pub async fn mark_filled(&self, hash: OrderHash) -> Result<(), Error> {
        self.lock(hash).await.fill()
    }

    /// Cancels an order on behalf of `caller`. The holder is derived from the
    /// signed order, so only the account that signed it can cancel it.
    pub async fn cancel(
        &self,
        authorizer: &Authorizer,
        order: &Order,
        caller: Address,
    ) -> Result<OrderHash, Error> {
        let holder = authorizer.verify(order)?;
        authorizer.validate(&order.data)?;
        if caller != holder {
            return Err(Error::NotHolder { caller, holder });
        }
        let hash = authorizer.hash(&order.data);
        self.lock(hash).await.cancel()?;
        Ok(hash)
    }

    /// All finalized orders.
    pub fn snapshot(&self) -> HashMap<OrderHash, OrderStatus> {
        self.finalized
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    /// Loads previously finalized orders. Open entries are ignored since
    /// open is the default anyway.
    pub fn restore(&self, snapshot: HashMap<OrderHash, OrderStatus>) {
        for (hash, status) in snapshot {
            if !status.is_final() {
                continue;
            }
            self.finalized.insert(hash, status);
        }
    }
}

/// Exclusive access to one order's status. Dropping it releases the order.
pub struct OrderLock<'a> {
    hash: OrderHash,
    guard: OwnedMutexGuard<OrderStatus>,
    locks: &'a DashMap<OrderHash, Cell>,
    finalized: &'a DashMap<OrderHash, OrderStatus>,
}

impl Drop for OrderLock<'_> {
    fn drop(&mut self) {
        // The map and the guard are the only owners unless another attempt
        // is waiting for the cell. The next attempt recreates the cell from
        // `finalized`.
        self.locks
            .remove_if(&self.hash, |_, cell| Arc::strong_count(cell) == 2);
    }
}

impl OrderLock<'_> {
    pub fn hash(&self) -> OrderHash {
        self.hash
    }

    pub fn status(&self) -> OrderStatus {
        *self.guard
    }

    /// Fails with [`Error::AlreadyFinalized`] unless the order is open.
    pub fn ensure_open(&self) -> Result<(), Error> {
        match self.status() {
            OrderStatus::Open => Ok(()),
            status => Err(Error::AlreadyFinalized(status)),
        }
    }

    pub fn fill(&mut self) -> Result<(), Error> {
        self.finalize(OrderStatus::Filled)
    }

    pub fn cancel(&mut self) -> Result<(), Error> {
        self.finalize(OrderStatus::Cancelled)
    }

    fn finalize(&mut self, status: OrderStatus) -> Result<(), Error> {
        self.ensure_open()?;
        *self.guard = status;
        self.finalized.insert(self.hash, status);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Order(#[from] order::Error),
    #[error("{caller} is not the holder {holder}")]
    NotHolder { caller: Address, holder: Address },
    #[error("order is already {0}")]
    AlreadyFinalized(OrderStatus),
}

impl Error {
    pub fn class(&self) -> Class {
        match self {
            Error::Order(_) | Error::NotHolder { .. } => Class::Authorization,
            Error::AlreadyFinalized(_) => Class::Lifecycle,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Error::Order(order::Error::InvalidSignature) => "InvalidSignature",
            Error::Order(order::Error::InvalidOrder(_)) => "InvalidOrder",
            Error::NotHolder { .. } => "NotHolder",
            Error::AlreadyFinalized(_) => "AlreadyFinalized",
        }
    }
}
