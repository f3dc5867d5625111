//! # CPU Lock Module / CPU 锁模块
//!
//! A reader/writer lock deciding which steps may use the whole machine.
//! Shared steps (readers) run side by side; an exclusive step (writer) runs
//! alone. One `CpuLock` is created per suite and handed to every test, so
//! all tests contend on the same state.
//!
//! The variant implemented here lets readers starve writers: once the first
//! shared holder has taken the token, later shared holders join without
//! touching it, and it is only handed back when the last one leaves. This
//! batches shared work together instead of interleaving it with exclusive
//! steps.
//!
//! 决定哪些步骤可以独占整台机器的读写锁。共享步骤（读者）可以并行运行；
//! 独占步骤（写者）单独运行。每个测试套件创建一个 `CpuLock` 并传递给所有测试。
//! 此实现允许读者饿死写者，从而将共享任务批量执行。

#[cfg(feature = "loom")]
use loom::sync::{Condvar, Mutex};
#[cfg(not(feature = "loom"))]
use std::sync::{Condvar, Mutex};

use std::sync::PoisonError;

/// How a step wants to hold the [`CpuLock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// May overlap with other shared holders.
    Shared,
    /// Runs with no other holder active.
    Exclusive,
}

impl LockMode {
    pub fn from_exclusive(exclusive: bool) -> Self {
        if exclusive {
            LockMode::Exclusive
        } else {
            LockMode::Shared
        }
    }
}

/// Binary semaphore. Unlike a mutex guard, the permit may be returned by a
/// different thread than the one that took it (the last reader out).
#[derive(Debug)]
struct Token {
    available: Mutex<bool>,
    cond: Condvar,
}

impl Token {
    fn new() -> Self {
        Self {
            available: Mutex::new(true),
            cond: Condvar::new(),
        }
    }

    fn take(&self) {
        let mut available = self.available.lock().unwrap_or_else(PoisonError::into_inner);
        while !*available {
            available = self
                .cond
                .wait(available)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *available = false;
    }

    fn give(&self) {
        let mut available = self.available.lock().unwrap_or_else(PoisonError::into_inner);
        *available = true;
        self.cond.notify_one();
    }
}

/// Process-wide exclusivity lock for CPU-heavy steps.
///
/// 针对 CPU 密集型步骤的全局独占锁。
#[derive(Debug)]
pub struct CpuLock {
    token: Token,
    /// Number of active shared holders. Only touched for the short
    /// increment/decrement and the decision to take or give the token.
    readers: Mutex<usize>,
}

impl Default for CpuLock {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuLock {
    pub fn new() -> Self {
        Self {
            token: Token::new(),
            readers: Mutex::new(0),
        }
    }

    /// Blocks until the lock admits `mode`, then returns a guard that
    /// releases it on drop.
    ///
    /// 阻塞直到锁允许以 `mode` 持有，返回在 drop 时释放锁的 guard。
    pub fn acquire(&self, mode: LockMode) -> CpuLockGuard<'_> {
        match mode {
            LockMode::Exclusive => self.token.take(),
            LockMode::Shared => {
                let mut readers = self.readers.lock().unwrap_or_else(PoisonError::into_inner);
                *readers += 1;
                if *readers == 1 {
                    // Still holding `readers`: later shared acquirers queue
                    // behind the first one until the token is ours.
                    self.token.take();
                }
            }
        }
        CpuLockGuard { lock: self, mode }
    }

    pub fn shared(&self) -> CpuLockGuard<'_> {
        self.acquire(LockMode::Shared)
    }

    pub fn exclusive(&self) -> CpuLockGuard<'_> {
        self.acquire(LockMode::Exclusive)
    }

    /// Number of shared holders currently inside the lock.
    pub fn active_shared(&self) -> usize {
        *self.readers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, mode: LockMode) {
        match mode {
            LockMode::Exclusive => self.token.give(),
            LockMode::Shared => {
                let mut readers = self.readers.lock().unwrap_or_else(PoisonError::into_inner);
                *readers -= 1;
                if *readers == 0 {
                    self.token.give();
                }
            }
        }
    }
}

/// RAII guard returned by [`CpuLock::acquire`].
///
/// Dropping it releases the lock, whichever way the guarded section ends.
#[must_use = "the lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct CpuLockGuard<'a> {
    lock: &'a CpuLock,
    mode: LockMode,
}

impl CpuLockGuard<'_> {
    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for CpuLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release(self.mode);
    }
}
