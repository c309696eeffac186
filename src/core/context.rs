//! Ambient per-request context
//!
//! This module provides:
//! - `ContextStore`: scoped key-value storage shared by logger and callers
//! - `ContextScope`: RAII guard that closes a scope on drop
//!
//! The store keeps one stack of context frames per thread, so concurrently
//! active logical requests on different threads never observe each other's
//! fields. Reads return a snapshot copy, never a live reference: mutating the
//! store after a record has been assembled cannot retroactively alter it.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Snapshot of one context scope. Insertion-ordered.
pub type ContextMap = serde_json::Map<String, serde_json::Value>;

type FrameStacks = Arc<RwLock<HashMap<ThreadId, Vec<ContextMap>>>>;

/// Scoped ambient-context store.
///
/// Cloning the store yields another handle to the same frames, so the same
/// store can be installed in a logger and used by request-handling code.
///
/// # Example
///
/// ```
/// use entrylog::ContextStore;
/// use serde_json::json;
///
/// let store = ContextStore::new();
/// let ctx = json!({"requestId": "abc-123"});
/// store.run_with_context(ctx.as_object().cloned().unwrap_or_default(), || {
///     assert_eq!(store.get_context()["requestId"], "abc-123");
/// });
/// assert!(store.get_context().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContextStore {
    frames: FrameStacks,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot copy of the innermost scope on the current thread, or an
    /// empty mapping when no scope is active.
    pub fn get_context(&self) -> ContextMap {
        let frames = self.frames.read();
        frames
            .get(&thread::current().id())
            .and_then(|stack| stack.last())
            .cloned()
            .unwrap_or_default()
    }

    /// Merge `patch` into the innermost active scope. A no-op when no scope
    /// is active on the current thread.
    pub fn update_context(&self, patch: ContextMap) {
        let mut frames = self.frames.write();
        if let Some(top) = frames
            .get_mut(&thread::current().id())
            .and_then(|stack| stack.last_mut())
        {
            for (key, value) in patch {
                top.insert(key, value);
            }
        }
    }

    /// Run `body` inside a scope seeded with `context`.
    pub fn run_with_context<T>(&self, context: ContextMap, body: impl FnOnce() -> T) -> T {
        let _scope = self.enter(context);
        body()
    }

    /// Open a scope and return its guard. The scope closes when the guard is
    /// dropped, also on unwind.
    pub fn enter(&self, context: ContextMap) -> ContextScope {
        let thread = thread::current().id();
        self.frames.write().entry(thread).or_default().push(context);
        ContextScope {
            frames: Arc::clone(&self.frames),
            thread,
        }
    }
}

/// RAII guard for one context scope.
#[derive(Debug)]
pub struct ContextScope {
    frames: FrameStacks,
    thread: ThreadId,
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        let mut frames = self.frames.write();
        if let Some(stack) = frames.get_mut(&self.thread) {
            stack.pop();
            if stack.is_empty() {
                frames.remove(&self.thread);
            }
        }
    }
}
