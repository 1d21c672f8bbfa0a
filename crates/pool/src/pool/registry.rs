//! The pool's three registries plus its lifecycle flags.
//!
//! Everything here is synchronous; [`Pool`](super::Pool) holds the registry
//! under one mutex and never across an `.await`.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::reaper::Reaper;
use crate::request::Request;
use crate::resource::{Placeholder, Resource, Slot};

pub(crate) struct Registry<C> {
    /// Every live resource and reservation, in insertion order.
    pub(crate) all_resources: Vec<Slot<C>>,
    /// Idle resources, oldest first.
    pub(crate) available: VecDeque<Arc<Resource<C>>>,
    /// Requests, oldest first. May hold non-pending entries until purged.
    pub(crate) requests: VecDeque<Arc<Request<C>>>,
    pub(crate) initialized: bool,
    pub(crate) reaper: Option<Reaper>,
}

impl<C> Registry<C> {
    pub(crate) fn new() -> Self {
        Self {
            all_resources: Vec::new(),
            available: VecDeque::new(),
            requests: VecDeque::new(),
            initialized: false,
            reaper: None,
        }
    }

    pub(crate) fn pool_size(&self) -> usize {
        self.all_resources.len()
    }

    pub(crate) fn placeholder_num(&self) -> usize {
        self.all_resources
            .iter()
            .filter(|slot| slot.is_placeholder())
            .count()
    }

    pub(crate) fn room(&self, max: usize) -> usize {
        max.saturating_sub(self.pool_size())
    }

    pub(crate) fn pending_request_num(&self) -> usize {
        self.requests.iter().filter(|r| r.is_pending()).count()
    }

    pub(crate) fn placeholder_position(&self, placeholder: Placeholder) -> Option<usize> {
        self.all_resources.iter().position(|slot| slot.is(placeholder))
    }

    pub(crate) fn remove_placeholder(&mut self, placeholder: Placeholder) -> bool {
        match self.placeholder_position(placeholder) {
            Some(index) => {
                self.all_resources.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_from_all(&mut self, resource: &Arc<Resource<C>>) -> bool {
        let position = self.all_resources.iter().position(|slot| {
            slot.as_resource()
                .is_some_and(|candidate| Arc::ptr_eq(candidate, resource))
        });
        match position {
            Some(index) => {
                self.all_resources.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether `resource` itself (not an equal twin) is in all-resources.
    pub(crate) fn holds(&self, resource: &Arc<Resource<C>>) -> bool {
        self.all_resources.iter().any(|slot| {
            slot.as_resource()
                .is_some_and(|candidate| Arc::ptr_eq(candidate, resource))
        })
    }

    pub(crate) fn remove_from_available(&mut self, resource: &Arc<Resource<C>>) -> bool {
        match self.available.iter().position(|r| Arc::ptr_eq(r, resource)) {
            Some(index) => {
                self.available.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_request(&mut self, request: &Arc<Request<C>>) -> bool {
        match self.requests.iter().position(|r| Arc::ptr_eq(r, request)) {
            Some(index) => {
                self.requests.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn find_by_connection(&self, connection: &Arc<C>) -> Option<Arc<Resource<C>>> {
        self.all_resources
            .iter()
            .filter_map(Slot::as_resource)
            .find(|resource| resource.owns(connection))
            .cloned()
    }

    /// Drop every non-pending request. Returns how many were removed.
    pub(crate) fn remove_non_pending(&mut self) -> usize {
        let before = self.requests.len();
        self.requests.retain(|r| r.is_pending());
        before - self.requests.len()
    }

    /// Pop the oldest pending request together with the oldest idle
    /// resource, discarding finished requests ahead of it. The resource is
    /// marked allocated before the lock is released.
    pub(crate) fn take_next_match(&mut self) -> Option<(Arc<Request<C>>, Arc<Resource<C>>)> {
        while self.requests.front().is_some_and(|r| !r.is_pending()) {
            self.requests.pop_front();
        }
        if self.requests.is_empty() || self.available.is_empty() {
            return None;
        }
        let request = self.requests.pop_front()?;
        let resource = self.available.pop_front()?;
        resource.mark_allocated();
        Some((request, resource))
    }

    /// Stop the reaper if one is running. Stopping twice is a no-op.
    pub(crate) fn stop_reaper(&mut self) -> bool {
        match self.reaper.take() {
            Some(reaper) => {
                reaper.stop();
                true
            }
            None => false,
        }
    }

    /// Empty all three registries and stop the reaper. Returns the
    /// requests that were dropped so the caller can settle them outside
    /// the lock.
    pub(crate) fn clear(&mut self) -> Vec<Arc<Request<C>>> {
        self.stop_reaper();
        self.all_resources.clear();
        self.available.clear();
        self.requests.drain(..).collect()
    }
}
