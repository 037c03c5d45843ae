//! Generic controller for a paginated, filterable remote collection.
//!
//! A [`ListResource`] owns one [`ResourceState`] and turns view-level intents
//! (next page, new filters, new sort) into fetches against a [`PageSource`].
//! Every fetch is tagged with a request sequence; only the latest request may
//! write its result back, so out-of-order completions never clobber newer
//! data. Superseded requests are not aborted, just ignored.

use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use shared::protocol::{Page, Query, Sort, SortOrder};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};

use crate::error::FetchError;

/// Fetches one page of a remote collection for a query snapshot.
#[async_trait]
pub trait PageSource<T, F>: Send + Sync {
    async fn fetch_page(&self, query: &Query<F>) -> Result<Page<T>, FetchError>;
}

/// Items that can be located inside a page by identity.
pub trait Listable: Clone + Send + Sync + 'static {
    type Id: PartialEq + Clone + Debug + Send + Sync;

    fn id(&self) -> &Self::Id;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Error,
}

#[derive(Debug, Clone)]
pub struct ResourceState<T, F> {
    pub query: Query<F>,
    pub page: Option<Page<T>>,
    pub status: LoadStatus,
    pub error: Option<FetchError>,
}

impl<T, F> ResourceState<T, F> {
    fn new(query: Query<F>) -> Self {
        Self {
            query,
            page: None,
            status: LoadStatus::Idle,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn items(&self) -> &[T] {
        self.page.as_ref().map(Page::items).unwrap_or_default()
    }
}

/// Completion handle for a fetch triggered by a controller operation.
///
/// Dropping it does not cancel the fetch.
#[derive(Debug)]
pub struct PendingFetch {
    request: u64,
    task: JoinHandle<()>,
}

impl PendingFetch {
    pub fn request(&self) -> u64 {
        self.request
    }

    /// Resolves once the fetch has been applied or discarded.
    pub async fn wait(self) {
        if let Err(err) = self.task.await {
            warn!(request = self.request, error = %err, "page fetch task did not complete");
        }
    }
}

struct Shared<T, F> {
    source: Arc<dyn PageSource<T, F>>,
    state: watch::Sender<ResourceState<T, F>>,
    latest_request: AtomicU64,
}

pub struct ListResource<T, F> {
    shared: Arc<Shared<T, F>>,
}

impl<T, F> Clone for ListResource<T, F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, F> ListResource<T, F>
where
    T: Listable,
    F: Clone + Default + Debug + Send + Sync + 'static,
{
    /// With `auto_fetch` the initial query is fetched straight away, which
    /// requires a running tokio runtime.
    pub fn new(source: Arc<dyn PageSource<T, F>>, initial_query: Query<F>, auto_fetch: bool) -> Self {
        let (state, _) = watch::channel(ResourceState::new(initial_query));
        let resource = Self {
            shared: Arc::new(Shared {
                source,
                state,
                latest_request: AtomicU64::new(0),
            }),
        };
        if auto_fetch {
            resource.issue(|_| {});
        }
        resource
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ResourceState<T, F> {
        self.shared.state.borrow().clone()
    }

    pub fn query(&self) -> Query<F> {
        self.shared.state.borrow().query.clone()
    }

    /// Receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T, F>> {
        self.shared.state.subscribe()
    }

    /// Waits until no fetch for the latest request is outstanding.
    pub async fn settled(&self) {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|state| !state.is_loading()).await;
    }

    pub fn set_filters(&self, filters: F) -> PendingFetch {
        self.issue(move |query| {
            query.filters = filters;
            query.page = 1;
        })
    }

    /// Drops every filter and the sort order.
    pub fn clear_filters(&self) -> PendingFetch {
        self.issue(|query| {
            query.filters = F::default();
            query.sort = None;
            query.page = 1;
        })
    }

    /// Out-of-range pages are passed through; the source decides what they hold.
    pub fn set_page(&self, page: u32) -> PendingFetch {
        self.issue(move |query| query.page = page.max(1))
    }

    pub fn set_limit(&self, limit: u32) -> PendingFetch {
        self.issue(move |query| {
            query.limit = limit.max(1);
            query.page = 1;
        })
    }

    pub fn set_sorting(&self, key: impl Into<String>, order: SortOrder) -> PendingFetch {
        let sort = Sort::new(key, order);
        self.issue(move |query| {
            query.sort = Some(sort);
            query.page = 1;
        })
    }

    pub fn refresh(&self) -> PendingFetch {
        self.issue(|_| {})
    }

    /// Replaces the loaded item with `id` by `updater(item)` without refetching.
    ///
    /// Returns `false` when no such item is on the current page.
    pub fn mutate_item(&self, id: &T::Id, updater: impl FnOnce(&T) -> T) -> bool {
        self.shared.state.send_if_modified(|state| match state.page.as_mut() {
            Some(page) => page.replace_where(|item| item.id() == id, updater),
            None => false,
        })
    }

    /// Drops the loaded item with `id` and shrinks the total.
    ///
    /// When that empties a page past the first, steps back one page and
    /// fetches it.
    pub fn remove_item(&self, id: &T::Id) -> Option<PendingFetch> {
        let mut step_back = false;
        self.shared.state.send_if_modified(|state| {
            let Some(page) = state.page.as_mut() else {
                return false;
            };
            if !page.remove_where(|item| item.id() == id) {
                return false;
            }
            step_back = page.is_empty() && state.query.page > 1;
            true
        });

        step_back.then(|| self.issue(|query| query.page = query.page.saturating_sub(1).max(1)))
    }

    fn issue(&self, edit: impl FnOnce(&mut Query<F>)) -> PendingFetch {
        let mut outgoing = None;
        self.shared.state.send_modify(|state| {
            edit(&mut state.query);
            state.status = LoadStatus::Loading;
            state.error = None;
            let request = self.shared.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
            outgoing = Some((request, state.query.clone()));
        });
        // `send_modify` always runs its closure.
        let (request, query) = outgoing.unwrap_or_else(|| {
            (
                self.shared.latest_request.load(Ordering::SeqCst),
                self.query(),
            )
        });

        debug!(
            request,
            page = query.page,
            limit = query.limit,
            filters = ?query.filters,
            sort = ?query.sort,
            "issuing page fetch"
        );

        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move {
            let result = shared.source.fetch_page(&query).await;
            shared.settle(request, result);
        });
        PendingFetch { request, task }
    }
}

impl<T, F> Shared<T, F> {
    fn settle(&self, request: u64, result: Result<Page<T>, FetchError>) {
        let applied = self.state.send_if_modified(|state| {
            if self.latest_request.load(Ordering::SeqCst) != request {
                return false;
            }
            match result {
                Ok(page) => {
                    state.page = Some(page);
                    state.status = LoadStatus::Idle;
                    state.error = None;
                }
                Err(err) => {
                    warn!(request, error = %err, "page fetch failed");
                    state.status = LoadStatus::Error;
                    state.error = Some(err);
                }
            }
            true
        });

        if !applied {
            debug!(request, "discarded stale page response");
        }
    }
}

#[cfg(test)]
#[path = "tests/list_resource_tests.rs"]
mod tests;
