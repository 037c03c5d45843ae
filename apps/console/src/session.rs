//! One list view driven by console commands.

use anyhow::{bail, Context, Result};
use client_core::{
    filters::{parse_sort, split_pairs},
    resource_list, ListFilters, Resource, ResourceList, RestClient,
};
use shared::protocol::{Query, StatusPatch};
use tracing::{debug, info};

use crate::{commands::ConsoleCommand, render::{render_state, Render}};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Help,
    Quit,
}

pub struct Session<R: Resource> {
    client: RestClient,
    list: ResourceList<R>,
}

impl<R> Session<R>
where
    R: Resource,
    R::Item: Render,
{
    /// Starts fetching `query` right away.
    pub fn new(client: RestClient, query: Query<R::Filters>) -> Self {
        let list = resource_list::<R>(&client, query, true);
        Self { client, list }
    }

    pub fn list(&self) -> &ResourceList<R> {
        &self.list
    }

    pub async fn render(&self) -> String {
        self.list.settled().await;
        render_state(&self.list.state())
    }

    pub async fn execute(&self, command: ConsoleCommand) -> Result<Flow> {
        match command {
            ConsoleCommand::Next => {
                let state = self.list.state();
                let Some(page) = &state.page else {
                    bail!("nothing loaded yet");
                };
                if state.query.page >= page.total_pages() {
                    bail!("already on the last page");
                }
                self.list.set_page(state.query.page + 1).wait().await;
            }
            ConsoleCommand::Prev => {
                let current = self.list.query().page;
                if current <= 1 {
                    bail!("already on the first page");
                }
                self.list.set_page(current - 1).wait().await;
            }
            ConsoleCommand::Page(page) => self.list.set_page(page).wait().await,
            ConsoleCommand::Limit(limit) => self.list.set_limit(limit).wait().await,
            ConsoleCommand::Filter(raw) => {
                let mut filters = self.list.query().filters;
                for (key, value) in split_pairs(raw.iter().map(String::as_str))? {
                    filters.apply(key.trim(), value.trim())?;
                }
                self.list.set_filters(filters).wait().await;
            }
            ConsoleCommand::Clear => self.list.clear_filters().wait().await,
            ConsoleCommand::Sort(spec) => {
                let sort = parse_sort::<R::Filters>(&spec)?;
                self.list.set_sorting(sort.key, sort.order).wait().await;
            }
            ConsoleCommand::Refresh => self.list.refresh().wait().await,
            ConsoleCommand::Delete(id) => {
                self.client
                    .delete(R::PATH, &id)
                    .await
                    .with_context(|| format!("failed to delete {id}"))?;
                info!(resource = R::PATH, %id, "deleted");
                if let Some(pending) = self.list.remove_item(&R::Id::from(id)) {
                    pending.wait().await;
                }
            }
            ConsoleCommand::Status { id, value } => {
                let updated: R::Item = self
                    .client
                    .update(R::PATH, &id, &StatusPatch { status: value })
                    .await
                    .with_context(|| format!("failed to update {id}"))?;
                info!(resource = R::PATH, %id, "status updated");
                if !self.list.mutate_item(&R::Id::from(id), move |_| updated) {
                    debug!(resource = R::PATH, "updated item is not on the current page");
                }
            }
            ConsoleCommand::Help => return Ok(Flow::Help),
            ConsoleCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
