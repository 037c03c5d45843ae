//! Client-side core for the docdesk dashboard: list controllers over the
//! document backend's paginated collections.

pub mod error;
pub mod filters;
pub mod list_resource;
pub mod resources;
pub mod rest;

pub use error::{FetchError, FilterError};
pub use filters::{DocumentFilters, IngestionFilters, ListFilters, UserFilters};
pub use list_resource::{ListResource, Listable, LoadStatus, PageSource, PendingFetch, ResourceState};
pub use resources::{
    documents, ingestions, resource_list, users, DocumentList, Documents, IngestionList,
    Ingestions, Resource, ResourceList, UserList, Users,
};
pub use rest::{HttpPageSource, RestClient, TokenStore};
