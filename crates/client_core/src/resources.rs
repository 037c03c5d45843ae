//! The three list views the dashboard offers, each one a [`ListResource`]
//! bound to its endpoint and filter record.

use std::{fmt::Display, sync::Arc};

use serde::de::DeserializeOwned;
use shared::{
    domain::{Document, DocumentId, Ingestion, IngestionId, User, UserId},
    protocol::Query,
};

use crate::{
    filters::{DocumentFilters, IngestionFilters, ListFilters, UserFilters},
    list_resource::{ListResource, Listable},
    rest::{HttpPageSource, RestClient},
};

/// A remote paginated collection.
pub trait Resource: Send + Sync + 'static {
    type Id: From<String> + Display + PartialEq + Clone + std::fmt::Debug + Send + Sync;
    type Item: Listable<Id = Self::Id> + DeserializeOwned;
    type Filters: ListFilters;

    /// Path of the list endpoint, relative to the server url.
    const PATH: &'static str;
}

pub struct Documents;
pub struct Users;
pub struct Ingestions;

impl Resource for Documents {
    type Id = DocumentId;
    type Item = Document;
    type Filters = DocumentFilters;
    const PATH: &'static str = "documents";
}

impl Resource for Users {
    type Id = UserId;
    type Item = User;
    type Filters = UserFilters;
    const PATH: &'static str = "users";
}

impl Resource for Ingestions {
    type Id = IngestionId;
    type Item = Ingestion;
    type Filters = IngestionFilters;
    const PATH: &'static str = "ingestions";
}

impl Listable for Document {
    type Id = DocumentId;

    fn id(&self) -> &DocumentId {
        &self.id
    }
}

impl Listable for User {
    type Id = UserId;

    fn id(&self) -> &UserId {
        &self.id
    }
}

impl Listable for Ingestion {
    type Id = IngestionId;

    fn id(&self) -> &IngestionId {
        &self.id
    }
}

pub type ResourceList<R> = ListResource<<R as Resource>::Item, <R as Resource>::Filters>;
pub type DocumentList = ResourceList<Documents>;
pub type UserList = ResourceList<Users>;
pub type IngestionList = ResourceList<Ingestions>;

pub fn resource_list<R: Resource>(
    client: &RestClient,
    initial_query: Query<R::Filters>,
    auto_fetch: bool,
) -> ResourceList<R> {
    let source = Arc::new(HttpPageSource::<R>::new(client.clone()));
    ListResource::new(source, initial_query, auto_fetch)
}

pub fn documents(client: &RestClient, initial_query: Query<DocumentFilters>) -> DocumentList {
    resource_list::<Documents>(client, initial_query, true)
}

pub fn users(client: &RestClient, initial_query: Query<UserFilters>) -> UserList {
    resource_list::<Users>(client, initial_query, true)
}

pub fn ingestions(client: &RestClient, initial_query: Query<IngestionFilters>) -> IngestionList {
    resource_list::<Ingestions>(client, initial_query, true)
}
