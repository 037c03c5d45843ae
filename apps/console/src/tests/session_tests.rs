use super::*;
use std::{
    collections::HashMap,
    sync::Arc,
    time::Duration,
};

use axum::{
    extract::{Path, Query as QueryParams, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use chrono::{TimeZone, Utc};
use client_core::{Users, UserFilters};
use shared::{
    domain::{Role, User, UserId, UserStatus},
    protocol::PageResponse,
};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone)]
struct Directory {
    users: Arc<Mutex<Vec<User>>>,
    list_calls: Arc<Mutex<u32>>,
}

fn user(n: u32) -> User {
    User {
        id: UserId(format!("u-{n}")),
        email: format!("user{n}@example.com"),
        name: format!("User {n}"),
        role: if n % 4 == 0 { Role::Admin } else { Role::Viewer },
        status: UserStatus::Active,
        created_at: Utc
            .timestamp_opt(1_700_000_000 + i64::from(n), 0)
            .single()
            .expect("timestamp"),
        last_login_at: None,
    }
}

async fn list_users(
    State(directory): State<Directory>,
    QueryParams(params): QueryParams<HashMap<String, String>>,
) -> Json<PageResponse<User>> {
    *directory.list_calls.lock().await += 1;
    let page: u32 = params
        .get("page")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);
    let limit: u32 = params
        .get("limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(20);
    let role = params.get("role").and_then(|v| v.parse::<Role>().ok());

    let users = directory.users.lock().await;
    let matching: Vec<&User> = users
        .iter()
        .filter(|user| role.map_or(true, |role| user.role == role))
        .collect();
    Json(PageResponse {
        items: matching
            .iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .map(|user| (*user).clone())
            .collect(),
        total: matching.len() as u64,
        page,
        limit,
    })
}

async fn patch_user(
    State(directory): State<Directory>,
    Path(id): Path<String>,
    Json(body): Json<StatusPatch>,
) -> Response {
    let Ok(status) = body.status.parse::<UserStatus>() else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "code": "validation", "message": "unknown status" })),
        )
            .into_response();
    };
    let mut users = directory.users.lock().await;
    match users.iter_mut().find(|user| user.id.as_str() == id) {
        Some(user) => {
            user.status = status;
            Json(user.clone()).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete_user(State(directory): State<Directory>, Path(id): Path<String>) -> StatusCode {
    directory
        .users
        .lock()
        .await
        .retain(|user| user.id.as_str() != id);
    StatusCode::NO_CONTENT
}

async fn session(count: u32, query: Query<UserFilters>) -> (Session<Users>, Directory) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let directory = Directory {
        users: Arc::new(Mutex::new((1..=count).map(user).collect())),
        list_calls: Arc::new(Mutex::new(0)),
    };
    let app = Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", patch(patch_user).delete(delete_user))
        .with_state(directory.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let client =
        RestClient::new(&format!("http://{addr}"), Duration::from_secs(5)).expect("client");
    let session = Session::<Users>::new(client, query);
    session.list().settled().await;
    (session, directory)
}

#[tokio::test]
async fn next_and_prev_stay_within_loaded_pages() {
    let (session, _) = session(25, Query::new(1, 10)).await;

    session.execute(ConsoleCommand::Next).await.expect("next");
    assert_eq!(session.list().query().page, 2);
    session.execute(ConsoleCommand::Next).await.expect("next");
    let err = session
        .execute(ConsoleCommand::Next)
        .await
        .expect_err("last page");
    assert_eq!(err.to_string(), "already on the last page");

    session.execute(ConsoleCommand::Page(1)).await.expect("page");
    let err = session
        .execute(ConsoleCommand::Prev)
        .await
        .expect_err("first page");
    assert_eq!(err.to_string(), "already on the first page");
}

#[tokio::test]
async fn filter_merges_into_current_filters_and_resets_page() {
    let (session, _) = session(25, Query::new(2, 5)).await;

    session
        .execute(ConsoleCommand::Filter(vec!["role=admin".to_string()]))
        .await
        .expect("filter");

    let state = session.list().state();
    assert_eq!(state.query.page, 1);
    assert_eq!(state.query.filters.role, Some(Role::Admin));
    assert_eq!(state.page.as_ref().map(|page| page.total()), Some(6));

    session
        .execute(ConsoleCommand::Filter(vec!["search=user".to_string()]))
        .await
        .expect("filter");
    let filters = session.list().query().filters;
    assert_eq!(filters.role, Some(Role::Admin));
    assert_eq!(filters.search.as_deref(), Some("user"));

    session.execute(ConsoleCommand::Clear).await.expect("clear");
    assert_eq!(session.list().query().filters, UserFilters::default());
}

#[tokio::test]
async fn invalid_filter_or_sort_leaves_query_untouched() {
    let (session, directory) = session(5, Query::new(1, 10)).await;
    let before = session.list().query();

    assert!(session
        .execute(ConsoleCommand::Filter(vec!["role=overlord".to_string()]))
        .await
        .is_err());
    assert!(session
        .execute(ConsoleCommand::Sort("shoeSize".to_string()))
        .await
        .is_err());

    assert_eq!(session.list().query(), before);
    assert_eq!(*directory.list_calls.lock().await, 1);
}

#[tokio::test]
async fn status_change_updates_row_without_refetch() {
    let (session, directory) = session(5, Query::new(1, 10)).await;

    session
        .execute(ConsoleCommand::Status {
            id: "u-2".to_string(),
            value: "suspended".to_string(),
        })
        .await
        .expect("status");

    let state = session.list().state();
    assert_eq!(state.items()[1].status, UserStatus::Suspended);
    assert_eq!(state.items()[0].status, UserStatus::Active);
    assert_eq!(*directory.list_calls.lock().await, 1);

    let err = session
        .execute(ConsoleCommand::Status {
            id: "u-2".to_string(),
            value: "banished".to_string(),
        })
        .await
        .expect_err("invalid status");
    assert!(format!("{err:#}").contains("unknown status"));
}

#[tokio::test]
async fn deleting_only_row_of_last_page_steps_back() {
    let (session, directory) = session(21, Query::new(3, 10)).await;
    assert_eq!(session.list().state().items().len(), 1);

    session
        .execute(ConsoleCommand::Delete("u-21".to_string()))
        .await
        .expect("delete");

    let state = session.list().state();
    assert_eq!(state.query.page, 2);
    assert_eq!(state.page.as_ref().map(|page| page.total()), Some(20));
    assert_eq!(state.items().len(), 10);
    assert_eq!(*directory.list_calls.lock().await, 2);

    let rendered = session.render().await;
    assert!(rendered.contains("page 2/2 · 20 total"));
}

#[tokio::test]
async fn help_and_quit_only_change_flow() {
    let (session, directory) = session(3, Query::new(1, 10)).await;
    assert_eq!(
        session.execute(ConsoleCommand::Help).await.expect("help"),
        Flow::Help
    );
    assert_eq!(
        session.execute(ConsoleCommand::Quit).await.expect("quit"),
        Flow::Quit
    );
    assert_eq!(*directory.list_calls.lock().await, 1);
}
