mod commands;
mod config;
mod render;
mod session;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    filters::{parse_sort, split_pairs},
    Documents, Ingestions, ListFilters, LoadStatus, Resource, RestClient, Users,
};
use serde::Serialize;
use shared::protocol::Query;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    commands::{ConsoleCommand, HELP},
    config::load_settings,
    render::Render,
    session::{Flow, Session},
};

/// Browse the document backend's collections from a terminal.
#[derive(Parser, Debug)]
#[command(name = "docdesk", version)]
struct Cli {
    /// TOML settings file (defaults to ./docdesk.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long, env = "DOCDESK_EMAIL")]
    email: Option<String>,
    #[arg(long, env = "DOCDESK_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Use an existing access token instead of signing in.
    #[arg(long)]
    token: Option<String>,
    #[command(subcommand)]
    command: ResourceCommand,
}

#[derive(Subcommand, Debug)]
enum ResourceCommand {
    Documents(ListArgs),
    Users(ListArgs),
    Ingestions(ListArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct ListArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Rows per page (defaults to the configured page size).
    #[arg(long)]
    limit: Option<u32>,
    /// Filter as KEY=VALUE; repeatable.
    #[arg(long = "filter", value_name = "KEY=VALUE")]
    filter: Vec<String>,
    /// Sort as KEY or KEY:asc|desc.
    #[arg(long)]
    sort: Option<String>,
    /// Print the loaded page as JSON.
    #[arg(long, conflicts_with = "interactive")]
    json: bool,
    /// Keep the list open and read commands from stdin.
    #[arg(long, short)]
    interactive: bool,
}

impl ListArgs {
    fn query<F: ListFilters>(&self, default_limit: u32) -> Result<Query<F>> {
        let filters = F::from_params(split_pairs(self.filter.iter().map(String::as_str))?)?;
        let mut query = Query::new(self.page, self.limit.unwrap_or(default_limit))
            .with_filters(filters);
        if let Some(raw) = &self.sort {
            query = query.with_sort(parse_sort::<F>(raw)?);
        }
        Ok(query)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(url) = cli.server_url.clone() {
        settings.server_url = url;
    }
    if let Some(token) = cli.token.clone() {
        settings.access_token = Some(token);
    }

    let client = RestClient::new(&settings.server_url, settings.request_timeout)?;
    match (&cli.email, &cli.password, settings.access_token.take()) {
        (Some(email), Some(password), _) => {
            client
                .login(email, password)
                .await
                .context("sign-in failed")?;
        }
        (Some(_), None, _) | (None, Some(_), _) => {
            bail!("--email and --password must be given together")
        }
        (None, None, Some(token)) => client.tokens().set(token).await,
        (None, None, None) => info!("no credentials given; requests are sent unauthenticated"),
    }

    let page_size = settings.page_size;
    match cli.command {
        ResourceCommand::Documents(args) => {
            let query = args.query(page_size)?;
            run::<Documents>(client, query, &args).await
        }
        ResourceCommand::Users(args) => {
            let query = args.query(page_size)?;
            run::<Users>(client, query, &args).await
        }
        ResourceCommand::Ingestions(args) => {
            let query = args.query(page_size)?;
            run::<Ingestions>(client, query, &args).await
        }
    }
}

async fn run<R>(client: RestClient, query: Query<R::Filters>, args: &ListArgs) -> Result<()>
where
    R: Resource,
    R::Item: Render + Serialize,
{
    let session = Session::<R>::new(client, query);

    if !args.interactive {
        session.list().settled().await;
        let state = session.list().state();
        if args.json {
            if let Some(page) = &state.page {
                println!("{}", serde_json::to_string_pretty(page)?);
            }
        } else {
            print!("{}", render::render_state(&state));
        }
        if state.status == LoadStatus::Error {
            if let Some(error) = state.error {
                return Err(error).context(format!("failed to load {}", R::PATH));
            }
        }
        return Ok(());
    }

    print!("{}", session.render().await);
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(format!("{}> ", R::PATH).as_bytes()).await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<ConsoleCommand>() {
            Ok(command) => command,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };
        match session.execute(command).await {
            Ok(Flow::Quit) => break,
            Ok(Flow::Help) => println!("{HELP}"),
            Ok(Flow::Continue) => print!("{}", session.render().await),
            Err(err) => eprintln!("{err:#}"),
        }
    }
    Ok(())
}
