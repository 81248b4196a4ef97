use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};

use catalog_app::app::{self, Backend};
use catalog_cli::client::CatalogClient;
use catalog_cli::form::{BookFields, FormState};
use catalog_cli::views::{AddView, BooksView, Route, UpdateView};
use catalog_kernel::settings::{Settings, TelemetrySettings};

/// Book catalog client and server launcher.
#[derive(Debug, Parser)]
#[command(name = "catalog", version, about)]
struct Cli {
    /// Base URL of the catalog service
    #[arg(
        long,
        global = true,
        env = "CATALOG_BASE_URL",
        default_value = "http://localhost:8080"
    )]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the catalog service
    Serve {
        /// Keep books in memory instead of MySQL
        #[arg(long)]
        in_memory: bool,
    },
    /// Check that the service answers
    Ping,
    /// List all books
    List,
    /// Show one book
    Show { id: u64 },
    /// Add a book, then list all books
    Add(FieldArgs),
    /// Edit a book, then list all books
    Update {
        /// Book id or route such as /update/7
        target: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
}

#[derive(Debug, Args)]
struct FieldArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    cover: Option<String>,
    /// Empty string clears the price
    #[arg(long)]
    price: Option<String>,
}

impl FieldArgs {
    /// Apply every provided flag to `form`, in form field order.
    fn apply(&self, form: &mut FormState<BookFields>) -> anyhow::Result<()> {
        let edits = [
            ("title", &self.title),
            ("description", &self.description),
            ("cover", &self.cover),
            ("price", &self.price),
        ];
        for (name, value) in edits {
            if let Some(value) = value {
                form.change(name, value)?;
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { in_memory } => serve(in_memory).await,
        command => run_client(&cli.base_url, command).await,
    }
}

async fn serve(in_memory: bool) -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load catalog settings")?;
    catalog_telemetry::init(&settings.telemetry)?;

    let backend = if in_memory {
        Backend::Memory
    } else {
        Backend::MySql
    };
    app::run(settings, backend).await
}

async fn run_client(base_url: &str, command: Command) -> anyhow::Result<()> {
    catalog_telemetry::init(&TelemetrySettings {
        log_level: "warn".to_string(),
        ..TelemetrySettings::default()
    })?;

    let client = CatalogClient::new(base_url)?;

    match command {
        Command::Serve { .. } => bail!("serve is not a client command"),
        Command::Ping => {
            let greeting = client.greeting().await?;
            println!("{} ({})", greeting, client.base_url());
        }
        Command::List => show_books(&client).await?,
        Command::Show { id } => {
            let book = client.get_book(id).await?;
            println!("{}", serde_json::to_string_pretty(&book)?);
        }
        Command::Add(fields) => {
            let mut view = AddView::new();
            fields.apply(view.form_mut())?;
            let next = view.submit(&client).await;
            navigate(next, view.form().error())?;
            show_books(&client).await?;
        }
        Command::Update { target, fields } => {
            let route = parse_target(&target)?;
            let mut view = UpdateView::for_route(route)
                .ok_or_else(|| anyhow!("'{target}' is not an update route"))?;
            if !view.load(&client).await {
                bail!(view.form().error().unwrap_or("failed to load book").to_string());
            }
            fields.apply(view.form_mut())?;
            let next = view.submit(&client).await;
            navigate(next, view.form().error())?;
            show_books(&client).await?;
        }
    }

    Ok(())
}

/// Accept a bare id or a location path.
fn parse_target(target: &str) -> anyhow::Result<Route> {
    if let Ok(id) = target.parse::<u64>() {
        if id == 0 {
            bail!("book ids start at 1, got '{target}'");
        }
        return Ok(Route::Update(id));
    }
    Route::parse(target).ok_or_else(|| anyhow!("unrecognized route '{target}'"))
}

fn navigate(next: Option<Route>, error: Option<&str>) -> anyhow::Result<()> {
    match next {
        Some(route) => {
            tracing::debug!(route = %route.path(), "navigating");
            Ok(())
        }
        None => bail!(error.unwrap_or("request failed").to_string()),
    }
}

async fn show_books(client: &CatalogClient) -> anyhow::Result<()> {
    let view = BooksView::load(client).await;
    print!("{}", view.render());
    match view.error() {
        Some(error) => bail!(error.to_string()),
        None => Ok(()),
    }
}
