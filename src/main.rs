use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use homefit_client::api::types::{Credentials, SortBy, SortOrder};
use homefit_client::filters::{Facet, FilterPanel};
use homefit_client::guard::{self, Access};
use homefit_client::{Backend, Config, HttpBackend, IdentityStore, MatchView, SessionState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "HomeFit apartment marketplace client")]
struct Cli {
    /// Log in with this email before running the command
    #[arg(long, requires = "password")]
    email: Option<String>,

    #[arg(long, requires = "email")]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current identity
    Whoami,
    /// List matches for a saved preference
    Matches {
        preference_id: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, value_enum, default_value_t = SortArg::Score)]
        sort_by: SortArg,
        #[arg(long, value_enum, default_value_t = OrderArg::Desc)]
        sort_order: OrderArg,
        #[arg(long)]
        min_price: Option<u32>,
        #[arg(long)]
        max_price: Option<u32>,
        #[arg(long)]
        bedrooms: Vec<String>,
        #[arg(long)]
        neighborhood: Vec<String>,
        #[arg(long)]
        amenity: Vec<String>,
        /// Write the fetched matches to this JSON file
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// List saved apartments
    Saved,
    /// Check whether the current identity may open a route
    Route { path: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortArg {
    Score,
    Price,
    Date,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrderArg {
    Asc,
    Desc,
}

impl From<SortArg> for SortBy {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Score => SortBy::MatchScore,
            SortArg::Price => SortBy::Price,
            SortArg::Date => SortBy::DateAdded,
        }
    }
}

impl From<OrderArg> for SortOrder {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::Asc => SortOrder::Asc,
            OrderArg::Desc => SortOrder::Desc,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&config)?);
    let store = IdentityStore::new();

    info!("🏠 HomeFit client ({})", config.api_url);

    match (&cli.email, &cli.password) {
        (Some(email), Some(password)) => {
            let credentials = Credentials {
                email: email.clone(),
                password: password.clone(),
            };
            store.login(backend.as_ref(), &credentials).await?;
        }
        _ => {
            store.bootstrap(backend.as_ref()).await;
        }
    }

    match cli.command {
        Command::Whoami => match store.snapshot() {
            SessionState::Authenticated(user) => {
                println!("{} <{}> ({:?})", user.name, user.email, user.role);
                if user.is_pending_broker() {
                    println!("   Broker account is awaiting admin approval");
                }
            }
            _ => println!("Not logged in"),
        },
        Command::Route { path } => match guard::check(&store, &path) {
            Access::Allow => println!("{path}: allowed"),
            Access::Redirect(to) => println!("{path}: redirected to {to}"),
        },
        Command::Saved => {
            let saved = backend.saved_apartments().await?;
            info!("{} saved apartments", saved.len());
            for (i, apartment) in saved.iter().enumerate() {
                println!("{}. {} (${}/month)", i + 1, apartment.title, apartment.price);
                println!("   {} bd, {} ba, {}", apartment.bedrooms, apartment.bathrooms, apartment.neighborhood);
                println!("   ID: {}", apartment.id);
                println!();
            }
        }
        Command::Matches {
            preference_id,
            page,
            sort_by,
            sort_order,
            min_price,
            max_price,
            bedrooms,
            neighborhood,
            amenity,
            output,
        } => {
            let mut panel = FilterPanel::default();
            let filtered = min_price.is_some()
                || max_price.is_some()
                || !bedrooms.is_empty()
                || !neighborhood.is_empty()
                || !amenity.is_empty();
            panel.set_price_bounds(min_price, max_price);
            for (facet, values) in [
                (Facet::Bedrooms, &bedrooms),
                (Facet::Neighborhoods, &neighborhood),
                (Facet::Amenities, &amenity),
            ] {
                for value in values {
                    panel.toggle(facet, value);
                }
            }

            let view = MatchView::new(backend.clone(), preference_id, &config)
                .starting_at(page)
                .sorted_by(sort_by.into(), sort_order.into())
                .filtered(filtered.then(|| panel.apply()));
            view.load().await?;

            let state = view.snapshot().await;
            info!(
                "✅ Page {} of {} ({} matches)",
                state.page,
                view.total_pages().await.max(1),
                state.filtered_count
            );

            if let Some(message) = state.empty_message() {
                println!("{message}");
            }
            for (i, card) in state.cards.iter().enumerate() {
                let apartment = &card.record.apartment;
                let saved = if state.is_saved(&apartment.id) { " ★" } else { "" };
                println!("{}. {} (${}/month){}", i + 1, apartment.title, apartment.price, saved);
                println!("   Match score: {}%", card.score);
                for hint in &card.hints {
                    println!("   {} {}", hint.kind.sigil(), hint.text);
                }
                if let Some(image) = card.active_image() {
                    println!("   Photo 1 of {}: {}", card.gallery.len(), image);
                }
                println!("   ID: {}", apartment.id);
                println!();
            }

            if let Some(path) = output {
                let records: Vec<_> = state.cards.iter().map(|card| &card.record).collect();
                let json = serde_json::to_string_pretty(&records)?;
                tokio::fs::write(&path, json).await?;
                info!("💾 Saved {} matches to {}", records.len(), path.display());
            }
        }
    }

    Ok(())
}
