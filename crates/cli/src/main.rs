//! Cwish CLI - Database migrations and store management.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! cwish-cli migrate
//!
//! # Seed both catalogs with their default products
//! cwish-cli seed
//!
//! # Seed the hero product with a custom price
//! cwish-cli seed single --name "Magic Nectar Tee" --price 27.50
//!
//! # Triage the contact inbox
//! cwish-cli contacts list --unread
//! cwish-cli contacts mark-read 42
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

use cwish_core::{CurrencyCode, ProductKind};

mod commands;

#[derive(Parser)]
#[command(name = "cwish-cli")]
#[command(author, version, about = "Cwish CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert the catalog products if the catalogs are empty
    Seed {
        /// Catalog to seed (both when omitted)
        #[arg(value_enum)]
        kind: Option<Catalog>,

        /// Product name
        #[arg(long)]
        name: Option<String>,

        /// Product description
        #[arg(long)]
        description: Option<String>,

        /// Unit price, e.g. 25.00
        #[arg(long)]
        price: Option<Decimal>,

        /// ISO 4217 currency code
        #[arg(long)]
        currency: Option<CurrencyCode>,

        /// Product image URL
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Manage contact form submissions
    Contacts {
        #[command(subcommand)]
        action: ContactsAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Catalog {
    /// The hero product
    Single,
    /// The digital bonus product
    Bonus,
}

impl From<Catalog> for ProductKind {
    fn from(catalog: Catalog) -> Self {
        match catalog {
            Catalog::Single => Self::Single,
            Catalog::Bonus => Self::Bonus,
        }
    }
}

#[derive(Subcommand)]
enum ContactsAction {
    /// List submissions, newest first
    List {
        /// Only show unread submissions
        #[arg(long)]
        unread: bool,
    },
    /// Mark a submission as read
    MarkRead {
        /// Submission id
        id: i32,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed {
            kind,
            name,
            description,
            price,
            currency,
            image_url,
        } => {
            let options = commands::seed::SeedOptions {
                name,
                description,
                price,
                currency,
                image_url,
            };
            commands::seed::run(kind.map(ProductKind::from), options).await?;
        }
        Commands::Contacts { action } => match action {
            ContactsAction::List { unread } => commands::contacts::list(unread).await?,
            ContactsAction::MarkRead { id } => commands::contacts::mark_read(id).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_seed_arguments_parse() {
        let cli = Cli::try_parse_from([
            "cwish-cli", "seed", "bonus", "--price", "7.50", "--currency", "eur",
        ])
        .unwrap_or_else(|e| panic!("{e}"));
        let Commands::Seed {
            kind,
            price,
            currency,
            ..
        } = cli.command
        else {
            panic!("expected seed");
        };
        assert!(matches!(kind, Some(Catalog::Bonus)));
        assert_eq!(price, Some(Decimal::new(750, 2)));
        assert_eq!(currency, Some(CurrencyCode::EUR));
    }

    #[test]
    fn test_unknown_currency_rejected() {
        assert!(Cli::try_parse_from(["cwish-cli", "seed", "single", "--currency", "XYZ"]).is_err());
    }
}
