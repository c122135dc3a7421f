use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dynapage::storage::dynamodb::{item_to_json, json_to_item, DynamoDbStore, Item};
use dynapage::{Config, Table};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// dynapage - read and write DynamoDB tables without thinking about pages or throttling
#[derive(Parser, Debug)]
#[command(name = "dynapage")]
#[command(version, about, long_about = None)]
struct Cli {
    /// AWS region
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Custom endpoint URL (e.g. http://localhost:8000 for local DynamoDB)
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Query a partition, newest sort key first
    Get {
        table: String,
        /// Partition key as `attribute:value`
        #[arg(long)]
        pk: String,
        /// Sort key prefix as `attribute:value`
        #[arg(long, default_value = "")]
        sk: String,
        /// Maximum number of records (0 = all)
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Query a secondary index by key value
    Index {
        table: String,
        /// Index name
        #[arg(long)]
        index: String,
        /// Index key attribute
        #[arg(long)]
        key: String,
        /// Value to match
        #[arg(long)]
        value: String,
    },
    /// Scan a whole table
    Scan {
        table: String,
        /// Maximum number of records (0 = all)
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Write a record given as a JSON object
    Put {
        table: String,
        /// Record as JSON, e.g. '{"pk":"user#1","sk":"profile"}'
        item: String,
    },
    /// Delete a record by key
    Delete {
        table: String,
        /// Partition key as `attribute:value`
        #[arg(long)]
        pk: String,
        /// Sort key as `attribute:value`
        #[arg(long, default_value = "")]
        sk: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dynapage=info,dynapage_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::from_env();
    if let Some(region) = cli.region {
        config.region = region;
    }
    if cli.endpoint_url.is_some() {
        config.endpoint_url = cli.endpoint_url;
    }

    tracing::info!(endpoint = %config.target_display(), "Connecting");
    let store = DynamoDbStore::from_config(&config).await;
    let table = Table::with_backoff(store, config.backoff);

    match cli.command {
        Command::Get {
            table: name,
            pk,
            sk,
            limit,
        } => print_items(&table.get_items(&name, &pk, &sk, limit).await?)?,
        Command::Index {
            table: name,
            index,
            key,
            value,
        } => print_items(&table.get_index_items(&name, &index, &key, &value).await?)?,
        Command::Scan { table: name, limit } => {
            print_items(&table.scan_items(&name, limit).await?)?
        }
        Command::Put { table: name, item } => {
            let value = serde_json::from_str(&item).context("Item is not valid JSON")?;
            let record = json_to_item(value)?;
            table.put_item(&name, &record).await?;
            tracing::info!(table = %name, "Record written");
        }
        Command::Delete {
            table: name,
            pk,
            sk,
        } => {
            table.delete_item(&name, &pk, &sk).await?;
            tracing::info!(table = %name, "Record deleted");
        }
    }

    Ok(())
}

/// Print one JSON object per line.
fn print_items(items: &[Item]) -> Result<()> {
    for item in items {
        println!("{}", serde_json::to_string(&item_to_json(item))?);
    }
    tracing::info!(count = items.len(), "Done");
    Ok(())
}
