use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cdr_core::config::{auth_mode_from_env_value, required_env_value};
use cdr_core::constants::{ENV_IS_TOKEN_AUTH, ENV_PASSWORD, ENV_URL, ENV_USERNAME};
use cdr_core::{CdrConfig, OpenEhrConnector};
use openehr::{
    AllergyIntoleranceQuery, CompositeIdentifier, ConditionQuery, CustomResourceQuery,
    PatientIdentifier, ResourceQuery,
};

#[derive(Parser)]
#[command(name = "cdr")]
#[command(about = "Query an openEHR CDR with AQL")]
struct Cli {
    /// Resource type to query
    #[arg(long, value_enum, default_value_t = Resource::Allergy)]
    resource: Resource,
    /// Custom base AQL (must contain a where clause); overrides --resource
    #[arg(long)]
    aql: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Resource {
    Allergy,
    Condition,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every record of the resource type
    All,
    /// Fetch one record by composite id
    ById {
        /// `<compositionId>` or `<compositionId>|<entryId>`
        id: String,
    },
    /// Fetch records for a patient identified by a coded identifier
    Patient {
        /// Identifier value, e.g. an NHS number
        value: String,
        /// Identifier system; empty means NHS number
        #[arg(long, default_value = "")]
        system: String,
    },
    /// Fetch records for a patient identified by CDR EHR id
    Ehr {
        /// EHR id
        ehr_id: String,
    },
    /// Fetch records whose composition started within a period
    Period {
        /// Start of period (RFC 3339)
        #[arg(long)]
        from: DateTime<Utc>,
        /// End of period (RFC 3339)
        #[arg(long)]
        to: DateTime<Utc>,
    },
    /// Print the AQL that would be sent, without contacting the CDR
    ShowAql {
        /// Composite id to filter on
        #[arg(long)]
        id: Option<String>,
    },
}

/// Entry point for the CDR connector CLI
///
/// Reads connection settings from the environment (after loading `.env` if present), runs one
/// lookup and prints the result set as JSON.
///
/// # Environment Variables
/// - `CDR_CONNECTOR_URL`: CDR base URL
/// - `CDR_CONNECTOR_USERNAME`: CDR username
/// - `CDR_CONNECTOR_PASSWORD`: CDR password
/// - `CDR_CONNECTOR_IS_TOKEN_AUTH`: `true` to use a session per query (default: `false`)
/// - `RUST_LOG`: log filter (default: `cdr=info,cdr_core=info`)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cdr=info".parse()?)
                .add_directive("cdr_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let resource = resource_query(cli.resource, cli.aql)?;

    let result = match cli.command {
        Commands::ShowAql { id } => {
            let aql = match id {
                Some(id) => resource
                    .base_query()
                    .and(openehr::filters::composite_identifier_filter(
                        &CompositeIdentifier::parse(&id)?,
                    )?),
                None => resource.base_query(),
            };
            println!("{}", aql);
            return Ok(());
        }
        Commands::All => connector(resource)?.get_all_resources().await?,
        Commands::ById { id } => connector(resource)?.get_resource_by_id(&id).await?,
        Commands::Patient { value, system } => {
            connector(resource)?
                .get_resources_for_patient(&PatientIdentifier::coded(system, value))
                .await?
        }
        Commands::Ehr { ehr_id } => {
            connector(resource)?
                .get_resources_for_patient(&PatientIdentifier::local(ehr_id))
                .await?
        }
        Commands::Period { from, to } => {
            connector(resource)?
                .get_resources_in_period(from, to)
                .await?
        }
    };

    print_result(result)
}

fn resource_query(
    resource: Resource,
    aql: Option<String>,
) -> anyhow::Result<Box<dyn ResourceQuery>> {
    if let Some(aql) = aql {
        return Ok(Box::new(CustomResourceQuery::new("Custom", aql)?));
    }

    Ok(match resource {
        Resource::Allergy => Box::new(AllergyIntoleranceQuery),
        Resource::Condition => Box::new(ConditionQuery),
    })
}

fn connector(
    resource: Box<dyn ResourceQuery>,
) -> anyhow::Result<OpenEhrConnector<Box<dyn ResourceQuery>>> {
    let config = config_from_env()?;
    tracing::info!(
        "querying {} at {} ({:?} auth)",
        resource.resource_type(),
        config.base_url(),
        config.auth_mode()
    );
    Ok(OpenEhrConnector::new(config, resource))
}

fn config_from_env() -> anyhow::Result<CdrConfig> {
    let url = required_env_value(ENV_URL, std::env::var(ENV_URL).ok())?;
    let username = required_env_value(ENV_USERNAME, std::env::var(ENV_USERNAME).ok())?;
    let password = std::env::var(ENV_PASSWORD).unwrap_or_default();
    let auth_mode = auth_mode_from_env_value(std::env::var(ENV_IS_TOKEN_AUTH).ok())?;

    Ok(CdrConfig::new(url, username, password, auth_mode)?)
}

fn print_result(result: Option<Value>) -> anyhow::Result<()> {
    match result {
        Some(result_set) => println!("{}", serde_json::to_string_pretty(&result_set)?),
        None => println!("No result."),
    }
    Ok(())
}
