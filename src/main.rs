use rcm_analytics::analytics::OperationKind;
use rcm_analytics::config::AppConfig;
use rcm_analytics::dataset::{DatasetSource, TabularSource};
use rcm_analytics::llm::LlmClient;
use rcm_analytics::router::{classify, Route, ROUTING_RULES};
use rcm_analytics::AnalyticsAssistant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rcm-analytics")]
#[command(about = "Answer revenue-cycle questions from the RCM dataset")]
#[command(version)]
struct Args {
    /// Workbook or CSV directory (or set RCM_DATASET_PATH)
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question and print the narrated answer
    Ask { question: String },
    /// Run one aggregation and print its result as JSON
    Aggregate {
        /// Operation name, e.g. ar_balance_by_payer
        operation: OperationKind,

        /// Payer filter (top_denial_categories only)
        #[arg(long)]
        payer: Option<String>,
    },
    /// Show which aggregation a question routes to
    Route { question: String },
    /// List the routing rules in evaluation order
    Rules,
    /// List the sheets in the dataset
    Sheets,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(dataset) = args.dataset {
        config.dataset_path = dataset;
    }

    match args.command {
        Commands::Ask { question } => ask(&config, &question).await,
        Commands::Aggregate { operation, payer } => aggregate(&config, operation, payer),
        Commands::Route { question } => {
            match classify(&question) {
                Route::Aggregate(operation) => println!("{}", operation),
                Route::General => println!("general"),
            }
            Ok(())
        }
        Commands::Rules => {
            print_rules();
            Ok(())
        }
        Commands::Sheets => {
            let source = DatasetSource::open(&config.dataset_path);
            for sheet in source.load_all()? {
                println!("{} ({} rows)", sheet.name(), sheet.row_count());
            }
            Ok(())
        }
    }
}

async fn ask(config: &AppConfig, question: &str) -> Result<()> {
    info!("Dataset: {:?}", config.dataset_path);
    let llm = LlmClient::from_config(&config.llm)?;
    let assistant = AnalyticsAssistant::new(DatasetSource::open(&config.dataset_path), llm);

    let response = assistant.ask(question).await?;

    println!("\n{}", response.answer);
    if let Some(data) = &response.data {
        println!("\n{}", "-".repeat(80));
        println!("{}", serde_json::to_string_pretty(data)?);
    }
    Ok(())
}

fn aggregate(config: &AppConfig, operation: OperationKind, payer: Option<String>) -> Result<()> {
    if payer.is_some() && operation != OperationKind::TopDenialCategories {
        anyhow::bail!("--payer only applies to top_denial_categories");
    }
    let source = DatasetSource::open(&config.dataset_path);
    let result = operation.with_payer(payer).execute(&source)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn print_rules() {
    for (i, rule) in ROUTING_RULES.iter().enumerate() {
        let conditions: Vec<String> = rule
            .all_of
            .iter()
            .map(|group| group.iter().map(|s| format!("\"{}\"", s)).collect::<Vec<_>>().join(" | "))
            .collect();
        println!("{}. {} -> {}", i + 1, conditions.join(" & "), rule.operation);
        for hint in rule.payer_hints {
            println!("     \"{}\" sets payer={}", hint.keyword, hint.payer);
        }
    }
    println!("{}. otherwise -> general", ROUTING_RULES.len() + 1);
}
