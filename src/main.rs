use clap::{Parser, Subcommand};
use msgforge::Result;
use msgforge::commands::{
    generate, ingest_policies, load_exemplars, optimize, show_status, validate_text,
};
use msgforge::config::{run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "msgforge")]
#[command(about = "Policy-compliant notification template generation with retrieval context")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and validation rules
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Ingest policy passages from a JSON file
    IngestPolicies {
        /// Path to the policy JSON file
        path: PathBuf,
        /// Drop the existing policy collection first
        #[arg(long)]
        reset: bool,
    },
    /// Load approved exemplars and mine category patterns
    LoadExemplars {
        /// Path to the exemplar JSON file
        path: PathBuf,
        /// Drop the existing exemplar collection first
        #[arg(long)]
        reset: bool,
    },
    /// Generate a template from a free-form request
    Generate {
        /// What the message should say
        request: String,
        /// Session id to attribute history and usage to
        #[arg(long)]
        session: Option<String>,
        /// Business vertical, e.g. "전자상거래"
        #[arg(long)]
        business_type: Option<String>,
        /// Primary category filter for retrieval
        #[arg(long)]
        category: Option<String>,
        /// Secondary category
        #[arg(long)]
        category_2: Option<String>,
        /// Target character length
        #[arg(long)]
        target_length: Option<usize>,
        /// Variables that must appear, repeatable
        #[arg(long = "variable")]
        variables: Vec<String>,
    },
    /// Optimize an existing template
    Optimize {
        /// The template text to improve
        template: String,
        /// Session id to attribute usage to
        #[arg(long)]
        session: Option<String>,
        /// Specific aspects to improve, repeatable
        #[arg(long = "improve")]
        improvements: Vec<String>,
    },
    /// Validate a template against both scoring strategies
    Validate {
        /// The template text to check
        text: String,
        /// Business vertical for sector-specific warnings
        #[arg(long)]
        business_type: Option<String>,
    },
    /// Show collection sizes and usage totals
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::IngestPolicies { path, reset } => {
            ingest_policies(&path, reset).await?;
        }
        Commands::LoadExemplars { path, reset } => {
            load_exemplars(&path, reset).await?;
        }
        Commands::Generate {
            request,
            session,
            business_type,
            category,
            category_2,
            target_length,
            variables,
        } => {
            generate(
                request,
                session,
                business_type,
                category,
                category_2,
                target_length,
                variables,
            )
            .await?;
        }
        Commands::Optimize {
            template,
            session,
            improvements,
        } => {
            optimize(template, session, improvements).await?;
        }
        Commands::Validate {
            text,
            business_type,
        } => {
            validate_text(&text, business_type.as_deref())?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}
