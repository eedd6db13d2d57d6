use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ng_core::{Category, FieldKind, RawArticle, RecordStorage};
use ng_inference::{prompts, Config, PipelineConfig, RetryPolicy};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct HumanDuration(Duration);

fn add_millis(total: u64, num: u64, unit_millis: u64) -> std::result::Result<u64, String> {
    num.checked_mul(unit_millis)
        .and_then(|millis| total.checked_add(millis))
        .ok_or_else(|| "Duration is too large".to_string())
}

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_millis = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;
        let mut chars = s.chars().peekable();

        while let Some(c) = chars.next() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if let Ok(num) = current_number.parse::<u64>() {
                let unit_millis = match c {
                    'm' if chars.peek() == Some(&'s') => {
                        chars.next();
                        1
                    }
                    's' => 1_000,
                    'm' => 60_000,
                    'h' => 3_600_000,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                };
                total_millis = add_millis(total_millis, num, unit_millis)?;
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A bare number is seconds
        if !current_number.is_empty() {
            let num = current_number
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total_millis = add_millis(total_millis, num, 1_000)?;
            has_unit = true;
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }

        Ok(HumanDuration(Duration::from_millis(total_millis)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Turn raw news articles into validated, publishable records", long_about = None)]
pub struct Cli {
    #[arg(long, default_value = "memory", help = "Storage backend: memory (default), sqlite")]
    storage: String,
    #[arg(long, help = "Backend location, e.g. the SQLite database path")]
    backend_url: Option<String>,
    #[arg(long, default_value = "dummy", help = "Generation model: dummy (default), deepseek, openai, ollama")]
    model: String,
    #[arg(long, help = "Model endpoint, e.g. http://localhost:11434/gemma3:12b for ollama")]
    model_url: Option<String>,
    #[arg(long, env = "NG_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, help = "Provider model name override")]
    model_name: Option<String>,
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,
    #[arg(long, default_value = "60s", help = "Per-call timeout (e.g. 30s, 1m30s, 500ms)")]
    timeout: HumanDuration,
    #[arg(long, default_value_t = 0.2)]
    temperature: f32,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Generate and store records for article files ("-" or nothing reads stdin)
    Process {
        files: Vec<PathBuf>,
        #[arg(long)]
        photo_credit: Option<String>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
    },
    /// Print the prompt that would be sent for one field
    Prompt {
        #[arg(long, value_parser = parse_field)]
        field: FieldKind,
        file: Option<PathBuf>,
    },
    /// List stored records, newest first
    List {
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print the category vocabulary
    Categories,
}

fn parse_field(s: &str) -> std::result::Result<FieldKind, String> {
    FieldKind::ALL
        .iter()
        .copied()
        .find(|k| k.as_str() == s.to_lowercase())
        .ok_or_else(|| format!("Unknown field: {} (expected title, headline, summary or category)", s))
}

fn parse_category(s: &str) -> std::result::Result<Category, String> {
    s.parse::<Category>().map_err(|e| e.to_string())
}

fn read_body(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read article from {}", path.display())),
        _ => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("Failed to read article from stdin")?;
            Ok(body)
        }
    }
}

impl Cli {
    fn inference_config(&self) -> Config {
        let mut pipeline = PipelineConfig {
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                call_timeout: self.timeout.0,
                ..RetryPolicy::default()
            },
            ..PipelineConfig::default()
        };
        pipeline.generation.model = self.model_name.clone();
        pipeline.generation.temperature = self.temperature;

        Config {
            model: self.model.clone(),
            model_url: self.model_url.clone(),
            api_key: self.api_key.clone(),
            pipeline,
        }
    }
}

async fn process(
    cli: &Cli,
    storage: Arc<dyn RecordStorage>,
    files: &[PathBuf],
    photo_credit: Option<String>,
    image: Option<String>,
    concurrency: usize,
) -> Result<()> {
    let config = cli.inference_config();
    let pipeline = config.build_pipeline()?;
    info!("🧠 Generation client ready (using {})", cli.model);

    let mut articles = Vec::new();
    if files.is_empty() {
        articles.push(RawArticle::new(read_body(None)?));
    }
    for file in files {
        articles.push(RawArticle::new(read_body(Some(file))?));
    }
    for article in &mut articles {
        article.photo_credit = photo_credit.clone();
        article.image = image.clone();
    }

    let results = pipeline.process_batch(&articles, concurrency).await;
    let mut failed = 0;
    for result in results {
        match result {
            Ok(record) => {
                let id = storage.save(&record).await?;
                info!("💾 Stored record {} ({})", id, record.slug());
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
            Err(e) => {
                error!("No record produced: {}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} article(s) failed", failed, articles.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Process {
            files,
            photo_credit,
            image,
            concurrency,
        } => {
            let storage = ng_storage::create_storage(&cli.storage, cli.backend_url.as_deref()).await?;
            info!("✨ Storage initialized (using {})", cli.storage);
            process(&cli, storage, files, photo_credit.clone(), image.clone(), *concurrency).await?;
        }
        Commands::Prompt { field, file } => {
            let body = read_body(file.as_ref())?;
            println!("{}", prompts::build_prompt(*field, &body)?);
        }
        Commands::List { category, limit } => {
            let storage = ng_storage::create_storage(&cli.storage, cli.backend_url.as_deref()).await?;
            let mut records = match category {
                Some(category) => storage.get_by_category(*category).await?,
                None => storage.list_recent(*limit).await?,
            };
            records.truncate(*limit);
            for record in records {
                println!("{}  {:<13}  {}", record.id, record.category, record.title);
            }
        }
        Commands::Categories => {
            for category in Category::ALL {
                println!("{}", category);
            }
        }
    }

    Ok(())
}
