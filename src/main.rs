//! resume-fit: score a resume against a job description

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use resume_fit::cli::{self, Cli, Commands, ConfigAction, ModelAction};
use resume_fit::config::Config;
use resume_fit::error::{FitError, Result};
use resume_fit::input::InputManager;
use resume_fit::llm::client::{OpenAiClient, TextGenerator};
use resume_fit::output::formatter::{export_rubric_report, resolve_save_path, save_report_to_file, ReportGenerator};
use resume_fit::output::report::FitReport;
use resume_fit::processing::document::DocumentOrigin;
use resume_fit::processing::embedding_manager::EmbeddingModelManager;
use resume_fit::processing::pipeline::FitPipeline;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Credentials may live in a local .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, &config_path).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_path: &Path) -> Result<()> {
    match command {
        Commands::Analyze {
            resume,
            job,
            output,
            save,
            export_report,
            model,
            embedding,
            timeout,
            detailed,
        } => {
            let options = AnalyzeOptions {
                resume,
                job,
                output,
                save,
                export_report,
                model,
                embedding,
                timeout,
                detailed,
            };
            run_analysis(options, config).await
        }
        Commands::Models { action } => run_models(action, &config).await,
        Commands::Config { action } => run_config(action, &config, config_path),
    }
}

struct AnalyzeOptions {
    resume: PathBuf,
    job: PathBuf,
    output: Option<String>,
    save: Option<PathBuf>,
    export_report: Option<PathBuf>,
    model: Option<String>,
    embedding: Option<String>,
    timeout: Option<u64>,
    detailed: bool,
}

async fn run_analysis(options: AnalyzeOptions, mut config: Config) -> Result<()> {
    let allowed = ["pdf", "txt", "text", "md", "markdown"];
    cli::validate_file_extension(&options.resume, &allowed)
        .map_err(|e| FitError::InvalidInput(format!("Resume file: {}", e)))?;
    cli::validate_file_extension(&options.job, &allowed)
        .map_err(|e| FitError::InvalidInput(format!("Job description file: {}", e)))?;

    let output_format = match options.output.as_deref() {
        Some(format) => cli::parse_output_format(format).map_err(FitError::InvalidInput)?,
        None => config.output.format,
    };

    if let Some(model) = options.model {
        config.generation.model = model;
    }
    if let Some(embedding) = options.embedding {
        config.models.embedding_model = embedding;
    }
    if let Some(seconds) = options.timeout {
        config.generation.request_timeout_secs = seconds;
    }
    let detailed = options.detailed || config.output.detailed;

    let input_manager = InputManager::new();
    let resume = input_manager.load_document(&options.resume, DocumentOrigin::Resume).await?;
    let requirement = input_manager.load_document(&options.job, DocumentOrigin::Requirement).await?;
    info!(
        "Loaded resume ({} chars) and job description ({} chars)",
        resume.len(),
        requirement.len()
    );
    debug!("Resume: {}", resume.preview(120));
    debug!("Job description: {}", requirement.preview(120));

    let generator: Arc<dyn TextGenerator> =
        Arc::new(OpenAiClient::new(&config.generation.api_base, config.request_timeout())?);
    let pipeline = FitPipeline::from_config(&config, generator).await?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message("Analyzing resume...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let evaluation = pipeline.run(&resume, &requirement).await;
    spinner.finish_and_clear();
    let evaluation = evaluation?;

    let all_failed = evaluation.all_failed();
    let report = FitReport::new(
        evaluation,
        &resume,
        &requirement,
        pipeline.embedding_model(),
        pipeline.generation_model(),
    );

    let generator = ReportGenerator::new(config.output.color_output, detailed);
    let rendered = generator.generate_report(&report, &output_format)?;
    println!("{}", rendered);

    if let Some(save_path) = options.save {
        let save_path = resolve_save_path(&save_path, &output_format, &options.resume.to_string_lossy());
        // Files never carry terminal color codes
        let plain = ReportGenerator::new(false, detailed).generate_report(&report, &output_format)?;
        save_report_to_file(&plain, &save_path)?;
        info!("Report saved to {}", save_path.display());
    }

    if let Some(target) = options.export_report {
        match export_rubric_report(&report, &target) {
            Ok(path) => info!("Rubric report exported to {}", path.display()),
            Err(e) => warn!("Could not export rubric report: {}", e),
        }
    }

    if all_failed {
        return Err(FitError::AnalysisFailed(
            "Both the similarity and the rubric evaluation failed".to_string(),
        ));
    }

    Ok(())
}

async fn run_models(action: ModelAction, config: &Config) -> Result<()> {
    let mut manager = EmbeddingModelManager::new(config.models_dir().to_path_buf()).await?;

    match action {
        ModelAction::List => {
            println!("🧠 Embedding Models\n");
            for (id, model) in manager.list_available_models() {
                let status = if manager.is_model_downloaded(id) { "✅ Downloaded" } else { "⬇️  Available" };
                let default_marker = if id == config.models.embedding_model { " (default)" } else { "" };

                println!(
                    "  • {}{} - {} ({}, {} dims, {} MB) [{}]",
                    id, default_marker, model.name, model.repo_id, model.dimensions, model.size_mb, status
                );
                println!("    {}", model.description);
            }
            println!("\n💡 Download with: resume-fit models download <id>");
        }

        ModelAction::Download { model, force } => {
            println!("⬇️  Downloading model: {}", model);
            let model_path = manager.download_model(&model, force).await?;
            println!("✅ Model '{}' ready", model);
            println!("📁 Location: {}", model_path.display());
        }
    }

    Ok(())
}

fn run_config(action: Option<ConfigAction>, config: &Config, config_path: &Path) -> Result<()> {
    match action {
        Some(ConfigAction::Show) | None => {
            println!("⚙️  Current Configuration\n");
            println!("Models Directory: {}", config.models_dir().display());
            println!("Embedding Model: {}", config.models.embedding_model);
            println!("\nGeneration:");
            println!("  API Base: {}", config.generation.api_base);
            println!("  Model: {}", config.generation.model);
            println!("  API Key Variable: {}", config.generation.api_key_env);
            println!(
                "  API Key: {}",
                if config.resolve_api_key().is_ok() { "configured" } else { "missing" }
            );
            println!("  Request Timeout: {}s", config.generation.request_timeout_secs);
            println!("  Max Attempts: {}", config.generation.max_attempts);
            println!("\nScoring:");
            println!("  Out-of-range Scores: {:?}", config.scoring.out_of_range);
            println!("\nOutput:");
            println!("  Format: {:?}", config.output.format);
            println!("  Detailed: {}", config.output.detailed);
            println!("  Colors: {}", config.output.color_output);
        }

        Some(ConfigAction::Reset) => {
            Config::default().save_to(config_path)?;
            println!("✅ Configuration reset: {}", config_path.display());
        }

        Some(ConfigAction::Path) => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}
