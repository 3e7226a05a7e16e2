//! mdk: the modeldesk console from the command line.

use std::future::Future;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use modeldesk::model_form::FeatureDraft;
use modeldesk::server::{serve, ServerConfig};
use modeldesk::sort::sort_rows;
use modeldesk::{
    ApiClient, ApiConfig, Dependency, Engine, FeatureType, InputPanel, Language, ModelForm,
    ModelSortKey, ModelType, RunLauncher, RunRow, RunSortKey, SelectedFile, Serialization, Session,
    SortConfig, SortDirection,
};
use modeldesk_cli::{args, render, FileTokenStore, ReqwestTransport};

#[derive(Parser)]
#[command(
    name = "mdk",
    about = "modeldesk: register models, launch runs and follow them",
    version
)]
struct Cli {
    /// YAML file with backend endpoints and poll intervals
    #[arg(long, short, global = true, env = "MODELDESK_CONFIG")]
    config: Option<PathBuf>,
    /// Where the session token is kept
    #[arg(long, global = true, env = "MODELDESK_TOKEN_FILE")]
    token_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session token
    Signin {
        #[arg(long, short)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "MODELDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session token
    Logout,
    /// Registered models
    #[command(subcommand)]
    Models(ModelsCommand),
    /// Model runs
    #[command(subcommand)]
    Runs(RunsCommand),
    /// Serve the browser console
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, short, default_value_t = 8000)]
        port: u16,
    },
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// List models (newest first unless sorted otherwise)
    List {
        /// name, type, engine or created_at
        #[arg(long, value_parser = args::model_sort_key)]
        sort: Option<ModelSortKey>,
        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,
    },
    /// Show one model with its feature schema
    Show { id: String },
    /// Register a model from an artifact file (.pkl, .sav, .rds or .zip)
    Create {
        file: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long = "type", default_value = "predictive", value_parser = args::model_type)]
        model_type: ModelType,
        #[arg(long, default_value = "docker", value_parser = args::engine)]
        engine: Engine,
        #[arg(long, default_value = "Python3", value_parser = args::language)]
        language: Language,
        /// Defaults to the language's runtime tag
        #[arg(long)]
        docker_tag: Option<String>,
        #[arg(long, default_value = "256M")]
        mem_limit: String,
        #[arg(long, default_value_t = 50)]
        cpu: u32,
        #[arg(long, default_value = "joblib", value_parser = args::serialization)]
        serialization: Serialization,
        /// Input feature as name:type, repeatable
        #[arg(long = "feature", value_parser = args::feature)]
        features: Vec<FeatureDraft>,
        /// Dependency as library==version, repeatable
        #[arg(long = "dependency", value_parser = args::dependency)]
        dependencies: Vec<Dependency>,
    },
}

#[derive(Subcommand)]
enum RunsCommand {
    /// List runs, optionally for one model
    List {
        #[arg(long, short)]
        model: Option<String>,
        /// model_name, model_type, model_engine, updated_at, duration or state
        #[arg(long, value_parser = args::run_sort_key)]
        sort: Option<RunSortKey>,
        #[arg(long)]
        asc: bool,
        /// Refresh until interrupted
        #[arg(long, short)]
        watch: bool,
    },
    /// Show one run
    Show {
        id: String,
        /// Refresh until the run ends or is interrupted
        #[arg(long, short)]
        watch: bool,
    },
    /// Launch a run
    Submit {
        model_id: String,
        /// Feature value as name=value, repeatable (predictive models)
        #[arg(long = "input", value_parser = args::input)]
        inputs: Vec<(String, String)>,
        /// Input archive (optimization models)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

type Api = ApiClient<ReqwestTransport>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let token_file = cli.token_file.unwrap_or_else(FileTokenStore::default_path);

    let session = Session::new(FileTokenStore::new(token_file));
    let api = ApiClient::new(config, session, ReqwestTransport::new());

    match cli.command {
        Commands::Signin { email, password } => cmd_signin(&api, &email, password).await?,
        Commands::Logout => {
            api.sign_out()?;
            println!("✓ Signed out");
        }
        Commands::Models(ModelsCommand::List { sort, asc }) => {
            cmd_models_list(&api, sort_config(sort, asc)).await?
        }
        Commands::Models(ModelsCommand::Show { id }) => {
            let model = with_spinner("Fetching model", api.get_model(&id)).await?;
            print!("{}", render::model_detail(&model));
        }
        Commands::Models(ModelsCommand::Create {
            file,
            name,
            model_type,
            engine,
            language,
            docker_tag,
            mem_limit,
            cpu,
            serialization,
            features,
            dependencies,
        }) => {
            let mut form = ModelForm {
                name,
                engine,
                serialization,
                features,
                dependencies,
                mem_limit,
                cpu_percentage: cpu.to_string(),
                ..ModelForm::default()
            };
            form.set_language(language);
            form.set_type(model_type);
            if form.language != language {
                bail!("{language} runtimes cannot serve {model_type} models");
            }
            if let Some(tag) = docker_tag {
                form.docker_tag = tag;
            }
            if !form.select_file(read_file(&file)?) {
                bail!("{}", form.error().unwrap_or("unsupported file"));
            }
            let model = with_spinner("Registering model", api.create_model(&form)).await?;
            println!("✓ Registered {} ({})", model.name, model.id);
        }
        Commands::Runs(RunsCommand::List {
            model,
            sort,
            asc,
            watch,
        }) => cmd_runs_list(&api, model.as_deref(), sort_config(sort, asc), watch).await?,
        Commands::Runs(RunsCommand::Show { id, watch }) => cmd_runs_show(&api, &id, watch).await?,
        Commands::Runs(RunsCommand::Submit {
            model_id,
            inputs,
            file,
        }) => cmd_runs_submit(&api, &model_id, inputs, file).await?,
        Commands::Serve { host, port } => cmd_serve(api.config().clone(), host, port).await?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ApiConfig> {
    match path {
        Some(path) => ApiConfig::load(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(ApiConfig::default()),
    }
}

/// An explicit `--sort` starts descending unless `--asc` is given; without
/// one the table's default order applies.
fn sort_config<K>(key: Option<K>, asc: bool) -> SortConfig<K>
where
    K: Copy + PartialEq,
    SortConfig<K>: Default,
{
    let mut config = SortConfig::default();
    if let Some(key) = key {
        config.key = key;
    }
    if asc {
        config.direction = SortDirection::Asc;
    } else if key.is_some() {
        config.direction = SortDirection::Desc;
    }
    config
}

fn read_file(path: &Path) -> Result<SelectedFile> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(SelectedFile::new(name, bytes))
}

async fn with_spinner<T, F>(message: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = modeldesk::Result<T>>,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = fut.await;
    spinner.finish_and_clear();
    Ok(result?)
}

/// Tick immediately, then every `interval`, until Ctrl-C.
async fn watch_loop<F, Fut>(interval: Duration, mut tick: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let mut ticks = IntervalStream::new(tokio::time::interval(interval));
    loop {
        tokio::select! {
            Some(_) = ticks.next() => {
                if !tick().await? {
                    return Ok(());
                }
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

fn clear_screen() {
    print!("\x1B[2J\x1B[H");
    let _ = std::io::stdout().flush();
}

// ─── Command implementations ──────────────────────────────────────────────────

async fn cmd_serve(api: ApiConfig, host: String, port: u16) -> Result<()> {
    println!("modeldesk console");
    println!("   URL:          http://{}:{}", host, port);
    println!("   Models:       {}", api.models_url());
    println!("   Model runs:   {}", api.model_runs_url());
    println!();

    serve(ServerConfig { host, port, api }).await
}

async fn cmd_signin(api: &Api, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => {
            eprint!("Password: ");
            let _ = std::io::stderr().flush();
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    api.sign_in(email, &password)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    println!("✓ Signed in as {email}");
    Ok(())
}

async fn cmd_models_list(api: &Api, sort: SortConfig<ModelSortKey>) -> Result<()> {
    let mut models = with_spinner("Fetching models", api.list_models()).await?;
    if models.is_empty() {
        println!("No models registered.");
        return Ok(());
    }
    sort_rows(&mut models, &sort);
    println!("{}", render::models_table(&models, &sort));
    Ok(())
}

async fn cmd_runs_list(
    api: &Api,
    model_id: Option<&str>,
    sort: SortConfig<RunSortKey>,
    watch: bool,
) -> Result<()> {
    let print_runs = |mut runs: Vec<modeldesk::ModelRun>| {
        sort_rows(&mut runs, &sort);
        let rows: Vec<RunRow> = runs.iter().map(RunRow::from).collect();
        if rows.is_empty() {
            println!("No runs yet.");
        } else {
            println!("{}", render::runs_table(&rows, &sort));
        }
    };

    if !watch {
        let runs = with_spinner("Fetching runs", api.list_runs(model_id)).await?;
        print_runs(runs);
        return Ok(());
    }

    let print_runs = &print_runs;
    let interval = Duration::from_millis(api.config().runs_poll_interval_ms);
    watch_loop(interval, move || async move {
        match api.list_runs(model_id).await {
            Ok(runs) => {
                clear_screen();
                print_runs(runs);
            }
            Err(e) => warn!(error = %e, "refresh failed"),
        }
        Ok(true)
    })
    .await
}

async fn cmd_runs_show(api: &Api, id: &str, watch: bool) -> Result<()> {
    if !watch {
        let detail = with_spinner("Fetching run", api.run_detail(id)).await?;
        print!("{}", render::run_detail(&detail));
        return Ok(());
    }

    let interval = Duration::from_millis(api.config().detail_poll_interval_ms);
    watch_loop(interval, move || async move {
        match api.run_detail(id).await {
            Ok(detail) => {
                clear_screen();
                print!("{}", render::run_detail(&detail));
                Ok(!detail.run.state.is_terminal())
            }
            Err(e) => {
                warn!(error = %e, "refresh failed");
                Ok(true)
            }
        }
    })
    .await
}

async fn cmd_runs_submit(
    api: &Api,
    model_id: &str,
    inputs: Vec<(String, String)>,
    file: Option<PathBuf>,
) -> Result<()> {
    let model = with_spinner("Fetching model", api.get_model(model_id)).await?;

    let mut launcher = RunLauncher::default();
    launcher.open();
    launcher.models_loaded(vec![model.clone()]);
    launcher.select_model(&model.id);
    launcher.schema_loaded(&model);

    match launcher.panel() {
        InputPanel::Features(controls) => {
            for (name, value) in inputs {
                if !controls.iter().any(|c| c.name == name) {
                    bail!("model {} has no input feature named \"{name}\"", model.name);
                }
                launcher.set_input(&name, value);
            }
            // Unset checkboxes submit as false, like an untouched form.
            for feature in model.features.iter().filter(|f| f.kind == FeatureType::Boolean) {
                if launcher.input(&feature.name).is_none() {
                    launcher.set_flag(&feature.name, false);
                }
            }
        }
        InputPanel::FileUpload => {
            let path = file.context("optimization models need --file <archive.zip>")?;
            if !launcher.select_file(read_file(&path)?) {
                bail!("{}", launcher.file().error().unwrap_or("unsupported file"));
            }
        }
        InputPanel::Empty => bail!("model {} has no input schema", model.id),
    }

    let submission = launcher
        .submission()
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    let run = with_spinner("Submitting run", api.submit_run(submission)).await?;
    println!("✓ Run {} is {}", run.id, run.state);
    Ok(())
}
