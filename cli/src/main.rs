//! CLI entrypoint for study-relay
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use relay_application::{
    ChatTurnUseCase, CompletionParams, ConditionResolver, StudyConfigCache, TranscriptStore,
    select_condition,
};
use relay_domain::{EnvDefaults, ResolvedConfig};
use relay_infrastructure::{
    AzureOpenAiTransport, ConfigLoader, EnvLoader, FileConfig, JsonStudyConfigSource,
    JsonlTranscriptStore, MemoryTranscriptStore,
};
use relay_presentation::{
    ChatArgs, ChatRepl, Cli, Command, ConsoleFormatter, SendArgs, SessionArgs, SseRelay,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines reach the file on exit.
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    let file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration file")?
    };
    if cli.no_color || !file_config.output.color {
        colored::control::set_override(false);
    }

    let conditions_path = cli
        .conditions
        .clone()
        .unwrap_or_else(|| file_config.study.conditions.clone());
    let transcript_path = cli.transcript.clone().or(file_config.transcript.path.clone());

    info!("Starting study-relay");

    // === Dependency Injection ===
    let cache = Arc::new(StudyConfigCache::new(Arc::new(JsonStudyConfigSource)));

    match cli.command {
        Command::Conditions => {
            let study = cache.get(&conditions_path).await?;
            print!("{}", ConsoleFormatter::conditions(&study));
        }
        Command::Show { index } => {
            let env = EnvLoader::load()?;
            let resolver = ConditionResolver::new(cache, conditions_path, env);
            let config = resolver.resolve(index).await?;
            println!("{}", ConsoleFormatter::resolved_json(&config)?);
        }
        Command::Chat(args) => {
            let session =
                Session::open(cache, conditions_path, transcript_path.as_deref(), &args.session)
                    .await?;
            run_chat(session, &args, &file_config).await?;
        }
        Command::Send(args) => {
            let session =
                Session::open(cache, conditions_path, transcript_path.as_deref(), &args.session)
                    .await?;
            run_send(session, args).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Initialize logging based on verbosity level
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| anyhow!("--log-file must name a file: {}", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

/// A participant bound to a resolved condition, ready to chat.
struct Session {
    env: EnvDefaults,
    store: Arc<dyn TranscriptStore>,
    config: ResolvedConfig,
    participant_id: String,
}

impl Session {
    async fn open(
        cache: Arc<StudyConfigCache>,
        conditions_path: PathBuf,
        transcript_path: Option<&Path>,
        args: &SessionArgs,
    ) -> Result<Self> {
        let env = EnvLoader::load()?;
        let resolver = ConditionResolver::new(cache, conditions_path, env.clone());

        let index = match args.condition {
            Some(index) => index,
            None => {
                let study = resolver.study().await?;
                let index = select_condition(&study, args.seed)?;
                info!(index, "Randomly assigned condition");
                index
            }
        };
        let config = resolver.resolve(index).await?;

        let store: Arc<dyn TranscriptStore> = match transcript_path {
            Some(path) => Arc::new(JsonlTranscriptStore::open(path)?),
            None => Arc::new(MemoryTranscriptStore::new()),
        };

        let participant_id = args
            .participant
            .clone()
            .unwrap_or_else(|| format!("console-{}", chrono::Utc::now().format("%Y%m%d%H%M%S")));

        Ok(Self {
            env,
            store,
            config,
            participant_id,
        })
    }

    /// Chat turns over a fresh upstream transport, with the session started.
    async fn turns(
        &self,
        task_inactive: bool,
        token: Option<CancellationToken>,
    ) -> Result<ChatTurnUseCase> {
        let transport = Arc::new(AzureOpenAiTransport::from_env(&self.env));
        let mut turns = ChatTurnUseCase::new(Arc::clone(&self.store), transport);
        if let Some(token) = token {
            turns = turns.with_cancellation(token);
        }

        turns.start_session(&self.participant_id, &self.config).await?;
        if task_inactive {
            turns.mark_task_inactive(&self.participant_id).await?;
        }
        Ok(turns)
    }

    fn params(&self) -> CompletionParams {
        CompletionParams::from(&self.config)
    }
}

async fn run_chat(session: Session, args: &ChatArgs, file_config: &FileConfig) -> Result<()> {
    let turns = Arc::new(session.turns(args.session.task_inactive, None).await?);

    print!("{}", ConsoleFormatter::condition_banner(&session.config));
    info!(participant = %session.participant_id, "Console chat started");

    ChatRepl::new(
        turns,
        session.participant_id.clone(),
        session.params(),
        session.config.bot_name.clone(),
    )
    .with_task_active(!args.session.task_inactive)
    .with_stream(args.stream || file_config.chat.stream)
    .with_progress(!args.quiet && file_config.chat.show_progress)
    .run()
    .await;
    Ok(())
}

async fn run_send(session: Session, args: SendArgs) -> Result<()> {
    // Ctrl-C aborts the in-flight request or backoff wait.
    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling request");
            ctrl_c_token.cancel();
        }
    });

    let turns = Arc::new(session.turns(args.session.task_inactive, Some(token)).await?);

    if !args.sse {
        let reply = turns
            .send(
                &session.participant_id,
                &args.message,
                !args.session.task_inactive,
                &session.params(),
            )
            .await?;
        println!("{}", reply.text);
        return Ok(());
    }

    let relay = SseRelay::new(turns);
    let (mut frames, handle) = relay.spawn(
        session.participant_id.clone(),
        args.message,
        !args.session.task_inactive,
        session.params(),
    );
    let mut stdout = std::io::stdout();
    while let Some(frame) = frames.recv().await {
        stdout.write_all(frame.as_bytes())?;
        stdout.flush()?;
    }
    handle.await??;
    Ok(())
}
