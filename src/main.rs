use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use quillreply::ai::{
    GenerateReplyData, GenerationClient, ReplyService, RequestToken, build_payload, build_prompt,
    extract_context, spawn_reply_actor,
};
use quillreply::compose::{ComposeSurface, DraftFile, apply_reply};
use quillreply::config::Config;
use quillreply::mail::{EmailType, EmlStore, MailStore, MemoryStore};

fn setup_logging() {
    use std::fs::OpenOptions;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,quillreply=debug"));

    // Try to create a log file in the config directory
    let log_file = Config::config_dir()
        .ok()
        .and_then(|dir| std::fs::create_dir_all(&dir).ok().map(|_| dir))
        .map(|dir| dir.join("quillreply.log"))
        .and_then(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .ok()
        });

    if let Some(file) = log_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        // Fallback to stderr if file logging fails
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_usage() {
    eprintln!(
        r#"quillreply - AI replies for email drafts

Usage: quillreply <command> [args]

Commands:
    generate <new|reply|thread> <draft.json> <instructions...>
                Generate a reply and insert it above the draft body
    preview <new|reply|thread> <draft.json> <instructions...>
                Print the prompt and payload without calling the service
    help        Show this help message

The draft file holds compose details as JSON:
    {{"subject": "...", "plainTextBody": "...", "body": "<html>...", "relatedMessageId": 4}}

Configuration file: ~/.config/quillreply/config.toml
"#
    );
}

struct GenerateArgs {
    email_type: EmailType,
    draft_path: PathBuf,
    instructions: String,
}

fn parse_generate_args(args: &[String]) -> Result<GenerateArgs> {
    let [email_type, draft_path, instructions @ ..] = args else {
        anyhow::bail!("Expected <new|reply|thread> <draft.json> <instructions...>");
    };

    let email_type = email_type
        .parse::<EmailType>()
        .map_err(|e| anyhow::anyhow!(e))?;
    let instructions = instructions.join(" ").trim().to_string();
    if instructions.is_empty() {
        anyhow::bail!("Please enter instructions for the AI reply.");
    }

    Ok(GenerateArgs {
        email_type,
        draft_path: PathBuf::from(draft_path),
        instructions,
    })
}

async fn run_generate(args: GenerateArgs) -> Result<()> {
    let config = Config::load()?;
    let client = GenerationClient::new(&config.service.base_url, config.service.timeout())?;

    match &config.store.path {
        Some(path) => {
            let store = EmlStore::open(path)
                .await
                .with_context(|| format!("Failed to open mail store at {}", path.display()))?;
            generate_with(store, client, args).await
        }
        None => {
            tracing::info!("No mail store configured, generating without context");
            generate_with(MemoryStore::new(), client, args).await
        }
    }
}

async fn generate_with<S: MailStore + 'static>(
    store: S,
    client: GenerationClient,
    args: GenerateArgs,
) -> Result<()> {
    let mut draft_file = DraftFile::new(&args.draft_path);
    let draft = draft_file
        .draft()
        .await
        .with_context(|| format!("Failed to read draft: {}", args.draft_path.display()))?;

    let service = Arc::new(ReplyService::new(Arc::new(store), client));
    let handle = spawn_reply_actor(service);

    eprintln!("Generating AI reply...");
    let request = GenerateReplyData::new(args.instructions, draft, args.email_type)
        .with_token(RequestToken::next());
    let result = handle.generate(request).await;
    handle.shutdown().await;

    let reply = result?;
    apply_reply(&mut draft_file, &reply)
        .await
        .with_context(|| format!("Failed to update draft: {}", args.draft_path.display()))?;

    eprintln!(
        "AI reply generated and inserted into {}",
        args.draft_path.display()
    );
    Ok(())
}

async fn run_preview(args: GenerateArgs) -> Result<()> {
    let config = Config::load()?;
    let draft = DraftFile::new(&args.draft_path)
        .draft()
        .await
        .with_context(|| format!("Failed to read draft: {}", args.draft_path.display()))?;

    let original = match &config.store.path {
        Some(path) => {
            let store = EmlStore::open(path)
                .await
                .with_context(|| format!("Failed to open mail store at {}", path.display()))?;
            extract_context(&store, draft.related_message_id, args.email_type).await
        }
        None => None,
    };

    let prompt = build_prompt(original.as_ref(), &draft, &args.instructions, args.email_type);
    let payload = build_payload(original.as_ref(), &draft, &args.instructions, args.email_type);

    println!("{}\n", prompt);
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("help") | Some("--help") | Some("-h") | None => {
            print_usage();
            Ok(())
        }
        Some(cmd @ ("generate" | "preview")) => {
            setup_logging();
            let parsed = match parse_generate_args(&args[2..]) {
                Ok(parsed) => parsed,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    print_usage();
                    std::process::exit(1);
                }
            };

            let result = if cmd == "generate" {
                run_generate(parsed).await
            } else {
                run_preview(parsed).await
            };
            if let Err(e) = result {
                tracing::error!("{:#}", e);
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
            Ok(())
        }
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            std::process::exit(1);
        }
    }
}
