use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tower_lsp::{LspService, Server};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use clang_navigator::{
    ClangNavigatorServer, FlagsProvider, ParseRequest, Settings, TranslationUnit, UnitOrigin,
    get_declaration_location_and_spelling,
};

#[derive(Parser, Debug)]
#[command(name = "clang-navigator", version, about)]
struct Args {
    #[arg(long, short, global = true)]
    verbose: bool,

    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the language server over stdio (the default).
    Serve,
    /// Print the declaration referenced at FILE:LINE:COLUMN as JSON.
    Locate {
        file: PathBuf,
        /// 1-based line.
        line: u32,
        /// 1-based byte column.
        column: u32,
        /// Read a saved `-ast-dump=json` instead of running Clang.
        #[arg(long)]
        ast_json: Option<PathBuf>,
        /// Arguments for Clang, replacing the configured flags.
        #[arg(last = true)]
        clang_args: Vec<String>,
    },
}

fn default_log_path() -> PathBuf {
    let dir = dirs_or_tmp();
    dir.join("clang-navigator.log")
}

fn dirs_or_tmp() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        let dir = PathBuf::from(home).join(".clang-navigator");
        if std::fs::create_dir_all(&dir).is_ok() {
            return dir;
        }
    }
    std::env::temp_dir()
}

fn init_tracing(
    verbose: bool,
    log_path: &Path,
) {
    let stderr_filter = if verbose {
        EnvFilter::new("clang_navigator=debug,tower_lsp=debug")
    } else {
        EnvFilter::new("clang_navigator=info,tower_lsp=warn")
    };

    let file_filter = if verbose {
        EnvFilter::new("clang_navigator=debug,tower_lsp=info")
    } else {
        EnvFilter::new("clang_navigator=info,tower_lsp=warn")
    };

    let file_appender = tracing_appender::rolling::never(
        log_path.parent().unwrap_or(Path::new(".")),
        log_path.file_name().unwrap_or(std::ffi::OsStr::new("clang-navigator.log")),
    );

    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false).with_target(false).with_filter(file_filter);

    let stderr_layer =
        fmt::layer().with_writer(std::io::stderr).with_ansi(false).with_target(false).with_filter(stderr_filter);

    tracing_subscriber::registry().with(file_layer).with(stderr_layer).init();
}

async fn serve() {
    info!("Starting clang-navigator v{}", env!("CARGO_PKG_VERSION"));

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(ClangNavigatorServer::new);

    Server::new(stdin, stdout, socket).serve(service).await;

    info!("clang-navigator stopped");
}

async fn load_unit(
    file: &Path,
    ast_json: Option<&Path>,
    clang_args: Vec<String>,
) -> Result<TranslationUnit, Box<dyn std::error::Error>> {
    if let Some(ast_json) = ast_json {
        let json = tokio::fs::read_to_string(ast_json).await?;
        return Ok(TranslationUnit::from_json_with_origin(&json, UnitOrigin::new(file))?);
    }

    let settings = Settings::default().for_source_file(file);
    let mut flags = FlagsProvider::new().flags_for(file, &settings.compiler);
    if !clang_args.is_empty() {
        flags.args = clang_args;
    }
    let request = ParseRequest::new(file, flags, settings.compiler.clang_path);
    Ok(TranslationUnit::parse(&request).await?)
}

async fn locate(
    file: PathBuf,
    line: u32,
    column: u32,
    ast_json: Option<PathBuf>,
    clang_args: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = std::path::absolute(&file)?;
    let unit = load_unit(&file, ast_json.as_deref(), clang_args).await?;
    match get_declaration_location_and_spelling(&unit, &file, line, column) {
        Some(declaration) => println!("{}", serde_json::to_string_pretty(&declaration)?),
        None => println!("null"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = Args::parse();

    let log_path = args.log_file.as_ref().map(PathBuf::from).unwrap_or_else(default_log_path);
    init_tracing(args.verbose, &log_path);
    info!("Log file: {}", log_path.display());

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Locate {
            file,
            line,
            column,
            ast_json,
            clang_args,
        } => {
            if let Err(err) = locate(file, line, column, ast_json, clang_args).await {
                error!("locate failed: {err}");
                eprintln!("clang-navigator: {err}");
                return std::process::ExitCode::FAILURE;
            }
        },
    }
    std::process::ExitCode::SUCCESS
}
