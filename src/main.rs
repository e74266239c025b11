use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use server_cli::commands::{self, Selection};
use server_cli::logging;
use server_cli::prompt::Prompter;
use server_cli::storage::{self, Config, Paths, TextRegistryStorage, TomlConfigStorage};
use server_cli::transport::{self, CopyOptions};
use server_cli::ServerError;

#[derive(Parser)]
#[command(name = "server")]
#[command(about = "Handles remote server operations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ListFile {
    /// Path to a server list file
    #[arg(short = 'P', long)]
    path: Option<PathBuf>,
}

#[derive(Args)]
struct Target {
    /// Server number or server name (user@host)
    server: String,

    /// Port number
    #[arg(short, long)]
    port: Option<String>,

    /// Additional arguments for the connection ("- v" is read as "-v")
    #[arg(short, long, num_args = 0..)]
    options: Vec<String>,

    #[command(flatten)]
    file: ListFile,
}

impl Target {
    fn selection(&self) -> Selection {
        Selection {
            server: self.server.clone(),
            port: self.port.clone(),
            options: self.options.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List available servers
    List {
        /// Print port and options too
        #[arg(short, long)]
        verbose: bool,

        #[command(flatten)]
        file: ListFile,
    },

    /// Add a server to the list of available servers
    Add {
        #[command(flatten)]
        file: ListFile,
    },

    /// Remove servers from the list of available servers
    Remove {
        #[command(flatten)]
        file: ListFile,
    },

    /// Modify a server from the list of available servers
    Modify {
        #[command(flatten)]
        file: ListFile,
    },

    /// Connect to a remote server
    Connect {
        #[command(flatten)]
        target: Target,
    },

    /// Upload file(s) to a remote server
    Upload {
        #[command(flatten)]
        target: Target,

        /// Path to file(s) to upload
        #[arg(required = true, num_args = 1..)]
        source: Vec<PathBuf>,

        /// Destination on the server
        #[arg(short, long = "target", default_value = ".")]
        to: String,

        /// Upload directories recursively
        #[arg(short, long)]
        recursive: bool,

        /// Hide the progress meter
        #[arg(short, long)]
        quiet: bool,
    },

    /// Download file(s) from a remote server
    Download {
        #[command(flatten)]
        target: Target,

        /// Path to file(s) on the server
        #[arg(required = true, num_args = 1..)]
        source: Vec<String>,

        /// Destination on the local machine
        #[arg(short, long = "target", default_value = ".")]
        to: PathBuf,

        /// Download directories recursively
        #[arg(short, long)]
        recursive: bool,

        /// Hide the progress meter
        #[arg(short, long)]
        quiet: bool,
    },

    /// Execute a command on a remote server
    Command {
        #[command(flatten)]
        target: Target,

        /// Command to execute
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,

        /// Additional arguments for the command
        #[arg(short = 'O', num_args = 0..)]
        args: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => report(err),
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let paths = storage::default_paths()?;
    let config_storage = TomlConfigStorage::new(paths.config_file.clone());
    let config = storage::load_config(&config_storage, |config| init_logging(config, &paths))?;

    let skip_malformed = config.general.skip_malformed;
    let servers = |file: ListFile| {
        TextRegistryStorage::new(storage::servers_path(file.path, &config, &paths))
    };

    match cli.command {
        Commands::List { verbose, file } => {
            let mut stdout = io::stdout().lock();
            commands::list_servers(&servers(file), verbose, skip_malformed, &mut stdout)?;
        }
        Commands::Add { file } => {
            let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
            commands::add_server(&servers(file), &mut prompter, skip_malformed)?;
        }
        Commands::Remove { file } => {
            let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
            commands::remove_server(&servers(file), &mut prompter, skip_malformed)?;
        }
        Commands::Modify { file } => {
            let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
            commands::modify_server(&servers(file), &mut prompter, skip_malformed)?;
        }
        Commands::Connect { target } => {
            let transport = transport::create_transport(&config.transport);
            let selection = target.selection();
            let status = commands::connect_server(&servers(target.file), transport.as_ref(), &selection)?;
            return Ok(exit_status(status));
        }
        Commands::Upload {
            target,
            source,
            to,
            recursive,
            quiet,
        } => {
            let transport = transport::create_transport(&config.transport);
            let selection = target.selection();
            commands::upload_server(
                &servers(target.file),
                transport.as_ref(),
                &selection,
                &source,
                &to,
                CopyOptions { recursive, quiet },
            )?;
        }
        Commands::Download {
            target,
            source,
            to,
            recursive,
            quiet,
        } => {
            let transport = transport::create_transport(&config.transport);
            let selection = target.selection();
            commands::download_server(
                &servers(target.file),
                transport.as_ref(),
                &selection,
                &source,
                &to,
                CopyOptions { recursive, quiet },
            )?;
        }
        Commands::Command {
            target,
            command,
            args,
        } => {
            let transport = transport::create_transport(&config.transport);
            let selection = target.selection();
            let status = commands::command_server(
                &servers(target.file),
                transport.as_ref(),
                &selection,
                &command,
                &args,
            )?;
            return Ok(exit_status(status));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_logging(config: &Config, paths: &Paths) {
    if !config.logging.file {
        logging::init_stderr_logger();
        return;
    }

    if let Err(err) = logging::init_logger(&paths.log_file, &config.logging.level) {
        eprintln!("Failed to start file logging: {:#}", err);
    }
}

/// Translate a failure into a message on stderr and an exit status
fn report(err: anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ServerError>() {
        Some(server_err) if server_err.is_cancelled() => {
            eprintln!("Cancelled.");
            ExitCode::SUCCESS
        }
        Some(server_err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(server_err.exit_code())
        }
        None => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Pass a remote exit status through as our own
fn exit_status(status: i32) -> ExitCode {
    ExitCode::from((status & 0xff) as u8)
}
