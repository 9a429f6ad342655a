/// Version injected at compile time via PVECTL_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("PVECTL_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use futures::future::try_join_all;
use pvectl::api::http::format_api_error;
use pvectl::types::storage::StorageKind;
use pvectl::types::vm::Kind;
use pvectl::{Api, Config, PveClient, VirtualMachine};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Command line client for Proxmox VE
#[derive(Parser, Debug)]
#[command(name = "pvectl", version = VERSION, about, long_about = None)]
struct Args {
    /// API endpoint, e.g. https://pve1.lan:8006
    #[arg(long, global = true)]
    host: Option<String>,

    /// Accept self-signed certificates
    #[arg(long, global = true)]
    insecure: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Guests (QEMU and LXC)
    #[command(subcommand)]
    Vm(VmCommand),
    /// Resource pools
    #[command(subcommand)]
    Pool(PoolCommand),
    /// Storage definitions
    #[command(subcommand)]
    Storage(StorageCommand),
}

#[derive(Subcommand, Debug)]
enum VmCommand {
    /// List guests ordered by vmid
    List {
        /// Only guests of this kind (qemu, lxc)
        #[arg(long)]
        kind: Option<Kind>,
        /// Load each guest's configuration
        #[arg(long)]
        full: bool,
    },
    /// Show a guest's configuration
    Show { vmid: u32 },
    /// Show a guest's runtime status
    Status { vmid: u32 },
    /// Print the next free vmid
    NextId,
}

#[derive(Subcommand, Debug)]
enum PoolCommand {
    List,
    Show { name: String },
    /// Replace a pool's comment
    SetComment { name: String, comment: String },
}

#[derive(Subcommand, Debug)]
enum StorageCommand {
    List {
        /// Only storages of this type (dir, lvm, lvmthin, nfs)
        #[arg(long)]
        kind: Option<StorageKind>,
    },
    Show { id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("pvectl started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("pvectl").join("pvectl.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".pvectl").join("pvectl.log");
    }
    PathBuf::from("pvectl.log")
}

fn emit(format: OutputFormat, value: &impl Serialize) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

/// Identity plus, once hydrated, configuration and extras
async fn describe_vm(vm: &mut VirtualMachine) -> Result<Value> {
    let identity = serde_json::to_value(vm.identity())?;
    if !vm.is_full() {
        return Ok(json!({ "identity": identity }));
    }

    let config = match vm {
        VirtualMachine::Qemu(guest) => serde_json::to_value(guest.config().await?)?,
        VirtualMachine::Lxc(guest) => serde_json::to_value(guest.config().await?)?,
    };
    let extras = serde_json::to_value(vm.extras().await?)?;

    Ok(json!({ "identity": identity, "config": config, "extras": extras }))
}

async fn run_vm(api: &Api, command: VmCommand, format: OutputFormat) -> Result<()> {
    let svc = api.vms();

    match command {
        VmCommand::List { kind, full } => {
            let mut vms = match kind {
                Some(kind) => svc.list_by_kind(kind).await?,
                None => svc.list().await?,
            };
            if full {
                try_join_all(vms.iter_mut().map(|vm| vm.load())).await?;
            }

            let mut rows = Vec::with_capacity(vms.len());
            for vm in vms.iter_mut() {
                rows.push(describe_vm(vm).await?);
            }
            emit(format, &rows)
        }
        VmCommand::Show { vmid } => {
            let mut vm = svc.get(vmid).await?;
            emit(format, &describe_vm(&mut vm).await?)
        }
        VmCommand::Status { vmid } => {
            let vm = svc.find(vmid).await?;
            let status = vm.status().await?;
            emit(format, &json!({ "vmid": vmid, "status": status }))
        }
        VmCommand::NextId => emit(format, &json!({ "vmid": svc.next_vmid().await? })),
    }
}

async fn run_pool(api: &Api, command: PoolCommand, format: OutputFormat) -> Result<()> {
    let svc = api.pools();

    match command {
        PoolCommand::List => {
            let names: Vec<String> = svc
                .list()
                .await?
                .iter()
                .map(|pool| pool.name().to_string())
                .collect();
            emit(format, &names)
        }
        PoolCommand::Show { name } => {
            let mut pool = svc.get(&name).await?;
            let description = pool.description().await?.to_string();
            let members = serde_json::to_value(pool.members().await?)?;
            let extras = serde_json::to_value(pool.extras().await?)?;
            emit(
                format,
                &json!({
                    "name": name,
                    "description": description,
                    "members": members,
                    "extras": extras,
                }),
            )
        }
        PoolCommand::SetComment { name, comment } => {
            let mut pool = svc.stub(name);
            pool.set_description(comment).await?;
            tracing::info!("Updated comment of pool {}", pool.name());
            Ok(())
        }
    }
}

async fn run_storage(api: &Api, command: StorageCommand, format: OutputFormat) -> Result<()> {
    let svc = api.storage();

    match command {
        StorageCommand::List { kind } => {
            let storages = match kind {
                Some(kind) => svc.list_by_kind(kind).await?,
                None => svc.list().await?,
            };
            let rows: Vec<Value> = storages
                .iter()
                .map(|s| json!({ "storage": s.id(), "type": s.kind() }))
                .collect();
            emit(format, &rows)
        }
        StorageCommand::Show { id } => {
            let mut storage = svc.get(&id).await?;
            let config = serde_json::to_value(storage.config().await?)?;
            let extras = serde_json::to_value(storage.extras().await?)?;
            emit(
                format,
                &json!({ "storage": id, "config": config, "extras": extras }),
            )
        }
    }
}

async fn run(args: Args) -> Result<()> {
    // CLI > environment > config file
    let mut config = Config::load();
    if let Some(host) = args.host {
        config.host = Some(host);
    }
    if args.insecure {
        config.insecure = true;
    }

    let client = PveClient::from_config(&config)?;
    tracing::info!("Using PVE host: {}", client.base_url());
    let api = Api::new(Arc::new(client));

    match args.command {
        Command::Vm(command) => run_vm(&api, command, args.output).await,
        Command::Pool(command) => run_pool(&api, command, args.output).await,
        Command::Storage(command) => run_storage(&api, command, args.output).await,
    }
}

/// Transport failures get the short status-code message; everything else
/// is shown as is
fn format_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<pvectl::Error>() {
        Some(pvectl::Error::Transport(inner)) => format_api_error(inner),
        Some(other) => other.to_string(),
        None => format!("{:#}", err),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _log_guard = match setup_logging(args.log_level) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Warning: {:#}", err);
            None
        }
    };

    if let Err(err) = run(args).await {
        tracing::error!("{:?}", err);
        eprintln!("Error: {}", format_error(&err));
        std::process::exit(1);
    }
}
