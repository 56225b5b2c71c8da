use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use pedit_core::Snapshot;
use pedit_panel::{
    build_settings_tree, restore_selection, DirectSetTransport, EditorConfig, EditorEvent,
    EditorSession, EditorView, JsonFileStore, MemoryStore, ParameterSetter, ParameterTransport,
    SelectionMachine, ServiceCallTransport, ServiceCaller, StateStore, TransportError,
};
use serde_json::{json, Value as JsonValue};
use tracing_subscriber::EnvFilter;

/// Prints outbound requests instead of sending them
struct DryRun;

impl DryRun {
    fn print(message: &JsonValue) -> Result<(), TransportError> {
        let text = serde_json::to_string_pretty(message)
            .map_err(|e| TransportError::Encoding(e.to_string()))?;
        println!("{text}");
        Ok(())
    }
}

#[async_trait::async_trait]
impl ServiceCaller for DryRun {
    async fn call_service(
        &self,
        service: &str,
        request: JsonValue,
    ) -> Result<JsonValue, TransportError> {
        Self::print(&json!({"service": service, "request": request}))?;
        Ok(JsonValue::Null)
    }
}

#[async_trait::async_trait]
impl ParameterSetter for DryRun {
    async fn set_parameter(&self, name: &str, value: JsonValue) -> Result<(), TransportError> {
        Self::print(&json!({"set": name, "value": value}))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let snapshot_arg = Arg::new("snapshot")
        .long("snapshot")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Parameter snapshot JSON file");
    let config_arg = Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("Editor config TOML file");

    let cli = Command::new("pedit")
        .version(pedit_panel::VERSION)
        .about("Inspect and edit remote node parameters")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("tree")
                .about("Print the settings tree for a snapshot")
                .arg(snapshot_arg.clone())
                .arg(config_arg.clone())
                .arg(
                    Arg::new("state")
                        .long("state")
                        .value_parser(value_parser!(PathBuf))
                        .help("Persisted editor state JSON file"),
                ),
        )
        .subcommand(
            Command::new("edit")
                .about("Encode an edit and print the request that would be sent")
                .arg(snapshot_arg)
                .arg(config_arg)
                .arg(Arg::new("node").long("node").required(true).help("Node name"))
                .arg(
                    Arg::new("param")
                        .long("param")
                        .required(true)
                        .help("Parameter name"),
                )
                .arg(
                    Arg::new("value")
                        .long("value")
                        .required(true)
                        .allow_hyphen_values(true)
                        .help("New value as typed text"),
                )
                .arg(
                    Arg::new("direct")
                        .long("direct")
                        .action(ArgAction::SetTrue)
                        .help("Set by fully-qualified name instead of a service call"),
                ),
        );

    match cli.get_matches().subcommand() {
        Some(("tree", args)) => run_tree(args),
        Some(("edit", args)) => run_edit(args).await,
        _ => Ok(()),
    }
}

fn load_config(args: &ArgMatches) -> anyhow::Result<EditorConfig> {
    match args.get_one::<PathBuf>("config") {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(EditorConfig::default()),
    }
}

fn load_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    Snapshot::from_json(&text).with_context(|| format!("parsing snapshot {}", path.display()))
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a String> {
    args.get_one::<String>(name)
        .ok_or_else(|| anyhow!("missing --{name}"))
}

fn run_tree(args: &ArgMatches) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let snapshot_path = args
        .get_one::<PathBuf>("snapshot")
        .ok_or_else(|| anyhow!("missing --snapshot"))?;
    let snapshot = load_snapshot(snapshot_path)?;

    let state_path = args
        .get_one::<PathBuf>("state")
        .cloned()
        .or_else(|| config.state_path.clone());
    let store: Box<dyn StateStore> = match state_path {
        Some(path) => Box::new(JsonFileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    };
    let restored = restore_selection(store.as_ref(), config.default_bounds);

    let mut machine = SelectionMachine::restored(restored, config.default_bounds);
    machine.refresh_data(&snapshot);

    let tree = build_settings_tree(machine.state(), machine.registry());
    println!("{}", serde_json::to_string_pretty(&tree)?);
    match EditorView::of(&machine) {
        EditorView::Editor(widget) => eprintln!("Editing {} = {}", widget.address, widget.text),
        other => eprintln!("{other:?}"),
    }
    Ok(())
}

async fn run_edit(args: &ArgMatches) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let snapshot_path = args
        .get_one::<PathBuf>("snapshot")
        .ok_or_else(|| anyhow!("missing --snapshot"))?;
    let snapshot = load_snapshot(snapshot_path)?;
    let node = required(args, "node")?;
    let param = required(args, "param")?;
    let value = required(args, "value")?;

    let transport: Arc<dyn ParameterTransport> = if args.get_flag("direct") {
        Arc::new(DirectSetTransport::new(DryRun))
    } else {
        Arc::new(ServiceCallTransport::new(DryRun))
    };
    let mut session = EditorSession::new(&config, transport, Arc::new(MemoryStore::new()));

    session.handle(EditorEvent::Snapshot(snapshot)).await?;
    session.handle(EditorEvent::SelectNode(node.clone())).await?;
    session
        .handle(EditorEvent::SelectParameter(param.clone()))
        .await?;
    session.handle(EditorEvent::Edit(value.clone())).await?;

    tokio::time::sleep(config.quiet_interval() * 2).await;
    session.handle(EditorEvent::Shutdown).await?;
    Ok(())
}
