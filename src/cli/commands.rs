//! Command dispatch: maps parsed arguments onto services and prints results

use std::io;
use std::path::Path;

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::services::{request_body_pretty, ExportService};
use crate::cli::args::{Cli, Commands, ConfigCommands, ProtocolArg};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{
    expand_env_vars, parse_parameters, ExportOptions, ExportProtocol, RequestEncoding, RpcRequest,
    Session,
};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraError;

/// Execute the parsed command line against real services.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => execute_config(command),
        _ => {
            let settings = Settings::load()?;
            let container = ServiceContainer::new(settings);
            run(&container, cli)
        }
    }
}

/// Execute a controller command with the given service container.
pub fn run(container: &ServiceContainer, cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Commands::Login => login(container, cli.json_only),
        Commands::Rpc {
            action,
            params,
            form,
        } => rpc(container, action, params, *form, cli.json_only),
        Commands::Export {
            resource,
            output_dir,
            write_files,
            include_aux,
            manage_attachments_internally,
            protocol,
        } => export(
            container,
            resource,
            output_dir,
            ExportOptions {
                manage_attachments_internally: *manage_attachments_internally,
                include_auxiliary_file: *include_aux,
            },
            *write_files,
            *protocol,
            cli.json_only,
        ),
        Commands::Config { .. } | Commands::Completion { .. } => Err(CliError::Usage(
            "command does not talk to the controller".to_string(),
        )),
    }
}

fn authenticate(container: &ServiceContainer) -> CliResult<Session> {
    let credentials = container.settings.credentials()?;
    Ok(container.session_service().login(&credentials)?)
}

#[instrument(skip(container))]
fn login(container: &ServiceContainer, json_only: bool) -> CliResult<()> {
    let session = authenticate(container)?;
    if json_only {
        output::info(&serde_json::json!({ "CID": session.token() }));
    } else {
        output::info("Login successful");
        output::value("CID", &format!("{:?}", session.token()));
    }
    Ok(())
}

#[instrument(skip(container, params))]
fn rpc(
    container: &ServiceContainer,
    action: &str,
    params: &[String],
    form: bool,
    json_only: bool,
) -> CliResult<()> {
    // Reject malformed parameters before logging in.
    let parameters = parse_parameters(params)?;
    let session = authenticate(container)?;
    let request = RpcRequest::new(&session, action, parameters)?;
    let encoding = if form {
        RequestEncoding::Form
    } else {
        RequestEncoding::Json
    };

    if !json_only {
        output::info(&format!("controller IP: {}", session.controller_address()));
        output::info("request body:");
        output::highlight(&request_body_pretty(&request)?);
    }

    let response = container
        .rpc_service()
        .dispatch(&session, &request, encoding)?;

    if json_only {
        output::info(&response.body_text());
    } else {
        output::info(&format!("latency: {}ms", response.latency.as_millis()));
        output::info("response body:");
        output::highlight(&response.pretty_body()?);
    }

    response.ensure_success()?;
    Ok(())
}

#[instrument(skip(container, options))]
fn export(
    container: &ServiceContainer,
    resource: &str,
    output_dir: &str,
    options: ExportOptions,
    write_files: bool,
    protocol: Option<ProtocolArg>,
    json_only: bool,
) -> CliResult<()> {
    let protocol = protocol
        .map(ExportProtocol::from)
        .unwrap_or(container.settings.export_protocol);
    debug!("export: protocol={}", protocol);

    let session = authenticate(container)?;
    let service = container.export_service();
    let artifact = service.export_config(&session, resource, &options, protocol)?;

    if !write_files {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        return Ok(ExportService::write_to_stream(&artifact, &mut handle)?);
    }

    let dir = expand_env_vars(output_dir);
    let written = service.write_to_dir(&artifact, &dir)?;
    if json_only {
        let paths: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
        output::info(&serde_json::json!({ "written": paths }));
    } else {
        for path in &written {
            output::success(&path.display());
        }
    }
    Ok(())
}

fn execute_config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load()?;
            output::header("# Effective configuration");
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("Global", &path.display()),
                None => output::action("Global", "no config directory available"),
            }
            Ok(())
        }
        ConfigCommands::Init => {
            let path = global_config_path().ok_or_else(|| {
                CliError::Usage("cannot determine config directory".to_string())
            })?;
            init_config(&RealFileSystem, &path)?;
            output::success(&format!("Created {}", path.display()));
            Ok(())
        }
    }
}

/// Write the config template to `path`, refusing to overwrite.
pub fn init_config(fs: &dyn FileSystem, path: &Path) -> CliResult<()> {
    if fs.exists(path) {
        return Err(CliError::Usage(format!(
            "config file already exists: {}",
            path.display()
        )));
    }
    fs.ensure_parent(path)
        .map_err(|e| InfraError::io(format!("create {}", path.display()), e))?;
    fs.write(path, Settings::template().as_bytes())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    Ok(())
}
