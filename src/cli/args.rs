//! CLI argument definitions using clap

use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};

use crate::domain::ExportProtocol;

/// Aviatrix controller API client
#[derive(Parser, Debug)]
#[command(name = "avx")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print only JSON (raw response bodies, errors as JSON objects)
    #[arg(long, global = true)]
    pub json_only: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Get a CID from the controller
    Login,

    /// Make an API call to the controller
    Rpc {
        /// Action name, e.g. list_vpcs_summary
        action: String,
        /// Parameters as key=value (value may contain '=')
        params: Vec<String>,
        /// Send parameters form-encoded instead of as JSON
        #[arg(long)]
        form: bool,
    },

    /// Export Terraform configuration for a resource type
    Export {
        /// Resource name, e.g. aviatrix_vpc
        resource: String,
        /// Directory for exported files (used with --write-files)
        #[arg(value_hint = ValueHint::DirPath, default_value = ".")]
        output_dir: String,
        /// Write files into output_dir instead of streaming to stdout
        #[arg(short, long)]
        write_files: bool,
        /// Also keep the import helper script shipped with the export
        #[arg(long, visible_alias = "import-script")]
        include_aux: bool,
        /// Let the controller manage attachments inside the exported resource
        #[arg(long)]
        manage_attachments_internally: bool,
        /// Export handshake (default from config)
        #[arg(long, value_enum)]
        protocol: Option<ProtocolArg>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config (password masked)
    Show,

    /// Create config template
    Init,

    /// Show config path
    Path,
}

/// Export handshake selectable on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolArg {
    /// JSON call, then download by file handle
    TwoStepDownload,
    /// Form call answering with the archive
    DirectFormExport,
}

impl From<ProtocolArg> for ExportProtocol {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::TwoStepDownload => ExportProtocol::TwoStepDownload,
            ProtocolArg::DirectFormExport => ExportProtocol::DirectFormExport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn given_rpc_args_when_parsing_then_collects_params() {
        let cli = Cli::parse_from(["avx", "rpc", "vpc-import", "region=us-east-1", "a=b=c"]);
        match cli.command {
            Commands::Rpc {
                action,
                params,
                form,
            } => {
                assert_eq!(action, "vpc-import");
                assert_eq!(params, vec!["region=us-east-1", "a=b=c"]);
                assert!(!form);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn given_export_flags_when_parsing_then_sets_options() {
        let cli = Cli::parse_from([
            "avx",
            "export",
            "aviatrix_vpc",
            "/tmp/out",
            "-w",
            "--import-script",
            "--protocol",
            "two-step-download",
            "--json-only",
        ]);
        assert!(cli.json_only);
        match cli.command {
            Commands::Export {
                resource,
                output_dir,
                write_files,
                include_aux,
                manage_attachments_internally,
                protocol,
            } => {
                assert_eq!(resource, "aviatrix_vpc");
                assert_eq!(output_dir, "/tmp/out");
                assert!(write_files);
                assert!(include_aux);
                assert!(!manage_attachments_internally);
                assert_eq!(protocol, Some(ProtocolArg::TwoStepDownload));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn given_export_without_dir_when_parsing_then_defaults_to_cwd() {
        let cli = Cli::parse_from(["avx", "export", "aviatrix_vpc"]);
        match cli.command {
            Commands::Export {
                output_dir,
                write_files,
                ..
            } => {
                assert_eq!(output_dir, ".");
                assert!(!write_files);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn given_verbose_flags_when_parsing_then_counts() {
        let cli = Cli::parse_from(["avx", "-vv", "login"]);
        assert_eq!(cli.verbose, 2);
    }
}
