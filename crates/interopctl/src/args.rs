use crate::logging::LogLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    author,
    name = "interopctl",
    about = "Operate the GCE docker hosts that build and run gRPC interop images",
    after_help = "Most commands take getopts-style flags before their positionals:\n  \
                  -p <project>  -z <zone>  -n (dry run)  -f <arg_func>\n\
                  For help with a specific command, see: `interopctl help <command>`."
)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub(crate) command: Command,
    #[clap(flatten)]
    pub(crate) global_options: GlobalConfigArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(
        about = "Upload the Dockerfile tree to cloud storage. Args: [-d dir] [-r gs_uri] [docker_dir] [gs_uri]",
        disable_help_flag = true
    )]
    PushDockerfiles {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    #[command(
        about = "Rebuild an image on a host. Args: <image_label> <remote_docker_dir> <host>",
        disable_help_flag = true
    )]
    UpdateImage {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    #[command(
        about = "Sync the function library and images to hosts. Args: [-s dir] [-d dir] [-h host]... <host>...",
        disable_help_flag = true
    )]
    SyncImages {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    #[command(
        about = "Launch an interop server container. Args: <host> <server_type>",
        disable_help_flag = true
    )]
    LaunchServer {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    #[command(
        about = "Run an interop client against a launched server. \
                 Args: <test_case> <client_host> <client_type> <server_host> <server_type>",
        disable_help_flag = true
    )]
    InteropTest {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    #[command(
        about = "Run an interop client against the production sandbox. Args: <test_case> <host> <client_type>",
        disable_help_flag = true
    )]
    CloudProdTest {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    #[command(
        about = "Run an authenticated client against the production sandbox. Args: <test_case> <host> <client_type>",
        disable_help_flag = true
    )]
    CloudProdAuthTest {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    #[command(
        about = "Print the flags an interop client needs. Args: <server_ip> <server_port> <test_case>",
        disable_help_flag = true
    )]
    TestFlags {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    #[command(about = "Print the command a named generator builds, e.g. grpc_cloud_prod_gen_cxx_cmd")]
    Gen {
        #[arg(help = "Generator name, with or without the grpc_ prefix")]
        generator: String,

        #[arg(
            trailing_var_arg = true,
            allow_hyphen_values = true,
            help = "Flags appended to the generated command"
        )]
        flags: Vec<String>,
    },
    #[command(about = "List registered client generators and server targets")]
    Generators,
}

#[derive(Debug, Parser)]
pub struct GlobalConfigArgs {
    /// Settings file; defaults to ~/.config/interopctl.toml and ~/.interopctl.toml
    #[arg(long, global = true, env = "INTEROPCTL_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log verbosity
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Shorthand for --log-level debug
    #[arg(short, long, global = true)]
    pub verbose: bool,
}
