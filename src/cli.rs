//! Command-line surface: one subcommand per verb and entity.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::notify::DEFAULT_BASE_URL;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (git ", env!("BUILD_TIME_GIT_HASH"), ")");

#[derive(Parser, Debug)]
#[command(name = "home-registry", version = VERSION)]
#[command(about = "Administer the smart-home device registry")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Cloud Firestore (or its emulator)
    Firestore,
    /// JSON files under a local directory
    Local,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Load environment variables from this file (default: ./.env if present)
    #[arg(long, global = true, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[arg(long, global = true, env = "REGISTRY_STORE", value_enum, default_value_t = StoreKind::Firestore)]
    pub store: StoreKind,

    /// Service account key file; its project_id selects the Firestore project
    #[arg(
        long,
        global = true,
        env = "GOOGLE_APPLICATION_CREDENTIALS",
        default_value = "serviceAccountKeyFile.json"
    )]
    pub credentials: PathBuf,

    /// Overrides the project id from the credentials file
    #[arg(long, global = true, env = "FIRESTORE_PROJECT_ID")]
    pub project_id: Option<String>,

    /// OAuth bearer token for Firestore
    #[arg(long, global = true, env = "FIRESTORE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// host:port of a Firestore emulator
    #[arg(long, global = true, env = "FIRESTORE_EMULATOR_HOST")]
    pub emulator_host: Option<String>,

    /// Root directory of the local store
    #[arg(long, global = true, env = "REGISTRY_LOCAL_ROOT", default_value = ".registry")]
    pub local_root: PathBuf,

    /// File whose first 12 characters are the Home Graph API key
    #[arg(long, global = true, env = "HOMEGRAPH_API_KEY_FILE", default_value = "apikey.txt")]
    pub api_key_file: PathBuf,

    /// Home Graph API key, used as is instead of the key file
    #[arg(long, global = true, env = "HOMEGRAPH_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true, env = "HOMEGRAPH_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub homegraph_url: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Print whole records as JSON
    #[arg(long)]
    pub full: bool,
}

#[derive(Subcommand, Debug, Clone)]
#[command(rename_all = "snake_case")]
pub enum Command {
    /// List devices
    GetDevice {
        #[arg(long)]
        device_id: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Register a device
    AddDevice {
        #[arg(long)]
        manufacturer: String,
        #[arg(long)]
        model: String,
        #[arg(long = "type")]
        device_type: String,
        /// Repeat for every trait
        #[arg(long, required = true)]
        traits: Vec<String>,
        #[arg(long, alias = "willReportState")]
        report_state: bool,
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete a device (bindings referencing it are kept)
    DelDevice {
        #[arg(long)]
        device_id: String,
    },

    /// List remotes
    GetRemote {
        #[arg(long)]
        remote_id: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Register a remote control
    AddRemote {
        #[arg(long)]
        mac_addr: String,
        #[arg(long = "type")]
        remote_type: String,
        #[arg(long)]
        name: Option<String>,
    },
    DelRemote {
        #[arg(long)]
        remote_id: String,
    },

    /// List users
    GetUser {
        #[arg(long)]
        user_id: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    AddUser {
        #[arg(long)]
        name: Option<String>,
    },
    DelUser {
        #[arg(long)]
        user_id: String,
    },

    /// List groups, optionally only those with a member
    GetGroup {
        #[arg(long)]
        group_id: Option<String>,
        #[arg(long)]
        user_id: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Create a group of existing users
    AddGroup {
        /// Repeat for every member
        #[arg(long, required = true)]
        user_id: Vec<String>,
    },
    DelGroup {
        #[arg(long)]
        group_id: String,
    },

    /// List user-device bindings
    GetUserDevice {
        #[arg(long)]
        user_device_id: Option<String>,
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        device_id: Option<String>,
        #[arg(long)]
        remote_id: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Bind a device and remote to a user, then request a sync for the user
    AddUserDevice {
        #[arg(long)]
        device_id: String,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        remote_id: String,
        #[arg(long)]
        name: Option<String>,
    },
    DelUserDevice {
        #[arg(long)]
        user_device_id: String,
    },

    /// List group-device bindings
    GetGroupDevice {
        #[arg(long)]
        group_device_id: Option<String>,
        #[arg(long)]
        group_id: Option<String>,
        #[arg(long)]
        device_id: Option<String>,
        #[arg(long)]
        remote_id: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Bind a device and remote to a group, then request a sync per member
    AddGroupDevice {
        #[arg(long)]
        device_id: String,
        #[arg(long)]
        group_id: String,
        #[arg(long)]
        remote_id: String,
        #[arg(long)]
        name: Option<String>,
    },
    DelGroupDevice {
        #[arg(long)]
        group_device_id: String,
    },

    /// List remote codes of a device
    GetRemoteCode {
        #[arg(long)]
        device_id: String,
        #[arg(long)]
        remote_type: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Store key=value codes for a device action
    AddRemoteCode {
        #[arg(long)]
        device_id: String,
        #[arg(long)]
        remote_type: String,
        #[arg(long)]
        action: String,
        /// key=value, repeat for more
        #[arg(long, required = true)]
        values: Vec<String>,
    },
    /// Delete an action, or only one of its keys with --value-key
    DelRemoteCode {
        #[arg(long)]
        device_id: String,
        #[arg(long)]
        remote_type: String,
        #[arg(long)]
        action: String,
        #[arg(long)]
        value_key: Option<String>,
    },
}
