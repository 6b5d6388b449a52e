/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use vsphere::{Config, Credentials, ManagedObjectReference};

use crate::error::{Error, Result};

/// Query a vCenter server or ESX host through the vim25 api and follow the
/// tasks it runs.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Args {
    /// Json config file. Flags given on the command line take precedence.
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// Name of the vCenter server or ESX host.
    #[clap(short = 'H', long)]
    pub host: Option<String>,
    /// Port of the sdk endpoint (443 by default).
    #[clap(short = 'P', long)]
    pub port: Option<u16>,
    /// Name of the user that logs in.
    #[clap(short = 'u', long)]
    pub username: Option<String>,
    /// Password of the user.
    #[clap(
        short = 'p',
        long,
        env = "VSPHERE_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,
    /// Trust any certificate the server presents, including expired and
    /// self-signed ones. Only use this against test endpoints.
    #[clap(long)]
    pub danger_disable_certificate_verification: bool,
    /// Accept certificates issued for another hostname.
    #[clap(long)]
    pub danger_disable_hostname_verification: bool,
    /// Timeout used on every request in seconds.
    #[clap(short = 't', long)]
    pub timeout: Option<u64>,
    /// Increase verbosity. Every additional v increases the verbosity by
    /// one stage.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbosity: u8,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the product and api information of the endpoint.
    About,
    /// List all objects of a type with selected properties.
    List {
        /// Managed object type, e.g. HostSystem.
        #[clap(short = 'T', long = "type")]
        r#type: String,
        /// Property paths to retrieve.
        #[clap(long = "prop", default_value = "name")]
        props: Vec<String>,
    },
    /// Show selected properties of one managed object.
    Props {
        /// The object, as Type:value (e.g. HostSystem:host-10).
        object: Mor,
        /// Property paths to retrieve.
        #[clap(required = true)]
        props: Vec<String>,
    },
    /// Find an inventory object by name.
    Find {
        #[clap(value_enum)]
        kind: Kind,
        name: String,
        /// Datacenter to search in (clusters and portgroups).
        #[clap(short = 'd', long)]
        datacenter: Option<String>,
    },
    /// List the hosts of a cluster.
    Hosts {
        cluster: String,
        #[clap(short = 'd', long)]
        datacenter: String,
    },
    /// List the queued and running tasks of a managed entity.
    Tasks { entity: Mor },
    /// Wait for one or more tasks to finish.
    WaitTask {
        /// Task ids (task-123) or references (Task:task-123).
        #[clap(required = true)]
        tasks: Vec<Mor>,
        /// Number of tasks monitored concurrently.
        #[clap(long, default_value = "4")]
        parallel: usize,
    },
    /// Destroy a managed entity and wait for the removal.
    Destroy { entity: Mor },
}

#[derive(clap::ValueEnum, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Kind {
    Datacenter,
    Cluster,
    Host,
    Switch,
    Portgroup,
    Vm,
}

/// A managed object reference given on the command line.
#[derive(Clone, Debug)]
pub struct Mor(pub ManagedObjectReference);

impl std::str::FromStr for Mor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((typ, value)) if !typ.is_empty() && !value.is_empty() => {
                Ok(Self(ManagedObjectReference::new(typ, value)))
            }
            None if s.starts_with("task-") => {
                Ok(Self(ManagedObjectReference::new("Task", s)))
            }
            _ => Err(format!("not a Type:value reference: {}", s)),
        }
    }
}

impl fmt::Display for Mor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Args {
    pub fn init_logger(&self) {
        if let Err(e) = simplelog::TermLogger::init(
            match self.verbosity {
                0 => simplelog::LevelFilter::Info,
                1 => simplelog::LevelFilter::Debug,
                2.. => simplelog::LevelFilter::Trace,
            },
            simplelog::ConfigBuilder::new()
                .add_filter_ignore_str("serde_xml_rs")
                .add_filter_ignore_str("handlebars")
                .add_filter_ignore_str("want")
                .add_filter_ignore_str("mio")
                .build(),
            simplelog::TerminalMode::Stderr,
            simplelog::ColorChoice::Auto,
        ) {
            eprintln!("Error: failed to initialize logging: {}", e);
            process::exit(1);
        }
    }

    /// The client config: the config file if given, overridden by flags.
    pub async fn get_config(&self) -> Result<Config> {
        let mut config = match (&self.config, &self.host) {
            (Some(path), _) => Config::load(path).await?,
            (None, Some(host)) => Config::new(host),
            (None, None) => {
                return Err(Error::RequiredArg(String::from("host")))
            }
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = Some(port);
        }
        if let Some(username) = &self.username {
            match &mut config.credentials {
                Some(credentials) => credentials.username = username.clone(),
                None => {
                    config.credentials = Some(Credentials {
                        username: username.clone(),
                        password: None,
                    })
                }
            }
        }
        if let Some(password) = &self.password {
            match &mut config.credentials {
                Some(credentials) => {
                    credentials.password = Some(password.clone())
                }
                None => {
                    return Err(Error::RequiredArg(String::from("username")))
                }
            }
        }
        if self.danger_disable_certificate_verification {
            config.disable_certificate_verification = Some(true);
        }
        if self.danger_disable_hostname_verification {
            config.disable_hostname_verification = Some(true);
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout = Some(timeout);
        }
        Ok(config)
    }
}
