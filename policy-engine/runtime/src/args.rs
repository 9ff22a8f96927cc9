use crate::{k8s::Time, log, policies::MergeOrder, Manifests, Render};
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[clap(
    name = "nginx-policy-engine",
    about = "Validates NGINX Gateway policies and renders their configuration"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "nginx_policy_engine=info,warn",
        env = "NGINX_POLICY_ENGINE_LOG"
    )]
    log_level: String,

    #[clap(long, value_enum, default_value = "plain")]
    log_format: LogFormat,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Debug, PartialEq, Subcommand)]
enum Command {
    /// Renders the NGINX configuration for the policies in a set of manifests.
    Render {
        /// Multi-document YAML files holding policies, AuthenticationFilters,
        /// Secrets and ConfigMaps.
        #[clap(long, required = true, num_args = 1..)]
        manifests: Vec<PathBuf>,

        /// The directory generated files are written to.
        #[clap(long)]
        output_dir: PathBuf,

        /// Writes each policy's status to this file.
        #[clap(long)]
        status_file: Option<PathBuf>,

        /// Decides which of two conflicting policies takes effect.
        #[clap(long, value_enum, default_value = "creation-timestamp")]
        merge_order: Order,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Order {
    CreationTimestamp,
    Listed,
}

impl Args {
    #[inline]
    pub fn parse_and_run() -> Result<()> {
        Self::parse().run()
    }

    pub fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            command,
        } = self;

        log::init(&log_level, log_format)?;

        match command {
            Command::Render {
                manifests,
                output_dir,
                status_file,
                merge_order,
            } => {
                let manifests = Manifests::load(&manifests)?;
                let rendered = Render::new(merge_order.into()).render(manifests);
                rendered.log_conditions();
                rendered.write_files(&output_dir)?;
                if let Some(path) = status_file {
                    rendered.write_statuses(&path, Time(chrono::Utc::now()))?;
                }
                info!(files = rendered.files.len(), "Rendered");
                Ok(())
            }
        }
    }
}

impl From<Order> for MergeOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::CreationTimestamp => Self::CreationTimestamp,
            Order::Listed => Self::Listed,
        }
    }
}
