//! CLI command definitions and handlers.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, eyre};
use stowage_common::ContainerId;

use crate::config::RuntimeConfig;
use crate::container::ContainerRecord;
use crate::mount::{SystemFiles, assemble_mounts};
use crate::volume::{VolumeSetBuilder, parse_bind_spec};

/// Stowage - container volume resolution
#[derive(Parser)]
#[command(name = "stowage")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Root directory for stowage data [default: /var/lib/stowage]
    #[arg(long, global = true, env = "STOWAGE_ROOT")]
    pub root: Option<PathBuf>,

    /// Run without root privileges, keeping data under the home directory
    #[arg(long, global = true)]
    pub rootless: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab separated table.
    Table,
    /// Pretty printed JSON.
    Json,
}

/// Stowage subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Register a container and resolve its volumes
    Create {
        /// Container ID
        container_id: String,

        /// Root filesystem of the container
        #[arg(long)]
        rootfs: PathBuf,

        /// Bind mount (container-path | host-path:container-path[:ro|rw])
        #[arg(short, long = "volume")]
        volumes: Vec<String>,

        /// Inherit volumes from another container (id[:ro|rw])
        #[arg(long)]
        volumes_from: Vec<String>,

        /// Volume declared by the image
        #[arg(long = "image-volume")]
        image_volumes: Vec<PathBuf>,

        /// Host file to mount at /etc/resolv.conf
        #[arg(long)]
        resolv_conf: Option<PathBuf>,

        /// Host file to mount at /etc/hostname
        #[arg(long)]
        hostname_file: Option<PathBuf>,

        /// Host file to mount at /etc/hosts
        #[arg(long)]
        hosts_file: Option<PathBuf>,
    },

    /// Resolve the volumes of a registered container again
    Prepare {
        /// Container ID
        container_id: String,
    },

    /// Print the ordered mount list of a container
    Mounts {
        /// Container ID
        container_id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Print the resolved volume set of a container
    Volumes {
        /// Container ID
        container_id: String,
    },

    /// Parse a bind-mount specification
    ParseBind {
        /// Specification to parse
        spec: String,
    },

    /// List registered containers
    List,

    /// Remove a container record
    Delete {
        /// Container ID
        container_id: String,
    },
}

impl Cli {
    /// Runtime configuration selected by the global flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the rootless data directory cannot be determined.
    pub fn config(&self) -> Result<RuntimeConfig> {
        let config = if self.rootless {
            RuntimeConfig::rootless()?
        } else {
            RuntimeConfig::default()
        };

        Ok(match &self.root {
            Some(root) => config.with_root(root),
            None => config,
        })
    }

    /// Execute the CLI command.
    pub fn execute(self) -> Result<()> {
        let config = self.config()?;
        let store = config.container_store();
        let allocator = config.allocator();
        let copier = config.copier();
        let builder = VolumeSetBuilder::new(&store, &allocator, &copier);

        match self.command {
            Commands::Create {
                container_id,
                rootfs,
                volumes,
                volumes_from,
                image_volumes,
                resolv_conf,
                hostname_file,
                hosts_file,
            } => {
                let container_id = ContainerId::new(container_id)?;
                if store.exists(container_id.as_str()) {
                    return Err(eyre!("Container {} already exists", container_id));
                }
                config.paths.create_dirs()?;

                let container_dir = store.container_dir(container_id.as_str())?;
                let mut record = ContainerRecord::new(container_id.as_str(), rootfs, &container_dir);
                record.binds = volumes;
                record.volumes_from = volumes_from;
                record.image_volumes = image_volumes;
                if let Some(path) = resolv_conf {
                    record.resolv_conf_path = path;
                }
                record.hostname_path = hostname_file;
                record.hosts_path = hosts_file;

                record.volumes = builder
                    .build(&record)
                    .map_err(|e| eyre!("Failed to create container: {}", e))?;
                store
                    .save(&record)
                    .map_err(|e| eyre!("Failed to save container: {}", e))?;

                println!(
                    "Container {} created with {} volume(s)",
                    container_id,
                    record.volumes.len()
                );
                Ok(())
            }

            Commands::Prepare { container_id } => {
                let mut record = store
                    .load(&container_id)
                    .map_err(|e| eyre!("Failed to load container: {}", e))?;

                record.volumes = builder
                    .build(&record)
                    .map_err(|e| eyre!("Failed to prepare volumes: {}", e))?;
                store
                    .save(&record)
                    .map_err(|e| eyre!("Failed to save container: {}", e))?;

                println!("Container {} prepared", container_id);
                Ok(())
            }

            Commands::Mounts {
                container_id,
                format,
            } => {
                let record = store
                    .load(&container_id)
                    .map_err(|e| eyre!("Failed to load container: {}", e))?;
                let mounts = assemble_mounts(&SystemFiles::from_container(&record), &record.volumes);

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&mounts)?),
                    OutputFormat::Table => {
                        println!("SOURCE\tDESTINATION\tMODE\tPROPAGATION");
                        for mount in mounts {
                            println!(
                                "{}\t{}\t{}\t{}",
                                mount.source.display(),
                                mount.destination.display(),
                                if mount.writable { "rw" } else { "ro" },
                                mount.propagation
                            );
                        }
                    }
                }
                Ok(())
            }

            Commands::Volumes { container_id } => {
                let record = store
                    .load(&container_id)
                    .map_err(|e| eyre!("Failed to load container: {}", e))?;
                println!("{}", serde_json::to_string_pretty(&record.volumes)?);
                Ok(())
            }

            Commands::ParseBind { spec } => {
                let volume = parse_bind_spec(&spec)?;
                println!(
                    "{}\t{}\t{}",
                    volume
                        .host_path()
                        .map_or_else(|| "<managed>".to_string(), |p| p.display().to_string()),
                    volume.container_path.display(),
                    if volume.read_write { "rw" } else { "ro" }
                );
                Ok(())
            }

            Commands::List => {
                for id in store
                    .list()
                    .map_err(|e| eyre!("Failed to list containers: {}", e))?
                {
                    println!("{}", id);
                }
                Ok(())
            }

            Commands::Delete { container_id } => {
                store
                    .delete(&container_id)
                    .map_err(|e| eyre!("Failed to delete container: {}", e))?;
                println!("Container {} deleted", container_id);
                Ok(())
            }
        }
    }
}
