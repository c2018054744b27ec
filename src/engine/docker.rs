use super::error::EngineError;
use super::types::{BuildOptions, ExportStream, ImageInspect, ImportSource};
use super::ContainerEngine;
use async_trait::async_trait;
use futures_util::FutureExt;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, info};

const DEFAULT_DOCKER_BIN: &str = "docker";

/// [`ContainerEngine`] backed by the docker command-line client
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
    sudo: bool,
    verbose: bool,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new(DEFAULT_DOCKER_BIN)
    }
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            sudo: false,
            verbose: false,
        }
    }

    /// Runs every docker command through `sudo`
    pub fn with_sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    /// Surfaces docker output at info level instead of debug
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = if self.sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg(&self.binary);
            cmd
        } else {
            Command::new(&self.binary)
        };
        cmd.args(args).kill_on_drop(true);
        cmd
    }

    fn display(&self, args: &[String]) -> String {
        let prefix = if self.sudo { "sudo " } else { "" };
        format!("{}{} {}", prefix, self.binary, args.join(" "))
    }

    async fn run(&self, args: Vec<String>) -> Result<String, EngineError> {
        let command = self.display(&args);
        debug!(command = %command, "Running docker command");

        let output = self
            .command(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| EngineError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        self.log_output(&stdout);
        check_status(&command, &output)?;
        Ok(stdout)
    }

    fn log_output(&self, text: &str) {
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            if self.verbose {
                info!("\u{1F433}  {}", line);
            } else {
                debug!("\u{1F433}  {}", line);
            }
        }
    }
}

fn check_status(command: &str, output: &Output) -> Result<(), EngineError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Err(EngineError::CommandFailed {
        command: command.to_string(),
        status: output.status.to_string(),
        message: if stderr.is_empty() {
            "no error output".to_string()
        } else {
            stderr
        },
    })
}

pub(crate) fn build_args(image: &str, options: &BuildOptions) -> Vec<String> {
    let mut args = vec![
        "build".to_string(),
        "-t".to_string(),
        image.to_string(),
        "-f".to_string(),
        options.file.display().to_string(),
    ];
    for (key, value) in &options.args {
        args.push("--build-arg".to_string());
        args.push(format!("{}={}", key, value));
    }
    if let Some(cache) = &options.cache_from {
        args.push("--cache-from".to_string());
        args.push(cache.clone());
    }
    args.push(options.working.display().to_string());
    args
}

pub(crate) fn import_args(source: &str, image: &str, changes: &[String]) -> Vec<String> {
    let mut args = vec!["import".to_string()];
    for change in changes {
        args.push("--change".to_string());
        args.push(change.clone());
    }
    args.push(source.to_string());
    args.push(image.to_string());
    args
}

#[async_trait]
impl ContainerEngine for DockerCli {
    async fn pull(&self, reference: &str) -> Result<(), EngineError> {
        self.run(vec!["pull".into(), reference.into()]).await?;
        Ok(())
    }

    async fn build(&self, image: &str, options: &BuildOptions) -> Result<(), EngineError> {
        self.run(build_args(image, options)).await?;
        Ok(())
    }

    async fn create(&self, image: &str, name: &str) -> Result<String, EngineError> {
        self.run(vec![
            "create".into(),
            "--name".into(),
            name.into(),
            image.into(),
        ])
        .await?;
        Ok(name.to_string())
    }

    async fn export_to_file(&self, container: &str, path: &Path) -> Result<(), EngineError> {
        self.run(vec![
            "export".into(),
            "-o".into(),
            path.display().to_string(),
            container.into(),
        ])
        .await?;
        Ok(())
    }

    async fn export_stream(&self, container: &str) -> Result<ExportStream, EngineError> {
        let args = vec!["export".to_string(), container.to_string()];
        let command = self.display(&args);
        debug!(command = %command, "Spawning docker export");

        let mut child = self
            .command(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                command: command.clone(),
                source,
            })?;

        let reader = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::other(format!("`{}` has no stdout", command)))?;

        let completion = async move {
            let output = child.wait_with_output().await?;
            check_status(&command, &output)
        }
        .boxed();

        Ok(ExportStream {
            reader: Box::new(reader),
            completion,
        })
    }

    async fn import(
        &self,
        source: ImportSource,
        image: &str,
        changes: &[String],
    ) -> Result<(), EngineError> {
        debug!(source = %source.describe(), image, "Importing container filesystem");

        match source {
            ImportSource::File(path) => {
                self.run(import_args(&path.display().to_string(), image, changes))
                    .await?;
                Ok(())
            }
            ImportSource::Stream(export) => {
                let ExportStream {
                    mut reader,
                    completion,
                } = export;
                let args = import_args("-", image, changes);
                let command = self.display(&args);
                debug!(command = %command, "Spawning docker import from pipe");

                let mut child = self
                    .command(&args)
                    .stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .spawn()
                    .map_err(|source| EngineError::Spawn {
                        command: command.clone(),
                        source,
                    })?;

                let mut stdin = child
                    .stdin
                    .take()
                    .ok_or_else(|| EngineError::other(format!("`{}` has no stdin", command)))?;

                let copied = tokio::io::copy(&mut reader, &mut stdin).await;
                drop(stdin);
                // Closing our end of the export pipe lets a producer still
                // writing fail fast instead of blocking on a full pipe.
                drop(reader);

                // A failed copy means the import side is gone. Dropping the
                // completion kills the export child instead of waiting on it.
                let exported = match &copied {
                    Ok(_) => Some(completion.await),
                    Err(_) => {
                        drop(completion);
                        None
                    }
                };

                let output = child.wait_with_output().await?;
                self.log_output(&String::from_utf8_lossy(&output.stdout));

                check_status(&command, &output)?;
                if let Some(exported) = exported {
                    exported?;
                }
                let bytes = copied?;
                debug!(bytes, "Piped container export into import");
                Ok(())
            }
        }
    }

    async fn inspect(&self, image: &str) -> Result<ImageInspect, EngineError> {
        let args = vec!["image".to_string(), "inspect".to_string(), image.to_string()];
        let command = self.display(&args);
        let output = self
            .command(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| EngineError::Spawn {
                command: command.clone(),
                source,
            })?;
        check_status(&command, &output)?;

        let mut records: Vec<ImageInspect> =
            serde_json::from_slice(&output.stdout).map_err(|e| EngineError::InvalidInspect {
                image: image.to_string(),
                message: e.to_string(),
            })?;

        if records.is_empty() {
            return Err(EngineError::InvalidInspect {
                image: image.to_string(),
                message: "no image records returned".to_string(),
            });
        }
        Ok(records.swap_remove(0))
    }

    async fn tag_image(&self, image: &str, tags: &[String]) -> Result<(), EngineError> {
        for tag in tags {
            self.run(vec![
                "tag".into(),
                image.into(),
                format!("{}:{}", image, tag),
            ])
            .await?;
        }
        Ok(())
    }

    async fn push_tags(&self, image: &str, tags: &[String]) -> Result<(), EngineError> {
        for tag in tags {
            self.run(vec!["push".into(), format!("{}:{}", image, tag)])
                .await?;
        }
        Ok(())
    }

    async fn remove_container(&self, container: &str, force: bool) -> Result<(), EngineError> {
        let mut args = vec!["rm".to_string()];
        if force {
            args.push("-f".to_string());
        }
        args.push(container.to_string());
        self.run(args).await?;
        Ok(())
    }
}
