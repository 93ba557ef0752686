//! Volume driver that runs the host's `lvm` tooling.
//!
//! Reports are requested in bytes without suffix and tab-separated, then
//! parsed row by row. Commands run through [`tokio::process::Command`] so a
//! slow `lvm` invocation never blocks a runtime worker.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;

use super::{CreateVolume, DriverError, LogicalVolume, VolumeDriver};

const REPORT_ARGS: [&str; 6] = [
    "--noheadings",
    "--units",
    "b",
    "--nosuffix",
    "--separator",
    "\t",
];

/// Driver invoking `lvm <subcommand>` for every operation.
#[derive(Debug, Clone)]
pub struct LvmDriver {
    lvm_path: PathBuf,
}

impl LvmDriver {
    /// Creates a driver that runs the `lvm` binary at `lvm_path`.
    #[must_use]
    pub fn new(lvm_path: impl Into<PathBuf>) -> Self {
        Self {
            lvm_path: lvm_path.into(),
        }
    }

    async fn run(&self, subcommand: &str, args: &[String]) -> Result<String, DriverError> {
        tracing::debug!(subcommand, ?args, "running lvm");
        let output = Command::new(&self.lvm_path)
            .arg(subcommand)
            .args(args)
            .output()
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(classify_failure(subcommand, stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

fn report_args(fields: &str, target: &str) -> Vec<String> {
    let mut args: Vec<String> = REPORT_ARGS.iter().map(ToString::to_string).collect();
    args.extend(["-o".to_string(), fields.to_string(), target.to_string()]);
    args
}

/// Maps a failed command's stderr onto the most specific [`DriverError`].
fn classify_failure(subcommand: &str, stderr: String) -> DriverError {
    if let Some(rest) = stderr.split("Volume group \"").nth(1)
        && stderr.contains("not found")
    {
        let pool = rest.split('"').next().unwrap_or_default();
        return DriverError::PoolMissing(pool.to_string());
    }
    DriverError::Command {
        command: subcommand.to_string(),
        stderr,
    }
}

/// Parses `lvs -o lv_name,lv_size,lv_tags` rows for `pool`.
fn parse_lvs(pool: &str, output: &str) -> Result<Vec<LogicalVolume>, DriverError> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut cols = line.split('\t').map(str::trim);
            let (Some(name), Some(size)) = (cols.next(), cols.next()) else {
                return Err(parse_error("lvs", format!("short row: {line:?}")));
            };
            let size_bytes = size
                .parse()
                .map_err(|_| parse_error("lvs", format!("invalid size {size:?}")))?;
            let tags = cols
                .next()
                .unwrap_or_default()
                .split(',')
                .filter(|tag| !tag.is_empty())
                .map(ToString::to_string)
                .collect();
            Ok(LogicalVolume {
                pool: pool.to_string(),
                name: name.to_string(),
                size_bytes,
                tags,
            })
        })
        .collect()
}

/// Parses the single `vgs -o vg_free` value.
fn parse_vg_free(output: &str) -> Result<u64, DriverError> {
    let value = output.trim();
    value
        .parse()
        .map_err(|_| parse_error("vgs", format!("invalid vg_free {value:?}")))
}

fn parse_error(command: &str, detail: String) -> DriverError {
    DriverError::Parse {
        command: command.to_string(),
        detail,
    }
}

fn lvcreate_args(pool: &str, request: &CreateVolume) -> Vec<String> {
    let mut args = vec![
        "-n".to_string(),
        request.name.clone(),
        "-L".to_string(),
        format!("{}b", request.size_bytes),
        "-W".to_string(),
        "y".to_string(),
        "-y".to_string(),
    ];
    for tag in &request.tags {
        args.extend(["--addtag".to_string(), tag.clone()]);
    }
    if let Some(stripe) = request.stripe {
        args.extend(["-i".to_string(), stripe.to_string()]);
    }
    if let Some(size) = &request.stripe_size {
        args.extend(["-I".to_string(), size.clone()]);
    }
    args.extend(request.extra_options.iter().cloned());
    args.push(pool.to_string());
    args
}

fn volume_path(volume: &LogicalVolume) -> String {
    format!("{}/{}", volume.pool, volume.name)
}

#[async_trait]
impl VolumeDriver for LvmDriver {
    async fn list_volumes(&self, pool: &str) -> Result<Vec<LogicalVolume>, DriverError> {
        let output = self
            .run("lvs", &report_args("lv_name,lv_size,lv_tags", pool))
            .await?;
        parse_lvs(pool, &output)
    }

    async fn create_volume(
        &self,
        pool: &str,
        request: &CreateVolume,
    ) -> Result<LogicalVolume, DriverError> {
        if self.list_volumes(pool).await?.iter().any(|lv| lv.name == request.name) {
            return Err(DriverError::VolumeExists(request.name.clone()));
        }
        self.run("lvcreate", &lvcreate_args(pool, request)).await?;
        tracing::info!(pool, name = %request.name, size_bytes = request.size_bytes, "lvcreate done");
        // lvcreate rounds up to whole extents; report what was allocated
        // when the read-back works. The volume exists either way.
        match self.find_volume(pool, &request.name).await {
            Ok(volume) => Ok(volume),
            Err(err) => {
                tracing::warn!(pool, name = %request.name, error = %err, "lvcreate read-back failed");
                Ok(LogicalVolume {
                    pool: pool.to_string(),
                    name: request.name.clone(),
                    size_bytes: request.size_bytes,
                    tags: request.tags.clone(),
                })
            }
        }
    }

    async fn remove_volume(&self, volume: &LogicalVolume) -> Result<(), DriverError> {
        self.run("lvremove", &["-f".to_string(), volume_path(volume)])
            .await?;
        tracing::info!(pool = %volume.pool, name = %volume.name, "lvremove done");
        Ok(())
    }

    async fn resize_volume(
        &self,
        volume: &LogicalVolume,
        size_bytes: u64,
    ) -> Result<(), DriverError> {
        self.run(
            "lvresize",
            &[
                "-L".to_string(),
                format!("{size_bytes}b"),
                volume_path(volume),
            ],
        )
        .await?;
        Ok(())
    }

    async fn free_bytes(&self, pool: &str) -> Result<u64, DriverError> {
        let output = self.run("vgs", &report_args("vg_free", pool)).await?;
        parse_vg_free(&output)
    }
}
