use crate::epub::bundle::{archive_entries, open_source, ArchiveEntry, Bundler, EntrySource};
use crate::epub::config::{EpubConfig, FILENAME_PLACEHOLDER};
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::Package;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// 调用外部zip命令写归档
///
/// 在系统临时目录下展开完整布局，然后在该目录中运行两次zip：
/// 第一次压缩添加除mimetype外的全部内容，第二次以不压缩方式添加mimetype。
/// 临时目录在任何返回路径上都会被清理。
#[derive(Debug, Clone)]
pub struct ProcessBundler {
    config: EpubConfig,
}

impl ProcessBundler {
    pub fn new(config: EpubConfig) -> Self {
        Self { config }
    }

    fn check_executable(&self) -> Result<()> {
        let executable = &self.config.zip_executable;
        let failure = |reason: &str| EpubError::ArchiveProcess {
            command: executable.display().to_string(),
            status: None,
            output: reason.to_string(),
        };

        if !executable.is_file() {
            return Err(failure("可执行文件不存在"));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(executable)?.permissions().mode();
            if mode & 0o111 == 0 {
                return Err(failure("文件没有执行权限"));
            }
        }

        Ok(())
    }

    /// 按模板运行一次zip，`!filename` 替换为归档的绝对路径
    fn run(&self, template: &str, working_dir: &Path, target: &Path) -> Result<()> {
        let target = target.to_string_lossy();
        let args: Vec<String> = template
            .split_whitespace()
            .map(|arg| arg.replace(FILENAME_PLACEHOLDER, &target))
            .collect();
        let command = format!("{} {}", self.config.zip_executable.display(), args.join(" "));
        debug!(%command, dir = %working_dir.display(), "运行归档命令");

        let output = Command::new(&self.config.zip_executable)
            .args(&args)
            .current_dir(working_dir)
            .output()
            .map_err(|e| EpubError::ArchiveProcess {
                command: command.clone(),
                status: None,
                output: e.to_string(),
            })?;

        let status = output.status.code();
        if status != Some(self.config.zip_success) {
            let mut message = String::from_utf8_lossy(&output.stderr).into_owned();
            message.push_str(&String::from_utf8_lossy(&output.stdout));
            return Err(EpubError::ArchiveProcess {
                command,
                status,
                output: message.trim().to_string(),
            });
        }

        Ok(())
    }
}

impl Bundler for ProcessBundler {
    fn bundle(&self, package: &Package, target: &Path) -> Result<()> {
        let entries = archive_entries(package, &self.config)?;
        self.check_executable()?;
        let target = std::path::absolute(target)?;

        let staging = StagingDir::create()?;
        for entry in &entries {
            staging.write_entry(entry)?;
        }

        if target.exists() {
            fs::remove_file(&target)?;
        }

        self.run(&self.config.zip_args, staging.path(), &target)?;
        self.run(&self.config.zip_args_mimetype, staging.path(), &target)?;

        info!(target = %target.display(), entries = entries.len(), "已使用外部命令完成打包");
        Ok(())
    }
}

/// 暂存目录，离开作用域时删除
struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    fn create() -> Result<Self> {
        let path = tempfile::Builder::new().prefix("epubpack").tempdir()?.keep();
        debug!(path = %path.display(), "创建暂存目录");
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn write_entry(&self, entry: &ArchiveEntry) -> Result<()> {
        let destination = self.path.join(&entry.name);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        match &entry.source {
            EntrySource::Bytes(bytes) => fs::write(&destination, bytes)?,
            EntrySource::File(source) => {
                let mut reader = open_source(source)?;
                let mut writer = File::create(&destination)?;
                io::copy(&mut reader, &mut writer)?;
            }
        }
        Ok(())
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if !remove_staging_dir(&self.path) {
            warn!(path = %self.path.display(), "暂存目录未能删除");
        }
    }
}

/// 递归删除位于系统临时目录之下的目录
///
/// 路径不在临时目录之下（或就是临时目录本身）时拒绝删除并返回 `false`。
pub(crate) fn remove_staging_dir(path: &Path) -> bool {
    let (Ok(temp_root), Ok(dir)) = (std::env::temp_dir().canonicalize(), path.canonicalize()) else {
        return false;
    };

    if dir == temp_root || !dir.starts_with(&temp_root) {
        warn!(path = %dir.display(), "拒绝删除临时目录之外的路径");
        return false;
    }

    match fs::remove_dir_all(&dir) {
        Ok(()) => {
            debug!(path = %dir.display(), "已删除暂存目录");
            true
        }
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "删除暂存目录失败");
            false
        }
    }
}
