use crate::epub::bundle::{archive_entries, ArchiveEntry, Bundler, EntrySource};
use crate::epub::config::EpubConfig;
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::Package;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// 使用zip库写归档
///
/// 先写出只含未压缩mimetype的归档骨架，再以追加模式打开它写入其余条目（deflate压缩）。
#[derive(Debug, Clone)]
pub struct LibraryBundler {
    config: EpubConfig,
}

impl LibraryBundler {
    pub fn new(config: EpubConfig) -> Self {
        Self { config }
    }

    /// 写出只包含mimetype条目的骨架
    fn write_stub(mimetype: &ArchiveEntry, target: &Path) -> Result<()> {
        let EntrySource::Bytes(bytes) = &mimetype.source else {
            return Err(EpubError::InvalidEpub("mimetype必须是内存条目".to_string()));
        };

        let file = File::create(target).map_err(|e| EpubError::archive_write(&mimetype.name, e))?;
        let mut zip = ZipWriter::new(file);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        zip.start_file(mimetype.name.as_str(), stored)
            .map_err(|e| EpubError::archive_write(&mimetype.name, e))?;
        zip.write_all(bytes)
            .map_err(|e| EpubError::archive_write(&mimetype.name, e))?;
        zip.finish()
            .map_err(|e| EpubError::archive_write(&mimetype.name, e))?;
        Ok(())
    }

    fn append_entry(zip: &mut ZipWriter<File>, entry: &ArchiveEntry) -> Result<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(entry.name.as_str(), options)
            .map_err(|e| EpubError::archive_write(&entry.name, e))?;

        match &entry.source {
            EntrySource::Bytes(bytes) => zip
                .write_all(bytes)
                .map_err(|e| EpubError::archive_write(&entry.name, e))?,
            EntrySource::File(path) => {
                let mut source = File::open(path).map_err(|e| EpubError::archive_write(&entry.name, e))?;
                io::copy(&mut source, zip).map_err(|e| EpubError::archive_write(&entry.name, e))?;
            }
        }

        debug!(entry = %entry.name, "已写入归档条目");
        Ok(())
    }
}

impl Bundler for LibraryBundler {
    fn bundle(&self, package: &Package, target: &Path) -> Result<()> {
        let entries = archive_entries(package, &self.config)?;
        let Some((mimetype, rest)) = entries.split_first() else {
            return Err(EpubError::InvalidEpub("归档布局为空".to_string()));
        };

        Self::write_stub(mimetype, target)?;

        let reopen_failed = |e: zip::result::ZipError| EpubError::archive_write(target.display().to_string(), e);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(target)
            .map_err(|e| reopen_failed(e.into()))?;
        let mut zip = ZipWriter::new_append(file).map_err(reopen_failed)?;
        for entry in rest {
            Self::append_entry(&mut zip, entry)?;
        }
        zip.finish()
            .map_err(|e| EpubError::archive_write(target.display().to_string(), e))?;

        info!(target = %target.display(), entries = entries.len(), "已使用zip库完成打包");
        Ok(())
    }
}
