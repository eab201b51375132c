pub mod epub;

// === 核心API重新导出 ===

/// 包文档模型（主要接口）
pub use epub::Package;

/// 错误处理
pub use epub::{EpubError, Result};

/// 构建配置
pub use epub::EpubConfig;

// === 元数据、清单与脊柱 ===

pub use epub::{
    Content,
    DcElement,
    DcTag,
    Direction,
    ItemProperty,
    ManifestItem,
    MetaAttribute,
    MetadataEntry,
    SpineItemref,
    SpreadProperty,
    ValidationRule,
};

// === 导航与打包 ===

/// NCX组件
pub use epub::{build_ncx, NavMap, NavPoint, Ncx};

/// 打包组件
pub use epub::{BundleMethod, Bundler, LibraryBundler, ProcessBundler};

// === 底层组件（高级用法） ===

/// 容器组件
pub use epub::{Container, RootFile};

/// 已打包EPUB的读取器
pub use epub::Epub;

/// 构建说明
pub use epub::Recipe;

// === 库信息 ===

/// epubpack库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// epubpack库的描述
pub const DESCRIPTION: &str = "一个用于构建和打包EPUB 3文件的Rust库";

// === 便捷函数 ===

/// 快速打开已打包的EPUB文件
///
/// 这是 `Epub::new` 的便捷包装函数。
///
/// # 示例
///
/// ```rust,no_run
/// let mut epub = epubpack::open("book.epub")?;
/// println!("包文档: {}", epub.package_path()?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Epub> {
    Epub::new(path)
}

/// 校验、生成NCX并打包
///
/// # 示例
///
/// ```rust,no_run
/// use epubpack::{BundleMethod, EpubConfig, Package};
/// let mut package = Package::new();
/// // ... 添加清单项和脊柱项
/// epubpack::build_epub(&mut package, "book.epub", EpubConfig::default(), BundleMethod::Library)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn build_epub<P: AsRef<std::path::Path>>(
    package: &mut Package,
    target: P,
    config: EpubConfig,
    method: BundleMethod,
) -> Result<()> {
    package.build_ncx(&config)?;
    method.bundler(config).bundle(package, target.as_ref())
}
