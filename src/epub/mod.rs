pub mod error;
pub mod config;
pub mod markup;
pub mod container;
pub mod reader;
pub mod opf;
pub mod ncx;
pub mod bundle;
pub mod recipe;

// 重新导出错误处理
pub use error::{EpubError, Result};

// 重新导出配置
pub use config::EpubConfig;

// 重新导出容器相关
pub use container::{Container, RootFile};

// 重新导出EPUB读取器
pub use reader::Epub;

// 重新导出OPF相关
pub use opf::{
    Content,
    DcElement,
    DcTag,
    Direction,
    ItemProperty,
    ManifestItem,
    MetaAttribute,
    MetadataEntry,
    Package,
    SpineItemref,
    SpreadProperty,
    ValidationRule,
};

// 重新导出NCX相关
pub use ncx::{build_ncx, NavMap, NavPoint, Ncx};

// 重新导出打包相关
pub use bundle::{BundleMethod, Bundler, LibraryBundler, ProcessBundler};

// 重新导出构建说明
pub use recipe::Recipe;
