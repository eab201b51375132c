use clap::Parser;
use epubpack::epub::config::DEFAULT_CONFIG_PATH;
use epubpack::{BundleMethod, Epub, EpubConfig, EpubError, Recipe, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// 📚 epubpack - EPUB 3构建与打包工具
#[derive(Parser)]
#[command(name = "epubpack")]
#[command(about = "根据YAML构建说明生成EPUB 3文件")]
#[command(version)]
struct Args {
    /// 构建说明文件
    #[arg(help = "YAML格式的构建说明文件路径")]
    recipe: Option<PathBuf>,

    /// 输出文件
    #[arg(short, long, default_value = "book.epub", help = "生成的EPUB文件路径")]
    output: PathBuf,

    /// 配置文件
    #[arg(short, long, help = "构建配置文件路径（默认读取当前目录下的epubpack.yaml）")]
    config: Option<PathBuf>,

    /// 打包方式
    #[arg(short, long, value_enum, default_value_t = BundleMethod::Library, help = "打包方式")]
    method: BundleMethod,

    /// 不生成NCX
    #[arg(long, help = "不生成兼容旧阅读器的NCX目录")]
    no_ncx: bool,

    /// 打包后检查
    #[arg(long, help = "打包后重新打开归档并检查mimetype和container.xml")]
    check: bool,

    /// 详细输出模式
    #[arg(short, long, help = "输出调试日志")]
    verbose: bool,

    /// 生成默认配置文件
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = DEFAULT_CONFIG_PATH,
        help = "生成默认配置文件后退出"
    )]
    generate_config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ 错误: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("epubpack=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("epubpack=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<()> {
    if let Some(path) = &args.generate_config {
        EpubConfig::generate_default_config(path)?;
        println!("✅ 已生成默认配置文件: {}", path.display());
        return Ok(());
    }

    let recipe_path = args
        .recipe
        .as_deref()
        .ok_or_else(|| EpubError::ConfigError("缺少构建说明文件".to_string()))?;
    let config = load_config(args.config.as_deref())?;

    let recipe = Recipe::from_file(recipe_path)?;
    let base_dir = recipe_path.parent().unwrap_or_else(|| Path::new("."));
    let mut package = recipe.build(base_dir)?;
    package.validate()?;
    println!("📖 已读取构建说明: {}", recipe_path.display());

    if !args.no_ncx {
        let ncx = package.build_ncx(&config)?;
        println!("🧭 已生成NCX, 共 {} 个导航点", ncx.nav_map.len());
    }

    args.method.bundler(config).bundle(&package, &args.output)?;
    println!("🎉 已生成 {}", args.output.display());

    if args.check {
        check_archive(&args.output)?;
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EpubConfig> {
    match path {
        Some(path) => EpubConfig::from_file(path),
        None if Path::new(DEFAULT_CONFIG_PATH).is_file() => EpubConfig::from_file(DEFAULT_CONFIG_PATH),
        None => Ok(EpubConfig::default_config()),
    }
}

fn check_archive(path: &Path) -> Result<()> {
    let mut epub = Epub::new(path)?;

    println!("\n📁 EPUB文件内容:");
    for (i, file) in epub.list_files()?.iter().enumerate() {
        println!("  {}. {}", i + 1, file);
    }

    if epub.mimetype_is_leading_and_stored()? {
        println!("  ✅ mimetype是第一个条目且未压缩");
    } else {
        println!("  ⚠️  mimetype不是第一个未压缩条目，部分阅读器可能无法识别");
    }

    println!("  📚 包文档路径: {}", epub.package_path()?);
    Ok(())
}
