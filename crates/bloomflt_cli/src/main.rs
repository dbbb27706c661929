use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use bloomflt_core::{
    file::{load_file_as, save_file_as},
    Config, Encoding, Filter,
};

#[derive(Parser)]
#[command(name = "bloomflt", about = "bloomflt CLI — build, query and fold filter files")]
struct Cli {
    /// JSON config with compression level, load factor and encoding defaults
    #[arg(long, global = true, default_value = "bloomflt.json")]
    config: PathBuf,

    /// Read and write the headerless legacy encoding
    #[arg(long, global = true, default_value_t = false)]
    raw: bool,

    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    Create {
        #[arg(long)]
        path: PathBuf,
        /// Capacity in bits (rounded down to a multiple of 8)
        #[arg(long)]
        bits: u64,
    },

    Add {
        #[arg(long)]
        path: PathBuf,
        /// Treat values as hex-encoded bytes
        #[arg(long, default_value_t = false)]
        hex: bool,
        #[arg(required = true)]
        values: Vec<String>,
    },

    Test {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, default_value_t = false)]
        hex: bool,
        /// Fold factor applied while loading
        #[arg(long)]
        factor: Option<usize>,
        #[arg(required = true)]
        values: Vec<String>,
    },

    Fold {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        factor: usize,
        /// Write the folded filter here instead of replacing the input
        #[arg(long)]
        out: Option<PathBuf>,
    },

    Info {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        factor: Option<usize>,
    },
}

struct Ctx {
    cfg: Config,
    encoding: Encoding,
}

impl Ctx {
    fn load(&self, path: &Path, factor: usize) -> Result<Filter> {
        load_file_as(path, self.encoding, factor)
            .with_context(|| format!("loading {}", path.display()))
    }

    fn save(&self, filter: &Filter, path: &Path) -> Result<()> {
        save_file_as(filter, path, self.encoding, &self.cfg.save_options())
            .with_context(|| format!("saving {}", path.display()))
    }
}

fn decode_value(value: &str, hex: bool) -> Result<Vec<u8>> {
    if hex {
        hex::decode(value).map_err(|e| anyhow!("bad hex {value:?}: {e}"))
    } else {
        Ok(value.as_bytes().to_vec())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let cfg = Config::load(&cli.config)?;
    let encoding = if cli.raw { Encoding::Raw } else { cfg.encoding };
    let ctx = Ctx { cfg, encoding };

    match cli.cmd {
        Cmd::Create { path, bits } => {
            let f = Filter::new(bits)?;
            ctx.save(&f, &path)?;
            info!(path = %path.display(), size = f.size(), "created filter");
            println!("created: {} ({} bytes)", path.display(), f.size());
        }
        Cmd::Add { path, hex, values } => {
            let mut f = ctx.load(&path, 1)?;
            for v in &values {
                let bytes = decode_value(v, hex)?;
                f.add(&bytes);
            }
            ctx.save(&f, &path)?;
            println!("added: {}", values.len());
        }
        Cmd::Test { path, hex, factor, values } => {
            let f = ctx.load(&path, factor.unwrap_or(ctx.cfg.load_factor))?;
            for v in &values {
                let bytes = decode_value(v, hex)?;
                println!("{v}\t{}", f.test(&bytes));
            }
        }
        Cmd::Fold { path, factor, out } => {
            let mut f = ctx.load(&path, 1)?;
            let before = f.size();
            f.fold(factor)?;
            let dst = out.unwrap_or_else(|| path.clone());
            ctx.save(&f, &dst)?;
            println!("fold: {} -> {} bytes, wrote {}", before, f.size(), dst.display());
        }
        Cmd::Info { path, factor } => {
            let f = ctx.load(&path, factor.unwrap_or(ctx.cfg.load_factor))?;
            println!("size     : {} bytes", f.size());
            println!("capacity : {} bits", f.capacity_bits());
            println!("set bits : {}", f.count_ones());
            println!("fill≈fp  : {:.6}", f.fill_ratio());
        }
    }
    Ok(())
}
