use crate::constants::DEFAULT_ROOT;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "img-shrink",
    about = "Incrementally recompress a directory of images in place",
    long_about = "img-shrink walks an image directory, recompresses only the files that changed since \
                  the last run, keeps a one-time '.original' backup of every file it touches and records \
                  what it did in a '.compression-metadata.json' ledger under the root.",
    version,
    after_help = "EXAMPLES:\n  \
    img-shrink run ./imgs\n  \
    img-shrink run ./imgs -q 80 -m 1920 -x 'raw/**'\n  \
    img-shrink status ./imgs\n  \
    img-shrink export ./imgs ./dist/imgs"
)]
pub struct Args {
    #[arg(long, global = true, help = "Only print errors")]
    pub quiet: bool,

    #[arg(short = 'v', long, global = true, help = "Print staleness reasons and timings")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ExcludeArgs {
    #[arg(
        short = 'x',
        long = "exclude",
        value_name = "GLOB",
        help = "Skip files whose root-relative path matches (repeatable)",
        long_help = "Glob matched against the '/'-separated path relative to the root. \
                     Backups and the ledger are always skipped."
    )]
    pub patterns: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Recompress changed images in place",
        long_about = "Recompress every image whose size or modification time differs from the ledger. \
                      Oversized images are scaled down so their longer side fits the maximum dimension."
    )]
    Run {
        #[arg(default_value = DEFAULT_ROOT, help = "Image root directory")]
        root: PathBuf,

        #[arg(
            short = 'q',
            long,
            help = "Encoding quality (1-100, default: 85)",
            long_help = "Lossy JPEG and WebP quality from 1 (lowest) to 100 (highest). \
                         PNG output stays lossless; quality only picks the oxipng effort: \
                         >=90 uses Zopfli, >=70 uses high compression, <70 uses standard compression."
        )]
        quality: Option<u8>,

        #[arg(
            short = 'm',
            long,
            value_name = "PX",
            help = "Maximum width or height in pixels (default: 2400)",
            long_help = "Images larger than this on either side are scaled down, preserving aspect ratio. \
                         Smaller images are never enlarged."
        )]
        max_dimension: Option<u32>,

        #[command(flatten)]
        exclude: ExcludeArgs,
    },

    #[command(
        about = "Show which images the next run would recompress",
        long_about = "Classify every image against the ledger without writing anything."
    )]
    Status {
        #[arg(default_value = DEFAULT_ROOT, help = "Image root directory")]
        root: PathBuf,

        #[command(flatten)]
        exclude: ExcludeArgs,
    },

    #[command(
        about = "Copy the image tree without backups or the ledger",
        long_about = "Copy every file under the root to a destination directory, leaving out \
                      '.original' backups and the compression ledger."
    )]
    Export {
        #[arg(help = "Image root directory")]
        root: PathBuf,

        #[arg(help = "Destination directory")]
        dest: PathBuf,
    },
}
