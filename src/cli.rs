use clap::Parser;

use crate::epub::ExtractOptions;
use crate::zip::Compression;

#[derive(Parser, Debug)]
#[command(name = "epub2image")]
#[command(version)]
#[command(about = "Extract the images of EPUB files in reading order", long_about = None)]
#[command(after_help = "Examples:\n  \
  epub2image novel.epub              write novel.epub_images.zip\n  \
  epub2image -d out a.epub b.epub    convert both into the out directory\n  \
  epub2image -l novel.epub           show the naming plan only\n  \
  epub2image -p https://example.com/novel.epub > images.zip")]
pub struct Cli {
    /// EPUB file paths or HTTP URLs
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<String>,

    /// List the images that would be written (name <- source), write nothing
    #[arg(short = 'l')]
    pub list: bool,

    /// Write the archive to stdout, no messages (single input only)
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Write archives into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Never overwrite existing archives
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite archives WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Deflate archive entries instead of storing them
    #[arg(short = 'z')]
    pub deflate: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Verbose logging (-vv => debug, -vvv => trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.is_very_quiet() {
            return "off";
        }
        match self.verbose {
            0 if self.quiet > 0 => "error",
            0 => "warn",
            1 => "epub2image=info,warn",
            2 => "epub2image=debug,warn",
            _ => "epub2image=trace,info",
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            compression: if self.deflate {
                Compression::Deflate
            } else {
                Compression::Stored
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from(["epub2image", "-z", "-d", "out", "-vv", "a.epub", "b.epub"])
            .unwrap();
        assert_eq!(cli.inputs, ["a.epub", "b.epub"]);
        assert_eq!(cli.output_dir.as_deref(), Some("out"));
        assert_eq!(cli.extract_options().compression, Compression::Deflate);
        assert_eq!(cli.log_filter(), "epub2image=debug,warn");
    }

    #[test]
    fn test_requires_input() {
        assert!(Cli::try_parse_from(["epub2image"]).is_err());
    }

    #[test]
    fn test_pipe_is_quiet() {
        let cli = Cli::try_parse_from(["epub2image", "-p", "a.epub"]).unwrap();
        assert!(cli.is_quiet());
        assert_eq!(cli.extract_options().compression, Compression::Stored);
    }
}
