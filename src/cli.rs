use clap::{ArgAction, Args, Parser, Subcommand};
use url::Url;

use crate::config::{DEFAULT_INDEX_URL, DEFAULT_SITE_ROOT};
use crate::io::DEFAULT_MAX_BODY_BYTES;

#[derive(Parser, Debug)]
#[command(name = "aozora-collector")]
#[command(version)]
#[command(about = "Collect an author's works from the Aozora Bunko catalog as UTF-8 text", long_about = None)]
#[command(after_help = "Examples:\n  \
  aozora-collector crawl > works.txt            print every work of the default author\n  \
  aozora-collector list https://www.aozora.gr.jp/index_pages/person148.html\n  \
  aozora-collector extract -l 773_ruby_5968.zip  list members of a local archive")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More logging (-v debug, -vv trace)
    #[arg(short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30, global = true)]
    pub timeout: u64,

    /// Largest page or archive to download, in bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES, global = true)]
    pub max_body_size: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl an index page and print the text of every work
    Crawl(CrawlArgs),

    /// Crawl an index page and list works that have an archive, one per line
    List(CrawlArgs),

    /// Print the text inside a single archive
    Extract(ExtractArgs),
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Author index page
    #[arg(value_name = "INDEX_URL", default_value = DEFAULT_INDEX_URL, value_parser = parse_http_url)]
    pub index_url: Url,

    /// Site root that detail-page URLs are rebuilt on
    #[arg(long, value_name = "URL", default_value = DEFAULT_SITE_ROOT, value_parser = parse_http_url)]
    pub site_root: Url,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Archive path or HTTP URL
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// List members instead of printing text
    #[arg(short = 'l')]
    pub list: bool,
}

impl Cli {
    /// Log filter used when `RUST_LOG` is not set
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

impl ExtractArgs {
    pub fn is_http_url(&self) -> bool {
        self.archive.starts_with("http://") || self.archive.starts_with("https://")
    }
}

/// Accept only absolute http(s) URLs
pub fn parse_http_url(s: &str) -> Result<Url, String> {
    let url = Url::parse(s).map_err(|e| format!("{s}: {e}"))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        scheme => Err(format!("{s}: expected an http or https URL, got {scheme}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crawl_defaults_to_catalog_page() {
        let cli = Cli::try_parse_from(["aozora-collector", "crawl"]).unwrap();
        assert_eq!(cli.log_level(), "info");
        let Command::Crawl(args) = cli.command else {
            panic!("expected crawl");
        };
        assert_eq!(args.index_url.as_str(), DEFAULT_INDEX_URL);
        assert_eq!(args.site_root.as_str(), DEFAULT_SITE_ROOT);
    }

    #[test]
    fn index_url_must_be_http() {
        assert!(Cli::try_parse_from(["aozora-collector", "list", "ftp://example.com/x"]).is_err());
        assert!(Cli::try_parse_from(["aozora-collector", "list", "person148.html"]).is_err());
    }

    #[test]
    fn verbosity_flags() {
        let cli = Cli::try_parse_from(["aozora-collector", "-vv", "crawl"]).unwrap();
        assert_eq!(cli.log_level(), "trace");
        let cli = Cli::try_parse_from(["aozora-collector", "extract", "-q", "a.zip"]).unwrap();
        assert_eq!(cli.log_level(), "error");
        assert!(Cli::try_parse_from(["aozora-collector", "-v", "-q", "crawl"]).is_err());
    }

    #[test]
    fn extract_detects_urls() {
        let cli =
            Cli::try_parse_from(["aozora-collector", "extract", "https://x.example/a.zip"]).unwrap();
        let Command::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert!(args.is_http_url());
        assert!(!args.list);
    }
}
