use crate::gallery::controller::PageSize;
use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::{env, fmt};

/// Centralized server configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageConfig,
}

/// Upstream bucket location and credentials. Loaded once at startup.
#[derive(Clone, Default)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key.as_ref().map(|_| "<redacted>"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Read-only S3 bucket image gallery")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the listing and object endpoints
    Serve(ServeArgs),
    /// Browse a running gallery server from the terminal
    Browse(BrowseArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Host to bind to (overrides GALLERY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides GALLERY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Bucket to enumerate (overrides AWS_BUCKET_NAME)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Bucket region (overrides AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint URL (overrides AWS_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,
}

#[derive(Args, Debug)]
pub struct BrowseArgs {
    /// Base URL of the gallery server
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    pub server: String,

    /// Page to open, as if bookmarked
    #[arg(long)]
    pub page: Option<u32>,

    /// Items per page (16, 32, 64 or 128)
    #[arg(long, default_value = "16")]
    pub items_per_page: PageSize,

    /// External permalink for keys shaped `{author}/{post}/{file}`
    #[arg(long, default_value = "https://x.com/{author}/status/{post}")]
    pub permalink_template: String,
}

impl AppConfig {
    /// Merge CLI args over environment variables over defaults.
    pub fn from_env_and_args(args: ServeArgs) -> Result<Self> {
        Self::from_sources(args, |name| env::var(name).ok())
    }

    fn from_sources(args: ServeArgs, env_var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // --- Environment fallback ---
        let env_host = env_var("GALLERY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let env_port = match env_var("GALLERY_PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing GALLERY_PORT value `{}`", value))?,
            None => 3000,
        };

        let bucket = match args.bucket.or_else(|| env_var("AWS_BUCKET_NAME")) {
            Some(bucket) if !bucket.trim().is_empty() => bucket,
            _ => bail!("no bucket configured: pass --bucket or set AWS_BUCKET_NAME"),
        };

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage: StorageConfig {
                bucket,
                region: args.region.or_else(|| env_var("AWS_REGION")),
                endpoint: args.endpoint.or_else(|| env_var("AWS_ENDPOINT")),
                access_key: env_var("AWS_ACCESS_KEY_ID"),
                secret_key: env_var("AWS_SECRET_ACCESS_KEY"),
            },
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_with_bucket_from_env() {
        let cfg =
            AppConfig::from_sources(ServeArgs::default(), env_of(&[("AWS_BUCKET_NAME", "pics")]))
                .unwrap();

        assert_eq!(cfg.addr(), "0.0.0.0:3000");
        assert_eq!(cfg.storage.bucket, "pics");
        assert!(cfg.storage.endpoint.is_none());
    }

    #[test]
    fn test_args_override_env() {
        let args = ServeArgs {
            port: Some(8080),
            bucket: Some("cli-bucket".into()),
            endpoint: Some("http://localhost:9000".into()),
            ..Default::default()
        };
        let cfg = AppConfig::from_sources(
            args,
            env_of(&[
                ("GALLERY_PORT", "4000"),
                ("AWS_BUCKET_NAME", "env-bucket"),
                ("AWS_ENDPOINT", "http://env:9000"),
                ("AWS_REGION", "eu-west-1"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.storage.bucket, "cli-bucket");
        assert_eq!(cfg.storage.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(cfg.storage.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_missing_bucket_is_an_error() {
        let err = AppConfig::from_sources(ServeArgs::default(), env_of(&[])).unwrap_err();

        assert!(err.to_string().contains("no bucket configured"));
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let err = AppConfig::from_sources(
            ServeArgs::default(),
            env_of(&[("AWS_BUCKET_NAME", "pics"), ("GALLERY_PORT", "http")]),
        )
        .unwrap_err();

        assert!(err.to_string().contains("GALLERY_PORT"));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let storage = StorageConfig {
            bucket: "pics".into(),
            access_key: Some("AKIAEXAMPLE".into()),
            secret_key: Some("very-secret".into()),
            ..Default::default()
        };

        let rendered = format!("{:?}", storage);
        assert!(!rendered.contains("AKIAEXAMPLE"));
        assert!(!rendered.contains("very-secret"));
    }
}
