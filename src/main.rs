mod db;
mod fetch;
mod pipeline;
mod settings;
mod source;
mod transform;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};

use settings::{Overrides, Settings};
use source::SourceFormat;

#[derive(Parser)]
#[command(
    name = "alar_builder",
    about = "Build a local SQLite dictionary from the Alar dataset",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    build: BuildArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the dataset and write the SQLite store (default)
    Build(BuildArgs),
    /// Print the stored meaning of a word
    Lookup {
        word: String,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Show how many entries the store holds
    Stats {
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// Dataset URL
    #[arg(long)]
    url: Option<String>,
    /// Source format (default: inferred from the URL)
    #[arg(long, value_enum)]
    format: Option<SourceFormat>,
    #[command(flatten)]
    store: StoreArgs,
}

#[derive(Args)]
struct StoreArgs {
    /// Output directory
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Database file name inside the output directory
    #[arg(long)]
    db_file: Option<String>,
}

impl From<BuildArgs> for Overrides {
    fn from(args: BuildArgs) -> Self {
        Self {
            url: args.url,
            format: args.format,
            ..args.store.into()
        }
    }
}

impl From<StoreArgs> for Overrides {
    fn from(args: StoreArgs) -> Self {
        Self {
            out_dir: args.out_dir,
            db_file: args.db_file,
            ..Self::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Commands::Build(cli.build)) {
        Commands::Build(args) => {
            let settings = Settings::load(args.into())?;
            let summary = pipeline::run(&settings).await?;
            let skipped = summary.stats.seen - summary.stats.kept;
            if skipped > 0 {
                println!("Skipped {} entries without a headword or meaning.", skipped);
            }
            println!("Done. Inserted {} entries.", summary.inserted);
            println!("Dictionary created at: {}", summary.db_path.display());
            Ok(())
        }
        Commands::Lookup { word, store } => {
            let settings = Settings::load(store.into())?;
            let conn = db::open_readonly(&settings.db_path())?;
            match db::lookup(&conn, &word)? {
                Some(entry) => println!("{} [{}]: {}", entry.word, entry.key, entry.meaning),
                None => println!("No entry for {:?}.", word.trim()),
            }
            Ok(())
        }
        Commands::Stats { store } => {
            let settings = Settings::load(store.into())?;
            let path = settings.db_path();
            let conn = db::open_readonly(&path)?;
            println!("Store:   {}", path.display());
            println!("Entries: {}", db::count_entries(&conn)?);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_builds_with_defaults() {
        let cli = Cli::try_parse_from(["alar_builder"]).unwrap();
        assert!(cli.command.is_none());
        let o: Overrides = cli.build.into();
        assert!(o.url.is_none() && o.out_dir.is_none() && o.db_file.is_none());
    }

    #[test]
    fn top_level_flags_feed_the_default_build() {
        let cli = Cli::try_parse_from([
            "alar_builder",
            "--url",
            "https://mirror.example/alar.json",
            "--out-dir",
            "out",
        ])
        .unwrap();
        let o: Overrides = cli.build.into();
        assert_eq!(o.url.as_deref(), Some("https://mirror.example/alar.json"));
        assert_eq!(o.out_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn lookup_subcommand_parses() {
        let cli = Cli::try_parse_from([
            "alar_builder",
            "lookup",
            "Namaste",
            "--db-file",
            "kn.sqlite",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Lookup { word, store }) => {
                assert_eq!(word, "Namaste");
                assert_eq!(store.db_file.as_deref(), Some("kn.sqlite"));
            }
            _ => panic!("expected lookup"),
        }
    }

    #[test]
    fn format_flag_accepts_json() {
        let cli = Cli::try_parse_from(["alar_builder", "build", "--format", "json"]).unwrap();
        match cli.command {
            Some(Commands::Build(args)) => assert_eq!(args.format, Some(SourceFormat::Json)),
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn durations_format_like_clocks() {
        use std::time::Duration;
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
