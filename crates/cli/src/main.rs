use anyhow::Context;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bookshelf-cli", version, about = "Operate the bookshelf service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply migrations and serve the HTTP API
    Serve {
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply pending database migrations and exit
    Migrate,
    /// Print every documented route
    Routes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            bookshelf_app::bootstrap::serve(&settings).await
        }
        Command::Migrate => {
            let applied = bookshelf_app::bootstrap::migrate(&settings).await?;
            println!("applied {applied} migration(s)");
            Ok(())
        }
        Command::Routes => {
            for (method, path) in bookshelf_app::bootstrap::route_table(&settings)? {
                println!("{method:<7} {path}");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_accepts_port_override() {
        let cli = Cli::try_parse_from(["bookshelf-cli", "serve", "--port", "9000"]).unwrap();
        assert!(matches!(cli.command, Command::Serve { port: Some(9000) }));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["bookshelf-cli"]).is_err());
    }

    #[test]
    fn routes_and_migrate_parse() {
        assert!(matches!(
            Cli::try_parse_from(["bookshelf-cli", "routes"]).unwrap().command,
            Command::Routes
        ));
        assert!(matches!(
            Cli::try_parse_from(["bookshelf-cli", "migrate"]).unwrap().command,
            Command::Migrate
        ));
    }
}
