use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "watchlist", about = "A personal movie watchlist")]
pub struct Args {
    #[arg(
        long,
        env = "WATCHLIST_DATABASE",
        default_value = "data.sled",
        help = "Path of the sled database directory"
    )]
    pub database: PathBuf,

    #[arg(long, env = "WATCHLIST_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,

    #[arg(
        long,
        env = "WATCHLIST_SECRET_KEY",
        hide_env_values = true,
        help = "Session signing key, at least 64 bytes"
    )]
    pub secret_key: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the web server (the default)
    Serve,
    /// Initialize the database
    Initdb {
        #[arg(long, help = "Erase all movies and the admin first")]
        drop: bool,
    },
    /// Generate fake data
    Forge {
        #[arg(long, default_value = "Jeffrey", help = "Display name for the admin")]
        name: String,
    },
    /// Create or update the admin account
    Admin {
        #[arg(long)]
        username: Option<String>,

        #[arg(
            long,
            env = "WATCHLIST_ADMIN_PASSWORD",
            hide_env_values = true,
            help = "Admin password; without this or WATCHLIST_ADMIN_PASSWORD \
                    the password is prompted for and echoed"
        )]
        password: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands() {
        let args = Args::parse_from(["watchlist", "--database", "/tmp/w", "initdb", "--drop"]);
        assert_eq!(args.database, PathBuf::from("/tmp/w"));
        assert!(matches!(args.command, Some(Command::Initdb { drop: true })));

        let args = Args::parse_from(["watchlist", "forge"]);
        match args.command {
            Some(Command::Forge { name }) => assert_eq!(name, "Jeffrey"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn admin_options() {
        let args = Args::parse_from([
            "watchlist",
            "admin",
            "--username",
            "admin",
            "--password",
            "secret",
        ]);
        match args.command {
            Some(Command::Admin { username, password }) => {
                assert_eq!(username.as_deref(), Some("admin"));
                assert_eq!(password.as_deref(), Some("secret"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn password_help_mentions_echo() {
        use clap::CommandFactory;
        let command = Args::command();
        let admin = command.find_subcommand("admin").unwrap();
        let password = admin
            .get_arguments()
            .find(|arg| arg.get_id() == "password")
            .unwrap();
        let help = password.get_help().unwrap().to_string();
        assert!(help.contains("WATCHLIST_ADMIN_PASSWORD"));
        assert!(help.contains("echoed"));
    }
}
