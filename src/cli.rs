//! Command line interface

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "config.yml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Run the web server (default)
    Serve,

    /// Apply pending database migrations and exit
    Migrate,

    /// Create a user allowed to publish articles
    CreateSuperuser(CreateSuperuserArgs),

    /// Create a blog
    CreateBlog(CreateBlogArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CreateSuperuserArgs {
    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub password: String,

    #[arg(long, default_value = "")]
    pub email: String,

    #[arg(long, default_value = "")]
    pub first_name: String,

    #[arg(long, default_value = "")]
    pub last_name: String,
}

#[derive(Debug, Clone, Args)]
pub struct CreateBlogArgs {
    /// Blog name, at most 50 characters
    #[arg(long)]
    pub name: String,
}

impl Cli {
    /// The subcommand to run; no subcommand means `serve`
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_serve() {
        let cli = Cli::try_parse_from(["newsdesk"]).unwrap();

        assert!(matches!(cli.command(), Commands::Serve));
        assert_eq!(cli.config, PathBuf::from("config.yml"));
    }

    #[test]
    fn test_config_after_subcommand() {
        let cli = Cli::try_parse_from(["newsdesk", "serve", "--config", "prod.yml"]).unwrap();

        assert_eq!(cli.config, PathBuf::from("prod.yml"));
    }

    #[test]
    fn test_create_superuser_args() {
        let cli = Cli::try_parse_from([
            "newsdesk",
            "create-superuser",
            "--username",
            "admin",
            "--password",
            "secret",
            "--first-name",
            "Анна",
        ])
        .unwrap();

        match cli.command() {
            Commands::CreateSuperuser(args) => {
                assert_eq!(args.username, "admin");
                assert_eq!(args.password, "secret");
                assert_eq!(args.first_name, "Анна");
                assert_eq!(args.email, "");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_create_superuser_requires_password() {
        assert!(Cli::try_parse_from(["newsdesk", "create-superuser", "--username", "admin"]).is_err());
    }

    #[test]
    fn test_create_blog_args() {
        let cli = Cli::try_parse_from(["newsdesk", "create-blog", "--name", "Спорт"]).unwrap();

        assert!(matches!(cli.command(), Commands::CreateBlog(args) if args.name == "Спорт"));
    }
}
