//! Newsdesk - a small multi-user news site

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsdesk::{
    cli::{Cli, Commands, CreateBlogArgs, CreateSuperuserArgs},
    config::Config,
    db::{self, DynDatabasePool},
    models::CreateUserInput,
    web::{self, AppState},
};

/// How often expired sessions are purged
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsdesk=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::load_with_env(&cli.config)
        .with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    let applied = db::migrations::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!("Applied {} database migrations", applied);
    }

    let result = match cli.command() {
        Commands::Serve => serve(pool.clone(), config).await,
        Commands::Migrate => {
            tracing::info!(
                "Database schema is at version {}",
                db::migrations::total_migrations()
            );
            Ok(())
        }
        Commands::CreateSuperuser(args) => create_superuser(pool.clone(), config, &args).await,
        Commands::CreateBlog(args) => create_blog(pool.clone(), config, &args).await,
    };

    pool.close().await;
    result
}

async fn serve(pool: DynDatabasePool, config: Config) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(pool, config)?;

    {
        let user_service = state.user_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                match user_service.cleanup_expired_sessions().await {
                    Ok(0) => {}
                    Ok(count) => tracing::info!("Removed {} expired sessions", count),
                    Err(e) => tracing::warn!("Session cleanup failed: {}", e),
                }
            }
        });
    }

    let app = web::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn create_superuser(pool: DynDatabasePool, config: Config, args: &CreateSuperuserArgs) -> Result<()> {
    let state = AppState::new(pool, config)?;

    let user = state
        .user_service
        .create_superuser(CreateUserInput {
            username: args.username.clone(),
            first_name: args.first_name.clone(),
            last_name: args.last_name.clone(),
            email: args.email.clone(),
            password: args.password.clone(),
            is_superuser: true,
        })
        .await?;

    println!("Superuser '{}' created (id {})", user.username, user.id);
    Ok(())
}

async fn create_blog(pool: DynDatabasePool, config: Config, args: &CreateBlogArgs) -> Result<()> {
    let state = AppState::new(pool, config)?;

    let blog = state.blog_service.create(&args.name).await?;

    println!("Blog '{}' created at {}", blog.name, blog.url());
    Ok(())
}
