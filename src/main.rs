//! Demo: signs a user up against the in-process backend, seeds a few links and clicks,
//! prints the dashboard and logs out again.

use clap::Parser;
use std::time::Duration;
use tracing::{error, info, Instrument};
use url_trimmer::config::AppConfig;
use url_trimmer::gate::Gated;
use url_trimmer::lifecycle::tracing::setup_tracing;
use url_trimmer::lifecycle::TrimmerApp;
use url_trimmer::model::{NewLink, ProfilePicture, SignUpFields};

#[derive(Parser)]
#[command(name = "url-trimmer")]
#[command(about = "Runs the URL trimmer dashboard against an in-process backend")]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long, default_value = "url-trimmer.json")]
    config: String,

    #[arg(long, env = "TRIMMER_USERNAME", default_value = "Alice Liddell")]
    username: String,

    #[arg(long, env = "TRIMMER_EMAIL", default_value = "alice@example.com")]
    email: String,

    #[arg(long, env = "TRIMMER_PASSWORD", default_value = "rabbit-hole")]
    password: String,

    /// Title filter applied to the dashboard
    #[arg(short, long, env = "TRIMMER_FILTER")]
    filter: Option<String>,
}

const SEED_LINKS: [(&str, &str, usize); 3] = [
    ("Rust docs", "https://doc.rust-lang.org", 3),
    ("Tokio tutorial", "https://tokio.rs/tokio/tutorial", 1),
    ("Crates index", "https://crates.io", 0),
];

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config).map_err(|e| e.to_string())?;
    info!(?config, "Starting url-trimmer");
    let app = TrimmerApp::new(config);

    let fields = SignUpFields {
        username: cli.username,
        email: cli.email,
        password: cli.password,
        profile_pic: Some(ProfilePicture {
            file_name: "avatar.png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }),
    };

    let span = tracing::info_span!("sign_up");
    let principal = async {
        app.auth
            .sign_up(fields, None)
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("seed");
    async {
        for (title, url, clicks) in SEED_LINKS {
            let link = app
                .backend
                .create_link(
                    principal.id.clone(),
                    NewLink {
                        title: title.to_string(),
                        original_url: url.to_string(),
                    },
                )
                .await?;
            for _ in 0..clicks {
                app.backend.record_click(link.id.clone()).await?;
            }
        }
        Ok::<_, url_trimmer::backend::BackendError>(())
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    let dashboard = app.dashboard();
    let mut session = app.session.subscribe();
    let gated = app
        .gate
        .guard(&mut session, || dashboard.subscribe())
        .await
        .map_err(|e| e.to_string())?;

    match gated {
        Gated::Content(mut watch) => {
            // Links may have been seeded after the first load
            dashboard.refresh();
            let snapshot = tokio::time::timeout(
                Duration::from_secs(5),
                watch.wait_for(|s| !s.loading && s.view.totals.link_count == SEED_LINKS.len()),
            )
            .await
            .map_err(|_| "Timed out loading the dashboard".to_string())?
            .map_err(|e| e.to_string())?;
            info!(
                link_count = snapshot.view.totals.link_count,
                click_count = snapshot.view.totals.click_count,
                "Dashboard loaded"
            );

            let snapshot = match cli.filter {
                Some(filter) => {
                    dashboard.set_filter_text(filter.clone());
                    watch
                        .wait_for(|s| s.view.filter_text == filter)
                        .await
                        .map_err(|e| e.to_string())?
                }
                None => snapshot,
            };
            let json = serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())?;
            println!("{json}");
        }
        Gated::Redirected(route) => error!(path = %route.path(), "Dashboard redirected"),
        Gated::Placeholder => error!("Dashboard still loading"),
    }
    drop(dashboard);

    let span = tracing::info_span!("logout");
    async { app.auth.logout().await.map_err(|e| e.to_string()) }
        .instrument(span)
        .await?;

    app.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
