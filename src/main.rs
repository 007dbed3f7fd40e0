//! Command-line entry point: resolve video links and render the page model.

use academy_site::{load_page, resolve_embed_url, RestContentStore, SiteConfig, VideoPlatform};
use content_client::{Review, Table, Teacher};
use site_core::{video_badge, VideoFieldStatus};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "usage:
  academy-site resolve <youtube|vk> <link or iframe code>
  academy-site page
  academy-site audit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("resolve") => {
            let (Some(platform), Some(input)) = (args.get(1), args.get(2)) else {
                anyhow::bail!(USAGE);
            };
            let resolution = resolve_embed_url(input, &VideoPlatform::from_tag(platform));
            println!("{}", serde_json::to_string_pretty(&resolution)?);
        }
        Some("page") => {
            let store = connect()?;
            let page = load_page(&store).await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Some("audit") => {
            let store = connect()?;
            let teachers = Table::<Teacher>::list(&store).await?;
            let reviews = Table::<Review>::list(&store).await?;

            let rows = teachers
                .iter()
                .map(|t| (format!("teacher {}", t.name), t.video_reference()))
                .chain(reviews.iter().map(|r| (format!("review {}", r.id), r.video_reference())));

            let mut broken = 0;
            for (label, reference) in rows {
                if let VideoFieldStatus::Invalid { error } = video_badge(&reference) {
                    broken += 1;
                    println!("{}: {}", label, error);
                }
            }
            info!(teachers = teachers.len(), reviews = reviews.len(), broken, "audit finished");
            if broken > 0 {
                anyhow::bail!("{} stored video link(s) cannot be embedded", broken);
            }
        }
        _ => anyhow::bail!(USAGE),
    }

    Ok(())
}

fn connect() -> anyhow::Result<RestContentStore> {
    let cfg = SiteConfig::load()?;
    let client = cfg.client_config()?;
    info!(url = %client.base(), "connecting to content backend");
    Ok(RestContentStore::new(client)?)
}
