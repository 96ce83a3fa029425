//! Fetch sources, compose the prompt and print the generated script (no audio).

use std::sync::Arc;

use daily_briefing::{Pipeline, PodcastConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    daily_briefing::init_tracing();

    let config = Arc::new(PodcastConfig::from_env()?);
    let pipeline = Pipeline::from_config(config)?;

    let today = chrono::Local::now().date_naive();
    match pipeline.write_script(today).await {
        Ok((prompt, script)) => {
            tracing::info!(kind = ?prompt.kind(), chars = script.char_count(), "script ready");
            println!("{}", script.as_str());
            Ok(())
        }
        Err(e) => {
            eprintln!("script generation failed ({}): {e}", e.kind().as_str());
            std::process::exit(1);
        }
    }
}
