use std::env;
use std::time::Duration;

use alioss::{Client, Config};
use alioss_core::{Context, OsEnv};
use alioss_http_send_reqwest::ReqwestHttpSend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Create a custom reqwest client with specific configuration
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(10)
        .user_agent("alioss-example/1.0")
        .build()?;

    // Credentials and region come from the ALIBABA_CLOUD_* env values.
    let ctx = Context::new()
        .with_env(OsEnv)
        .with_http_send(ReqwestHttpSend::new(http));
    let client = Client::with_context(Config::default(), ctx)?;
    println!("Using endpoint {}", client.endpoint());

    let Ok(name) = env::var("ALIOSS_BUCKET") else {
        let resp = client.get_service().await?;
        for bucket in resp.buckets {
            println!("{}\t{}", bucket.name, bucket.creation_date);
        }
        return Ok(());
    };

    let bucket = client.bucket(&name);
    let mut marker = String::new();
    loop {
        let page = bucket.list("", "/", &marker, 100).await?;
        for prefix in &page.common_prefixes {
            println!("{prefix}");
        }
        for key in &page.contents {
            println!("{}\t{}", key.key, key.size);
        }
        if !page.is_truncated {
            break;
        }
        marker = page.next_marker;
    }

    Ok(())
}
