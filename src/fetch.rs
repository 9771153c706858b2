use anyhow::{anyhow, Result};
use scraper::Html;

pub const BASE_URL: &str = "https://eldenring.wiki.fextralife.com";

pub async fn request_page(client: &reqwest::Client, url: &str) -> Result<Option<Html>> {
	let response = client
		.get(url)
		.header(reqwest::header::USER_AGENT, "reqwest/0.12.3 (rust)")
		.header(reqwest::header::REFERER, "https://eldenring.wiki.fextralife.com/")
		.send()
		.await?;

	log::debug!("Received status {} from {}", response.status(), url);

	if response.status() == reqwest::StatusCode::NOT_FOUND {
		return Ok(None);
	} else if !response.status().is_success() {
		return Err(anyhow!(
			"Failed to fetch URL: {} - Status: {}",
			url,
			response.status()
		));
	}

	let body = response.text().await?;
	Ok(Some(Html::parse_document(&body)))
}
