use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::error;
use tokio::{sync::Semaphore, time::Duration};

// A 1-based inclusive index range wins over a plain limit when both are set
#[derive(Clone, Copy, Debug, Default)]
pub struct ScrapeScope {
	pub limit: Option<usize>,
	pub range: Option<(usize, usize)>,
}

impl ScrapeScope {
	pub fn apply(&self, links: Vec<String>) -> Vec<String> {
		if let Some((head, tail)) = self.range {
			if head >= 1 && tail >= head {
				let start = head - 1;
				if start >= links.len() {
					return Vec::new();
				}
				let end = tail.min(links.len());
				return links[start..end].to_vec();
			}
		}

		match self.limit {
			Some(limit) => links.into_iter().take(limit).collect(),
			None => links,
		}
	}
}

#[test]
fn test_scrape_scope() {
	let links: Vec<String> = (1..=4)
		.map(|index| format!("https://example.invalid/W{}", index))
		.collect();

	let scope = ScrapeScope::default();
	assert_eq!(scope.apply(links.clone()).len(), 4);

	let scope = ScrapeScope {
		limit: Some(2),
		range: None,
	};
	assert_eq!(scope.apply(links.clone()), links[..2].to_vec());

	let scope = ScrapeScope {
		limit: Some(99),
		range: None,
	};
	assert_eq!(scope.apply(links.clone()).len(), 4);

	// The range is 1-based and inclusive, and beats the limit
	let scope = ScrapeScope {
		limit: Some(1),
		range: Some((2, 3)),
	};
	assert_eq!(scope.apply(links.clone()), links[1..3].to_vec());

	let scope = ScrapeScope {
		limit: None,
		range: Some((2, 999)),
	};
	assert_eq!(scope.apply(links.clone()), links[1..].to_vec());

	let scope = ScrapeScope {
		limit: None,
		range: Some((9, 12)),
	};
	assert!(scope.apply(links.clone()).is_empty());

	// A malformed range falls back to the limit
	let scope = ScrapeScope {
		limit: Some(1),
		range: Some((0, 3)),
	};
	assert_eq!(scope.apply(links.clone()), links[..1].to_vec());

	let scope = ScrapeScope {
		limit: None,
		range: Some((3, 2)),
	};
	assert_eq!(scope.apply(links).len(), 4);
}

#[derive(Clone, Copy, Debug)]
pub struct BatchOptions {
	pub concurrent: usize,
	pub delay: Duration,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BatchSummary {
	pub attempted: usize,
	pub written: usize,
	pub skipped: usize,
	pub failed: usize,
}

pub fn progress_bar(len: u64) -> ProgressBar {
	let pb = ProgressBar::new(len);
	pb.set_style(
		ProgressStyle::default_bar()
			.template("{msg} {spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({eta_precise})")
			.expect("Failed to set progress bar style.")
			.progress_chars("##-"),
	);
	pb
}

// Fetches every page through a shared semaphore and hands finished records to
// the write callback as they complete. A failed page is logged and counted,
// never fatal for the batch.
pub async fn run_batch<R, F, Fut, W>(
	client: &reqwest::Client,
	links: Vec<String>,
	options: &BatchOptions,
	progress: &ProgressBar,
	scrape: F,
	mut write: W,
) -> BatchSummary
where
	F: Fn(reqwest::Client, String) -> Fut,
	Fut: Future<Output = Result<Option<R>>>,
	W: FnMut(&R) -> Result<()>,
{
	// Zero permits would park the batch forever
	let semaphore = Arc::new(Semaphore::new(options.concurrent.max(1)));
	let mut summary = BatchSummary {
		attempted: links.len(),
		..BatchSummary::default()
	};

	let mut futures: FuturesUnordered<_> = links
		.into_iter()
		.map(|url| {
			let semaphore = Arc::clone(&semaphore);
			let fut = scrape(client.clone(), url.clone());
			let delay = options.delay;

			Box::pin(async move {
				let _permit = semaphore
					.acquire()
					.await
					.expect("Failed to acquire semaphore");

				let result = fut.await;
				tokio::time::sleep(delay).await;
				(url, result)
			})
		})
		.collect();

	while let Some((url, result)) = futures.next().await {
		match result {
			Ok(Some(record)) => match write(&record) {
				Ok(()) => summary.written += 1,
				Err(e) => {
					error!("f: run_batch | Error writing record for {}: {}", url, e);
					summary.failed += 1;
				}
			},
			Ok(None) => summary.skipped += 1,
			Err(e) => {
				error!("f: run_batch | Error scraping {}: {}", url, e);
				summary.failed += 1;
			}
		}
		progress.inc(1);
	}

	summary
}

#[tokio::test]
async fn test_run_batch_empty() {
	let client = reqwest::Client::new();
	let options = BatchOptions {
		concurrent: 1,
		delay: Duration::from_millis(0),
	};
	let progress = ProgressBar::hidden();

	let mut written: Vec<String> = Vec::new();
	let summary = run_batch(
		&client,
		Vec::new(),
		&options,
		&progress,
		|_, url: String| async move { Ok(Some(url)) },
		|record: &String| {
			written.push(record.clone());
			Ok(())
		},
	)
	.await;

	assert_eq!(summary.attempted, 0);
	assert_eq!(summary.written, 0);
	assert_eq!(summary.skipped, 0);
	assert_eq!(summary.failed, 0);
	assert!(written.is_empty());
}

#[tokio::test]
async fn test_run_batch_counts() {
	let client = reqwest::Client::new();
	let options = BatchOptions {
		concurrent: 1,
		delay: Duration::from_millis(0),
	};
	let progress = ProgressBar::hidden();

	let links: Vec<String> = [
		"https://example.invalid/Greatsword",
		"https://example.invalid/Missing",
		"https://example.invalid/Broken",
		"https://example.invalid/Unwritable",
	]
	.iter()
	.map(|url| url.to_string())
	.collect();

	// A missed page skips, a failed fetch and a failed write both count as
	// failures, and only clean records reach the sink
	let mut written: Vec<String> = Vec::new();
	let summary = run_batch(
		&client,
		links,
		&options,
		&progress,
		|_, url: String| async move {
			if url.ends_with("Missing") {
				Ok(None)
			} else if url.ends_with("Broken") {
				Err(anyhow::anyhow!("status 500"))
			} else {
				Ok(Some(url))
			}
		},
		|record: &String| {
			if record.ends_with("Unwritable") {
				return Err(anyhow::anyhow!("no space left"));
			}
			written.push(record.clone());
			Ok(())
		},
	)
	.await;

	assert_eq!(summary.attempted, 4);
	assert_eq!(summary.written, 1);
	assert_eq!(summary.skipped, 1);
	assert_eq!(summary.failed, 2);
	assert_eq!(written, vec!["https://example.invalid/Greatsword"]);
}

#[tokio::test]
async fn test_run_batch_zero_concurrency() {
	let client = reqwest::Client::new();
	let options = BatchOptions {
		concurrent: 0,
		delay: Duration::from_millis(0),
	};
	let progress = ProgressBar::hidden();

	let links: Vec<String> = (1..=3)
		.map(|index| format!("https://example.invalid/W{}", index))
		.collect();

	let mut count = 0usize;
	let summary = tokio::time::timeout(
		Duration::from_secs(5),
		run_batch(
			&client,
			links,
			&options,
			&progress,
			|_, url: String| async move { Ok(Some(url)) },
			|_record: &String| {
				count += 1;
				Ok(())
			},
		),
	)
	.await
	.expect("Batch with zero permits never finished");

	assert_eq!(summary.attempted, 3);
	assert_eq!(summary.written, 3);
	assert_eq!(summary.skipped, 0);
	assert_eq!(summary.failed, 0);
	assert_eq!(count, 3);
}
