// csv is shared with the converter binary; each side uses a subset
#[allow(dead_code)]
mod csv;
mod driver;
mod extract;
mod fetch;
mod links;
mod requirements;
mod spells;
mod weapons;

use anyhow::Result;
use clap::Parser;
use tokio::{fs, time::Duration};

use crate::csv::{CsvSink, Record};
use crate::driver::{progress_bar, run_batch, BatchOptions, ScrapeScope};

const SPELLS_CSV_PATH: &str = "output/spells.csv";
const WEAPONS_CSV_PATH: &str = "output/weapons.csv";
const REQUIREMENTS_MD_PATH: &str = "output/weapon_requirements.md";

#[derive(Parser, Debug)]
#[clap(about, version, author)]
struct Args {
	#[clap(short, long)]
	spells: bool,

	#[clap(short, long)]
	weapons: bool,

	#[clap(short, long)]
	requirements: bool,

	#[arg(long)]
	recalculate: bool,

	#[arg(long)]
	sort: bool,

	#[arg(short, long)]
	limit: Option<usize>,

	#[arg(long)]
	head: Option<usize>,

	#[arg(long)]
	tail: Option<usize>,

	#[arg(short, long, default_value_t = 1)]
	concurrent: usize,

	#[arg(short, long, default_value_t = 50)]
	delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
	if pretty_env_logger::try_init().is_err() {
		log::warn!("Logger is already initialized.");
	}

	let args = Args::parse();
	let scope = ScrapeScope {
		limit: args.limit,
		range: args.head.zip(args.tail),
	};
	let options = BatchOptions {
		concurrent: args.concurrent,
		delay: Duration::from_millis(args.delay_ms),
	};

	fs::create_dir_all("output").await?;
	let client = reqwest::Client::new();

	if args.spells {
		scrape_spells(&client, &scope, &options).await?;
	}

	if args.weapons {
		scrape_weapons(&client, &scope, &options).await?;
	}

	if args.requirements {
		scrape_weapon_requirements(&client, &scope, &options).await?;
	}

	if args.recalculate {
		let content = fs::read_to_string(REQUIREMENTS_MD_PATH).await?;
		fs::write(
			REQUIREMENTS_MD_PATH,
			requirements::recalculate_totals(&content),
		)
		.await?;
		log::info!("Recalculated totals in {}", REQUIREMENTS_MD_PATH);
	}

	if args.sort {
		let content = fs::read_to_string(REQUIREMENTS_MD_PATH).await?;
		fs::write(REQUIREMENTS_MD_PATH, requirements::sort_by_total(&content)).await?;
		log::info!("Sorted {} by total requirements", REQUIREMENTS_MD_PATH);
	}

	Ok(())
}

async fn scrape_spells(
	client: &reqwest::Client,
	scope: &ScrapeScope,
	options: &BatchOptions,
) -> Result<()> {
	// A listing that cannot be fetched is an empty listing, not a crash
	let spell_links = match fetch::request_page(client, links::SPELLS_LISTING_URL).await {
		Ok(Some(listing)) => scope.apply(links::spell_links(&listing)),
		Ok(None) => {
			log::warn!("Spell listing page not found: {}", links::SPELLS_LISTING_URL);
			Vec::new()
		}
		Err(e) => {
			log::error!(
				"f: scrape_spells | Error fetching {}: {}",
				links::SPELLS_LISTING_URL,
				e
			);
			Vec::new()
		}
	};
	if spell_links.is_empty() {
		log::error!("No spell links to process based on the specified criteria.");
		return Ok(());
	}
	log::info!("Found {} spell pages to scrape.", spell_links.len());

	let mut sink = CsvSink::create(SPELLS_CSV_PATH, spells::SpellRecord::headers())?;

	let progress = progress_bar(spell_links.len() as u64);
	progress.set_message("Scraping spells");

	let summary = run_batch(
		client,
		spell_links,
		options,
		&progress,
		spells::scrape_spell,
		|record| sink.append(&record.values()),
	)
	.await;

	progress.finish_with_message(format!("Done! - Spells written: {}", summary.written));
	log::info!(
		"Spells finished: {} attempted, {} written, {} skipped, {} failed. Data saved to {}",
		summary.attempted,
		summary.written,
		summary.skipped,
		summary.failed,
		SPELLS_CSV_PATH
	);

	Ok(())
}

async fn scrape_weapons(
	client: &reqwest::Client,
	scope: &ScrapeScope,
	options: &BatchOptions,
) -> Result<()> {
	let weapon_links = match fetch::request_page(client, links::WEAPONS_LISTING_URL).await {
		Ok(Some(listing)) => scope.apply(links::weapon_links(&listing)),
		Ok(None) => {
			log::warn!("Weapon listing page not found: {}", links::WEAPONS_LISTING_URL);
			Vec::new()
		}
		Err(e) => {
			log::error!(
				"f: scrape_weapons | Error fetching {}: {}",
				links::WEAPONS_LISTING_URL,
				e
			);
			Vec::new()
		}
	};
	if weapon_links.is_empty() {
		log::error!("No weapon links to process based on the specified criteria.");
		return Ok(());
	}
	log::info!("Found {} weapon pages to scrape.", weapon_links.len());

	let mut sink = CsvSink::create(WEAPONS_CSV_PATH, weapons::WeaponRecord::headers())?;

	let progress = progress_bar(weapon_links.len() as u64);
	progress.set_message("Scraping weapons");

	let summary = run_batch(
		client,
		weapon_links,
		options,
		&progress,
		weapons::scrape_weapon,
		|record| sink.append(&record.values()),
	)
	.await;

	progress.finish_with_message(format!("Done! - Weapons written: {}", summary.written));
	log::info!(
		"Weapons finished: {} attempted, {} written, {} skipped, {} failed. Data saved to {}",
		summary.attempted,
		summary.written,
		summary.skipped,
		summary.failed,
		WEAPONS_CSV_PATH
	);

	Ok(())
}

async fn scrape_weapon_requirements(
	client: &reqwest::Client,
	scope: &ScrapeScope,
	options: &BatchOptions,
) -> Result<()> {
	let weapon_links = match fetch::request_page(client, links::WEAPONS_LISTING_URL).await {
		Ok(Some(listing)) => scope.apply(links::weapon_links(&listing)),
		Ok(None) => {
			log::warn!("Weapon listing page not found: {}", links::WEAPONS_LISTING_URL);
			Vec::new()
		}
		Err(e) => {
			log::error!(
				"f: scrape_weapon_requirements | Error fetching {}: {}",
				links::WEAPONS_LISTING_URL,
				e
			);
			Vec::new()
		}
	};
	if weapon_links.is_empty() {
		log::error!("No weapon links to process based on the specified criteria.");
		return Ok(());
	}
	log::info!("Found {} weapon pages to check.", weapon_links.len());

	let mut lines: Vec<String> = Vec::new();

	let progress = progress_bar(weapon_links.len() as u64);
	progress.set_message("Scraping weapon requirements");

	let summary = run_batch(
		client,
		weapon_links,
		options,
		&progress,
		requirements::scrape_requirements,
		|entry| {
			lines.push(entry.checklist_line());
			Ok(())
		},
	)
	.await;

	progress.finish_with_message(format!(
		"Done! - Weapons with requirements: {}",
		summary.written
	));

	let mut content = lines.join("\n");
	if !content.is_empty() {
		content.push('\n');
	}
	fs::write(REQUIREMENTS_MD_PATH, content).await?;
	log::info!(
		"Requirements finished: {} attempted, {} written, {} skipped, {} failed. Results written to {}",
		summary.attempted,
		summary.written,
		summary.skipped,
		summary.failed,
		REQUIREMENTS_MD_PATH
	);

	Ok(())
}
