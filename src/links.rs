use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;

use crate::fetch::BASE_URL;

pub const WEAPONS_LISTING_URL: &str = "https://eldenring.wiki.fextralife.com/Weapons";
pub const SPELLS_LISTING_URL: &str = "https://eldenring.wiki.fextralife.com/Magic+Spells";

// Listing Selectors
static LISTING_LINK_SELECTOR: Lazy<Selector> =
	Lazy::new(|| Selector::parse("#wiki-content-block a.wiki_link.wiki_tooltip").unwrap());
static TABLE_LINK_SELECTOR: Lazy<Selector> =
	Lazy::new(|| Selector::parse("#wiki-content-block .wiki_table a.wiki_link").unwrap());

// Item pages are a single root-relative segment of name characters
static DETAIL_PATH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/[A-Za-z0-9'()+_-]+$").unwrap());

// Index, category and mechanics pages linked from the weapons listing with
// the same markup as the weapons themselves
const NON_ITEM_PATHS: [&str; 30] = [
	"/Weapons",
	"/Shields",
	"/Armor",
	"/Talismans",
	"/Ashes+of+War",
	"/Spells",
	"/Incantations",
	"/Sorceries",
	"/Consumables",
	"/Crafting",
	"/Map",
	"/Bosses",
	"/Walkthrough",
	"/New+Game+Plus",
	"/Game+Progress+Route",
	"/Side+Quests",
	"/Endings",
	"/Upgrades",
	"/Strength",
	"/Dexterity",
	"/Intelligence",
	"/Faith",
	"/Arcane",
	"/Combat+Mechanics",
	"/Status+Effects",
	"/Equipment",
	"/Online",
	"/Player+vs+Player+PvP",
	"/Messages",
	"/Spirit+Ashes",
];

const NON_SPELL_PATHS: [&str; 3] = ["/Sorceries", "/Incantations", "/Memory+Slots"];

fn collect_detail_links(document: &Html, selector: &Selector, excluded: &[&str]) -> Vec<String> {
	let mut seen = HashSet::new();
	let mut links = Vec::new();

	for anchor in document.select(selector) {
		let href = match anchor.value().attr("href") {
			Some(href) => href,
			None => continue,
		};

		if !DETAIL_PATH_RE.is_match(href) || excluded.contains(&href) {
			log::debug!("Filtered listing link: {}", href);
			continue;
		}

		let url = format!("{}{}", BASE_URL, href);
		if seen.insert(url.clone()) {
			links.push(url);
		}
	}

	links
}

pub fn weapon_links(document: &Html) -> Vec<String> {
	collect_detail_links(document, &LISTING_LINK_SELECTOR, &NON_ITEM_PATHS)
}

pub fn spell_links(document: &Html) -> Vec<String> {
	collect_detail_links(document, &TABLE_LINK_SELECTOR, &NON_SPELL_PATHS)
}

#[test]
fn test_weapon_links() {
	const LISTING: &str = r#"
		<div id="wiki-content-block">
			<a class="wiki_link wiki_tooltip" href="/Greatsword">Greatsword</a>
			<a class="wiki_link wiki_tooltip" href="/Misericorde">Misericorde</a>
			<a class="wiki_link wiki_tooltip" href="/Greatsword">Greatsword</a>
			<a class="wiki_link wiki_tooltip" href="/Weapons">Weapons</a>
			<a class="wiki_link wiki_tooltip" href="/Strength">Strength</a>
			<a class="wiki_link wiki_tooltip" href="/Some/Nested">Nested</a>
			<a class="wiki_link wiki_tooltip" href="https://example.com/Offsite">Offsite</a>
			<a class="wiki_link" href="/No+Tooltip">No Tooltip</a>
			<a class="wiki_link wiki_tooltip" href="/Dagger's+Edge">Dagger's Edge</a>
		</div>
	"#;

	let document = Html::parse_document(LISTING);
	let links = weapon_links(&document);
	assert_eq!(
		links,
		vec![
			"https://eldenring.wiki.fextralife.com/Greatsword",
			"https://eldenring.wiki.fextralife.com/Misericorde",
			"https://eldenring.wiki.fextralife.com/Dagger's+Edge",
		]
	);

	// Same content scanned twice yields the same set
	let again = weapon_links(&document);
	assert_eq!(links, again);
}

#[test]
fn test_spell_links() {
	const LISTING: &str = r#"
		<div id="wiki-content-block">
			<table class="wiki_table">
				<tr><td><a class="wiki_link" href="/Comet+Azur">Comet Azur</a></td></tr>
				<tr><td><a class="wiki_link" href="/Sorceries">Sorceries</a></td></tr>
				<tr><td><a class="wiki_link" href="/Memory+Slots">Memory Slots</a></td></tr>
				<tr><td><a class="wiki_link" href="/style.css">Stylesheet</a></td></tr>
				<tr><td><a class="wiki_link" href="/#anchor">Anchor</a></td></tr>
				<tr><td><a class="wiki_link" href="/Ranni's+Dark+Moon">Ranni's Dark Moon</a></td></tr>
			</table>
			<a class="wiki_link" href="/Outside+Table">Outside</a>
		</div>
	"#;

	let document = Html::parse_document(LISTING);
	let links = spell_links(&document);
	assert_eq!(
		links,
		vec![
			"https://eldenring.wiki.fextralife.com/Comet+Azur",
			"https://eldenring.wiki.fextralife.com/Ranni's+Dark+Moon",
		]
	);
}
