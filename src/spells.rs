use anyhow::Result;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::csv::Record;
use crate::extract::{
	element_text, raw_text, requirement_value, value_or_zero, Attribute, H2_SELECTOR,
	INFOBOX_SELECTOR, TD_SELECTOR, TR_SELECTOR,
};
use crate::fetch;

// Spell Page Selectors
static BREADCRUMB_LINK_SELECTOR: Lazy<Selector> =
	Lazy::new(|| Selector::parse("#breadcrumbs-container a").unwrap());
static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("td, th").unwrap());
static REQUIREMENT_IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| {
	Selector::parse(r#"img[title="Attributes Requirement"], img[alt*="attributes required"]"#)
		.unwrap()
});

#[derive(Debug)]
pub struct SpellRecord {
	pub name: String,
	pub category: String,
	pub spell_type: String,
	pub fp_cost: String,
	pub slots_used: String,
	pub int_req: String,
	pub fai_req: String,
	pub arc_req: String,
	pub url: String,
}

impl Record for SpellRecord {
	fn headers() -> &'static [&'static str] {
		&[
			"name",
			"category",
			"type",
			"fpCost",
			"slotsUsed",
			"intReq",
			"faiReq",
			"arcReq",
			"url",
		]
	}

	fn values(&self) -> Vec<String> {
		vec![
			self.name.clone(),
			self.category.clone(),
			self.spell_type.clone(),
			self.fp_cost.clone(),
			self.slots_used.clone(),
			self.int_req.clone(),
			self.fai_req.clone(),
			self.arc_req.clone(),
			self.url.clone(),
		]
	}
}

// Spell pages print absent requirements as a literal zero ("Faith 0"), which
// normalizes to the same "-" as an attribute that is not listed at all
fn spell_requirement(text: &str, attribute: Attribute) -> String {
	let value = requirement_value(text, attribute.full_name());
	if value == "0" {
		"-".to_string()
	} else {
		value
	}
}

#[test]
fn test_spell_requirement() {
	const TEST_STRINGS: [(&str, Attribute, &str); 5] = [
		("Intelligence 60 Faith 0 Arcane 0", Attribute::Intelligence, "60"),
		("Intelligence 60 Faith 0 Arcane 0", Attribute::Faith, "-"),
		("Intelligence 60 Faith 0 Arcane 0", Attribute::Arcane, "-"),
		("Faith 24", Attribute::Faith, "24"),
		("no requirements", Attribute::Intelligence, "-"),
	];

	for (input, attribute, expected) in TEST_STRINGS {
		let result = spell_requirement(input, attribute);
		assert_eq!(
			result.as_str(),
			expected,
			"Expected '{}' for input '{}', but got '{}'",
			expected,
			input,
			result
		);
	}
}

pub async fn scrape_spell(client: reqwest::Client, url: String) -> Result<Option<SpellRecord>> {
	match fetch::request_page(&client, &url).await? {
		Some(document) => Ok(assemble_spell(&document, &url)),
		None => {
			log::warn!("Page not found: {}", url);
			Ok(None)
		}
	}
}

pub fn assemble_spell(document: &Html, url: &str) -> Option<SpellRecord> {
	let infobox = match document.select(&INFOBOX_SELECTOR).next() {
		Some(infobox) => infobox,
		None => {
			log::warn!("Could not find infobox for {}", url);
			return None;
		}
	};

	let name = infobox
		.select(&H2_SELECTOR)
		.next()
		.map(element_text)
		.unwrap_or_default();
	if name.is_empty() {
		log::warn!("Could not find name for {}", url);
		return None;
	}

	// The breadcrumb trail ends in the spell's school
	let category = document
		.select(&BREADCRUMB_LINK_SELECTOR)
		.filter_map(|link| match link.value().attr("href") {
			Some("/Sorceries") => Some("Sorcery"),
			Some("/Incantations") => Some("Incantation"),
			_ => None,
		})
		.last()
		.unwrap_or("-")
		.to_string();

	let mut record = SpellRecord {
		name,
		category,
		spell_type: "-".to_string(),
		fp_cost: "-".to_string(),
		slots_used: "-".to_string(),
		int_req: "-".to_string(),
		fai_req: "-".to_string(),
		arc_req: "-".to_string(),
		url: url.to_string(),
	};

	for row in infobox.select(&TR_SELECTOR) {
		let cells: Vec<ElementRef> = row.select(&TD_SELECTOR).collect();

		if cells.len() == 2 {
			let first_text = element_text(cells[0]);
			let second_text = element_text(cells[1]);

			if first_text == "Spell Type" && !second_text.is_empty() {
				record.spell_type = second_text.clone();
			}
			if first_text.starts_with("FP Cost") {
				record.fp_cost = value_or_zero(&first_text);
			}
			if second_text.starts_with("Slots Used") {
				record.slots_used = value_or_zero(&second_text);
			}
		}

		// Requirements sit in a marked cell, either alone or as one of two
		if cells.len() == 1 || cells.len() == 2 {
			let candidates = [cells[cells.len() - 1], cells[0]];
			let marked = candidates
				.into_iter()
				.find(|cell| cell.select(&REQUIREMENT_IMG_SELECTOR).next().is_some());

			if let Some(cell) = marked {
				let text = raw_text(cell);
				record.int_req = spell_requirement(&text, Attribute::Intelligence);
				record.fai_req = spell_requirement(&text, Attribute::Faith);
				record.arc_req = spell_requirement(&text, Attribute::Arcane);
			}
		}
	}

	// Some pages fold cost and slots into one cell instead of a label row
	if record.fp_cost == "-" || record.slots_used == "-" {
		let fallback_row = infobox.select(&TR_SELECTOR).find(|row| {
			row.select(&CELL_SELECTOR)
				.any(|cell| element_text(cell).contains("FP Cost"))
		});

		if let Some(row) = fallback_row {
			for cell in row.select(&TD_SELECTOR) {
				let text = element_text(cell);
				if text.starts_with("FP Cost") {
					record.fp_cost = value_or_zero(&text);
				}
				if text.starts_with("Slots Used") {
					record.slots_used = value_or_zero(&text);
				}
			}
		}
	}

	Some(record)
}

#[test]
fn test_assemble_spell() {
	const PAGE: &str = r#"
		<div id="breadcrumbs-container">
			<a href="/Equipment+%26+Magic">Equipment &amp; Magic</a>
			<a href="/Magic+Spells">Magic Spells</a>
			<a href="/Sorceries">Sorceries</a>
		</div>
		<div id="wiki-content-block">
			<div id="infobox">
				<h2>Comet Azur</h2>
				<table>
					<tr><td>Spell Type</td><td>Glintstone Sorceries</td></tr>
					<tr><td>FP Cost 40</td><td>Slots Used 3</td></tr>
					<tr>
						<td><img title="Attributes Requirement" alt="attributes required">Intelligence 60 Faith 0 Arcane 0</td>
					</tr>
				</table>
			</div>
		</div>
	"#;

	let document = Html::parse_document(PAGE);
	let record =
		assemble_spell(&document, "https://eldenring.wiki.fextralife.com/Comet+Azur").unwrap();

	assert_eq!(record.name, "Comet Azur");
	assert_eq!(record.category, "Sorcery");
	assert_eq!(record.spell_type, "Glintstone Sorceries");
	assert_eq!(record.fp_cost, "40");
	assert_eq!(record.slots_used, "3");
	assert_eq!(record.int_req, "60");
	assert_eq!(record.fai_req, "-");
	assert_eq!(record.arc_req, "-");
	assert_eq!(record.values().len(), SpellRecord::headers().len());
}

#[test]
fn test_assemble_spell_defaults() {
	const PAGE: &str = r#"
		<div id="infobox">
			<h2>Unlabeled Ritual</h2>
			<table>
				<tr><td>FP Cost -</td><td>Slots Used -</td></tr>
			</table>
		</div>
	"#;

	let document = Html::parse_document(PAGE);
	let record = assemble_spell(&document, "https://example.invalid/Unlabeled+Ritual").unwrap();

	assert_eq!(record.category, "-");
	assert_eq!(record.spell_type, "-");
	assert_eq!(record.fp_cost, "0");
	assert_eq!(record.slots_used, "0");
	assert_eq!(record.int_req, "-");
	assert_eq!(record.fai_req, "-");
	assert_eq!(record.arc_req, "-");
}

#[test]
fn test_assemble_spell_fallback_row() {
	const PAGE: &str = r#"
		<div id="infobox">
			<h2>Folded Cost</h2>
			<table>
				<tr><td>FP Cost 25 Slots Used 2</td></tr>
			</table>
		</div>
	"#;

	let document = Html::parse_document(PAGE);
	let record = assemble_spell(&document, "https://example.invalid/Folded+Cost").unwrap();

	assert_eq!(record.fp_cost, "25");
	assert_eq!(record.slots_used, "-");
}

#[test]
fn test_assemble_spell_skips() {
	let document = Html::parse_document("<p>not a detail page</p>");
	assert!(assemble_spell(&document, "https://example.invalid/Nothing").is_none());

	let document = Html::parse_document(r#"<div id="infobox"><h2> </h2></div>"#);
	assert!(assemble_spell(&document, "https://example.invalid/Nameless").is_none());
}
