use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::extract::{element_text, IMG_SELECTOR, TD_SELECTOR};
use crate::fetch;

static WIKI_LINK_SELECTOR: Lazy<Selector> =
	Lazy::new(|| Selector::parse("a.wiki_link").unwrap());

// Checklist line layout: "- [ ] Name (str/dex/int/fai/arc) (total)"
static CHECKLIST_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^(- \[ \] [^(]+)\((\d+|-)/(\d+|-)/(\d+|-)/(\d+|-)/(\d+|-)\) \(\d+\)").unwrap()
});
static TOTAL_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d+)\)$").unwrap());

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeaponRequirements {
	pub strength: u32,
	pub dexterity: u32,
	pub intelligence: u32,
	pub faith: u32,
	pub arcane: u32,
}

impl WeaponRequirements {
	pub fn total(&self) -> u32 {
		self.strength + self.dexterity + self.intelligence + self.faith + self.arcane
	}
}

#[derive(Debug)]
pub struct RequirementsEntry {
	pub name: String,
	pub requirements: WeaponRequirements,
}

fn stat(value: u32) -> String {
	if value == 0 {
		"-".to_string()
	} else {
		value.to_string()
	}
}

impl RequirementsEntry {
	pub fn checklist_line(&self) -> String {
		let stats = [
			stat(self.requirements.strength),
			stat(self.requirements.dexterity),
			stat(self.requirements.intelligence),
			stat(self.requirements.faith),
			stat(self.requirements.arcane),
		]
		.join("/");

		format!(
			"- [ ] {} ({}) ({})",
			self.name,
			stats,
			self.requirements.total()
		)
	}
}

#[test]
fn test_checklist_line() {
	let entry = RequirementsEntry {
		name: "Moonveil".to_string(),
		requirements: WeaponRequirements {
			strength: 12,
			dexterity: 18,
			intelligence: 23,
			faith: 0,
			arcane: 0,
		},
	};
	assert_eq!(entry.checklist_line(), "- [ ] Moonveil (12/18/23/-/-) (53)");

	let entry = RequirementsEntry {
		name: "Club".to_string(),
		requirements: WeaponRequirements::default(),
	};
	assert_eq!(entry.checklist_line(), "- [ ] Club (-/-/-/-/-) (0)");
}

// Weapon names come straight out of the page URL
pub fn slug_name(url: &str) -> String {
	let slug = url.split('/').last().unwrap_or_default();
	let decoded = match urlencoding::decode(slug) {
		Ok(decoded) => decoded.into_owned(),
		Err(_) => slug.to_string(),
	};
	decoded.replace('+', " ")
}

#[test]
fn test_slug_name() {
	const TEST_STRINGS: [(&str, &str); 3] = [
		(
			"https://eldenring.wiki.fextralife.com/Uchigatana",
			"Uchigatana",
		),
		(
			"https://eldenring.wiki.fextralife.com/Miquellan+Knight%27s+Sword",
			"Miquellan Knight's Sword",
		),
		(
			"https://eldenring.wiki.fextralife.com/Ornamental+Straight+Sword",
			"Ornamental Straight Sword",
		),
	];

	for (input, expected) in TEST_STRINGS {
		let result = slug_name(input);
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

// Values sit next to their attribute link as "16" or "16 E"; take the leading
// digits and ignore the rest
fn leading_number(text: &str) -> Option<u32> {
	let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
	digits.parse().ok()
}

#[test]
fn test_leading_number() {
	const TEST_STRINGS: [(&str, Option<u32>); 5] = [
		("16", Some(16)),
		("16 E", Some(16)),
		("12,", Some(12)),
		("-", None),
		("", None),
	];

	for (input, expected) in TEST_STRINGS {
		let result = leading_number(input);
		assert_eq!(
			result, expected,
			"Expected {:?} for input '{}', but got {:?}",
			expected, input, result
		);
	}
}

pub async fn scrape_requirements(
	client: reqwest::Client,
	url: String,
) -> Result<Option<RequirementsEntry>> {
	match fetch::request_page(&client, &url).await? {
		Some(document) => Ok(assemble_requirements(&document, &url).map(|requirements| {
			RequirementsEntry {
				name: slug_name(&url),
				requirements,
			}
		})),
		None => {
			log::warn!("Page not found: {}", url);
			Ok(None)
		}
	}
}

pub fn assemble_requirements(document: &Html, url: &str) -> Option<WeaponRequirements> {
	let cells: Vec<ElementRef> = document
		.select(&TD_SELECTOR)
		.filter(|cell| {
			cell.select(&IMG_SELECTOR).any(|img| {
				img.value()
					.attr("alt")
					.map_or(false, |alt| alt.contains("attributes required"))
			})
		})
		.collect();

	if cells.is_empty() {
		log::warn!("No requirements table found for {}", url);
		return None;
	}

	let mut requirements = WeaponRequirements::default();
	for cell in cells {
		for link in cell.select(&WIKI_LINK_SELECTOR) {
			let key = element_text(link).to_lowercase();
			let value = link
				.next_sibling()
				.and_then(|node| node.value().as_text().map(|text| text.trim().to_string()))
				.and_then(|text| leading_number(&text));

			let value = match value {
				Some(value) => value,
				None => continue,
			};

			match key.as_str() {
				"str" => requirements.strength = value,
				"dex" => requirements.dexterity = value,
				"int" => requirements.intelligence = value,
				"fai" => requirements.faith = value,
				"arc" => requirements.arcane = value,
				_ => {}
			}
		}
	}

	Some(requirements)
}

#[test]
fn test_assemble_requirements() {
	const PAGE: &str = r#"
		<div id="infobox">
			<table>
				<tr>
					<td>
						<img alt="attributes required">
						<div class="lineleft">
							<a class="wiki_link">Str</a> 12
							<a class="wiki_link">Dex</a> 18
							<a class="wiki_link">Int</a> 23 E
						</div>
					</td>
				</tr>
			</table>
		</div>
	"#;

	let document = Html::parse_document(PAGE);
	let requirements =
		assemble_requirements(&document, "https://example.invalid/Moonveil").unwrap();

	assert_eq!(requirements.strength, 12);
	assert_eq!(requirements.dexterity, 18);
	assert_eq!(requirements.intelligence, 23);
	assert_eq!(requirements.faith, 0);
	assert_eq!(requirements.arcane, 0);
	assert_eq!(requirements.total(), 53);

	let document = Html::parse_document("<p>no tables here</p>");
	assert!(assemble_requirements(&document, "https://example.invalid/Nothing").is_none());
}

// Rewrites every checklist total as "points above 10", the amount a fresh
// character actually has to invest. Stats at or below the base 10 cost
// nothing. Lines that are not checklist entries pass through untouched.
pub fn recalculate_totals(content: &str) -> String {
	let mut updated: Vec<String> = Vec::new();

	for line in content.lines() {
		let trimmed = line.trim();
		match CHECKLIST_RE.captures(trimmed) {
			Some(caps) => {
				let mut total = 0u32;
				let mut stats: Vec<String> = Vec::new();

				for index in 2..=6 {
					let value = caps.get(index).map_or("-", |mat| mat.as_str());
					if value == "-" {
						stats.push("-".to_string());
						continue;
					}
					match value.parse::<u32>() {
						Ok(points) => {
							stats.push(points.to_string());
							if points > 10 {
								total += points - 10;
							}
						}
						Err(_) => stats.push(value.to_string()),
					}
				}

				updated.push(format!("{}({}) ({})", &caps[1], stats.join("/"), total));
			}
			None => updated.push(line.to_string()),
		}
	}

	let mut output = updated.join("\n");
	output.push('\n');
	output
}

#[test]
fn test_recalculate_totals() {
	let content = "\
- [ ] Dagger (5/9/-/-/-) (14)
- [ ] Moonveil (12/18/23/-/-) (53)
some other line
";

	let expected = "\
- [ ] Dagger (5/9/-/-/-) (0)
- [ ] Moonveil (12/18/23/-/-) (23)
some other line
";

	assert_eq!(recalculate_totals(content), expected);
}

// Ascending by the trailing total; lines without one sort first. The sort is
// stable, so ties keep their scrape order.
pub fn sort_by_total(content: &str) -> String {
	let mut lines: Vec<&str> = content
		.lines()
		.filter(|line| !line.trim().is_empty())
		.collect();

	lines.sort_by_key(|line| {
		TOTAL_KEY_RE
			.captures(line)
			.and_then(|caps| caps.get(1))
			.and_then(|mat| mat.as_str().parse::<i64>().ok())
			.unwrap_or(-1)
	});

	let mut output = lines.join("\n");
	output.push('\n');
	output
}

#[test]
fn test_sort_by_total() {
	let content = "\
- [ ] Moonveil (12/18/23/-/-) (23)
- [ ] Club (-/-/-/-/-) (0)

- [ ] Uchigatana (11/15/-/-/-) (7)
stray line
";

	let expected = "\
stray line
- [ ] Club (-/-/-/-/-) (0)
- [ ] Uchigatana (11/15/-/-/-) (7)
- [ ] Moonveil (12/18/23/-/-) (23)
";

	assert_eq!(sort_by_total(content), expected);
}
