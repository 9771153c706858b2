use anyhow::Result;
use scraper::{ElementRef, Html};

use crate::csv::Record;
use crate::extract::{
	direct_text_starting_with, element_text, find_link_with_title, find_marker_cell,
	find_span_with_text, next_text_value, passive_description, raw_text, requirement_value,
	scaling_grade, status_potency, value_or_zero, Attribute, ANCHOR_SELECTOR, H2_SELECTOR,
	INFOBOX_SELECTOR, LI_SELECTOR, LINELEFT_SELECTOR, TD_SELECTOR, TR_SELECTOR,
	WIKI_CONTENT_SELECTOR,
};
use crate::fetch;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpgradeType {
	Somber,
	Regular,
	Unknown,
}

impl UpgradeType {
	pub fn as_str(self) -> &'static str {
		match self {
			UpgradeType::Somber => "Somber",
			UpgradeType::Regular => "Regular",
			UpgradeType::Unknown => "Unknown",
		}
	}
}

#[derive(Debug)]
pub struct WeaponRecord {
	pub name: String,
	pub category: String,
	pub phy_atk: String,
	pub mag_atk: String,
	pub fire_atk: String,
	pub ligt_atk: String,
	pub holy_atk: String,
	pub crit_atk: String,
	pub sor_atk: String,
	pub inc_atk: String,
	pub phy_guard: String,
	pub mag_guard: String,
	pub fire_guard: String,
	pub ligt_guard: String,
	pub holy_guard: String,
	pub boost_guard: String,
	pub str_scale: String,
	pub dex_scale: String,
	pub int_scale: String,
	pub fai_scale: String,
	pub arc_scale: String,
	pub str_req: String,
	pub dex_req: String,
	pub int_req: String,
	pub fai_req: String,
	pub arc_req: String,
	pub damage_types: String,
	pub weapon_skill: String,
	pub fp_cost: String,
	pub weight: String,
	pub passive: String,
	pub poison: String,
	pub hemorrhage: String,
	pub frostbite: String,
	pub scarlet_rot: String,
	pub sleep: String,
	pub madness: String,
	pub death_blight: String,
	pub upgrade_type: UpgradeType,
	pub url: String,
}

fn dash() -> String {
	"-".to_string()
}

impl WeaponRecord {
	// Every stat starts out as the wiki's "-" placeholder and is only
	// replaced when the page carries a value for it
	fn new(name: String, url: String) -> Self {
		WeaponRecord {
			name,
			category: dash(),
			phy_atk: dash(),
			mag_atk: dash(),
			fire_atk: dash(),
			ligt_atk: dash(),
			holy_atk: dash(),
			crit_atk: dash(),
			sor_atk: dash(),
			inc_atk: dash(),
			phy_guard: dash(),
			mag_guard: dash(),
			fire_guard: dash(),
			ligt_guard: dash(),
			holy_guard: dash(),
			boost_guard: dash(),
			str_scale: dash(),
			dex_scale: dash(),
			int_scale: dash(),
			fai_scale: dash(),
			arc_scale: dash(),
			str_req: dash(),
			dex_req: dash(),
			int_req: dash(),
			fai_req: dash(),
			arc_req: dash(),
			damage_types: dash(),
			weapon_skill: dash(),
			fp_cost: dash(),
			weight: dash(),
			passive: dash(),
			poison: dash(),
			hemorrhage: dash(),
			frostbite: dash(),
			scarlet_rot: dash(),
			sleep: dash(),
			madness: dash(),
			death_blight: dash(),
			upgrade_type: UpgradeType::Unknown,
			url,
		}
	}
}

impl Record for WeaponRecord {
	fn headers() -> &'static [&'static str] {
		&[
			"name",
			"category",
			"phyAtk",
			"magAtk",
			"fireAtk",
			"ligtAtk",
			"holyAtk",
			"critAtk",
			"sorAtk",
			"incAtk",
			"phyGuard",
			"magGuard",
			"fireGuard",
			"ligtGuard",
			"holyGuard",
			"boostGuard",
			"strScale",
			"dexScale",
			"intScale",
			"faiScale",
			"arcScale",
			"strReq",
			"dexReq",
			"intReq",
			"faiReq",
			"arcReq",
			"damageTypes",
			"weaponSkill",
			"fpCost",
			"weight",
			"passive",
			"poison",
			"hemorrhage",
			"frostbite",
			"scarletRot",
			"sleep",
			"madness",
			"deathBlight",
			"upgradeType",
			"url",
		]
	}

	fn values(&self) -> Vec<String> {
		vec![
			self.name.clone(),
			self.category.clone(),
			self.phy_atk.clone(),
			self.mag_atk.clone(),
			self.fire_atk.clone(),
			self.ligt_atk.clone(),
			self.holy_atk.clone(),
			self.crit_atk.clone(),
			self.sor_atk.clone(),
			self.inc_atk.clone(),
			self.phy_guard.clone(),
			self.mag_guard.clone(),
			self.fire_guard.clone(),
			self.ligt_guard.clone(),
			self.holy_guard.clone(),
			self.boost_guard.clone(),
			self.str_scale.clone(),
			self.dex_scale.clone(),
			self.int_scale.clone(),
			self.fai_scale.clone(),
			self.arc_scale.clone(),
			self.str_req.clone(),
			self.dex_req.clone(),
			self.int_req.clone(),
			self.fai_req.clone(),
			self.arc_req.clone(),
			self.damage_types.clone(),
			self.weapon_skill.clone(),
			self.fp_cost.clone(),
			self.weight.clone(),
			self.passive.clone(),
			self.poison.clone(),
			self.hemorrhage.clone(),
			self.frostbite.clone(),
			self.scarlet_rot.clone(),
			self.sleep.clone(),
			self.madness.clone(),
			self.death_blight.clone(),
			self.upgrade_type.as_str().to_string(),
			self.url.clone(),
		]
	}
}

// Attack values hang off a titled link ("Physical Damage"), but some pages
// label the stat with a plain span instead. The span route is tried whenever
// the link route produced nothing.
fn attack_value(scope: Option<ElementRef>, title: &str, span_label: Option<&str>) -> String {
	let scope = match scope {
		Some(scope) => scope,
		None => return "0".to_string(),
	};

	let mut value = match find_link_with_title(scope, title) {
		Some(link) => value_or_zero(&next_text_value(link)),
		None => "0".to_string(),
	};

	if value == "0" {
		if let Some(label) = span_label {
			if let Some(span) = find_span_with_text(scope, label) {
				value = value_or_zero(&next_text_value(span));
			}
		}
	}

	value
}

fn span_value(scope: Option<ElementRef>, label: &str) -> String {
	match scope.and_then(|scope| find_span_with_text(scope, label)) {
		Some(span) => value_or_zero(&next_text_value(span)),
		None => "0".to_string(),
	}
}

// Scaling and requirement cells are matched with one regex pass over the
// whole stat block, so a missing cell degrades to "-" for every attribute
fn marker_cell_text(infobox: ElementRef, img_title: &str) -> String {
	find_marker_cell(infobox, img_title)
		.and_then(|cell| cell.select(&LINELEFT_SELECTOR).next())
		.map(raw_text)
		.unwrap_or_default()
}

fn anchors_text(cell: ElementRef) -> String {
	cell.select(&ANCHOR_SELECTOR)
		.map(raw_text)
		.collect::<Vec<_>>()
		.join("")
		.trim()
		.to_string()
}

// Upgrade material is listed in a bullet point. Somber is checked first since
// "Somber Smithing Stones" also contains "Smithing Stones".
fn detect_upgrade_type(document: &Html) -> UpgradeType {
	let upgrade_item = document
		.select(&LI_SELECTOR)
		.map(raw_text)
		.find(|text| text.contains("Smithing Stones") || text.contains("Somber"));

	if let Some(text) = upgrade_item {
		if text.contains("Somber") {
			UpgradeType::Somber
		} else {
			UpgradeType::Regular
		}
	} else {
		let body_text = document
			.select(&WIKI_CONTENT_SELECTOR)
			.next()
			.map(raw_text)
			.unwrap_or_default();

		if body_text.contains("using Somber") {
			UpgradeType::Somber
		} else if body_text.contains("using Smithing") {
			UpgradeType::Regular
		} else {
			UpgradeType::Unknown
		}
	}
}

#[test]
fn test_detect_upgrade_type() {
	const TEST_STRINGS: [(&str, UpgradeType); 4] = [
		(
			r#"<ul><li>Can be upgraded by using Somber Smithing Stones.</li></ul>"#,
			UpgradeType::Somber,
		),
		(
			r#"<ul><li>Can be upgraded by using Smithing Stones.</li></ul>"#,
			UpgradeType::Regular,
		),
		(
			r#"<div id="wiki-content-block"><p>Upgraded using Smithing Stones.</p></div>"#,
			UpgradeType::Regular,
		),
		(r#"<p>No upgrade notes at all.</p>"#, UpgradeType::Unknown),
	];

	for (input, expected) in TEST_STRINGS {
		let document = Html::parse_document(input);
		let result = detect_upgrade_type(&document);
		assert_eq!(
			result, expected,
			"Expected {:?} for input '{}', but got {:?}",
			expected, input, result
		);
	}
}

pub async fn scrape_weapon(client: reqwest::Client, url: String) -> Result<Option<WeaponRecord>> {
	match fetch::request_page(&client, &url).await? {
		Some(document) => Ok(assemble_weapon(&document, &url)),
		None => {
			log::warn!("Page not found: {}", url);
			Ok(None)
		}
	}
}

pub fn assemble_weapon(document: &Html, url: &str) -> Option<WeaponRecord> {
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
	if name.is_empty() || name == "-" {
		log::warn!("Could not find name for {}", url);
		return None;
	}

	let mut record = WeaponRecord::new(name, url.to_string());

	// Attack Power
	if let Some(cell) = find_marker_cell(infobox, "Attack Power") {
		let attack_div = cell.select(&LINELEFT_SELECTOR).next();
		record.phy_atk = attack_value(attack_div, "Physical Damage", None);
		record.mag_atk = attack_value(attack_div, "Magic Damage", None);
		record.fire_atk = attack_value(attack_div, "Fire Damage", Some("Fire"));
		record.ligt_atk = attack_value(attack_div, "Lightning Damage", Some("Ligt"));
		record.holy_atk = attack_value(attack_div, "Holy Damage", Some("Holy"));
		record.crit_atk = attack_value(attack_div, "Critical Damage", None);
		record.sor_atk = attack_value(attack_div, "Sorcery Scaling", Some("Sor"));
		record.inc_atk = attack_value(attack_div, "Incant Scaling", None);
	}

	// Guarded Damage Negation. The physical value is a bare text node with no
	// span of its own.
	if let Some(cell) = find_marker_cell(infobox, "Guarded Damage Negation") {
		let guard_div = cell.select(&LINELEFT_SELECTOR).next();
		record.phy_guard = match guard_div {
			Some(div) => value_or_zero(&direct_text_starting_with(div, "Phy")),
			None => "0".to_string(),
		};
		record.mag_guard = span_value(guard_div, "Mag");
		record.fire_guard = span_value(guard_div, "Fire");
		record.ligt_guard = span_value(guard_div, "Ligt");
		record.holy_guard = span_value(guard_div, "Holy");
		record.boost_guard = span_value(guard_div, "Boost");
	}

	// Attribute Scaling
	let scaling_text = marker_cell_text(infobox, "Attribute Scaling");
	record.str_scale = scaling_grade(&scaling_text, Attribute::Strength);
	record.dex_scale = scaling_grade(&scaling_text, Attribute::Dexterity);
	record.int_scale = scaling_grade(&scaling_text, Attribute::Intelligence);
	record.fai_scale = scaling_grade(&scaling_text, Attribute::Faith);
	record.arc_scale = scaling_grade(&scaling_text, Attribute::Arcane);

	// Attributes Requirement
	let requires_text = marker_cell_text(infobox, "Attributes Requirement");
	record.str_req = requirement_value(&requires_text, Attribute::Strength.label());
	record.dex_req = requirement_value(&requires_text, Attribute::Dexterity.label());
	record.int_req = requirement_value(&requires_text, Attribute::Intelligence.label());
	record.fai_req = requirement_value(&requires_text, Attribute::Faith.label());
	record.arc_req = requirement_value(&requires_text, Attribute::Arcane.label());

	// The remaining label rows carry category, damage types, skill, FP cost,
	// weight, passives and status buildup
	let mut category = dash();
	let mut damage_types = dash();
	let mut weapon_skill = dash();
	let mut fp_cost = dash();
	let mut weight = dash();
	let mut passive = dash();

	for row in infobox.select(&TR_SELECTOR) {
		let cells: Vec<ElementRef> = row.select(&TD_SELECTOR).collect();
		if cells.len() != 2 {
			continue;
		}

		let first_text = element_text(cells[0]);
		let second_text = element_text(cells[1]);

		// The attack and scaling blocks were already handled above
		if first_text.starts_with("Attack") || first_text.starts_with("Scaling") {
			continue;
		}

		if first_text.starts_with("Wgt.") {
			weight = value_or_zero(&first_text);
			passive = passive_description(cells[1]);

			record.poison = status_potency(cells[1], "Poison");
			record.hemorrhage = status_potency(cells[1], "Hemorrhage");
			record.frostbite = status_potency(cells[1], "Frostbite");
			record.scarlet_rot = status_potency(cells[1], "Scarlet Rot");
			record.sleep = status_potency(cells[1], "Sleep");
			record.madness = status_potency(cells[1], "Madness");
			record.death_blight = status_potency(cells[1], "Death Blight");
		} else if second_text.contains("FP") || first_text == "No Skill" {
			weapon_skill = if first_text == "No Skill" {
				"No Skill".to_string()
			} else {
				let link_text = anchors_text(cells[0]);
				if !link_text.is_empty() {
					link_text
				} else if !first_text.is_empty() {
					first_text
				} else {
					dash()
				}
			};
			fp_cost = value_or_zero(&second_text);
		} else if category == "-" {
			let link_text = anchors_text(cells[0]);
			category = if !link_text.is_empty() {
				link_text
			} else if !first_text.is_empty() {
				first_text
			} else {
				dash()
			};

			damage_types = cells[1]
				.select(&ANCHOR_SELECTOR)
				.map(element_text)
				.collect::<Vec<_>>()
				.join("/");
			if damage_types.is_empty() && !second_text.is_empty() {
				damage_types = second_text
					.lines()
					.next()
					.unwrap_or("")
					.split('/')
					.map(str::trim)
					.collect::<Vec<_>>()
					.join("/");
			}
			if damage_types.is_empty() {
				damage_types = dash();
			}
		}
	}

	// Category links point at the list page and are worded in the plural
	if category.ends_with('s') {
		category.pop();
	}

	record.category = category;
	record.damage_types = damage_types;
	record.weapon_skill = weapon_skill;
	record.fp_cost = fp_cost;
	record.weight = weight;
	record.passive = passive;
	record.upgrade_type = detect_upgrade_type(document);

	Some(record)
}

#[test]
fn test_assemble_weapon_stat_block() {
	const PAGE: &str = r#"
		<div id="infobox">
			<h2>Ruins Greatsword</h2>
			<table>
				<tr>
					<td>
						<h3><img title="Attack Power">Attack Power</h3>
						<div class="lineleft">
							<a title="Physical Damage">Phy</a> 120
							<a title="Magic Damage">Mag</a> -
							<a title="Critical Damage">Crit</a> 100
							<span>Sor</span> 78
						</div>
					</td>
					<td>
						<h3><img title="Guarded Damage Negation">Guard</h3>
						<div class="lineleft">
							Phy 73.0<br>
							<span>Mag</span> 49.0
							<span>Boost</span> 55
						</div>
					</td>
				</tr>
				<tr>
					<td>
						<h3><img title="Attribute Scaling">Scaling</h3>
						<div class="lineleft">Str C Dex E Int D</div>
					</td>
					<td>
						<h3><img title="Attributes Requirement">Requires</h3>
						<div class="lineleft">Str 50 Dex 16 Int 16</div>
					</td>
				</tr>
			</table>
		</div>
	"#;

	let document = Html::parse_document(PAGE);
	let record = assemble_weapon(&document, "https://example.invalid/Ruins+Greatsword").unwrap();

	assert_eq!(record.phy_atk, "120");
	assert_eq!(record.mag_atk, "0");
	assert_eq!(record.fire_atk, "0");
	assert_eq!(record.crit_atk, "100");
	assert_eq!(record.sor_atk, "78");
	assert_eq!(record.inc_atk, "0");

	assert_eq!(record.phy_guard, "73.0");
	assert_eq!(record.mag_guard, "49.0");
	assert_eq!(record.holy_guard, "0");
	assert_eq!(record.boost_guard, "55");

	assert_eq!(record.str_scale, "C");
	assert_eq!(record.dex_scale, "E");
	assert_eq!(record.int_scale, "D");
	assert_eq!(record.fai_scale, "-");

	assert_eq!(record.str_req, "50");
	assert_eq!(record.dex_req, "16");
	assert_eq!(record.int_req, "16");
	assert_eq!(record.arc_req, "-");

	// The stat rows must not be mistaken for label rows
	assert_eq!(record.category, "-");
	assert_eq!(record.damage_types, "-");
}

#[test]
fn test_assemble_weapon_label_rows() {
	const PAGE: &str = r#"
		<div id="wiki-content-block">
			<div id="infobox">
				<h2>Uchigatana</h2>
				<table>
					<tr>
						<td><a href="/Katanas">Katanas</a></td>
						<td><a href="/Slash">Slash</a><a href="/Pierce">Pierce</a></td>
					</tr>
					<tr>
						<td><a href="/Unsheathe">Unsheathe</a></td>
						<td>FP 10</td>
					</tr>
					<tr>
						<td>Wgt. 5.5</td>
						<td><p><a href="/Hemorrhage" title="Hemorrhage (45)">Hemorrhage (45)</a></p></td>
					</tr>
				</table>
			</div>
			<ul><li>Can be upgraded by using Smithing Stones.</li></ul>
		</div>
	"#;

	let document = Html::parse_document(PAGE);
	let record = assemble_weapon(&document, "https://example.invalid/Uchigatana").unwrap();

	assert_eq!(record.category, "Katana");
	assert_eq!(record.damage_types, "Slash/Pierce");
	assert_eq!(record.weapon_skill, "Unsheathe");
	assert_eq!(record.fp_cost, "10");
	assert_eq!(record.weight, "5.5");
	assert_eq!(record.hemorrhage, "45");
	assert_eq!(record.poison, "-");
	assert_eq!(record.passive, "-");
	assert_eq!(record.upgrade_type, UpgradeType::Regular);

	// Attack stats stay untouched when the stat block is missing
	assert_eq!(record.phy_atk, "-");
	assert_eq!(record.phy_guard, "-");
}

#[test]
fn test_assemble_weapon_no_skill() {
	const PAGE: &str = r#"
		<div id="infobox">
			<h2>Caestus</h2>
			<table>
				<tr><td>No Skill</td><td>FP -</td></tr>
				<tr><td>Fists</td><td>Strike</td></tr>
			</table>
		</div>
	"#;

	let document = Html::parse_document(PAGE);
	let record = assemble_weapon(&document, "https://example.invalid/Caestus").unwrap();

	assert_eq!(record.weapon_skill, "No Skill");
	assert_eq!(record.fp_cost, "0");
	assert_eq!(record.category, "Fist");
	assert_eq!(record.damage_types, "Strike");
}

#[test]
fn test_assemble_weapon_defaults() {
	const PAGE: &str = r#"<div id="infobox"><h2>Bare Entry</h2></div>"#;

	let document = Html::parse_document(PAGE);
	let record = assemble_weapon(&document, "https://example.invalid/Bare+Entry").unwrap();

	assert_eq!(record.values().len(), WeaponRecord::headers().len());
	assert_eq!(record.category, "-");
	assert_eq!(record.phy_atk, "-");
	assert_eq!(record.boost_guard, "-");
	assert_eq!(record.str_scale, "-");
	assert_eq!(record.arc_req, "-");
	assert_eq!(record.weight, "-");
	assert_eq!(record.upgrade_type, UpgradeType::Unknown);
}

#[test]
fn test_assemble_weapon_skips() {
	let document = Html::parse_document("<p>not a detail page</p>");
	assert!(assemble_weapon(&document, "https://example.invalid/Nothing").is_none());

	let document = Html::parse_document(r#"<div id="infobox"><h2> </h2></div>"#);
	assert!(assemble_weapon(&document, "https://example.invalid/Nameless").is_none());
}
