// csv is shared with the scraper binary; only the parser side is used here
#[allow(dead_code)]
mod csv;

use anyhow::{anyhow, Result};
use clap::Parser;
use serde::Serialize;
use std::{collections::HashMap, fs, fs::File, io::BufWriter};

#[derive(Parser, Debug)]
#[clap(about, version, author)]
struct Args {
	#[arg(long, default_value = "output/weapons.csv")]
	input: String,

	#[arg(long, default_value = "output/weapons.json")]
	output: String,
}

// Column names the scraper writes. The hand-curated "sote" marker column is
// optional and defaults to false when absent.
const REQUIRED_COLUMNS: [&str; 40] = [
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
];

#[derive(Serialize, Debug)]
struct WeaponEntry {
	name: String,
	category: String,
	url: String,
	sote: bool,
	attack: AttackStats,
	sorcery_scaling: i64,
	incantation_scaling: i64,
	guard: GuardStats,
	scaling: ScalingGrades,
	requirements: AttributeValues,
	damage_types: Vec<String>,
	weapon_skill: WeaponSkill,
	weight: f64,
	upgrade_type: String,
	passive_description: Option<String>,
	status_buildup: StatusBuildup,
}

#[derive(Serialize, Debug)]
struct AttackStats {
	physical: f64,
	magic: f64,
	fire: f64,
	lightning: f64,
	holy: f64,
	critical: i64,
}

#[derive(Serialize, Debug)]
struct GuardStats {
	physical: f64,
	magic: f64,
	fire: f64,
	lightning: f64,
	holy: f64,
	boost: i64,
}

#[derive(Serialize, Debug)]
struct ScalingGrades {
	strength: Option<String>,
	dexterity: Option<String>,
	intelligence: Option<String>,
	faith: Option<String>,
	arcane: Option<String>,
}

#[derive(Serialize, Debug)]
struct AttributeValues {
	strength: i64,
	dexterity: i64,
	intelligence: i64,
	faith: i64,
	arcane: i64,
}

#[derive(Serialize, Debug)]
struct WeaponSkill {
	name: Option<String>,
	fp_cost: Option<FpCost>,
}

// FP costs are usually numbers, but the wiki sometimes carries text such as
// "6 (12)" for two-part skills. Those pass through verbatim.
#[derive(Serialize, Debug, PartialEq)]
#[serde(untagged)]
enum FpCost {
	Number(i64),
	Text(String),
}

#[derive(Serialize, Debug)]
struct StatusBuildup {
	poison: i64,
	hemorrhage: i64,
	frostbite: i64,
	scarlet_rot: i64,
	sleep: i64,
	madness: i64,
	death_blight: i64,
}

fn safe_int(value: &str) -> i64 {
	let trimmed = value.trim();
	if trimmed.is_empty() || trimmed == "-" {
		return 0;
	}
	match trimmed.parse() {
		Ok(number) => number,
		Err(_) => {
			log::warn!("Could not convert '{}' to an integer, using 0.", value);
			0
		}
	}
}

#[test]
fn test_safe_int() {
	const TEST_STRINGS: [(&str, i64); 6] = [
		("120", 120),
		("-", 0),
		("", 0),
		(" ", 0),
		("ERR", 0),
		("23.0", 0),
	];

	for (input, expected) in TEST_STRINGS {
		let result = safe_int(input);
		assert_eq!(
			result, expected,
			"Expected {} for input '{}', but got {}",
			expected, input, result
		);
	}
}

fn safe_float(value: &str) -> f64 {
	let trimmed = value.trim();
	if trimmed.is_empty() || trimmed == "-" {
		return 0.0;
	}
	match trimmed.parse() {
		Ok(number) => number,
		Err(_) => {
			log::warn!("Could not convert '{}' to a float, using 0.0.", value);
			0.0
		}
	}
}

#[test]
fn test_safe_float() {
	const TEST_STRINGS: [(&str, f64); 5] = [
		("73.0", 73.0),
		("120", 120.0),
		("-", 0.0),
		("", 0.0),
		("E", 0.0),
	];

	for (input, expected) in TEST_STRINGS {
		let result = safe_float(input);
		assert_eq!(
			result, expected,
			"Expected {} for input '{}', but got {}",
			expected, input, result
		);
	}
}

fn safe_str_none(value: &str) -> Option<String> {
	let trimmed = value.trim();
	if trimmed.is_empty() || trimmed == "-" {
		None
	} else {
		Some(value.to_string())
	}
}

fn safe_fp_cost(value: &str) -> Option<FpCost> {
	let trimmed = value.trim();
	if trimmed.is_empty() || trimmed == "-" {
		return None;
	}
	match trimmed.parse() {
		Ok(number) => Some(FpCost::Number(number)),
		Err(_) => safe_str_none(value).map(FpCost::Text),
	}
}

#[test]
fn test_safe_fp_cost() {
	assert_eq!(safe_fp_cost("10"), Some(FpCost::Number(10)));
	assert_eq!(
		safe_fp_cost("6 (12)"),
		Some(FpCost::Text("6 (12)".to_string()))
	);
	assert_eq!(safe_fp_cost("-"), None);
	assert_eq!(safe_fp_cost(""), None);
}

fn parse_bool(value: &str) -> bool {
	value.trim().to_lowercase() == "true"
}

fn parse_damage_types(value: &str) -> Vec<String> {
	if value.is_empty() || value == "-" {
		return Vec::new();
	}
	value
		.replace(" / ", "/")
		.split('/')
		.map(|part| part.trim().to_string())
		.collect()
}

#[test]
fn test_parse_damage_types() {
	assert_eq!(parse_damage_types("Slash/Pierce"), vec!["Slash", "Pierce"]);
	assert_eq!(parse_damage_types("Slash / Pierce"), vec!["Slash", "Pierce"]);
	assert_eq!(parse_damage_types("Strike"), vec!["Strike"]);
	assert!(parse_damage_types("-").is_empty());
	assert!(parse_damage_types("").is_empty());
}

struct ColumnMap {
	indices: HashMap<String, usize>,
}

impl ColumnMap {
	fn new(header: &[String]) -> Result<Self> {
		let indices: HashMap<String, usize> = header
			.iter()
			.enumerate()
			.map(|(index, name)| (name.clone(), index))
			.collect();

		for column in REQUIRED_COLUMNS {
			if !indices.contains_key(column) {
				return Err(anyhow!("Missing required column in CSV: {}", column));
			}
		}

		Ok(ColumnMap { indices })
	}

	fn get<'a>(&self, row: &'a [String], column: &str) -> &'a str {
		self.indices
			.get(column)
			.and_then(|&index| row.get(index))
			.map(String::as_str)
			.unwrap_or_default()
	}
}

fn convert_row(row: &[String], columns: &ColumnMap) -> WeaponEntry {
	WeaponEntry {
		name: columns.get(row, "name").to_string(),
		category: columns.get(row, "category").to_string(),
		url: columns.get(row, "url").to_string(),
		sote: parse_bool(columns.get(row, "sote")),
		attack: AttackStats {
			physical: safe_float(columns.get(row, "phyAtk")),
			magic: safe_float(columns.get(row, "magAtk")),
			fire: safe_float(columns.get(row, "fireAtk")),
			lightning: safe_float(columns.get(row, "ligtAtk")),
			holy: safe_float(columns.get(row, "holyAtk")),
			critical: safe_int(columns.get(row, "critAtk")),
		},
		sorcery_scaling: safe_int(columns.get(row, "sorAtk")),
		incantation_scaling: safe_int(columns.get(row, "incAtk")),
		guard: GuardStats {
			physical: safe_float(columns.get(row, "phyGuard")),
			magic: safe_float(columns.get(row, "magGuard")),
			fire: safe_float(columns.get(row, "fireGuard")),
			lightning: safe_float(columns.get(row, "ligtGuard")),
			holy: safe_float(columns.get(row, "holyGuard")),
			boost: safe_int(columns.get(row, "boostGuard")),
		},
		scaling: ScalingGrades {
			strength: safe_str_none(columns.get(row, "strScale")),
			dexterity: safe_str_none(columns.get(row, "dexScale")),
			intelligence: safe_str_none(columns.get(row, "intScale")),
			faith: safe_str_none(columns.get(row, "faiScale")),
			arcane: safe_str_none(columns.get(row, "arcScale")),
		},
		requirements: AttributeValues {
			strength: safe_int(columns.get(row, "strReq")),
			dexterity: safe_int(columns.get(row, "dexReq")),
			intelligence: safe_int(columns.get(row, "intReq")),
			faith: safe_int(columns.get(row, "faiReq")),
			arcane: safe_int(columns.get(row, "arcReq")),
		},
		damage_types: parse_damage_types(columns.get(row, "damageTypes")),
		weapon_skill: WeaponSkill {
			name: safe_str_none(columns.get(row, "weaponSkill")),
			fp_cost: safe_fp_cost(columns.get(row, "fpCost")),
		},
		weight: safe_float(columns.get(row, "weight")),
		upgrade_type: columns.get(row, "upgradeType").to_string(),
		passive_description: safe_str_none(columns.get(row, "passive")),
		status_buildup: StatusBuildup {
			poison: safe_int(columns.get(row, "poison")),
			hemorrhage: safe_int(columns.get(row, "hemorrhage")),
			frostbite: safe_int(columns.get(row, "frostbite")),
			scarlet_rot: safe_int(columns.get(row, "scarletRot")),
			sleep: safe_int(columns.get(row, "sleep")),
			madness: safe_int(columns.get(row, "madness")),
			death_blight: safe_int(columns.get(row, "deathBlight")),
		},
	}
}

#[test]
fn test_convert_row() {
	let header: Vec<String> = REQUIRED_COLUMNS.iter().map(|name| name.to_string()).collect();
	let mut row: Vec<String> = vec!["-".to_string(); header.len()];

	let mut set = |name: &str, value: &str| {
		let index = header.iter().position(|column| column == name).unwrap();
		row[index] = value.to_string();
	};
	set("name", "Moonveil");
	set("category", "Katana");
	set("phyAtk", "73");
	set("magAtk", "87");
	set("critAtk", "100");
	set("strScale", "E");
	set("strReq", "12");
	set("damageTypes", "Slash / Pierce");
	set("weaponSkill", "Transient Moonlight");
	set("fpCost", "10");
	set("weight", "3.5");
	set("hemorrhage", "ERR");
	set("upgradeType", "Somber");
	set("url", "https://example.invalid/Moonveil");

	let columns = ColumnMap::new(&header).unwrap();
	let entry = convert_row(&row, &columns);

	assert_eq!(entry.name, "Moonveil");
	assert_eq!(entry.category, "Katana");
	assert!(!entry.sote);
	assert_eq!(entry.attack.physical, 73.0);
	assert_eq!(entry.attack.magic, 87.0);
	assert_eq!(entry.attack.fire, 0.0);
	assert_eq!(entry.attack.critical, 100);
	assert_eq!(entry.scaling.strength.as_deref(), Some("E"));
	assert_eq!(entry.scaling.dexterity, None);
	assert_eq!(entry.requirements.strength, 12);
	assert_eq!(entry.requirements.intelligence, 0);
	assert_eq!(entry.damage_types, vec!["Slash", "Pierce"]);
	assert_eq!(entry.weapon_skill.name.as_deref(), Some("Transient Moonlight"));
	assert_eq!(entry.weapon_skill.fp_cost, Some(FpCost::Number(10)));
	assert_eq!(entry.weight, 3.5);
	assert_eq!(entry.passive_description, None);
	assert_eq!(entry.status_buildup.hemorrhage, 0);
	assert_eq!(entry.upgrade_type, "Somber");
}

#[test]
fn test_column_map_missing_column() {
	let header: Vec<String> = REQUIRED_COLUMNS
		.iter()
		.filter(|name| **name != "url")
		.map(|name| name.to_string())
		.collect();

	assert!(ColumnMap::new(&header).is_err());
}

fn main() -> Result<()> {
	if pretty_env_logger::try_init().is_err() {
		log::warn!("Logger is already initialized.");
	}

	let args = Args::parse();

	let text = fs::read_to_string(&args.input)?;
	let rows = csv::parse_rows(&text);

	let (header, data_rows) = rows
		.split_first()
		.ok_or_else(|| anyhow!("Input file {} is empty", args.input))?;

	let columns = ColumnMap::new(header)?;

	let mut weapons: Vec<WeaponEntry> = Vec::new();
	for row in data_rows {
		if row.len() != header.len() {
			log::warn!("Skipping malformed row: {:?}", row);
			continue;
		}
		weapons.push(convert_row(row, &columns));
	}

	let file = File::create(&args.output)?;
	let writer = BufWriter::new(file);
	serde_json::to_writer_pretty(writer, &weapons)?;

	log::info!(
		"Converted {} weapons from {} to {}",
		weapons.len(),
		args.input,
		args.output
	);

	Ok(())
}
