use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

// Shared Selectors
pub static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
pub static SPAN_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("span").unwrap());
pub static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
pub static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
pub static TD_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
pub static TR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
pub static H2_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
pub static LI_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());
pub static INFOBOX_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("#infobox").unwrap());
pub static WIKI_CONTENT_SELECTOR: Lazy<Selector> =
	Lazy::new(|| Selector::parse("#wiki-content-block").unwrap());
pub static LINELEFT_SELECTOR: Lazy<Selector> =
	Lazy::new(|| Selector::parse("div.lineleft").unwrap());

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+(\.\d+)?").unwrap());
static PAREN_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d+)\)").unwrap());

// Wiki pages for status effects that can appear inside a weapon's passive cell
pub const STATUS_EFFECT_PATHS: [&str; 7] = [
	"/Poison",
	"/Hemorrhage",
	"/Frostbite",
	"/Scarlet+Rot",
	"/Sleep",
	"/Madness",
	"/Death+Blight",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribute {
	Strength,
	Dexterity,
	Intelligence,
	Faith,
	Arcane,
}

impl Attribute {
	// Abbreviation used in weapon infobox blobs ("Str 12 Dex 14")
	pub fn label(self) -> &'static str {
		match self {
			Attribute::Strength => "Str",
			Attribute::Dexterity => "Dex",
			Attribute::Intelligence => "Int",
			Attribute::Faith => "Fai",
			Attribute::Arcane => "Arc",
		}
	}

	// Full name used on spell pages ("Intelligence 14")
	pub fn full_name(self) -> &'static str {
		match self {
			Attribute::Strength => "Strength",
			Attribute::Dexterity => "Dexterity",
			Attribute::Intelligence => "Intelligence",
			Attribute::Faith => "Faith",
			Attribute::Arcane => "Arcane",
		}
	}
}

//Helper Functions
pub fn raw_text(element: ElementRef) -> String {
	element.text().collect::<Vec<_>>().join("")
}

pub fn element_text(element: ElementRef) -> String {
	raw_text(element).trim().to_string()
}

// Numeric cell values: a number is taken verbatim, anything else (including
// the "-" placeholder) counts as zero
pub fn value_or_zero(text: &str) -> String {
	match NUMBER_RE.find(text) {
		Some(mat) => mat.as_str().to_string(),
		None => "0".to_string(),
	}
}

#[test]
fn test_value_or_zero() {
	const TEST_STRINGS: [(&str, &str); 10] = [
		("FP 12", "12"),
		("FP 12 (24)", "12"),
		("FP -", "0"),
		("-", "0"),
		("", "0"),
		("Wgt. 6.5", "6.5"),
		("Wgt. 23.0", "23.0"),
		("120", "120"),
		("Physical 120", "120"),
		("No value here", "0"),
	];

	for (input, expected) in TEST_STRINGS {
		let result = value_or_zero(input);
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

// Scaling grades sit in one text blob ("Scaling Str D Dex E"); a grade is a
// single letter, "-" when the weapon does not scale with the attribute
pub fn scaling_grade(text: &str, attribute: Attribute) -> String {
	let re = Regex::new(&format!(r"{}\s+([ABCDES-])", attribute.label())).unwrap();

	re.captures(text)
		.and_then(|caps| caps.get(1))
		.map(|mat| mat.as_str().to_string())
		.unwrap_or_else(|| "-".to_string())
}

#[test]
fn test_scaling_grade() {
	const TEST_STRINGS: [(&str, Attribute, &str); 8] = [
		("Scaling Str E Dex D Int -", Attribute::Strength, "E"),
		("Scaling Str E Dex D Int -", Attribute::Dexterity, "D"),
		("Scaling Str E Dex D Int -", Attribute::Intelligence, "-"),
		("Scaling Str E Dex D Int -", Attribute::Faith, "-"),
		("Str B Dex B Arc S", Attribute::Arcane, "S"),
		("Str A", Attribute::Strength, "A"),
		("no grades in sight", Attribute::Strength, "-"),
		("", Attribute::Dexterity, "-"),
	];

	for (input, attribute, expected) in TEST_STRINGS {
		let result = scaling_grade(input, attribute);
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

// Attribute requirements: digits after the label, "-" when the attribute is
// not listed at all
pub fn requirement_value(text: &str, label: &str) -> String {
	let re = Regex::new(&format!(r"{}\s+(\d+)", label)).unwrap();

	re.captures(text)
		.and_then(|caps| caps.get(1))
		.map(|mat| mat.as_str().to_string())
		.unwrap_or_else(|| "-".to_string())
}

#[test]
fn test_requirement_value() {
	const TEST_STRINGS: [(&str, &str, &str); 8] = [
		("Str 12 Dex 14 Int -", "Str", "12"),
		("Str 12 Dex 14 Int -", "Dex", "14"),
		("Str 12 Dex 14 Int -", "Int", "-"),
		("Str 12 Dex 14 Int -", "Fai", "-"),
		("Requires Intelligence 60 Faith 0", "Intelligence", "60"),
		("Requires Intelligence 60 Faith 0", "Faith", "0"),
		("Requires Intelligence 60 Faith 0", "Arcane", "-"),
		("", "Str", "-"),
	];

	for (input, label, expected) in TEST_STRINGS {
		let result = requirement_value(input, label);
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

// Stat cells are identified by their icon rather than by text
pub fn find_marker_cell<'a>(scope: ElementRef<'a>, img_title: &str) -> Option<ElementRef<'a>> {
	scope.select(&TD_SELECTOR).find(|cell| {
		cell.select(&IMG_SELECTOR)
			.any(|img| img.value().attr("title") == Some(img_title))
	})
}

pub fn find_link_with_title<'a>(scope: ElementRef<'a>, title_part: &str) -> Option<ElementRef<'a>> {
	scope.select(&ANCHOR_SELECTOR).find(|link| {
		link.value()
			.attr("title")
			.map_or(false, |title| title.contains(title_part))
	})
}

pub fn find_span_with_text<'a>(scope: ElementRef<'a>, label: &str) -> Option<ElementRef<'a>> {
	scope
		.select(&SPAN_SELECTOR)
		.find(|span| element_text(*span).contains(label))
}

// Values follow their marker as bare text nodes. The node is either a direct
// sibling of the marker, a sibling of the marker's wrapper, or a span that
// follows the marker.
pub fn next_text_value(element: ElementRef) -> String {
	if let Some(node) = element.next_sibling() {
		if let Some(text) = node.value().as_text() {
			let trimmed = text.trim();
			if !trimmed.is_empty() {
				return trimmed.to_string();
			}
		}
	}

	if let Some(parent) = element.parent() {
		if let Some(node) = parent.next_sibling() {
			if let Some(text) = node.value().as_text() {
				let trimmed = text.trim();
				if !trimmed.is_empty() {
					return trimmed.to_string();
				}
			}
		}
	}

	if let Some(sibling) = element.next_siblings().find_map(ElementRef::wrap) {
		if sibling.value().name() == "span" {
			return element_text(sibling);
		}
	}

	String::new()
}

#[test]
fn test_next_text_value() {
	use scraper::Html;

	// Direct sibling text node
	let document =
		Html::parse_fragment(r#"<div><a title="Physical Damage">Physical</a> 120</div>"#);
	let link = document.select(&ANCHOR_SELECTOR).next().unwrap();
	assert_eq!(next_text_value(link), "120");

	// Marker wrapped in another element
	let document =
		Html::parse_fragment(r#"<div><b><a title="Magic Damage">Magic</a></b> 77</div>"#);
	let link = document.select(&ANCHOR_SELECTOR).next().unwrap();
	assert_eq!(next_text_value(link), "77");

	// Value rendered inside a following span
	let document =
		Html::parse_fragment(r#"<div><a title="Sorcery Scaling">Sor</a><span>38</span></div>"#);
	let link = document.select(&ANCHOR_SELECTOR).next().unwrap();
	assert_eq!(next_text_value(link), "38");

	// Nothing after the marker
	let document = Html::parse_fragment(r#"<div><a title="Holy Damage">Holy</a></div>"#);
	let link = document.select(&ANCHOR_SELECTOR).next().unwrap();
	assert_eq!(next_text_value(link), "");
}

// Direct text node of the cell itself, e.g. the "Phy 58" line of the guard
// block which has no marker of its own
pub fn direct_text_starting_with(scope: ElementRef, prefix: &str) -> String {
	scope
		.children()
		.filter_map(|node| node.value().as_text())
		.map(|text| text.trim())
		.find(|text| text.starts_with(prefix))
		.map(|text| text.to_string())
		.unwrap_or_default()
}

#[test]
fn test_direct_text_starting_with() {
	use scraper::Html;

	let document = Html::parse_fragment(
		r#"<div>Phy 58<span>Mag</span> 37<span>Boost</span> 42</div>"#,
	);
	let div = document
		.select(&Selector::parse("div").unwrap())
		.next()
		.unwrap();
	assert_eq!(direct_text_starting_with(div, "Phy"), "Phy 58");
	assert_eq!(direct_text_starting_with(div, "Mag"), "");
}

// Status buildup is linked from the passive cell with the amount in the link
// text, e.g. "Hemorrhage (66)". A link without the amount is a wiki layout
// change and gets flagged rather than silently zeroed.
pub fn status_potency(cell: ElementRef, effect: &str) -> String {
	match find_link_with_title(cell, effect) {
		Some(link) => {
			let text = element_text(link);
			PAREN_NUMBER_RE
				.captures(&text)
				.and_then(|caps| caps.get(1))
				.map(|mat| mat.as_str().to_string())
				.unwrap_or_else(|| "ERR".to_string())
		}
		None => "-".to_string(),
	}
}

#[test]
fn test_status_potency() {
	use scraper::Html;

	let document = Html::parse_document(
		r#"<table><tr><td>
			<a href="/Hemorrhage" title="Hemorrhage">Hemorrhage (66)</a>
			<a href="/Poison" title="Poison">Poison buildup</a>
		</td></tr></table>"#,
	);
	let cell = document.select(&TD_SELECTOR).next().unwrap();
	assert_eq!(status_potency(cell, "Hemorrhage"), "66");
	assert_eq!(status_potency(cell, "Poison"), "ERR");
	assert_eq!(status_potency(cell, "Frostbite"), "-");
}

fn is_status_paragraph(paragraph: ElementRef) -> bool {
	paragraph.select(&ANCHOR_SELECTOR).any(|link| {
		link.value()
			.attr("href")
			.map_or(false, |href| STATUS_EFFECT_PATHS.contains(&href))
	})
}

fn is_passive_marker(link: ElementRef) -> bool {
	link.select(&IMG_SELECTOR)
		.any(|img| img.value().attr("title") == Some("Passive Effects"))
		|| element_text(link).contains("Passive")
}

fn text_without_passive_marker(element: ElementRef, out: &mut String) {
	for child in element.children() {
		if let Some(text) = child.value().as_text() {
			out.push_str(text);
		} else if let Some(child_element) = ElementRef::wrap(child) {
			if child_element.value().name() == "a" && is_passive_marker(child_element) {
				continue;
			}
			text_without_passive_marker(child_element, out);
		}
	}
}

// The passive cell holds up to two paragraphs: a status-effect line (linking
// one of the status pages) and a free-form passive description. Whichever
// paragraph is not the status line is the passive description.
pub fn passive_description(cell: ElementRef) -> String {
	let paragraphs: Vec<ElementRef> = cell.select(&PARAGRAPH_SELECTOR).collect();
	if paragraphs.is_empty() {
		return "-".to_string();
	}

	let status_index = paragraphs
		.iter()
		.position(|paragraph| is_status_paragraph(*paragraph));

	let passive_index = if paragraphs.len() == 1 {
		match status_index {
			Some(0) => None,
			_ => Some(0),
		}
	} else {
		match status_index {
			Some(0) => Some(1),
			Some(1) => Some(0),
			_ => Some(0),
		}
	};

	let index = match passive_index {
		Some(index) => index,
		None => return "-".to_string(),
	};

	let mut text = String::new();
	text_without_passive_marker(paragraphs[index], &mut text);
	let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

	if text.is_empty() {
		"-".to_string()
	} else {
		text
	}
}

#[test]
fn test_passive_description() {
	use scraper::Html;

	// Status paragraph first, passive second
	let document = Html::parse_document(
		r#"<table><tr><td>
			<p><a href="/Hemorrhage" title="Hemorrhage">Hemorrhage (66)</a></p>
			<p><a><img title="Passive Effects"></a>Causes blood loss buildup</p>
		</td></tr></table>"#,
	);
	let cell = document.select(&TD_SELECTOR).next().unwrap();
	assert_eq!(passive_description(cell), "Causes blood loss buildup");

	// Passive paragraph first, status second
	let document = Html::parse_document(
		r#"<table><tr><td>
			<p>Boosts magic damage</p>
			<p><a href="/Frostbite" title="Frostbite">Frostbite (55)</a></p>
		</td></tr></table>"#,
	);
	let cell = document.select(&TD_SELECTOR).next().unwrap();
	assert_eq!(passive_description(cell), "Boosts magic damage");

	// Lone status paragraph means no passive description
	let document = Html::parse_document(
		r#"<table><tr><td>
			<p><a href="/Poison" title="Poison">Poison (45)</a></p>
		</td></tr></table>"#,
	);
	let cell = document.select(&TD_SELECTOR).next().unwrap();
	assert_eq!(passive_description(cell), "-");

	// Lone passive paragraph with a "Passive" text link stripped out
	let document = Html::parse_document(
		r#"<table><tr><td>
			<p><a href="/Passive+Effects">Passive</a> Improves stance damage</p>
		</td></tr></table>"#,
	);
	let cell = document.select(&TD_SELECTOR).next().unwrap();
	assert_eq!(passive_description(cell), "Improves stance damage");

	// No paragraphs at all
	let document = Html::parse_document(r#"<table><tr><td>-</td></tr></table>"#);
	let cell = document.select(&TD_SELECTOR).next().unwrap();
	assert_eq!(passive_description(cell), "-");
}
