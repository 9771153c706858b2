use anyhow::Result;
use std::fs::File;
use std::io::Write;
use std::mem::take;
use std::path::Path;

// Fixed column order per record type; values() lines up with headers()
pub trait Record {
	fn headers() -> &'static [&'static str];
	fn values(&self) -> Vec<String>;
}

// Every data field is quoted so embedded commas, quotes and newlines survive
pub fn quote_field(field: &str) -> String {
	format!("\"{}\"", field.replace('"', "\"\""))
}

pub fn format_row(values: &[String]) -> String {
	values
		.iter()
		.map(|value| quote_field(value))
		.collect::<Vec<_>>()
		.join(",")
}

pub struct CsvSink {
	file: File,
}

impl CsvSink {
	// Recreates the output file and writes the header line up front, so a
	// completed run is always a full re-scrape rather than a merge
	pub fn create(path: &str, headers: &[&str]) -> Result<Self> {
		if Path::new(path).exists() {
			std::fs::remove_file(path)?;
			log::info!("Deleted old output file: {}", path);
		}

		let mut file = File::create(path)?;
		writeln!(file, "{}", headers.join(","))?;

		Ok(CsvSink { file })
	}

	pub fn append(&mut self, values: &[String]) -> Result<()> {
		writeln!(self.file, "{}", format_row(values))?;

		Ok(())
	}
}

// Quote-aware reader used by the JSON converter
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
	let mut rows = Vec::new();
	let mut row = Vec::new();
	let mut field = String::new();
	let mut in_quotes = false;
	let mut chars = text.chars().peekable();

	while let Some(ch) = chars.next() {
		match ch {
			'"' => {
				if in_quotes {
					if chars.peek() == Some(&'"') {
						chars.next();
						field.push('"');
					} else {
						in_quotes = false;
					}
				} else {
					in_quotes = true;
				}
			}
			',' if !in_quotes => row.push(take(&mut field)),
			'\n' | '\r' if !in_quotes => {
				if ch == '\r' && chars.peek() == Some(&'\n') {
					chars.next();
				}
				row.push(take(&mut field));
				if !(row.len() == 1 && row[0].is_empty()) {
					rows.push(take(&mut row));
				} else {
					row.clear();
				}
			}
			_ => field.push(ch),
		}
	}

	if !field.is_empty() || !row.is_empty() {
		row.push(field);
		rows.push(row);
	}

	rows
}

#[test]
fn test_quote_field() {
	const TEST_STRINGS: [(&str, &str); 5] = [
		("Greatsword", "\"Greatsword\""),
		("Slash/Pierce", "\"Slash/Pierce\""),
		("a \"quoted\" word", "\"a \"\"quoted\"\" word\""),
		("one,two", "\"one,two\""),
		("", "\"\""),
	];

	for (input, expected) in TEST_STRINGS {
		let result = quote_field(input);
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

#[test]
fn test_csv_round_trip() {
	let values = vec![
		"Morgott's Cursed Sword".to_string(),
		"Curved Greatsword".to_string(),
		"causes \"bleed\" buildup, sometimes".to_string(),
		"line\nbreak".to_string(),
		"120".to_string(),
		"-".to_string(),
	];

	let line = format!("{}\n", format_row(&values));
	let rows = parse_rows(&line);
	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0], values);
}

#[test]
fn test_parse_rows() {
	let text = "name,category\n\"Misericorde\",\"Dagger\"\n\n\"Ranni's Dark Moon\",\"Sorcery\"\n";
	let rows = parse_rows(text);
	assert_eq!(rows.len(), 3);
	assert_eq!(rows[0], vec!["name", "category"]);
	assert_eq!(rows[1], vec!["Misericorde", "Dagger"]);
	assert_eq!(rows[2], vec!["Ranni's Dark Moon", "Sorcery"]);

	for row in &rows {
		assert_eq!(row.len(), rows[0].len());
	}
}
