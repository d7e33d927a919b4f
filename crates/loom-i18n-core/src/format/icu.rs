// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Built-in ICU MessageFormat subset.
//!
//! Supported syntax:
//!
//! | Form | Example |
//! |------|---------|
//! | Simple argument | `Hello, {name}!` |
//! | Number | `{n, number}`, `{n, number, integer}`, `{n, number, percent}`, `{n, number, USD}` |
//! | Date / time | `{d, date, short}`, `{t, time}` |
//! | Select | `{gender, select, female {She} male {He} other {They}}` |
//! | Plural | `{n, plural, offset:1 =0 {nobody} one {# item} other {# items}}` |
//! | Ordinal | `{n, selectordinal, one {#st} two {#nd} few {#rd} other {#th}}` |
//! | Quoting | `It''s`, `'{literal}'` |
//!
//! Named number formats are looked up in [`FormatOptions`] at compile time.

use std::sync::Arc;

use icu::locale::Locale;
use serde_json::Value;

use crate::error::{FormatError, Result};
use crate::format::date::{parse_instant, DateTimeFormat, DateTimeKind};
use crate::format::number::{NumberFormat, NumberOptions};
use crate::format::plural::{PluralCategory, PluralRules};
use crate::format::{CompiledMessage, FormatOptions, MessageArgs, MessageFormatter};
use crate::language::data_locale;

/// The default [`MessageFormatter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IcuMessageFormatter;

impl IcuMessageFormatter {
	pub fn new() -> Self {
		Self
	}
}

impl MessageFormatter for IcuMessageFormatter {
	fn compile(
		&self,
		pattern: &str,
		locale: &str,
		formats: &FormatOptions,
	) -> Result<Arc<dyn CompiledMessage>> {
		let locale = data_locale(locale);
		let nodes = Parser::new(pattern, formats, &locale).parse()?;
		let pound = NumberFormat::try_new(&locale, NumberOptions::default())?;
		Ok(Arc::new(IcuMessage { nodes, pound }))
	}
}

#[derive(Debug, Clone)]
enum Node {
	Text(String),
	Argument(String),
	Number {
		name: String,
		format: Arc<NumberFormat>,
	},
	DateTime {
		name: String,
		format: Arc<DateTimeFormat>,
	},
	Select {
		name: String,
		cases: Vec<(String, Vec<Node>)>,
	},
	Plural {
		name: String,
		rules: Arc<PluralRules>,
		offset: f64,
		exact: Vec<(f64, Vec<Node>)>,
		categories: Vec<(PluralCategory, Vec<Node>)>,
	},
	/// `#` inside a plural branch.
	Pound,
}

struct IcuMessage {
	nodes: Vec<Node>,
	/// Renders `#` inside plural branches.
	pound: NumberFormat,
}

impl CompiledMessage for IcuMessage {
	fn format(&self, args: &MessageArgs) -> Result<String> {
		let mut out = String::new();
		self.render(&self.nodes, args, None, &mut out)?;
		Ok(out)
	}
}

impl IcuMessage {
	fn render(
		&self,
		nodes: &[Node],
		args: &MessageArgs,
		pound: Option<f64>,
		out: &mut String,
	) -> Result<()> {
		for node in nodes {
			match node {
				Node::Text(text) => out.push_str(text),
				Node::Pound => match pound {
					Some(n) => out.push_str(&self.pound.format(n)),
					None => out.push('#'),
				},
				Node::Argument(name) => out.push_str(&display_value(argument(args, name)?)),
				Node::Number { name, format } => {
					let n = as_number(name, argument(args, name)?)?;
					out.push_str(&format.format(n));
				}
				Node::DateTime { name, format } => {
					let instant = parse_instant(name, argument(args, name)?)?;
					out.push_str(&format.format(name, &instant)?);
				}
				Node::Select { name, cases } => {
					let selector = select_key(argument(args, name)?);
					let branch = cases
						.iter()
						.find(|(key, _)| *key == selector)
						.or_else(|| cases.iter().find(|(key, _)| key == "other"))
						.map(|(_, nodes)| nodes);
					if let Some(branch) = branch {
						self.render(branch, args, pound, out)?;
					}
				}
				Node::Plural {
					name,
					rules,
					offset,
					exact,
					categories,
				} => {
					let n = as_number(name, argument(args, name)?)?;
					let adjusted = n - offset;
					let branch = exact
						.iter()
						.find(|(value, _)| *value == n)
						.map(|(_, nodes)| nodes)
						.or_else(|| {
							find_category(categories, rules.category(adjusted))
								.or_else(|| find_category(categories, PluralCategory::Other))
						});
					if let Some(branch) = branch {
						self.render(branch, args, Some(adjusted), out)?;
					}
				}
			}
		}
		Ok(())
	}
}

fn find_category(
	categories: &[(PluralCategory, Vec<Node>)],
	category: PluralCategory,
) -> Option<&Vec<Node>> {
	categories
		.iter()
		.find(|(c, _)| *c == category)
		.map(|(_, nodes)| nodes)
}

fn argument<'a>(args: &'a MessageArgs, name: &str) -> Result<&'a Value> {
	args.get(name)
		.ok_or_else(|| FormatError::MissingArgument(name.to_string()))
}

fn display_value(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		Value::Bool(b) => b.to_string(),
		other => other.to_string(),
	}
}

fn select_key(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => display_value(other),
	}
}

fn as_number(name: &str, value: &Value) -> Result<f64> {
	let parsed = match value {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse::<f64>().ok(),
		_ => None,
	};
	parsed.ok_or_else(|| FormatError::InvalidArgument {
		name: name.to_string(),
		expected: "a number",
	})
}

/// Recursive-descent parser over the pattern's bytes.
struct Parser<'a> {
	src: &'a str,
	pos: usize,
	formats: &'a FormatOptions,
	locale: &'a Locale,
	cardinal: Option<Arc<PluralRules>>,
	ordinal: Option<Arc<PluralRules>>,
}

impl<'a> Parser<'a> {
	fn new(src: &'a str, formats: &'a FormatOptions, locale: &'a Locale) -> Self {
		Self {
			src,
			pos: 0,
			formats,
			locale,
			cardinal: None,
			ordinal: None,
		}
	}

	/// Plural rules are loaded once per pattern and kind.
	fn plural_rules(&mut self, ordinal: bool) -> Result<Arc<PluralRules>> {
		let slot = if ordinal {
			&mut self.ordinal
		} else {
			&mut self.cardinal
		};
		if let Some(rules) = slot.as_ref() {
			return Ok(Arc::clone(rules));
		}
		let rules = Arc::new(if ordinal {
			PluralRules::ordinal(self.locale)?
		} else {
			PluralRules::cardinal(self.locale)?
		});
		*slot = Some(Arc::clone(&rules));
		Ok(rules)
	}

	fn parse(mut self) -> Result<Vec<Node>> {
		let nodes = self.parse_message(false, false)?;
		if self.pos < self.src.len() {
			return Err(FormatError::syntax(self.pos, "unexpected '}'"));
		}
		Ok(nodes)
	}

	fn peek(&self) -> Option<char> {
		self.src[self.pos..].chars().next()
	}

	fn bump(&mut self) -> Option<char> {
		let c = self.peek()?;
		self.pos += c.len_utf8();
		Some(c)
	}

	fn skip_whitespace(&mut self) {
		while self.peek().is_some_and(char::is_whitespace) {
			self.bump();
		}
	}

	fn expect(&mut self, expected: char) -> Result<()> {
		match self.peek() {
			Some(c) if c == expected => {
				self.bump();
				Ok(())
			}
			Some(c) => Err(FormatError::syntax(
				self.pos,
				format!("expected '{expected}', found '{c}'"),
			)),
			None => Err(FormatError::syntax(
				self.pos,
				format!("expected '{expected}', found end of pattern"),
			)),
		}
	}

	/// Read a run of characters up to whitespace or a syntax character.
	fn token(&mut self) -> &'a str {
		let start = self.pos;
		while let Some(c) = self.peek() {
			if c.is_whitespace() || matches!(c, '{' | '}' | ',' | '#' | '\'') {
				break;
			}
			self.bump();
		}
		let src = self.src;
		&src[start..self.pos]
	}

	/// Parse message text until end of input, or until an unmatched `}`
	/// when `nested`.
	fn parse_message(&mut self, in_plural: bool, nested: bool) -> Result<Vec<Node>> {
		let mut nodes = Vec::new();
		let mut text = String::new();

		while let Some(c) = self.peek() {
			match c {
				'}' => {
					if nested {
						break;
					}
					return Err(FormatError::syntax(self.pos, "unexpected '}'"));
				}
				'{' => {
					flush_text(&mut text, &mut nodes);
					nodes.push(self.parse_argument(in_plural)?);
				}
				'#' if in_plural => {
					self.bump();
					flush_text(&mut text, &mut nodes);
					nodes.push(Node::Pound);
				}
				'\'' => self.parse_quote(in_plural, &mut text),
				_ => {
					self.bump();
					text.push(c);
				}
			}
		}

		if nested && self.peek().is_none() {
			return Err(FormatError::syntax(self.pos, "unclosed '{'"));
		}
		flush_text(&mut text, &mut nodes);
		Ok(nodes)
	}

	fn parse_quote(&mut self, in_plural: bool, text: &mut String) {
		self.bump();
		match self.peek() {
			Some('\'') => {
				self.bump();
				text.push('\'');
			}
			Some(c) if c == '{' || c == '}' || (c == '#' && in_plural) => {
				while let Some(c) = self.bump() {
					if c == '\'' {
						if self.peek() == Some('\'') {
							self.bump();
							text.push('\'');
						} else {
							return;
						}
					} else {
						text.push(c);
					}
				}
			}
			_ => text.push('\''),
		}
	}

	fn parse_argument(&mut self, in_plural: bool) -> Result<Node> {
		let open = self.pos;
		self.expect('{')?;
		self.skip_whitespace();

		let name = self.token().to_string();
		if name.is_empty() {
			return Err(FormatError::syntax(self.pos, "expected argument name"));
		}
		self.skip_whitespace();

		match self.peek() {
			Some('}') => {
				self.bump();
				return Ok(Node::Argument(name));
			}
			Some(',') => {
				self.bump();
			}
			_ => return Err(FormatError::syntax(open, "unclosed argument")),
		}

		self.skip_whitespace();
		let kind = self.token().to_string();
		self.skip_whitespace();

		match kind.as_str() {
			"number" => {
				let style = self.parse_style()?;
				let options = NumberOptions::resolve(style.as_deref(), self.formats)?;
				let format = Arc::new(NumberFormat::try_new(self.locale, options)?);
				Ok(Node::Number { name, format })
			}
			"date" | "time" => {
				let style = self.parse_style()?;
				let kind = if kind == "date" {
					DateTimeKind::Date
				} else {
					DateTimeKind::Time
				};
				let format = Arc::new(DateTimeFormat::try_new(self.locale, kind, style.as_deref())?);
				Ok(Node::DateTime { name, format })
			}
			"select" => {
				self.expect(',')?;
				let cases = self.parse_cases(in_plural)?;
				if !cases.iter().any(|(key, _)| key == "other") {
					return Err(FormatError::syntax(open, "select requires an 'other' case"));
				}
				Ok(Node::Select { name, cases })
			}
			"plural" | "selectordinal" => {
				self.expect(',')?;
				self.skip_whitespace();
				let offset = self.parse_offset()?;
				let mut exact = Vec::new();
				let mut categories = Vec::new();
				for (selector, nodes) in self.parse_cases(true)? {
					if let Some(value) = selector.strip_prefix('=') {
						let value = value.parse::<f64>().map_err(|_| {
							FormatError::syntax(open, format!("invalid exact selector '{selector}'"))
						})?;
						exact.push((value, nodes));
					} else {
						let category = selector.parse::<PluralCategory>().map_err(|_| {
							FormatError::syntax(open, format!("invalid plural category '{selector}'"))
						})?;
						categories.push((category, nodes));
					}
				}
				if !categories.iter().any(|(c, _)| *c == PluralCategory::Other) {
					return Err(FormatError::syntax(open, "plural requires an 'other' case"));
				}
				let rules = self.plural_rules(kind == "selectordinal")?;
				Ok(Node::Plural {
					name,
					rules,
					offset,
					exact,
					categories,
				})
			}
			"" => Err(FormatError::syntax(self.pos, "expected argument type")),
			other => Err(FormatError::UnsupportedType(other.to_string())),
		}
	}

	/// Parse `}` or `, style}` after a number/date/time argument type.
	fn parse_style(&mut self) -> Result<Option<String>> {
		match self.peek() {
			Some('}') => {
				self.bump();
				Ok(None)
			}
			Some(',') => {
				self.bump();
				let start = self.pos;
				while self.peek().is_some_and(|c| c != '}' && c != '{') {
					self.bump();
				}
				let style = self.src[start..self.pos].trim().to_string();
				self.expect('}')?;
				if style.is_empty() {
					return Err(FormatError::syntax(start, "expected style"));
				}
				Ok(Some(style))
			}
			_ => Err(FormatError::syntax(self.pos, "expected ',' or '}'")),
		}
	}

	fn parse_offset(&mut self) -> Result<f64> {
		if !self.src[self.pos..].starts_with("offset:") {
			return Ok(0.0);
		}
		self.pos += "offset:".len();
		self.skip_whitespace();
		let start = self.pos;
		let value = self.token();
		let offset = value
			.parse::<f64>()
			.map_err(|_| FormatError::syntax(start, format!("invalid offset '{value}'")))?;
		self.skip_whitespace();
		Ok(offset)
	}

	/// Parse `selector {message}` pairs up to and including the closing `}`.
	fn parse_cases(&mut self, in_plural: bool) -> Result<Vec<(String, Vec<Node>)>> {
		let mut cases = Vec::new();
		loop {
			self.skip_whitespace();
			match self.peek() {
				Some('}') => {
					self.bump();
					break;
				}
				None => return Err(FormatError::syntax(self.pos, "unclosed '{'")),
				_ => {}
			}

			let start = self.pos;
			let selector = self.token().to_string();
			if selector.is_empty() {
				return Err(FormatError::syntax(start, "expected case selector"));
			}
			self.skip_whitespace();
			self.expect('{')?;
			let nodes = self.parse_message(in_plural, true)?;
			self.expect('}')?;
			cases.push((selector, nodes));
		}

		if cases.is_empty() {
			return Err(FormatError::syntax(self.pos, "expected at least one case"));
		}
		Ok(cases)
	}
}

fn flush_text(text: &mut String, nodes: &mut Vec<Node>) {
	if !text.is_empty() {
		nodes.push(Node::Text(std::mem::take(text)));
	}
}
