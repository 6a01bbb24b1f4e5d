//! # Query Language
//!
//! ```text
//! setup linux                 both words (implicit AND)
//! setup OR install            either word
//! setup -windows              NOT windows, also written `NOT windows`
//! (setup OR install) linux    grouping
//! "getting started"           phrase
//! tag:howto                   field match
//! title:intro*  title:te?t    wildcards
//! modified_time:-7d           modified during the last seven days
//! creation_time:2024          created in 2024
//! modified_time:[2024-01 TO 2024-03}
//! creation_time:>=2024-06-01
//! ```
//!
//! Precedence from loosest to tightest: `OR`, `AND` (explicit or implicit), `NOT`/`-`.
//! Unprefixed clauses search `title`, `page_src` and `tag`. A prefix that is not a known
//! field is kept as part of the text, so `note:todo` is an ordinary search term.
//!
//! Parsing ([`parse`]) is separate from compiling to tantivy queries ([`Compiler`]) so the
//! grammar can be tested without an index.

use super::dates::{self, DateValue};
use super::schema::{FieldKind, IndexFields};
use crate::error::{PikiError, Result};
use chrono::{DateTime, Utc};
use tantivy::query::{
    AllQuery, BooleanQuery, EmptyQuery, Occur, PhraseQuery, Query, QueryParser, RegexQuery,
    TermQuery,
};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, Term};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Clause { field: Option<String>, value: Value },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Word(String),
    Phrase(String),
    Range { lower: Bound, upper: Bound },
    Compare(Comparison, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound {
    Inclusive(String),
    Exclusive(String),
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Gt,
    Ge,
    Lt,
    Le,
}

/// How many parentheses may be open at once.
const MAX_DEPTH: usize = 64;

/// Parses a query string. Blank input yields `Ok(None)`.
pub fn parse(query: &str) -> Result<Option<Expr>> {
    let mut parser = Parser {
        query,
        chars: query.chars().collect(),
        pos: 0,
        depth: 0,
    };
    parser.skip_ws();
    if parser.at_end() {
        return Ok(None);
    }
    let expr = parser.or_expr()?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(parser.error("unbalanced ')'"));
    }
    Ok(Some(expr))
}

struct Parser<'a> {
    query: &'a str,
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<String>) -> PikiError {
        PikiError::InvalidQuery {
            query: self.query.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// End of input or a closing parenthesis.
    fn at_boundary(&self) -> bool {
        self.at_end() || self.peek() == Some(')')
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn at_keyword(&self, word: &str) -> bool {
        let end = self.pos + word.len();
        if end > self.chars.len() || !self.chars[self.pos..end].iter().copied().eq(word.chars()) {
            return false;
        }
        match self.chars.get(end) {
            None => true,
            Some(c) => c.is_whitespace() || *c == '(' || *c == '"',
        }
    }

    fn keyword(&mut self, word: &str) -> bool {
        let found = self.at_keyword(word);
        if found {
            self.pos += word.len();
        }
        found
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut items = vec![self.and_expr()?];
        loop {
            self.skip_ws();
            if !self.keyword("OR") {
                break;
            }
            self.skip_ws();
            if self.at_boundary() {
                return Err(self.error("OR needs a right-hand side"));
            }
            items.push(self.and_expr()?);
        }
        Ok(collapse(items, Expr::Or))
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.at_boundary() || self.at_keyword("OR") {
                break;
            }
            if self.keyword("AND") {
                self.skip_ws();
                if items.is_empty()
                    || self.at_boundary()
                    || self.at_keyword("OR")
                    || self.at_keyword("AND")
                {
                    return Err(self.error("AND needs terms on both sides"));
                }
                continue;
            }
            items.push(self.unary()?);
        }
        if items.is_empty() {
            return Err(self.error("expected a search term"));
        }
        Ok(collapse(items, Expr::And))
    }

    /// Stacked negations cancel out pairwise: `--a` is `a`.
    fn unary(&mut self) -> Result<Expr> {
        let mut negated = false;
        loop {
            if self.keyword("NOT") {
                self.skip_ws();
            } else if self.peek() == Some('-') {
                self.pos += 1;
            } else {
                break;
            }
            negated = !negated;
            if self.at_boundary() || self.peek().is_some_and(char::is_whitespace) {
                return Err(self.error("NOT needs an operand"));
            }
        }

        let expr = self.primary()?;
        Ok(if negated {
            Expr::Not(Box::new(expr))
        } else {
            expr
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.peek() {
            Some('(') => {
                if self.depth >= MAX_DEPTH {
                    return Err(self.error("query nested too deeply"));
                }
                self.depth += 1;
                self.pos += 1;
                let expr = self.or_expr()?;
                self.skip_ws();
                if self.peek() != Some(')') {
                    return Err(self.error("missing ')'"));
                }
                self.pos += 1;
                self.depth -= 1;
                Ok(expr)
            }
            Some('"') => Ok(Expr::Clause {
                field: None,
                value: Value::Phrase(self.quoted()?),
            }),
            _ => self.clause(),
        }
    }

    fn clause(&mut self) -> Result<Expr> {
        let start = self.pos;
        let mut end = start;
        while self
            .chars
            .get(end)
            .is_some_and(|c| c.is_ascii_alphanumeric() || *c == '_')
        {
            end += 1;
        }

        if end > start && self.chars.get(end) == Some(&':') {
            let field: String = self.chars[start..end].iter().collect();
            self.pos = end + 1;
            let value = self.field_value()?;
            return Ok(Expr::Clause {
                field: Some(field),
                value,
            });
        }

        let word = self.word();
        if word.is_empty() {
            return Err(self.error("expected a search term"));
        }
        Ok(Expr::Clause {
            field: None,
            value: Value::Word(word),
        })
    }

    fn field_value(&mut self) -> Result<Value> {
        match self.peek() {
            Some('"') => Ok(Value::Phrase(self.quoted()?)),
            Some('[') | Some('{') => self.range(),
            Some(c @ ('>' | '<')) => {
                self.pos += 1;
                let or_equal = self.peek() == Some('=');
                if or_equal {
                    self.pos += 1;
                }
                let op = match (c, or_equal) {
                    ('>', false) => Comparison::Gt,
                    ('>', true) => Comparison::Ge,
                    ('<', false) => Comparison::Lt,
                    _ => Comparison::Le,
                };
                let value = self.word();
                if value.is_empty() {
                    return Err(self.error(format!("missing value after '{c}'")));
                }
                Ok(Value::Compare(op, value))
            }
            _ => {
                let value = self.word();
                if value.is_empty() {
                    return Err(self.error("missing value after ':'"));
                }
                Ok(Value::Word(value))
            }
        }
    }

    fn range(&mut self) -> Result<Value> {
        let lower_inclusive = self.peek() == Some('[');
        self.pos += 1;
        let close = self.chars[self.pos..]
            .iter()
            .position(|c| *c == ']' || *c == '}')
            .ok_or_else(|| self.error("unterminated range"))?;
        let body: String = self.chars[self.pos..self.pos + close].iter().collect();
        let upper_inclusive = self.chars[self.pos + close] == ']';
        self.pos += close + 1;

        let parts: Vec<&str> = body.split_whitespace().collect();
        let [lower, "TO", upper] = parts.as_slice() else {
            return Err(self.error("ranges are written [lower TO upper]"));
        };
        Ok(Value::Range {
            lower: bound(lower, lower_inclusive),
            upper: bound(upper, upper_inclusive),
        })
    }

    fn quoted(&mut self) -> Result<String> {
        self.pos += 1;
        let close = self.chars[self.pos..]
            .iter()
            .position(|c| *c == '"')
            .ok_or_else(|| self.error("unterminated quote"))?;
        let phrase = self.chars[self.pos..self.pos + close].iter().collect();
        self.pos += close + 1;
        Ok(phrase)
    }

    fn word(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '"'))
        {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }
}

fn collapse(mut items: Vec<Expr>, wrap: fn(Vec<Expr>) -> Expr) -> Expr {
    if items.len() == 1 {
        items.remove(0)
    } else {
        wrap(items)
    }
}

fn bound(value: &str, inclusive: bool) -> Bound {
    match (value, inclusive) {
        ("*", _) => Bound::Open,
        (v, true) => Bound::Inclusive(v.to_string()),
        (v, false) => Bound::Exclusive(v.to_string()),
    }
}

fn has_wildcard(word: &str) -> bool {
    word.contains(|c| c == '*' || c == '?')
}

/// `intro*` -> `intro.*`. Everything except the wildcards is matched literally.
fn wildcard_regex(pattern: &str) -> String {
    let mut regex = String::new();
    for c in pattern.chars() {
        match c {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            c => regex.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    regex
}

/// Turns a parsed [`Expr`] into a tantivy query against one index.
pub struct Compiler<'a> {
    pub index: &'a Index,
    pub fields: &'a IndexFields,
    pub query: &'a str,
    pub now: DateTime<Utc>,
}

impl Compiler<'_> {
    fn error(&self, reason: impl Into<String>) -> PikiError {
        PikiError::InvalidQuery {
            query: self.query.to_string(),
            reason: reason.into(),
        }
    }

    pub fn compile(&self, expr: &Expr) -> Result<Box<dyn Query>> {
        match expr {
            Expr::And(items) => {
                let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
                for item in items {
                    match item {
                        Expr::Not(inner) => clauses.push((Occur::MustNot, self.compile(inner)?)),
                        other => clauses.push((Occur::Must, self.compile(other)?)),
                    }
                }
                if clauses.iter().all(|(occur, _)| *occur == Occur::MustNot) {
                    clauses.push((Occur::Must, Box::new(AllQuery)));
                }
                Ok(Box::new(BooleanQuery::new(clauses)))
            }
            Expr::Or(items) => {
                let clauses = items
                    .iter()
                    .map(|item| Ok((Occur::Should, self.compile(item)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Box::new(BooleanQuery::new(clauses)))
            }
            Expr::Not(inner) => Ok(Box::new(BooleanQuery::new(vec![
                (Occur::Must, Box::new(AllQuery) as Box<dyn Query>),
                (Occur::MustNot, self.compile(inner)?),
            ]))),
            Expr::Clause { field, value } => self.clause(field.as_deref(), value),
        }
    }

    fn clause(&self, field: Option<&str>, value: &Value) -> Result<Box<dyn Query>> {
        let Some(name) = field else {
            return self.any_default_field(value);
        };
        match self.fields.resolve(name) {
            Some(FieldKind::Text(field)) => self.text(field, value),
            Some(FieldKind::Exact(field)) => self.exact(field, value),
            Some(FieldKind::Date(name)) => self.date(name, value),
            None => {
                let value = match value {
                    Value::Word(word) => Value::Word(format!("{name}:{word}")),
                    Value::Phrase(phrase) => Value::Phrase(format!("{name} {phrase}")),
                    _ => return Err(self.error(format!("unknown field '{name}'"))),
                };
                self.any_default_field(&value)
            }
        }
    }

    fn any_default_field(&self, value: &Value) -> Result<Box<dyn Query>> {
        let clauses = self
            .fields
            .defaults()
            .into_iter()
            .map(|field| Ok((Occur::Should, self.text(field, value)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    fn text(&self, field: Field, value: &Value) -> Result<Box<dyn Query>> {
        match value {
            Value::Word(word) if has_wildcard(word) => self.wildcard(field, &word.to_lowercase()),
            Value::Word(text) | Value::Phrase(text) => self.tokens(field, text),
            _ => Err(self.error(
                "ranges and comparisons only apply to creation_time and modified_time",
            )),
        }
    }

    fn exact(&self, field: Field, value: &Value) -> Result<Box<dyn Query>> {
        match value {
            Value::Word(word) if has_wildcard(word) => self.wildcard(field, word),
            Value::Word(text) | Value::Phrase(text) => Ok(Box::new(TermQuery::new(
                Term::from_field_text(field, text),
                IndexRecordOption::Basic,
            ))),
            _ => Err(self.error(
                "ranges and comparisons only apply to creation_time and modified_time",
            )),
        }
    }

    /// Runs the field's tokenizer so query terms match indexed terms. Several tokens
    /// become a phrase.
    fn tokens(&self, field: Field, text: &str) -> Result<Box<dyn Query>> {
        let mut analyzer = self.index.tokenizer_for_field(field)?;
        let mut stream = analyzer.token_stream(text);
        let mut terms = Vec::new();
        while stream.advance() {
            terms.push(Term::from_field_text(field, &stream.token().text));
        }
        Ok(match terms.len() {
            0 => Box::new(EmptyQuery),
            1 => Box::new(TermQuery::new(
                terms.remove(0),
                IndexRecordOption::WithFreqs,
            )),
            _ => Box::new(PhraseQuery::new(terms)),
        })
    }

    fn wildcard(&self, field: Field, pattern: &str) -> Result<Box<dyn Query>> {
        let query = RegexQuery::from_pattern(&wildcard_regex(pattern), field)
            .map_err(|e| self.error(e.to_string()))?;
        Ok(Box::new(query))
    }

    fn date(&self, name: &str, value: &Value) -> Result<Box<dyn Query>> {
        let (lower, upper) = match value {
            Value::Word(text) | Value::Phrase(text) => {
                let span = self.date_value(text)?.matching();
                (Some(span.start), Some(span.end))
            }
            Value::Compare(op, text) => {
                let span = self.date_value(text)?.span();
                match op {
                    Comparison::Gt => (Some(span.end), None),
                    Comparison::Ge => (Some(span.start), None),
                    Comparison::Lt => (None, Some(span.start)),
                    Comparison::Le => (None, Some(span.end)),
                }
            }
            Value::Range { lower, upper } => {
                let lower = match lower {
                    Bound::Open => None,
                    Bound::Inclusive(text) => Some(self.date_value(text)?.span().start),
                    Bound::Exclusive(text) => Some(self.date_value(text)?.span().end),
                };
                let upper = match upper {
                    Bound::Open => None,
                    Bound::Inclusive(text) => Some(self.date_value(text)?.span().end),
                    Bound::Exclusive(text) => Some(self.date_value(text)?.span().start),
                };
                (lower, upper)
            }
        };
        self.epoch_range(name, lower, upper)
    }

    fn date_value(&self, text: &str) -> Result<DateValue> {
        dates::parse(text, self.now).ok_or_else(|| self.error(format!("'{text}' is not a date")))
    }

    /// `[lower, upper)` over an i64 field. Open ends match everything on that side.
    fn epoch_range(
        &self,
        name: &str,
        lower: Option<i64>,
        upper: Option<i64>,
    ) -> Result<Box<dyn Query>> {
        if lower.is_none() && upper.is_none() {
            return Ok(Box::new(AllQuery));
        }
        let bound = |b: Option<i64>| b.map_or_else(|| "*".to_string(), |v| v.to_string());
        let range = format!("{}:[{} TO {}}}", name, bound(lower), bound(upper));
        QueryParser::for_index(self.index, Vec::new())
            .parse_query(&range)
            .map_err(|e| self.error(e.to_string()))
    }
}
