use std::collections::HashSet;

use crate::error::{NetlistError, ParserError};
use crate::lexer::{Lexer, Span, Token, TokenKind, token_text};
use crate::netlist_types::{Element, Netlist, ValueSuffix};
use crate::value::{Literal, Value};

/// Parser for the comma separated netlist format:
///
/// ```text
/// * series RLC
/// V1,in,0,Vs
/// R1,in,a,10
/// L1,a,b,1m
/// C1,b,0,C
/// S1,b,0,
/// ```
///
/// One element per line: `name,node,node[,value]`. An empty or missing value
/// marks an ideal switch/diode.
pub struct NetlistParser<'s> {
    src: &'s str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'s> NetlistParser<'s> {
    pub fn new(src: &'s str) -> Result<Self, NetlistError> {
        let tokens = Lexer::new(src).tokenize()?;
        Ok(Self {
            src,
            tokens,
            pos: 0,
        })
    }

    fn peek(&self) -> Token {
        // tokenize always terminates the stream with EOF
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let token = self.peek();
        if token.kind != TokenKind::EOF {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.peek().kind == kind {
            Some(self.bump())
        } else {
            None
        }
    }

    fn skip_whitespace(&mut self) {
        while self.eat(TokenKind::WhiteSpace).is_some() {}
    }

    fn skip_blank_lines(&mut self) {
        while matches!(
            self.peek().kind,
            TokenKind::WhiteSpace | TokenKind::Newline | TokenKind::Comment
        ) {
            self.bump();
        }
    }

    fn at_line_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Newline | TokenKind::EOF | TokenKind::Comment
        )
    }

    pub fn parse(mut self) -> Result<Netlist, NetlistError> {
        let mut elements = Vec::new();
        let mut seen = HashSet::new();

        loop {
            self.skip_blank_lines();
            if self.peek().kind == TokenKind::EOF {
                break;
            }
            let element = self.parse_record()?;
            if !seen.insert(element.name.to_ascii_uppercase()) {
                return Err(NetlistError::DuplicateElement {
                    name: element.name,
                    span: element.span,
                });
            }
            elements.push(element);
        }

        Ok(Netlist::new(elements))
    }

    fn parse_record(&mut self) -> Result<Element, NetlistError> {
        let (name, name_span) = self.parse_field("element name")?;
        self.expect_separator("first node")?;
        let (positive, _) = self.parse_field("first node")?;
        self.expect_separator("second node")?;
        let (negative, negative_span) = self.parse_field("second node")?;

        self.skip_whitespace();
        let value = if self.eat(TokenKind::Comma).is_some() {
            self.parse_value()?
        } else {
            Value::Unresolved
        };

        self.skip_whitespace();
        let end = self.peek();
        match end.kind {
            TokenKind::Newline | TokenKind::EOF | TokenKind::Comment => {}
            TokenKind::Comma => return Err(ParserError::TooManyFields { span: end.span }.into()),
            found => {
                return Err(ParserError::UnexpectedToken {
                    expected: "end of line",
                    found,
                    span: end.span,
                }
                .into());
            }
        }

        let span = name_span.join(negative_span);
        Element::new(name, positive, negative, value)
            .map(|e| e.with_span(span))
            .map_err(|e| attach_span(e, name_span))
    }

    fn expect_separator(&mut self, field: &'static str) -> Result<(), NetlistError> {
        self.skip_whitespace();
        match self.eat(TokenKind::Comma) {
            Some(_) => Ok(()),
            None => Err(ParserError::MissingField {
                field,
                span: self.peek().span,
            }
            .into()),
        }
    }

    /// A name or node label: adjacent identifier/number tokens, e.g. `n1`, `0`, `12a`.
    fn parse_field(&mut self, field: &'static str) -> Result<(String, Span), NetlistError> {
        self.skip_whitespace();
        let first = self.peek();
        if !first.kind.ident_or_numeric() {
            return Err(ParserError::MissingField {
                field,
                span: first.span,
            }
            .into());
        }

        let mut span = first.span;
        while self.peek().kind.ident_or_numeric() {
            span = span.join(self.bump().span);
        }
        Ok((self.src[span.start..=span.end].to_string(), span))
    }

    fn parse_value(&mut self) -> Result<Value, NetlistError> {
        self.skip_whitespace();
        if self.at_line_end() {
            return Ok(Value::Unresolved);
        }

        let t = self.peek();
        match t.kind {
            TokenKind::Ident => {
                self.bump();
                let text = token_text(self.src, &t);
                if text.eq_ignore_ascii_case("inf") {
                    Ok(Value::Numeric(f64::INFINITY))
                } else {
                    Ok(Value::Symbolic(text.to_string()))
                }
            }
            TokenKind::Number | TokenKind::Dot | TokenKind::Minus | TokenKind::Plus => {
                self.parse_literal().map(Value::from)
            }
            found => Err(ParserError::UnexpectedToken {
                expected: "value",
                found,
                span: t.span,
            }
            .into()),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal, NetlistError> {
        let mut number_str = String::new();
        let mut exponent: Option<f64> = None;
        let mut suffix: Option<ValueSuffix> = None;
        let start = self.peek().span;

        if self.eat(TokenKind::Minus).is_some() {
            number_str.push('-');
        } else {
            self.eat(TokenKind::Plus);
        }

        let t = self.bump();
        match t.kind {
            TokenKind::Number => {
                number_str.push_str(token_text(self.src, &t));
                if self.eat(TokenKind::Dot).is_some() {
                    number_str.push('.');
                    if let Some(frac) = self.eat(TokenKind::Number) {
                        number_str.push_str(token_text(self.src, &frac));
                    }
                }
            }
            TokenKind::Dot => {
                number_str.push('.');
                let frac = self
                    .eat(TokenKind::Number)
                    .ok_or(ParserError::ExpectedDigitsAfterDot { span: t.span })?;
                number_str.push_str(token_text(self.src, &frac));
            }
            TokenKind::Ident if token_text(self.src, &t).eq_ignore_ascii_case("inf") => {
                let sign = if number_str.starts_with('-') { -1.0 } else { 1.0 };
                return Ok(Literal::new(sign * f64::INFINITY, None, None));
            }
            found => {
                return Err(ParserError::UnexpectedToken {
                    expected: "digits",
                    found,
                    span: t.span,
                }
                .into());
            }
        }

        // exponent and scale suffix follow without whitespace: `1e3`, `1e-3`, `4.7k`, `2e3Meg`
        if let Some(ident) = self.eat(TokenKind::Ident) {
            let text = token_text(self.src, &ident);
            let rest = text.get(1..).unwrap_or_default();
            if text.starts_with(['e', 'E']) && rest.is_empty() {
                let mut exp_str = String::new();
                if self.eat(TokenKind::Minus).is_some() {
                    exp_str.push('-');
                } else {
                    self.eat(TokenKind::Plus);
                }
                let digits = self.peek();
                if digits.kind != TokenKind::Number {
                    return Err(ParserError::InvalidExponentDigits {
                        span: digits.span,
                        lexeme: self.src[digits.span.start..=digits.span.end].to_string(),
                    }
                    .into());
                }
                self.bump();
                exp_str.push_str(token_text(self.src, &digits));
                exponent = Some(parse_exponent(&exp_str, digits.span)?);

                if let Some(unit) = self.eat(TokenKind::Ident) {
                    suffix = ValueSuffix::from_str(token_text(self.src, &unit));
                }
            } else if text.starts_with(['e', 'E']) && rest.starts_with(|c: char| c.is_ascii_digit()) {
                let split = rest
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(rest.len());
                exponent = Some(parse_exponent(&rest[..split], ident.span)?);
                suffix = ValueSuffix::from_str(&rest[split..]);
            } else {
                suffix = ValueSuffix::from_str(text);
            }
        }

        let value: f64 = number_str
            .parse()
            .map_err(|_| ParserError::InvalidNumericLiteral {
                span: start.join(self.peek().span),
                lexeme: number_str.clone(),
            })?;

        Ok(Literal::new(value, exponent, suffix))
    }
}

fn parse_exponent(digits: &str, span: Span) -> Result<f64, NetlistError> {
    digits.parse::<f64>().map_err(|_| {
        ParserError::InvalidExponentDigits {
            span,
            lexeme: digits.to_string(),
        }
        .into()
    })
}

fn attach_span(error: NetlistError, span: Span) -> NetlistError {
    match error {
        NetlistError::EmptyElementName { .. } => NetlistError::EmptyElementName { span: Some(span) },
        NetlistError::UnsupportedElement {
            name, designator, ..
        } => NetlistError::UnsupportedElement {
            name,
            designator,
            span: Some(span),
        },
        other => other,
    }
}

/// Parse a comma separated netlist.
pub fn parse(input: &str) -> Result<Netlist, NetlistError> {
    NetlistParser::new(input)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist_types::ElementKind;
    use rstest::rstest;

    fn render(netlist: &Netlist) -> String {
        netlist
            .elements
            .iter()
            .map(|e| {
                format!(
                    "{} {} {} {} {:?}",
                    e.name,
                    e.kind.to_char(),
                    e.positive,
                    e.negative,
                    e.value
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn parses_series_rlc_with_switch() {
        let input = "* series RLC\nV1,in,0,Vs\nR1, in, a, 1k\n\nL1,a,b,0.5 # trailing\nC1,b,0,C\nS1,b,0,\nD1,b,0\n";
        let netlist = parse(input).unwrap();
        insta::assert_snapshot!(render(&netlist), @r#"
        V1 V in 0 Symbolic("Vs")
        R1 R in a Numeric(1000.0)
        L1 L a b Numeric(0.5)
        C1 C b 0 Symbolic("C")
        S1 S b 0 Unresolved
        D1 S b 0 Unresolved
        "#);
    }

    #[rstest]
    #[case("1", 1.0)]
    #[case("-2.5", -2.5)]
    #[case(".25", 0.25)]
    #[case("1e3", 1e3)]
    #[case("2E-2", 2e-2)]
    #[case("4.7k", 4700.0)]
    #[case("1Meg", 1e6)]
    #[case("3m", 3e-3)]
    #[case("5V", 5.0)]
    fn parses_numeric_values(#[case] text: &str, #[case] expected: f64) {
        let netlist = parse(&format!("R1,1,0,{text}")).unwrap();
        let value = netlist.elements[0].value.as_numeric().unwrap();
        assert!(
            (value - expected).abs() <= 1e-12 * expected.abs().max(1.0),
            "{text}: {value} != {expected}"
        );
    }

    #[test]
    fn inf_is_an_open_resistor() {
        let netlist = parse("R1,1,0,inf").unwrap();
        assert_eq!(netlist.elements[0].value, Value::Numeric(f64::INFINITY));
    }

    #[test]
    fn short_rows_are_rejected() {
        let err = parse("R1,1\n").unwrap_err();
        assert!(matches!(
            err,
            NetlistError::Parser(ParserError::MissingField {
                field: "second node",
                ..
            })
        ));
    }

    #[test]
    fn extra_fields_are_rejected() {
        let err = parse("R1,1,0,5,6").unwrap_err();
        assert!(matches!(err, NetlistError::Parser(ParserError::TooManyFields { .. })));
        assert_eq!(err.error_span(), Some(Span::new(8, 8)));
    }

    #[test]
    fn unsupported_designator_carries_span() {
        let err = parse("R1,1,0,5\nE1,2,0,1").unwrap_err();
        match err {
            NetlistError::UnsupportedElement {
                designator, span, ..
            } => {
                assert_eq!(designator, 'E');
                assert_eq!(span, Some(Span::new(9, 10)));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = parse("R1,1,0,5\nr1,2,0,1").unwrap_err();
        assert!(matches!(err, NetlistError::DuplicateElement { .. }));
    }

    #[test]
    fn node_labels_keep_their_text() {
        let netlist = parse("C_out,out_1,12a,1").unwrap();
        let element = &netlist.elements[0];
        assert_eq!(element.kind, ElementKind::Capacitor);
        assert_eq!(element.positive.as_str(), "out_1");
        assert_eq!(element.negative.as_str(), "12a");
    }
}
