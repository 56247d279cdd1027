//! Expression parser
//!
//! Tokenizes the text first so that exponents (`1e-3`) and unit suffixes
//! (`2mm`) stay attached to their numbers, then parses by precedence:
//! `+ -` < `* /` < unary `-` < `^` (right associative).

use crate::ast::{BinOp, Expr, UnaryOp};
use crate::VariableError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number { value: f64, units: String },
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

struct Lexer<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Lexer { input, chars: input.char_indices().collect(), pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.input.len(), |(i, _)| *i)
    }

    fn tokenize(mut self) -> Result<Vec<(usize, Token)>, VariableError> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            let start = self.offset();
            match c {
                c if c.is_whitespace() => {
                    self.pos += 1;
                }
                '0'..='9' | '.' => tokens.push((start, self.number()?)),
                c if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                    let name = self.word();
                    tokens.push((start, Token::Ident(name)));
                }
                '+' | '-' | '*' | '/' | '^' => {
                    self.pos += 1;
                    tokens.push((start, Token::Op(c)));
                }
                '(' => {
                    self.pos += 1;
                    tokens.push((start, Token::LParen));
                }
                ')' => {
                    self.pos += 1;
                    tokens.push((start, Token::RParen));
                }
                ',' => {
                    self.pos += 1;
                    tokens.push((start, Token::Comma));
                }
                other => {
                    return Err(VariableError::parse(start, format!("unexpected character '{}'", other)));
                }
            }
        }
        Ok(tokens)
    }

    fn digits(&mut self) -> usize {
        let mut count = 0;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            count += 1;
        }
        count
    }

    fn number(&mut self) -> Result<Token, VariableError> {
        let start = self.offset();
        let mut digit_count = self.digits();
        if self.peek() == Some('.') {
            self.pos += 1;
            digit_count += self.digits();
        }
        if digit_count == 0 {
            return Err(VariableError::parse(start, "expected digits"));
        }

        // Exponent only when digits follow; otherwise "e" starts a unit
        if matches!(self.peek(), Some('e' | 'E')) {
            let exponent_digits = match self.peek_at(1) {
                Some('+' | '-') => self.peek_at(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent_digits {
                self.pos += 1;
                if matches!(self.peek(), Some('+' | '-')) {
                    self.pos += 1;
                }
                self.digits();
            }
        }

        let end = self.offset();
        let value: f64 = self.input[start..end]
            .parse()
            .map_err(|_| VariableError::parse(start, format!("invalid number '{}'", &self.input[start..end])))?;

        let units = if self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
            self.word()
        } else {
            String::new()
        };
        Ok(Token::Number { value, units })
    }

    fn word(&mut self) -> String {
        let start = self.offset();
        self.pos += 1;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        self.input[start..self.offset()].to_string()
    }
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(p, _)| *p)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), VariableError> {
        let position = self.position();
        match self.next() {
            Some(token) if token == expected => Ok(()),
            _ => Err(VariableError::parse(position, format!("expected {}", what))),
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, VariableError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op('+')) => BinOp::Add,
                Some(Token::Op('-')) => BinOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp(Box::new(left), op, Box::new(right));
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, VariableError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op('*')) => BinOp::Mul,
                Some(Token::Op('/')) => BinOp::Div,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::BinaryOp(Box::new(left), op, Box::new(right));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, VariableError> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Ok(Expr::UnaryOp(UnaryOp::Neg, Box::new(self.parse_unary()?)))
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, VariableError> {
        let base = self.parse_primary()?;
        if self.peek() == Some(&Token::Op('^')) {
            self.pos += 1;
            // -2^2 is -(2^2) but 2^-2 is 2^(-2)
            let exponent = self.parse_unary()?;
            return Ok(Expr::BinaryOp(Box::new(base), BinOp::Pow, Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, VariableError> {
        let position = self.position();
        match self.next() {
            Some(Token::Number { value, units }) => Ok(Expr::Literal { value, units }),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.parse_args()?;
                    return Ok(Expr::FunctionCall(name, args));
                }
                Ok(Expr::Variable(name))
            }
            Some(Token::LParen) => {
                let inner = self.parse_additive()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(token) => Err(VariableError::parse(position, format!("unexpected {:?}", token))),
            None => Err(VariableError::parse(position, "unexpected end of expression")),
        }
    }

    /// Arguments after the opening parenthesis, through the closing one
    fn parse_args(&mut self) -> Result<Vec<Expr>, VariableError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.parse_additive()?);
            let position = self.position();
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                _ => return Err(VariableError::parse(position, "expected ',' or ')'")),
            }
        }
    }
}

/// Parse an expression such as `2*width + 1mm` or `sqrt($a^2 + b^2)`
pub fn parse_expr(input: &str) -> Result<Expr, VariableError> {
    if input.trim().is_empty() {
        return Err(VariableError::parse(0, "empty expression"));
    }
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser { tokens, pos: 0, end: input.len() };
    let expr = parser.parse_additive()?;
    if parser.pos < parser.tokens.len() {
        return Err(VariableError::parse(parser.position(), "unexpected trailing input"));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(value: f64, units: &str) -> Expr {
        Expr::Literal { value, units: units.to_string() }
    }

    fn var(name: &str) -> Expr {
        Expr::Variable(name.to_string())
    }

    fn bin(left: Expr, op: BinOp, right: Expr) -> Expr {
        Expr::BinaryOp(Box::new(left), op, Box::new(right))
    }

    #[test]
    fn test_literals_with_units() {
        assert_eq!(parse_expr("2mm").unwrap(), lit(2.0, "mm"));
        assert_eq!(parse_expr("1e-3GHz").unwrap(), lit(1e-3, "GHz"));
        assert_eq!(parse_expr(".5").unwrap(), lit(0.5, ""));
        // "e" without digits is a unit, not an exponent
        assert_eq!(parse_expr("3em").unwrap(), lit(3.0, "em"));
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expr("a + b * c").unwrap();
        assert_eq!(expr, bin(var("a"), BinOp::Add, bin(var("b"), BinOp::Mul, var("c"))));

        let expr = parse_expr("(a + b) * c").unwrap();
        assert_eq!(expr, bin(bin(var("a"), BinOp::Add, var("b")), BinOp::Mul, var("c")));
    }

    #[test]
    fn test_left_associative() {
        let expr = parse_expr("a - b - c").unwrap();
        assert_eq!(expr, bin(bin(var("a"), BinOp::Sub, var("b")), BinOp::Sub, var("c")));
        let expr = parse_expr("a / b / c").unwrap();
        assert_eq!(expr, bin(bin(var("a"), BinOp::Div, var("b")), BinOp::Div, var("c")));
    }

    #[test]
    fn test_power_is_right_associative() {
        let expr = parse_expr("2^3^2").unwrap();
        assert_eq!(expr, bin(lit(2.0, ""), BinOp::Pow, bin(lit(3.0, ""), BinOp::Pow, lit(2.0, ""))));
    }

    #[test]
    fn test_unary_minus() {
        let expr = parse_expr("-x^2").unwrap();
        assert_eq!(expr, Expr::UnaryOp(UnaryOp::Neg, Box::new(bin(var("x"), BinOp::Pow, lit(2.0, "")))));
        let expr = parse_expr("2*-x").unwrap();
        assert_eq!(expr, bin(lit(2.0, ""), BinOp::Mul, Expr::UnaryOp(UnaryOp::Neg, Box::new(var("x")))));
    }

    #[test]
    fn test_project_variables_and_functions() {
        let expr = parse_expr("max($width, 2mm)").unwrap();
        assert_eq!(expr, Expr::FunctionCall("max".to_string(), vec![var("$width"), lit(2.0, "mm")]));
        assert_eq!(parse_expr("pi()").unwrap(), Expr::FunctionCall("pi".to_string(), vec![]));
    }

    #[test]
    fn test_variables_in_order() {
        let expr = parse_expr("b*a + sin(c) + a").unwrap();
        assert_eq!(expr.variables(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_expr(""), Err(VariableError::Parse { position: 0, .. })));
        assert!(matches!(parse_expr("2 +"), Err(VariableError::Parse { position: 3, .. })));
        assert!(matches!(parse_expr("(a"), Err(VariableError::Parse { .. })));
        assert!(matches!(parse_expr("a b"), Err(VariableError::Parse { position: 2, .. })));
        assert!(matches!(parse_expr("a # b"), Err(VariableError::Parse { position: 2, .. })));
        assert!(matches!(parse_expr("max(a,"), Err(VariableError::Parse { .. })));
    }

    #[test]
    fn test_display() {
        assert_eq!(parse_expr("2mm + a*b").unwrap().to_string(), "(2mm + (a * b))");
    }
}
