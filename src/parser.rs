//! Recursive-descent parser.
//!
//! Syntax errors are reported to a `Diagnostics` collector rather than returned.  After an error
//! the parser skips tokens up to the next statement boundary and carries on, so a single run can
//! report several independent errors.  Statements that failed to parse are left out of the
//! resulting program.

use tracing::debug;

use crate::ast::{Expr, Mutability, Stmt};
use crate::diag::{Diagnostics, SourceLocation};
use crate::token::{Token, TokenKind};
use crate::value::Value;

/// Maximum number of arguments in a call and of parameters in a function declaration.
const MAX_ARGUMENTS: usize = 255;

/// Maximum depth of nested statements and expressions.  Keeps both the parser and the
/// evaluator, which walk the tree recursively, well within the stack.
const MAX_NESTING: usize = 128;

/// A syntax error that has already been reported.
#[derive(Debug)]
struct SyntaxError;

type ParseResult<T> = Result<T, SyntaxError>;

/// Parse `tokens` as a whole program.
pub fn parse(tokens: Vec<Token>, file_name: &str) -> (Vec<Stmt>, Diagnostics) {
    Parser::new(tokens, file_name).parse_program()
}

#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    file_name: String,
    diagnostics: Diagnostics,
    depth: usize,
    source_lines: Vec<String>,
}

impl Parser {
    /// Creates a parser over `tokens`.  An `Eof` token is appended if the sequence does not end
    /// with one, the cursor never moves past it.
    pub fn new(mut tokens: Vec<Token>, file_name: impl Into<String>) -> Parser {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let (line, column) = tokens.last().map_or((1, 1), |t| (t.line, t.column));
            tokens.push(Token::new(TokenKind::Eof, "", line, column));
        }
        Parser {
            tokens,
            current: 0,
            file_name: file_name.into(),
            diagnostics: Diagnostics::new(),
            depth: 0,
            source_lines: vec![],
        }
    }

    /// Lines of the parsed text, quoted under the diagnostics they are the subject of.
    pub fn with_source_lines(mut self, source_lines: Vec<String>) -> Parser {
        self.source_lines = source_lines;
        self
    }

    /// Parse all declarations up to the end of input.  Never fails: the statements that could
    /// be built are returned along with everything that was reported.
    pub fn parse_program(mut self) -> (Vec<Stmt>, Diagnostics) {
        let mut prg = vec![];
        while !self.is_at_end() {
            self.depth = 0;
            match self.declaration() {
                Ok(stmt) => prg.push(stmt),
                Err(SyntaxError) => self.synchronize(),
            }
        }
        self.diagnostics.attach_context(&self.source_lines);
        (prg, self.diagnostics)
    }

    /// Parse a single expression spanning all tokens.
    pub fn parse_expression(mut self) -> Result<Expr, Diagnostics> {
        let expr = self.expression();
        if expr.is_ok() && !self.is_at_end() {
            self.error_at_current("Expect end of expression");
        }
        self.diagnostics.attach_context(&self.source_lines);
        match expr {
            Ok(expr) if self.diagnostics.is_empty() => Ok(expr),
            _ => Err(self.diagnostics),
        }
    }

    fn declaration(&mut self) -> ParseResult<Stmt> {
        if self.eat(TokenKind::Var) {
            self.var_declaration(Mutability::Var)
        } else if self.eat(TokenKind::Const) {
            self.var_declaration(Mutability::Const)
        } else if self.eat(TokenKind::Function) {
            self.function_declaration()
        } else {
            self.statement()
        }
    }

    /// Keyword has been consumed already.
    fn var_declaration(&mut self, mutability: Mutability) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect variable name")?;
        let init = if self.eat(TokenKind::Equal) {
            Some(Box::new(self.expression()?))
        } else if mutability == Mutability::Const {
            return Err(self.error_at(&name, "Const declarations must have an initializer"));
        } else {
            None
        };
        self.consume(
            TokenKind::Semicolon,
            "Expect ';' after variable declaration",
        )?;
        Ok(Stmt::VarDecl(name, init, mutability))
    }

    fn function_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect function name")?;
        self.consume(TokenKind::LeftParen, "Expect '(' after function name")?;
        let mut params = vec![];
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    self.error_at_current("Cannot have more than 255 parameters.");
                }
                params.push(self.consume(TokenKind::Identifier, "Expect parameter name")?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters")?;
        self.consume(TokenKind::LeftBrace, "Expect '{' before function body")?;
        let body = self.block()?;
        Ok(Stmt::Function(name, params, body))
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        match self.peek().kind {
            TokenKind::If => {
                self.advance();
                self.if_statement()
            }
            TokenKind::While => {
                self.advance();
                self.while_statement()
            }
            TokenKind::For => {
                self.advance();
                self.for_statement()
            }
            TokenKind::Return => {
                let keyword = self.advance();
                self.return_statement(keyword)
            }
            TokenKind::LeftBrace => {
                self.advance();
                Ok(Stmt::Block(self.block()?))
            }
            TokenKind::Identifier if self.at_print_statement() => {
                let keyword = self.advance();
                self.print_statement(keyword)
            }
            _ => self.expression_statement(),
        }
    }

    /// `print expr;` as opposed to the call form `print(...)` or an expression using a variable
    /// named `print`.  An operator after `print` makes it an operand, so `print -1;` is a
    /// subtraction.
    fn at_print_statement(&self) -> bool {
        self.peek().lexeme == "print"
            && matches!(
                self.peek_next().kind,
                TokenKind::Identifier
                    | TokenKind::Integer
                    | TokenKind::Float
                    | TokenKind::String
                    | TokenKind::True
                    | TokenKind::False
                    | TokenKind::Nil
                    | TokenKind::Bang
            )
    }

    /// Desugared into a call to the `print` builtin so that both forms behave the same.
    fn print_statement(&mut self, keyword: Token) -> ParseResult<Stmt> {
        let value = self.expression()?;
        let terminator = self.consume(TokenKind::Semicolon, "Expect ';' after value")?;
        Ok(Stmt::Expr(Box::new(Expr::Call(
            Box::new(Expr::Var(keyword)),
            terminator,
            vec![value],
        ))))
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition")?;
        let then_branch = self.nested(Parser::statement)?;
        let else_branch = if self.eat(TokenKind::Else) {
            Some(Box::new(self.nested(Parser::statement)?))
        } else {
            None
        };
        Ok(Stmt::If(Box::new(cond), Box::new(then_branch), else_branch))
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after while condition")?;
        let body = self.nested(Parser::statement)?;
        Ok(Stmt::While(Box::new(cond), Box::new(body)))
    }

    /// `for (init; cond; incr) body` becomes `{ init; while (cond) { body; incr; } }`.
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'")?;

        let initializer = if self.eat(TokenKind::Semicolon) {
            None
        } else if self.eat(TokenKind::Var) {
            Some(self.var_declaration(Mutability::Var)?)
        } else {
            Some(self.expression_statement()?)
        };

        let cond = if self.check(TokenKind::Semicolon) {
            Expr::Literal(Value::Bool(true))
        } else {
            self.expression()?
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition")?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses")?;

        let mut body = self.nested(Parser::statement)?;
        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expr(Box::new(increment))]);
        }
        body = Stmt::While(Box::new(cond), Box::new(body));
        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }
        Ok(body)
    }

    fn return_statement(&mut self, keyword: Token) -> ParseResult<Stmt> {
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.expression()?))
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value")?;
        Ok(Stmt::Return(keyword, value))
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression")?;
        Ok(Stmt::Expr(Box::new(expr)))
    }

    /// Opening brace has been consumed already.
    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = vec![];
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            stmts.push(self.nested(Parser::declaration)?);
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block")?;
        Ok(stmts)
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.nested(Parser::assignment)
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let lhs = self.logical_or()?;
        if let Some(equals) = self.eat_any(&[TokenKind::Equal]) {
            let rhs = self.expression()?;
            match lhs {
                Expr::Var(name) => return Ok(Expr::Assign(name, Box::new(rhs))),
                // Reported, but the statement is still built.
                lhs => {
                    self.error_at(&equals, "Invalid assignment target");
                    return Ok(lhs);
                }
            }
        }
        Ok(lhs)
    }

    fn logical_or(&mut self) -> ParseResult<Expr> {
        self.left_associative(&[TokenKind::Or], Parser::logical_and)
    }

    fn logical_and(&mut self) -> ParseResult<Expr> {
        self.left_associative(&[TokenKind::And], Parser::equality)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.left_associative(
            &[TokenKind::BangEqual, TokenKind::EqualEqual],
            Parser::comparison,
        )
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.left_associative(
            &[
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
            ],
            Parser::term,
        )
    }

    fn term(&mut self) -> ParseResult<Expr> {
        self.left_associative(&[TokenKind::Plus, TokenKind::Minus], Parser::factor)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        self.left_associative(
            &[TokenKind::Slash, TokenKind::Star, TokenKind::Percent],
            Parser::unary,
        )
    }

    /// `operand ( op operand )*` for any `op` in `operators`.
    fn left_associative(
        &mut self,
        operators: &[TokenKind],
        operand: fn(&mut Parser) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let outer = self.depth;
        let mut expr = operand(self)?;
        // Each operator adds a level to the left spine of the tree.
        while self.check_any(operators) {
            self.enter()?;
            let op = self.advance();
            let rhs = operand(self)?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(rhs));
        }
        self.depth = outer;
        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if let Some(op) = self.eat_any(&[TokenKind::Bang, TokenKind::Minus]) {
            let operand = self.nested(Parser::unary)?;
            Ok(Expr::Unary(op, Box::new(operand)))
        } else {
            self.call()
        }
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let outer = self.depth;
        let mut expr = self.primary()?;
        while self.check(TokenKind::LeftParen) {
            self.enter()?;
            self.advance();
            expr = self.finish_call(expr)?;
        }
        self.depth = outer;
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut args = vec![];
        if !self.check(TokenKind::RightParen) {
            loop {
                if args.len() >= MAX_ARGUMENTS {
                    self.error_at_current("Cannot have more than 255 arguments.");
                }
                args.push(self.expression()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::Call(Box::new(callee), paren, args))
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        match self.peek().kind {
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(false)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(true)))
            }
            TokenKind::Nil => {
                self.advance();
                Ok(Expr::Literal(Value::Nil))
            }
            TokenKind::Integer => {
                let token = self.advance();
                match parse_integer(&token.lexeme) {
                    Some(n) => Ok(Expr::Literal(Value::Int(n))),
                    None => Err(self.error_at(&token, "Integer literal out of range")),
                }
            }
            TokenKind::Float => {
                let token = self.advance();
                match token.lexeme.parse::<f64>() {
                    Ok(n) => Ok(Expr::Literal(Value::Float(n))),
                    Err(_) => Err(self.error_at(&token, "Invalid float literal")),
                }
            }
            TokenKind::String => {
                let token = self.advance();
                Ok(Expr::Literal(Value::Str(token.lexeme)))
            }
            TokenKind::Identifier => Ok(Expr::Var(self.advance())),
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
                Ok(Expr::Group(Box::new(expr)))
            }
            _ => Err(self.error_at_current("Expect expression.")),
        }
    }

    /// Skip tokens until just after a `;` or just before a keyword starting a statement.
    /// Always consumes at least one token unless already at the end.
    fn synchronize(&mut self) {
        let start = self.current;
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon || self.peek().kind.starts_statement()
            {
                break;
            }
            self.advance();
        }
        debug!(
            skipped = self.current - start,
            line = self.peek().line,
            "resynchronized after syntax error"
        );
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: fn(&mut Parser) -> ParseResult<T>) -> ParseResult<T> {
        let outer = self.depth;
        self.enter()?;
        let result = parse(self);
        self.depth = outer;
        result
    }

    fn enter(&mut self) -> ParseResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_at_current("Expression nested too deeply"));
        }
        self.depth += 1;
        Ok(())
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_next(&self) -> &Token {
        let next = (self.current + 1).min(self.tokens.len() - 1);
        &self.tokens[next]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// Consume the current token and return it.  Stays put on `Eof`.
    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        self.eat_any(&[kind]).is_some()
    }

    fn check_any(&self, kinds: &[TokenKind]) -> bool {
        !self.is_at_end() && kinds.contains(&self.peek().kind)
    }

    fn eat_any(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        if self.check_any(kinds) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(message))
        }
    }

    fn error_at_current(&mut self, message: &str) -> SyntaxError {
        let token = self.peek().clone();
        self.error_at(&token, message)
    }

    fn error_at(&mut self, token: &Token, message: &str) -> SyntaxError {
        let text = match token.kind {
            TokenKind::Eof => format!("{} at end of file", message),
            _ => format!("{} at '{}'", message, token.lexeme),
        };
        let location = SourceLocation::of_token(&self.file_name, token);
        self.diagnostics.error(text, location);
        SyntaxError
    }
}

/// Decimal, `0x` hexadecimal or `0b` binary.  `None` if out of range.
fn parse_integer(lexeme: &str) -> Option<i64> {
    if let Some(hex) = lexeme.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = lexeme.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else {
        lexeme.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    fn tokens(input: &str) -> Vec<Token> {
        let (tokens, diags) = Scanner::new(input.as_bytes(), "test")
            .scan_tokens()
            .expect("scan error");
        assert!(diags.is_empty(), "unexpected lexical errors: {}", diags);
        tokens
    }

    fn parse_expr(input: &str) -> Result<Expr, Diagnostics> {
        Parser::new(tokens(input), "test").parse_expression()
    }

    /// Render the expression, panicking on syntax errors.
    fn expr(input: &str) -> String {
        match parse_expr(input) {
            Ok(e) => e.to_string(),
            Err(diags) => panic!("unexpected syntax errors: {}", diags),
        }
    }

    fn parse_prg(input: &str) -> (Vec<Stmt>, Diagnostics) {
        parse(tokens(input), "test")
    }

    /// Render the statements, panicking on syntax errors.
    fn prg(input: &str) -> Vec<String> {
        let (stmts, diags) = parse_prg(input);
        assert!(diags.is_empty(), "unexpected syntax errors: {}", diags);
        stmts.iter().map(|s| s.to_string()).collect()
    }

    fn messages(diags: &Diagnostics) -> Vec<&str> {
        diags.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn literals() -> Result<(), Diagnostics> {
        assert_eq!(parse_expr("42")?, Expr::Literal(Value::Int(42)));
        assert_eq!(parse_expr("0x1A")?, Expr::Literal(Value::Int(26)));
        assert_eq!(parse_expr("0b101")?, Expr::Literal(Value::Int(5)));
        assert_eq!(parse_expr("3.5")?, Expr::Literal(Value::Float(3.5)));
        assert_eq!(parse_expr("true")?, Expr::Literal(Value::Bool(true)));
        assert_eq!(parse_expr("false")?, Expr::Literal(Value::Bool(false)));
        assert_eq!(parse_expr("nil")?, Expr::Literal(Value::Nil));
        assert_eq!(
            parse_expr("\"hi\"")?,
            Expr::Literal(Value::Str("hi".to_owned()))
        );
        Ok(())
    }

    #[test]
    fn integer_literal_out_of_range() {
        match parse_expr("9223372036854775808") {
            Err(diags) => assert_eq!(
                messages(&diags),
                vec!["Integer literal out of range at '9223372036854775808'"]
            ),
            r => panic!("unexpected output: {:?}", r),
        }
    }

    #[test]
    fn unary_operators() {
        assert_eq!(expr("--42"), "(- (- 42))");
        assert_eq!(expr("!!true"), "(! (! true))");
        assert_eq!(expr("-a * b"), "(* (- a) b)");
    }

    #[test]
    fn factors_have_precedence_over_terms() {
        assert_eq!(expr("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(expr("7 % 3 / 2 - 1"), "(- (/ (% 7 3) 2) 1)");
    }

    #[test]
    fn binary_operators_are_left_associative() {
        assert_eq!(expr("1 + 2 + 3"), "(+ (+ 1 2) 3)");
        assert_eq!(expr("1 == 2 == 3"), "(== (== 1 2) 3)");
        assert_eq!(expr("1 <= 2 >= 3"), "(>= (<= 1 2) 3)");
    }

    #[test]
    fn full_precedence_ladder() {
        assert_eq!(
            expr("a or b and c == d < e + f * -g"),
            "(or a (and b (== c (< d (+ e (* f (- g)))))))"
        );
    }

    #[test]
    fn symbolic_logical_operators() {
        assert_eq!(expr("a && b || c"), "(|| (&& a b) c)");
    }

    #[test]
    fn braced_expr_takes_precedence() {
        assert_eq!(expr("1 * (2 + 3)"), "(* 1 (group (+ 2 3)))");
    }

    #[test]
    fn missing_right_paren() {
        match parse_expr("(1") {
            Err(diags) => {
                assert_eq!(
                    messages(&diags),
                    vec!["Expect ')' after expression. at end of file"]
                );
                let d = diags.iter().next().expect("one diagnostic");
                assert_eq!(d.location, SourceLocation::new("test", 1, 3));
            }
            r => panic!("unexpected output: {:?}", r),
        }
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(expr("a = b = 1"), "(= a (= b 1))");
        assert_eq!(expr("y = (x = 5)"), "(= y (group (= x 5)))");
    }

    #[test]
    fn bad_assignment_lhs_is_reported_but_not_fatal() {
        let (stmts, diags) = parse_prg("(a) = 1; b = 2;");
        assert_eq!(messages(&diags), vec!["Invalid assignment target at '='"]);
        let rendered = stmts.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(rendered, vec!["(group a);", "(= b 2);"]);
    }

    #[test]
    fn calls() {
        assert_eq!(expr("foo()"), "(call foo)");
        assert_eq!(expr("foo(1, false)"), "(call foo 1 false)");
        assert_eq!(expr("f(1)(2)"), "(call (call f 1) 2)");
    }

    #[test]
    fn call_keeps_closing_paren() -> Result<(), Diagnostics> {
        match parse_expr("print(x)")? {
            Expr::Call(callee, paren, args) => {
                assert_eq!(callee.to_string(), "print");
                assert_eq!((paren.kind, paren.line, paren.column), (TokenKind::RightParen, 1, 8));
                assert_eq!(args.len(), 1);
            }
            e => panic!("unexpected output: {:?}", e),
        }
        Ok(())
    }

    #[test]
    fn too_many_arguments_is_reported_but_not_fatal() {
        let args = vec!["0"; MAX_ARGUMENTS + 1].join(", ");
        let (stmts, diags) = parse_prg(&format!("f({});", args));
        assert_eq!(
            messages(&diags),
            vec!["Cannot have more than 255 arguments. at '0'"]
        );
        match stmts.as_slice() {
            [Stmt::Expr(e)] => match e.as_ref() {
                Expr::Call(_, _, args) => assert_eq!(args.len(), MAX_ARGUMENTS + 1),
                e => panic!("unexpected expression: {:?}", e),
            },
            s => panic!("unexpected statements: {:?}", s),
        }
    }

    #[test]
    fn too_many_parameters_is_reported_but_not_fatal() {
        let params = (0..=MAX_ARGUMENTS)
            .map(|i| format!("p{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let (stmts, diags) = parse_prg(&format!("function f({}) {{}}", params));
        assert_eq!(
            messages(&diags),
            vec!["Cannot have more than 255 parameters. at 'p255'"]
        );
        match stmts.as_slice() {
            [Stmt::Function(name, params, body)] => {
                assert_eq!(name.lexeme, "f");
                assert_eq!(params.len(), MAX_ARGUMENTS + 1);
                assert!(body.is_empty());
            }
            s => panic!("unexpected statements: {:?}", s),
        }
    }

    #[test]
    fn expr_stmts() {
        assert_eq!(prg("1; 1+2;"), vec!["1;", "(+ 1 2);"]);
    }

    #[test]
    fn var_decl() {
        assert_eq!(
            prg("var foo; var bar = 2 * 3.14;"),
            vec!["(var foo)", "(var bar (* 2 3.14))"]
        );
    }

    #[test]
    fn const_decl() {
        assert_eq!(prg("const k = 1;"), vec!["(const k 1)"]);
        match &parse_prg("const k = 1;").0[..] {
            [Stmt::VarDecl(name, Some(_), Mutability::Const)] => assert_eq!(name.lexeme, "k"),
            s => panic!("unexpected statements: {:?}", s),
        }
    }

    #[test]
    fn const_without_initializer() {
        let (stmts, diags) = parse_prg("const k; var v = 1;");
        assert_eq!(
            messages(&diags),
            vec!["Const declarations must have an initializer at 'k'"]
        );
        let rendered = stmts.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(rendered, vec!["(var v 1)"]);
    }

    #[test]
    fn print_statement_is_a_call_to_print() {
        assert_eq!(prg("print 1 + 2;"), vec!["(call print (+ 1 2));"]);
        assert_eq!(prg("print(1, 2);"), vec!["(call print 1 2);"]);
    }

    #[test]
    fn print_followed_by_an_operator_is_an_expression() {
        assert_eq!(prg("print = 5;"), vec!["(= print 5);"]);
        assert_eq!(prg("print == 1;"), vec!["(== print 1);"]);
        assert_eq!(prg("print - 1;"), vec!["(- print 1);"]);
        assert_eq!(prg("print;"), vec!["print;"]);
        assert_eq!(prg("print !b;"), vec!["(call print (! b));"]);
        assert_eq!(prg("print print;"), vec!["(call print print);"]);
    }

    #[test]
    fn nesting_limit() {
        let depth = MAX_NESTING - 8;
        let src = format!("{}1{};", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(parse_prg(&src).1.len(), 0);

        let depth = 10_000;
        let src = format!("{}1{}; var after = 1;", "(".repeat(depth), ")".repeat(depth));
        let (stmts, diags) = parse_prg(&src);
        assert_eq!(messages(&diags), vec!["Expression nested too deeply at '('"]);
        let rendered = stmts.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(rendered, vec!["(var after 1)"]);
    }

    #[test]
    fn long_operator_chains_count_as_nesting() {
        let src = format!("x = 1{};", " + 1".repeat(10_000));
        assert_eq!(
            messages(&parse_prg(&src).1),
            vec!["Expression nested too deeply at '+'"]
        );
        let src = format!("x = {}true;", "!".repeat(10_000));
        assert_eq!(
            messages(&parse_prg(&src).1),
            vec!["Expression nested too deeply at '!'"]
        );
        let src = format!("{}{}", "{ ".repeat(10_000), "}".repeat(10_000));
        assert_eq!(parse_prg(&src).1.len(), 1);
    }

    #[test]
    fn blocks() {
        assert_eq!(prg("{ }"), vec!["{ }"]);
        assert_eq!(prg("{ 1; { 2; } }"), vec!["{ 1; { 2; } }"]);
    }

    #[test]
    fn if_stmt() {
        assert_eq!(prg("if (true) 1;"), vec!["(if true 1;)"]);
        assert_eq!(prg("if (true) 1; else 2;"), vec!["(if true 1; 2;)"]);
        assert_eq!(
            prg("if (a) if (b) 1; else 2;"),
            vec!["(if a (if b 1; 2;))"]
        );
    }

    #[test]
    fn while_stmt() {
        assert_eq!(prg("while (true) 1;"), vec!["(while true 1;)"]);
    }

    #[test]
    fn for_stmt_is_desugared_into_while() {
        assert_eq!(
            prg("for (var i = 0; i < 3; i = i + 1) print(i);"),
            vec!["{ (var i 0) (while (< i 3) { (call print i); (= i (+ i 1)); }) }"]
        );
        assert_eq!(prg("for (;;) x;"), vec!["(while true x;)"]);
    }

    #[test]
    fn function_decl() {
        assert_eq!(
            prg("function add(a, b) { return a + b; }"),
            vec!["(function add (a b) (return (+ a b)))"]
        );
        assert_eq!(prg("function f() {}"), vec!["(function f ())"]);
    }

    #[test]
    fn return_stmt() {
        assert_eq!(prg("return;"), vec!["(return)"]);
        assert_eq!(prg("return false;"), vec!["(return false)"]);
    }

    #[test]
    fn missing_semicolon() {
        let (stmts, diags) = parse_prg("1 + 2");
        assert!(stmts.is_empty());
        assert_eq!(
            messages(&diags),
            vec!["Expect ';' after expression at end of file"]
        );
    }

    #[test]
    fn error_recovery_keeps_later_statements() {
        let (stmts, diags) = parse_prg("var x = ; var y = 2; print(y);");
        assert_eq!(messages(&diags), vec!["Expect expression. at ';'"]);
        let rendered = stmts.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(rendered, vec!["(var y 2)", "(call print y);"]);
    }

    #[test]
    fn one_diagnostic_per_broken_statement() {
        let (stmts, diags) = parse_prg("1 +; 2 *; 3;");
        assert_eq!(
            messages(&diags),
            vec!["Expect expression. at ';'", "Expect expression. at ';'"]
        );
        let rendered = stmts.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(rendered, vec!["3;"]);
    }

    #[test]
    fn recovery_stops_before_statement_keywords() {
        let (stmts, diags) = parse_prg(") ) if (true) 1;");
        assert_eq!(diags.len(), 1);
        let rendered = stmts.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(rendered, vec!["(if true 1;)"]);
    }

    #[test]
    fn trailing_malformed_expression() {
        let (stmts, diags) = parse_prg("print(1 + \"x\" +);");
        assert!(stmts.is_empty());
        assert_eq!(messages(&diags), vec!["Expect expression. at ')'"]);
        let d = diags.iter().next().expect("one diagnostic");
        assert_eq!((d.location.line, d.location.column), (1, 14));
    }

    #[test]
    fn diagnostics_carry_file_name() {
        let (_, diags) = Parser::new(tokens("var;"), "script.ms").parse_program();
        assert_eq!(
            diags.to_string(),
            "script.ms:1:4: error: Expect variable name at ';'"
        );
    }

    #[test]
    fn no_tokens_at_all() {
        let (stmts, diags) = Parser::new(vec![], "test").parse_program();
        assert!(stmts.is_empty());
        assert!(diags.is_empty());
    }
}
