//! Action traces: the sequence of parser actions for one compilation unit.
//!
//! The grammar-driven parser lives outside this crate. A trace records the
//! actions it would fire, one per line, so the engine can be driven from a
//! file:
//!
//! ```text
//! declare_type int
//! declare_variable x
//! push_operand 2
//! push_operator +
//! push_operand 3
//! reduce additive
//! assign x
//! ```

use crate::codegen::QuadGenerator;
use crate::error::{
    QuadraResult, SemanticResult, SourceLocation, semantic_error, trace_error,
};
use crate::lexer::{Token, TokenWithLocation};
use crate::semantic::{Operator, OperatorClass};
use crate::types::{Access, Literal, OperandToken};

/// One parser action with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    DeclareClass(String),
    SetParent(String),
    FinishClass,
    DeclareFunction(String),
    SetAccess(Access),
    DeclareType(String),
    DeclareVariable(String),
    EnterParams,
    ExitParams,
    PushOperand(OperandToken),
    PushOperator(Operator),
    Reduce(Vec<Operator>),
    DiscardFakeBottom,
    DiscardValue,
    Assign(String),
    Write(Option<String>),
    Read,
    IfTest,
    ElseBranch,
    EndIf,
    WhileHeader,
    EndWhile,
    FunctionBodyBegin,
    ProgramEntry,
    FunctionEnd { is_main: bool },
    Return,
    CallParent(String),
    EndParentCall,
    BeginCall(String),
    BeginParams,
    PassParam,
    AdvanceParam,
    EndParams,
    AttributeCall(String),
    EndCall,
    SwitchFunction(String),
    SwitchInstance(String),
}

impl Action {
    /// Fires the action on `generator`.
    pub fn apply(&self, generator: &mut QuadGenerator) -> SemanticResult<()> {
        match self {
            Action::DeclareClass(name) => generator.declare_class(name),
            Action::SetParent(name) => generator.set_parent(name),
            Action::FinishClass => generator.finish_class(),
            Action::DeclareFunction(name) => generator.declare_function(name),
            Action::SetAccess(access) => generator.set_access(*access),
            Action::DeclareType(name) => generator.declare_type(name),
            Action::DeclareVariable(name) => generator.declare_variable(name),
            Action::EnterParams => generator.enter_parameter_list(),
            Action::ExitParams => generator.exit_parameter_list(),
            Action::PushOperand(token) => generator.push_operand(token.clone()),
            Action::PushOperator(operator) => generator.push_operator(*operator),
            Action::Reduce(ready) => generator.reduce_if_ready(ready),
            Action::DiscardFakeBottom => generator.discard_fake_bottom(),
            Action::DiscardValue => generator.discard_value(),
            Action::Assign(target) => generator.assign(target),
            Action::Write(text) => generator.write(text.as_deref()),
            Action::Read => generator.read(),
            Action::IfTest => generator.if_test(),
            Action::ElseBranch => generator.else_branch(),
            Action::EndIf => generator.end_if(),
            Action::WhileHeader => generator.while_header(),
            Action::EndWhile => generator.end_while(),
            Action::FunctionBodyBegin => generator.function_body_begin(),
            Action::ProgramEntry => generator.program_entry_mark(),
            Action::FunctionEnd { is_main } => generator.function_end(*is_main),
            Action::Return => generator.return_statement(),
            Action::CallParent(name) => generator.call_parent(name),
            Action::EndParentCall => generator.end_parent_call(),
            Action::BeginCall(name) => generator.begin_call(name),
            Action::BeginParams => generator.begin_param_collection(),
            Action::PassParam => generator.pass_param(),
            Action::AdvanceParam => generator.advance_param(),
            Action::EndParams => generator.end_param_pass(),
            Action::AttributeCall(name) => generator.attribute_call(name),
            Action::EndCall => generator.end_call(),
            Action::SwitchFunction(name) => generator.switch_callee_function(name),
            Action::SwitchInstance(name) => generator.switch_instance(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceLine {
    pub loc: SourceLocation,
    pub action: Action,
}

struct Parser {
    tokens: Vec<TokenWithLocation>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<TokenWithLocation>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Next token, if it is still on `line`.
    fn peek_on(&self, line: usize) -> Option<&TokenWithLocation> {
        self.tokens.get(self.pos).filter(|t| t.loc.line == line)
    }

    fn advance(&mut self) -> Option<TokenWithLocation> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse(&mut self) -> QuadraResult<Vec<TraceLine>> {
        let mut lines = Vec::new();
        while let Some(head) = self.advance() {
            let loc = head.loc;
            let Token::Identifier(name) = head.token else {
                return Err(trace_error(loc, "expected an action name"));
            };
            let action = self.parse_action(&name, loc)?;
            if let Some(extra) = self.peek_on(loc.line) {
                return Err(trace_error(
                    extra.loc,
                    format!("unexpected argument {:?} for {}", extra.token, name),
                ));
            }
            lines.push(TraceLine { loc, action });
        }
        Ok(lines)
    }

    fn parse_action(&mut self, name: &str, loc: SourceLocation) -> QuadraResult<Action> {
        let action = match name {
            "declare_class" => Action::DeclareClass(self.expect_name(loc)?),
            "set_parent" => Action::SetParent(self.expect_name(loc)?),
            "finish_class" => Action::FinishClass,
            "declare_function" => Action::DeclareFunction(self.expect_name(loc)?),
            "set_access" => {
                let keyword = self.expect_name(loc)?;
                let access = Access::from_keyword(&keyword).ok_or_else(|| {
                    trace_error(loc, format!("unknown access modifier {}", keyword))
                })?;
                Action::SetAccess(access)
            }
            "declare_type" => Action::DeclareType(self.expect_name(loc)?),
            "declare_variable" => Action::DeclareVariable(self.expect_name(loc)?),
            "enter_params" => Action::EnterParams,
            "exit_params" => Action::ExitParams,
            "push_operand" => Action::PushOperand(self.expect_operand(loc)?),
            "push_operator" => {
                let operator = self
                    .next_operator(loc.line)
                    .ok_or_else(|| trace_error(loc, "push_operator expects an operator"))?;
                Action::PushOperator(operator)
            }
            "reduce" => {
                let ready = self.expect_ready_set(loc)?;
                Action::Reduce(ready)
            }
            "discard_fake_bottom" => Action::DiscardFakeBottom,
            "discard_value" => Action::DiscardValue,
            "assign" => Action::Assign(self.expect_name(loc)?),
            "write" => match self.peek_on(loc.line).map(|t| &t.token) {
                Some(Token::StringLiteral(text)) => {
                    let text = text.clone();
                    self.pos += 1;
                    Action::Write(Some(text))
                }
                _ => Action::Write(None),
            },
            "read" => Action::Read,
            "if_test" => Action::IfTest,
            "else_branch" => Action::ElseBranch,
            "end_if" => Action::EndIf,
            "while_header" => Action::WhileHeader,
            "end_while" => Action::EndWhile,
            "function_body_begin" => Action::FunctionBodyBegin,
            "program_entry" => Action::ProgramEntry,
            "function_end" => {
                let is_main = matches!(
                    self.peek_on(loc.line).map(|t| &t.token),
                    Some(Token::Identifier(flag)) if flag == "main"
                );
                if is_main {
                    self.pos += 1;
                }
                Action::FunctionEnd { is_main }
            }
            "return" => Action::Return,
            "call_parent" => Action::CallParent(self.expect_name(loc)?),
            "end_parent_call" => Action::EndParentCall,
            "begin_call" => Action::BeginCall(self.expect_name(loc)?),
            "begin_params" => Action::BeginParams,
            "pass_param" => Action::PassParam,
            "advance_param" => Action::AdvanceParam,
            "end_params" => Action::EndParams,
            "attribute_call" => Action::AttributeCall(self.expect_name(loc)?),
            "end_call" => Action::EndCall,
            "switch_function" => Action::SwitchFunction(self.expect_name(loc)?),
            "switch_instance" => Action::SwitchInstance(self.expect_name(loc)?),
            other => return Err(trace_error(loc, format!("unknown action {}", other))),
        };
        Ok(action)
    }

    fn expect_name(&mut self, loc: SourceLocation) -> QuadraResult<String> {
        match self.peek_on(loc.line).map(|t| t.token.clone()) {
            Some(Token::Identifier(name)) => {
                self.pos += 1;
                Ok(name)
            }
            _ => Err(trace_error(loc, "expected a name")),
        }
    }

    fn expect_operand(&mut self, loc: SourceLocation) -> QuadraResult<OperandToken> {
        let Some(token) = self.peek_on(loc.line).map(|t| t.token.clone()) else {
            return Err(trace_error(loc, "push_operand expects a literal or name"));
        };
        let operand = match token {
            Token::Identifier(name) => OperandToken::Identifier(name),
            Token::IntegerLiteral(value) => Literal::Int(value).into(),
            Token::FloatLiteral(value) => Literal::from(value).into(),
            Token::CharLiteral(value) => Literal::Char(value).into(),
            Token::StringLiteral(value) => Literal::Str(value).into(),
            Token::True => Literal::Bool(true).into(),
            Token::False => Literal::Bool(false).into(),
            _ => return Err(trace_error(loc, "push_operand expects a literal or name")),
        };
        self.pos += 1;
        Ok(operand)
    }

    fn next_operator(&mut self, line: usize) -> Option<Operator> {
        let operator = match &self.peek_on(line)?.token {
            Token::Symbol(symbol) | Token::Identifier(symbol) => Operator::from_symbol(symbol)?,
            _ => return None,
        };
        self.pos += 1;
        Some(operator)
    }

    /// Operators and precedence-class names, e.g. `reduce + -` or
    /// `reduce relational`.
    fn expect_ready_set(&mut self, loc: SourceLocation) -> QuadraResult<Vec<Operator>> {
        let mut ready = Vec::new();
        while self.peek_on(loc.line).is_some() {
            if let Some(operator) = self.next_operator(loc.line) {
                ready.push(operator);
                continue;
            }
            let class = self.expect_name(loc).ok().and_then(|n| OperatorClass::from_name(&n));
            match class {
                Some(class) => ready.extend_from_slice(class.operators()),
                None => return Err(trace_error(loc, "reduce expects operators or a precedence class")),
            }
        }
        if ready.is_empty() {
            return Err(trace_error(loc, "reduce expects operators or a precedence class"));
        }
        Ok(ready)
    }
}

pub fn parse(tokens: Vec<TokenWithLocation>) -> QuadraResult<Vec<TraceLine>> {
    let mut parser = Parser::new(tokens);
    let lines = parser.parse()?;
    debug_assert!(parser.is_at_end());
    Ok(lines)
}

/// Fires every action in order, stopping at the first error.
pub fn replay(generator: &mut QuadGenerator, lines: &[TraceLine]) -> QuadraResult<()> {
    for line in lines {
        log::trace!("line {}: {:?}", line.loc.line, line.action);
        line.action
            .apply(generator)
            .map_err(|e| semantic_error(line.loc.line, e))?;
    }
    Ok(())
}
