//! Function declaration grammar (spec §6): `function R name(T1 [&] [n1],
//! T2 [&] [n2], ...)`. An omitted parameter name gets a synthetic `@0`,
//! `@1`, ... in declaration order. Grounded on
//! `original_source/Source/Library/IncompleteFunction.cpp`'s
//! `parse_function_declaration`.

use sl_data::{Keyword, Operator, ParsingError, TokenValue};
use sl_types::TypeHandle;

use crate::context::CompilerContext;
use crate::cursor::Cursor;
use crate::types_syntax::parse_type;

pub struct FunctionDeclaration {
    pub name: String,
    pub return_type: TypeHandle,
    /// Parameter name, type, and by-reference-ness, in declaration order.
    pub params: Vec<(String, TypeHandle, bool)>,
    pub type_handle: TypeHandle,
}

pub fn parse_function_declaration(cursor: &mut Cursor, ctx: &mut CompilerContext) -> Result<FunctionDeclaration, ParsingError> {
    cursor.expect_value(&TokenValue::Keyword(Keyword::Function))?;
    let return_type = parse_type(cursor, ctx)?;
    let name = parse_name(cursor)?;

    cursor.expect_value(&TokenValue::Operator(Operator::OpenRound))?;
    let mut params = Vec::new();
    while !cursor.check(&TokenValue::Operator(Operator::CloseRound)) {
        if !params.is_empty() {
            cursor.expect_value(&TokenValue::Operator(Operator::Comma))?;
        }

        let param_type = parse_type(cursor, ctx)?;
        let by_ref = cursor.check(&TokenValue::Operator(Operator::BitwiseAnd));
        if by_ref {
            cursor.advance();
        }

        let param_name = if matches!(cursor.peek().value, TokenValue::Identifier(_)) {
            parse_name(cursor)?
        } else {
            format!("@{}", params.len())
        };
        params.push((param_name, param_type, by_ref));
    }
    cursor.advance();

    let param_types = params.iter().map(|(_, t, by_ref)| (*t, *by_ref)).collect();
    let type_handle = ctx.types.function(return_type, param_types);

    return Ok(FunctionDeclaration { name, return_type, params, type_handle });
}

fn parse_name(cursor: &mut Cursor) -> Result<String, ParsingError> {
    let span = cursor.span();
    let TokenValue::Identifier(name) = cursor.peek().value.clone() else {
        return Err(ParsingError::syntax(format!("Expected an identifier, found '{}'", cursor.peek().value), span));
    };
    cursor.advance();
    return Ok(name);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tokenizer::tokenize;

    fn parse(source: &str) -> (FunctionDeclaration, CompilerContext) {
        let mut ctx = CompilerContext::new();
        let tokens = tokenize(source).unwrap();
        let mut cursor = Cursor::new(&tokens);
        let decl = parse_function_declaration(&mut cursor, &mut ctx).unwrap();
        return (decl, ctx);
    }

    #[test]
    fn unnamed_parameters_get_synthetic_names() {
        let (decl, _ctx) = parse("function number add(number, number)");
        assert_eq!(decl.params[0].0, "@0");
        assert_eq!(decl.params[1].0, "@1");
    }

    #[test]
    fn named_by_reference_parameter_keeps_its_name_and_flag() {
        let (decl, ctx) = parse("function void bump(number& x)");
        assert_eq!(decl.params[0].0, "x");
        assert_eq!(decl.params[0].1, ctx.types.number());
        assert!(decl.params[0].2);
    }
}
